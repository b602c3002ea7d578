// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # bmcs-lb - Load Balancer Convergence for Kubernetes Services
//!
//! `bmcs-lb` provisions and converges a BMCS cloud load balancer for a
//! Kubernetes `Service` of type `LoadBalancer`, keeping its listeners,
//! backend sets, backends, TLS certificate and node firewall rules in step
//! with the service and the cluster's nodes.
//!
//! ## Overview
//!
//! The library is driven by an external control loop through
//! [`provider::LoadBalancerManager`]:
//!
//! - `get_load_balancer` - current status, if the load balancer exists
//! - `ensure_load_balancer` - create or converge, returning the status
//! - `update_load_balancer` - converge, discarding the status
//! - `ensure_load_balancer_deleted` - delete and revoke firewall rules
//!
//! Remote systems are reached through the traits in [`client`], so the
//! convergence logic can be exercised entirely in memory.
//!
//! ## Modules
//!
//! - [`provider`] - Public operations
//! - [`reconcilers`] - Spec building, projection, diffing, planning and reconciliation
//! - [`model`] - Load balancer object model and derived names
//! - [`client`] - Remote API, secret store and security list interfaces
//! - [`security_rules`] - Batched firewall rule changes
//! - [`config`] - Provider configuration file
//! - [`lb_errors`] - Error types and kinds
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bmcs_lb::client::{KubeSecretStore, LoadBalancerClient, SecurityListClient};
//! use bmcs_lb::config::ProviderConfig;
//! use bmcs_lb::provider::{CloudLoadBalancers, LoadBalancerManager};
//! use k8s_openapi::api::core::v1::{Node, Service};
//!
//! async fn sync(
//!     lb_client: Arc<dyn LoadBalancerClient>,
//!     security_lists: Arc<dyn SecurityListClient>,
//!     service: &Service,
//!     nodes: &[Node],
//! ) -> anyhow::Result<()> {
//!     let config = ProviderConfig::from_file("/etc/bmcs/cloud-provider.yaml")?;
//!     let kube = kube::Client::try_default().await?;
//!     let provider = CloudLoadBalancers::new(
//!         config,
//!         lb_client,
//!         Arc::new(KubeSecretStore::new(kube)),
//!         security_lists,
//!     );
//!
//!     let status = provider.ensure_load_balancer("cluster", service, nodes).await?;
//!     println!("{status:?}");
//!     Ok(())
//! }
//! ```

pub mod annotations;
pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod lb_errors;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod reconcilers;
pub mod security_rules;
