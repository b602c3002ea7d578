// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load balancer convergence pipeline.
//!
//! A reconciliation pass flows through these modules in order:
//!
//! 1. [`spec`] - validate a service and build a [`LoadBalancerSpec`]
//! 2. [`desired`] - project a `LoadBalancerSpec` onto backend sets, SSL configuration and listeners
//! 3. [`diff`] - name-keyed set differences between desired and actual state
//! 4. [`plan`] - order the differences into steps
//! 5. [`loadbalancer`] - apply the steps remotely, ensuring the certificate
//!    first via [`certificate`]
//! 6. [`status`] - translate the remote object into a service status
//!
//! # Reconciliation Architecture
//!
//! Every pass is strictly sequential: each remote mutation is issued and
//! awaited before the next one starts, since later steps depend on earlier
//! ones being visible remotely. Firewall changes are accumulated in a
//! [`crate::security_rules::SecurityRuleBatch`] and saved once at the end.
//!
//! # Example: Planning Without Side Effects
//!
//! ```rust,no_run
//! use bmcs_lb::config::ProviderConfig;
//! use bmcs_lb::reconcilers::{plan_for_spec, LoadBalancerSpec};
//! use k8s_openapi::api::core::v1::Service;
//!
//! fn preview(config: &ProviderConfig, service: &Service) -> anyhow::Result<()> {
//!     let spec = LoadBalancerSpec::new(config, service, vec!["10.0.0.1".to_string()])?;
//!     println!("{}", plan_for_spec(&spec, None)?);
//!     Ok(())
//! }
//! ```

pub mod certificate;
pub mod desired;
pub mod diff;
pub mod loadbalancer;
pub mod plan;
pub mod spec;
pub mod status;

#[cfg(test)]
mod test_helpers;

pub use certificate::ensure_ssl_certificate;
pub use diff::{
    all_backend_modifications, backend_modifications, listener_modifications, BackendChanges,
    ListenerChanges,
};
pub use loadbalancer::{delete_load_balancer, get_load_balancer_status, reconcile_load_balancer};
pub use plan::{plan_actions, plan_for_spec, ConvergencePlan, PlannedAction};
pub use spec::{extract_node_ips, load_balancer_name, LoadBalancerSpec};
pub use status::load_balancer_to_status;
