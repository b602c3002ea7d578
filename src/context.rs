// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all load balancer operations.
//!
//! Every public operation receives a [`Context`] holding:
//! - the provider configuration (default subnets)
//! - the remote load balancer API client
//! - the TLS secret store
//! - the security list client
//!
//! The context holds no per-service mutable state, so operations for
//! different services may run concurrently against one context.

use std::sync::Arc;

use crate::client::{LoadBalancerClient, SecretStore, SecurityListClient};
use crate::config::ProviderConfig;

/// Shared context passed to all reconcilers.
#[derive(Clone)]
pub struct Context {
    /// Provider configuration
    pub config: ProviderConfig,

    /// Remote load balancer API
    pub client: Arc<dyn LoadBalancerClient>,

    /// Source of TLS key material
    pub secrets: Arc<dyn SecretStore>,

    /// Firewall rule persistence
    pub security_lists: Arc<dyn SecurityListClient>,
}

impl Context {
    #[must_use]
    pub fn new(
        config: ProviderConfig,
        client: Arc<dyn LoadBalancerClient>,
        secrets: Arc<dyn SecretStore>,
        security_lists: Arc<dyn SecurityListClient>,
    ) -> Self {
        Self {
            config,
            client,
            secrets,
            security_lists,
        }
    }
}
