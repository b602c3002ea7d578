// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Collaborator interfaces consumed by the convergence core.
//!
//! The core never talks to the network directly. It goes through three seams:
//!
//! - [`LoadBalancerClient`] - the remote cloud load balancer API
//! - [`SecretStore`] - lookup of TLS key material
//! - [`SecurityListClient`] - persistence of batched firewall rule changes
//!
//! Lookups signal absence with [`LoadBalancerError::NotFound`]; any other
//! failure should be a [`LoadBalancerError::RemoteOperation`] (see
//! [`LoadBalancerError::remote`]).
//!
//! [`KubeSecretStore`] is the production [`SecretStore`], backed by the
//! Kubernetes API.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::debug;

use crate::constants::RESOURCE_SECRET;
use crate::lb_errors::{LoadBalancerError, Result};
use crate::model::{BackendSet, Certificate, Listener, LoadBalancer};
use crate::security_rules::SecurityRuleBatch;

/// Remote load balancer API.
///
/// `create_and_await_*` methods return once the long-running operation has
/// completed. Delete and backend-create calls return a work request id that
/// callers pass to [`LoadBalancerClient::await_work_request`].
#[async_trait::async_trait]
pub trait LoadBalancerClient: Send + Sync {
    /// Look up a load balancer by display name.
    async fn get_load_balancer_by_name(&self, name: &str) -> Result<LoadBalancer>;

    /// Create a load balancer and wait until it is active.
    async fn create_and_await_load_balancer(
        &self,
        name: &str,
        shape: &str,
        subnets: &[String],
    ) -> Result<LoadBalancer>;

    /// Start deleting a load balancer, returning the work request id.
    async fn delete_load_balancer(&self, id: &str) -> Result<String>;

    /// Block until a work request has succeeded.
    async fn await_work_request(&self, id: &str) -> Result<()>;

    /// Create a backend set and wait for it, returning the remote view.
    async fn create_and_await_backend_set(
        &self,
        lb: &LoadBalancer,
        backend_set: &BackendSet,
    ) -> Result<BackendSet>;

    async fn delete_backend_set(&self, lb_id: &str, name: &str) -> Result<String>;

    /// Create a listener and wait for it.
    async fn create_and_await_listener(&self, lb: &LoadBalancer, listener: &Listener)
        -> Result<()>;

    async fn delete_listener(&self, lb_id: &str, name: &str) -> Result<String>;

    async fn create_backend(
        &self,
        lb_id: &str,
        backend_set_name: &str,
        ip_address: &str,
        port: i32,
    ) -> Result<String>;

    /// Delete a backend addressed by its `ip:port` target.
    async fn delete_backend(&self, lb_id: &str, backend_set_name: &str, target: &str)
        -> Result<String>;

    async fn get_certificate_by_name(&self, lb_id: &str, name: &str) -> Result<Certificate>;

    /// Upload a certificate and private key and wait for it.
    async fn create_and_await_certificate(
        &self,
        lb: &LoadBalancer,
        name: &str,
        certificate: &str,
        private_key: &str,
    ) -> Result<()>;
}

/// Source of TLS key material.
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the data map of a secret.
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, Vec<u8>>>;
}

/// Persists firewall rule changes accumulated during one reconciliation pass.
#[async_trait::async_trait]
pub trait SecurityListClient: Send + Sync {
    /// Apply every change in `batch` atomically.
    async fn save(&self, batch: &SecurityRuleBatch) -> Result<()>;
}

/// [`SecretStore`] reading `core/v1` secrets through the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, Vec<u8>>> {
        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        debug!("Fetching secret {}/{}", namespace, name);
        let secret = secret_api.get(name).await.map_err(|e| match e {
            kube::Error::Api(ae) if ae.code == 404 => {
                LoadBalancerError::not_found(RESOURCE_SECRET, format!("{namespace}/{name}"))
            }
            other => LoadBalancerError::SecretLookup {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: other.to_string(),
            },
        })?;

        // Convert ByteString to Vec<u8>
        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect())
    }
}
