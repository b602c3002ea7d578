// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Public load balancer interface for an embedding control loop.
//!
//! The embedding application decides when to call these operations, runs at
//! most one at a time per service, and retries failures on its own schedule.
//! Nothing here retries or schedules work.

use std::sync::Arc;
use std::time::Instant;

use k8s_openapi::api::core::v1::{LoadBalancerStatus, Node, Service};
use kube::ResourceExt;
use tracing::{debug, error};

use crate::client::{LoadBalancerClient, SecretStore, SecurityListClient};
use crate::config::ProviderConfig;
use crate::context::Context;
use crate::lb_errors::Result;
use crate::metrics::{
    record_reconciliation_error, record_reconciliation_success, OPERATION_DELETE,
    OPERATION_ENSURE, OPERATION_GET,
};
use crate::reconcilers::{
    delete_load_balancer, extract_node_ips, get_load_balancer_status, reconcile_load_balancer,
    LoadBalancerSpec,
};

/// The four load balancer operations a cloud provider exposes.
#[async_trait::async_trait]
pub trait LoadBalancerManager: Send + Sync {
    /// Status of the service's load balancer; `None` when it does not exist.
    async fn get_load_balancer(
        &self,
        cluster_name: &str,
        service: &Service,
    ) -> Result<Option<LoadBalancerStatus>>;

    /// Create or converge the service's load balancer and return its status.
    async fn ensure_load_balancer(
        &self,
        cluster_name: &str,
        service: &Service,
        nodes: &[Node],
    ) -> Result<LoadBalancerStatus>;

    /// [`LoadBalancerManager::ensure_load_balancer`], discarding the status.
    async fn update_load_balancer(
        &self,
        cluster_name: &str,
        service: &Service,
        nodes: &[Node],
    ) -> Result<()> {
        self.ensure_load_balancer(cluster_name, service, nodes)
            .await
            .map(|_| ())
    }

    /// Delete the service's load balancer; succeeds when it is already gone.
    async fn ensure_load_balancer_deleted(&self, cluster_name: &str, service: &Service)
        -> Result<()>;
}

/// [`LoadBalancerManager`] backed by the remote cloud API.
#[derive(Clone)]
pub struct CloudLoadBalancers {
    ctx: Arc<Context>,
}

impl CloudLoadBalancers {
    #[must_use]
    pub fn new(
        config: ProviderConfig,
        client: Arc<dyn LoadBalancerClient>,
        secrets: Arc<dyn SecretStore>,
        security_lists: Arc<dyn SecurityListClient>,
    ) -> Self {
        Self::from_context(Arc::new(Context::new(
            config,
            client,
            secrets,
            security_lists,
        )))
    }

    #[must_use]
    pub fn from_context(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

#[async_trait::async_trait]
impl LoadBalancerManager for CloudLoadBalancers {
    async fn get_load_balancer(
        &self,
        cluster_name: &str,
        service: &Service,
    ) -> Result<Option<LoadBalancerStatus>> {
        let start = Instant::now();
        debug!(
            "GetLoadBalancer for {}/{} in cluster {}",
            service.namespace().unwrap_or_default(),
            service.name_any(),
            cluster_name
        );

        let result = get_load_balancer_status(&self.ctx, service).await;
        observe(OPERATION_GET, service, start, &result);
        result
    }

    async fn ensure_load_balancer(
        &self,
        cluster_name: &str,
        service: &Service,
        nodes: &[Node],
    ) -> Result<LoadBalancerStatus> {
        let start = Instant::now();
        debug!(
            "EnsureLoadBalancer for {}/{} in cluster {} with {} nodes",
            service.namespace().unwrap_or_default(),
            service.name_any(),
            cluster_name,
            nodes.len()
        );

        let result = match LoadBalancerSpec::new(&self.ctx.config, service, extract_node_ips(nodes))
        {
            Ok(spec) => reconcile_load_balancer(&self.ctx, &spec).await,
            Err(e) => Err(e),
        };
        observe(OPERATION_ENSURE, service, start, &result);
        result
    }

    async fn ensure_load_balancer_deleted(
        &self,
        cluster_name: &str,
        service: &Service,
    ) -> Result<()> {
        let start = Instant::now();
        debug!(
            "EnsureLoadBalancerDeleted for {}/{} in cluster {}",
            service.namespace().unwrap_or_default(),
            service.name_any(),
            cluster_name
        );

        let result = delete_load_balancer(&self.ctx, service).await;
        observe(OPERATION_DELETE, service, start, &result);
        result
    }
}

/// Log failures and record the outcome of one operation.
fn observe<T>(operation: &str, service: &Service, start: Instant, result: &Result<T>) {
    let duration = start.elapsed();
    match result {
        Ok(_) => record_reconciliation_success(operation, duration),
        Err(e) => {
            error!(
                "Load balancer {} failed for {}/{} ({}): {}",
                operation,
                service.namespace().unwrap_or_default(),
                service.name_any(),
                e.kind(),
                e
            );
            record_reconciliation_error(operation, duration, e.kind());
        }
    }
}
