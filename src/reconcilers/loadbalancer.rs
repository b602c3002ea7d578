// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load balancer reconciliation logic.
//!
//! One call to [`reconcile_load_balancer`] runs a full, strictly sequential
//! pass:
//!
//! ```text
//! Fetch -> (CreateIfAbsent) -> EnsureCertificate -> ListenerAdds -> ListenerRemoves
//!       -> BackendAdds -> BackendRemoves -> SaveSecurityRules -> TranslateStatus
//! ```
//!
//! The first failing step aborts the pass. Remote changes already applied
//! are kept; the next pass picks up from there. Every pass queues security
//! rules for all desired node ports, so rules lost with a failed pass are
//! saved by the next one.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::{LoadBalancerStatus, Service};
use kube::ResourceExt;
use tracing::{debug, info};

use crate::constants::{
    RESOURCE_BACKEND, RESOURCE_BACKEND_SET, RESOURCE_LISTENER, RESOURCE_LOAD_BALANCER,
};
use crate::context::Context;
use crate::lb_errors::Result;
use crate::metrics;
use crate::model::{BackendSet, LoadBalancer};
use crate::reconcilers::certificate::ensure_ssl_certificate;
use crate::reconcilers::desired::{backend_sets, listeners, ssl_config, ssl_enabled};
use crate::reconcilers::plan::{plan_actions, PlannedAction};
use crate::reconcilers::spec::{load_balancer_name, LoadBalancerSpec};
use crate::reconcilers::status::load_balancer_to_status;
use crate::security_rules::SecurityRuleBatch;

/// Converge the remote load balancer onto `spec` and return its status.
///
/// # Arguments
///
/// * `ctx` - Shared context with the remote collaborators
/// * `spec` - Validated desired state for one service
///
/// # Returns
///
/// The ingress addresses of the converged load balancer.
///
/// # Errors
///
/// Returns the first error of any step; see the module docs for the order.
pub async fn reconcile_load_balancer(
    ctx: &Context,
    spec: &LoadBalancerSpec,
) -> Result<LoadBalancerStatus> {
    info!(
        "Reconciling load balancer {} for service {}/{} with {} nodes",
        spec.name,
        spec.service.namespace().unwrap_or_default(),
        spec.service.name_any(),
        spec.node_ips.len()
    );

    let mut lb = fetch_or_create(ctx, spec).await?;

    let certificate_name = lb.display_name.clone();
    let ssl = ssl_config(spec, &certificate_name)?;
    if ssl_enabled(&ssl) {
        ensure_ssl_certificate(
            ctx.client.as_ref(),
            ctx.secrets.as_ref(),
            &certificate_name,
            &spec.service,
            &lb,
        )
        .await?;
    }

    let desired_sets = backend_sets(spec);
    let desired_listeners = listeners(spec, &ssl);

    let mut batch = SecurityRuleBatch::new(spec.subnets.to_vec(), spec.node_ips.clone())
        .with_ports_in_use(backend_ports(&desired_sets));
    batch.reassert_ports(backend_ports(&lb.backend_sets));

    let actions = plan_actions(&desired_sets, &desired_listeners, &lb)?;
    if actions.is_empty() {
        debug!("Load balancer {} is already converged", lb.display_name);
    }
    for action in actions {
        apply_action(ctx, &mut lb, &mut batch, action).await?;
    }

    batch.save(ctx.security_lists.as_ref()).await?;

    load_balancer_to_status(&lb)
}

/// Delete the load balancer of `service` and revoke its security rules.
///
/// Succeeds without side effects when no such load balancer exists.
///
/// # Errors
///
/// Returns lookup errors other than `NotFound`, service validation errors,
/// security list errors and delete errors.
pub async fn delete_load_balancer(ctx: &Context, service: &Service) -> Result<()> {
    let name = load_balancer_name(service);
    info!("Attempting to delete load balancer {}", name);

    let lb = match ctx.client.get_load_balancer_by_name(&name).await {
        Ok(lb) => lb,
        Err(e) if e.is_not_found() => {
            info!("Could not find load balancer {}. Nothing to do.", name);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let node_ips: BTreeSet<String> = lb
        .backend_sets
        .values()
        .flat_map(|set| set.backends.iter().map(|backend| backend.ip_address.clone()))
        .collect();
    let spec = LoadBalancerSpec::new(&ctx.config, service, node_ips.into_iter().collect())?;

    let mut batch = SecurityRuleBatch::new(spec.subnets.to_vec(), spec.node_ips.clone());
    for port in lb.backend_sets.values().filter_map(|set| set.first_backend_port()) {
        batch.ensure_rules_removed(port);
    }
    batch.save(ctx.security_lists.as_ref()).await?;

    let work_request = ctx.client.delete_load_balancer(&lb.id).await?;
    ctx.client.await_work_request(&work_request).await?;
    metrics::record_remote_deleted(RESOURCE_LOAD_BALANCER);

    info!("Deleted load balancer {} ({})", name, lb.id);
    Ok(())
}

/// Current status of the load balancer of `service`, if it exists.
///
/// # Errors
///
/// Returns lookup errors other than `NotFound` and status translation errors.
pub async fn get_load_balancer_status(
    ctx: &Context,
    service: &Service,
) -> Result<Option<LoadBalancerStatus>> {
    let name = load_balancer_name(service);
    debug!("Fetching load balancer {}", name);

    match ctx.client.get_load_balancer_by_name(&name).await {
        Ok(lb) => load_balancer_to_status(&lb).map(Some),
        Err(e) if e.is_not_found() => {
            debug!("Load balancer {} does not exist", name);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn backend_ports(sets: &BTreeMap<String, BackendSet>) -> BTreeSet<i32> {
    sets.values()
        .flat_map(|set| set.backends.iter().map(|backend| backend.port))
        .collect()
}

async fn fetch_or_create(ctx: &Context, spec: &LoadBalancerSpec) -> Result<LoadBalancer> {
    match ctx.client.get_load_balancer_by_name(&spec.name).await {
        Ok(lb) => Ok(lb),
        Err(e) if e.is_not_found() => {
            info!("Creating load balancer {} ({})", spec.name, spec.shape);
            let lb = ctx
                .client
                .create_and_await_load_balancer(&spec.name, &spec.shape, &spec.subnets)
                .await?;
            metrics::record_remote_created(RESOURCE_LOAD_BALANCER);
            info!("Created load balancer {} with id {}", lb.display_name, lb.id);
            Ok(lb)
        }
        Err(e) => Err(e),
    }
}

/// Apply one planned step and mirror it into the local view of `lb`.
async fn apply_action(
    ctx: &Context,
    lb: &mut LoadBalancer,
    batch: &mut SecurityRuleBatch,
    action: PlannedAction,
) -> Result<()> {
    let client = ctx.client.as_ref();

    match action {
        PlannedAction::CreateBackendSet { backend_set } => {
            info!(
                "Creating backend set {} on load balancer {}",
                backend_set.name, lb.display_name
            );
            let created = client.create_and_await_backend_set(lb, &backend_set).await?;
            metrics::record_remote_created(RESOURCE_BACKEND_SET);
            lb.backend_sets.insert(created.name.clone(), created);
        }
        PlannedAction::CreateListener { listener } => {
            info!(
                "Creating listener {} on load balancer {}",
                listener.name, lb.display_name
            );
            client.create_and_await_listener(lb, &listener).await?;
            metrics::record_remote_created(RESOURCE_LISTENER);
            lb.listeners.insert(listener.name.clone(), listener);
        }
        PlannedAction::DeleteListener { name } => {
            info!(
                "Deleting listener {} from load balancer {}",
                name, lb.display_name
            );
            let work_request = client.delete_listener(&lb.id, &name).await?;
            client.await_work_request(&work_request).await?;
            metrics::record_remote_deleted(RESOURCE_LISTENER);
            lb.listeners.remove(&name);
        }
        PlannedAction::DeleteBackendSet { name } => {
            info!(
                "Deleting backend set {} from load balancer {}",
                name, lb.display_name
            );
            let work_request = client.delete_backend_set(&lb.id, &name).await?;
            client.await_work_request(&work_request).await?;
            metrics::record_remote_deleted(RESOURCE_BACKEND_SET);
            lb.backend_sets.remove(&name);
        }
        PlannedAction::CreateBackend {
            backend_set_name,
            backend,
        } => {
            debug!("Adding backend {} to {}", backend.target(), backend_set_name);
            let work_request = client
                .create_backend(&lb.id, &backend_set_name, &backend.ip_address, backend.port)
                .await?;
            client.await_work_request(&work_request).await?;
            metrics::record_remote_created(RESOURCE_BACKEND);
            if let Some(set) = lb.backend_sets.get_mut(&backend_set_name) {
                set.backends.push(backend);
            }
        }
        PlannedAction::DeleteBackend {
            backend_set_name,
            backend,
        } => {
            let target = backend.target();
            debug!("Deleting backend {} from {}", target, backend_set_name);
            let work_request = client
                .delete_backend(&lb.id, &backend_set_name, &target)
                .await?;
            client.await_work_request(&work_request).await?;
            metrics::record_remote_deleted(RESOURCE_BACKEND);
            if let Some(set) = lb.backend_sets.get_mut(&backend_set_name) {
                set.backends.retain(|existing| existing != &backend);
            }
        }
        PlannedAction::OpenSecurityRules { port } => batch.ensure_rules_added(port),
        PlannedAction::CloseSecurityRules { port } => batch.ensure_rules_removed(port),
    }

    Ok(())
}

#[cfg(test)]
#[path = "loadbalancer_tests.rs"]
mod loadbalancer_tests;
