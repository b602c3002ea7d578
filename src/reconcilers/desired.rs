// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Projection of a [`LoadBalancerSpec`] onto desired load balancer objects.
//!
//! Pure functions. All maps are `BTreeMap`s keyed by derived names, so two
//! projections of equal inputs are equal, including iteration order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::debug;

use crate::annotations::{
    BETA_EXTERNAL_TRAFFIC, BETA_HEALTH_CHECK_NODE_PORT, LOAD_BALANCER_SSL_PORTS,
};
use crate::constants::{
    DEFAULT_LOAD_BALANCER_POLICY, EXTERNAL_TRAFFIC_ONLY_LOCAL, EXTERNAL_TRAFFIC_POLICY_LOCAL,
    HEALTH_CHECK_PATH, HEALTH_CHECK_PORT, HEALTH_CHECK_PROTOCOL,
};
use crate::lb_errors::{LoadBalancerError, Result};
use crate::model::{
    backend_set_name, listener_name, Backend, BackendSet, HealthChecker, Listener,
    SslConfiguration,
};
use crate::reconcilers::spec::{port_protocol, LoadBalancerSpec};

/// Build one backend set per service port.
///
/// Every node IP becomes a backend on that port's node port. All sets share
/// one health checker, since health check targets come from the service
/// rather than from individual ports.
#[must_use]
pub fn backend_sets(spec: &LoadBalancerSpec) -> BTreeMap<String, BackendSet> {
    let health_checker = Arc::new(health_checker(&spec.service));

    spec.ports()
        .iter()
        .map(|service_port| {
            let name = backend_set_name(port_protocol(service_port), service_port.port);
            let node_port = service_port.node_port.unwrap_or_default();
            let backend_set = BackendSet {
                name: name.clone(),
                policy: DEFAULT_LOAD_BALANCER_POLICY.to_string(),
                backends: spec
                    .node_ips
                    .iter()
                    .map(|ip| Backend::new(ip.clone(), node_port))
                    .collect(),
                health_checker: Arc::clone(&health_checker),
            };
            (name, backend_set)
        })
        .collect()
}

/// Health checker for the nodes backing `service`.
///
/// Services with local external traffic policy get kube-proxy's per-service
/// health check on their health check node port; all others probe the
/// node-wide kube-proxy health port.
#[must_use]
pub fn health_checker(service: &Service) -> HealthChecker {
    let port = service_health_check_port(service).unwrap_or(HEALTH_CHECK_PORT);

    HealthChecker {
        protocol: HEALTH_CHECK_PROTOCOL.to_string(),
        url_path: HEALTH_CHECK_PATH.to_string(),
        port,
    }
}

fn service_health_check_port(service: &Service) -> Option<i32> {
    let spec = service.spec.as_ref()?;
    if spec.type_.as_deref() != Some("LoadBalancer") {
        return None;
    }

    let annotations = service.annotations();
    let only_local = spec.external_traffic_policy.as_deref() == Some(EXTERNAL_TRAFFIC_POLICY_LOCAL)
        || annotations.get(BETA_EXTERNAL_TRAFFIC).map(String::as_str)
            == Some(EXTERNAL_TRAFFIC_ONLY_LOCAL);
    if !only_local {
        return None;
    }

    spec.health_check_node_port
        .or_else(|| {
            annotations
                .get(BETA_HEALTH_CHECK_NODE_PORT)
                .and_then(|port| port.trim().parse().ok())
        })
        .filter(|port| *port > 0)
}

/// Parse the SSL ports annotation into a set of ports.
///
/// A missing or blank annotation means no SSL. Entries are comma-separated
/// and may carry surrounding whitespace.
///
/// # Errors
///
/// Returns [`LoadBalancerError::InvalidSslPort`] for any entry that is not an integer.
pub fn ssl_enabled_ports(annotations: &BTreeMap<String, String>) -> Result<BTreeSet<i32>> {
    let Some(ssl_ports) = annotations
        .get(LOAD_BALANCER_SSL_PORTS)
        .filter(|value| !value.trim().is_empty())
    else {
        return Ok(BTreeSet::new());
    };

    ssl_ports
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            entry
                .parse::<i32>()
                .map_err(|e| LoadBalancerError::InvalidSslPort {
                    value: entry.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Build the SSL configuration of each service port listed in the SSL annotation.
///
/// Annotated ports the service does not declare are ignored.
///
/// # Errors
///
/// Propagates parse errors from [`ssl_enabled_ports`].
pub fn ssl_config(
    spec: &LoadBalancerSpec,
    certificate_name: &str,
) -> Result<BTreeMap<i32, SslConfiguration>> {
    let ssl_ports = ssl_enabled_ports(spec.annotations())?;
    if ssl_ports.is_empty() {
        debug!("No SSL enabled ports found for {}", spec.name);
        return Ok(BTreeMap::new());
    }

    Ok(spec
        .ports()
        .iter()
        .filter(|service_port| ssl_ports.contains(&service_port.port))
        .map(|service_port| (service_port.port, SslConfiguration::new(certificate_name)))
        .collect())
}

/// SSL is on for a load balancer iff at least one listener terminates it.
#[must_use]
pub fn ssl_enabled(ssl_config: &BTreeMap<i32, SslConfiguration>) -> bool {
    !ssl_config.is_empty()
}

/// Build one listener per service port.
///
/// Each listener forwards to the backend set of its own port and carries the
/// SSL configuration for that port, if any.
#[must_use]
pub fn listeners(
    spec: &LoadBalancerSpec,
    ssl_config: &BTreeMap<i32, SslConfiguration>,
) -> BTreeMap<String, Listener> {
    spec.ports()
        .iter()
        .map(|service_port| {
            let protocol = port_protocol(service_port);
            let port = service_port.port;
            let ssl = ssl_config.get(&port).cloned();
            let name = listener_name(protocol, port, ssl.as_ref());
            let listener = Listener {
                name: name.clone(),
                default_backend_set_name: backend_set_name(protocol, port),
                protocol: protocol.to_string(),
                port,
                ssl_config: ssl,
            };
            (name, listener)
        })
        .collect()
}

#[cfg(test)]
#[path = "desired_tests.rs"]
mod desired_tests;
