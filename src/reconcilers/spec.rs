// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state descriptor built from a Kubernetes service.
//!
//! A [`LoadBalancerSpec`] lives for one reconciliation pass. Building one
//! validates the service and makes no remote calls.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Node, Service, ServicePort};
use kube::ResourceExt;

use crate::annotations::{
    LOAD_BALANCER_INTERNAL, LOAD_BALANCER_SHAPE, LOAD_BALANCER_SUBNET1, LOAD_BALANCER_SUBNET2,
};
use crate::config::ProviderConfig;
use crate::constants::{
    DEFAULT_LOAD_BALANCER_SHAPE, MAX_LOAD_BALANCER_UID_NAME_LEN, NODE_INTERNAL_IP, PROTOCOL_TCP,
    PROTOCOL_UDP, SESSION_AFFINITY_NONE,
};
use crate::lb_errors::{LoadBalancerError, Result};
use crate::reconcilers::desired::ssl_enabled_ports;

/// Everything needed to converge one service's load balancer.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerSpec {
    /// Stable load balancer display name (see [`load_balancer_name`])
    pub name: String,
    /// Sizing tier
    pub shape: String,
    /// The originating service
    pub service: Service,
    /// Current node addresses; order is irrelevant
    pub node_ips: Vec<String>,
    /// Exactly two subnet identifiers
    pub subnets: [String; 2],
}

impl LoadBalancerSpec {
    /// Validate `service` and derive the load balancer spec for it.
    ///
    /// Checks, in order, stopping at the first failure:
    ///
    /// 1. every port uses a supported protocol (no UDP)
    /// 2. session affinity is `None`
    /// 3. no `loadBalancerIP` is requested
    /// 4. the internal load balancer annotation is not set
    /// 5. the SSL ports annotation, if any, parses
    ///
    /// Then derives the name, the shape (annotation, else default) and each
    /// subnet independently (annotation, else provider default).
    ///
    /// # Errors
    ///
    /// Returns a validation-kind [`LoadBalancerError`] for the first violated rule.
    pub fn new(config: &ProviderConfig, service: &Service, node_ips: Vec<String>) -> Result<Self> {
        validate_protocols(service_ports(service))?;

        let spec = service.spec.as_ref();

        let affinity = spec
            .and_then(|s| s.session_affinity.as_deref())
            .unwrap_or(SESSION_AFFINITY_NONE);
        if affinity != SESSION_AFFINITY_NONE {
            return Err(LoadBalancerError::UnsupportedSessionAffinity {
                affinity: affinity.to_string(),
            });
        }

        if let Some(ip) = spec
            .and_then(|s| s.load_balancer_ip.as_deref())
            .filter(|ip| !ip.is_empty())
        {
            return Err(LoadBalancerError::UnsupportedLoadBalancerIp { ip: ip.to_string() });
        }

        let annotations = service.annotations();

        if annotations
            .get(LOAD_BALANCER_INTERNAL)
            .is_some_and(|value| !value.is_empty())
        {
            return Err(LoadBalancerError::UnsupportedInternalLoadBalancer);
        }

        ssl_enabled_ports(annotations)?;

        // TODO: warn when the shape annotation differs from the shape of an
        // existing load balancer; shape changes are never applied.
        let shape = annotations
            .get(LOAD_BALANCER_SHAPE)
            .filter(|shape| !shape.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOAD_BALANCER_SHAPE.to_string());

        let subnet1 = annotations
            .get(LOAD_BALANCER_SUBNET1)
            .cloned()
            .unwrap_or_else(|| config.load_balancer.subnet1.clone());
        let subnet2 = annotations
            .get(LOAD_BALANCER_SUBNET2)
            .cloned()
            .unwrap_or_else(|| config.load_balancer.subnet2.clone());

        Ok(Self {
            name: load_balancer_name(service),
            shape,
            service: service.clone(),
            node_ips,
            subnets: [subnet1, subnet2],
        })
    }

    /// The service ports this spec exposes.
    #[must_use]
    pub fn ports(&self) -> &[ServicePort] {
        service_ports(&self.service)
    }

    /// Service annotations (empty map when unset).
    #[must_use]
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        self.service.annotations()
    }
}

/// Protocol of a service port, defaulting to TCP like the API server does.
#[must_use]
pub fn port_protocol(port: &ServicePort) -> &str {
    port.protocol.as_deref().unwrap_or(PROTOCOL_TCP)
}

pub(crate) fn service_ports(service: &Service) -> &[ServicePort] {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_deref())
        .unwrap_or_default()
}

fn validate_protocols(ports: &[ServicePort]) -> Result<()> {
    match ports.iter().find(|port| port_protocol(port) == PROTOCOL_UDP) {
        Some(port) => Err(LoadBalancerError::UnsupportedProtocol {
            port: port.port,
            protocol: PROTOCOL_UDP.to_string(),
        }),
        None => Ok(()),
    }
}

/// Derive the display name of a service's load balancer.
///
/// The name is `"{service}-{uid-name}"` where `uid-name` is `"a"` followed by
/// the service UID without dashes, truncated to 32 characters. It only depends
/// on the service name and UID, so it is stable across reconciliations.
#[must_use]
pub fn load_balancer_name(service: &Service) -> String {
    let uid = service.uid().unwrap_or_default().replace('-', "");
    let mut uid_name = format!("a{uid}");
    uid_name.truncate(MAX_LOAD_BALANCER_UID_NAME_LEN);
    format!("{}-{}", service.name_any(), uid_name)
}

/// Collect the `InternalIP` address of every node, in input order.
///
/// Each address becomes a backend in every backend set.
#[must_use]
pub fn extract_node_ips(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| node.status.as_ref()?.addresses.as_ref())
        .flatten()
        .filter(|address| address.type_ == NODE_INTERNAL_IP)
        .map(|address| address.address.clone())
        .collect()
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod spec_tests;
