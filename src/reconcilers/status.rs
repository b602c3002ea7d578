// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Translation of a remote load balancer into a service status.

use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus};

use crate::lb_errors::{LoadBalancerError, Result};
use crate::model::LoadBalancer;

/// Map the load balancer's addresses, in order, onto ingress entries.
///
/// # Errors
///
/// Returns [`LoadBalancerError::NoIngressAddresses`] when no address has been
/// assigned yet; a service must not look ready without a reachable address.
pub fn load_balancer_to_status(lb: &LoadBalancer) -> Result<LoadBalancerStatus> {
    if lb.ip_addresses.is_empty() {
        return Err(LoadBalancerError::NoIngressAddresses {
            load_balancer: lb.display_name.clone(),
        });
    }

    let ingress = lb
        .ip_addresses
        .iter()
        .map(|ip| LoadBalancerIngress {
            ip: Some(ip.ip_address.clone()),
            ..Default::default()
        })
        .collect();

    Ok(LoadBalancerStatus {
        ingress: Some(ingress),
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
