// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service annotations recognized by the load balancer provider.
//!
//! Annotations are the per-service configuration surface. They override
//! provider defaults from [`crate::config::ProviderConfig`] for a single service.

// ============================================================================
// BMCS Load Balancer Annotations
// ============================================================================

/// Marks a service as wanting an internal load balancer (always rejected)
pub const LOAD_BALANCER_INTERNAL: &str = "service.beta.kubernetes.io/bmcs-load-balancer-internal";

/// Overrides the load balancer shape.
///
/// Only read when the load balancer is created; later changes are not applied.
pub const LOAD_BALANCER_SHAPE: &str = "service.beta.kubernetes.io/bmcs-load-balancer-shape";

/// Overrides the first load balancer subnet (creation time only)
pub const LOAD_BALANCER_SUBNET1: &str = "service.beta.kubernetes.io/bmcs-load-balancer-subnet1";

/// Overrides the second load balancer subnet (creation time only)
pub const LOAD_BALANCER_SUBNET2: &str = "service.beta.kubernetes.io/bmcs-load-balancer-subnet2";

/// Comma-separated list of service ports whose listeners terminate SSL
pub const LOAD_BALANCER_SSL_PORTS: &str = "service.beta.kubernetes.io/bmcs-load-balancer-ssl-ports";

/// `[namespace/]name` of the TLS secret installed on SSL listeners.
///
/// See: <https://kubernetes.io/docs/concepts/services-networking/ingress/#tls>
pub const LOAD_BALANCER_TLS_SECRET: &str =
    "service.beta.kubernetes.io/bmcs-load-balancer-tls-secret";

// ============================================================================
// Legacy Kubernetes Health Check Annotations
// ============================================================================

/// Beta annotation predating `spec.externalTrafficPolicy`
pub const BETA_EXTERNAL_TRAFFIC: &str = "service.beta.kubernetes.io/external-traffic";

/// Beta annotation predating `spec.healthCheckNodePort`
pub const BETA_HEALTH_CHECK_NODE_PORT: &str = "service.beta.kubernetes.io/healthcheck-nodeport";
