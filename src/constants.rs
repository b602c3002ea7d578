// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the BMCS load balancer provider.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Load Balancer Defaults
// ============================================================================

/// Shape used when the service does not carry a shape annotation
pub const DEFAULT_LOAD_BALANCER_SHAPE: &str = "100Mbps";

/// Balancing policy applied to every backend set we create
pub const DEFAULT_LOAD_BALANCER_POLICY: &str = "ROUND_ROBIN";

/// Weight assigned to every backend (all nodes are equal)
pub const DEFAULT_BACKEND_WEIGHT: i32 = 1;

/// Maximum length of the UID-derived part of a load balancer name
pub const MAX_LOAD_BALANCER_UID_NAME_LEN: usize = 32;

// ============================================================================
// Health Check Constants
// ============================================================================

/// Protocol used by node health checks
pub const HEALTH_CHECK_PROTOCOL: &str = "HTTP";

/// Path probed on nodes
pub const HEALTH_CHECK_PATH: &str = "/healthz";

/// kube-proxy health port, used when the service does not request its own
pub const HEALTH_CHECK_PORT: i32 = 10256;

// ============================================================================
// Kubernetes Constants
// ============================================================================

/// Service protocol the remote load balancer cannot forward
pub const PROTOCOL_UDP: &str = "UDP";

/// Protocol assumed when a service port leaves it unset
pub const PROTOCOL_TCP: &str = "TCP";

/// The only supported session affinity
pub const SESSION_AFFINITY_NONE: &str = "None";

/// Node address type carrying the address backends are reached on
pub const NODE_INTERNAL_IP: &str = "InternalIP";

/// External traffic policy that makes kube-proxy serve per-service health checks
pub const EXTERNAL_TRAFFIC_POLICY_LOCAL: &str = "Local";

/// Legacy annotation value equivalent to [`EXTERNAL_TRAFFIC_POLICY_LOCAL`]
pub const EXTERNAL_TRAFFIC_ONLY_LOCAL: &str = "OnlyLocal";

// ============================================================================
// TLS Secret Constants
// ============================================================================

/// Secret data key holding the PEM certificate
pub const SSL_CERTIFICATE_FILE_NAME: &str = "tls.crt";

/// Secret data key holding the PEM private key
pub const SSL_PRIVATE_KEY_FILE_NAME: &str = "tls.key";

/// Certificate verification depth applied to SSL listeners
pub const SSL_VERIFY_DEPTH: i32 = 0;

// ============================================================================
// Remote Resource Types (used in logs, errors and metrics)
// ============================================================================

pub const RESOURCE_LOAD_BALANCER: &str = "LoadBalancer";
pub const RESOURCE_BACKEND_SET: &str = "BackendSet";
pub const RESOURCE_LISTENER: &str = "Listener";
pub const RESOURCE_BACKEND: &str = "Backend";
pub const RESOURCE_CERTIFICATE: &str = "Certificate";
pub const RESOURCE_SECRET: &str = "Secret";
