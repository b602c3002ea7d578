// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for load balancer convergence.
//!
//! All metrics share the `bmcs_lb` prefix and live in [`METRICS_REGISTRY`].
//! The library never serves them; embedding applications expose the output
//! of [`gather_metrics`] however they like.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - public operations (`get`, `ensure`, `delete`) and their outcomes
//! - **Remote Mutation Metrics** - creates and deletes issued against the cloud API
//! - **Error Metrics** - failures by operation and error kind
//!
//! # Example
//!
//! ```rust,no_run
//! use bmcs_lb::metrics::{record_reconciliation_success, OPERATION_ENSURE};
//!
//! record_reconciliation_success(OPERATION_ENSURE, std::time::Duration::from_secs(1));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

use crate::lb_errors::ErrorKind;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "bmcs_lb";

/// `GetLoadBalancer`
pub const OPERATION_GET: &str = "get";
/// `EnsureLoadBalancer` and `UpdateLoadBalancer`
pub const OPERATION_ENSURE: &str = "ensure";
/// `EnsureLoadBalancerDeleted`
pub const OPERATION_DELETE: &str = "delete";

pub const ACTION_CREATE: &str = "create";
pub const ACTION_DELETE: &str = "delete";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of public operations by operation and status
///
/// Labels:
/// - `operation`: `get`, `ensure` or `delete`
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of load balancer operations by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of public operations in seconds
///
/// Buckets reach further than a typical controller's because every remote
/// mutation waits for its work request.
///
/// Labels:
/// - `operation`: `get`, `ensure` or `delete`
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of load balancer operations in seconds by operation",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]);
    let histogram = HistogramVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Remote Mutation Metrics
// ============================================================================

/// Total number of remote mutations
///
/// Labels:
/// - `resource_type`: `LoadBalancer`, `BackendSet`, `Listener`, `Backend` or `Certificate`
/// - `action`: `create` or `delete`
pub static REMOTE_MUTATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_remote_mutations_total"),
        "Total number of remote load balancer mutations by resource type and action",
    );
    let counter = CounterVec::new(opts, &["resource_type", "action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of failed operations by operation and error kind
///
/// Labels:
/// - `operation`: `get`, `ensure` or `delete`
/// - `error_type`: [`ErrorKind::as_str`]
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by operation and error kind",
    );
    let counter = CounterVec::new(opts, &["operation", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful operation
///
/// # Arguments
/// * `operation` - One of the `OPERATION_*` constants
/// * `duration` - Duration of the operation
pub fn record_reconciliation_success(operation: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed operation
///
/// # Arguments
/// * `operation` - One of the `OPERATION_*` constants
/// * `duration` - Duration of the operation before failure
/// * `kind` - Kind of the error that aborted it
pub fn record_reconciliation_error(operation: &str, duration: Duration, kind: ErrorKind) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
    ERRORS_TOTAL
        .with_label_values(&[operation, kind.as_str()])
        .inc();
}

/// Record a remote create
///
/// # Arguments
/// * `resource_type` - One of the `constants::RESOURCE_*` names
pub fn record_remote_created(resource_type: &str) {
    REMOTE_MUTATIONS_TOTAL
        .with_label_values(&[resource_type, ACTION_CREATE])
        .inc();
}

/// Record a remote delete
///
/// # Arguments
/// * `resource_type` - One of the `constants::RESOURCE_*` names
pub fn record_remote_deleted(resource_type: &str) {
    REMOTE_MUTATIONS_TOTAL
        .with_label_values(&[resource_type, ACTION_DELETE])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
