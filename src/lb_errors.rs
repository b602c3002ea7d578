// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for load balancer convergence.
//!
//! Every failure the core can produce is a [`LoadBalancerError`]. Each variant
//! belongs to exactly one [`ErrorKind`], which is what callers branch on:
//!
//! - **Validation** - the service asks for something the remote load balancer cannot do.
//!   Always fatal, raised before any remote call.
//! - **NotFound** - a lookup found nothing. Reconcilers treat it as "absent, create it"
//!   or "nothing to delete".
//! - **RemoteOperation** - any other collaborator failure. Fatal for the current pass.
//! - **MissingData** - a required annotation, secret field or address is absent.
//!
//! The core never retries internally; the embedding control loop resyncs.

use std::fmt;

use thiserror::Error;

/// Coarse classification of a [`LoadBalancerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    RemoteOperation,
    MissingData,
}

impl ErrorKind {
    /// Stable snake-case label, used in metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::RemoteOperation => "remote_operation_error",
            Self::MissingData => "missing_data",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building, converging or deleting a load balancer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadBalancerError {
    /// A service port uses a protocol the load balancer cannot forward (UDP).
    #[error("BMCS load balancers do not support {protocol} (service port {port})")]
    UnsupportedProtocol {
        /// The offending service port
        port: i32,
        /// The protocol declared on that port
        protocol: String,
    },

    /// Session affinity other than `None` was requested.
    #[error("BMCS only supports SessionAffinity `None` currently (got `{affinity}`)")]
    UnsupportedSessionAffinity {
        /// The requested affinity
        affinity: String,
    },

    /// The caller asked for a specific external address.
    #[error("BMCS does not support setting the LoadBalancerIP (got `{ip}`)")]
    UnsupportedLoadBalancerIp {
        /// The requested address
        ip: String,
    },

    /// The internal load balancer annotation was set.
    #[error("BMCS does not currently support internal load balancers")]
    UnsupportedInternalLoadBalancer,

    /// The SSL ports annotation contains an entry that is not a port number.
    #[error("parse SSL port `{value}`: {reason}")]
    InvalidSslPort {
        /// The entry that failed to parse
        value: String,
        /// Parser message
        reason: String,
    },

    /// A lookup found no object with the requested name.
    #[error("{resource} '{name}' not found")]
    NotFound {
        /// Remote resource type (see `constants::RESOURCE_*`)
        resource: String,
        /// Name that was looked up
        name: String,
    },

    /// The remote cloud API failed an operation.
    #[error("{operation} failed: {reason}")]
    RemoteOperation {
        /// Human-readable operation, e.g. `create listener TCP-80`
        operation: String,
        /// Error reported by the collaborator
        reason: String,
    },

    /// The TLS secret could not be read.
    #[error("failed to read secret {namespace}/{name}: {reason}")]
    SecretLookup {
        namespace: String,
        name: String,
        reason: String,
    },

    /// A required service annotation is absent.
    #[error("no {annotation} annotation found")]
    MissingAnnotation {
        /// The annotation key
        annotation: String,
    },

    /// The TLS secret lacks a required data field.
    #[error("{field} not found in secret {namespace}/{name}")]
    MissingSecretField {
        /// The missing data key (`tls.crt` or `tls.key`)
        field: String,
        namespace: String,
        name: String,
    },

    /// A listener needs a backend set that the desired state does not contain.
    #[error("cannot create backend set with name {name}")]
    MissingBackendSet {
        /// Derived backend set name
        name: String,
    },

    /// The load balancer exists but has no addresses assigned yet.
    #[error("no IPAddresses found for load balancer '{load_balancer}'")]
    NoIngressAddresses {
        /// Display name of the load balancer
        load_balancer: String,
    },
}

impl LoadBalancerError {
    /// Build a [`LoadBalancerError::NotFound`].
    pub fn not_found(resource: &str, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            name: name.into(),
        }
    }

    /// Wrap a collaborator failure as a [`LoadBalancerError::RemoteOperation`].
    ///
    /// Intended for implementations of [`crate::client::LoadBalancerClient`].
    pub fn remote(operation: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            reason: err.to_string(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedProtocol { .. }
            | Self::UnsupportedSessionAffinity { .. }
            | Self::UnsupportedLoadBalancerIp { .. }
            | Self::UnsupportedInternalLoadBalancer
            | Self::InvalidSslPort { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RemoteOperation { .. } | Self::SecretLookup { .. } => {
                ErrorKind::RemoteOperation
            }
            Self::MissingAnnotation { .. }
            | Self::MissingSecretField { .. }
            | Self::MissingBackendSet { .. }
            | Self::NoIngressAddresses { .. } => ErrorKind::MissingData,
        }
    }

    /// `true` when a lookup found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether a later resync may succeed without the service changing.
    ///
    /// Validation errors need a user edit. Everything else (remote failures,
    /// addresses not yet assigned, a secret created later) can clear up on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() != ErrorKind::Validation
    }
}

/// Result alias used throughout the core.
pub type Result<T, E = LoadBalancerError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "lb_errors_tests.rs"]
mod lb_errors_tests;
