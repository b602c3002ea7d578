// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load balancer object model.
//!
//! These types describe both the *desired* configuration projected from a
//! service and the *actual* configuration read back from the remote cloud
//! API. Both sides use the same derived names as map keys, so the diff engine
//! can compare them by name alone.
//!
//! # Identity
//!
//! - [`BackendSet`] - keyed by [`backend_set_name`] of `(protocol, port)`
//! - [`Listener`] - keyed by [`listener_name`] of `(protocol, port, certificate)`
//! - [`Backend`] - identified by `(ip_address, port)` only
//!
//! Remote objects are serde-(de)serializable so snapshots can be stored and
//! fed to the dry-run planner.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BACKEND_WEIGHT, SSL_VERIFY_DEPTH};

/// Derive the name of the backend set serving `protocol`/`port`.
///
/// ```
/// assert_eq!(bmcs_lb::model::backend_set_name("TCP", 80), "TCP-80");
/// ```
#[must_use]
pub fn backend_set_name(protocol: &str, port: i32) -> String {
    format!("{protocol}-{port}")
}

/// Derive the name of the listener for `protocol`/`port`.
///
/// The certificate name is part of the identity, so swapping the certificate
/// behind a listener shows up as a remove plus an add.
#[must_use]
pub fn listener_name(protocol: &str, port: i32, ssl_config: Option<&SslConfiguration>) -> String {
    match ssl_config {
        Some(ssl) => format!("{protocol}-{port}-{}", ssl.certificate_name),
        None => format!("{protocol}-{port}"),
    }
}

/// HTTP health check run against every backend of a backend set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecker {
    pub protocol: String,
    pub url_path: String,
    pub port: i32,
}

/// A single forwarding target.
///
/// Equality and hashing only consider `(ip_address, port)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    pub ip_address: String,
    pub port: i32,
    #[serde(default = "default_weight")]
    pub weight: i32,
}

fn default_weight() -> i32 {
    DEFAULT_BACKEND_WEIGHT
}

impl Backend {
    /// Build a backend with the default weight.
    #[must_use]
    pub fn new(ip_address: impl Into<String>, port: i32) -> Self {
        Self {
            ip_address: ip_address.into(),
            port,
            weight: DEFAULT_BACKEND_WEIGHT,
        }
    }

    /// Diff identity, `"ip-port"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.ip_address, self.port)
    }

    /// Target name the remote API uses to address this backend, `"ip:port"`.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}:{}", self.ip_address, self.port)
    }
}

impl PartialEq for Backend {
    fn eq(&self, other: &Self) -> bool {
        self.ip_address == other.ip_address && self.port == other.port
    }
}

impl Eq for Backend {}

impl Hash for Backend {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip_address.hash(state);
        self.port.hash(state);
    }
}

/// A named pool of backends plus the health checker probing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSet {
    pub name: String,
    pub policy: String,
    #[serde(default)]
    pub backends: Vec<Backend>,
    /// Shared by every backend set projected from the same spec
    pub health_checker: Arc<HealthChecker>,
}

impl BackendSet {
    /// Node port of the first backend, the port firewall rules are keyed by.
    #[must_use]
    pub fn first_backend_port(&self) -> Option<i32> {
        self.backends.first().map(|backend| backend.port)
    }
}

/// SSL termination settings for one listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslConfiguration {
    pub certificate_name: String,
    pub verify_depth: i32,
    pub verify_peer_certificate: bool,
}

impl SslConfiguration {
    /// SSL configuration for `certificate_name` with the fixed verification policy.
    #[must_use]
    pub fn new(certificate_name: impl Into<String>) -> Self {
        Self {
            certificate_name: certificate_name.into(),
            verify_depth: SSL_VERIFY_DEPTH,
            verify_peer_certificate: false,
        }
    }
}

/// A front-end endpoint forwarding to a default backend set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub name: String,
    pub default_backend_set_name: String,
    pub protocol: String,
    pub port: i32,
    #[serde(default, rename = "sslConfiguration")]
    pub ssl_config: Option<SslConfiguration>,
}

impl Listener {
    /// Name recomputed from the listener's own fields.
    ///
    /// Remote listeners are diffed by this rather than by their stored name.
    #[must_use]
    pub fn derived_name(&self) -> String {
        listener_name(&self.protocol, self.port, self.ssl_config.as_ref())
    }
}

/// An address assigned to a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddress {
    pub ip_address: String,
    #[serde(default)]
    pub is_public: bool,
}

/// A certificate installed on a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub certificate_name: String,
    #[serde(default)]
    pub public_certificate: String,
}

/// The remote load balancer as last read from the cloud API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub shape_name: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
    #[serde(default)]
    pub backend_sets: BTreeMap<String, BackendSet>,
    #[serde(default)]
    pub listeners: BTreeMap<String, Listener>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
