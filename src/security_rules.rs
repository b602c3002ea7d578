// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Batched firewall (security list) rule changes.
//!
//! Every listener and backend change during a reconciliation pass implies a
//! firewall change for a node port: traffic from the load balancer subnets to
//! that port on the nodes must be allowed or revoked. Instead of writing each
//! change to the remote security lists as it happens, the reconciler records
//! intent in a [`SecurityRuleBatch`] and flushes it once at the end with
//! [`SecurityRuleBatch::save`].
//!
//! Flushing consumes the batch, so a pass cannot save twice. If a pass fails
//! before its save, load balancer mutations already applied stay applied and
//! the queued rule intent is lost. The next pass restores it through
//! [`SecurityRuleBatch::reassert_ports`], which queues every desired node port
//! and revokes stale ports still visible on the remote backend sets.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::client::SecurityListClient;
use crate::lb_errors::Result;

/// In-memory accumulator of firewall rule changes keyed by node port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityRuleBatch {
    load_balancer_subnets: Vec<String>,
    node_ips: Vec<String>,
    in_use_ports: BTreeSet<i32>,
    opened: BTreeSet<i32>,
    closed: BTreeSet<i32>,
}

impl SecurityRuleBatch {
    /// Start an empty batch for traffic from `load_balancer_subnets` to `node_ips`.
    #[must_use]
    pub fn new(load_balancer_subnets: Vec<String>, node_ips: Vec<String>) -> Self {
        Self {
            load_balancer_subnets,
            node_ips,
            ..Self::default()
        }
    }

    /// Mark node ports the desired state still forwards to.
    ///
    /// Requests to close one of these ports are ignored, so partial backend
    /// removals cannot revoke access for backends that remain.
    #[must_use]
    pub fn with_ports_in_use(mut self, ports: impl IntoIterator<Item = i32>) -> Self {
        self.in_use_ports.extend(ports);
        self
    }

    /// Queue every in-use port and revoke each of `actual_ports` that is not
    /// in use.
    ///
    /// `actual_ports` are the node ports of the remote backends as fetched at
    /// the start of the pass.
    pub fn reassert_ports(&mut self, actual_ports: impl IntoIterator<Item = i32>) {
        for port in self.in_use_ports.clone() {
            self.ensure_rules_added(port);
        }
        for port in actual_ports {
            self.ensure_rules_removed(port);
        }
    }

    /// Record that traffic to `port` must be allowed.
    pub fn ensure_rules_added(&mut self, port: i32) {
        self.closed.remove(&port);
        if self.opened.insert(port) {
            debug!("Queued security rules for node port {}", port);
        }
    }

    /// Record that traffic to `port` is no longer needed.
    pub fn ensure_rules_removed(&mut self, port: i32) {
        if self.in_use_ports.contains(&port) {
            debug!(
                "Keeping security rules for node port {}: still used by desired backends",
                port
            );
            return;
        }
        self.opened.remove(&port);
        if self.closed.insert(port) {
            debug!("Queued security rule removal for node port {}", port);
        }
    }

    #[must_use]
    pub fn load_balancer_subnets(&self) -> &[String] {
        &self.load_balancer_subnets
    }

    #[must_use]
    pub fn node_ips(&self) -> &[String] {
        &self.node_ips
    }

    /// Ports whose rules must exist after the save, ascending.
    pub fn ports_to_open(&self) -> impl Iterator<Item = i32> + '_ {
        self.opened.iter().copied()
    }

    /// Ports whose rules must be gone after the save, ascending.
    pub fn ports_to_close(&self) -> impl Iterator<Item = i32> + '_ {
        self.closed.iter().copied()
    }

    /// `true` when nothing needs to be persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }

    /// Persist the batch in one call. An empty batch is not sent.
    ///
    /// # Errors
    ///
    /// Returns whatever the [`SecurityListClient`] reports.
    pub async fn save(self, client: &dyn SecurityListClient) -> Result<()> {
        if self.is_empty() {
            debug!("No security rule changes to save");
            return Ok(());
        }

        info!(
            "Saving security rules: open {:?}, close {:?} for subnets {:?}",
            self.opened, self.closed, self.load_balancer_subnets
        );
        client.save(&self).await
    }
}

#[cfg(test)]
#[path = "security_rules_tests.rs"]
mod security_rules_tests;
