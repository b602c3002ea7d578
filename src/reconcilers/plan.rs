// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ordered convergence plans.
//!
//! [`plan_actions`] turns desired and actual state into the exact sequence of
//! steps a reconciliation pass performs:
//!
//! 1. listener additions, each preceded by its backend set (created unless it
//!    already exists) and the security rule for its node port
//! 2. listener removals, each followed by closing the security rule and
//!    deleting the backend set once no listener references it
//! 3. backend additions per backend set, after opening the security rule
//! 4. backend removals per backend set, before closing the security rule
//!
//! Backend changes are diffed against the state *after* steps 1 and 2, as
//! the remote object would look by then. The same plan drives both the live
//! reconciler and the offline `lbplan` tool.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::lb_errors::{LoadBalancerError, Result};
use crate::model::{Backend, BackendSet, Listener, LoadBalancer};
use crate::reconcilers::desired::{backend_sets, listeners, ssl_config, ssl_enabled};
use crate::reconcilers::diff::{all_backend_modifications, listener_modifications};
use crate::reconcilers::spec::LoadBalancerSpec;

/// One step of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlannedAction {
    CreateBackendSet {
        backend_set: BackendSet,
    },
    CreateListener {
        listener: Listener,
    },
    DeleteListener {
        name: String,
    },
    DeleteBackendSet {
        name: String,
    },
    CreateBackend {
        backend_set_name: String,
        backend: Backend,
    },
    DeleteBackend {
        backend_set_name: String,
        backend: Backend,
    },
    /// Queue opening the security rules for a node port
    OpenSecurityRules {
        port: i32,
    },
    /// Queue closing the security rules for a node port
    CloseSecurityRules {
        port: i32,
    },
}

impl PlannedAction {
    /// `true` for steps that call the remote load balancer API.
    #[must_use]
    pub fn is_remote_mutation(&self) -> bool {
        !matches!(
            self,
            Self::OpenSecurityRules { .. } | Self::CloseSecurityRules { .. }
        )
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateBackendSet { backend_set } => write!(
                f,
                "create backend set {} ({} backends)",
                backend_set.name,
                backend_set.backends.len()
            ),
            Self::CreateListener { listener } => write!(
                f,
                "create listener {} -> {}",
                listener.name, listener.default_backend_set_name
            ),
            Self::DeleteListener { name } => write!(f, "delete listener {name}"),
            Self::DeleteBackendSet { name } => write!(f, "delete backend set {name}"),
            Self::CreateBackend {
                backend_set_name,
                backend,
            } => write!(
                f,
                "create backend {} in {}",
                backend.target(),
                backend_set_name
            ),
            Self::DeleteBackend {
                backend_set_name,
                backend,
            } => write!(
                f,
                "delete backend {} from {}",
                backend.target(),
                backend_set_name
            ),
            Self::OpenSecurityRules { port } => {
                write!(f, "open security rules for node port {port}")
            }
            Self::CloseSecurityRules { port } => {
                write!(f, "close security rules for node port {port}")
            }
        }
    }
}

/// Everything a reconciliation pass would do for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergencePlan {
    /// Display name of the load balancer
    pub load_balancer: String,
    /// The load balancer does not exist yet and will be created first
    pub create_load_balancer: bool,
    /// Certificate ensured before any listener change, when SSL is enabled
    pub certificate: Option<String>,
    pub actions: Vec<PlannedAction>,
}

impl ConvergencePlan {
    /// `true` when the pass would change nothing remotely.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        !self.create_load_balancer && self.actions.is_empty()
    }
}

impl fmt::Display for ConvergencePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Load balancer {}", self.load_balancer)?;
        if self.is_converged() {
            return writeln!(f, "  up to date");
        }
        if self.create_load_balancer {
            writeln!(f, "  create load balancer {}", self.load_balancer)?;
        }
        if let Some(certificate) = &self.certificate {
            writeln!(f, "  ensure certificate {certificate}")?;
        }
        for action in &self.actions {
            writeln!(f, "  {action}")?;
        }
        Ok(())
    }
}

/// Plan a full pass for `spec` against an optional remote snapshot.
///
/// Without a snapshot the load balancer is planned from scratch. The
/// certificate, when needed, is named after the load balancer.
///
/// # Errors
///
/// Returns SSL annotation parse errors and
/// [`LoadBalancerError::MissingBackendSet`] from [`plan_actions`].
pub fn plan_for_spec(
    spec: &LoadBalancerSpec,
    actual: Option<&LoadBalancer>,
) -> Result<ConvergencePlan> {
    let empty = LoadBalancer {
        display_name: spec.name.clone(),
        ..LoadBalancer::default()
    };
    let lb = actual.unwrap_or(&empty);

    let certificate_name = lb.display_name.clone();
    let ssl = ssl_config(spec, &certificate_name)?;
    let actions = plan_actions(&backend_sets(spec), &listeners(spec, &ssl), lb)?;

    Ok(ConvergencePlan {
        load_balancer: spec.name.clone(),
        create_load_balancer: actual.is_none(),
        certificate: ssl_enabled(&ssl).then_some(certificate_name),
        actions,
    })
}

/// Compute the ordered steps that converge `actual` onto the desired maps.
///
/// # Errors
///
/// Returns [`LoadBalancerError::MissingBackendSet`] if a listener to add
/// references a backend set absent from `desired_sets`.
pub fn plan_actions(
    desired_sets: &BTreeMap<String, BackendSet>,
    desired_listeners: &BTreeMap<String, Listener>,
    actual: &LoadBalancer,
) -> Result<Vec<PlannedAction>> {
    let mut actions = Vec::new();
    let mut backend_sets = actual.backend_sets.clone();
    let mut listeners = actual.listeners.clone();

    let changes = listener_modifications(desired_listeners, &actual.listeners);
    debug!(
        "Listener changes for {}: {} to add, {} to remove",
        actual.display_name,
        changes.additions.len(),
        changes.removals.len()
    );

    for listener in changes.additions {
        let set_name = &listener.default_backend_set_name;
        let desired_set =
            desired_sets
                .get(set_name)
                .ok_or_else(|| LoadBalancerError::MissingBackendSet {
                    name: set_name.clone(),
                })?;

        if !backend_sets.contains_key(set_name) {
            backend_sets.insert(set_name.clone(), desired_set.clone());
            actions.push(PlannedAction::CreateBackendSet {
                backend_set: desired_set.clone(),
            });
        }

        match desired_set.first_backend_port() {
            Some(port) => actions.push(PlannedAction::OpenSecurityRules { port }),
            None => warn!(
                "Backend set {} has no backends; not opening security rules",
                set_name
            ),
        }

        listeners.insert(listener.name.clone(), listener.clone());
        actions.push(PlannedAction::CreateListener { listener });
    }

    for listener in changes.removals {
        listeners.remove(&listener.name);
        actions.push(PlannedAction::DeleteListener {
            name: listener.name.clone(),
        });

        let set_name = &listener.default_backend_set_name;
        let Some(backend_set) = backend_sets.get(set_name) else {
            debug!(
                "Listener {} referenced missing backend set {}",
                listener.name, set_name
            );
            continue;
        };

        match backend_set.first_backend_port() {
            Some(port) => actions.push(PlannedAction::CloseSecurityRules { port }),
            None => warn!(
                "Backend set {} has no backends; not closing security rules",
                set_name
            ),
        }

        let still_referenced = listeners
            .values()
            .any(|other| &other.default_backend_set_name == set_name);
        if !still_referenced {
            backend_sets.remove(set_name);
            actions.push(PlannedAction::DeleteBackendSet {
                name: set_name.clone(),
            });
        }
    }

    let backend_changes = all_backend_modifications(desired_sets, &backend_sets);
    debug!(
        "Backend changes for {}: {} sets gaining backends, {} sets losing backends",
        actual.display_name,
        backend_changes.additions.len(),
        backend_changes.removals.len()
    );

    for (set_name, additions) in backend_changes.additions {
        if let Some(first) = additions.first() {
            actions.push(PlannedAction::OpenSecurityRules { port: first.port });
        }
        actions.extend(
            additions
                .into_iter()
                .map(|backend| PlannedAction::CreateBackend {
                    backend_set_name: set_name.clone(),
                    backend,
                }),
        );
    }

    for (set_name, removals) in backend_changes.removals {
        let close_port = removals.first().map(|backend| backend.port);
        actions.extend(
            removals
                .into_iter()
                .map(|backend| PlannedAction::DeleteBackend {
                    backend_set_name: set_name.clone(),
                    backend,
                }),
        );
        if let Some(port) = close_port {
            actions.push(PlannedAction::CloseSecurityRules { port });
        }
    }

    Ok(actions)
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod plan_tests;
