// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Name-keyed set differences between desired and actual state.
//!
//! Objects are compared by derived name only. A listener whose content changed
//! without its name changing (for example a new health check path) is *not*
//! reported; it is left alone until its name changes. Backends are compared by
//! `"ip-port"`, ignoring weight and every other field.
//!
//! Results are sorted by name so callers apply changes in a stable order.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Backend, BackendSet, Listener};

/// Listeners to add and to remove, each sorted by derived name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerChanges {
    pub additions: Vec<Listener>,
    pub removals: Vec<Listener>,
}

impl ListenerChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Backends to add and to remove, keyed by backend set name.
///
/// Sets without changes are absent from the maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendChanges {
    pub additions: BTreeMap<String, Vec<Backend>>,
    pub removals: BTreeMap<String, Vec<Backend>>,
}

impl BackendChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Compute which listeners must be added or removed.
///
/// Both sides are re-keyed by [`Listener::derived_name`], so a remote listener
/// stored under a different name still matches its desired counterpart.
#[must_use]
pub fn listener_modifications(
    desired: &BTreeMap<String, Listener>,
    actual: &BTreeMap<String, Listener>,
) -> ListenerChanges {
    let desired_by_name = index_by(desired.values(), Listener::derived_name);
    let actual_by_name = index_by(actual.values(), Listener::derived_name);

    ListenerChanges {
        additions: difference(&desired_by_name, &actual_by_name),
        removals: difference(&actual_by_name, &desired_by_name),
    }
}

/// Compute backend changes for one backend set.
#[must_use]
pub fn backend_modifications(
    desired: &BackendSet,
    actual: &BackendSet,
) -> (Vec<Backend>, Vec<Backend>) {
    let desired_by_key = index_by(desired.backends.iter(), Backend::key);
    let actual_by_key = index_by(actual.backends.iter(), Backend::key);

    (
        difference(&desired_by_key, &actual_by_key),
        difference(&actual_by_key, &desired_by_key),
    )
}

/// Compute backend changes for every backend set present on both sides.
///
/// Sets only present on one side are handled at the listener level.
#[must_use]
pub fn all_backend_modifications(
    desired: &BTreeMap<String, BackendSet>,
    actual: &BTreeMap<String, BackendSet>,
) -> BackendChanges {
    let mut changes = BackendChanges::default();

    for (name, desired_set) in desired {
        let Some(actual_set) = actual.get(name) else {
            continue;
        };

        let (additions, removals) = backend_modifications(desired_set, actual_set);
        if !additions.is_empty() {
            changes.additions.insert(name.clone(), additions);
        }
        if !removals.is_empty() {
            changes.removals.insert(name.clone(), removals);
        }
    }

    changes
}

fn index_by<'a, T, F>(items: impl Iterator<Item = &'a T>, key: F) -> BTreeMap<String, &'a T>
where
    T: 'a,
    F: Fn(&T) -> String,
{
    items.map(|item| (key(item), item)).collect()
}

/// Items of `left` whose key is not in `right`, in key order.
fn difference<T: Clone>(left: &BTreeMap<String, &T>, right: &BTreeMap<String, &T>) -> Vec<T> {
    let left_keys: BTreeSet<&String> = left.keys().collect();
    let right_keys: BTreeSet<&String> = right.keys().collect();

    left_keys
        .difference(&right_keys)
        .map(|name| (*left[*name]).clone())
        .collect()
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
