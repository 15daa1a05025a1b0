// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-screen assigns and identity-guarded change tracking.

use std::collections::BTreeSet;

use crate::vm::{Value, Vm};

/// A screen's mutable state: its public fields (`assigns`) plus the set of
/// field names that changed since the last [`ScreenState::clear_changed`].
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    assigns: Vm,
    changed: BTreeSet<String>,
}

impl ScreenState {
    /// Seed a new container from initial assigns. Initial values are not
    /// considered changes — `changed` starts empty.
    pub fn new(initial_assigns: Vm) -> Self {
        Self { assigns: initial_assigns, changed: BTreeSet::new() }
    }

    pub fn assigns(&self) -> &Vm {
        &self.assigns
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.assigns.get(key)
    }

    /// Identity-guarded upsert: if `self.assigns[key] == value` already,
    /// nothing changes and `key` is not added to the changed set.
    pub fn assign(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.assigns.get(&key) == Some(&value) {
            return;
        }
        self.assigns.insert(key.clone(), value);
        self.changed.insert(key);
    }

    /// `assign(key, f(current_value))`. `f` receives `None` if the key is
    /// unset.
    pub fn update(&mut self, key: impl Into<String>, f: impl FnOnce(Option<&Value>) -> Value) {
        let key = key.into();
        let next = f(self.assigns.get(&key));
        self.assign(key, next);
    }

    /// Field names that changed since the last [`Self::clear_changed`], in
    /// sorted order.
    pub fn changed_fields(&self) -> Vec<String> {
        self.changed.iter().cloned().collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn clear_changed(&mut self) {
        self.changed.clear();
    }
}

#[cfg(test)]
#[path = "screen_state_tests.rs"]
mod tests;
