// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keeps the host's pub/sub membership in sync with the set of topics the
//! active screen declares.

use std::collections::BTreeSet;

use tracing::warn;

/// Action requested of the host-provided subscription hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

/// Host-provided side effect for subscribing/unsubscribing a topic. Side
/// effects belong to the embedding application; the syncer never inspects
/// the return value beyond treating an `Err` as a logged, non-fatal fault.
pub trait SubscriptionHook: Send + Sync {
    fn call(&self, action: SubscriptionAction, topic: &str) -> Result<(), String>;
}

impl<F> SubscriptionHook for F
where
    F: Fn(SubscriptionAction, &str) -> Result<(), String> + Send + Sync,
{
    fn call(&self, action: SubscriptionAction, topic: &str) -> Result<(), String> {
        self(action, topic)
    }
}

/// Tracks the current subscription set and computes add/remove deltas.
#[derive(Default)]
pub struct SubscriptionSyncer {
    current: BTreeSet<String>,
}

impl SubscriptionSyncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &BTreeSet<String> {
        &self.current
    }

    /// Reconcile against `desired`: unsubscribe topics no longer wanted,
    /// subscribe newly wanted ones. The membership set is updated even if
    /// the hook faults, so the next sync's delta stays correct.
    pub fn sync(&mut self, desired: &[String], hook: &dyn SubscriptionHook) {
        let desired: BTreeSet<String> = desired.iter().cloned().collect();

        let to_unsubscribe: Vec<String> = self.current.difference(&desired).cloned().collect();
        let to_subscribe: Vec<String> = desired.difference(&self.current).cloned().collect();

        for topic in &to_unsubscribe {
            if let Err(e) = hook.call(SubscriptionAction::Unsubscribe, topic) {
                warn!(topic, error = %e, "unsubscribe hook faulted");
            }
        }
        for topic in &to_subscribe {
            if let Err(e) = hook.call(SubscriptionAction::Subscribe, topic) {
                warn!(topic, error = %e, "subscribe hook faulted");
            }
        }

        self.current = desired;
    }

    /// Unsubscribe from every currently-held topic. Called on session
    /// termination.
    pub fn unsubscribe_all(&mut self, hook: &dyn SubscriptionHook) {
        self.sync(&[], hook);
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
