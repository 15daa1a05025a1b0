// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router table and navigation stack.
//!
//! The route table is the runtime output of a route DSL that lives outside
//! this core's scope; here it is just a static `Vec<RouteDef>` the host
//! constructs once (typically at startup) and shares across sessions behind
//! an `Arc`.

use std::collections::HashMap;
use std::fmt;

use crate::screen::{Params, ScreenSession};
use crate::vm::{Value, Vm};

/// A single route's static definition.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub name: String,
    pub path: String,
    pub key: String,
    pub screen_module: String,
    pub action: Option<String>,
    pub screen_session: ScreenSession,
}

/// Error constructing a [`Router`] from a route table that violates one of
/// the compile-time invariants the source's DSL builder would normally
/// enforce.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterBuildError {
    Empty,
    DuplicateName(String),
    DuplicatePath(String),
    DuplicateKey(String),
}

impl fmt::Display for RouterBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "route table must contain at least one route"),
            Self::DuplicateName(n) => write!(f, "duplicate route name: {n}"),
            Self::DuplicatePath(p) => write!(f, "duplicate route path: {p}"),
            Self::DuplicateKey(k) => write!(f, "duplicate route key: {k}"),
        }
    }
}

impl std::error::Error for RouterBuildError {}

/// A validated, immutable route table.
pub struct Router {
    default_route: String,
    by_name: HashMap<String, RouteDef>,
}

impl Router {
    /// Build a router from a route table, validating uniqueness invariants
    /// that a route DSL would otherwise enforce at compile time.
    pub fn new(routes: Vec<RouteDef>) -> Result<Self, RouterBuildError> {
        let Some(first) = routes.first() else {
            return Err(RouterBuildError::Empty);
        };
        let default_route = first.name.clone();

        let mut by_name = HashMap::new();
        let mut seen_paths = std::collections::HashSet::new();
        let mut seen_keys = std::collections::HashSet::new();
        for route in routes {
            if by_name.contains_key(&route.name) {
                return Err(RouterBuildError::DuplicateName(route.name));
            }
            if !seen_paths.insert(route.path.clone()) {
                return Err(RouterBuildError::DuplicatePath(route.path));
            }
            if !seen_keys.insert(route.key.clone()) {
                return Err(RouterBuildError::DuplicateKey(route.key));
            }
            by_name.insert(route.name.clone(), route);
        }
        Ok(Self { default_route, by_name })
    }

    pub fn default_route_name(&self) -> &str {
        &self.default_route
    }

    pub fn route_defs(&self) -> &HashMap<String, RouteDef> {
        &self.by_name
    }

    pub fn resolve(&self, name: &str) -> Option<&RouteDef> {
        self.by_name.get(name)
    }

    /// Seed a fresh nav stack with a single entry.
    pub fn initial_nav(&self, name: &str, params: Params) -> Option<NavState> {
        self.resolve(name)?;
        Some(NavState::new(NavEntry {
            name: name.to_owned(),
            params,
            action: self.resolve(name).and_then(|r| r.action.clone()),
        }))
    }

    pub fn current<'a>(&self, nav: &'a NavState) -> &'a NavEntry {
        nav.top()
    }

    pub fn current_route<'a>(&'a self, nav: &NavState) -> Option<&'a RouteDef> {
        self.resolve(&nav.top().name)
    }

    /// Push a new nav entry for `name`. Returns `None` if `name` doesn't
    /// resolve — callers should treat that as "unknown route, no-op".
    pub fn navigate(&self, nav: &mut NavState, name: &str, params: Params) -> Option<()> {
        let def = self.resolve(name)?;
        nav.push(NavEntry { name: name.to_owned(), params, action: def.action.clone() });
        Some(())
    }

    /// Pop the nav stack. Fails if only one entry remains.
    pub fn back(&self, nav: &mut NavState) -> bool {
        nav.pop()
    }

    /// Merge `params_patch` into the top entry's params without pushing.
    pub fn patch(&self, nav: &mut NavState, params_patch: Params) {
        nav.patch_top(params_patch);
    }

    /// Would navigating to `to_name` cross a routing boundary? `true` for
    /// an unresolvable target name as well, since the caller's no-op path
    /// for "unknown route" and "blocked boundary" is the same (a no-op with
    /// a warning log) — see [`crate::session`].
    pub fn screen_session_transition(&self, nav: &NavState, to_name: &str) -> bool {
        let Some(current_def) = self.resolve(&nav.top().name) else {
            return true;
        };
        match self.resolve(to_name) {
            Some(to_def) => to_def.screen_session != current_def.screen_session,
            None => true,
        }
    }

    /// Render the nav stack as a VM subtree: `{stack, current}`. `entries`
    /// is stored bottom-first (oldest at index 0, `push` appends the
    /// newest at the tail), which is already the order the stack should
    /// present in.
    pub fn to_vm(&self, nav: &NavState) -> Vm {
        let mut stack_vm = Vec::with_capacity(nav.entries.len());
        for entry in nav.entries.iter() {
            stack_vm.push(Value::Map(entry.to_vm()));
        }
        let mut out = Vm::new();
        out.insert("stack".to_owned(), Value::List(stack_vm));
        out.insert("current".to_owned(), Value::Map(nav.top().to_vm()));
        out
    }
}

/// One entry on the navigation stack.
#[derive(Debug, Clone)]
pub struct NavEntry {
    pub name: String,
    pub params: Params,
    pub action: Option<String>,
}

impl NavEntry {
    fn to_vm(&self) -> Vm {
        let mut out = Vm::new();
        out.insert("name".to_owned(), Value::String(self.name.clone()));
        out.insert("params".to_owned(), Value::Map(self.params.clone()));
        if let Some(action) = &self.action {
            out.insert("action".to_owned(), Value::String(action.clone()));
        }
        out
    }
}

/// A non-empty stack of [`NavEntry`], stored top-first for O(1) push/pop.
#[derive(Debug, Clone)]
pub struct NavState {
    entries: Vec<NavEntry>,
}

impl NavState {
    fn new(initial: NavEntry) -> Self {
        Self { entries: vec![initial] }
    }

    pub fn top(&self) -> &NavEntry {
        // Invariant: `entries` is never empty after construction — `new`
        // seeds one entry and `pop` refuses to empty the stack.
        &self.entries[self.entries.len() - 1]
    }

    fn push(&mut self, entry: NavEntry) {
        self.entries.push(entry);
    }

    /// Returns `false` (no-op) if only one entry remains.
    fn pop(&mut self) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        self.entries.pop();
        true
    }

    fn patch_top(&mut self, params_patch: Params) {
        if let Some(top) = self.entries.last_mut() {
            for (k, v) in params_patch {
                top.params.insert(k, v);
            }
        }
    }
}

#[cfg(test)]
#[path = "route_tests.rs"]
mod tests;
