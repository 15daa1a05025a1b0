// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal RFC 6902 patch computation between two view-model trees.

use crate::pointer::PatchOp;
use crate::vm::{Value, Vm};

/// Compute the minimal op list turning `prev` into `next`.
///
/// `Vm` keys are stored in a [`std::collections::BTreeMap`], so iteration is
/// already in sorted-key order — the deterministic traversal the spec asks
/// for falls out of the type rather than needing an explicit sort step.
pub fn diff(prev: &Vm, next: &Vm) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_map(&[], prev, next, &mut ops);
    ops
}

fn diff_map(prefix: &[String], prev: &Vm, next: &Vm, ops: &mut Vec<PatchOp>) {
    // Merge-walk both sorted key sets in one pass (BTreeMap already yields
    // keys in sorted order, so this is a classic sorted two-pointer merge).
    let prev_keys: Vec<&String> = prev.keys().collect();
    let next_keys: Vec<&String> = next.keys().collect();
    let (mut i, mut j) = (0, 0);

    while i < prev_keys.len() || j < next_keys.len() {
        let prev_key = prev_keys.get(i);
        let next_key = next_keys.get(j);
        match (prev_key, next_key) {
            (Some(pk), None) => {
                ops.push(PatchOp::remove(&path(prefix, pk)));
                i += 1;
            }
            (None, Some(nk)) => {
                if let Some(v) = next.get(*nk) {
                    ops.push(PatchOp::add(&path(prefix, nk), v.clone()));
                }
                j += 1;
            }
            (Some(pk), Some(nk)) => match pk.cmp(nk) {
                std::cmp::Ordering::Less => {
                    ops.push(PatchOp::remove(&path(prefix, pk)));
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    if let Some(v) = next.get(*nk) {
                        ops.push(PatchOp::add(&path(prefix, nk), v.clone()));
                    }
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    if let (Some(p), Some(n)) = (prev.get(*pk), next.get(*nk)) {
                        diff_value(prefix, pk, p, n, ops);
                    }
                    i += 1;
                    j += 1;
                }
            },
            (None, None) => unreachable!("loop condition guarantees at least one side remains"),
        }
    }
}

fn diff_value(prefix: &[String], key: &str, prev: &Value, next: &Value, ops: &mut Vec<PatchOp>) {
    if prev == next {
        return;
    }
    match (prev, next) {
        (Value::Map(p), Value::Map(n)) => {
            let mut sub_prefix = prefix.to_vec();
            sub_prefix.push(key.to_owned());
            diff_map(&sub_prefix, p, n, ops);
        }
        _ => {
            ops.push(PatchOp::replace(&path(prefix, key), next.clone()));
        }
    }
}

fn path(prefix: &[String], key: &str) -> Vec<String> {
    let mut tokens = prefix.to_vec();
    tokens.push(key.to_owned());
    tokens
}

/// Compute ops only for the given top-level token-list paths, each of which
/// identifies a subtree that may have changed. Missing intermediate nodes on
/// either side resolve to "absent" (treated as if that whole path were
/// simply not present in that tree).
pub fn diff_at_paths(prev: &Vm, next: &Vm, paths: &[Vec<String>]) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    for tokens in paths {
        if tokens.is_empty() {
            diff_map(&[], prev, next, &mut ops);
            continue;
        }
        diff_at_path(prev, next, tokens, &mut ops);
    }
    ops
}

fn diff_at_path(prev: &Vm, next: &Vm, tokens: &[String], ops: &mut Vec<PatchOp>) {
    let Some((head, rest)) = tokens.split_first() else {
        return;
    };
    let prev_val = prev.get(head);
    let next_val = next.get(head);

    match (prev_val, next_val) {
        (None, None) => {}
        (Some(_), None) => {
            ops.push(PatchOp::remove(&[head.clone()]));
        }
        (None, Some(v)) => {
            ops.push(PatchOp::add(&[head.clone()], v.clone()));
        }
        (Some(p), Some(n)) if rest.is_empty() => {
            diff_value(&[], head, p, n, ops);
        }
        (Some(p), Some(n)) => {
            // Descend into the nested map along `rest`, prefixing emitted
            // ops with `head` at each level.
            match (p.as_map(), n.as_map()) {
                (Some(pm), Some(nm)) => {
                    let mut sub_ops = Vec::new();
                    diff_at_path(pm, nm, rest, &mut sub_ops);
                    for op in sub_ops {
                        ops.push(prefix_op(head, op));
                    }
                }
                _ => {
                    if p != n {
                        ops.push(PatchOp::replace(&[head.clone()], n.clone()));
                    }
                }
            }
        }
    }
}

/// Prepend `head` to an already-built op's path.
fn prefix_op(head: &str, op: PatchOp) -> PatchOp {
    let prefixed = format!("/{}{}", crate::pointer::escape_token(head), op.path());
    match op {
        PatchOp::Add { value, .. } => PatchOp::Add { path: prefixed, value },
        PatchOp::Remove { .. } => PatchOp::Remove { path: prefixed },
        PatchOp::Replace { value, .. } => PatchOp::Replace { path: prefixed, value },
    }
}

#[cfg(test)]
#[path = "differ_tests.rs"]
mod tests;
