// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFC 6901 JSON Pointer construction and parsing, plus RFC 6902 patch-op
//! builders on top of it.

use crate::error::CoreError;
use crate::vm::Value;

/// Escape a single pointer token per RFC 6901: `~` → `~0`, `/` → `~1`.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single pointer token. Caller must have already rejected bare
/// `~` and unknown `~X` escapes via [`parse_pointer`].
pub fn unescape_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => out.push('~'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Join tokens into a JSON Pointer string, escaping each token.
pub fn pointer(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&escape_token(token));
    }
    out
}

/// Parse a JSON Pointer string into its token list.
///
/// The empty string is a valid pointer denoting the document root and
/// parses to an empty token list.
pub fn parse_pointer(s: &str) -> Result<Vec<String>, CoreError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    if !s.starts_with('/') {
        return Err(CoreError::InvalidPointer(s.to_owned()));
    }
    let mut tokens = Vec::new();
    for raw in s[1..].split('/') {
        validate_escapes(raw, s)?;
        tokens.push(unescape_token(raw));
    }
    Ok(tokens)
}

/// Reject a bare `~` or a `~X` escape where `X` is not `0` or `1`.
fn validate_escapes(raw: &str, whole: &str) -> Result<(), CoreError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'~' {
            match bytes.get(i + 1) {
                Some(b'0') | Some(b'1') => i += 2,
                _ => return Err(CoreError::InvalidEscape(whole.to_owned())),
            }
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// An RFC 6902 patch operation against the view-model tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOp {
    /// The path this op targets, regardless of variant.
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Remove { path } | Self::Replace { path, .. } => path,
        }
    }

    /// Build an `add` op. The path is validated by round-tripping through
    /// [`parse_pointer`]; a malformed path is a contract breach and panics,
    /// matching the source's "fail loudly" behavior for programmer errors.
    pub fn add(tokens: &[String], value: Value) -> Self {
        let path = pointer(tokens);
        assert!(parse_pointer(&path).is_ok(), "built an unparseable pointer: {path}");
        Self::Add { path, value }
    }

    pub fn remove(tokens: &[String]) -> Self {
        let path = pointer(tokens);
        assert!(parse_pointer(&path).is_ok(), "built an unparseable pointer: {path}");
        Self::Remove { path }
    }

    pub fn replace(tokens: &[String], value: Value) -> Self {
        let path = pointer(tokens);
        assert!(parse_pointer(&path).is_ok(), "built an unparseable pointer: {path}");
        Self::Replace { path, value }
    }
}

#[cfg(test)]
#[path = "pointer_tests.rs"]
mod tests;
