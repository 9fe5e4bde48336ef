//! Session naming — caller-facing short names mapped to tmux session ids.
//!
//! tmux target parsing treats '.' and ':' as pane/window separators, so
//! session ids must avoid punctuation that tmux could interpret. Every
//! character outside `[A-Za-z0-9_-]` is replaced by '-' and the result is
//! namespaced under a fixed prefix so `corral` sessions never collide with
//! unrelated tmux sessions.

use thiserror::Error;

/// Namespace prefix for every tmux session managed by corral.
pub const SESSION_PREFIX: &str = "corral-";

/// Longest accepted caller-supplied short name.
pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("session name must not be empty")]
    Empty,
    #[error("session name exceeds {MAX_NAME_LEN} characters: {0} given")]
    TooLong(usize),
}

/// A validated session identity: the short name the caller used and the
/// canonical tmux session id derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    name: String,
    id: String,
}

impl SessionIdentity {
    /// The caller-supplied short name, unmodified.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical tmux session id (`corral-<sanitized name>`).
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Derive the canonical session id for a short name.
///
/// Pure and deterministic: the same name always maps to the same id, and
/// canonicalizing an already-sanitized name changes nothing. Distinct names
/// that sanitize identically (for example `a/b` and `a-b`) intentionally map
/// to the same session.
pub fn canonicalize(name: &str) -> Result<SessionIdentity, NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong(name.chars().count()));
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    Ok(SessionIdentity {
        name: name.to_string(),
        id: format!("{SESSION_PREFIX}{sanitized}"),
    })
}

/// Recover the short name from a canonical session id.
///
/// Returns `None` for ids outside the corral namespace so `list` can skip
/// unrelated tmux sessions.
pub fn short_name_of(id: &str) -> Option<&str> {
    id.strip_prefix(SESSION_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_name_is_prefixed() {
        let identity = canonicalize("api-work").unwrap();
        assert_eq!(identity.name(), "api-work");
        assert_eq!(identity.id(), "corral-api-work");
    }

    #[test]
    fn punctuation_is_replaced() {
        assert_eq!(canonicalize("fix: auth").unwrap().id(), "corral-fix--auth");
        assert_eq!(canonicalize("a/b").unwrap().id(), "corral-a-b");
        assert_eq!(canonicalize("v1.2").unwrap().id(), "corral-v1-2");
    }

    #[test]
    fn accepted_collision_between_distinct_names() {
        // Documented behavior: sanitization can merge names.
        assert_eq!(
            canonicalize("a/b").unwrap().id(),
            canonicalize("a-b").unwrap().id()
        );
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(canonicalize(""), Err(NameError::Empty));
    }

    #[test]
    fn oversized_name_rejected() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(canonicalize(&long), Err(NameError::TooLong(51)));
    }

    #[test]
    fn max_length_name_accepted() {
        let name = "y".repeat(MAX_NAME_LEN);
        assert!(canonicalize(&name).is_ok());
    }

    #[test]
    fn short_name_round_trip() {
        let identity = canonicalize("worker-3").unwrap();
        assert_eq!(short_name_of(identity.id()), Some("worker-3"));
    }

    #[test]
    fn short_name_of_foreign_session_is_none() {
        assert_eq!(short_name_of("scratch-editor"), None);
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(name in ".{1,50}") {
            let first = canonicalize(&name).unwrap();
            let sanitized = short_name_of(first.id()).unwrap().to_string();
            let second = canonicalize(&sanitized).unwrap();
            prop_assert_eq!(first.id(), second.id());
        }

        #[test]
        fn canonical_ids_use_allowed_charset(name in ".{1,50}") {
            let identity = canonicalize(&name).unwrap();
            let body = short_name_of(identity.id()).unwrap();
            prop_assert!(
                body.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
            prop_assert!(body.chars().count() <= MAX_NAME_LEN);
        }
    }
}
