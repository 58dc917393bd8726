#![forbid(unsafe_code)]

//! Store error model.
//!
//! One domain-specific enum, `Result` everywhere. Configuration mistakes
//! (duplicate names) surface at build/registration time; dispatch mistakes
//! (unknown operation types) surface at commit time.

use std::fmt;

/// Errors raised by store construction and commit dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No mutation handler is registered under the committed type.
    UnknownOperation(String),
    /// Two sibling modules share a name.
    DuplicateModule(String),
    /// A module declares two mutations with the same name (qualified type given).
    DuplicateMutation(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOperation(ty) => {
                write!(f, "no mutation registered for operation type '{ty}'")
            }
            Self::DuplicateModule(name) => {
                write!(f, "duplicate module name '{name}' among siblings")
            }
            Self::DuplicateMutation(ty) => {
                write!(f, "duplicate mutation registered under '{ty}'")
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_type() {
        let err = StoreError::UnknownOperation("a/b/set_value".into());
        assert!(err.to_string().contains("a/b/set_value"));
    }
}
