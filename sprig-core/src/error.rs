//! Error types for Sprig property-based testing.

use thiserror::Error;

/// Main error type for Sprig.
///
/// Configuration errors are returned from constructors. Contract violations
/// (malformed contexts, unresolved letrec references) surface from
/// `generate`/`shrink` by panicking with this error's message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SprigError {
    /// Constraints that no arbitrary can satisfy, such as `min > max`.
    #[error("Invalid constraints: {message}")]
    InvalidConstraints { message: String },

    /// NaN was passed where a numeric bound is required.
    #[error("NaN is not a valid value for constraint {bound}")]
    NanBound { bound: &'static str },

    /// A shrink context that the receiving arbitrary could not have produced.
    #[error("Malformed context passed to {arbitrary}: {reason}")]
    MalformedContext {
        arbitrary: &'static str,
        reason: String,
    },

    /// A letrec placeholder whose name was never declared in its family.
    #[error("Lazy arbitrary {name:?} not correctly initialized")]
    Unresolved { name: String },

    /// A letrec placeholder used with a value type different from its target.
    #[error("Lazy arbitrary {name:?} does not produce values of type {expected}")]
    TieTypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// A cyclic placeholder generated outside of a cyclic letrec generation.
    #[error("Knot {name:?} used outside of a cyclic generation")]
    KnotOutsideCycle { name: String },

    /// Two members of a letrec family share the same name.
    #[error("Letrec member {name:?} declared more than once")]
    DuplicateMember { name: String },

    /// A lookup for a member that the family does not contain.
    #[error("Letrec family has no member named {name:?}")]
    UnknownMember { name: String },
}

impl SprigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SprigError::InvalidConstraints {
            message: message.into(),
        }
    }
}

/// Result type for Sprig operations.
pub type Result<T> = std::result::Result<T, SprigError>;

/// Abort the current generation or shrink because an engine contract was broken.
///
/// These errors mean the engine was wired incorrectly, so they are never
/// recovered from and propagate to the test failure unchanged.
#[track_caller]
pub(crate) fn contract_violation(error: SprigError) -> ! {
    panic!("{error}")
}
