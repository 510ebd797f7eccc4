//! Error kinds shared across the crate.
//!
//! Every failure is reported by kind plus a one-sentence context; there is no
//! error chaining. Derivation and enumeration failures surface immediately;
//! rewrite failures roll back to the pre-pass store.

/// Error type for all fallible operations in the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FcaError {
    /// A fuzzy set's universe does not match the expected one
    /// (objects vs attributes), or dimensions disagree.
    ShapeMismatch(String),
    /// An operation requiring an incidence was called on an empty one.
    EmptyContext(String),
    /// A binary-only operation was called on a non-{0,1} incidence.
    NotBinary(String),
    /// Logic name not present in the registry.
    UnknownLogic(String),
    /// Rewrite name not present in the registry.
    UnknownRewrite(String),
    /// A registered rewrite returned a result violating store invariants.
    InvariantViolation(String),
    /// User-requested cancellation observed.
    Cancelled,
}

impl std::fmt::Display for FcaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch(s) => write!(f, "Shape mismatch: {s}"),
            Self::EmptyContext(s) => write!(f, "Empty context: {s}"),
            Self::NotBinary(s) => write!(f, "Not a binary incidence: {s}"),
            Self::UnknownLogic(s) => write!(f, "Unknown logic: {s}"),
            Self::UnknownRewrite(s) => write!(f, "Unknown rewrite rule: {s}"),
            Self::InvariantViolation(s) => write!(f, "Invariant violation: {s}"),
            Self::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for FcaError {}
