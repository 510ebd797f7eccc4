//! Galois: formal concept analysis over binary and fuzzy incidence relations.
//!
//! Given a cross-table relating objects to attributes, the crate computes
//! the concept lattice, the Duquenne–Guigues canonical basis of attribute
//! implications, and derived operations on implications: closure of a set
//! under a rule base, simplification rewrites, entailment and equivalence.
//! Fuzzy incidences are handled through a residuated logic (Gödel,
//! Łukasiewicz, Product, or user-registered) parameterising the Galois
//! connection.

pub mod cancel;
pub mod concepts;
pub mod error;
pub mod implications;
pub mod incidence;
pub mod logic;
pub mod next_closure;
pub mod set;
pub mod sparse;

pub use cancel::CancelToken;
pub use concepts::{Concept, ConceptSet};
pub use error::FcaError;
pub use implications::{
    Implication, ImplicationFilter, ImplicationSet, RewriteRegistry, RuleClosure,
};
pub use incidence::Incidence;
pub use logic::{current_logic, register_logic, use_logic, with_logic, Logic};
pub use next_closure::{lectic_cmp, Enumeration, Mode, NextClosure};
pub use set::{FuzzySet, Universe};
