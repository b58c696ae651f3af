//! Shared card identity primitives for MTG inventory tooling.
//!
//! Condition grades and the normalized lookup key used to match scanned
//! inventory against a marketplace catalog.

pub mod condition;
pub mod normalize;

pub use condition::{Condition, ConditionLabel, Finish, UnknownCondition};
pub use normalize::{normalize, NormalizedKey, FACE_SEPARATOR, LIST_SET};
