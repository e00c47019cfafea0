//! Domain layer: genealogy records and the family tree algorithm
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod error;
pub mod forest;
pub mod member;
pub mod validate;

pub use builder::{build_forest, FamilyTreeBuilder, Placed};
pub use error::DomainError;
pub use forest::{FamilyForest, FamilyNode, ForestIterator, SpouseRef};
pub use member::{Member, MemberId};
pub use validate::{validate, Issue, ValidationReport};
