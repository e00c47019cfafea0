//! Domain-level errors (no external dependencies)

use itertools::Itertools;
use thiserror::Error;

use crate::domain::validate::Issue;

/// Domain errors represent violations of genealogy invariants.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid roster: {}", .0.iter().join("; "))]
    InvalidRoster(Vec<Issue>),
}
