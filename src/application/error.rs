//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DomainError, MemberId};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("unknown {role}: {id}")]
    UnknownReference { role: &'static str, id: MemberId },

    #[error("member {0} cannot be their own {1}")]
    SelfReference(MemberId, &'static str),

    #[error("making {parent} the parent of {member} would create a cycle")]
    ParentCycle { member: MemberId, parent: MemberId },

    #[error("invalid roster file {}: {message}", path.display())]
    RosterFormat { path: PathBuf, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
