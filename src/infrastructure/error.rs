//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// Errors surfacing from the wired-up services.
///
/// Roster I/O failures arrive as `ApplicationError::OperationFailed`, already
/// carrying the action and path, so this layer only forwards them.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),
}
