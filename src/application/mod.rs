//! Application layer: record store and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod roster;
pub mod services;
pub mod store;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use store::{MemberDraft, MemberStore};
