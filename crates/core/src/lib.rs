//! `propdesk-core`: shared identifiers and the domain error model.
//!
//! This crate contains **pure** primitives (no transport, no storage).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{AttemptId, OrganizationId, UserId};
