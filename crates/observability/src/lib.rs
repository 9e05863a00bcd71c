//! Process-wide tracing/logging setup.

/// Tracing subscriber initialization (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
