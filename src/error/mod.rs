//! Error types.
//!
//! Invalid data is reported as [`Violation`]s collected into a context or a
//! [`Violations`] collection. Invalid schema configuration is a
//! [`SchemaConfigError`] returned from schema construction.

mod config_error;
mod violation;

pub use config_error::SchemaConfigError;
pub use violation::{Violation, ViolationKind, Violations};
