//! Common utilities shared across all document store implementations

pub mod error;

pub use error::{DatabaseError, DatabaseResult};
