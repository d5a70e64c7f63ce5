//! Shared types for the snapmig facilities
//!
//! - **Schema constants**: canonical logging field keys and event names
//! - **Sensitive data**: `Sensitive<T>` marker for automatic redaction

pub mod schema;
pub mod sensitive;

pub use sensitive::Sensitive;
