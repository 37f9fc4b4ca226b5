//! Shared identifier types used across the shopping assistant crates.

pub mod types;

pub use types::{Revision, SessionId};
