//! Error types, shared with the CLI through the `hwid-error` crate

pub use hwid_error::{HwidError, Result};
