//! Error types re-exported from hwid-error

pub use hwid_error::{HwidError, Result};
