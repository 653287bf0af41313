//! Error types shared across the workspace.

use thiserror::Error;

/// Base error type for descriptor validation and addressing.
#[derive(Error, Debug)]
pub enum Error {
    /// Cache or block geometry that violates a construction invariant
    #[error("Invalid cache geometry: {0}")]
    InvalidSpec(String),

    /// Level index or grid position outside the addressed pyramid
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Input data that does not match the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
