//! Cache error types.

use thiserror::Error;

/// Tile cache and upload pipeline errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The working set does not fit: more new blocks were staged than tiles
    /// can be reclaimed this round. A sizing error, not a transient condition.
    #[error(
        "cache capacity exceeded: {requested} new blocks requested, {evictable} tiles evictable"
    )]
    CapacityExceeded { requested: usize, evictable: usize },

    /// Tile grid with fewer than two tiles, or a zero axis.
    #[error("Invalid tile grid: {0}")]
    InvalidGrid(String),

    /// Upload pipeline configuration that cannot move any data.
    #[error("Invalid upload configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, CacheError>;
