//! GPU tile cache for block-streamed volume pyramids.
//!
//! - [`TileCache`]: LRU map from block keys to texture tile slots
//! - [`UploadPipeline`]: staged fill and transfer of requested blocks
//! - [`StagingBuffer`] / [`TileTexture`]: the graphics backend seams
//! - [`MemoryTileTexture`]: byte-array backend for tests and headless runs

pub mod backend;
pub mod cache;
pub mod error;
pub mod memory;
pub mod tile;
pub mod upload;

pub use backend::{StagingBuffer, TileTexture};
pub use cache::{StageResult, StagedBlock, TileCache};
pub use error::{CacheError, Result};
pub use memory::{MemoryStaging, MemoryTileTexture};
pub use tile::{Tile, TileIndex};
pub use upload::{FillMode, FillTask, UploadConfig, UploadPipeline, UploadStats};
