//! Image-pyramid sources for the teravox streaming cache.
//!
//! - [`PyramidSource`]: the fill/metadata interface a volume exposes
//! - [`SourceStack`]: per-source cached metadata with explicit invalidation
//! - [`SyntheticPyramid`]: deterministic noise volume for tests and demos
//! - [`ThrottledSource`]: simulates data that has not arrived yet

pub mod pyramid;
pub mod stack;
pub mod synthetic;
pub mod throttle;

pub use pyramid::PyramidSource;
pub use stack::{SourceStack, StackKind};
pub use synthetic::{SyntheticConfig, SyntheticPyramid};
pub use throttle::ThrottledSource;
