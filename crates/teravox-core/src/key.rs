//! Content addresses for cached blocks.

use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Identity of one image: one source at one generation at one resolution level.
///
/// The cache never inspects the raw value; two blocks belong to the same image
/// precisely when their ids are equal. Source wrappers mint ids that embed a
/// generation counter, so invalidating a source changes the ids of all its
/// blocks and its stale tiles age out of the cache on their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ImageId(pub u64);

/// Content address of one padded block: which image, and where in its block grid.
///
/// Equality and hashing cover the image identity and all three grid
/// coordinates; these drive every cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockKey {
    /// Image the block belongs to
    pub image: ImageId,
    /// Block grid position within that image
    pub pos: IVec3,
}

impl BlockKey {
    /// Create a key for the block of `image` at grid position `pos`.
    #[inline]
    pub const fn new(image: ImageId, pos: IVec3) -> Self {
        Self { image, pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: BlockKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn keys_equal_iff_image_and_position_match() {
        let a = BlockKey::new(ImageId(7), IVec3::new(1, 2, 3));
        let b = BlockKey::new(ImageId(7), IVec3::new(1, 2, 3));
        let other_image = BlockKey::new(ImageId(8), IVec3::new(1, 2, 3));
        let other_pos = BlockKey::new(ImageId(7), IVec3::new(1, 2, 4));

        assert_eq!(a, b);
        assert_ne!(a, other_image);
        assert_ne!(a, other_pos);
    }

    #[test]
    fn equal_keys_hash_alike() {
        let a = BlockKey::new(ImageId(42), IVec3::new(9, 0, -1));
        let b = BlockKey::new(ImageId(42), IVec3::new(9, 0, -1));
        assert_eq!(hash_of(a), hash_of(b));
    }
}
