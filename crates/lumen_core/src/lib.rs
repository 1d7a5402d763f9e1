//! Foundational value types of the Lumen renderer runtime.
//!
//! - [`hash`]: FNV-1a 32-bit hashing used by every persisted identifier
//! - [`string_id`]: 32-bit string ids and the id aliases built on them
//! - [`interner`]: global string interner for shader property names

pub mod hash;
pub mod interner;
pub mod string_id;

pub use hash::{FNV1A_INITIAL_HASH_32, FNV1A_MAGIC_PRIME_32, Fnv1a32, fnv1a32};
pub use string_id::{
    AssetId, CompositorChannelId, CompositorFramebufferId, CompositorPassTypeId, INVALID_ID,
    ShaderPropertyId, StringId,
};
