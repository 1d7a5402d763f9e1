//! String Identifiers
//!
//! Compact 32-bit identifiers derived from a string with FNV-1a. They key
//! assets, compositor channels, framebuffers, pass types and shader properties.
//!
//! "No value" is modelled with `Option<StringId>`. When an id has to be fed
//! into a persisted hash, [`StringId::raw_or_invalid`] maps `None` to
//! [`INVALID_ID`] so the byte image stays identical to the sentinel convention
//! used by baked caches. The consequence is that an id whose hash happens to be
//! `u32::MAX` is indistinguishable from "absent" inside such hashes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::{FNV1A_INITIAL_HASH_32, fnv1a32};

/// Raw value representing "no id" inside hashed byte sequences.
pub const INVALID_ID: u32 = u32::MAX;

/// FNV-1a hash of a string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringId(u32);

impl StringId {
    /// Hashes `name`. Usable in `const` context.
    #[inline]
    #[must_use]
    pub const fn new(name: &str) -> Self {
        Self(fnv1a32(name.as_bytes(), FNV1A_INITIAL_HASH_32))
    }

    /// Wraps an already computed hash.
    #[inline]
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Raw value of an optional id, [`INVALID_ID`] for `None`.
    #[inline]
    #[must_use]
    pub const fn raw_or_invalid(id: Option<Self>) -> u32 {
        match id {
            Some(id) => id.0,
            None => INVALID_ID,
        }
    }
}

impl From<&str> for StringId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringId({:#010x})", self.0)
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset id (texture, material blueprint, shader blueprint, ...).
pub type AssetId = StringId;

/// Compositor channel id, the external interconnection between nodes.
pub type CompositorChannelId = StringId;

/// Compositor framebuffer id, local to a compositor node.
pub type CompositorFramebufferId = StringId;

/// Compositor pass type id.
pub type CompositorPassTypeId = StringId;

/// Shader property id.
pub type ShaderPropertyId = StringId;
