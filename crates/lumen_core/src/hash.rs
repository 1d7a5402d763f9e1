//! FNV-1a 32-bit Hashing
//!
//! Every persisted identifier in the runtime (string ids, framebuffer and
//! render-target-texture signatures, shader combination and graphics program
//! ids) is an FNV-1a 32-bit hash over a documented byte sequence. The constants
//! below are part of that contract and must never change, otherwise ids stored
//! in baked caches stop matching.
//!
//! # Usage
//!
//! ```rust
//! use lumen_core::hash::{Fnv1a32, FNV1A_INITIAL_HASH_32, fnv1a32};
//!
//! let one_shot = fnv1a32(b"abc", FNV1A_INITIAL_HASH_32);
//! let incremental = Fnv1a32::new().write_bytes(b"a").write_bytes(b"bc").finish();
//! assert_eq!(one_shot, incremental);
//! ```

/// Initial basis of the running hash.
pub const FNV1A_INITIAL_HASH_32: u32 = 0xcbf2_9ce4;

/// Multiplication prime.
pub const FNV1A_MAGIC_PRIME_32: u32 = 0x0100_0193;

/// Continues an FNV-1a hash over `bytes`, starting from `hash`.
#[inline]
#[must_use]
pub const fn fnv1a32(bytes: &[u8], hash: u32) -> u32 {
    let mut hash = hash;
    let mut i = 0;
    while i < bytes.len() {
        hash = (hash ^ bytes[i] as u32).wrapping_mul(FNV1A_MAGIC_PRIME_32);
        i += 1;
    }
    hash
}

/// Incremental FNV-1a builder.
///
/// Multi-byte values are fed in little-endian order, which is the in-memory
/// layout of the structs the ids were originally computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv1a32 {
    hash: u32,
}

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a32 {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hash: FNV1A_INITIAL_HASH_32,
        }
    }

    /// Resumes hashing from a previously computed value.
    #[inline]
    #[must_use]
    pub const fn with_seed(hash: u32) -> Self {
        Self { hash }
    }

    #[inline]
    #[must_use]
    pub const fn write_bytes(self, bytes: &[u8]) -> Self {
        Self {
            hash: fnv1a32(bytes, self.hash),
        }
    }

    #[inline]
    #[must_use]
    pub const fn write_u8(self, value: u8) -> Self {
        self.write_bytes(&[value])
    }

    #[inline]
    #[must_use]
    pub const fn write_u32(self, value: u32) -> Self {
        self.write_bytes(&value.to_le_bytes())
    }

    #[inline]
    #[must_use]
    pub const fn write_i32(self, value: i32) -> Self {
        self.write_bytes(&value.to_le_bytes())
    }

    #[inline]
    #[must_use]
    pub fn write_f32(self, value: f32) -> Self {
        self.write_bytes(&value.to_le_bytes())
    }

    #[inline]
    #[must_use]
    pub const fn finish(self) -> u32 {
        self.hash
    }
}
