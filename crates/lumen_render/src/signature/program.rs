//! Shader combination and graphics program ids.

use std::fmt;

use lumen_core::Fnv1a32;

use crate::backend::{ShaderStageArray, ShaderType};

/// Identifies one concrete shader: a shader blueprint plus the values of the
/// shader properties it references.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderCombinationId(u32);

impl ShaderCombinationId {
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
}

impl fmt::Debug for ShaderCombinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShaderCombinationId({:#010x})", self.0)
    }
}

/// Identifies a linked graphics program: the tuple of shader combinations of
/// all five stages. Identical tuples always produce identical ids, so program
/// objects are shared by pipeline states that only differ in fixed-function
/// state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphicsProgramCacheId(u32);

impl GraphicsProgramCacheId {
    /// Hashes the stage combination ids in stage order, an unused stage
    /// contributing `u32::MAX`.
    #[must_use]
    pub fn from_shader_combination_ids(
        shader_combination_ids: &ShaderStageArray<Option<ShaderCombinationId>>,
    ) -> Self {
        let hasher = ShaderType::ALL.iter().fold(Fnv1a32::new(), |hasher, shader_type| {
            let raw = shader_combination_ids[shader_type.index()].map_or(u32::MAX, ShaderCombinationId::raw);
            hasher.write_u32(raw)
        });
        Self(hasher.finish())
    }

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
}

impl fmt::Debug for GraphicsProgramCacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphicsProgramCacheId({:#010x})", self.0)
    }
}
