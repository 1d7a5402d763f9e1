//! Graphics Program Cache
//!
//! Linked graphics programs keyed by [`GraphicsProgramCacheId`]. Programs are
//! created on the render thread only (dispatch or an instant synchronous
//! request), so the manager needs no locking of its own.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::shader_cache::ShaderCache;
use crate::backend::{GraphicsProgramHandle, RenderBackend, ShaderStageArray};
use crate::errors::Result;
use crate::signature::GraphicsProgramCacheId;

#[derive(Default)]
pub struct GraphicsProgramCacheManager {
    programs: FxHashMap<GraphicsProgramCacheId, GraphicsProgramHandle>,
}

impl GraphicsProgramCacheManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: GraphicsProgramCacheId) -> Option<GraphicsProgramHandle> {
        self.programs.get(&id).cloned()
    }

    /// Returns the cached program or links a new one from `shader_caches`.
    pub fn get_or_create(
        &mut self,
        backend: &dyn RenderBackend,
        id: GraphicsProgramCacheId,
        shader_caches: &ShaderStageArray<Option<Arc<ShaderCache>>>,
    ) -> Result<GraphicsProgramHandle> {
        if let Some(program) = self.programs.get(&id) {
            return Ok(program.clone());
        }

        let bytecode = shader_caches
            .each_ref()
            .map(|cache| cache.as_ref().map(|cache| Arc::clone(cache.bytecode())));
        let program = backend.create_graphics_program(id, &bytecode)?;
        log::debug!("Created graphics program {id:?}");

        self.programs.insert(id, program.clone());
        Ok(program)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn clear(&mut self) {
        self.programs.clear();
    }
}
