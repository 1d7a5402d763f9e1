//! Graphics Pipeline State Cache
//!
//! One [`GraphicsPipelineStateCache`] exists per requested
//! [`GraphicsPipelineStateSignature`]. Caches live in a slot map and are
//! addressed through generational [`GraphicsPipelineStateCacheHandle`]s, so a
//! compiler request that outlives its cache (e.g. after
//! [`GraphicsPipelineStateCacheManager::clear_material_blueprint`]) resolves
//! to nothing at dispatch instead of touching a stale entry.
//!
//! # Lookup
//!
//! ```text
//! get_graphics_pipeline_state_cache_by_combination(material, properties)
//!   ├─ known signature, object ready      → object
//!   ├─ known signature, in flight/failed  → fallback
//!   └─ unknown signature
//!        ├─ synchronous (or emergency)    → compile inline → object
//!        └─ asynchronous                  → enqueue → fallback
//! ```
//!
//! The fallback is the ready pipeline state of the same material blueprint
//! under its default shader properties, if there is one.

use std::sync::Arc;

use lumen_core::AssetId;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use super::blueprint::{BlueprintStore, MaterialBlueprint};
use super::compiler::GraphicsPipelineStateCompiler;
use super::signature::{GraphicsPipelineStateSignature, GraphicsPipelineStateSignatureId};
use super::ShaderProperties;
use crate::backend::PipelineStateHandle;
use crate::errors::{RenderError, Result};

new_key_type! {
    /// Generational handle of a [`GraphicsPipelineStateCache`].
    pub struct GraphicsPipelineStateCacheHandle;
}

// ─── Cache Entry ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct GraphicsPipelineStateCache {
    signature: GraphicsPipelineStateSignature,
    material_blueprint: Arc<MaterialBlueprint>,
    pipeline_state: Option<PipelineStateHandle>,
    /// `true` while a compiler request for this cache is in flight; users
    /// receive the fallback in the meantime.
    is_using_fallback: bool,
    last_error: Option<RenderError>,
}

impl GraphicsPipelineStateCache {
    pub(crate) fn new(
        signature: GraphicsPipelineStateSignature,
        material_blueprint: Arc<MaterialBlueprint>,
    ) -> Self {
        Self {
            signature,
            material_blueprint,
            pipeline_state: None,
            is_using_fallback: false,
            last_error: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn signature(&self) -> &GraphicsPipelineStateSignature {
        &self.signature
    }

    #[inline]
    #[must_use]
    pub fn material_blueprint(&self) -> &Arc<MaterialBlueprint> {
        &self.material_blueprint
    }

    #[inline]
    #[must_use]
    pub fn pipeline_state(&self) -> Option<&PipelineStateHandle> {
        self.pipeline_state.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_using_fallback(&self) -> bool {
        self.is_using_fallback
    }

    /// `true` if the last compilation of this cache failed.
    #[inline]
    #[must_use]
    pub fn compile_failed(&self) -> bool {
        self.last_error.is_some()
    }

    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&RenderError> {
        self.last_error.as_ref()
    }

    /// Ready to draw with: an object exists and no request is pending.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pipeline_state.is_some() && !self.is_using_fallback
    }

    pub(crate) fn begin_compilation(&mut self) {
        self.is_using_fallback = true;
        self.last_error = None;
    }

    pub(crate) fn finish_compilation(&mut self, pipeline_state: PipelineStateHandle) {
        self.pipeline_state = Some(pipeline_state);
        self.is_using_fallback = false;
        self.last_error = None;
    }

    /// Keeps a previous object, if any, so users degrade to the old state.
    pub(crate) fn fail_compilation(&mut self, error: RenderError) {
        self.is_using_fallback = false;
        self.last_error = Some(error);
    }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Owns every pipeline state cache. Render thread only.
pub struct GraphicsPipelineStateCacheManager {
    store: Arc<BlueprintStore>,
    caches: SlotMap<GraphicsPipelineStateCacheHandle, GraphicsPipelineStateCache>,
    lookup: FxHashMap<GraphicsPipelineStateSignatureId, GraphicsPipelineStateCacheHandle>,
}

impl GraphicsPipelineStateCacheManager {
    #[must_use]
    pub fn new(store: Arc<BlueprintStore>) -> Self {
        Self {
            store,
            caches: SlotMap::with_key(),
            lookup: FxHashMap::default(),
        }
    }

    /// Returns the pipeline state for `material_blueprint_id` under
    /// `shader_properties`, creating and compiling its cache on first use.
    ///
    /// With asynchronous compilation the first call returns the fallback (or
    /// `None`) and the real object shows up once the compiler dispatched it.
    /// `allow_emergency_synchronous_compilation` compiles inline instead, for
    /// callers that cannot draw with a fallback.
    pub fn get_graphics_pipeline_state_cache_by_combination(
        &mut self,
        compiler: &mut GraphicsPipelineStateCompiler,
        material_blueprint_id: AssetId,
        shader_properties: &ShaderProperties,
        allow_emergency_synchronous_compilation: bool,
    ) -> Result<Option<PipelineStateHandle>> {
        let material_blueprint = self
            .store
            .material_blueprint(material_blueprint_id)
            .ok_or(RenderError::MaterialBlueprintNotFound(material_blueprint_id))?;
        let signature =
            GraphicsPipelineStateSignature::new(&material_blueprint, shader_properties, &self.store)?;

        if let Some(&handle) = self.lookup.get(&signature.signature_id())
            && let Some(cache) = self.caches.get(handle)
        {
            if cache.is_ready() {
                return Ok(cache.pipeline_state.clone());
            }
            if !cache.is_using_fallback() && cache.pipeline_state.is_some() {
                // Failed recompilation: keep drawing with the previous object.
                return Ok(cache.pipeline_state.clone());
            }
            return Ok(self.fallback_pipeline_state(&material_blueprint));
        }

        let signature_id = signature.signature_id();
        let handle = self
            .caches
            .insert(GraphicsPipelineStateCache::new(signature, Arc::clone(&material_blueprint)));
        self.lookup.insert(signature_id, handle);

        let synchronous =
            !compiler.is_asynchronous_compilation_enabled() || allow_emergency_synchronous_compilation;
        let Some(cache) = self.caches.get_mut(handle) else {
            return Ok(None);
        };

        if synchronous {
            match compiler.instant_synchronous_compiler_request(cache) {
                Ok(pipeline_state) => Ok(Some(pipeline_state)),
                Err(err) => {
                    log::error!(
                        "Synchronous pipeline state compilation failed for {}: {err}",
                        material_blueprint.debug_name
                    );
                    Ok(self.fallback_pipeline_state(&material_blueprint))
                }
            }
        } else {
            compiler.add_asynchronous_compiler_request(handle, cache);
            Ok(self.fallback_pipeline_state(&material_blueprint))
        }
    }

    /// Ready pipeline state of `material_blueprint` under its default shader
    /// properties.
    #[must_use]
    pub fn fallback_pipeline_state(
        &self,
        material_blueprint: &MaterialBlueprint,
    ) -> Option<PipelineStateHandle> {
        let signature = GraphicsPipelineStateSignature::new(
            material_blueprint,
            &ShaderProperties::new(),
            &self.store,
        )
        .ok()?;
        let handle = *self.lookup.get(&signature.signature_id())?;
        self.caches
            .get(handle)
            .and_then(|cache| cache.pipeline_state.clone())
    }

    #[must_use]
    pub fn get(&self, handle: GraphicsPipelineStateCacheHandle) -> Option<&GraphicsPipelineStateCache> {
        self.caches.get(handle)
    }

    pub(crate) fn get_mut(
        &mut self,
        handle: GraphicsPipelineStateCacheHandle,
    ) -> Option<&mut GraphicsPipelineStateCache> {
        self.caches.get_mut(handle)
    }

    #[must_use]
    pub fn find(
        &self,
        signature_id: GraphicsPipelineStateSignatureId,
    ) -> Option<GraphicsPipelineStateCacheHandle> {
        self.lookup.get(&signature_id).copied()
    }

    /// Drops every cache of a material blueprint, e.g. after it was reloaded.
    /// Pending compiler requests for those caches are discarded at dispatch.
    pub fn clear_material_blueprint(&mut self, material_blueprint_id: AssetId) -> usize {
        let before = self.caches.len();
        self.caches
            .retain(|_, cache| cache.signature.material_blueprint_id() != material_blueprint_id);
        let caches = &self.caches;
        self.lookup.retain(|_, handle| caches.contains_key(*handle));

        let removed = before - self.caches.len();
        if removed > 0 {
            log::debug!("Cleared {removed} pipeline state caches of {material_blueprint_id}");
        }
        removed
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
