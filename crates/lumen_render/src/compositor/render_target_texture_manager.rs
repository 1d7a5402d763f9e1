//! Render Target Texture Manager
//!
//! Owns the render target textures compositor nodes declare. Several nodes
//! may declare the same asset id; the texture is then shared and reference
//! counted. Viewport relative textures are (re)created lazily whenever the
//! requested viewport size or the resolution scale changes.

use std::sync::Arc;

use lumen_core::AssetId;
use rustc_hash::FxHashMap;

use crate::backend::{RenderBackend, TextureHandle};
use crate::errors::{RenderError, Result};
use crate::signature::RenderTargetTextureSignature;

struct RenderTargetTextureElement {
    signature: RenderTargetTextureSignature,
    texture: Option<TextureHandle>,
    size: (u32, u32),
    reference_count: u32,
}

pub struct RenderTargetTextureManager {
    backend: Arc<dyn RenderBackend>,
    elements: FxHashMap<AssetId, RenderTargetTextureElement>,
    resolution_scale: f32,
}

impl RenderTargetTextureManager {
    #[must_use]
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            elements: FxHashMap::default(),
            resolution_scale: 1.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn resolution_scale(&self) -> f32 {
        self.resolution_scale
    }

    /// Affects textures flagged `ALLOW_RESOLUTION_SCALE`; they are recreated
    /// on their next request.
    pub fn set_resolution_scale(&mut self, resolution_scale: f32) {
        self.resolution_scale = resolution_scale;
    }

    /// Declares a texture. Redeclaring an asset id adds a reference; the
    /// first declared signature stays authoritative.
    pub fn add(&mut self, asset_id: AssetId, signature: RenderTargetTextureSignature) {
        let element = self
            .elements
            .entry(asset_id)
            .or_insert_with(|| RenderTargetTextureElement {
                signature,
                texture: None,
                size: (0, 0),
                reference_count: 0,
            });
        if element.signature.render_target_texture_signature_id()
            != signature.render_target_texture_signature_id()
        {
            log::warn!("Render target texture {asset_id} redeclared with a different signature");
        }
        element.reference_count += 1;
    }

    /// Returns the texture sized for `viewport_size`, creating or recreating
    /// it on demand.
    pub fn get_texture(&mut self, asset_id: AssetId, viewport_size: (u32, u32)) -> Result<TextureHandle> {
        let element = self
            .elements
            .get_mut(&asset_id)
            .ok_or(RenderError::UnknownRenderTargetTexture(asset_id))?;

        let size = element
            .signature
            .resolve_size(viewport_size, self.resolution_scale);
        if let Some(texture) = &element.texture
            && element.size == size
        {
            return Ok(texture.clone());
        }

        let texture = self
            .backend
            .create_render_target_texture(&element.signature, size.0, size.1)?;
        log::debug!("Created render target texture {asset_id} ({}x{})", size.0, size.1);

        element.texture = Some(texture.clone());
        element.size = size;
        Ok(texture)
    }

    /// Currently allocated texture, without creating one.
    #[must_use]
    pub fn texture(&self, asset_id: AssetId) -> Option<TextureHandle> {
        self.elements.get(&asset_id).and_then(|e| e.texture.clone())
    }

    #[must_use]
    pub fn signature(&self, asset_id: AssetId) -> Option<&RenderTargetTextureSignature> {
        self.elements.get(&asset_id).map(|e| &e.signature)
    }

    /// Drops one reference; the texture is destroyed with the last one.
    pub fn release(&mut self, asset_id: AssetId) {
        let Some(element) = self.elements.get_mut(&asset_id) else {
            log::warn!("Releasing unknown render target texture {asset_id}");
            return;
        };
        element.reference_count -= 1;
        if element.reference_count == 0 {
            self.elements.remove(&asset_id);
            log::debug!("Released render target texture {asset_id}");
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
