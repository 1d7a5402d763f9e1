//! Framebuffer Manager
//!
//! Maps compositor framebuffer ids to their [`FramebufferSignature`] and
//! deduplicates the physical framebuffers by signature id: two nodes that
//! declare logically identical framebuffers render into one backend object.
//! Physical framebuffers are reference counted and recreated when the
//! viewport size changes.

use std::sync::Arc;

use lumen_core::CompositorFramebufferId;
use rustc_hash::FxHashMap;

use super::render_target_texture_manager::RenderTargetTextureManager;
use crate::backend::{RenderBackend, RenderTarget, TextureAttachment};
use crate::errors::{RenderError, Result};
use crate::signature::{FramebufferSignature, FramebufferSignatureAttachment, FramebufferSignatureId};

struct FramebufferElement {
    render_target: Arc<dyn RenderTarget>,
    viewport_size: (u32, u32),
    reference_count: u32,
}

pub struct FramebufferManager {
    backend: Arc<dyn RenderBackend>,
    signatures: FxHashMap<CompositorFramebufferId, FramebufferSignature>,
    framebuffers: FxHashMap<FramebufferSignatureId, FramebufferElement>,
}

impl FramebufferManager {
    #[must_use]
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            signatures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
        }
    }

    /// Declares a compositor framebuffer.
    pub fn add(&mut self, id: CompositorFramebufferId, signature: FramebufferSignature) {
        if let Some(previous) = self.signatures.insert(id, signature)
            && previous.framebuffer_signature_id() != signature.framebuffer_signature_id()
        {
            log::warn!("Compositor framebuffer {id} redeclared with a different signature");
        }
    }

    #[must_use]
    pub fn signature(&self, id: CompositorFramebufferId) -> Option<&FramebufferSignature> {
        self.signatures.get(&id)
    }

    /// Acquires the physical framebuffer of `id`, creating its attachments
    /// through `textures`. Each call adds a reference released by
    /// [`release`](Self::release).
    pub fn get_framebuffer(
        &mut self,
        id: CompositorFramebufferId,
        textures: &mut RenderTargetTextureManager,
        viewport_size: (u32, u32),
    ) -> Result<Arc<dyn RenderTarget>> {
        let signature = *self
            .signatures
            .get(&id)
            .ok_or(RenderError::UnknownFramebuffer(id))?;
        let signature_id = signature.framebuffer_signature_id();

        if let Some(element) = self.framebuffers.get_mut(&signature_id)
            && element.viewport_size == viewport_size
        {
            element.reference_count += 1;
            return Ok(Arc::clone(&element.render_target));
        }

        let color_attachments = signature
            .color_attachments()
            .iter()
            .filter_map(|attachment| resolve_attachment(attachment, textures, viewport_size).transpose())
            .collect::<Result<Vec<_>>>()?;
        let depth_stencil_attachment =
            resolve_attachment(signature.depth_stencil_attachment(), textures, viewport_size)?;

        let render_target = self
            .backend
            .create_framebuffer(&color_attachments, depth_stencil_attachment.as_ref())?;
        log::debug!(
            "Created framebuffer {id} (signature {signature_id:#010x}, {} color attachments)",
            color_attachments.len()
        );

        let reference_count = self
            .framebuffers
            .get(&signature_id)
            .map_or(0, |element| element.reference_count)
            + 1;
        self.framebuffers.insert(
            signature_id,
            FramebufferElement {
                render_target: Arc::clone(&render_target),
                viewport_size,
                reference_count,
            },
        );
        Ok(render_target)
    }

    /// Drops one reference of the physical framebuffer behind `id`.
    pub fn release(&mut self, id: CompositorFramebufferId) {
        let Some(signature) = self.signatures.get(&id) else {
            log::warn!("Releasing unknown compositor framebuffer {id}");
            return;
        };
        let signature_id = signature.framebuffer_signature_id();
        if let Some(element) = self.framebuffers.get_mut(&signature_id) {
            element.reference_count -= 1;
            if element.reference_count == 0 {
                self.framebuffers.remove(&signature_id);
                log::debug!("Released framebuffer {id} (signature {signature_id:#010x})");
            }
        }
    }

    /// Number of live physical framebuffers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

fn resolve_attachment(
    attachment: &FramebufferSignatureAttachment,
    textures: &mut RenderTargetTextureManager,
    viewport_size: (u32, u32),
) -> Result<Option<TextureAttachment>> {
    let Some(asset_id) = attachment.texture_asset_id else {
        return Ok(None);
    };
    Ok(Some(TextureAttachment {
        texture: textures.get_texture(asset_id, viewport_size)?,
        mipmap_index: attachment.mipmap_index,
        layer_index: attachment.layer_index,
    }))
}
