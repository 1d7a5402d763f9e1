//! Render Target Texture Signature
//!
//! Describes a render target texture a compositor node wants allocated.
//! Nodes requesting logically identical intermediate targets produce the same
//! [`RenderTargetTextureSignatureId`], which lets the texture manager share
//! them.
//!
//! # Hashed byte sequence
//!
//! ```text
//! fnv1a32( width u32 | height u32     (None → u32::MAX, 4 bytes LE each)
//!        ‖ texture_format u8 ‖ flags u8
//!        ‖ width_scale f32 ‖ height_scale f32 (4 bytes LE each) )
//! ```

use lumen_core::Fnv1a32;

use crate::backend::{TextureFlags, TextureFormat};

pub type RenderTargetTextureSignatureId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetTextureSignature {
    width: Option<u32>,
    height: Option<u32>,
    texture_format: TextureFormat,
    flags: TextureFlags,
    width_scale: f32,
    height_scale: f32,
    render_target_texture_signature_id: RenderTargetTextureSignatureId,
}

impl RenderTargetTextureSignature {
    /// `width`/`height` of `None` mean "derive from the viewport", scaled by
    /// `width_scale`/`height_scale`.
    ///
    /// # Panics
    ///
    /// Panics if a scale is not strictly positive.
    #[must_use]
    pub fn new(
        width: Option<u32>,
        height: Option<u32>,
        texture_format: TextureFormat,
        flags: TextureFlags,
        width_scale: f32,
        height_scale: f32,
    ) -> Self {
        assert!(
            width_scale > 0.0 && height_scale > 0.0,
            "Invalid render target texture scale {width_scale}x{height_scale}"
        );

        let render_target_texture_signature_id = Fnv1a32::new()
            .write_u32(width.unwrap_or(u32::MAX))
            .write_u32(height.unwrap_or(u32::MAX))
            .write_u8(texture_format as u8)
            .write_u8(flags.bits())
            .write_f32(width_scale)
            .write_f32(height_scale)
            .finish();

        Self {
            width,
            height,
            texture_format,
            flags,
            width_scale,
            height_scale,
            render_target_texture_signature_id,
        }
    }

    /// Fixed size texture.
    #[must_use]
    pub fn fixed(width: u32, height: u32, texture_format: TextureFormat, flags: TextureFlags) -> Self {
        Self::new(Some(width), Some(height), texture_format, flags, 1.0, 1.0)
    }

    /// Viewport sized texture, scaled by `scale` on both axes.
    #[must_use]
    pub fn viewport_relative(texture_format: TextureFormat, flags: TextureFlags, scale: f32) -> Self {
        Self::new(None, None, texture_format, flags, scale, scale)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn texture_format(&self) -> TextureFormat {
        self.texture_format
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn width_scale(&self) -> f32 {
        self.width_scale
    }

    #[inline]
    #[must_use]
    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    #[inline]
    #[must_use]
    pub fn render_target_texture_signature_id(&self) -> RenderTargetTextureSignatureId {
        self.render_target_texture_signature_id
    }

    /// Whether the final size depends on the viewport.
    #[inline]
    #[must_use]
    pub fn is_viewport_relative(&self) -> bool {
        self.width.is_none() || self.height.is_none()
    }

    /// Physical size for a given viewport size and global resolution scale.
    ///
    /// Fixed dimensions are used as-is. Viewport derived dimensions are scaled
    /// by the per-axis scale and, if [`TextureFlags::ALLOW_RESOLUTION_SCALE`]
    /// is set, by `resolution_scale`. Never returns a zero dimension.
    #[must_use]
    pub fn resolve_size(&self, viewport_size: (u32, u32), resolution_scale: f32) -> (u32, u32) {
        let resolution_scale = if self.flags.contains(TextureFlags::ALLOW_RESOLUTION_SCALE) {
            resolution_scale
        } else {
            1.0
        };
        let scaled = |size: u32, scale: f32| ((size as f32 * scale * resolution_scale) as u32).max(1);

        (
            self.width
                .unwrap_or_else(|| scaled(viewport_size.0, self.width_scale)),
            self.height
                .unwrap_or_else(|| scaled(viewport_size.1, self.height_scale)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{FNV1A_INITIAL_HASH_32, fnv1a32};

    #[test]
    fn test_id_matches_documented_byte_sequence() {
        let flags = TextureFlags::RENDER_TARGET | TextureFlags::SHADER_RESOURCE;
        let signature =
            RenderTargetTextureSignature::new(None, Some(256), TextureFormat::R16G16B16A16F, flags, 0.5, 1.0);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&256u32.to_le_bytes());
        bytes.push(TextureFormat::R16G16B16A16F as u8);
        bytes.push(flags.bits());
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());

        assert_eq!(
            signature.render_target_texture_signature_id(),
            fnv1a32(&bytes, FNV1A_INITIAL_HASH_32)
        );
    }

    #[test]
    fn test_resolve_size() {
        let fixed = RenderTargetTextureSignature::fixed(
            512,
            512,
            TextureFormat::R8G8B8A8,
            TextureFlags::RENDER_TARGET,
        );
        assert_eq!(fixed.resolve_size((1920, 1080), 0.5), (512, 512));

        let half = RenderTargetTextureSignature::viewport_relative(
            TextureFormat::R11G11B10F,
            TextureFlags::RENDER_TARGET,
            0.5,
        );
        assert_eq!(half.resolve_size((1920, 1080), 0.5), (960, 540));

        let scalable = RenderTargetTextureSignature::viewport_relative(
            TextureFormat::R11G11B10F,
            TextureFlags::RENDER_TARGET | TextureFlags::ALLOW_RESOLUTION_SCALE,
            1.0,
        );
        assert_eq!(scalable.resolve_size((1920, 1080), 0.5), (960, 540));
        assert_eq!(scalable.resolve_size((1, 1), 0.25), (1, 1));
    }

    #[test]
    fn test_scale_changes_id() {
        let a = RenderTargetTextureSignature::viewport_relative(
            TextureFormat::R8G8B8A8,
            TextureFlags::RENDER_TARGET,
            1.0,
        );
        let b = RenderTargetTextureSignature::viewport_relative(
            TextureFormat::R8G8B8A8,
            TextureFlags::RENDER_TARGET,
            0.5,
        );
        assert_ne!(
            a.render_target_texture_signature_id(),
            b.render_target_texture_signature_id()
        );
    }
}
