//! Framebuffer Signature
//!
//! Structural description of a framebuffer's attachment set, hashed into a
//! [`FramebufferSignatureId`] that deduplicates physical framebuffer objects.
//!
//! # Hashed byte sequence
//!
//! ```text
//! fnv1a32( number_of_color_attachments as u32 (4 bytes, LE)
//!        ‖ raw(color_attachments[0]) ‖ … ‖ raw(color_attachments[n-1])
//!        ‖ raw(depth_stencil_attachment) )
//!
//! raw(attachment) = #[repr(C)] { texture_asset_id: u32, mipmap_index: u32, layer_index: u32 }
//! ```
//!
//! The depth/stencil attachment is always hashed. "No depth/stencil" is an
//! attachment whose texture asset id is `None`, hashed as `u32::MAX`.

use std::hash::{Hash, Hasher};

use bytemuck::{Pod, Zeroable};
use lumen_core::{AssetId, Fnv1a32, StringId};

/// Maximum number of simultaneous color attachments.
pub const MAX_NUMBER_OF_COLOR_ATTACHMENTS: usize = 8;

pub type FramebufferSignatureId = u32;

/// One attachment slot of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferSignatureAttachment {
    pub texture_asset_id: Option<AssetId>,
    pub mipmap_index: u32,
    pub layer_index: u32,
}

/// In-memory image of an attachment as it is fed into the hash.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct RawAttachment {
    texture_asset_id: u32,
    mipmap_index: u32,
    layer_index: u32,
}

impl FramebufferSignatureAttachment {
    #[inline]
    #[must_use]
    pub const fn new(texture_asset_id: AssetId, mipmap_index: u32, layer_index: u32) -> Self {
        Self {
            texture_asset_id: Some(texture_asset_id),
            mipmap_index,
            layer_index,
        }
    }

    /// The "no attachment" value.
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self {
            texture_asset_id: None,
            mipmap_index: 0,
            layer_index: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.texture_asset_id.is_some()
    }

    fn raw(&self) -> RawAttachment {
        RawAttachment {
            texture_asset_id: StringId::raw_or_invalid(self.texture_asset_id),
            mipmap_index: self.mipmap_index,
            layer_index: self.layer_index,
        }
    }
}

/// Complete attachment set of a framebuffer plus its derived id.
///
/// Immutable after construction; copied by value into compositor framebuffer
/// declarations. Equality and hashing ignore unused color slots, matching the
/// signature id.
#[derive(Debug, Clone, Copy)]
pub struct FramebufferSignature {
    number_of_color_attachments: u8,
    color_attachments: [FramebufferSignatureAttachment; MAX_NUMBER_OF_COLOR_ATTACHMENTS],
    depth_stencil_attachment: FramebufferSignatureAttachment,
    framebuffer_signature_id: FramebufferSignatureId,
}

impl FramebufferSignature {
    /// # Panics
    ///
    /// Panics if `number_of_color_attachments` exceeds
    /// [`MAX_NUMBER_OF_COLOR_ATTACHMENTS`].
    #[must_use]
    pub fn new(
        number_of_color_attachments: u8,
        color_attachments: [FramebufferSignatureAttachment; MAX_NUMBER_OF_COLOR_ATTACHMENTS],
        depth_stencil_attachment: FramebufferSignatureAttachment,
    ) -> Self {
        assert!(
            number_of_color_attachments as usize <= MAX_NUMBER_OF_COLOR_ATTACHMENTS,
            "Invalid number of color attachments: {number_of_color_attachments}"
        );

        let mut hasher = Fnv1a32::new().write_u32(u32::from(number_of_color_attachments));
        for attachment in &color_attachments[..number_of_color_attachments as usize] {
            hasher = hasher.write_bytes(bytemuck::bytes_of(&attachment.raw()));
        }
        hasher = hasher.write_bytes(bytemuck::bytes_of(&depth_stencil_attachment.raw()));

        Self {
            number_of_color_attachments,
            color_attachments,
            depth_stencil_attachment,
            framebuffer_signature_id: hasher.finish(),
        }
    }

    /// Builds a signature from a slice of used color attachments.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_NUMBER_OF_COLOR_ATTACHMENTS`] are given.
    #[must_use]
    pub fn from_attachments(
        color_attachments: &[FramebufferSignatureAttachment],
        depth_stencil_attachment: FramebufferSignatureAttachment,
    ) -> Self {
        assert!(
            color_attachments.len() <= MAX_NUMBER_OF_COLOR_ATTACHMENTS,
            "Invalid number of color attachments: {}",
            color_attachments.len()
        );
        let mut slots = [FramebufferSignatureAttachment::none(); MAX_NUMBER_OF_COLOR_ATTACHMENTS];
        slots[..color_attachments.len()].copy_from_slice(color_attachments);
        Self::new(color_attachments.len() as u8, slots, depth_stencil_attachment)
    }

    #[inline]
    #[must_use]
    pub fn number_of_color_attachments(&self) -> u8 {
        self.number_of_color_attachments
    }

    /// # Panics
    ///
    /// Panics if `index` is not below the number of color attachments.
    #[inline]
    #[must_use]
    pub fn color_attachment(&self, index: u8) -> &FramebufferSignatureAttachment {
        assert!(
            index < self.number_of_color_attachments,
            "Invalid color attachment index {index}"
        );
        &self.color_attachments[index as usize]
    }

    /// The used color attachments.
    #[inline]
    #[must_use]
    pub fn color_attachments(&self) -> &[FramebufferSignatureAttachment] {
        &self.color_attachments[..self.number_of_color_attachments as usize]
    }

    #[inline]
    #[must_use]
    pub fn depth_stencil_attachment(&self) -> &FramebufferSignatureAttachment {
        &self.depth_stencil_attachment
    }

    #[inline]
    #[must_use]
    pub fn framebuffer_signature_id(&self) -> FramebufferSignatureId {
        self.framebuffer_signature_id
    }
}

impl PartialEq for FramebufferSignature {
    fn eq(&self, other: &Self) -> bool {
        self.framebuffer_signature_id == other.framebuffer_signature_id
            && self.color_attachments() == other.color_attachments()
            && self.depth_stencil_attachment == other.depth_stencil_attachment
    }
}

impl Eq for FramebufferSignature {}

impl Hash for FramebufferSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.framebuffer_signature_id.hash(state);
    }
}
