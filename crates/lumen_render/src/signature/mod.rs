//! GPU Object Signatures
//!
//! Pure value types that hash structural descriptions of GPU objects into
//! 32-bit ids used as cache keys:
//!
//! | Signature | Deduplicates |
//! |-----------|--------------|
//! | [`FramebufferSignature`] | physical framebuffers |
//! | [`RenderTargetTextureSignature`] | render target textures |
//! | [`GraphicsProgramCacheId`] | linked graphics programs |
//!
//! All ids are FNV-1a 32-bit over the byte sequences documented in each
//! module and are stable across runs and platforms of equal endianness.

pub mod framebuffer;
pub mod program;
pub mod render_target_texture;

pub use framebuffer::{
    FramebufferSignature, FramebufferSignatureAttachment, FramebufferSignatureId,
    MAX_NUMBER_OF_COLOR_ATTACHMENTS,
};
pub use program::{GraphicsProgramCacheId, ShaderCombinationId};
pub use render_target_texture::{RenderTargetTextureSignature, RenderTargetTextureSignatureId};
