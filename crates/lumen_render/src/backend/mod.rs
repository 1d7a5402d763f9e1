//! Backend Abstraction
//!
//! The native graphics APIs live outside this crate. The runtime core only
//! sees the narrow surface declared here:
//!
//! - [`RenderBackend`]: shader compilation plus program, pipeline state,
//!   render target texture and framebuffer creation
//! - [`RenderTarget`]: anything a command buffer can render into
//! - opaque handles ([`GraphicsProgramHandle`], [`PipelineStateHandle`],
//!   [`TextureHandle`]) wrapping whatever native object a backend returns
//! - [`CommandBuffer`]: the single-writer command list filled each frame
//!
//! # Threading
//!
//! [`RenderBackend::compile_shader`] is called from compiler worker threads.
//! Every `create_*` method is only ever called from the thread that owns
//! rendering (inside `GraphicsPipelineStateCompiler::dispatch`, the compositor
//! managers, or an instant synchronous compiler request).

pub mod command_buffer;
pub mod state;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::errors::BackendError;
use crate::signature::{GraphicsProgramCacheId, RenderTargetTextureSignature};

pub use command_buffer::{ClearFlags, Command, CommandBuffer};
pub use state::{
    BlendFactor, BlendOperation, BlendState, ComparisonFunc, CullMode, DepthStencilState,
    FillMode, FixedFunctionState, PrimitiveTopology, RasterizerState,
};

// ─── Shader Stages ───────────────────────────────────────────────────────────

/// Programmable stage of a graphics program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShaderType {
    Vertex = 0,
    TessellationControl = 1,
    TessellationEvaluation = 2,
    Geometry = 3,
    Fragment = 4,
}

/// One value per graphics shader stage, indexed by [`ShaderType::index`].
pub type ShaderStageArray<T> = [T; ShaderType::COUNT];

impl ShaderType {
    pub const COUNT: usize = 5;

    /// All stages in pipeline order.
    pub const ALL: [ShaderType; Self::COUNT] = [
        Self::Vertex,
        Self::TessellationControl,
        Self::TessellationEvaluation,
        Self::Geometry,
        Self::Fragment,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::TessellationControl => "tessellation_control",
            Self::TessellationEvaluation => "tessellation_evaluation",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
        }
    }
}

/// Backend specific compiled representation of one shader stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBytecode {
    pub shader_type: ShaderType,
    pub bytes: Vec<u8>,
}

impl ShaderBytecode {
    #[must_use]
    pub fn new(shader_type: ShaderType, bytes: Vec<u8>) -> Self {
        Self { shader_type, bytes }
    }
}

// ─── Textures ────────────────────────────────────────────────────────────────

/// Texture formats usable for render target textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TextureFormat {
    R8 = 0,
    R8G8B8A8 = 1,
    R8G8B8A8Srgb = 2,
    B8G8R8A8 = 3,
    R11G11B10F = 4,
    R16G16B16A16F = 5,
    R32G32B32A32F = 6,
    R32Float = 7,
    D32Float = 8,
}

impl TextureFormat {
    #[inline]
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::D32Float)
    }
}

bitflags! {
    /// Render target texture usage flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u8 {
        const UNORDERED_ACCESS       = 1 << 0;
        const SHADER_RESOURCE        = 1 << 1;
        const RENDER_TARGET          = 1 << 2;
        const ALLOW_MULTISAMPLE      = 1 << 3;
        const GENERATE_MIPMAPS       = 1 << 4;
        const ALLOW_RESOLUTION_SCALE = 1 << 5;
    }
}

// ─── Opaque Handles ──────────────────────────────────────────────────────────

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Arc<dyn Any + Send + Sync>);

        impl $name {
            pub fn new<T: Any + Send + Sync>(native: T) -> Self {
                Self(Arc::new(native))
            }

            /// Access the backend's native object.
            #[must_use]
            pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
                self.0.downcast_ref::<T>()
            }

            /// Identity comparison: `true` if both handles share one native object.
            #[must_use]
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($name), Arc::as_ptr(&self.0))
            }
        }
    };
}

opaque_handle!(
    /// Linked graphics program (all shader stages bound together).
    GraphicsProgramHandle
);
opaque_handle!(
    /// Graphics pipeline state object (program + fixed-function state).
    PipelineStateHandle
);
opaque_handle!(
    /// Render target texture.
    TextureHandle
);

/// One framebuffer attachment handed to [`RenderBackend::create_framebuffer`].
#[derive(Debug, Clone)]
pub struct TextureAttachment {
    pub texture: TextureHandle,
    pub mipmap_index: u32,
    pub layer_index: u32,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Something a command buffer can render into (swap chain or framebuffer).
pub trait RenderTarget: fmt::Debug + Send + Sync {
    fn width_and_height(&self) -> (u32, u32);

    fn debug_name(&self) -> &str {
        ""
    }
}

/// Entry points the runtime core needs from a native graphics backend.
pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Compiles shader source into bytecode. Called from compiler threads.
    fn compile_shader(
        &self,
        shader_type: ShaderType,
        source: &str,
    ) -> Result<ShaderBytecode, BackendError>;

    fn create_graphics_program(
        &self,
        graphics_program_cache_id: GraphicsProgramCacheId,
        bytecode: &ShaderStageArray<Option<Arc<ShaderBytecode>>>,
    ) -> Result<GraphicsProgramHandle, BackendError>;

    fn create_graphics_pipeline_state(
        &self,
        program: &GraphicsProgramHandle,
        state: &FixedFunctionState,
    ) -> Result<PipelineStateHandle, BackendError>;

    fn create_render_target_texture(
        &self,
        signature: &RenderTargetTextureSignature,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, BackendError>;

    fn create_framebuffer(
        &self,
        color_attachments: &[TextureAttachment],
        depth_stencil_attachment: Option<&TextureAttachment>,
    ) -> Result<Arc<dyn RenderTarget>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_type_indices_follow_pipeline_order() {
        for (i, shader_type) in ShaderType::ALL.iter().enumerate() {
            assert_eq!(shader_type.index(), i);
        }
    }

    #[test]
    fn test_handle_identity_and_downcast() {
        let a = TextureHandle::new(7u32);
        let b = a.clone();
        let c = TextureHandle::new(7u32);

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.downcast_ref::<u32>(), Some(&7));
        assert!(a.downcast_ref::<String>().is_none());
    }
}
