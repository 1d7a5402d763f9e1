//! # Lumen
//!
//! Renderer runtime core: hashed GPU object signatures, an asynchronous
//! graphics pipeline state compiler and compositor node execution, on top of
//! a narrow backend interface native graphics APIs implement.
//!
//! The umbrella crate re-exports the workspace members:
//! - [`lumen_core`]: string ids, FNV-1a hashing, interning
//! - [`lumen_render`]: signatures, pipeline states, compositor
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lumen::prelude::*;
//!
//! let store = Arc::new(BlueprintStore::new());
//! let mut compiler = GraphicsPipelineStateCompiler::new(backend, store.clone(), &settings.compiler)?;
//! let mut caches = GraphicsPipelineStateCacheManager::new(store);
//!
//! // every frame, on the render thread
//! let pipeline_state = caches.get_graphics_pipeline_state_cache_by_combination(
//!     &mut compiler, AssetId::new("Opaque"), &properties, false)?;
//! node.fill_command_buffer(&swap_chain, &CompositorContextData::new(frame), &mut command_buffer)?;
//! compiler.dispatch(&mut caches);
//! ```

pub use lumen_core;
pub use lumen_render;

pub use lumen_core::{
    AssetId, CompositorChannelId, CompositorFramebufferId, CompositorPassTypeId, ShaderPropertyId,
    StringId, interner,
};
pub use lumen_render::{
    BackendError, CompilerSettings, RenderError, RendererSettings, Result, backend, compositor,
    errors, pipeline, settings, signature,
};

pub mod prelude {
    pub use std::sync::Arc;

    pub use lumen_core::{AssetId, CompositorChannelId, CompositorFramebufferId, StringId};
    pub use lumen_render::backend::{
        ClearFlags, Command, CommandBuffer, FixedFunctionState, RenderBackend, RenderTarget,
        ShaderType, TextureFlags, TextureFormat,
    };
    pub use lumen_render::compositor::{
        CompositorContextData, CompositorNodeInstance, CompositorNodeResource,
        CompositorResourcePass, CompositorTarget, FramebufferManager, RenderQueueIndexRange,
        RenderQueueSource, RenderTargetTextureManager,
    };
    pub use lumen_render::pipeline::{
        BlueprintStore, GraphicsPipelineStateCacheManager, GraphicsPipelineStateCompiler,
        MaterialBlueprint, ShaderBlueprint, ShaderProperties,
    };
    pub use lumen_render::signature::{
        FramebufferSignature, FramebufferSignatureAttachment, RenderTargetTextureSignature,
    };
    pub use lumen_render::{RenderError, RendererSettings};
}
