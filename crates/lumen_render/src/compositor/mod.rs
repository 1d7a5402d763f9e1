//! Compositor
//!
//! Per-frame execution of compositor nodes:
//! - [`resource`]: immutable node/target/pass descriptions
//! - [`RenderTargetTextureManager`] / [`FramebufferManager`]: shared,
//!   reference counted render targets deduplicated by signature
//! - [`CompositorNodeInstance`]: walks the instance passes, resolves render
//!   targets lazily and records commands
//! - [`CompositorContextData`]: explicit per-frame strategy objects

pub mod context;
pub mod framebuffer_manager;
pub mod instance_pass;
pub mod node_instance;
pub mod render_target_texture_manager;
pub mod resource;

pub use context::{CompositorContextData, RenderQueueSource};
pub use framebuffer_manager::FramebufferManager;
pub use instance_pass::{CompositorInstancePass, InstancePassState};
pub use node_instance::CompositorNodeInstance;
pub use render_target_texture_manager::RenderTargetTextureManager;
pub use resource::{
    CompositorFramebuffer, CompositorNodeResource, CompositorRenderTargetTexture,
    CompositorResourcePass, CompositorTarget, CompositorTargetKind, PassKind, RenderQueueIndexRange,
};
