//! Compositor Node Resources
//!
//! Immutable, data-driven description of a compositor node as loaded from
//! content: channels, the render target textures and framebuffers the node
//! declares, and an ordered list of targets each owning its ordered passes.
//!
//! ```text
//! CompositorNodeResource
//!  ├─ input / output channels
//!  ├─ render target textures   (asset id + RenderTargetTextureSignature)
//!  ├─ framebuffers             (framebuffer id + FramebufferSignature)
//!  └─ targets
//!       ├─ Channel("Final")      ─ passes: [Clear, Scene 0..=253]
//!       └─ Framebuffer("GBuffer") ─ passes: [Scene 0..=127, GenerateMipmaps]
//! ```
//!
//! Pass kinds form a closed set ([`PassKind`]) matched exhaustively by the
//! instance side.

use lumen_core::{AssetId, CompositorChannelId, CompositorFramebufferId, CompositorPassTypeId};

use crate::backend::ClearFlags;
use crate::signature::{FramebufferSignature, RenderTargetTextureSignature};

// ─── Passes ──────────────────────────────────────────────────────────────────

/// Inclusive range of render queue indices a scene pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderQueueIndexRange {
    pub minimum: u8,
    pub maximum: u8,
}

impl RenderQueueIndexRange {
    pub const ALL: Self = Self {
        minimum: 0,
        maximum: u8::MAX,
    };

    #[must_use]
    pub fn new(minimum: u8, maximum: u8) -> Self {
        assert!(minimum <= maximum, "Invalid render queue index range");
        Self { minimum, maximum }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, index: u8) -> bool {
        (self.minimum..=self.maximum).contains(&index)
    }
}

/// Pass specific configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum PassKind {
    Clear {
        flags: ClearFlags,
        color: [f32; 4],
        z: f32,
        stencil: u32,
    },
    /// Draws the renderables of the pass's render queue index range.
    Scene,
    Compute {
        material_blueprint: AssetId,
        group_count: [u32; 3],
    },
    /// Copies one render target texture into another.
    Copy {
        destination: AssetId,
        source: AssetId,
    },
    GenerateMipmaps { texture: AssetId },
    /// Resolves a multisample framebuffer into the pass's render target.
    ResolveMultisample { source: CompositorFramebufferId },
}

impl PassKind {
    /// Type id as used by content to select the pass kind.
    #[must_use]
    pub const fn pass_type_id(&self) -> CompositorPassTypeId {
        match self {
            Self::Clear { .. } => CompositorPassTypeId::new("Clear"),
            Self::Scene => CompositorPassTypeId::new("Scene"),
            Self::Compute { .. } => CompositorPassTypeId::new("Compute"),
            Self::Copy { .. } => CompositorPassTypeId::new("Copy"),
            Self::GenerateMipmaps { .. } => CompositorPassTypeId::new("GenerateMipmaps"),
            Self::ResolveMultisample { .. } => CompositorPassTypeId::new("ResolveMultisample"),
        }
    }
}

/// Configuration shared by every pass kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorResourcePass {
    pub debug_name: String,
    pub minimum_depth: f32,
    pub maximum_depth: f32,
    /// Skip the very first execution request (warm-up frame).
    pub skip_first_execution: bool,
    /// Upper bound of execution requests that actually execute. `None` is
    /// unbounded.
    pub number_of_executions: Option<u32>,
    pub render_queue_index_range: Option<RenderQueueIndexRange>,
    pub kind: PassKind,
}

impl CompositorResourcePass {
    #[must_use]
    pub fn new(debug_name: &str, kind: PassKind) -> Self {
        Self {
            debug_name: debug_name.to_owned(),
            minimum_depth: 0.0,
            maximum_depth: 1.0,
            skip_first_execution: false,
            number_of_executions: None,
            render_queue_index_range: None,
            kind,
        }
    }

    #[must_use]
    pub fn clear(debug_name: &str, flags: ClearFlags, color: [f32; 4]) -> Self {
        Self::new(
            debug_name,
            PassKind::Clear {
                flags,
                color,
                z: 0.0,
                stencil: 0,
            },
        )
    }

    #[must_use]
    pub fn scene(debug_name: &str, render_queue_index_range: RenderQueueIndexRange) -> Self {
        let mut pass = Self::new(debug_name, PassKind::Scene);
        pass.render_queue_index_range = Some(render_queue_index_range);
        pass
    }

    #[must_use]
    pub fn with_depth_range(mut self, minimum_depth: f32, maximum_depth: f32) -> Self {
        self.minimum_depth = minimum_depth;
        self.maximum_depth = maximum_depth;
        self
    }

    #[must_use]
    pub fn with_skip_first_execution(mut self, skip: bool) -> Self {
        self.skip_first_execution = skip;
        self
    }

    #[must_use]
    pub fn with_number_of_executions(mut self, number_of_executions: u32) -> Self {
        self.number_of_executions = Some(number_of_executions);
        self
    }

    #[inline]
    #[must_use]
    pub fn pass_type_id(&self) -> CompositorPassTypeId {
        self.kind.pass_type_id()
    }
}

// ─── Targets ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositorTargetKind {
    /// External interconnection; renders into the render target handed to
    /// the node each frame.
    Channel(CompositorChannelId),
    /// Node internal framebuffer.
    Framebuffer(CompositorFramebufferId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositorTarget {
    pub kind: CompositorTargetKind,
    pub passes: Vec<CompositorResourcePass>,
}

impl CompositorTarget {
    #[must_use]
    pub fn channel(channel_id: CompositorChannelId) -> Self {
        Self {
            kind: CompositorTargetKind::Channel(channel_id),
            passes: Vec::new(),
        }
    }

    #[must_use]
    pub fn framebuffer(framebuffer_id: CompositorFramebufferId) -> Self {
        Self {
            kind: CompositorTargetKind::Framebuffer(framebuffer_id),
            passes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pass(mut self, pass: CompositorResourcePass) -> Self {
        self.passes.push(pass);
        self
    }

    #[inline]
    #[must_use]
    pub fn compositor_channel_id(&self) -> Option<CompositorChannelId> {
        match self.kind {
            CompositorTargetKind::Channel(id) => Some(id),
            CompositorTargetKind::Framebuffer(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn compositor_framebuffer_id(&self) -> Option<CompositorFramebufferId> {
        match self.kind {
            CompositorTargetKind::Framebuffer(id) => Some(id),
            CompositorTargetKind::Channel(_) => None,
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorRenderTargetTexture {
    pub asset_id: AssetId,
    pub signature: RenderTargetTextureSignature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositorFramebuffer {
    pub compositor_framebuffer_id: CompositorFramebufferId,
    pub signature: FramebufferSignature,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositorNodeResource {
    pub debug_name: String,
    pub input_channels: Vec<CompositorChannelId>,
    pub output_channels: Vec<CompositorChannelId>,
    pub render_target_textures: Vec<CompositorRenderTargetTexture>,
    pub framebuffers: Vec<CompositorFramebuffer>,
    pub targets: Vec<CompositorTarget>,
}

impl CompositorNodeResource {
    #[must_use]
    pub fn new(debug_name: &str) -> Self {
        Self {
            debug_name: debug_name.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_render_target_texture(
        mut self,
        asset_id: AssetId,
        signature: RenderTargetTextureSignature,
    ) -> Self {
        self.render_target_textures
            .push(CompositorRenderTargetTexture { asset_id, signature });
        self
    }

    #[must_use]
    pub fn with_framebuffer(
        mut self,
        compositor_framebuffer_id: CompositorFramebufferId,
        signature: FramebufferSignature,
    ) -> Self {
        self.framebuffers.push(CompositorFramebuffer {
            compositor_framebuffer_id,
            signature,
        });
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: CompositorTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Total number of passes over all targets.
    #[must_use]
    pub fn number_of_passes(&self) -> usize {
        self.targets.iter().map(|target| target.passes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind_accessors() {
        let channel = CompositorTarget::channel(CompositorChannelId::new("Final"));
        assert_eq!(channel.compositor_channel_id(), Some(CompositorChannelId::new("Final")));
        assert_eq!(channel.compositor_framebuffer_id(), None);

        let framebuffer = CompositorTarget::framebuffer(CompositorFramebufferId::new("GBuffer"));
        assert_eq!(framebuffer.compositor_channel_id(), None);
    }

    #[test]
    fn test_pass_type_ids_distinct() {
        let a = CompositorResourcePass::scene("Opaque", RenderQueueIndexRange::ALL);
        let b = CompositorResourcePass::clear("Clear", ClearFlags::COLOR_DEPTH, [0.0; 4]);
        assert_eq!(a.pass_type_id(), CompositorPassTypeId::new("Scene"));
        assert_ne!(a.pass_type_id(), b.pass_type_id());
    }

    #[test]
    fn test_render_queue_range() {
        let range = RenderQueueIndexRange::new(10, 20);
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
    }
}
