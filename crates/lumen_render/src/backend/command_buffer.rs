//! Command Buffer
//!
//! A frame's commands are recorded into a [`CommandBuffer`] by a single writer
//! (the compositor node instances, in pass order) and handed to the backend
//! afterwards. The buffer only records; it never talks to the device.

use std::sync::Arc;

use bitflags::bitflags;
use lumen_core::AssetId;

use super::{PipelineStateHandle, RenderTarget, TextureHandle};

bitflags! {
    /// Which planes a clear command touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u8 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
        const COLOR_DEPTH = Self::COLOR.bits() | Self::DEPTH.bits();
    }
}

/// A single recorded command.
#[derive(Debug, Clone)]
pub enum Command {
    SetGraphicsRenderTarget(Option<Arc<dyn RenderTarget>>),
    SetGraphicsViewportAndScissorRectangle {
        top_left_x: u32,
        top_left_y: u32,
        width: u32,
        height: u32,
        minimum_depth: f32,
        maximum_depth: f32,
    },
    ClearGraphics {
        flags: ClearFlags,
        color: [f32; 4],
        z: f32,
        stencil: u32,
    },
    SetGraphicsPipelineState(PipelineStateHandle),
    DrawGraphics {
        vertex_count: u32,
        instance_count: u32,
        start_vertex: u32,
    },
    DispatchCompute {
        material_blueprint: AssetId,
        group_count: [u32; 3],
    },
    CopyResource {
        destination: TextureHandle,
        source: TextureHandle,
    },
    GenerateMipmaps(TextureHandle),
    ResolveMultisampleFramebuffer {
        destination: Arc<dyn RenderTarget>,
        source: Arc<dyn RenderTarget>,
    },
    BeginDebugEvent(String),
    EndDebugEvent,
}

/// Append-only command list for one frame.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(64),
        }
    }

    #[inline]
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn set_graphics_render_target(&mut self, render_target: Option<Arc<dyn RenderTarget>>) {
        self.push(Command::SetGraphicsRenderTarget(render_target));
    }

    pub fn set_graphics_viewport_and_scissor_rectangle(
        &mut self,
        top_left_x: u32,
        top_left_y: u32,
        width: u32,
        height: u32,
        minimum_depth: f32,
        maximum_depth: f32,
    ) {
        self.push(Command::SetGraphicsViewportAndScissorRectangle {
            top_left_x,
            top_left_y,
            width,
            height,
            minimum_depth,
            maximum_depth,
        });
    }

    pub fn clear_graphics(&mut self, flags: ClearFlags, color: [f32; 4], z: f32, stencil: u32) {
        self.push(Command::ClearGraphics {
            flags,
            color,
            z,
            stencil,
        });
    }

    pub fn begin_debug_event(&mut self, name: &str) {
        self.push(Command::BeginDebugEvent(name.to_owned()));
    }

    pub fn end_debug_event(&mut self) {
        self.push(Command::EndDebugEvent);
    }

    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of recorded commands matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// Hands the recorded commands over, leaving the buffer empty for reuse.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_take() {
        let mut buffer = CommandBuffer::new();
        buffer.clear_graphics(ClearFlags::COLOR_DEPTH, [0.0; 4], 0.0, 0);
        buffer.set_graphics_viewport_and_scissor_rectangle(0, 0, 64, 32, 0.0, 1.0);
        assert_eq!(buffer.len(), 2);
        assert_eq!(
            buffer.count(|c| matches!(c, Command::ClearGraphics { .. })),
            1
        );

        let commands = buffer.take();
        assert_eq!(commands.len(), 2);
        assert!(buffer.is_empty());
    }
}
