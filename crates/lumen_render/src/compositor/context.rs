//! Per-frame data handed to every compositor pass.

use std::sync::Arc;

use super::resource::RenderQueueIndexRange;
use crate::backend::{CommandBuffer, RenderTarget};

/// Emits the draw calls of the renderables in a render queue index range.
///
/// Scene passes delegate to this instead of reaching into a global scene, so
/// a node can be driven by whatever owns the renderables (or by a test).
pub trait RenderQueueSource {
    fn fill_command_buffer(
        &self,
        render_target: &Arc<dyn RenderTarget>,
        render_queue_index_range: RenderQueueIndexRange,
        command_buffer: &mut CommandBuffer,
    );
}

#[derive(Clone, Copy, Default)]
pub struct CompositorContextData<'a> {
    render_queue_source: Option<&'a dyn RenderQueueSource>,
    frame_number: u64,
}

impl<'a> CompositorContextData<'a> {
    #[must_use]
    pub fn new(frame_number: u64) -> Self {
        Self {
            render_queue_source: None,
            frame_number,
        }
    }

    #[must_use]
    pub fn with_render_queue_source(mut self, source: &'a dyn RenderQueueSource) -> Self {
        self.render_queue_source = Some(source);
        self
    }

    #[inline]
    #[must_use]
    pub fn render_queue_source(&self) -> Option<&'a dyn RenderQueueSource> {
        self.render_queue_source
    }

    #[inline]
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }
}
