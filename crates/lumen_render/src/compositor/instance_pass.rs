//! Compositor Instance Passes
//!
//! Runtime side of a [`CompositorResourcePass`]: the execution request
//! counter, the render target the pass renders into when its target is a
//! node framebuffer, and the backend objects resolved for its kind.

use std::sync::Arc;

use super::context::CompositorContextData;
use super::resource::{CompositorResourcePass, PassKind, RenderQueueIndexRange};
use crate::backend::{Command, CommandBuffer, RenderTarget, TextureHandle};

/// Backend objects a pass kind needs at execution time, resolved once when
/// the node is instantiated.
#[derive(Debug, Clone)]
pub enum InstancePassState {
    Clear,
    Scene,
    Compute,
    Copy {
        destination: TextureHandle,
        source: TextureHandle,
    },
    GenerateMipmaps {
        texture: TextureHandle,
    },
    ResolveMultisample {
        source: Arc<dyn RenderTarget>,
    },
}

#[derive(Debug)]
pub struct CompositorInstancePass {
    resource_pass: CompositorResourcePass,
    /// `true` if the owning target is a channel: the pass renders into the
    /// render target handed to the node each frame.
    renders_to_channel: bool,
    render_target: Option<Arc<dyn RenderTarget>>,
    number_of_execution_requests: u32,
    executed_in_current_frame: bool,
    state: InstancePassState,
}

impl CompositorInstancePass {
    pub(crate) fn new(
        resource_pass: CompositorResourcePass,
        renders_to_channel: bool,
        render_target: Option<Arc<dyn RenderTarget>>,
        state: InstancePassState,
    ) -> Self {
        Self {
            resource_pass,
            renders_to_channel,
            render_target,
            number_of_execution_requests: 0,
            executed_in_current_frame: false,
            state,
        }
    }

    #[inline]
    #[must_use]
    pub fn resource_pass(&self) -> &CompositorResourcePass {
        &self.resource_pass
    }

    #[inline]
    #[must_use]
    pub fn renders_to_channel(&self) -> bool {
        self.renders_to_channel
    }

    #[inline]
    #[must_use]
    pub fn render_target(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.render_target.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn number_of_execution_requests(&self) -> u32 {
        self.number_of_execution_requests
    }

    #[inline]
    #[must_use]
    pub fn was_executed_in_current_frame(&self) -> bool {
        self.executed_in_current_frame
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &InstancePassState {
        &self.state
    }

    /// Execution gate evaluated before the counter is advanced:
    /// the first request is skipped if configured, and at most
    /// `number_of_executions` requests execute.
    #[must_use]
    pub fn should_execute(&self) -> bool {
        let requests = self.number_of_execution_requests;
        (!self.resource_pass.skip_first_execution || requests > 0)
            && self
                .resource_pass
                .number_of_executions
                .is_none_or(|limit| requests < limit)
    }

    /// Saturates at `u32::MAX`.
    pub(crate) fn advance_execution_requests(&mut self) {
        self.number_of_execution_requests = self.number_of_execution_requests.saturating_add(1);
    }


    #[cfg(test)]
    pub(crate) fn set_number_of_execution_requests(&mut self, value: u32) {
        self.number_of_execution_requests = value;
    }

    /// Emits the pass specific commands into `command_buffer`.
    pub(crate) fn on_fill_command_buffer(
        &mut self,
        render_target: Option<&Arc<dyn RenderTarget>>,
        context: &CompositorContextData<'_>,
        command_buffer: &mut CommandBuffer,
    ) {
        self.executed_in_current_frame = true;
        command_buffer.begin_debug_event(&self.resource_pass.debug_name);

        match (&self.resource_pass.kind, &self.state) {
            (PassKind::Clear { flags, color, z, stencil }, _) => {
                command_buffer.clear_graphics(*flags, *color, *z, *stencil);
            }
            (PassKind::Scene, _) => {
                if let (Some(source), Some(render_target)) = (context.render_queue_source(), render_target) {
                    let range = self
                        .resource_pass
                        .render_queue_index_range
                        .unwrap_or(RenderQueueIndexRange::ALL);
                    source.fill_command_buffer(render_target, range, command_buffer);
                }
            }
            (PassKind::Compute { material_blueprint, group_count }, _) => {
                command_buffer.push(Command::DispatchCompute {
                    material_blueprint: *material_blueprint,
                    group_count: *group_count,
                });
            }
            (_, InstancePassState::Copy { destination, source }) => {
                command_buffer.push(Command::CopyResource {
                    destination: destination.clone(),
                    source: source.clone(),
                });
            }
            (_, InstancePassState::GenerateMipmaps { texture }) => {
                command_buffer.push(Command::GenerateMipmaps(texture.clone()));
            }
            (_, InstancePassState::ResolveMultisample { source }) => match render_target {
                Some(destination) => command_buffer.push(Command::ResolveMultisampleFramebuffer {
                    destination: Arc::clone(destination),
                    source: Arc::clone(source),
                }),
                None => log::warn!(
                    "Resolve pass {} has no render target to resolve into",
                    self.resource_pass.debug_name
                ),
            },
            (kind, state) => {
                log::error!(
                    "Pass {} has mismatched state {state:?} for {kind:?}",
                    self.resource_pass.debug_name
                );
            }
        }

        command_buffer.end_debug_event();
    }

    /// Called after the frame's command buffer went to the GPU.
    pub(crate) fn on_post_command_buffer_dispatch(&mut self) {
        self.executed_in_current_frame = false;
    }

    /// Called once the owning workspace instance finished loading; gating
    /// starts over from the first execution request.
    pub(crate) fn on_compositor_workspace_instance_loading_finished(&mut self) {
        self.number_of_execution_requests = 0;
        self.executed_in_current_frame = false;
    }
}
