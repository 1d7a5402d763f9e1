//! Compositor Node Instance
//!
//! Runtime instance of a [`CompositorNodeResource`]: the flattened, ordered
//! list of instance passes over all of the node's targets.
//!
//! # Frame Execution
//!
//! [`CompositorNodeInstance::fill_command_buffer`] walks the passes in order.
//! For every pass due to execute it
//!
//! 1. picks the render target: the node's input render target for channel
//!    targets, the pass's framebuffer otherwise
//! 2. emits `SetGraphicsRenderTarget` only if that target differs from the
//!    previous executed pass
//! 3. emits `SetGraphicsViewportAndScissorRectangle` covering the whole target
//!    with the pass's depth range, on every executed pass, since passes
//!    sharing a target may still narrow the depth range
//! 4. lets the pass emit its own commands
//!
//! Every pass, executed or not, advances its saturating execution request
//! counter, which drives the skip-first-execution and number-of-executions
//! gates.

use std::sync::Arc;

use lumen_core::CompositorFramebufferId;

use super::context::CompositorContextData;
use super::framebuffer_manager::FramebufferManager;
use super::instance_pass::{CompositorInstancePass, InstancePassState};
use super::render_target_texture_manager::RenderTargetTextureManager;
use super::resource::{CompositorNodeResource, CompositorTargetKind, PassKind};
use crate::backend::{CommandBuffer, RenderTarget};
use crate::errors::{RenderError, Result};

pub struct CompositorNodeInstance {
    resource: Arc<CompositorNodeResource>,
    passes: Vec<CompositorInstancePass>,
}

impl CompositorNodeInstance {
    /// Instantiates every pass of `resource`. The node's render target
    /// textures and framebuffers are registered with the managers and the
    /// framebuffers of framebuffer targets are acquired for `viewport_size`.
    ///
    /// On failure every reference taken so far is handed back.
    pub fn new(
        resource: Arc<CompositorNodeResource>,
        framebuffer_manager: &mut FramebufferManager,
        render_target_texture_manager: &mut RenderTargetTextureManager,
        viewport_size: (u32, u32),
    ) -> Result<Self> {
        for texture in &resource.render_target_textures {
            render_target_texture_manager.add(texture.asset_id, texture.signature);
        }
        for framebuffer in &resource.framebuffers {
            framebuffer_manager.add(framebuffer.compositor_framebuffer_id, framebuffer.signature);
        }

        let mut acquired_framebuffers = Vec::new();
        let passes = match instantiate_passes(
            &resource,
            framebuffer_manager,
            render_target_texture_manager,
            viewport_size,
            &mut acquired_framebuffers,
        ) {
            Ok(passes) => passes,
            Err(err) => {
                log::error!("Failed to instantiate compositor node {}: {err}", resource.debug_name);
                for id in acquired_framebuffers {
                    framebuffer_manager.release(id);
                }
                release_render_target_textures(&resource, render_target_texture_manager);
                return Err(err);
            }
        };

        log::debug!(
            "Instantiated compositor node {} with {} passes",
            resource.debug_name,
            passes.len()
        );
        Ok(Self { resource, passes })
    }

    #[inline]
    #[must_use]
    pub fn resource(&self) -> &CompositorNodeResource {
        &self.resource
    }

    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[CompositorInstancePass] {
        &self.passes
    }

    #[cfg(test)]
    pub(crate) fn passes_mut(&mut self) -> &mut [CompositorInstancePass] {
        &mut self.passes
    }

    /// Records this node's passes into `command_buffer` and returns the
    /// render target the last executed pass rendered into.
    ///
    /// Ending without any render target is a content error: it is logged and
    /// reported as [`RenderError::UnresolvedRenderTarget`].
    pub fn fill_command_buffer(
        &mut self,
        render_target: &Arc<dyn RenderTarget>,
        context: &CompositorContextData<'_>,
        command_buffer: &mut CommandBuffer,
    ) -> Result<Arc<dyn RenderTarget>> {
        let mut current_render_target: Option<Arc<dyn RenderTarget>> = None;

        for pass in &mut self.passes {
            if pass.should_execute() {
                let new_render_target = if pass.renders_to_channel() {
                    Some(Arc::clone(render_target))
                } else {
                    pass.render_target().cloned()
                };

                if !same_render_target(new_render_target.as_ref(), current_render_target.as_ref()) {
                    current_render_target = new_render_target;
                    command_buffer.set_graphics_render_target(current_render_target.clone());
                }

                if let Some(target) = &current_render_target {
                    let (width, height) = target.width_and_height();
                    let resource_pass = pass.resource_pass();
                    command_buffer.set_graphics_viewport_and_scissor_rectangle(
                        0,
                        0,
                        width,
                        height,
                        resource_pass.minimum_depth,
                        resource_pass.maximum_depth,
                    );
                }

                pass.on_fill_command_buffer(current_render_target.as_ref(), context, command_buffer);
            }

            pass.advance_execution_requests();
        }

        current_render_target.ok_or_else(|| {
            log::error!(
                "Compositor node {} did not resolve a render target",
                self.resource.debug_name
            );
            RenderError::UnresolvedRenderTarget(self.resource.debug_name.clone())
        })
    }

    /// Called once all nodes of the owning workspace instance are loaded;
    /// execution gating starts over from the first request.
    pub fn compositor_workspace_instance_loading_finished(&mut self) {
        for pass in &mut self.passes {
            pass.on_compositor_workspace_instance_loading_finished();
        }
    }

    /// Called after the frame's command buffer was dispatched to the GPU.
    pub fn on_post_command_buffer_dispatch(&mut self) {
        for pass in &mut self.passes {
            pass.on_post_command_buffer_dispatch();
        }
    }

    /// Returns the node's textures and framebuffers to the managers.
    pub fn release(
        self,
        framebuffer_manager: &mut FramebufferManager,
        render_target_texture_manager: &mut RenderTargetTextureManager,
    ) {
        for target in &self.resource.targets {
            if let CompositorTargetKind::Framebuffer(id) = target.kind {
                framebuffer_manager.release(id);
            }
            for resource_pass in &target.passes {
                if let PassKind::ResolveMultisample { source } = resource_pass.kind {
                    framebuffer_manager.release(source);
                }
            }
        }
        release_render_target_textures(&self.resource, render_target_texture_manager);
    }
}

/// Resolves the passes of every target. Each framebuffer reference taken is
/// recorded in `acquired_framebuffers`, also when a later pass fails.
fn instantiate_passes(
    resource: &CompositorNodeResource,
    framebuffer_manager: &mut FramebufferManager,
    render_target_texture_manager: &mut RenderTargetTextureManager,
    viewport_size: (u32, u32),
    acquired_framebuffers: &mut Vec<CompositorFramebufferId>,
) -> Result<Vec<CompositorInstancePass>> {
    let mut passes = Vec::with_capacity(resource.number_of_passes());
    for target in &resource.targets {
        let render_target = match target.kind {
            CompositorTargetKind::Channel(_) => None,
            CompositorTargetKind::Framebuffer(id) => {
                let framebuffer =
                    framebuffer_manager.get_framebuffer(id, render_target_texture_manager, viewport_size)?;
                acquired_framebuffers.push(id);
                Some(framebuffer)
            }
        };
        let renders_to_channel = target.compositor_channel_id().is_some();

        for resource_pass in &target.passes {
            let state = match &resource_pass.kind {
                PassKind::Clear { .. } => InstancePassState::Clear,
                PassKind::Scene => InstancePassState::Scene,
                PassKind::Compute { .. } => InstancePassState::Compute,
                PassKind::Copy { destination, source } => InstancePassState::Copy {
                    destination: render_target_texture_manager.get_texture(*destination, viewport_size)?,
                    source: render_target_texture_manager.get_texture(*source, viewport_size)?,
                },
                PassKind::GenerateMipmaps { texture } => InstancePassState::GenerateMipmaps {
                    texture: render_target_texture_manager.get_texture(*texture, viewport_size)?,
                },
                PassKind::ResolveMultisample { source } => {
                    let framebuffer = framebuffer_manager.get_framebuffer(
                        *source,
                        render_target_texture_manager,
                        viewport_size,
                    )?;
                    acquired_framebuffers.push(*source);
                    InstancePassState::ResolveMultisample { source: framebuffer }
                }
            };
            passes.push(CompositorInstancePass::new(
                resource_pass.clone(),
                renders_to_channel,
                render_target.clone(),
                state,
            ));
        }
    }
    Ok(passes)
}

fn release_render_target_textures(
    resource: &CompositorNodeResource,
    render_target_texture_manager: &mut RenderTargetTextureManager,
) {
    for texture in &resource.render_target_textures {
        render_target_texture_manager.release(texture.asset_id);
    }
}

fn same_render_target(a: Option<&Arc<dyn RenderTarget>>, b: Option<&Arc<dyn RenderTarget>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
