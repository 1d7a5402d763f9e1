//! Shared test support: an instrumented in-memory backend.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use lumen::backend::{
    FixedFunctionState, GraphicsProgramHandle, PipelineStateHandle, RenderBackend, RenderTarget,
    ShaderBytecode, ShaderStageArray, ShaderType, TextureAttachment, TextureHandle,
};
use lumen::signature::{GraphicsProgramCacheId, RenderTargetTextureSignature};
use lumen::BackendError;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Native Objects ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockProgram {
    pub id: GraphicsProgramCacheId,
}

#[derive(Debug)]
pub struct MockPipelineState {
    pub program_id: GraphicsProgramCacheId,
    pub state: FixedFunctionState,
}

#[derive(Debug)]
pub struct MockTexture {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct MockRenderTarget {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl MockRenderTarget {
    pub fn swap_chain(width: u32, height: u32) -> Arc<dyn RenderTarget> {
        Arc::new(Self {
            name: "SwapChain",
            width,
            height,
        })
    }
}

impl RenderTarget for MockRenderTarget {
    fn width_and_height(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn debug_name(&self) -> &str {
        self.name
    }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBackend {
    shader_compiles: AtomicUsize,
    programs: AtomicUsize,
    pipeline_states: AtomicUsize,
    textures: AtomicUsize,
    framebuffers: AtomicUsize,
    gate_closed: Mutex<bool>,
    gate: Condvar,
    compile_delay: Mutex<Option<Duration>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks every `compile_shader` call until the gate is opened again.
    pub fn close_compile_gate(&self) {
        *self.gate_closed.lock() = true;
    }

    pub fn open_compile_gate(&self) {
        *self.gate_closed.lock() = false;
        self.gate.notify_all();
    }

    pub fn set_compile_delay(&self, delay: Duration) {
        *self.compile_delay.lock() = Some(delay);
    }

    pub fn shader_compiles(&self) -> usize {
        self.shader_compiles.load(Ordering::SeqCst)
    }

    pub fn programs(&self) -> usize {
        self.programs.load(Ordering::SeqCst)
    }

    pub fn pipeline_states(&self) -> usize {
        self.pipeline_states.load(Ordering::SeqCst)
    }

    pub fn textures(&self) -> usize {
        self.textures.load(Ordering::SeqCst)
    }

    pub fn framebuffers(&self) -> usize {
        self.framebuffers.load(Ordering::SeqCst)
    }
}

impl RenderBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn compile_shader(&self, shader_type: ShaderType, source: &str) -> Result<ShaderBytecode, BackendError> {
        {
            let mut closed = self.gate_closed.lock();
            while *closed {
                self.gate.wait(&mut closed);
            }
        }
        let delay = *self.compile_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if source.contains("#error") {
            return Err(BackendError::new("syntax error"));
        }

        self.shader_compiles.fetch_add(1, Ordering::SeqCst);
        Ok(ShaderBytecode::new(shader_type, source.as_bytes().to_vec()))
    }

    fn create_graphics_program(
        &self,
        id: GraphicsProgramCacheId,
        _bytecode: &ShaderStageArray<Option<Arc<ShaderBytecode>>>,
    ) -> Result<GraphicsProgramHandle, BackendError> {
        self.programs.fetch_add(1, Ordering::SeqCst);
        Ok(GraphicsProgramHandle::new(MockProgram { id }))
    }

    fn create_graphics_pipeline_state(
        &self,
        program: &GraphicsProgramHandle,
        state: &FixedFunctionState,
    ) -> Result<PipelineStateHandle, BackendError> {
        let program = program
            .downcast_ref::<MockProgram>()
            .ok_or_else(|| BackendError::new("foreign program"))?;
        self.pipeline_states.fetch_add(1, Ordering::SeqCst);
        Ok(PipelineStateHandle::new(MockPipelineState {
            program_id: program.id,
            state: *state,
        }))
    }

    fn create_render_target_texture(
        &self,
        _signature: &RenderTargetTextureSignature,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, BackendError> {
        self.textures.fetch_add(1, Ordering::SeqCst);
        Ok(TextureHandle::new(MockTexture { width, height }))
    }

    fn create_framebuffer(
        &self,
        color_attachments: &[TextureAttachment],
        depth_stencil_attachment: Option<&TextureAttachment>,
    ) -> Result<Arc<dyn RenderTarget>, BackendError> {
        let first = color_attachments
            .first()
            .or(depth_stencil_attachment)
            .ok_or_else(|| BackendError::new("framebuffer without attachments"))?;
        let texture = first
            .texture
            .downcast_ref::<MockTexture>()
            .ok_or_else(|| BackendError::new("foreign texture"))?;

        self.framebuffers.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockRenderTarget {
            name: "Framebuffer",
            width: texture.width,
            height: texture.height,
        }))
    }
}
