//! Error Types
//!
//! # Overview
//!
//! The main error type [`RenderError`] covers the recoverable failure modes of
//! the runtime core:
//! - Backend object creation and shader compilation failures
//! - Shader template build failures
//! - Missing blueprints, framebuffers and render target textures
//! - Compositor configuration problems surfaced at frame time
//! - Settings parsing
//!
//! Configuration errors that indicate malformed resource data (e.g. more than
//! eight color attachments) are assertions, not variants.

use lumen_core::{AssetId, CompositorFramebufferId};
use thiserror::Error;

use crate::backend::ShaderType;

/// Failure reported by a backend implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The main error type for the renderer runtime.
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The backend failed to compile a shader or create an object.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // ========================================================================
    // Shader Building
    // ========================================================================
    /// The shader template of a blueprint could not be rendered.
    #[error("Failed to build {shader_type:?} shader from blueprint {blueprint}: {message}")]
    ShaderBuild {
        blueprint: AssetId,
        shader_type: ShaderType,
        message: String,
    },

    /// A material blueprint references a shader blueprint that is not loaded.
    #[error("Shader blueprint not found: {0:?}")]
    ShaderBlueprintNotFound(AssetId),

    /// The material blueprint is not registered.
    #[error("Material blueprint not found: {0:?}")]
    MaterialBlueprintNotFound(AssetId),

    // ========================================================================
    // Compositor Errors
    // ========================================================================
    /// A pass targets a compositor framebuffer the node does not declare.
    #[error("Unknown compositor framebuffer: {0:?}")]
    UnknownFramebuffer(CompositorFramebufferId),

    /// A framebuffer attachment references an unknown render target texture.
    #[error("Unknown render target texture: {0:?}")]
    UnknownRenderTargetTexture(AssetId),

    /// A compositor node finished its pass list without any render target.
    #[error("Compositor node {0:?} did not resolve a render target")]
    UnresolvedRenderTarget(String),

    // ========================================================================
    // Threading
    // ========================================================================
    /// A builder or compiler worker thread could not be spawned.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerThread(String),

    // ========================================================================
    // Configuration
    // ========================================================================
    /// Renderer settings could not be parsed.
    #[error("Invalid renderer settings: {0}")]
    InvalidSettings(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::InvalidSettings(err.to_string())
    }
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
