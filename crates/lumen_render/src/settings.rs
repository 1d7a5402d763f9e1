//! Renderer Runtime Settings
//!
//! Configuration for the pipeline state compiler and the compositor, loadable
//! from JSON. Every field has a default, so partial documents are fine:
//!
//! ```rust
//! use lumen_render::settings::RendererSettings;
//!
//! let settings = RendererSettings::from_json_str(
//!     r#"{ "compiler": { "number_of_compiler_threads": 2 }, "resolution_scale": 0.75 }"#,
//! ).unwrap();
//! assert_eq!(settings.compiler.number_of_compiler_threads, 2);
//! assert!(settings.compiler.asynchronous_compilation);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Graphics pipeline state compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Queue requests to worker threads instead of compiling inline.
    ///
    /// Synchronous compilation is meant for tooling and determinism (e.g.
    /// baking caches), not for interactive use.
    pub asynchronous_compilation: bool,

    /// Size of the compiler thread pool. Zero is treated as one.
    pub number_of_compiler_threads: u32,

    /// Upper bound of dispatch-queue entries committed per `dispatch()` call.
    /// `None` drains the whole queue every frame.
    pub max_dispatches_per_frame: Option<u32>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        let threads = std::thread::available_parallelism()
            .map_or(1, |n| n.get().saturating_sub(1))
            .max(1);
        Self {
            asynchronous_compilation: true,
            number_of_compiler_threads: threads as u32,
            max_dispatches_per_frame: None,
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub compiler: CompilerSettings,

    /// Global scale applied to viewport sized render target textures that
    /// allow resolution scaling.
    pub resolution_scale: f32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            compiler: CompilerSettings::default(),
            resolution_scale: 1.0,
        }
    }
}

impl RendererSettings {
    /// Parses settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        if settings.resolution_scale.is_nan() || settings.resolution_scale <= 0.0 {
            return Err(crate::errors::RenderError::InvalidSettings(format!(
                "resolution_scale must be positive, got {}",
                settings.resolution_scale
            )));
        }
        Ok(settings)
    }
}
