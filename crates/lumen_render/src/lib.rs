//! Lumen renderer runtime core.
//!
//! - [`signature`]: hashed signatures deduplicating framebuffers, render
//!   target textures and graphics programs
//! - [`pipeline`]: shader building, caching and the asynchronous graphics
//!   pipeline state compiler
//! - [`compositor`]: compositor node execution into command buffers
//! - [`backend`]: the narrow interface native graphics backends implement
//! - [`settings`] / [`errors`]: configuration and error types

pub mod backend;
pub mod compositor;
pub mod errors;
pub mod pipeline;
pub mod settings;
pub mod signature;

pub use errors::{BackendError, RenderError, Result};
pub use settings::{CompilerSettings, RendererSettings};
