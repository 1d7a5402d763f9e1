//! Graphics Pipeline States
//!
//! Everything between "draw this material with these shader properties" and a
//! backend pipeline state object:
//! - [`ShaderProperties`]: sorted integer properties selecting a shader variant
//! - [`blueprint`]: material/shader blueprints and the [`BlueprintStore`]
//! - [`signature`]: combination, program and signature ids
//! - [`ShaderBuilder`]: minijinja rendering of shader templates
//! - [`shader_cache`] / [`program_cache`]: bytecode and linked program caches
//! - [`GraphicsPipelineStateCacheManager`]: per-signature caches with fallback
//! - [`GraphicsPipelineStateCompiler`]: the asynchronous build/compile/dispatch
//!   pipeline

pub mod blueprint;
pub mod cache;
pub mod compiler;
pub mod program_cache;
pub mod shader_builder;
pub mod shader_cache;
pub mod shader_properties;
pub mod signature;

pub use blueprint::{BlueprintStore, MaterialBlueprint, ShaderBlueprint};
pub use cache::{
    GraphicsPipelineStateCache, GraphicsPipelineStateCacheHandle, GraphicsPipelineStateCacheManager,
};
pub use compiler::{CompilerStatistics, CompilerStatisticsSnapshot, GraphicsPipelineStateCompiler};
pub use program_cache::GraphicsProgramCacheManager;
pub use shader_builder::ShaderBuilder;
pub use shader_cache::{ShaderCache, ShaderCacheManager};
pub use shader_properties::{ShaderProperties, ShaderProperty};
pub use signature::{GraphicsPipelineStateSignature, GraphicsPipelineStateSignatureId};
