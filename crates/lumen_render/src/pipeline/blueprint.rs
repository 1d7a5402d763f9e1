//! Material and Shader Blueprints
//!
//! The resource system (outside this crate) loads blueprints; the runtime core
//! reads them through the thread-safe [`BlueprintStore`]:
//!
//! - [`ShaderBlueprint`]: a shader source template plus the shader properties
//!   it reacts to
//! - [`MaterialBlueprint`]: which shader blueprint feeds which stage, the
//!   fixed-function state and the default shader properties
//! - shader pieces: named snippets templates pull in with
//!   `{$ include "name" $}`
//!
//! Blueprints are immutable once registered and shared as `Arc`s, so the
//! builder and compiler threads can read them without further locking.

use std::sync::Arc;

use lumen_core::{AssetId, ShaderPropertyId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::ShaderProperties;
use crate::backend::{FixedFunctionState, ShaderStageArray, ShaderType};

// ─── Shader Blueprint ────────────────────────────────────────────────────────

/// Shader source template.
#[derive(Debug, Clone)]
pub struct ShaderBlueprint {
    pub asset_id: AssetId,
    pub debug_name: String,
    pub source_template: String,
    /// Properties this template reads, with the value used when a request
    /// leaves them unset. Only these take part in the shader combination id
    /// and only these are visible to the template.
    pub referenced_properties: ShaderProperties,
}

impl ShaderBlueprint {
    #[must_use]
    pub fn new(debug_name: &str, source_template: impl Into<String>) -> Self {
        Self {
            asset_id: AssetId::new(debug_name),
            debug_name: debug_name.to_owned(),
            source_template: source_template.into(),
            referenced_properties: ShaderProperties::new(),
        }
    }

    /// Declares referenced properties that default to zero.
    #[must_use]
    pub fn with_referenced_properties(mut self, names: &[&str]) -> Self {
        for name in names {
            self.referenced_properties.set(name, 0);
        }
        self
    }

    /// Declares a referenced property with an explicit default.
    #[must_use]
    pub fn with_referenced_property(mut self, name: &str, default_value: i32) -> Self {
        self.referenced_properties.set(name, default_value);
        self
    }

    #[inline]
    #[must_use]
    pub fn references(&self, id: ShaderPropertyId) -> bool {
        self.referenced_properties.get_by_id(id).is_some()
    }
}

// ─── Material Blueprint ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MaterialBlueprint {
    pub asset_id: AssetId,
    pub debug_name: String,
    pub shader_blueprints: ShaderStageArray<Option<AssetId>>,
    pub fixed_function_state: FixedFunctionState,
    pub default_shader_properties: ShaderProperties,
}

impl MaterialBlueprint {
    #[must_use]
    pub fn new(debug_name: &str) -> Self {
        Self {
            asset_id: AssetId::new(debug_name),
            debug_name: debug_name.to_owned(),
            shader_blueprints: [None; ShaderType::COUNT],
            fixed_function_state: FixedFunctionState::default(),
            default_shader_properties: ShaderProperties::new(),
        }
    }

    #[must_use]
    pub fn with_shader_blueprint(mut self, shader_type: ShaderType, shader_blueprint: AssetId) -> Self {
        self.shader_blueprints[shader_type.index()] = Some(shader_blueprint);
        self
    }

    #[must_use]
    pub fn with_fixed_function_state(mut self, state: FixedFunctionState) -> Self {
        self.fixed_function_state = state;
        self
    }

    #[must_use]
    pub fn with_default_shader_properties(mut self, properties: ShaderProperties) -> Self {
        self.default_shader_properties = properties;
        self
    }

    #[inline]
    #[must_use]
    pub fn shader_blueprint(&self, shader_type: ShaderType) -> Option<AssetId> {
        self.shader_blueprints[shader_type.index()]
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Thread-safe registry of loaded blueprints and shader pieces.
#[derive(Default)]
pub struct BlueprintStore {
    material_blueprints: RwLock<FxHashMap<AssetId, Arc<MaterialBlueprint>>>,
    shader_blueprints: RwLock<FxHashMap<AssetId, Arc<ShaderBlueprint>>>,
    shader_pieces: RwLock<FxHashMap<String, Arc<str>>>,
}

impl BlueprintStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a material blueprint.
    pub fn add_material_blueprint(&self, blueprint: MaterialBlueprint) -> Arc<MaterialBlueprint> {
        let blueprint = Arc::new(blueprint);
        self.material_blueprints
            .write()
            .insert(blueprint.asset_id, Arc::clone(&blueprint));
        blueprint
    }

    #[must_use]
    pub fn material_blueprint(&self, asset_id: AssetId) -> Option<Arc<MaterialBlueprint>> {
        self.material_blueprints.read().get(&asset_id).cloned()
    }

    /// Registers (or replaces) a shader blueprint.
    pub fn add_shader_blueprint(&self, blueprint: ShaderBlueprint) -> Arc<ShaderBlueprint> {
        let blueprint = Arc::new(blueprint);
        self.shader_blueprints
            .write()
            .insert(blueprint.asset_id, Arc::clone(&blueprint));
        blueprint
    }

    #[must_use]
    pub fn shader_blueprint(&self, asset_id: AssetId) -> Option<Arc<ShaderBlueprint>> {
        self.shader_blueprints.read().get(&asset_id).cloned()
    }

    pub fn add_shader_piece(&self, name: &str, source: &str) {
        self.shader_pieces
            .write()
            .insert(name.to_owned(), Arc::from(source));
    }

    #[must_use]
    pub fn shader_piece(&self, name: &str) -> Option<Arc<str>> {
        self.shader_pieces.read().get(name).cloned()
    }
}
