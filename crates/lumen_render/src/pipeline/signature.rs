//! Graphics Pipeline State Signature
//!
//! Resolves "material blueprint + shader properties" into the ids the caches
//! are keyed by:
//!
//! ```text
//! effective properties = material defaults ⊕ requested properties
//!
//! shader combination id (per used stage)
//!     = fnv1a32(shader blueprint id ‖ (property id, value)* for referenced properties)
//!       (a referenced but unset property contributes its declared default)
//!
//! graphics program cache id = fnv1a32(combination id of each stage, u32::MAX if unused)
//!
//! signature id = fnv1a32(material blueprint id ‖ (property id, value)* for all effective properties)
//! ```
//!
//! Two material blueprints that share shader blueprints and property values
//! therefore share a graphics program while keeping distinct signature ids.

use lumen_core::{AssetId, Fnv1a32};

use super::blueprint::{BlueprintStore, MaterialBlueprint, ShaderBlueprint};
use super::ShaderProperties;
use crate::backend::{ShaderStageArray, ShaderType};
use crate::errors::{RenderError, Result};
use crate::signature::{GraphicsProgramCacheId, ShaderCombinationId};

pub type GraphicsPipelineStateSignatureId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsPipelineStateSignature {
    material_blueprint_id: AssetId,
    shader_properties: ShaderProperties,
    shader_combination_ids: ShaderStageArray<Option<ShaderCombinationId>>,
    graphics_program_cache_id: GraphicsProgramCacheId,
    signature_id: GraphicsPipelineStateSignatureId,
}

impl GraphicsPipelineStateSignature {
    /// Fails if the material blueprint references a shader blueprint that is
    /// not in `store`.
    pub fn new(
        material_blueprint: &MaterialBlueprint,
        shader_properties: &ShaderProperties,
        store: &BlueprintStore,
    ) -> Result<Self> {
        let mut effective = material_blueprint.default_shader_properties.clone();
        effective.merge(shader_properties);

        let mut shader_combination_ids = [None; ShaderType::COUNT];
        for shader_type in ShaderType::ALL {
            let Some(blueprint_id) = material_blueprint.shader_blueprint(shader_type) else {
                continue;
            };
            let blueprint = store
                .shader_blueprint(blueprint_id)
                .ok_or(RenderError::ShaderBlueprintNotFound(blueprint_id))?;
            shader_combination_ids[shader_type.index()] =
                Some(shader_combination_id(&blueprint, &effective));
        }

        let signature_id = effective
            .iter()
            .fold(
                Fnv1a32::new().write_u32(material_blueprint.asset_id.raw()),
                |hasher, property| hasher.write_u32(property.id.raw()).write_i32(property.value),
            )
            .finish();

        Ok(Self {
            material_blueprint_id: material_blueprint.asset_id,
            graphics_program_cache_id: GraphicsProgramCacheId::from_shader_combination_ids(
                &shader_combination_ids,
            ),
            shader_properties: effective,
            shader_combination_ids,
            signature_id,
        })
    }

    #[inline]
    #[must_use]
    pub fn material_blueprint_id(&self) -> AssetId {
        self.material_blueprint_id
    }

    /// Material defaults merged with the requested properties.
    #[inline]
    #[must_use]
    pub fn shader_properties(&self) -> &ShaderProperties {
        &self.shader_properties
    }

    #[inline]
    #[must_use]
    pub fn shader_combination_id(&self, shader_type: ShaderType) -> Option<ShaderCombinationId> {
        self.shader_combination_ids[shader_type.index()]
    }

    #[inline]
    #[must_use]
    pub fn shader_combination_ids(&self) -> &ShaderStageArray<Option<ShaderCombinationId>> {
        &self.shader_combination_ids
    }

    #[inline]
    #[must_use]
    pub fn graphics_program_cache_id(&self) -> GraphicsProgramCacheId {
        self.graphics_program_cache_id
    }

    #[inline]
    #[must_use]
    pub fn signature_id(&self) -> GraphicsPipelineStateSignatureId {
        self.signature_id
    }
}

/// Combination id of one shader blueprint under `properties`.
#[must_use]
pub fn shader_combination_id(
    blueprint: &ShaderBlueprint,
    properties: &ShaderProperties,
) -> ShaderCombinationId {
    let hasher = blueprint.referenced_properties.iter().fold(
        Fnv1a32::new().write_u32(blueprint.asset_id.raw()),
        |hasher, referenced| {
            hasher
                .write_u32(referenced.id.raw())
                .write_i32(properties.get_by_id(referenced.id).unwrap_or(referenced.value))
        },
    );
    ShaderCombinationId::from_raw(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BlendState;

    fn store_with_shaders() -> BlueprintStore {
        let store = BlueprintStore::new();
        store.add_shader_blueprint(
            ShaderBlueprint::new("Mesh.vs", "vs").with_referenced_properties(&["UseSkinning"]),
        );
        store.add_shader_blueprint(
            ShaderBlueprint::new("Mesh.fs", "fs").with_referenced_properties(&["UseAlphaMap"]),
        );
        store
    }

    fn mesh_material(name: &str) -> MaterialBlueprint {
        MaterialBlueprint::new(name)
            .with_shader_blueprint(ShaderType::Vertex, AssetId::new("Mesh.vs"))
            .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Mesh.fs"))
    }

    #[test]
    fn test_unreferenced_property_keeps_program() {
        let store = store_with_shaders();
        let material = mesh_material("Opaque");

        let a = GraphicsPipelineStateSignature::new(&material, &ShaderProperties::new(), &store).unwrap();
        let b = GraphicsPipelineStateSignature::new(
            &material,
            &ShaderProperties::new().with("Unrelated", 3),
            &store,
        )
        .unwrap();

        assert_eq!(a.graphics_program_cache_id(), b.graphics_program_cache_id());
        assert_ne!(a.signature_id(), b.signature_id());
    }

    #[test]
    fn test_referenced_property_changes_only_its_stage() {
        let store = store_with_shaders();
        let material = mesh_material("Opaque");

        let a = GraphicsPipelineStateSignature::new(&material, &ShaderProperties::new(), &store).unwrap();
        let b = GraphicsPipelineStateSignature::new(
            &material,
            &ShaderProperties::new().with("UseAlphaMap", 1),
            &store,
        )
        .unwrap();

        assert_eq!(
            a.shader_combination_id(ShaderType::Vertex),
            b.shader_combination_id(ShaderType::Vertex)
        );
        assert_ne!(
            a.shader_combination_id(ShaderType::Fragment),
            b.shader_combination_id(ShaderType::Fragment)
        );
        assert_ne!(a.graphics_program_cache_id(), b.graphics_program_cache_id());
    }

    #[test]
    fn test_fixed_function_variants_share_program() {
        let store = store_with_shaders();
        let opaque = mesh_material("Opaque");
        let mut fixed = opaque.fixed_function_state;
        fixed.blend = BlendState::ALPHA_BLENDING;
        let transparent = mesh_material("Transparent").with_fixed_function_state(fixed);

        let a = GraphicsPipelineStateSignature::new(&opaque, &ShaderProperties::new(), &store).unwrap();
        let b = GraphicsPipelineStateSignature::new(&transparent, &ShaderProperties::new(), &store).unwrap();

        assert_eq!(a.graphics_program_cache_id(), b.graphics_program_cache_id());
        assert_ne!(a.signature_id(), b.signature_id());
    }

    #[test]
    fn test_missing_shader_blueprint() {
        let store = BlueprintStore::new();
        let result =
            GraphicsPipelineStateSignature::new(&mesh_material("Opaque"), &ShaderProperties::new(), &store);
        assert!(matches!(result, Err(RenderError::ShaderBlueprintNotFound(_))));
    }
}
