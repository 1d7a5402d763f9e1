//! Shader Builder
//!
//! Turns a [`ShaderBlueprint`] plus concrete [`ShaderProperties`] into shader
//! source text using minijinja. Templates use the block syntax
//!
//! ```text
//! {$ if UseAlphaMap $} ... {$ endif $}      block statements
//! {{ NumberOfLights }}                       expressions
//! $$ include "lighting"                      line statements
//! ```
//!
//! Only the blueprint's referenced properties are visible to the template,
//! so a template can never depend on a value that is not part of its shader
//! combination id. `SHADER_TYPE` holds the stage name.
//!
//! `include` resolves shader pieces through the [`BlueprintStore`].

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::value::Value;
use minijinja::{Environment, syntax::SyntaxConfig};

use super::ShaderProperties;
use super::blueprint::{BlueprintStore, ShaderBlueprint};
use crate::backend::ShaderType;
use crate::errors::{RenderError, Result};

/// Thread-safe template renderer; shared by the builder thread and the
/// instant synchronous compilation path.
pub struct ShaderBuilder {
    env: Environment<'static>,
}

impl ShaderBuilder {
    #[must_use]
    pub fn new(store: Arc<BlueprintStore>) -> Self {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);

        env.set_loader(move |name| Ok(store.shader_piece(name).map(|piece| piece.to_string())));

        Self { env }
    }

    /// Renders the stage source of `blueprint` for `properties`.
    pub fn build(
        &self,
        shader_type: ShaderType,
        blueprint: &ShaderBlueprint,
        properties: &ShaderProperties,
    ) -> Result<String> {
        let mut context: BTreeMap<&'static str, Value> = BTreeMap::new();
        for referenced in blueprint.referenced_properties.iter() {
            let value = properties.get_by_id(referenced.id).unwrap_or(referenced.value);
            context.insert(referenced.name(), Value::from(value));
        }
        context.insert("SHADER_TYPE", Value::from(shader_type.name()));

        let body = self
            .env
            .render_str(&blueprint.source_template, &context)
            .map_err(|err| RenderError::ShaderBuild {
                blueprint: blueprint.asset_id,
                shader_type,
                message: format!("{err:#}"),
            })?;

        log::trace!(
            "Built {} shader for {} ({} bytes)",
            shader_type.name(),
            blueprint.debug_name,
            body.len()
        );

        Ok(format!(
            "// Generated {} shader: {}\n{body}",
            shader_type.name(),
            blueprint.debug_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with_piece() -> (Arc<BlueprintStore>, ShaderBuilder) {
        let store = Arc::new(BlueprintStore::new());
        store.add_shader_piece("lighting", "float light = {{ NumberOfLights }};");
        let builder = ShaderBuilder::new(Arc::clone(&store));
        (store, builder)
    }

    #[test]
    fn test_build_with_properties_and_include() {
        let (_store, builder) = builder_with_piece();
        let blueprint = ShaderBlueprint::new(
            "Lit.fs",
            "{$ if UseAlphaMap $}\nalpha\n{$ endif $}\n$$ include \"lighting\"\n",
        )
        .with_referenced_properties(&["UseAlphaMap", "NumberOfLights"]);

        let properties = ShaderProperties::new().with("UseAlphaMap", 1).with("NumberOfLights", 3);
        let source = builder.build(ShaderType::Fragment, &blueprint, &properties).unwrap();

        assert!(source.starts_with("// Generated fragment shader: Lit.fs"));
        assert!(source.contains("alpha"));
        assert!(source.contains("float light = 3;"));
    }

    #[test]
    fn test_unset_property_uses_declared_default() {
        let (_store, builder) = builder_with_piece();
        let blueprint = ShaderBlueprint::new("Lit.vs", "{{ NumberOfLights }}")
            .with_referenced_property("NumberOfLights", 2);

        let source = builder
            .build(ShaderType::Vertex, &blueprint, &ShaderProperties::new())
            .unwrap();
        assert!(source.ends_with('2'));
    }

    #[test]
    fn test_unreferenced_property_is_invisible() {
        let (_store, builder) = builder_with_piece();
        let blueprint = ShaderBlueprint::new("Plain.vs", "{{ Secret }}");

        let err = builder
            .build(ShaderType::Vertex, &blueprint, &ShaderProperties::new().with("Secret", 1))
            .unwrap_err();
        assert!(matches!(err, RenderError::ShaderBuild { shader_type: ShaderType::Vertex, .. }));
    }

    #[test]
    fn test_missing_piece_fails() {
        let (_store, builder) = builder_with_piece();
        let blueprint = ShaderBlueprint::new("Broken.fs", "{$ include \"missing\" $}");
        assert!(builder
            .build(ShaderType::Fragment, &blueprint, &ShaderProperties::new())
            .is_err());
    }
}
