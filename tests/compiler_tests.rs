//! Graphics Pipeline State Compiler Tests
//!
//! Tests for:
//! - In-flight deduplication per graphics program (one build, one compile)
//! - Distinct pipeline states for caches sharing a program
//! - Non-blocking dispatch while compiles are still running
//! - Shutdown with queued requests
//! - Shader cache hits that skip building and compiling
//! - Failure reporting and retry after a fix
//! - Parked caches failing with their in-flight program
//! - Synchronous and emergency compilation, fallbacks, dispatch budget

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, MockPipelineState, init_logger};
use lumen::backend::{BlendState, PipelineStateHandle, ShaderType};
use lumen::pipeline::{
    BlueprintStore, GraphicsPipelineStateCacheManager, GraphicsPipelineStateCompiler,
    GraphicsPipelineStateSignature, MaterialBlueprint, ShaderBlueprint, ShaderProperties,
};
use lumen::{AssetId, CompilerSettings};

struct Fixture {
    backend: Arc<MockBackend>,
    store: Arc<BlueprintStore>,
    compiler: GraphicsPipelineStateCompiler,
    caches: GraphicsPipelineStateCacheManager,
}

impl Fixture {
    fn new(settings: CompilerSettings) -> Self {
        init_logger();
        let backend = MockBackend::new();
        let store = Arc::new(BlueprintStore::new());

        store.add_shader_blueprint(
            ShaderBlueprint::new("Mesh.vs", "void main() { /* vertex */ }")
                .with_referenced_properties(&["UseSkinning"]),
        );
        store.add_shader_blueprint(
            ShaderBlueprint::new(
                "Mesh.fs",
                "{$ if UseAlphaMap $}\nsample_alpha();\n{$ endif $}\nvoid main() { /* {{ UseAlphaMap }} */ }",
            )
            .with_referenced_properties(&["UseAlphaMap"]),
        );

        let opaque = MaterialBlueprint::new("Opaque")
            .with_shader_blueprint(ShaderType::Vertex, AssetId::new("Mesh.vs"))
            .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Mesh.fs"));
        let mut transparent_state = opaque.fixed_function_state;
        transparent_state.blend = BlendState::ALPHA_BLENDING;
        let transparent = MaterialBlueprint::new("Transparent")
            .with_shader_blueprint(ShaderType::Vertex, AssetId::new("Mesh.vs"))
            .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Mesh.fs"))
            .with_fixed_function_state(transparent_state);
        store.add_material_blueprint(opaque);
        store.add_material_blueprint(transparent);

        let compiler = GraphicsPipelineStateCompiler::new(
            backend.clone(),
            Arc::clone(&store),
            &settings,
        )
        .unwrap();
        let caches = GraphicsPipelineStateCacheManager::new(Arc::clone(&store));

        Self {
            backend,
            store,
            compiler,
            caches,
        }
    }

    fn asynchronous() -> Self {
        Self::new(CompilerSettings {
            asynchronous_compilation: true,
            number_of_compiler_threads: 2,
            max_dispatches_per_frame: None,
        })
    }

    fn request(&mut self, material: &str, properties: &ShaderProperties) -> Option<PipelineStateHandle> {
        self.caches
            .get_graphics_pipeline_state_cache_by_combination(
                &mut self.compiler,
                AssetId::new(material),
                properties,
                false,
            )
            .unwrap()
    }

    fn flush_and_dispatch(&mut self) -> usize {
        self.compiler.flush_all_queues();
        self.compiler.dispatch(&mut self.caches)
    }

    fn signature(&self, material: &str, properties: &ShaderProperties) -> GraphicsPipelineStateSignature {
        let blueprint = self.store.material_blueprint(AssetId::new(material)).unwrap();
        GraphicsPipelineStateSignature::new(&blueprint, properties, &self.store).unwrap()
    }
}

fn fixed_function_state(pipeline_state: &PipelineStateHandle) -> BlendState {
    pipeline_state
        .downcast_ref::<MockPipelineState>()
        .unwrap()
        .state
        .blend
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn shared_program_builds_and_compiles_once() {
    let mut fx = Fixture::asynchronous();
    let none = ShaderProperties::new();

    assert_eq!(
        fx.signature("Opaque", &none).graphics_program_cache_id(),
        fx.signature("Transparent", &none).graphics_program_cache_id()
    );

    assert!(fx.request("Opaque", &none).is_none());
    assert!(fx.request("Transparent", &none).is_none());
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 1);

    assert_eq!(fx.flush_and_dispatch(), 1);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);

    let stats = fx.compiler.statistics();
    assert_eq!(stats.builds, 1);
    assert_eq!(stats.compiles, 1);
    assert_eq!(fx.backend.shader_compiles(), 2);
    assert_eq!(fx.backend.programs(), 1);
    assert_eq!(fx.backend.pipeline_states(), 2);
}

#[test]
fn caches_sharing_a_program_get_their_own_pipeline_state() {
    let mut fx = Fixture::asynchronous();
    let none = ShaderProperties::new();

    fx.request("Opaque", &none);
    fx.request("Transparent", &none);
    fx.flush_and_dispatch();

    let opaque = fx.request("Opaque", &none).unwrap();
    let transparent = fx.request("Transparent", &none).unwrap();

    assert!(!opaque.ptr_eq(&transparent));
    assert_eq!(fixed_function_state(&opaque), BlendState::OPAQUE);
    assert_eq!(fixed_function_state(&transparent), BlendState::ALPHA_BLENDING);
    assert_eq!(
        opaque.downcast_ref::<MockPipelineState>().unwrap().program_id,
        transparent.downcast_ref::<MockPipelineState>().unwrap().program_id
    );
}

#[test]
fn existing_program_skips_build_and_compile() {
    let mut fx = Fixture::asynchronous();
    fx.request("Opaque", &ShaderProperties::new());
    fx.flush_and_dispatch();

    // Not referenced by any shader: new signature, same program.
    let unrelated = ShaderProperties::new().with("Unrelated", 1);
    assert!(fx.request("Opaque", &unrelated).is_some(), "fallback expected");

    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 1);
    assert_eq!(fx.compiler.statistics().builds, 1);
    assert_eq!(fx.backend.programs(), 1);
    assert_eq!(fx.backend.pipeline_states(), 2);
}

#[test]
fn identical_source_compiles_once() {
    let mut fx = Fixture::asynchronous();
    fx.request("Opaque", &ShaderProperties::new());
    fx.flush_and_dispatch();
    assert_eq!(fx.backend.shader_compiles(), 2);

    // New vertex combination whose source text does not change.
    fx.request("Opaque", &ShaderProperties::new().with("UseSkinning", 1));
    fx.flush_and_dispatch();

    assert_eq!(fx.backend.shader_compiles(), 2);
    assert_eq!(fx.backend.programs(), 2);
    assert_eq!(fx.compiler.number_of_shader_caches(), 3);
}

#[test]
fn fully_cached_stages_do_not_count_as_build() {
    let mut fx = Fixture::asynchronous();
    let skinning = ShaderProperties::new().with("UseSkinning", 1);
    let alpha = ShaderProperties::new().with("UseAlphaMap", 1);

    for properties in [ShaderProperties::new(), skinning, alpha] {
        fx.request("Opaque", &properties);
        assert_eq!(fx.flush_and_dispatch(), 1);
    }
    let before = fx.compiler.statistics();
    assert_eq!(before.builds, 3);

    // Both stage combinations already exist; only the program is new.
    let both = ShaderProperties::new()
        .with("UseSkinning", 1)
        .with("UseAlphaMap", 1);
    fx.request("Opaque", &both);
    assert_eq!(fx.flush_and_dispatch(), 1);

    let after = fx.compiler.statistics();
    assert_eq!(after.builds, before.builds);
    assert_eq!(after.compiles, before.compiles);
    assert_eq!(after.shader_cache_hits, before.shader_cache_hits + 2);
    assert_eq!(fx.backend.programs(), 4);
    assert!(fx.request("Opaque", &both).is_some());
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn dispatch_does_not_wait_for_compilation() {
    let mut fx = Fixture::asynchronous();
    fx.backend.close_compile_gate();

    let alpha = ShaderProperties::new().with("UseAlphaMap", 1);
    fx.request("Opaque", &alpha);
    fx.compiler.flush_builder_queue();

    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 0);
    let handle = fx.caches.find(fx.signature("Opaque", &alpha).signature_id()).unwrap();
    assert!(fx.caches.get(handle).unwrap().pipeline_state().is_none());
    assert!(fx.caches.get(handle).unwrap().is_using_fallback());

    fx.backend.open_compile_gate();
    assert_eq!(fx.flush_and_dispatch(), 1);
    assert!(fx.caches.get(handle).unwrap().is_ready());
}

#[test]
fn dispatch_respects_per_frame_budget() {
    let mut fx = Fixture::new(CompilerSettings {
        asynchronous_compilation: true,
        number_of_compiler_threads: 2,
        max_dispatches_per_frame: Some(1),
    });

    for value in 1..=3 {
        fx.request("Opaque", &ShaderProperties::new().with("UseAlphaMap", value));
    }
    fx.compiler.flush_all_queues();

    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 1);
    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 1);
    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 1);
    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 0);
    assert_eq!(fx.backend.programs(), 3);
}

#[test]
fn fallback_is_default_property_pipeline_state() {
    let mut fx = Fixture::asynchronous();
    fx.request("Opaque", &ShaderProperties::new());
    fx.flush_and_dispatch();
    let default_state = fx.request("Opaque", &ShaderProperties::new()).unwrap();

    let variant = fx
        .request("Opaque", &ShaderProperties::new().with("UseAlphaMap", 1))
        .unwrap();
    assert!(variant.ptr_eq(&default_state));

    fx.flush_and_dispatch();
    let variant = fx
        .request("Opaque", &ShaderProperties::new().with("UseAlphaMap", 1))
        .unwrap();
    assert!(!variant.ptr_eq(&default_state));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failed_build_is_reported_and_can_be_retried() {
    let mut fx = Fixture::asynchronous();
    fx.store
        .add_shader_blueprint(ShaderBlueprint::new("Broken.fs", "{{ NotAProperty }}"));
    fx.store.add_material_blueprint(
        MaterialBlueprint::new("Broken")
            .with_shader_blueprint(ShaderType::Vertex, AssetId::new("Mesh.vs"))
            .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Broken.fs")),
    );

    assert!(fx.request("Broken", &ShaderProperties::new()).is_none());
    assert_eq!(fx.flush_and_dispatch(), 1);

    let signature_id = fx.signature("Broken", &ShaderProperties::new()).signature_id();
    let handle = fx.caches.find(signature_id).unwrap();
    let cache = fx.caches.get(handle).unwrap();
    assert!(cache.compile_failed());
    assert!(!cache.is_using_fallback());
    assert_eq!(fx.compiler.statistics().failures, 1);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);
    assert_eq!(fx.backend.pipeline_states(), 0);

    // Fix the shader and drop the stale caches.
    fx.store
        .add_shader_blueprint(ShaderBlueprint::new("Broken.fs", "void main() {}"));
    assert_eq!(fx.caches.clear_material_blueprint(AssetId::new("Broken")), 1);

    fx.request("Broken", &ShaderProperties::new());
    fx.flush_and_dispatch();
    assert!(fx.request("Broken", &ShaderProperties::new()).is_some());
}

#[test]
fn failed_compile_releases_in_flight_program() {
    let mut fx = Fixture::asynchronous();
    fx.store
        .add_shader_blueprint(ShaderBlueprint::new("Invalid.fs", "#error broken"));
    fx.store.add_material_blueprint(
        MaterialBlueprint::new("Invalid")
            .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Invalid.fs")),
    );

    fx.request("Invalid", &ShaderProperties::new());
    fx.flush_and_dispatch();

    assert_eq!(fx.compiler.statistics().failures, 1);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);
    assert_eq!(fx.backend.programs(), 0);
}

#[test]
fn parked_cache_fails_with_its_program_and_can_be_rebuilt() {
    let mut fx = Fixture::asynchronous();
    fx.store
        .add_shader_blueprint(ShaderBlueprint::new("Invalid.fs", "#error broken"));
    let invalid = MaterialBlueprint::new("Invalid")
        .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Invalid.fs"));
    let mut blended_state = invalid.fixed_function_state;
    blended_state.blend = BlendState::ALPHA_BLENDING;
    let invalid_blended = MaterialBlueprint::new("InvalidBlended")
        .with_shader_blueprint(ShaderType::Fragment, AssetId::new("Invalid.fs"))
        .with_fixed_function_state(blended_state);
    fx.store.add_material_blueprint(invalid);
    fx.store.add_material_blueprint(invalid_blended);

    let none = ShaderProperties::new();
    assert!(fx.request("Invalid", &none).is_none());
    assert!(fx.request("InvalidBlended", &none).is_none());
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 1);

    assert_eq!(fx.flush_and_dispatch(), 1);
    for material in ["Invalid", "InvalidBlended"] {
        let handle = fx.caches.find(fx.signature(material, &none).signature_id()).unwrap();
        assert!(fx.caches.get(handle).unwrap().compile_failed(), "{material}");
    }
    assert_eq!(fx.compiler.statistics().failures, 1);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);

    // The program slot was released, so a fresh cache starts a new request.
    let builds = fx.compiler.statistics().builds;
    assert_eq!(fx.caches.clear_material_blueprint(AssetId::new("Invalid")), 1);
    fx.request("Invalid", &none);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 1);

    assert_eq!(fx.flush_and_dispatch(), 1);
    assert_eq!(fx.compiler.statistics().builds, builds + 1);
    assert_eq!(fx.compiler.statistics().failures, 2);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);
}

// ============================================================================
// Synchronous Compilation
// ============================================================================

#[test]
fn synchronous_mode_compiles_inline() {
    let mut fx = Fixture::new(CompilerSettings {
        asynchronous_compilation: false,
        number_of_compiler_threads: 1,
        max_dispatches_per_frame: None,
    });

    let pipeline_state = fx.request("Transparent", &ShaderProperties::new()).unwrap();
    assert_eq!(fixed_function_state(&pipeline_state), BlendState::ALPHA_BLENDING);
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);
    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 0);
}

#[test]
fn emergency_compilation_bypasses_queues() {
    let mut fx = Fixture::asynchronous();
    let pipeline_state = fx
        .caches
        .get_graphics_pipeline_state_cache_by_combination(
            &mut fx.compiler,
            AssetId::new("Opaque"),
            &ShaderProperties::new(),
            true,
        )
        .unwrap();

    assert!(pipeline_state.is_some());
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 0);
    assert_eq!(fx.backend.pipeline_states(), 1);
}

#[test]
fn switching_to_synchronous_flushes_queues() {
    let mut fx = Fixture::asynchronous();
    fx.request("Opaque", &ShaderProperties::new());
    fx.compiler.set_asynchronous_compilation_enabled(false);

    assert_eq!(fx.compiler.number_of_queued_requests(), 0);
    assert_eq!(fx.compiler.dispatch(&mut fx.caches), 1);
}

// ============================================================================
// Thread Pool & Shutdown
// ============================================================================

#[test]
fn resizing_compiler_threads_keeps_working() {
    let mut fx = Fixture::asynchronous();
    fx.compiler.set_number_of_compiler_threads(4).unwrap();
    assert_eq!(fx.compiler.number_of_compiler_threads(), 4);

    fx.request("Opaque", &ShaderProperties::new());
    fx.compiler.set_number_of_compiler_threads(1).unwrap();
    assert_eq!(fx.compiler.number_of_compiler_threads(), 1);

    assert_eq!(fx.flush_and_dispatch(), 1);
    assert!(fx.request("Opaque", &ShaderProperties::new()).is_some());
}

#[test]
fn shutdown_discards_queued_requests() {
    let mut fx = Fixture::new(CompilerSettings {
        asynchronous_compilation: true,
        number_of_compiler_threads: 1,
        max_dispatches_per_frame: None,
    });
    fx.backend.set_compile_delay(Duration::from_millis(20));

    for value in 1..=5 {
        fx.request("Opaque", &ShaderProperties::new().with("UseAlphaMap", value));
    }
    assert_eq!(fx.compiler.number_of_in_flight_compiler_requests(), 5);

    let Fixture { backend, compiler, .. } = fx;
    drop(compiler);

    assert_eq!(backend.programs(), 0);
    assert_eq!(backend.pipeline_states(), 0);
}
