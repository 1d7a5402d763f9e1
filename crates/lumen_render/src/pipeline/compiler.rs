//! Graphics Pipeline State Compiler
//!
//! Turns pipeline state cache requests into backend objects without stalling
//! the render thread. Each request moves through three stages:
//!
//! ```text
//!  render thread          builder thread           compiler threads (N)        render thread
//!  ─────────────          ──────────────           ────────────────────        ─────────────
//!  add_asynchronous  ──▶  builder queue  ──build──▶  compiler queue ──compile──▶ dispatch queue ──▶ dispatch()
//!  _compiler_request      (templates → source)      (source → bytecode)         (program + PSO)
//! ```
//!
//! - **build**: shader sources are rendered from blueprints; stages whose
//!   combination already has bytecode are taken from the shader cache
//! - **compile**: remaining sources are compiled by the backend; identical
//!   source text is compiled once
//! - **dispatch**: on the render thread the graphics program is linked (or
//!   taken from the program cache) and one pipeline state object is created
//!   per waiting cache
//!
//! Requests are deduplicated per [`GraphicsProgramCacheId`]: while a program is
//! in flight, further caches needing it are parked on the in-flight entry and
//! receive their pipeline state when the first request dispatches. Requests
//! whose program already exists skip building and compiling entirely.
//!
//! Failures travel with the request and are reported at dispatch, where the
//! in-flight entry is always released so a later request may retry.
//!
//! Dropping the compiler stops and joins every worker; queued requests are
//! discarded and never reach the backend's `create_*` entry points.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::blueprint::{BlueprintStore, MaterialBlueprint};
use super::cache::{
    GraphicsPipelineStateCache, GraphicsPipelineStateCacheHandle, GraphicsPipelineStateCacheManager,
};
use super::program_cache::GraphicsProgramCacheManager;
use super::shader_builder::ShaderBuilder;
use super::shader_cache::{ShaderCache, ShaderCacheManager};
use super::signature::GraphicsPipelineStateSignature;
use crate::backend::{
    GraphicsProgramHandle, PipelineStateHandle, RenderBackend, ShaderStageArray, ShaderType,
};
use crate::errors::{RenderError, Result};
use crate::settings::CompilerSettings;
use crate::signature::GraphicsProgramCacheId;

// ─── Request ─────────────────────────────────────────────────────────────────

/// Unit of work flowing through the queues. Owned by exactly one queue or
/// worker at a time.
struct CompilerRequest {
    cache: GraphicsPipelineStateCacheHandle,
    material_blueprint: Arc<MaterialBlueprint>,
    signature: GraphicsPipelineStateSignature,
    shader_sources: ShaderStageArray<Option<String>>,
    shader_caches: ShaderStageArray<Option<Arc<ShaderCache>>>,
    /// Set when the program already existed at enqueue time.
    program: Option<GraphicsProgramHandle>,
    error: Option<RenderError>,
}

impl CompilerRequest {
    fn new(cache: GraphicsPipelineStateCacheHandle, pipeline_state_cache: &GraphicsPipelineStateCache) -> Self {
        Self {
            cache,
            material_blueprint: Arc::clone(pipeline_state_cache.material_blueprint()),
            signature: pipeline_state_cache.signature().clone(),
            shader_sources: Default::default(),
            shader_caches: Default::default(),
            program: None,
            error: None,
        }
    }
}

// ─── Work Queue ──────────────────────────────────────────────────────────────

struct WorkQueueState {
    requests: VecDeque<CompilerRequest>,
    in_progress: usize,
    stop: bool,
}

/// Blocking FIFO with an in-progress count, so flushing can wait until both
/// queued and currently processed work are gone.
struct WorkQueue {
    state: Mutex<WorkQueueState>,
    work_available: Condvar,
    drained: Condvar,
}

impl WorkQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(WorkQueueState {
                requests: VecDeque::new(),
                in_progress: 0,
                stop: false,
            }),
            work_available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    fn push(&self, request: CompilerRequest) {
        self.state.lock().requests.push_back(request);
        self.work_available.notify_one();
    }

    /// Blocks until work is available. `None` once the queue is stopped.
    fn pop(&self) -> Option<CompilerRequest> {
        let mut state = self.state.lock();
        loop {
            if state.stop {
                return None;
            }
            if let Some(request) = state.requests.pop_front() {
                state.in_progress += 1;
                return Some(request);
            }
            self.work_available.wait(&mut state);
        }
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.in_progress -= 1;
        if state.requests.is_empty() && state.in_progress == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_until_drained(&self) {
        let mut state = self.state.lock();
        while !state.stop && !(state.requests.is_empty() && state.in_progress == 0) {
            self.drained.wait(&mut state);
        }
    }

    /// Wakes every worker and makes [`pop`](Self::pop) return `None`.
    /// Returns the number of discarded requests when `discard` is set.
    fn stop(&self, discard: bool) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            state.stop = true;
            let discarded = if discard { state.requests.len() } else { 0 };
            if discard {
                state.requests.clear();
            }
            discarded
        };
        self.work_available.notify_all();
        self.drained.notify_all();
        discarded
    }

    fn resume(&self) {
        self.state.lock().stop = false;
    }

    fn len(&self) -> usize {
        self.state.lock().requests.len()
    }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Monotonic counters, readable from any thread.
#[derive(Debug, Default)]
pub struct CompilerStatistics {
    builds: AtomicU64,
    compiles: AtomicU64,
    shader_cache_hits: AtomicU64,
    dispatched: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`CompilerStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerStatisticsSnapshot {
    /// Requests that went through the build stage.
    pub builds: u64,
    /// Requests that went through the compile stage.
    pub compiles: u64,
    /// Shader stages served from the shader cache instead of being built or
    /// compiled again.
    pub shader_cache_hits: u64,
    /// Requests that produced a graphics program at dispatch.
    pub dispatched: u64,
    pub failures: u64,
}

impl CompilerStatistics {
    #[must_use]
    pub fn snapshot(&self) -> CompilerStatisticsSnapshot {
        CompilerStatisticsSnapshot {
            builds: self.builds.load(Ordering::Relaxed),
            compiles: self.compiles.load(Ordering::Relaxed),
            shader_cache_hits: self.shader_cache_hits.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

// ─── Shared State ────────────────────────────────────────────────────────────

type InFlightWaiters = SmallVec<[GraphicsPipelineStateCacheHandle; 4]>;

/// State shared between the render thread and the workers.
struct CompilerShared {
    backend: Arc<dyn RenderBackend>,
    store: Arc<BlueprintStore>,
    shader_builder: ShaderBuilder,
    shader_cache_manager: Mutex<ShaderCacheManager>,
    builder_queue: WorkQueue,
    compiler_queue: WorkQueue,
    dispatch_sender: flume::Sender<CompilerRequest>,
    /// Program id → caches parked behind the request that builds it.
    in_flight_graphics_program_caches: Mutex<FxHashMap<GraphicsProgramCacheId, InFlightWaiters>>,
    number_of_in_flight_compiler_requests: AtomicU32,
    statistics: CompilerStatistics,
}

impl CompilerShared {
    /// Renders the source of every stage not yet in the shader cache. Only
    /// requests that rendered at least one source count as a build.
    fn build(&self, request: &mut CompilerRequest) {
        let mut built = false;
        for shader_type in ShaderType::ALL {
            let idx = shader_type.index();
            let Some(combination_id) = request.signature.shader_combination_id(shader_type) else {
                continue;
            };

            if let Some(cache) = self.shader_cache_manager.lock().get(combination_id) {
                request.shader_caches[idx] = Some(cache);
                self.statistics.shader_cache_hits.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let Some(blueprint_id) = request.material_blueprint.shader_blueprint(shader_type) else {
                continue;
            };
            let Some(blueprint) = self.store.shader_blueprint(blueprint_id) else {
                request.error = Some(RenderError::ShaderBlueprintNotFound(blueprint_id));
                return;
            };

            match self
                .shader_builder
                .build(shader_type, &blueprint, request.signature.shader_properties())
            {
                Ok(source) => {
                    request.shader_sources[idx] = Some(source);
                    built = true;
                }
                Err(err) => {
                    request.error = Some(err);
                    return;
                }
            }
        }
        if built {
            self.statistics.builds.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Compiles every built source into bytecode. Requests without built
    /// sources do not count as a compile.
    fn compile(&self, request: &mut CompilerRequest) {
        let mut compiled = false;
        for shader_type in ShaderType::ALL {
            let idx = shader_type.index();
            let Some(source) = request.shader_sources[idx].take() else {
                continue;
            };
            let Some(combination_id) = request.signature.shader_combination_id(shader_type) else {
                continue;
            };
            compiled = true;

            let source_hash = ShaderCacheManager::source_hash(&source);
            {
                let mut manager = self.shader_cache_manager.lock();
                if let Some(bytecode) = manager.bytecode_by_source_hash(source_hash) {
                    request.shader_caches[idx] = Some(manager.insert(combination_id, source_hash, bytecode));
                    self.statistics.shader_cache_hits.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            }

            match self.backend.compile_shader(shader_type, &source) {
                Ok(bytecode) => {
                    let cache = self.shader_cache_manager.lock().insert(
                        combination_id,
                        source_hash,
                        Arc::new(bytecode),
                    );
                    request.shader_caches[idx] = Some(cache);
                }
                Err(err) => {
                    request.error = Some(err.into());
                    return;
                }
            }
        }
        if compiled {
            self.statistics.compiles.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn send_to_dispatch(&self, request: CompilerRequest) {
        // The receiver lives as long as the compiler, which outlives the workers.
        let _ = self.dispatch_sender.send(request);
    }
}

fn builder_thread_main(shared: &CompilerShared) {
    log::debug!("Shader builder thread started");
    while let Some(mut request) = shared.builder_queue.pop() {
        shared.build(&mut request);
        if request.error.is_some() {
            shared.send_to_dispatch(request);
        } else {
            shared.compiler_queue.push(request);
        }
        shared.builder_queue.finish();
    }
    log::debug!("Shader builder thread stopped");
}

fn compiler_thread_main(shared: &CompilerShared) {
    while let Some(mut request) = shared.compiler_queue.pop() {
        shared.compile(&mut request);
        shared.send_to_dispatch(request);
        shared.compiler_queue.finish();
    }
}

fn spawn_worker(name: String, shared: &Arc<CompilerShared>, main: fn(&CompilerShared)) -> Result<JoinHandle<()>> {
    let shared = Arc::clone(shared);
    std::thread::Builder::new()
        .name(name)
        .spawn(move || main(&shared))
        .map_err(|err| RenderError::WorkerThread(err.to_string()))
}

// ─── Compiler ────────────────────────────────────────────────────────────────

pub struct GraphicsPipelineStateCompiler {
    shared: Arc<CompilerShared>,
    dispatch_receiver: flume::Receiver<CompilerRequest>,
    program_cache_manager: GraphicsProgramCacheManager,
    asynchronous_compilation_enabled: bool,
    max_dispatches_per_frame: Option<u32>,
    builder_thread: Option<JoinHandle<()>>,
    compiler_threads: Vec<JoinHandle<()>>,
}

impl GraphicsPipelineStateCompiler {
    /// Starts the builder thread and `settings.number_of_compiler_threads`
    /// compiler threads.
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        store: Arc<BlueprintStore>,
        settings: &CompilerSettings,
    ) -> Result<Self> {
        let (dispatch_sender, dispatch_receiver) = flume::unbounded();
        let shared = Arc::new(CompilerShared {
            backend,
            shader_builder: ShaderBuilder::new(Arc::clone(&store)),
            store,
            shader_cache_manager: Mutex::new(ShaderCacheManager::new()),
            builder_queue: WorkQueue::new(),
            compiler_queue: WorkQueue::new(),
            dispatch_sender,
            in_flight_graphics_program_caches: Mutex::new(FxHashMap::default()),
            number_of_in_flight_compiler_requests: AtomicU32::new(0),
            statistics: CompilerStatistics::default(),
        });

        let builder_thread = spawn_worker("lumen-shader-builder".to_owned(), &shared, builder_thread_main)?;

        let mut compiler = Self {
            shared,
            dispatch_receiver,
            program_cache_manager: GraphicsProgramCacheManager::new(),
            asynchronous_compilation_enabled: settings.asynchronous_compilation,
            max_dispatches_per_frame: settings.max_dispatches_per_frame,
            builder_thread: Some(builder_thread),
            compiler_threads: Vec::new(),
        };
        compiler.launch_compiler_threads(settings.number_of_compiler_threads.max(1))?;

        log::info!(
            "Graphics pipeline state compiler started ({} compiler threads, {} compilation)",
            compiler.compiler_threads.len(),
            if compiler.asynchronous_compilation_enabled { "asynchronous" } else { "synchronous" }
        );
        Ok(compiler)
    }

    fn launch_compiler_threads(&mut self, count: u32) -> Result<()> {
        for i in 0..count {
            let handle = spawn_worker(format!("lumen-shader-compiler-{i}"), &self.shared, compiler_thread_main)?;
            self.compiler_threads.push(handle);
        }
        Ok(())
    }

    fn join_compiler_threads(&mut self) {
        for handle in self.compiler_threads.drain(..) {
            if handle.join().is_err() {
                log::error!("Shader compiler thread panicked");
            }
        }
    }

    // ── Configuration ────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn is_asynchronous_compilation_enabled(&self) -> bool {
        self.asynchronous_compilation_enabled
    }

    /// Switching to synchronous compilation flushes all queues first, so no
    /// request is left behind in a pipeline nobody feeds anymore.
    pub fn set_asynchronous_compilation_enabled(&mut self, enabled: bool) {
        if self.asynchronous_compilation_enabled == enabled {
            return;
        }
        self.asynchronous_compilation_enabled = enabled;
        if !enabled {
            self.flush_all_queues();
        }
        log::info!(
            "Graphics pipeline state compilation is now {}",
            if enabled { "asynchronous" } else { "synchronous" }
        );
    }

    #[inline]
    #[must_use]
    pub fn number_of_compiler_threads(&self) -> u32 {
        self.compiler_threads.len() as u32
    }

    /// Stops and joins the compiler threads, then relaunches `count` of them.
    /// Queued requests are kept. Zero is treated as one.
    pub fn set_number_of_compiler_threads(&mut self, count: u32) -> Result<()> {
        let count = count.max(1);
        if count == self.number_of_compiler_threads() {
            return Ok(());
        }

        self.shared.compiler_queue.stop(false);
        self.join_compiler_threads();
        self.shared.compiler_queue.resume();
        self.launch_compiler_threads(count)?;

        log::info!("Graphics pipeline state compiler now uses {count} compiler threads");
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn max_dispatches_per_frame(&self) -> Option<u32> {
        self.max_dispatches_per_frame
    }

    pub fn set_max_dispatches_per_frame(&mut self, max: Option<u32>) {
        self.max_dispatches_per_frame = max;
    }

    // ── Introspection ────────────────────────────────────────────────────────

    /// Requests between enqueue and dispatch. Parked caches are not counted.
    #[inline]
    #[must_use]
    pub fn number_of_in_flight_compiler_requests(&self) -> u32 {
        self.shared.number_of_in_flight_compiler_requests.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn statistics(&self) -> CompilerStatisticsSnapshot {
        self.shared.statistics.snapshot()
    }

    #[must_use]
    pub fn number_of_shader_caches(&self) -> usize {
        self.shared.shader_cache_manager.lock().len()
    }

    #[must_use]
    pub fn number_of_graphics_programs(&self) -> usize {
        self.program_cache_manager.len()
    }

    // ── Requests ─────────────────────────────────────────────────────────────

    /// Queues compilation for `cache`. Render thread only.
    ///
    /// If the program already exists the request goes straight to the
    /// dispatch queue; if it is already in flight the cache is parked on that
    /// request instead of enqueuing a duplicate.
    pub fn add_asynchronous_compiler_request(
        &mut self,
        handle: GraphicsPipelineStateCacheHandle,
        cache: &mut GraphicsPipelineStateCache,
    ) {
        cache.begin_compilation();
        let program_id = cache.signature().graphics_program_cache_id();
        let mut request = CompilerRequest::new(handle, cache);

        if let Some(program) = self.program_cache_manager.get(program_id) {
            request.program = Some(program);
            self.shared
                .number_of_in_flight_compiler_requests
                .fetch_add(1, Ordering::AcqRel);
            self.shared.send_to_dispatch(request);
            return;
        }

        {
            let mut in_flight = self.shared.in_flight_graphics_program_caches.lock();
            if let Some(waiters) = in_flight.get_mut(&program_id) {
                waiters.push(handle);
                log::debug!(
                    "Deduplicated compiler request for {}: program {program_id:?} already in flight",
                    cache.material_blueprint().debug_name
                );
                return;
            }
            in_flight.insert(program_id, SmallVec::new());
        }

        self.shared
            .number_of_in_flight_compiler_requests
            .fetch_add(1, Ordering::AcqRel);
        self.shared.builder_queue.push(request);
    }

    /// Builds, compiles and creates everything inline on the calling thread.
    /// Render thread only.
    pub fn instant_synchronous_compiler_request(
        &mut self,
        cache: &mut GraphicsPipelineStateCache,
    ) -> Result<PipelineStateHandle> {
        let result = self.compile_inline(cache);
        match &result {
            Ok(pipeline_state) => cache.finish_compilation(pipeline_state.clone()),
            Err(err) => {
                self.shared.statistics.failures.fetch_add(1, Ordering::Relaxed);
                cache.fail_compilation(err.clone());
            }
        }
        result
    }

    fn compile_inline(&mut self, cache: &GraphicsPipelineStateCache) -> Result<PipelineStateHandle> {
        let program_id = cache.signature().graphics_program_cache_id();
        let program = match self.program_cache_manager.get(program_id) {
            Some(program) => program,
            None => {
                let mut request = CompilerRequest::new(GraphicsPipelineStateCacheHandle::default(), cache);
                self.shared.build(&mut request);
                if request.error.is_none() {
                    self.shared.compile(&mut request);
                }
                if let Some(err) = request.error {
                    return Err(err);
                }
                self.program_cache_manager.get_or_create(
                    self.shared.backend.as_ref(),
                    program_id,
                    &request.shader_caches,
                )?
            }
        };

        let pipeline_state = self
            .shared
            .backend
            .create_graphics_pipeline_state(&program, &cache.material_blueprint().fixed_function_state)?;
        Ok(pipeline_state)
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Commits finished requests: links programs and creates pipeline state
    /// objects. Never waits for workers. At most `max_dispatches_per_frame`
    /// requests are committed per call; the rest stay queued for the next
    /// call. Returns the number of committed requests.
    pub fn dispatch(&mut self, cache_manager: &mut GraphicsPipelineStateCacheManager) -> usize {
        let budget = self
            .max_dispatches_per_frame
            .map_or(usize::MAX, |max| max as usize);

        let mut dispatched = 0;
        while dispatched < budget {
            let Ok(request) = self.dispatch_receiver.try_recv() else {
                break;
            };
            self.dispatch_request(request, cache_manager);
            dispatched += 1;
        }
        dispatched
    }

    fn dispatch_request(
        &mut self,
        mut request: CompilerRequest,
        cache_manager: &mut GraphicsPipelineStateCacheManager,
    ) {
        let program_id = request.signature.graphics_program_cache_id();

        // Requests that skipped the workers never registered an in-flight entry.
        let waiters = if request.program.is_none() {
            self.shared
                .in_flight_graphics_program_caches
                .lock()
                .remove(&program_id)
                .unwrap_or_default()
        } else {
            InFlightWaiters::new()
        };
        self.shared
            .number_of_in_flight_compiler_requests
            .fetch_sub(1, Ordering::AcqRel);

        let program = match (request.error.take(), request.program.take()) {
            (Some(err), _) => Err(err),
            (None, Some(program)) => Ok(program),
            (None, None) => self.program_cache_manager.get_or_create(
                self.shared.backend.as_ref(),
                program_id,
                &request.shader_caches,
            ),
        };

        let handles = std::iter::once(request.cache).chain(waiters);
        match program {
            Ok(program) => {
                self.shared.statistics.dispatched.fetch_add(1, Ordering::Relaxed);
                for handle in handles {
                    let Some(cache) = cache_manager.get_mut(handle) else {
                        continue;
                    };
                    match self
                        .shared
                        .backend
                        .create_graphics_pipeline_state(&program, &cache.material_blueprint().fixed_function_state)
                    {
                        Ok(pipeline_state) => cache.finish_compilation(pipeline_state),
                        Err(err) => {
                            log::error!(
                                "Failed to create pipeline state for {} (program {program_id:?}): {err}",
                                cache.material_blueprint().debug_name
                            );
                            cache.fail_compilation(err.into());
                        }
                    }
                }
            }
            Err(err) => {
                self.shared.statistics.failures.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "Graphics pipeline state compilation failed for {} (program {program_id:?}): {err}",
                    request.material_blueprint.debug_name
                );
                for handle in handles {
                    if let Some(cache) = cache_manager.get_mut(handle) {
                        cache.fail_compilation(err.clone());
                    }
                }
            }
        }
    }

    // ── Flushing ─────────────────────────────────────────────────────────────

    /// Blocks until the builder thread has no queued or in-progress work.
    pub fn flush_builder_queue(&self) {
        self.shared.builder_queue.wait_until_drained();
    }

    /// Blocks until the compiler threads have no queued or in-progress work.
    pub fn flush_compiler_queue(&self) {
        self.shared.compiler_queue.wait_until_drained();
    }

    /// Flushes the builder queue, then the compiler queue. Afterwards every
    /// request issued so far sits in the dispatch queue.
    pub fn flush_all_queues(&self) {
        self.flush_builder_queue();
        self.flush_compiler_queue();
    }

    /// Number of requests waiting in the builder and compiler queues.
    #[must_use]
    pub fn number_of_queued_requests(&self) -> usize {
        self.shared.builder_queue.len() + self.shared.compiler_queue.len()
    }
}

impl Drop for GraphicsPipelineStateCompiler {
    fn drop(&mut self) {
        let discarded =
            self.shared.builder_queue.stop(true) + self.shared.compiler_queue.stop(true);

        if let Some(handle) = self.builder_thread.take()
            && handle.join().is_err()
        {
            log::error!("Shader builder thread panicked");
        }
        self.join_compiler_threads();

        let undispatched = self.dispatch_receiver.drain().count();
        if discarded + undispatched > 0 {
            log::debug!(
                "Discarded {discarded} queued and {undispatched} undispatched compiler requests on shutdown"
            );
        }
    }
}
