//! Shader Cache
//!
//! Compiled shader bytecode, keyed two ways:
//!
//! - by [`ShaderCombinationId`]: the build step skips blueprints whose
//!   combination was compiled before
//! - by the xxh3-128 hash of the built source: two combinations that expand
//!   to identical source text share one bytecode blob and one backend compile
//!
//! The manager is shared by the builder and compiler threads behind a mutex;
//! callers never hold that lock across a backend compile.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::backend::ShaderBytecode;
use crate::signature::ShaderCombinationId;

/// One compiled shader stage.
#[derive(Debug)]
pub struct ShaderCache {
    shader_combination_id: ShaderCombinationId,
    source_hash: u128,
    bytecode: Arc<ShaderBytecode>,
}

impl ShaderCache {
    #[inline]
    #[must_use]
    pub fn shader_combination_id(&self) -> ShaderCombinationId {
        self.shader_combination_id
    }

    #[inline]
    #[must_use]
    pub fn source_hash(&self) -> u128 {
        self.source_hash
    }

    #[inline]
    #[must_use]
    pub fn bytecode(&self) -> &Arc<ShaderBytecode> {
        &self.bytecode
    }
}

#[derive(Default)]
pub struct ShaderCacheManager {
    by_combination: FxHashMap<ShaderCombinationId, Arc<ShaderCache>>,
    by_source_hash: FxHashMap<u128, Arc<ShaderBytecode>>,
}

impl ShaderCacheManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn source_hash(source: &str) -> u128 {
        xxh3_128(source.as_bytes())
    }

    #[must_use]
    pub fn get(&self, shader_combination_id: ShaderCombinationId) -> Option<Arc<ShaderCache>> {
        self.by_combination.get(&shader_combination_id).cloned()
    }

    #[must_use]
    pub fn bytecode_by_source_hash(&self, source_hash: u128) -> Option<Arc<ShaderBytecode>> {
        self.by_source_hash.get(&source_hash).cloned()
    }

    /// Registers bytecode for a combination. If the combination is already
    /// present (a concurrent build raced us) the existing entry wins.
    pub fn insert(
        &mut self,
        shader_combination_id: ShaderCombinationId,
        source_hash: u128,
        bytecode: Arc<ShaderBytecode>,
    ) -> Arc<ShaderCache> {
        let bytecode = Arc::clone(
            self.by_source_hash
                .entry(source_hash)
                .or_insert(bytecode),
        );
        Arc::clone(
            self.by_combination
                .entry(shader_combination_id)
                .or_insert_with(|| {
                    Arc::new(ShaderCache {
                        shader_combination_id,
                        source_hash,
                        bytecode,
                    })
                }),
        )
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_combination.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_combination.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_combination.clear();
        self.by_source_hash.clear();
    }
}
