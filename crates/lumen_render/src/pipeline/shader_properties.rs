//! Shader Properties
//!
//! Integer valued shader properties (the material-level preprocessor
//! definitions) that select one concrete shader out of a shader blueprint.
//!
//! Entries are kept sorted by [`ShaderPropertyId`] (the FNV-1a hash of the
//! name), so identical property sets always iterate, compare and hash the same
//! way regardless of insertion order or interning order. Names are interned so
//! the shader builder can hand them to the template engine.
//!
//! ```rust
//! use lumen_render::pipeline::ShaderProperties;
//!
//! let mut properties = ShaderProperties::new();
//! properties.set("UseAlphaMap", 1);
//! properties.set("NumberOfLights", 4);
//! assert_eq!(properties.get("NumberOfLights"), Some(4));
//! ```

use lumen_core::ShaderPropertyId;
use lumen_core::interner::{self, Symbol};
use smallvec::SmallVec;

/// One `name = value` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProperty {
    pub id: ShaderPropertyId,
    pub name: Symbol,
    pub value: i32,
}

impl ShaderProperty {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        interner::resolve(self.name)
    }
}

/// Sorted set of shader properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderProperties {
    properties: SmallVec<[ShaderProperty; 8]>,
}

impl ShaderProperties {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties: SmallVec::new(),
        }
    }

    /// Sets a property, overwriting an existing value.
    pub fn set(&mut self, name: &str, value: i32) {
        let id = ShaderPropertyId::new(name);
        match self.properties.binary_search_by_key(&id, |p| p.id) {
            Ok(idx) => self.properties[idx].value = value,
            Err(idx) => self.properties.insert(
                idx,
                ShaderProperty {
                    id,
                    name: interner::intern(name),
                    value,
                },
            ),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: i32) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<i32> {
        self.get_by_id(ShaderPropertyId::new(name))
    }

    #[must_use]
    pub fn get_by_id(&self, id: ShaderPropertyId) -> Option<i32> {
        self.properties
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|idx| self.properties[idx].value)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let id = ShaderPropertyId::new(name);
        if let Ok(idx) = self.properties.binary_search_by_key(&id, |p| p.id) {
            self.properties.remove(idx);
            true
        } else {
            false
        }
    }

    /// Merges `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &ShaderProperties) {
        for property in &other.properties {
            self.set(property.name(), property.value);
        }
    }

    /// Properties in id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ShaderProperty> {
        self.properties.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl From<&[(&str, i32)]> for ShaderProperties {
    fn from(properties: &[(&str, i32)]) -> Self {
        let mut result = Self::new();
        for &(name, value) in properties {
            result.set(name, value);
        }
        result
    }
}
