//! Shader property handles, keywords, and global uniform state.
//!
//! [`ShaderGlobals`] is the single explicit state object shared by every pass
//! in the pipeline. Passes receive it by mutable reference, so write ordering
//! between passes is an explicit dependency rather than an implicit global.
//! Writes coalesce last-write-wins and stay visible to every subsequently
//! dispatched shader until overwritten.

use std::collections::{BTreeSet, HashMap};

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Opaque stable handle for a named global shader property.
///
/// Resolved once through [`PropertyRegistry::resolve`] and reused for the
/// registry's lifetime; a name is never re-resolved to a different id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyId(u32);

/// Cheap clonable reference to a texture in the engine's texture namespace.
///
/// Textures are keyed by name, matching how effect profiles reference them on
/// disk; the texture manager resolves keys to GPU resources at bind time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureKey(pub String);

impl TextureKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Resolves and caches stable integer handles for named global properties.
#[derive(Clone, Debug, Default)]
pub struct PropertyRegistry {
    ids: HashMap<String, PropertyId>,
    names: Vec<String>,
}

impl PropertyRegistry {
    /// Resolve a property name, interning it on first use.
    pub fn resolve(&mut self, name: &str) -> PropertyId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = PropertyId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        log::debug!("Resolved shader property '{}' to {:?}", name, id);
        id
    }

    /// The name a handle was resolved from, for diagnostics.
    pub fn name_of(&self, id: PropertyId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Number of interned properties.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The mutable shader global state shared by all passes in the pipeline.
#[derive(Clone, Debug, Default)]
pub struct ShaderGlobals {
    registry: PropertyRegistry,
    keywords: BTreeSet<String>,
    vectors: HashMap<PropertyId, Vec4>,
    colors: HashMap<PropertyId, Vec4>,
    textures: HashMap<PropertyId, TextureKey>,
}

impl ShaderGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a property name to its stable handle, interning on first use.
    pub fn resolve_property(&mut self, name: &str) -> PropertyId {
        self.registry.resolve(name)
    }

    /// The embedded property registry, for diagnostics.
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// Enable or disable a named shader compile keyword.
    pub fn set_keyword(&mut self, name: &str, enabled: bool) {
        if enabled {
            self.keywords.insert(name.to_string());
        } else {
            self.keywords.remove(name);
        }
    }

    pub fn keyword_enabled(&self, name: &str) -> bool {
        self.keywords.contains(name)
    }

    /// Currently enabled keywords, in deterministic (sorted) order.
    pub fn enabled_keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn set_global_vector(&mut self, id: PropertyId, value: Vec4) {
        self.vectors.insert(id, value);
    }

    pub fn global_vector(&self, id: PropertyId) -> Option<Vec4> {
        self.vectors.get(&id).copied()
    }

    pub fn set_global_color(&mut self, id: PropertyId, rgba: Vec4) {
        self.colors.insert(id, rgba);
    }

    pub fn global_color(&self, id: PropertyId) -> Option<Vec4> {
        self.colors.get(&id).copied()
    }

    pub fn set_global_texture(&mut self, id: PropertyId, texture: TextureKey) {
        self.textures.insert(id, texture);
    }

    pub fn global_texture(&self, id: PropertyId) -> Option<&TextureKey> {
        self.textures.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_ids_are_stable() {
        let mut registry = PropertyRegistry::default();
        let first = registry.resolve("fog_color");
        for _ in 0..100 {
            assert_eq!(registry.resolve("fog_color"), first);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_names_get_distinct_ids() {
        let mut registry = PropertyRegistry::default();
        let color = registry.resolve("fog_color");
        let params = registry.resolve("fog_params");
        assert_ne!(color, params);
        assert_eq!(registry.name_of(color), Some("fog_color"));
        assert_eq!(registry.name_of(params), Some("fog_params"));
    }

    #[test]
    fn test_vector_writes_are_last_write_wins() {
        let mut globals = ShaderGlobals::new();
        let id = globals.resolve_property("fog_params");
        globals.set_global_vector(id, Vec4::splat(1.0));
        globals.set_global_vector(id, Vec4::new(0.02, 0.0, 0.0, 50.0));
        assert_eq!(
            globals.global_vector(id),
            Some(Vec4::new(0.02, 0.0, 0.0, 50.0))
        );
    }

    #[test]
    fn test_keyword_toggle() {
        let mut globals = ShaderGlobals::new();
        globals.set_keyword("FOG_LINEAR", true);
        assert!(globals.keyword_enabled("FOG_LINEAR"));
        globals.set_keyword("FOG_LINEAR", false);
        assert!(!globals.keyword_enabled("FOG_LINEAR"));
        // Disabling an absent keyword is a no-op, not an error.
        globals.set_keyword("FOGMAP", false);
        assert!(!globals.keyword_enabled("FOGMAP"));
    }

    #[test]
    fn test_texture_binding_is_inspectable() {
        let mut globals = ShaderGlobals::new();
        let id = globals.resolve_property("fog_map");
        assert!(globals.global_texture(id).is_none());
        globals.set_global_texture(id, TextureKey::new("skybox_dusk"));
        assert_eq!(
            globals.global_texture(id),
            Some(&TextureKey::new("skybox_dusk"))
        );
    }
}
