//! Resolved effect settings consumed by the environment pass.
//!
//! The host's layered effect system resolves its layers into one settings
//! snapshot per effect kind each frame. Passes read snapshots through typed
//! accessors returning `Option` (an absent effect is a valid state, not an
//! error) and never mutate them.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::fog::FogSettings;

/// Built-in effect kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Distance and height fog.
    Fog,
}

/// Resolved settings for one effect kind.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectSettings {
    Fog(FogSettings),
}

impl EffectSettings {
    /// The kind this settings variant belongs to.
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectSettings::Fog(_) => EffectKind::Fog,
        }
    }
}

/// Errors returned when loading an effect profile from disk.
#[derive(Debug, thiserror::Error)]
pub enum EffectStackError {
    /// I/O error reading the profile file.
    #[error("failed to read effect profile: {0}")]
    Io(#[from] std::io::Error),

    /// RON deserialization error.
    #[error("failed to parse effect profile: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// RON document describing the initial contents of an [`EffectStack`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentProfile {
    /// Fog settings, or `None` to leave fog unset.
    pub fog: Option<FogSettings>,
}

/// Registry of resolved effect settings, keyed by kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectStack {
    settings: HashMap<EffectKind, EffectSettings>,
}

impl EffectStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the settings for a kind (last write wins).
    pub fn set(&mut self, settings: EffectSettings) {
        self.settings.insert(settings.kind(), settings);
    }

    /// Remove the settings for a kind, returning whatever was installed.
    pub fn remove(&mut self, kind: EffectKind) -> Option<EffectSettings> {
        self.settings.remove(&kind)
    }

    /// Current fog settings, if any layer resolved fog this frame.
    pub fn fog(&self) -> Option<&FogSettings> {
        let settings = self.settings.get(&EffectKind::Fog)?;
        match settings {
            EffectSettings::Fog(fog) => Some(fog),
        }
    }

    /// Parse a RON profile document into a stack.
    pub fn from_profile_str(source: &str) -> Result<Self, EffectStackError> {
        let profile: EnvironmentProfile = ron::from_str(source)?;
        let mut stack = Self::new();
        if let Some(fog) = profile.fog {
            stack.set(EffectSettings::Fog(fog));
        }
        Ok(stack)
    }

    /// Load a RON profile file into a stack.
    pub fn from_profile_file(path: &Path) -> Result<Self, EffectStackError> {
        let contents = std::fs::read_to_string(path)?;
        let stack = Self::from_profile_str(&contents)?;
        log::info!("Loaded effect profile from {}", path.display());
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fog::{FogColorMode, FogMode};

    #[test]
    fn test_typed_accessor_returns_fog() {
        let mut stack = EffectStack::new();
        assert!(stack.fog().is_none());

        stack.set(EffectSettings::Fog(FogSettings::default()));
        assert_eq!(stack.fog(), Some(&FogSettings::default()));
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut stack = EffectStack::new();
        stack.set(EffectSettings::Fog(FogSettings::default()));
        let thick = FogSettings {
            density: 4.0,
            ..Default::default()
        };
        stack.set(EffectSettings::Fog(thick.clone()));
        assert_eq!(stack.fog(), Some(&thick));
    }

    #[test]
    fn test_remove_leaves_fog_unresolved() {
        let mut stack = EffectStack::new();
        stack.set(EffectSettings::Fog(FogSettings::default()));
        assert!(stack.remove(EffectKind::Fog).is_some());
        assert!(stack.fog().is_none());
    }

    #[test]
    fn test_profile_ron_parses() {
        let stack = EffectStack::from_profile_str(
            r#"(
                fog: Some((
                    mode: Height,
                    color_mode: CubeMap,
                    height: 10.0,
                    height_falloff: 0.5,
                    distance_offset: 2.0,
                    distance_falloff: 1.0,
                    cubemap: Some(("skybox_dawn")),
                )),
            )"#,
        )
        .expect("profile parses");

        let fog = stack.fog().expect("fog present");
        assert_eq!(fog.mode, FogMode::Height);
        assert_eq!(fog.color_mode, FogColorMode::CubeMap);
        assert_eq!(fog.height, 10.0);
        assert_eq!(fog.cubemap.as_ref().map(|k| k.0.as_str()), Some("skybox_dawn"));
        // Unlisted fields fall back to defaults.
        assert_eq!(fog.far, FogSettings::default().far);
    }

    #[test]
    fn test_empty_profile_gives_empty_stack() {
        let stack = EffectStack::from_profile_str("()").expect("empty profile parses");
        assert!(stack.fog().is_none());
    }

    #[test]
    fn test_malformed_profile_is_an_error() {
        assert!(matches!(
            EffectStack::from_profile_str("(fog: Some((mode: Sideways)))"),
            Err(EffectStackError::Ron(_))
        ));
    }
}
