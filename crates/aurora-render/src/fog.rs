//! Fog settings and their resolution into shader state.
//!
//! [`compute_fog_shading`] is the pure half of the environment pass: it maps
//! a settings snapshot to a packed parameter vector plus an explicit
//! decision for every fog keyword, leaving the write-back to the pass.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::globals::{PropertyId, ShaderGlobals, TextureKey};

/// Shader keyword selecting linear distance fog.
pub const KW_FOG_LINEAR: &str = "FOG_LINEAR";
/// Shader keyword selecting exponential-squared distance fog.
pub const KW_FOG_EXP2: &str = "FOG_EXP2";
/// Shader keyword selecting exponential height fog.
pub const KW_FOG_EXP: &str = "FOG_EXP";
/// Shader keyword enabling cubemap-sourced fog color.
pub const KW_FOGMAP: &str = "FOGMAP";

/// Global property name for the fog color uniform.
pub const PROP_FOG_COLOR: &str = "fog_color";
/// Global property name for the packed fog parameter vector.
pub const PROP_FOG_PARAMS: &str = "fog_params";
/// Global property name for the fog cubemap texture slot.
pub const PROP_FOG_MAP: &str = "fog_map";

/// Fog falloff model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FogMode {
    /// Linear blend between a near and far distance.
    #[default]
    Linear,
    /// Exponential-squared falloff with distance.
    Exp2,
    /// Exponential falloff driven by world height.
    Height,
}

/// Where the fog color comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FogColorMode {
    /// Flat color from [`FogSettings::color`].
    #[default]
    Color,
    /// Gradient evaluated elsewhere in the pipeline; flat color fallback here.
    Gradient,
    /// Color sampled from a bound cubemap along the view direction.
    CubeMap,
}

/// Resolved fog settings snapshot, owned by the effect stack.
///
/// The environment pass reads a fresh snapshot every frame and never mutates
/// it; edits made by the host take effect the following frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    pub mode: FogMode,
    pub color_mode: FogColorMode,
    /// Fog density; scales the distance falloff in `Linear` and `Exp2` modes.
    pub density: f32,
    /// Distance at which fog starts.
    pub near: f32,
    /// Distance at which fog saturates.
    pub far: f32,
    /// Reference height for `Height` mode.
    pub height: f32,
    /// How quickly fog thins above the reference height.
    pub height_falloff: f32,
    /// Distance before height fog starts accumulating.
    pub distance_offset: f32,
    /// Distance falloff multiplier for height fog.
    pub distance_falloff: f32,
    /// Flat fog color, linear RGBA.
    pub color: [f32; 4],
    /// Cubemap sampled in `CubeMap` color mode.
    pub cubemap: Option<TextureKey>,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            mode: FogMode::Linear,
            color_mode: FogColorMode::Color,
            density: 1.0,
            near: 0.0,
            far: 300.0,
            height: 0.0,
            height_falloff: 0.2,
            distance_offset: 0.0,
            distance_falloff: 1.0,
            color: [0.5, 0.6, 0.7, 1.0],
            cubemap: None,
        }
    }
}

/// Result of resolving fog settings into shader state decisions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogShading {
    /// Packed mode-dependent parameters; see [`compute_fog_shading`].
    pub params: Vec4,
    /// Explicit enable/disable decision for every fog keyword.
    pub keywords: [(&'static str, bool); 4],
}

/// Map a fog settings snapshot to its parameter vector and keyword set.
///
/// Parameter packing by mode:
///
/// | mode   | x       | y              | z               | w                |
/// |--------|---------|----------------|-----------------|------------------|
/// | Linear | density | 0              | near            | far              |
/// | Exp2   | density | 0              | near            | far              |
/// | Height | height  | height_falloff | distance_offset | distance_falloff |
///
/// Exactly one of the three mode keywords is enabled and the other two are
/// explicitly disabled in the same result; `FOGMAP` is enabled iff the color
/// mode is `CubeMap`. Every keyword carries an explicit decision; none is
/// inherited from prior global state.
pub fn compute_fog_shading(settings: &FogSettings) -> FogShading {
    let params = match settings.mode {
        FogMode::Linear | FogMode::Exp2 => {
            Vec4::new(settings.density, 0.0, settings.near, settings.far)
        }
        FogMode::Height => Vec4::new(
            settings.height,
            settings.height_falloff,
            settings.distance_offset,
            settings.distance_falloff,
        ),
    };

    FogShading {
        params,
        keywords: [
            (KW_FOG_LINEAR, settings.mode == FogMode::Linear),
            (KW_FOG_EXP2, settings.mode == FogMode::Exp2),
            (KW_FOG_EXP, settings.mode == FogMode::Height),
            (KW_FOGMAP, settings.color_mode == FogColorMode::CubeMap),
        ],
    }
}

/// Cached global property handles for fog state.
///
/// Resolved once, at pass construction, and reused for the lifetime of the
/// globals object; never re-resolved per frame.
#[derive(Clone, Copy, Debug)]
pub struct FogPropertyIds {
    pub color: PropertyId,
    pub params: PropertyId,
    pub map: PropertyId,
}

impl FogPropertyIds {
    pub fn resolve(globals: &mut ShaderGlobals) -> Self {
        Self {
            color: globals.resolve_property(PROP_FOG_COLOR),
            params: globals.resolve_property(PROP_FOG_PARAMS),
            map: globals.resolve_property(PROP_FOG_MAP),
        }
    }
}

/// GPU uniform block for fog shading, packed from applied global state.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FogUniforms {
    pub color: [f32; 4],
    pub params: [f32; 4],
}

impl FogUniforms {
    /// Pack the currently applied fog globals for upload.
    ///
    /// Returns `None` until an environment pass has written fog state.
    pub fn from_globals(globals: &ShaderGlobals, ids: &FogPropertyIds) -> Option<Self> {
        let color = globals.global_color(ids.color)?;
        let params = globals.global_vector(ids.params)?;
        Some(Self {
            color: color.to_array(),
            params: params.to_array(),
        })
    }
}

/// WGSL fog library, compiled per keyword set via
/// [`ShaderLibrary::load_variant`](crate::shader::ShaderLibrary::load_variant).
///
/// Exactly one of the three mode keywords must be enabled so that exactly one
/// `fog_factor` definition survives preprocessing.
pub const FOG_SHADER_SOURCE: &str = r#"
struct FogUniforms {
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> fog: FogUniforms;
#ifdef FOGMAP
@group(0) @binding(1) var fog_map: texture_cube<f32>;
@group(0) @binding(2) var fog_sampler: sampler;
#endif

#ifdef FOG_LINEAR
fn fog_factor(view_distance: f32, world_height: f32) -> f32 {
    // params: x = density, z = near, w = far
    let range = max(fog.params.w - fog.params.z, 1e-4);
    let t = clamp((view_distance - fog.params.z) / range, 0.0, 1.0);
    return clamp(t * fog.params.x, 0.0, 1.0);
}
#endif
#ifdef FOG_EXP2
fn fog_factor(view_distance: f32, world_height: f32) -> f32 {
    // params: x = density, z = near
    let d = fog.params.x * max(view_distance - fog.params.z, 0.0);
    return 1.0 - exp2(-d * d);
}
#endif
#ifdef FOG_EXP
fn fog_factor(view_distance: f32, world_height: f32) -> f32 {
    // params: x = height, y = height_falloff, z = distance_offset, w = distance_falloff
    let thinning = exp2(-fog.params.y * max(world_height - fog.params.x, 0.0));
    let d = max(view_distance - fog.params.z, 0.0) * fog.params.w;
    return 1.0 - exp2(-d * thinning);
}
#endif

fn apply_fog(color: vec3<f32>, view_dir: vec3<f32>, view_distance: f32, world_height: f32) -> vec3<f32> {
    let amount = fog_factor(view_distance, world_height);
#ifdef FOGMAP
    let fog_color = textureSampleLevel(fog_map, fog_sampler, view_dir, 0.0).rgb;
#else
    let fog_color = fog.color.rgb;
#endif
    return mix(color, fog_color, amount);
}
"#;
