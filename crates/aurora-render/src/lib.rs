//! Environment-effects rendering: per-frame shader global state driven by a
//! resolved effect stack, plus the GPU plumbing the pass runs on.

pub mod effects;
pub mod environment;
pub mod fog;
pub mod globals;
pub mod gpu;
pub mod pass;
pub mod shader;
pub mod target_pool;

pub use effects::{EffectKind, EffectSettings, EffectStack, EffectStackError, EnvironmentProfile};
pub use environment::EnvironmentPass;
pub use fog::{
    FOG_SHADER_SOURCE, FogColorMode, FogMode, FogPropertyIds, FogSettings, FogShading,
    FogUniforms, KW_FOG_EXP, KW_FOG_EXP2, KW_FOG_LINEAR, KW_FOGMAP, compute_fog_shading,
};
pub use globals::{PropertyId, PropertyRegistry, ShaderGlobals, TextureKey};
pub use gpu::{RenderContext, RenderContextError, init_render_context_blocking};
pub use pass::{FrameContext, ScopedEncoder};
pub use shader::{ShaderError, ShaderLibrary, preprocess_source};
pub use target_pool::{TargetDescriptor, TargetHandle, TargetPool};
