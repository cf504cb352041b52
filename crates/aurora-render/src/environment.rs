//! Environment effects render pass.
//!
//! Runs once per frame, before any pass that samples fog-dependent shading,
//! and translates the resolved fog settings into shader global state: the
//! mode keywords, the cubemap binding, and the color/parameter uniforms.

use glam::Vec4;
use log::trace;

use crate::effects::EffectStack;
use crate::fog::{self, FogColorMode, FogPropertyIds, FogSettings};
use crate::globals::ShaderGlobals;
use crate::gpu::RenderContext;
use crate::pass::{FrameContext, ScopedEncoder};
use crate::target_pool::{TargetDescriptor, TargetHandle, TargetPool};

const SETUP_LABEL: &str = "environment-setup";

/// Render pass that applies environment effect state for the frame.
pub struct EnvironmentPass {
    fog_ids: FogPropertyIds,
    destination: Option<TargetHandle>,
}

impl EnvironmentPass {
    /// Create the pass, resolving its global property handles once.
    pub fn new(globals: &mut ShaderGlobals) -> Self {
        Self {
            fog_ids: FogPropertyIds::resolve(globals),
            destination: None,
        }
    }

    /// Property handles this pass writes, for downstream uniform packing.
    pub fn fog_ids(&self) -> &FogPropertyIds {
        &self.fog_ids
    }

    /// Temporary destination requested by [`configure`](Self::configure).
    pub fn destination(&self) -> Option<TargetHandle> {
        self.destination
    }

    /// Request the pass's temporary destination target for the camera shape.
    ///
    /// The destination matches the camera target with multisampling and depth
    /// stripped. Descriptor-equal calls converge on the same pooled handle.
    pub fn configure(&mut self, pool: &mut TargetPool, camera: &TargetDescriptor) {
        let mut descriptor = camera.clone();
        descriptor.sample_count = 1;
        descriptor.depth_bits = 0;
        let handle = pool.allocate_temporary(&descriptor);
        trace!(
            "environment destination {:?} ({}x{})",
            handle, descriptor.width, descriptor.height
        );
        self.destination = Some(handle);
    }

    /// Compute and apply fog state for this frame.
    ///
    /// When the stack resolves no fog settings this is a no-op: previously
    /// applied keywords and uniforms stay active, including across a frame
    /// where fog was removed from the stack. The settings snapshot itself is
    /// never mutated.
    pub fn execute(
        &mut self,
        gpu: &RenderContext,
        frame: &FrameContext,
        globals: &mut ShaderGlobals,
        effects: &EffectStack,
    ) {
        let Some(settings) = effects.fog() else {
            trace!(
                "frame {}: no fog settings resolved, globals left as-is",
                frame.index
            );
            return;
        };

        let mut scope = ScopedEncoder::new(&gpu.device, gpu.queue.clone(), SETUP_LABEL);
        scope.push_debug_scope("fog setup");
        self.update_fog(globals, settings);
        scope.pop_debug_scope();
        scope.finish();
    }

    /// Write-back step: keyword decisions first, then the cubemap binding,
    /// then the color and parameter uniforms.
    pub(crate) fn update_fog(&self, globals: &mut ShaderGlobals, settings: &FogSettings) {
        let shading = fog::compute_fog_shading(settings);

        for (keyword, enabled) in shading.keywords {
            globals.set_keyword(keyword, enabled);
        }

        // Leaving CubeMap mode does not clear a previously bound cubemap.
        if settings.color_mode == FogColorMode::CubeMap
            && let Some(cubemap) = &settings.cubemap
        {
            globals.set_global_texture(self.fog_ids.map, cubemap.clone());
        }

        globals.set_global_color(self.fog_ids.color, Vec4::from_array(settings.color));
        globals.set_global_vector(self.fog_ids.params, shading.params);
        trace!(
            "applied {:?} fog, params {:?}",
            settings.mode, shading.params
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectKind, EffectSettings};
    use crate::fog::{
        FogMode, KW_FOG_EXP, KW_FOG_EXP2, KW_FOG_LINEAR, KW_FOGMAP,
    };
    use crate::globals::TextureKey;

    fn pass_and_globals() -> (EnvironmentPass, ShaderGlobals) {
        let mut globals = ShaderGlobals::new();
        let pass = EnvironmentPass::new(&mut globals);
        (pass, globals)
    }

    fn fog_state(globals: &ShaderGlobals, pass: &EnvironmentPass) -> (Vec<String>, Option<Vec4>, Option<Vec4>, Option<TextureKey>) {
        (
            globals.enabled_keywords().iter().cloned().collect(),
            globals.global_color(pass.fog_ids().color),
            globals.global_vector(pass.fog_ids().params),
            globals.global_texture(pass.fog_ids().map).cloned(),
        )
    }

    #[test]
    fn test_update_fog_applies_linear_state() {
        let (pass, mut globals) = pass_and_globals();
        let settings = FogSettings {
            mode: FogMode::Linear,
            density: 0.02,
            near: 0.0,
            far: 50.0,
            color: [0.5, 0.6, 0.7, 1.0],
            ..Default::default()
        };

        pass.update_fog(&mut globals, &settings);

        assert!(globals.keyword_enabled(KW_FOG_LINEAR));
        assert!(!globals.keyword_enabled(KW_FOG_EXP2));
        assert!(!globals.keyword_enabled(KW_FOG_EXP));
        assert!(!globals.keyword_enabled(KW_FOGMAP));
        assert_eq!(
            globals.global_vector(pass.fog_ids().params),
            Some(Vec4::new(0.02, 0.0, 0.0, 50.0))
        );
        assert_eq!(
            globals.global_color(pass.fog_ids().color),
            Some(Vec4::new(0.5, 0.6, 0.7, 1.0))
        );
    }

    #[test]
    fn test_mode_switch_disables_previous_keyword() {
        let (pass, mut globals) = pass_and_globals();
        let mut settings = FogSettings {
            mode: FogMode::Exp2,
            ..Default::default()
        };
        pass.update_fog(&mut globals, &settings);
        assert!(globals.keyword_enabled(KW_FOG_EXP2));

        settings.mode = FogMode::Height;
        pass.update_fog(&mut globals, &settings);
        assert!(globals.keyword_enabled(KW_FOG_EXP));
        // The switch disables the old keyword explicitly, not by accident.
        assert!(!globals.keyword_enabled(KW_FOG_EXP2));
        assert!(!globals.keyword_enabled(KW_FOG_LINEAR));
    }

    #[test]
    fn test_update_fog_is_idempotent() {
        let (pass, mut globals) = pass_and_globals();
        let settings = FogSettings {
            mode: FogMode::Height,
            height: 10.0,
            height_falloff: 0.5,
            distance_offset: 2.0,
            distance_falloff: 1.0,
            ..Default::default()
        };

        pass.update_fog(&mut globals, &settings);
        let once = fog_state(&globals, &pass);
        pass.update_fog(&mut globals, &settings);
        let twice = fog_state(&globals, &pass);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cubemap_transition_binds_then_leaves_texture() {
        let (pass, mut globals) = pass_and_globals();
        let mut settings = FogSettings {
            color_mode: FogColorMode::Color,
            ..Default::default()
        };
        pass.update_fog(&mut globals, &settings);
        assert!(!globals.keyword_enabled(KW_FOGMAP));
        assert!(globals.global_texture(pass.fog_ids().map).is_none());

        settings.color_mode = FogColorMode::CubeMap;
        settings.cubemap = Some(TextureKey::new("skybox_night"));
        pass.update_fog(&mut globals, &settings);
        assert!(globals.keyword_enabled(KW_FOGMAP));
        assert_eq!(
            globals.global_texture(pass.fog_ids().map),
            Some(&TextureKey::new("skybox_night"))
        );

        // Moving back disables FOGMAP but keeps the binding in place.
        settings.color_mode = FogColorMode::Gradient;
        pass.update_fog(&mut globals, &settings);
        assert!(!globals.keyword_enabled(KW_FOGMAP));
        assert_eq!(
            globals.global_texture(pass.fog_ids().map),
            Some(&TextureKey::new("skybox_night"))
        );
    }

    #[test]
    fn test_fog_removed_from_stack_resolves_none() {
        // `execute` returns before touching globals when the stack resolves
        // no fog; the resolution itself is what this covers.
        let mut stack = EffectStack::new();
        stack.set(EffectSettings::Fog(FogSettings::default()));
        stack.remove(EffectKind::Fog);
        assert!(stack.fog().is_none());
    }

    #[test]
    fn test_configure_strips_msaa_and_depth() {
        let (mut pass, _globals) = pass_and_globals();
        let mut pool = TargetPool::new();
        let camera = TargetDescriptor {
            width: 1920,
            height: 1080,
            format: wgpu::TextureFormat::Rgba16Float,
            sample_count: 4,
            depth_bits: 24,
        };

        pass.configure(&mut pool, &camera);

        let handle = pass.destination().expect("destination allocated");
        let descriptor = pool.descriptor(handle).expect("handle is live");
        assert_eq!(descriptor.sample_count, 1);
        assert_eq!(descriptor.depth_bits, 0);
        assert_eq!((descriptor.width, descriptor.height), (1920, 1080));
        assert_eq!(descriptor.format, camera.format);
    }

    #[test]
    fn test_configure_twice_converges_to_same_handle() {
        let (mut pass, _globals) = pass_and_globals();
        let mut pool = TargetPool::new();
        let camera = TargetDescriptor {
            width: 1280,
            height: 720,
            format: wgpu::TextureFormat::Rgba16Float,
            sample_count: 4,
            depth_bits: 24,
        };

        pass.configure(&mut pool, &camera);
        let first = pass.destination();
        pass.configure(&mut pool, &camera);
        let second = pass.destination();

        assert_eq!(first, second);
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    fn test_property_handles_resolve_once() {
        let mut globals = ShaderGlobals::new();
        let pass = EnvironmentPass::new(&mut globals);
        let again = FogPropertyIds::resolve(&mut globals);
        assert_eq!(pass.fog_ids().color, again.color);
        assert_eq!(pass.fog_ids().params, again.params);
        assert_eq!(pass.fog_ids().map, again.map);
        assert_eq!(globals.registry().len(), 3);
    }
}
