//! Headless demo: drives the environment pass for a few frames and logs the
//! applied fog state.
//!
//! Run with `cargo run -p aurora-demo`, or
//! `cargo run -p aurora-demo -- --frames 10 --log-level debug` to watch the
//! per-frame state transitions.

use clap::Parser;
use tracing::{error, info};

use aurora_config::{CliArgs, Config, default_config_dir};
use aurora_log::init_logging;
use aurora_render::{
    EffectSettings, EffectStack, EnvironmentPass, FOG_SHADER_SOURCE, FogColorMode, FogSettings,
    FogUniforms, FrameContext, RenderContext, ShaderGlobals, ShaderLibrary, TargetDescriptor,
    TargetPool, TextureKey, init_render_context_blocking,
};

fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config, using defaults: {err}");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);
    init_logging(None, cfg!(debug_assertions), Some(&config));

    let frames = args.frames.unwrap_or(4);
    if let Err(err) = run(&config, frames) {
        error!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn run(config: &Config, frames: u32) -> Result<(), Box<dyn std::error::Error>> {
    let gpu = init_render_context_blocking()?;

    let mut globals = ShaderGlobals::new();
    let mut effects = match config.environment.profile.as_deref() {
        Some(path) => EffectStack::from_profile_file(path)?,
        None => default_stack(),
    };
    let mut pool = TargetPool::new();
    let mut shaders = ShaderLibrary::new();
    let mut pass = EnvironmentPass::new(&mut globals);

    // The camera target the host pipeline would render into; the environment
    // pass derives its own single-sampled destination from it.
    let camera = TargetDescriptor {
        width: config.render.width,
        height: config.render.height,
        format: wgpu::TextureFormat::Rgba16Float,
        sample_count: config.render.msaa_samples,
        depth_bits: 24,
    };
    pass.configure(&mut pool, &camera);

    let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fog-uniforms"),
        size: std::mem::size_of::<FogUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut frame = FrameContext::default();
    for _ in 0..frames {
        pass.execute(&gpu, &frame, &mut globals, &effects);

        // What a downstream scene pass would do with the applied state:
        // compile the matching fog shader variant and upload the uniforms.
        shaders.load_variant(&gpu.device, "fog", FOG_SHADER_SOURCE, &globals)?;
        if let Some(uniforms) = FogUniforms::from_globals(&globals, pass.fog_ids()) {
            gpu.queue
                .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
            info!(
                "frame {}: keywords {:?}, params {:?}",
                frame.index,
                globals.enabled_keywords(),
                uniforms.params
            );
        } else {
            info!("frame {}: no fog state applied yet", frame.index);
        }

        if frame.index == 1 {
            let mut fog = effects.fog().cloned().unwrap_or_default();
            fog.color_mode = FogColorMode::CubeMap;
            fog.cubemap = Some(TextureKey::new("skybox_night"));
            effects.set(EffectSettings::Fog(fog));
            info!("switched fog color mode to cubemap");
        }

        frame.advance(1.0 / 60.0);
    }

    finish_frame(&gpu, &mut pool, &pass);
    Ok(())
}

/// Frame-end housekeeping the host scheduler would normally own.
fn finish_frame(gpu: &RenderContext, pool: &mut TargetPool, pass: &EnvironmentPass) {
    if let Some(handle) = pass.destination() {
        // Touch the destination once so the lazy allocation is exercised.
        let _ = pool.view(&gpu.device, handle);
        pool.release_temporary(handle);
    }
}

fn default_stack() -> EffectStack {
    let mut stack = EffectStack::new();
    stack.set(EffectSettings::Fog(FogSettings::default()));
    stack
}
