//! Pooled temporary render targets with descriptor-keyed reuse.
//!
//! Passes request targets by shape; descriptor-equal requests converge on the
//! same live handle instead of allocating twice. GPU textures are created
//! lazily on first view so allocation bookkeeping works without a device.

use std::collections::HashMap;

use log::{debug, trace};

/// Shape of a pooled render target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// Multisample count; pooled intermediates usually force 1.
    pub sample_count: u32,
    /// Requested depth precision; 0 allocates no depth.
    pub depth_bits: u32,
}

impl TargetDescriptor {
    /// Single-sampled color-only target.
    pub fn color(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            sample_count: 1,
            depth_bits: 0,
        }
    }
}

/// Opaque handle to a live pooled target, consumed by later passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle(u32);

struct PooledTarget {
    descriptor: TargetDescriptor,
    texture: Option<wgpu::Texture>,
}

/// Pool of temporary render targets keyed by descriptor.
#[derive(Default)]
pub struct TargetPool {
    by_descriptor: HashMap<TargetDescriptor, TargetHandle>,
    targets: HashMap<TargetHandle, PooledTarget>,
    next_id: u32,
}

impl TargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a temporary target; descriptor-equal requests share one handle.
    pub fn allocate_temporary(&mut self, descriptor: &TargetDescriptor) -> TargetHandle {
        if let Some(&handle) = self.by_descriptor.get(descriptor) {
            trace!("reusing pooled target {handle:?}");
            return handle;
        }
        let handle = TargetHandle(self.next_id);
        self.next_id += 1;
        self.by_descriptor.insert(descriptor.clone(), handle);
        self.targets.insert(
            handle,
            PooledTarget {
                descriptor: descriptor.clone(),
                texture: None,
            },
        );
        debug!(
            "allocated pooled target {:?} ({}x{} {:?}, {} samples)",
            handle, descriptor.width, descriptor.height, descriptor.format, descriptor.sample_count
        );
        handle
    }

    /// Return a target to the pool; called by the host at frame end.
    pub fn release_temporary(&mut self, handle: TargetHandle) {
        if let Some(target) = self.targets.remove(&handle) {
            self.by_descriptor.remove(&target.descriptor);
            trace!("released pooled target {handle:?}");
        }
    }

    /// Descriptor a live handle was allocated with.
    pub fn descriptor(&self, handle: TargetHandle) -> Option<&TargetDescriptor> {
        self.targets.get(&handle).map(|t| &t.descriptor)
    }

    /// Number of live targets.
    pub fn live_count(&self) -> usize {
        self.targets.len()
    }

    /// The target's texture view, creating the GPU texture on first use.
    pub fn view(&mut self, device: &wgpu::Device, handle: TargetHandle) -> Option<wgpu::TextureView> {
        let target = self.targets.get_mut(&handle)?;
        let texture = target
            .texture
            .get_or_insert_with(|| create_target_texture(device, &target.descriptor));
        Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }
}

fn create_target_texture(device: &wgpu::Device, descriptor: &TargetDescriptor) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("pooled-target"),
        size: wgpu::Extent3d {
            width: descriptor.width.max(1),
            height: descriptor.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: descriptor.sample_count.max(1),
        dimension: wgpu::TextureDimension::D2,
        format: descriptor.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}
