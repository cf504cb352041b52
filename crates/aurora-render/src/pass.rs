//! Scoped command recording for render passes.
//!
//! Provides [`ScopedEncoder`], a recording scope whose submission is
//! guaranteed on every exit path, and [`FrameContext`], the per-frame
//! metadata the host scheduler hands to each pass.

use std::sync::Arc;

/// Per-frame metadata passed to every render pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    /// Monotonic frame counter, starting at 0.
    pub index: u64,
    /// Seconds elapsed since pipeline start.
    pub elapsed_seconds: f32,
}

impl FrameContext {
    /// Advance to the next frame after `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.index += 1;
        self.elapsed_seconds += dt;
    }
}

/// A command recording scope that always reaches the queue.
///
/// Opened at the top of a pass's execution and closed with
/// [`finish`](Self::finish). If the scope is dropped without an explicit
/// `finish` (early return, propagated panic), the recording is submitted
/// from `Drop` instead, so pooled encoder resources are never leaked
/// mid-frame.
pub struct ScopedEncoder {
    encoder: Option<wgpu::CommandEncoder>,
    queue: Arc<wgpu::Queue>,
    label: &'static str,
    submitted: bool,
}

impl ScopedEncoder {
    /// Open a new recording scope with the given debug label.
    pub fn new(device: &wgpu::Device, queue: Arc<wgpu::Queue>, label: &'static str) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(label),
        });
        Self {
            encoder: Some(encoder),
            queue,
            label,
            submitted: false,
        }
    }

    /// The live encoder for recording commands.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder.as_mut().expect("ScopedEncoder already submitted")
    }

    /// Begin a named debug group, visible in GPU captures.
    pub fn push_debug_scope(&mut self, label: &str) {
        self.encoder().push_debug_group(label);
    }

    /// End the innermost debug group.
    pub fn pop_debug_scope(&mut self) {
        self.encoder().pop_debug_group();
    }

    /// Submit the recording to the queue. Consumes the scope.
    pub fn finish(mut self) {
        self.submit_once();
    }

    fn submit_once(&mut self) {
        if self.submitted {
            return;
        }
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit([encoder.finish()]);
            self.submitted = true;
        }
    }
}

impl Drop for ScopedEncoder {
    fn drop(&mut self) {
        if !self.submitted {
            log::warn!(
                "ScopedEncoder '{}' dropped without explicit finish() - submitting",
                self.label
            );
            self.submit_once();
        }
    }
}
