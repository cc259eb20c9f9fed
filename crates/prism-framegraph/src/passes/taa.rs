//! Temporal Anti-Aliasing Pass
//!
//! Resolves the current color against a history target and writes the result
//! back into the history. The history is a pooled render target keyed by
//! [`TAA_HISTORY`], so its contents carry over to the next frame.

use glam::Vec2;

use crate::config::TaaSettings;
use crate::device::{Framebuffer, RenderingEngine};
use crate::engine::FrameGraphEngine;
use crate::handle::{FrameGraphHandle, PassRef};
use crate::resource::ResourceDescriptor;
use crate::FrameGraphResult;

/// Pool key of the history target
pub const TAA_HISTORY: &str = "taa-history";

/// Length of the jitter sequence before it repeats
const JITTER_SEQUENCE_LEN: u64 = 16;

/// Handles and per-frame parameters of the TAA pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaaPassData {
    /// Current frame color
    pub input: FrameGraphHandle,
    /// History as left by the previous frame
    pub history: FrameGraphHandle,
    /// Resolved color, the next version of the history
    pub output: FrameGraphHandle,
    /// Sub-pixel offset applied to this frame's projection
    pub jitter: Vec2,
    pub blend_factor: f32,
    pub descriptor: ResourceDescriptor,
}

/// Inputs handed to the resolve callback
pub struct TaaResolve<'a, F> {
    pub current: &'a F,
    pub history: &'a F,
    pub jitter: Vec2,
    pub blend_factor: f32,
}

/// Radical inverse of `index` in `base`
fn halton(mut index: u64, base: u64) -> f32 {
    let mut fraction = 1.0_f32;
    let mut result = 0.0_f32;
    while index > 0 {
        fraction /= base as f32;
        result += fraction * (index % base) as f32;
        index /= base;
    }
    result
}

/// Halton(2, 3) jitter for a frame, centered on the pixel and scaled
pub fn jitter_offset(frame_index: u64, scale: f32) -> Vec2 {
    let index = frame_index % JITTER_SEQUENCE_LEN + 1;
    Vec2::new(halton(index, 2) - 0.5, halton(index, 3) - 0.5) * scale
}

/// Add the TAA resolve pass reading `input`
pub fn add_taa_pass<D, F>(
    engine: &mut FrameGraphEngine<D>,
    input: FrameGraphHandle,
    descriptor: ResourceDescriptor,
    settings: &TaaSettings,
    frame_index: u64,
    mut resolve: F,
) -> FrameGraphResult<PassRef<TaaPassData>>
where
    D: RenderingEngine,
    F: FnMut(&mut D, TaaResolve<'_, D::Framebuffer>) -> FrameGraphResult<()> + 'static,
{
    let jitter = jitter_offset(frame_index, settings.jitter_scale);
    let blend_factor = settings.blend_factor;

    engine.add_pass(
        "TAA",
        |engine, node, pass| {
            let input = node.sample(input);
            let history = engine.create_render_target(node, TAA_HISTORY, descriptor);
            let history = node.read(history);
            let output = node.write(engine, history)?;
            pass.data = Some(TaaPassData {
                input,
                history,
                output,
                jitter,
                blend_factor,
                descriptor,
            });
            Ok(())
        },
        move |engine, data| {
            let current = engine.get_resource(data.input)?;
            let history = engine.get_resource(data.history)?;
            let (Some(current), Some(history)) = (current, history) else {
                log::trace!("TAA inputs not materialized, skipping resolve");
                return Ok(());
            };
            history.resize(data.descriptor.width, data.descriptor.height);
            resolve(
                engine.device_mut(),
                TaaResolve {
                    current: current.as_ref(),
                    history: history.as_ref(),
                    jitter: data.jitter,
                    blend_factor: data.blend_factor,
                },
            )
        },
    )
}
