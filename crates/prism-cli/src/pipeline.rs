//! Forward Pipeline
//!
//! Scene → optional TAA → optional copy → present, recorded on the headless device.

use prism_framegraph::device::Framebuffer;
use prism_framegraph::passes::{add_copy_pass, add_render_pass, add_taa_pass};
use prism_framegraph::{FrameGraphConfig, FrameGraphEngine, FrameGraphHandle, FrameGraphResult, HeadlessDevice};

pub type Engine = FrameGraphEngine<HeadlessDevice>;

/// Declare one frame of the forward pipeline and return the presented handle
pub fn build_forward_frame(
    engine: &mut Engine,
    config: &FrameGraphConfig,
    frame_index: u64,
) -> FrameGraphResult<FrameGraphHandle> {
    let descriptor = config.color_descriptor();

    let scene = add_render_pass(engine, "Forward", "scene-color", descriptor, |device, target| {
        device.record(format!("draw scene -> {} ({}x{})", target.label(), target.width(), target.height()));
        Ok(())
    })?;
    let mut color = engine.pass_data(scene)?.color;

    if config.taa.enabled {
        let taa = add_taa_pass(engine, color, descriptor, &config.taa, frame_index, |device, resolve| {
            device.record(format!(
                "taa {} + {} jitter=({:.3}, {:.3}) blend={}",
                resolve.current.label(),
                resolve.history.label(),
                resolve.jitter.x,
                resolve.jitter.y,
                resolve.blend_factor
            ));
            Ok(())
        })?;
        color = engine.pass_data(taa)?.output;
    }

    if config.copy_output {
        let copy = add_copy_pass(engine, "Copy", color, "output-copy", descriptor, |device, source, destination| {
            device.record(format!("copy {} -> {}", source.label(), destination.label()));
            Ok(())
        })?;
        color = engine.pass_data(copy)?.output;
    }

    engine.present(color)?;
    Ok(color)
}

/// Debug overlay drawing into its own target; only survives if someone reads it
pub fn add_debug_overlay(engine: &mut Engine, config: &FrameGraphConfig) -> FrameGraphResult<FrameGraphHandle> {
    let overlay = add_render_pass(engine, "Debug Overlay", "debug-overlay", config.color_descriptor(), |device, _| {
        device.record("draw debug overlay");
        Ok(())
    })?;
    Ok(engine.pass_data(overlay)?.color)
}
