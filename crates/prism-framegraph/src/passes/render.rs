//! Scene Render Pass
//!
//! Draws into a fresh color target owned by the graph.

use crate::device::{Framebuffer, RenderingEngine};
use crate::engine::FrameGraphEngine;
use crate::handle::{FrameGraphHandle, PassRef};
use crate::resource::ResourceDescriptor;
use crate::FrameGraphResult;

/// Handles of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassData {
    /// Written color target
    pub color: FrameGraphHandle,
    pub descriptor: ResourceDescriptor,
}

/// Add a pass drawing into the render target `target`
///
/// The pooled target is resized in place when `descriptor` changes between frames.
pub fn add_render_pass<D, F>(
    engine: &mut FrameGraphEngine<D>,
    name: &str,
    target: &str,
    descriptor: ResourceDescriptor,
    mut draw: F,
) -> FrameGraphResult<PassRef<RenderPassData>>
where
    D: RenderingEngine,
    F: FnMut(&mut D, &D::Framebuffer) -> FrameGraphResult<()> + 'static,
{
    engine.add_pass(
        name,
        |engine, node, pass| {
            let color = engine.create_render_target(node, target, descriptor);
            let color = node.write(engine, color)?;
            pass.data = Some(RenderPassData { color, descriptor });
            Ok(())
        },
        move |engine, data| {
            let Some(framebuffer) = engine.get_resource(data.color)? else {
                log::trace!("Render target of {} is unused this frame", data.color);
                return Ok(());
            };
            framebuffer.resize(data.descriptor.width, data.descriptor.height);
            draw(engine.device_mut(), &framebuffer)
        },
    )
}
