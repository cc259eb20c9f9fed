//! Copy Pass
//!
//! Blits one color target into another graph-owned target.

use crate::device::RenderingEngine;
use crate::engine::FrameGraphEngine;
use crate::handle::{FrameGraphHandle, PassRef};
use crate::resource::{ResourceDescriptor, TextureUsage};
use crate::FrameGraphResult;

/// Handles of a copy pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPassData {
    pub input: FrameGraphHandle,
    pub output: FrameGraphHandle,
}

/// Add a pass copying `input` into the render target `target`
pub fn add_copy_pass<D, F>(
    engine: &mut FrameGraphEngine<D>,
    name: &str,
    input: FrameGraphHandle,
    target: &str,
    descriptor: ResourceDescriptor,
    mut blit: F,
) -> FrameGraphResult<PassRef<CopyPassData>>
where
    D: RenderingEngine,
    F: FnMut(&mut D, &D::Framebuffer, &D::Framebuffer) -> FrameGraphResult<()> + 'static,
{
    let descriptor = descriptor.with_usage(
        descriptor.resolved_usage() | TextureUsage::COPY_DST | TextureUsage::SAMPLED,
    );

    engine.add_pass(
        name,
        |engine, node, pass| {
            let input = node.sample(input);
            let output = engine.create_render_target(node, target, descriptor);
            let output = node.write(engine, output)?;
            pass.data = Some(CopyPassData { input, output });
            Ok(())
        },
        move |engine, data| {
            let source = engine.get_resource(data.input)?;
            let destination = engine.get_resource(data.output)?;
            match (source, destination) {
                (Some(source), Some(destination)) => blit(engine.device_mut(), &source, &destination),
                _ => {
                    log::trace!("Copy {} -> {} skipped, target not materialized", data.input, data.output);
                    Ok(())
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Framebuffer;
    use crate::headless::HeadlessDevice;
    use crate::passes::render::add_render_pass;

    #[test]
    fn test_copy_between_targets() {
        let mut engine = FrameGraphEngine::new(HeadlessDevice::new());
        let desc = ResourceDescriptor::new(32, 32);
        let scene = add_render_pass(&mut engine, "Scene", "color", desc, |device, fb| {
            device.record(format!("draw {}", fb.label()));
            Ok(())
        })
        .unwrap();
        let color = engine.pass_data(scene).unwrap().color;
        let copy = add_copy_pass(&mut engine, "Copy", color, "copy", desc, |device, src, dst| {
            device.record(format!("blit {} -> {}", src.label(), dst.label()));
            Ok(())
        })
        .unwrap();
        let output = engine.pass_data(copy).unwrap().output;
        engine.present(output).unwrap();

        engine.compile().unwrap();
        let usage = engine.entry_of(output).unwrap().descriptor.resolved_usage();
        assert!(usage.contains(TextureUsage::COPY_DST));

        engine.execute_pass_nodes().unwrap();
        assert_eq!(engine.device().commands(), ["draw color", "blit color -> copy"]);
    }

    #[test]
    fn test_copy_without_reader_is_culled_with_its_source() {
        let mut engine = FrameGraphEngine::new(HeadlessDevice::new());
        let desc = ResourceDescriptor::new(8, 8);
        let scene = add_render_pass(&mut engine, "Scene", "color", desc, |device, _| {
            device.record("draw");
            Ok(())
        })
        .unwrap();
        let color = engine.pass_data(scene).unwrap().color;
        add_copy_pass(&mut engine, "Copy", color, "copy", desc, |device, _, _| {
            device.record("blit");
            Ok(())
        })
        .unwrap();

        engine.execute_pass_nodes().unwrap();
        assert!(engine.device().commands().is_empty());
    }
}
