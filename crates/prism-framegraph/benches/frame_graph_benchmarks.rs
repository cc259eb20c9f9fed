//! Frame Graph Benchmarks
//!
//! Compile and execute cost of long pass chains

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prism_framegraph::{FrameGraphEngine, FrameGraphHandle, HeadlessDevice, ResourceDescriptor};

/// Chain of `count` passes, each reading the previous output, optionally presenting the last one
fn build_chain(engine: &mut FrameGraphEngine<HeadlessDevice>, count: usize, present: bool) {
    let mut previous: Option<FrameGraphHandle> = None;
    for index in 0..count {
        let name = format!("pass-{index}");
        let target = format!("target-{index}");
        let pass = engine
            .add_pass(
                &name,
                |engine, node, pass| {
                    if let Some(previous) = previous {
                        node.read(previous);
                    }
                    let output = engine.create_render_target(node, &target, ResourceDescriptor::new(256, 256));
                    pass.data = Some(node.write(engine, output)?);
                    Ok(())
                },
                |_, _| Ok(()),
            )
            .unwrap();
        previous = Some(engine.pass_data(pass).unwrap());
    }

    if present {
        if let Some(last) = previous {
            engine.present(last).unwrap();
        }
    }
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for count in [8, 64, 512].iter() {
        group.bench_with_input(BenchmarkId::new("live_chain", count), count, |b, &count| {
            let mut engine = FrameGraphEngine::new(HeadlessDevice::new());
            build_chain(&mut engine, count, true);
            b.iter(|| {
                engine.compile().unwrap();
                black_box(engine.pass_count())
            });
        });

        group.bench_with_input(BenchmarkId::new("culled_chain", count), count, |b, &count| {
            let mut engine = FrameGraphEngine::new(HeadlessDevice::new());
            build_chain(&mut engine, count, false);
            b.iter(|| {
                engine.compile().unwrap();
                black_box(engine.pass_count())
            });
        });
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for count in [8, 64, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut engine = FrameGraphEngine::new(HeadlessDevice::new());
            b.iter(|| {
                build_chain(&mut engine, count, true);
                engine.execute_pass_nodes().unwrap();
                black_box(engine.stats().passes_executed)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_frame);
criterion_main!(benches);
