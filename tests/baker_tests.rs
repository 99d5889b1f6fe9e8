//! Integration tests for the skinned mesh baker.
//!
//! All tests run on the dummy backend. The recording kernel snapshots every
//! bound buffer at dispatch time, which lets the tests check what a GPU kernel
//! would have read without a GPU.
//!
//! # Test Categories
//!
//! - **Pipeline Tests**: skip conditions and the end-to-end bake
//! - **Resource Tests**: scratch sizing and reallocation
//! - **History Tests**: position buffer role swap
//! - **Validation Tests**: output map checks and the halt latch
//! - **Lifecycle Tests**: shutdown and drop

mod common;

use std::sync::Arc;

use glam::{Mat4, Vec3};
use rstest::rstest;

use common::{SharedMesh, TestContext, flatten, marker_vertices};
use redlilium_mesh_baker::kernel::params;
use redlilium_mesh_baker::{
    BakerConfig, BakerError, Extent3d, GraphicsError, MeshSource, OutputTextures, Reallocation,
    TextureDescriptor, TextureFormat, TextureUsage, TickOutcome,
};

const DT: f32 = 1.0 / 50.0;

fn baked(outcome: TickOutcome) -> redlilium_mesh_baker::BakeReport {
    match outcome {
        TickOutcome::Baked(report) => report,
        other => panic!("expected a bake, got {other:?}"),
    }
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_no_source_skips() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker
        .set_outputs(ctx.outputs(64, 64, TextureFormat::Rgba16Float))
        .unwrap();

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::NoSource);
    assert!(baker.kernel().invocations().is_empty());
    assert_eq!(ctx.backend.stats().buffers_created, 0);
}

#[test]
fn test_no_outputs_skips() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(10, 1.0)));

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::NoOutputs);
    assert!(!baker.is_latched());
    assert!(ctx.diagnostics.is_empty());
}

#[test]
fn test_empty_mesh_skips_without_allocating() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::default()));
    baker
        .set_outputs(ctx.outputs(64, 64, TextureFormat::Rgba16Float))
        .unwrap();

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::EmptyMesh);
    assert_eq!(ctx.backend.stats().buffers_created, 0);
    assert!(!baker.resources().textures().is_allocated());
}

#[test]
fn test_end_to_end_bake() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(100, 1.0);
    let transform = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
    mesh.set_transform(transform);
    baker.set_source(Box::new(mesh));
    let outputs = ctx.outputs(256, 256, TextureFormat::Rgba16Float);
    baker.set_outputs(outputs.clone()).unwrap();

    let report = baked(baker.tick(DT).unwrap());
    assert_eq!(report.vertex_count, 100);
    assert_eq!(report.groups, [32, 32, 1]);
    assert_eq!(
        report.reallocation,
        Reallocation {
            buffers: true,
            textures: true
        }
    );

    let invocation = baker.kernel().last_invocation().unwrap();
    assert_eq!(invocation.groups, [32, 32, 1]);
    assert_eq!(invocation.ints[params::VERTEX_COUNT], 100);
    assert_eq!(invocation.matrices[params::TRANSFORM], transform);
    assert!((invocation.floats[params::FRAME_RATE] - 50.0).abs() < 1e-3);
    for name in [
        params::POSITION_BUFFER,
        params::OLD_POSITION_BUFFER,
        params::NORMAL_BUFFER,
    ] {
        assert_eq!(invocation.buffers[name].contents.len(), 300, "{name}");
    }
    assert_eq!(
        invocation.buffers[params::POSITION_BUFFER].contents,
        flatten(&marker_vertices(100, 1.0))
    );
    assert_eq!(
        invocation.buffers[params::NORMAL_BUFFER].contents,
        flatten(&vec![Vec3::Y; 100])
    );
    for name in [params::POSITION_MAP, params::VELOCITY_MAP, params::NORMAL_MAP] {
        let image = invocation.images[name];
        assert_eq!(image.size, Extent3d::new_2d(256, 256), "{name}");
        assert_eq!(image.format, TextureFormat::Rgba16Float, "{name}");
    }

    assert_eq!(ctx.backend.stats().texture_copies, 3);
    for output in [
        &outputs.position_map,
        &outputs.velocity_map,
        &outputs.normal_map,
    ] {
        assert_eq!(ctx.backend.copies_received(output.gpu_handle()), Some(1));
        let descriptor = ctx.backend.texture_descriptor(output.gpu_handle()).unwrap();
        assert_eq!(descriptor.size, Extent3d::new_2d(256, 256));
        assert_eq!(descriptor.format, TextureFormat::Rgba16Float);
    }

    let scratch = baker.resources().textures();
    let pairs = [
        (scratch.position().unwrap(), &outputs.position_map),
        (scratch.velocity().unwrap(), &outputs.velocity_map),
        (scratch.normal().unwrap(), &outputs.normal_map),
    ];
    for (src, dst) in pairs {
        let expected = match src.gpu_handle() {
            redlilium_mesh_baker::backend::GpuTexture::Dummy { slot } => *slot,
            #[allow(unreachable_patterns)]
            _ => unreachable!(),
        };
        assert_eq!(
            ctx.backend.last_copy_source(dst.gpu_handle()),
            Some(expected)
        );
    }
}

#[rstest]
#[case::zero(0.0)]
#[case::negative(-0.5)]
#[case::nan(f32::NAN)]
fn test_unusable_delta_uses_fallback_frame_rate(#[case] delta: f32) {
    let ctx = TestContext::new();
    let mut baker = ctx.baker_with_config(BakerConfig::default().with_fallback_frame_rate(30.0));
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba32Float))
        .unwrap();

    let report = baked(baker.tick(delta).unwrap());
    assert_eq!(report.frame_rate, 30.0);
    assert_eq!(
        baker.kernel().last_invocation().unwrap().floats[params::FRAME_RATE],
        30.0
    );
}

#[test]
fn test_zero_delta_uses_default_fallback() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();

    assert_eq!(baked(baker.tick(0.0).unwrap()).frame_rate, 60.0);
}

#[test]
fn test_missing_normals_upload_as_zero() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(3, 1.0);
    mesh.set_normals(vec![Vec3::X]);
    baker.set_source(Box::new(mesh));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();

    let _ = baked(baker.tick(DT).unwrap());
    assert_eq!(
        baker.kernel().last_invocation().unwrap().buffers[params::NORMAL_BUFFER].contents,
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_foreign_outputs_rejected() {
    let ctx = TestContext::new();
    let other = TestContext::new();
    let mut baker = ctx.baker();

    let outputs = OutputTextures::new(
        ctx.output(8, 8, TextureFormat::Rgba16Float),
        other.output(8, 8, TextureFormat::Rgba16Float),
        ctx.output(8, 8, TextureFormat::Rgba16Float),
    );
    assert!(matches!(
        baker.set_outputs(outputs),
        Err(BakerError::ForeignOutputTexture)
    ));
    assert!(baker.outputs().is_none());
}

#[test]
fn test_dispatch_failure_propagates_and_keeps_history() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(4, 1.0);
    baker.set_source(Box::new(mesh.clone()));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();
    let _ = baked(baker.tick(DT).unwrap());
    let current = baker.resources().buffers().current().unwrap().id();

    baker.kernel_mut().fail_next_dispatch(GraphicsError::DeviceLost);
    mesh.set_vertices(marker_vertices(4, 2.0));
    assert!(matches!(baker.tick(DT), Err(BakerError::Dispatch(_))));
    assert_eq!(baker.resources().buffers().current().unwrap().id(), current);
    assert_eq!(ctx.backend.stats().texture_copies, 3);
}

// ============================================================================
// Resource Tests
// ============================================================================

#[rstest]
#[case(1)]
#[case(7)]
#[case(100)]
#[case(4096)]
fn test_buffers_hold_three_floats_per_vertex(#[case] vertex_count: usize) {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(vertex_count, 1.0)));
    baker
        .set_outputs(ctx.outputs(16, 16, TextureFormat::Rgba16Float))
        .unwrap();

    let _ = baked(baker.tick(DT).unwrap());
    let buffers = baker.resources().buffers();
    for buffer in [
        buffers.current().unwrap(),
        buffers.previous().unwrap(),
        buffers.normals().unwrap(),
    ] {
        assert_eq!(buffer.element_count::<f32>(), 3 * vertex_count);
    }
}

#[test]
fn test_steady_state_does_not_reallocate() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(10, 1.0)));
    baker
        .set_outputs(ctx.outputs(16, 16, TextureFormat::Rgba16Float))
        .unwrap();

    let _ = baker.tick(DT).unwrap();
    let before = ctx.backend.stats();
    for _ in 0..5 {
        assert!(baked(baker.tick(DT).unwrap()).reallocation.is_empty());
    }
    let after = ctx.backend.stats();
    assert_eq!(after.buffers_created, before.buffers_created);
    assert_eq!(after.textures_created, before.textures_created);
}

#[test]
fn test_vertex_count_change_reallocates_all_buffers() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(10, 1.0);
    baker.set_source(Box::new(mesh.clone()));
    baker
        .set_outputs(ctx.outputs(16, 16, TextureFormat::Rgba16Float))
        .unwrap();
    let _ = baker.tick(DT).unwrap();
    let before = ctx.backend.stats();

    mesh.set_vertices(marker_vertices(12, 1.0));
    let report = baked(baker.tick(DT).unwrap());
    assert_eq!(
        report.reallocation,
        Reallocation {
            buffers: true,
            textures: false
        }
    );

    let after = ctx.backend.stats();
    assert_eq!(after.buffers_destroyed - before.buffers_destroyed, 3);
    assert_eq!(after.buffers_created - before.buffers_created, 3);
    assert_eq!(after.live_buffers(), 3);
    assert_eq!(baker.resources().buffers().element_count(), Some(36));
}

#[test]
fn test_output_size_change_reallocates_all_images() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(10, 1.0)));
    let small = ctx.outputs(16, 16, TextureFormat::Rgba16Float);
    baker.set_outputs(small.clone()).unwrap();
    let _ = baker.tick(DT).unwrap();
    let old_ids: Vec<_> = {
        let t = baker.resources().textures();
        vec![
            t.position().unwrap().id(),
            t.velocity().unwrap().id(),
            t.normal().unwrap().id(),
        ]
    };

    let large = ctx.outputs(32, 64, TextureFormat::Rgba16Float);
    baker.set_outputs(large).unwrap();
    let before = ctx.backend.stats();
    let report = baked(baker.tick(DT).unwrap());

    assert_eq!(
        report.reallocation,
        Reallocation {
            buffers: false,
            textures: true
        }
    );
    assert_eq!(report.groups, [4, 8, 1]);
    let after = ctx.backend.stats();
    assert_eq!(after.textures_destroyed - before.textures_destroyed, 3);
    assert_eq!(after.textures_created - before.textures_created, 3);

    let t = baker.resources().textures();
    assert_eq!(t.size(), Some(Extent3d::new_2d(32, 64)));
    for id in [
        t.position().unwrap().id(),
        t.velocity().unwrap().id(),
        t.normal().unwrap().id(),
    ] {
        assert!(!old_ids.contains(&id));
    }
    drop(small);
}

#[test]
fn test_scratch_images_follow_output_formats() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    let outputs = OutputTextures::new(
        ctx.output(8, 8, TextureFormat::Rgba16Float),
        ctx.output(8, 8, TextureFormat::Rgba32Float),
        ctx.output(8, 8, TextureFormat::Rgba16Float),
    );
    baker.set_outputs(outputs.clone()).unwrap();

    let _ = baked(baker.tick(DT).unwrap());
    let images = &baker.kernel().last_invocation().unwrap().images;
    assert_eq!(images[params::POSITION_MAP].format, TextureFormat::Rgba16Float);
    assert_eq!(images[params::VELOCITY_MAP].format, TextureFormat::Rgba32Float);
    assert_eq!(images[params::NORMAL_MAP].format, TextureFormat::Rgba16Float);
    for output in [&outputs.position_map, &outputs.velocity_map, &outputs.normal_map] {
        assert_eq!(ctx.backend.copies_received(output.gpu_handle()), Some(1));
    }

    // Switching every output to full floats recreates the images once.
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba32Float))
        .unwrap();
    let report = baked(baker.tick(DT).unwrap());
    assert!(report.reallocation.textures && !report.reallocation.buffers);
    let report = baked(baker.tick(DT).unwrap());
    assert!(report.reallocation.is_empty());
    let t = baker.resources().textures();
    for image in [t.position(), t.velocity(), t.normal()] {
        assert_eq!(image.unwrap().format(), TextureFormat::Rgba32Float);
    }
}

#[test]
fn test_rejected_copy_leaves_no_side_effects() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(4, 1.0);
    baker.set_source(Box::new(mesh.clone()));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();
    let _ = baked(baker.tick(DT).unwrap());
    let current = baker.resources().buffers().current().unwrap().id();

    // The velocity map cannot be copied into; the checker does not look at usage.
    let read_only = Arc::new(
        ctx.device
            .create_texture(&TextureDescriptor::new_2d(
                8,
                8,
                TextureFormat::Rgba16Float,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap(),
    );
    let outputs = OutputTextures::new(
        ctx.output(8, 8, TextureFormat::Rgba16Float),
        read_only,
        ctx.output(8, 8, TextureFormat::Rgba16Float),
    );
    baker.set_outputs(outputs.clone()).unwrap();
    let before = ctx.backend.stats();
    mesh.set_vertices(marker_vertices(4, 2.0));

    assert!(matches!(
        baker.tick(DT),
        Err(BakerError::Graphics(GraphicsError::InvalidParameter(_)))
    ));
    let after = ctx.backend.stats();
    assert_eq!(after.bytes_written, before.bytes_written);
    assert_eq!(after.texture_copies, before.texture_copies);
    assert_eq!(baker.kernel().invocations().len(), 1);
    assert_eq!(
        ctx.backend.copies_received(outputs.position_map.gpu_handle()),
        Some(0)
    );
    assert_eq!(baker.resources().buffers().current().unwrap().id(), current);
}

// ============================================================================
// History Tests
// ============================================================================

#[test]
fn test_current_positions_become_old_positions_next_tick() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(5, 1.0);
    baker.set_source(Box::new(mesh.clone()));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();

    let _ = baked(baker.tick(DT).unwrap());
    mesh.set_vertices(marker_vertices(5, 2.0));
    let _ = baked(baker.tick(DT).unwrap());
    mesh.set_vertices(marker_vertices(5, 3.0));
    let _ = baked(baker.tick(DT).unwrap());

    let invocations = baker.kernel().invocations();
    assert_eq!(invocations.len(), 3);
    for pair in invocations.windows(2) {
        let current = &pair[0].buffers[params::POSITION_BUFFER];
        let old = &pair[1].buffers[params::OLD_POSITION_BUFFER];
        assert_eq!(old.id, current.id);
        assert_eq!(old.contents, current.contents);
        assert_ne!(pair[1].buffers[params::POSITION_BUFFER].id, current.id);
    }
    assert_eq!(
        invocations[2].buffers[params::OLD_POSITION_BUFFER].contents,
        flatten(&marker_vertices(5, 2.0))
    );
    assert_eq!(ctx.backend.stats().buffers_created, 3);
}

#[test]
fn test_skipped_tick_does_not_swap() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    let mesh = SharedMesh::with_vertices(5, 1.0);
    baker.set_source(Box::new(mesh.clone()));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();
    let _ = baked(baker.tick(DT).unwrap());
    let current = baker.resources().buffers().current().unwrap().id();

    mesh.set_vertices(Vec::new());
    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::EmptyMesh);
    assert_eq!(baker.resources().buffers().current().unwrap().id(), current);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_group_aligned_outputs_pass() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(ctx.outputs(64, 8, TextureFormat::Rgba16Float))
        .unwrap();

    let report = baked(baker.tick(DT).unwrap());
    assert_eq!(report.groups, [8, 1, 1]);
    assert!(!baker.is_latched());
    assert!(ctx.diagnostics.is_empty());
}

#[test]
fn test_unaligned_outputs_latch() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(ctx.outputs(63, 8, TextureFormat::Rgba16Float))
        .unwrap();

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::Halted);
    assert!(baker.is_latched());
    let errors = ctx.diagnostics.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("multiple of 8"), "{}", errors[0]);

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::Halted);
    assert_eq!(ctx.diagnostics.len(), 1);
    assert!(baker.kernel().invocations().is_empty());
    assert_eq!(ctx.backend.stats().buffers_created, 0);
}

#[test]
fn test_latch_survives_fixed_outputs() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba8Unorm))
        .unwrap();
    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::Halted);

    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();
    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::Halted);
}

#[rstest]
#[case::normal_size(
    (16, 16, TextureFormat::Rgba16Float),
    (16, 16, TextureFormat::Rgba16Float),
    (8, 16, TextureFormat::Rgba16Float),
    "Position/normal map dimensions should match"
)]
#[case::position_format(
    (16, 16, TextureFormat::Rgba8Unorm),
    (16, 16, TextureFormat::Rgba16Float),
    (16, 16, TextureFormat::Rgba16Float),
    "Position map format"
)]
#[case::normal_format(
    (16, 16, TextureFormat::Rgba16Float),
    (16, 16, TextureFormat::Rgba16Float),
    (16, 16, TextureFormat::R32Float),
    "Normal map format"
)]
#[case::velocity_size(
    (16, 16, TextureFormat::Rgba16Float),
    (16, 8, TextureFormat::Rgba16Float),
    (16, 16, TextureFormat::Rgba16Float),
    "Position/velocity map dimensions should match"
)]
#[case::velocity_format(
    (16, 16, TextureFormat::Rgba16Float),
    (16, 16, TextureFormat::Rg16Float),
    (16, 16, TextureFormat::Rgba16Float),
    "Velocity map format"
)]
fn test_single_violation_reported(
    #[case] position: (u32, u32, TextureFormat),
    #[case] velocity: (u32, u32, TextureFormat),
    #[case] normal: (u32, u32, TextureFormat),
    #[case] message: &str,
) {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(OutputTextures::new(
            ctx.output(position.0, position.1, position.2),
            ctx.output(velocity.0, velocity.1, velocity.2),
            ctx.output(normal.0, normal.1, normal.2),
        ))
        .unwrap();

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::Halted);
    let errors = ctx.diagnostics.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].starts_with(message), "{}", errors[0]);
}

#[test]
fn test_every_violation_reported_once() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(OutputTextures::new(
            ctx.output(12, 12, TextureFormat::Rgba8Unorm),
            ctx.output(16, 16, TextureFormat::Rgba8Unorm),
            ctx.output(16, 16, TextureFormat::Rgba8Unorm),
        ))
        .unwrap();

    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::Halted);
    assert_eq!(ctx.diagnostics.errors().len(), 6);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_shutdown_releases_scratch_once() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(10, 1.0)));
    let outputs = ctx.outputs(16, 16, TextureFormat::Rgba16Float);
    baker.set_outputs(outputs.clone()).unwrap();
    let _ = baked(baker.tick(DT).unwrap());

    let stats = ctx.backend.stats();
    assert_eq!(stats.live_buffers(), 3);
    assert_eq!(stats.live_textures(), 6);

    baker.shutdown();
    let stats = ctx.backend.stats();
    assert_eq!(stats.live_buffers(), 0);
    assert_eq!(stats.live_textures(), 3);

    baker.shutdown();
    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::ShutDown);
    drop(baker);

    let stats = ctx.backend.stats();
    assert_eq!(stats.buffers_destroyed, 3);
    assert_eq!(stats.textures_destroyed, 3);
    assert_eq!(stats.invalid_releases, 0);
    drop(outputs);
}

#[test]
fn test_drop_releases_scratch() {
    let ctx = TestContext::new();
    let outputs = ctx.outputs(8, 8, TextureFormat::Rgba16Float);
    {
        let mut baker = ctx.baker();
        baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
        baker.set_outputs(outputs.clone()).unwrap();
        let _ = baked(baker.tick(DT).unwrap());
    }

    let stats = ctx.backend.stats();
    assert_eq!(stats.live_buffers(), 0);
    assert_eq!(stats.live_textures(), 3);
    assert_eq!(stats.invalid_releases, 0);
    assert_eq!(Arc::strong_count(&outputs.position_map), 1);
}

#[test]
fn test_clear_source_stops_baking() {
    let ctx = TestContext::new();
    let mut baker = ctx.baker();
    baker.set_source(Box::new(SharedMesh::with_vertices(4, 1.0)));
    baker
        .set_outputs(ctx.outputs(8, 8, TextureFormat::Rgba16Float))
        .unwrap();
    let _ = baked(baker.tick(DT).unwrap());

    let mut source = baker.clear_source().unwrap();
    assert_eq!(source.local_to_world(), Mat4::IDENTITY);
    assert_eq!(baker.tick(DT).unwrap(), TickOutcome::NoSource);
    assert_eq!(baker.kernel().invocations().len(), 1);

    let mut mesh = redlilium_mesh_baker::BakedMesh::new();
    source.bake_mesh(&mut mesh);
    assert_eq!(mesh.vertex_count(), 4);
}
