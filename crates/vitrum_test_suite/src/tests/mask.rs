//! Raster mask tests
//!
//! Glass whose outline comes from a foreground coverage mask instead of
//! shape descriptors.

use crate::harness::TestContext;
use crate::runner::TestSuite;
use vitrum_core::{Color, GeometryMode, GlassSettings, LightingModel};

fn backdrop(ctx: &mut TestContext) {
    ctx.checkerboard(20, Color::rgb(0.95, 0.9, 0.8), Color::rgb(0.2, 0.25, 0.35));
    ctx.mode = GeometryMode::Mask;
}

/// Create the mask test suite
pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("mask");

    suite.add("ellipse_mask", |ctx| {
        backdrop(ctx);
        ctx.mask_ellipse(200.0, 150.0, 120.0, 70.0);
    });

    suite.add("rect_mask", |ctx| {
        backdrop(ctx);
        ctx.mask_rect(80.0, 90.0, 240.0, 120.0);
    });

    // Two blobs touching in the mask read as one surface
    suite.add("merged_blobs", |ctx| {
        backdrop(ctx);
        ctx.mask_ellipse(160.0, 150.0, 70.0, 70.0);
        ctx.mask_ellipse(250.0, 150.0, 70.0, 70.0);
    });

    suite.add("soft_mask_blur", |ctx| {
        backdrop(ctx);
        ctx.mask_blur = Some(16.0);
        ctx.mask_ellipse(200.0, 150.0, 120.0, 70.0);
    });

    suite.add("mask_frosted", |ctx| {
        backdrop(ctx);
        ctx.settings = GlassSettings::frosted();
        ctx.mask_rect(60.0, 60.0, 280.0, 180.0);
    });

    suite.add("mask_adaptive_lighting", |ctx| {
        backdrop(ctx);
        ctx.options.lighting = LightingModel::Adaptive;
        ctx.mask_ellipse(200.0, 150.0, 120.0, 70.0);
    });

    suite
}
