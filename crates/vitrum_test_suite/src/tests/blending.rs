//! Smooth union tests
//!
//! Neighbouring shapes merge into one continuous surface when their
//! distance is within the blend radius.

use crate::runner::TestSuite;
use vitrum_core::{Color, GlassSettings, ShapeDescriptor, Size, Vec2};

fn pill(x: f32, y: f32) -> ShapeDescriptor {
    ShapeDescriptor::squircle(Vec2::new(x, y), Size::new(120.0, 64.0), 32.0)
}

/// Create the blending test suite
pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("blending");

    for (name, blend) in [("hard_union", 0.0), ("blend_20", 20.0), ("blend_60", 60.0)] {
        suite.add(name, move |ctx| {
            ctx.vertical_gradient(Color::rgb(0.9, 0.5, 0.2), Color::rgb(0.2, 0.3, 0.8));
            ctx.settings = GlassSettings::default().with_blend(blend);
            ctx.add_shape(pill(140.0, 150.0));
            ctx.add_shape(pill(270.0, 150.0));
        });
    }

    suite.add("overlapping", |ctx| {
        ctx.checkerboard(25, Color::rgb(0.9, 0.9, 0.85), Color::rgb(0.3, 0.35, 0.4));
        ctx.add_shape(ShapeDescriptor::ellipse(
            Vec2::new(170.0, 150.0),
            Size::new(140.0, 140.0),
        ));
        ctx.add_shape(ShapeDescriptor::ellipse(
            Vec2::new(240.0, 150.0),
            Size::new(140.0, 140.0),
        ));
    });

    suite.add("mixed_kinds", |ctx| {
        ctx.checkerboard(25, Color::rgb(0.9, 0.9, 0.85), Color::rgb(0.3, 0.35, 0.4));
        ctx.settings = GlassSettings::default().with_blend(30.0);
        ctx.add_shape(ShapeDescriptor::rounded_rect(
            Vec2::new(150.0, 150.0),
            Size::new(140.0, 90.0),
            12.0,
        ));
        ctx.add_shape(ShapeDescriptor::ellipse(
            Vec2::new(260.0, 120.0),
            Size::new(100.0, 100.0),
        ));
        ctx.add_shape(ShapeDescriptor::squircle(
            Vec2::new(250.0, 210.0),
            Size::new(110.0, 50.0),
            25.0,
        ));
    });

    // A toolbar of small buttons, the common liquid glass layout
    suite.add("button_row", |ctx| {
        ctx.vertical_gradient(Color::rgb(0.1, 0.6, 0.7), Color::rgb(0.9, 0.9, 0.6));
        ctx.settings = GlassSettings::default().with_blend(16.0);
        for i in 0..6 {
            ctx.add_shape(ShapeDescriptor::squircle(
                Vec2::new(60.0 + i as f32 * 56.0, 150.0),
                Size::new(48.0, 48.0),
                24.0,
            ));
        }
    });

    // Beyond the shape limit the first 64 survive
    suite.add("truncated_grid", |ctx| {
        ctx.checkerboard(10, Color::WHITE, Color::rgb(0.2, 0.2, 0.2));
        ctx.settings = GlassSettings::default().with_blend(4.0);
        for row in 0..8 {
            for col in 0..10 {
                ctx.add_shape(ShapeDescriptor::ellipse(
                    Vec2::new(30.0 + col as f32 * 38.0, 20.0 + row as f32 * 36.0),
                    Size::new(28.0, 28.0),
                ));
            }
        }
    });

    suite
}
