//! Scene composition
//!
//! Folds the per-shape distance fields of one frame into a single scalar
//! field with a smooth-minimum union. A [`Scene`] is the frozen, validated
//! shape list for exactly one frame; build it with [`SceneBuilder`].

use smallvec::SmallVec;

use crate::error::{GlassError, Result};
use crate::geometry::Vec2;
use crate::shape::{ShapeDescriptor, FAR_DISTANCE};

/// Maximum number of shapes composed into one field
pub const MAX_SHAPES: usize = 64;

/// Smooth-minimum union of two distances with blend radius `k`
///
/// `k <= 0` is a hard union. The operator is symmetric in `d1`/`d2`, so
/// shape order does not change the composed surface.
pub fn smooth_union(d1: f32, d2: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return d1.min(d2);
    }
    let e = (k - (d1 - d2).abs()).max(0.0);
    d1.min(d2) - e * e / (4.0 * k)
}

/// Compose the field of `shapes` at `point`
///
/// An empty list yields [`FAR_DISTANCE`].
pub fn compose_field(point: Vec2, shapes: &[ShapeDescriptor], blend: f32) -> f32 {
    let mut iter = shapes.iter();
    let Some(first) = iter.next() else {
        return FAR_DISTANCE;
    };
    iter.fold(first.distance(point), |acc, shape| {
        smooth_union(acc, shape.distance(point), blend)
    })
}

/// What to do when more than [`MAX_SHAPES`] are supplied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Fail with [`GlassError::ShapeLimitExceeded`]
    #[default]
    Reject,
    /// Keep the first [`MAX_SHAPES`] and drop the rest with a warning
    Truncate,
}

/// Validated shape list for one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    shapes: SmallVec<[ShapeDescriptor; 8]>,
    dropped: usize,
}

impl Scene {
    /// A scene with no glass; every pixel passes the background through
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[ShapeDescriptor] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of shapes dropped by [`OverflowPolicy::Truncate`]
    pub fn truncated(&self) -> usize {
        self.dropped
    }

    /// Composed signed distance at `point`
    pub fn field(&self, point: Vec2, blend: f32) -> f32 {
        compose_field(point, &self.shapes, blend)
    }

    /// Fixed-size shape uniform array (`MAX_SHAPES` slots of 6 values)
    ///
    /// Unused slots are encoded as [`ShapeKind::None`](crate::shape::ShapeKind::None).
    pub fn encode_shapes(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(MAX_SHAPES * 6);
        for i in 0..MAX_SHAPES {
            let shape = self
                .shapes
                .get(i)
                .copied()
                .unwrap_or_else(ShapeDescriptor::none);
            out.extend_from_slice(&shape.to_uniforms());
        }
        out
    }

    /// Decode the first `count` slots of a shape uniform array
    ///
    /// Slots keep their index: a [`ShapeKind::None`](crate::shape::ShapeKind::None)
    /// slot inside the count decodes to a `None` shape.
    pub fn decode_shapes(values: &[f32], count: usize) -> Result<Self> {
        if values.len() != MAX_SHAPES * 6 {
            return Err(GlassError::InvalidUniforms {
                expected: MAX_SHAPES * 6,
                actual: values.len(),
            });
        }
        if count > MAX_SHAPES {
            return Err(GlassError::ShapeLimitExceeded {
                count,
                max: MAX_SHAPES,
            });
        }
        let mut builder = SceneBuilder::new();
        for chunk in values.chunks_exact(6).take(count) {
            let mut slot = [0.0; 6];
            slot.copy_from_slice(chunk);
            builder.push(ShapeDescriptor::from_uniforms(&slot));
        }
        builder.build()
    }
}

/// Collects shape descriptors and validates them into a [`Scene`]
#[derive(Clone, Debug, Default)]
pub struct SceneBuilder {
    shapes: Vec<ShapeDescriptor>,
    policy: OverflowPolicy,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn push(&mut self, shape: ShapeDescriptor) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    pub fn shape(mut self, shape: ShapeDescriptor) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn extend<I: IntoIterator<Item = ShapeDescriptor>>(mut self, shapes: I) -> Self {
        self.shapes.extend(shapes);
        self
    }

    /// Validate sizes and the shape limit
    pub fn build(self) -> Result<Scene> {
        for (index, shape) in self.shapes.iter().enumerate() {
            let (width, height) = (shape.size.width, shape.size.height);
            if !(width >= 0.0 && height >= 0.0) || !width.is_finite() || !height.is_finite() {
                return Err(GlassError::InvalidShapeSize {
                    index,
                    width,
                    height,
                });
            }
        }

        let count = self.shapes.len();
        let mut shapes = self.shapes;
        let mut dropped = 0;
        if count > MAX_SHAPES {
            match self.policy {
                OverflowPolicy::Reject => {
                    return Err(GlassError::ShapeLimitExceeded {
                        count,
                        max: MAX_SHAPES,
                    });
                }
                OverflowPolicy::Truncate => {
                    dropped = count - MAX_SHAPES;
                    shapes.truncate(MAX_SHAPES);
                    tracing::warn!(
                        "glass scene has {} shapes, dropping the last {} (limit {})",
                        count,
                        dropped,
                        MAX_SHAPES
                    );
                }
            }
        }

        Ok(Scene {
            shapes: shapes.into_iter().collect(),
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::shape::ShapeKind;

    fn rrect(x: f32, y: f32, w: f32, h: f32, r: f32) -> ShapeDescriptor {
        ShapeDescriptor::rounded_rect(Vec2::new(x, y), Size::new(w, h), r)
    }

    #[test]
    fn test_smooth_union_hard_when_k_zero() {
        for &(a, b) in &[(1.0f32, 2.0f32), (-3.0, 0.5), (4.0, 4.0), (-1.0, -7.5)] {
            assert_eq!(smooth_union(a, b, 0.0), f32::min(a, b));
            assert_eq!(smooth_union(a, b, -5.0), f32::min(a, b));
        }
    }

    #[test]
    fn test_smooth_union_commutative() {
        let values: [f32; 6] = [-20.0, -3.5, 0.0, 0.25, 7.0, 31.0];
        for &a in &values {
            for &b in &values {
                for &k in &[0.0, 1.0, 10.0, 40.0] {
                    let ab = smooth_union(a, b, k);
                    let ba = smooth_union(b, a, k);
                    assert!((ab - ba).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_smooth_union_never_exceeds_min() {
        for &(a, b) in &[(1.0f32, 2.0f32), (3.0, 3.0), (-2.0, 5.0)] {
            assert!(smooth_union(a, b, 10.0) <= a.min(b));
        }
        // Equal inputs sink by exactly k/4.
        assert!((smooth_union(3.0, 3.0, 8.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_scene_is_far() {
        assert_eq!(compose_field(Vec2::ZERO, &[], 20.0), FAR_DISTANCE);
        assert_eq!(Scene::empty().field(Vec2::new(5.0, 5.0), 0.0), FAR_DISTANCE);
    }

    #[test]
    fn test_single_shape_matches_primitive() {
        let shape = rrect(50.0, 50.0, 60.0, 40.0, 10.0);
        let scene = SceneBuilder::new().shape(shape).build().unwrap();
        for &(x, y) in &[(50.0, 50.0), (0.0, 0.0), (80.0, 70.0), (20.5, 31.0)] {
            let p = Vec2::new(x, y);
            assert_eq!(scene.field(p, 40.0), shape.distance(p));
        }
    }

    #[test]
    fn test_far_apart_shapes_equal_hard_min() {
        let a = rrect(50.0, 50.0, 40.0, 40.0, 8.0);
        let b = rrect(450.0, 50.0, 40.0, 40.0, 8.0);
        let shapes = [a, b];
        // Sample near each shape: the other shape is hundreds of pixels away.
        for x in (0..=120).step_by(7).chain((380..=520).step_by(7)) {
            for y in (0..=100).step_by(9) {
                let p = Vec2::new(x as f32, y as f32);
                let expected = a.distance(p).min(b.distance(p));
                assert_eq!(compose_field(p, &shapes, 20.0), expected);
            }
        }
    }

    #[test]
    fn test_overlapping_shapes_merge_at_midpoint() {
        let a = ShapeDescriptor::ellipse(Vec2::new(100.0, 100.0), Size::new(80.0, 80.0));
        let b = ShapeDescriptor::ellipse(Vec2::new(160.0, 100.0), Size::new(80.0, 80.0));
        let mid = Vec2::new(130.0, 100.0);
        let merged = compose_field(mid, &[a, b], 40.0);
        assert!(merged < a.distance(mid));
        assert!(merged < b.distance(mid));
    }

    #[test]
    fn test_none_shape_is_noop() {
        let a = rrect(50.0, 50.0, 40.0, 40.0, 8.0);
        let p = Vec2::new(60.0, 45.0);
        let with_none = compose_field(p, &[a, ShapeDescriptor::none()], 30.0);
        assert_eq!(with_none, a.distance(p));
    }

    #[test]
    fn test_coincident_shapes_order_independent() {
        let a = rrect(50.0, 50.0, 40.0, 40.0, 8.0);
        let b = ShapeDescriptor::new(ShapeKind::Squircle, Vec2::new(50.0, 50.0), Size::new(40.0, 40.0), 8.0);
        let p = Vec2::new(70.0, 71.0);
        let ab = compose_field(p, &[a, b], 12.0);
        let ba = compose_field(p, &[b, a], 12.0);
        assert!((ab - ba).abs() < 1e-5);
    }

    #[test]
    fn test_outside_field_monotonic() {
        let scene = SceneBuilder::new()
            .shape(rrect(100.0, 100.0, 60.0, 60.0, 12.0))
            .shape(rrect(160.0, 100.0, 60.0, 60.0, 12.0))
            .build()
            .unwrap();
        let mut last = 0.0;
        for step in 0..40 {
            let p = Vec2::new(194.0 + 4.0 * step as f32, 100.0);
            let d = scene.field(p, 20.0);
            assert!(d > 0.0);
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn test_builder_rejects_over_limit() {
        let shapes = (0..MAX_SHAPES + 1).map(|i| rrect(i as f32, 0.0, 4.0, 4.0, 1.0));
        let err = SceneBuilder::new().extend(shapes).build().unwrap_err();
        assert_eq!(
            err,
            GlassError::ShapeLimitExceeded {
                count: MAX_SHAPES + 1,
                max: MAX_SHAPES
            }
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_builder_truncates_first_n() {
        let shapes: Vec<_> = (0..MAX_SHAPES + 3)
            .map(|i| rrect(i as f32 * 10.0, 0.0, 4.0, 4.0, 1.0))
            .collect();
        let scene = SceneBuilder::new()
            .with_policy(OverflowPolicy::Truncate)
            .extend(shapes.clone())
            .build()
            .unwrap();
        assert_eq!(scene.len(), MAX_SHAPES);
        assert_eq!(scene.truncated(), 3);
        assert_eq!(scene.shapes(), &shapes[..MAX_SHAPES]);
    }

    #[test]
    fn test_builder_rejects_negative_size() {
        let err = SceneBuilder::new()
            .shape(rrect(0.0, 0.0, 10.0, 10.0, 0.0))
            .shape(rrect(0.0, 0.0, -1.0, 10.0, 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, GlassError::InvalidShapeSize { index: 1, .. }));
    }

    #[test]
    fn test_shape_uniforms_round_trip() {
        let scene = SceneBuilder::new()
            .shape(rrect(10.0, 20.0, 30.0, 40.0, 5.0))
            .shape(ShapeDescriptor::ellipse(Vec2::new(1.5, 2.5), Size::new(7.0, 9.0)))
            .build()
            .unwrap();
        let encoded = scene.encode_shapes();
        assert_eq!(encoded.len(), MAX_SHAPES * 6);
        assert_eq!(Scene::decode_shapes(&encoded, 2).unwrap(), scene);
        assert!(Scene::decode_shapes(&encoded[..12], 2).is_err());
        assert!(matches!(
            Scene::decode_shapes(&encoded, MAX_SHAPES + 1),
            Err(GlassError::ShapeLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_decode_keeps_empty_slot_position() {
        let scene = SceneBuilder::new()
            .shape(rrect(10.0, 20.0, 30.0, 40.0, 5.0))
            .shape(ShapeDescriptor::none())
            .shape(ShapeDescriptor::ellipse(Vec2::new(50.0, 60.0), Size::new(8.0, 4.0)))
            .build()
            .unwrap();
        let decoded = Scene::decode_shapes(&scene.encode_shapes(), scene.len()).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.shapes()[1].kind, ShapeKind::None);
        assert_eq!(decoded, scene);
    }
}
