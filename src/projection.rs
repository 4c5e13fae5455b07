//! Screen-space projection of mesh geometry and bounding rectangle accumulation.

use bevy::prelude::*;

use crate::geometry::CameraView;
use crate::geometry::MeshParts;

/// Axis-aligned rectangle in screen pixels (top-left origin, y down).
///
/// Not clipped to the viewport: a partially visible object may yield negative coordinates
/// or extend past the viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left:   f32,
    pub top:    f32,
    pub width:  f32,
    pub height: f32,
}

impl ScreenRect {
    /// Degenerate rectangle returned when there is nothing to bound
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Tight bounds of a set of screen points; [`Self::ZERO`] for an empty set.
    pub fn from_points(points: &[Vec2]) -> Self {
        if points.is_empty() {
            return Self::ZERO;
        }

        let mut left = f32::INFINITY;
        let mut right = f32::NEG_INFINITY;
        let mut top = f32::INFINITY;
        let mut bottom = f32::NEG_INFINITY;

        for point in points {
            left = left.min(point.x);
            right = right.max(point.x);
            top = top.min(point.y);
            bottom = bottom.max(point.y);
        }

        Self::new(left, top, right - left, bottom - top)
    }

    pub const fn right(&self) -> f32 { self.left + self.width }

    pub const fn bottom(&self) -> f32 { self.top + self.height }

    pub const fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    /// True when the rectangle has no area and must not be written as a label
    pub fn is_empty(&self) -> bool { self.width <= 0.0 || self.height <= 0.0 }
}

/// Projects every vertex of every mesh part to screen space.
///
/// Each vertex goes local → world through its own part's transform, then world → screen
/// through the camera. Parts without vertex data are skipped; points the camera cannot
/// project are dropped. Order follows parts, then vertices.
pub fn project_to_screen<O, C>(object: &O, camera: &C) -> Vec<Vec2>
where
    O: MeshParts + ?Sized,
    C: CameraView + ?Sized,
{
    let mut points = Vec::new();

    for (part_index, part) in object.mesh_parts().iter().enumerate() {
        let Some(vertices) = part.vertices else {
            warn!("Mesh part {part_index} has no vertex data, skipping it");
            continue;
        };

        points.extend(vertices.iter().filter_map(|vertex| {
            let world = part.local_to_world.transform_point3(Vec3::from_array(*vertex));
            camera.world_to_screen(world)
        }));
    }

    points
}

/// Projects an object and reduces it to its screen rectangle.
pub fn screen_rect<O, C>(object: &O, camera: &C) -> ScreenRect
where
    O: MeshParts + ?Sized,
    C: CameraView + ?Sized,
{
    let points = project_to_screen(object, camera);
    if points.is_empty() {
        warn!("No projectable mesh vertices on the object or its children");
    }
    ScreenRect::from_points(&points)
}
