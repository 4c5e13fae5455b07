//! Capability traits the labeling core depends on.
//!
//! The core never touches ECS queries or assets directly. The adapter in
//! [`crate::support`] builds an [`ObjectGeometry`] per tracked entity each capture, and
//! tests build them by hand.

use bevy::math::Affine3A;
use bevy::prelude::*;

use crate::camera::FrustumPlanes;

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldAabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldAabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }

    /// World-space box enclosing a local box (center, half extents) after transformation.
    pub fn from_local_box(center: Vec3, half_extents: Vec3, local_to_world: &Affine3A) -> Self {
        let corners = [
            center + Vec3::new(-half_extents.x, -half_extents.y, -half_extents.z),
            center + Vec3::new(half_extents.x, -half_extents.y, -half_extents.z),
            center + Vec3::new(-half_extents.x, half_extents.y, -half_extents.z),
            center + Vec3::new(half_extents.x, half_extents.y, -half_extents.z),
            center + Vec3::new(-half_extents.x, -half_extents.y, half_extents.z),
            center + Vec3::new(half_extents.x, -half_extents.y, half_extents.z),
            center + Vec3::new(-half_extents.x, half_extents.y, half_extents.z),
            center + Vec3::new(half_extents.x, half_extents.y, half_extents.z),
        ];

        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        for corner in corners {
            let world = local_to_world.transform_point3(corner);
            min = min.min(world);
            max = max.max(world);
        }
        Self { min, max }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The 8 corners, ordered as in [`Self::from_local_box`]
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }
}

/// One renderable part of a tracked object: its vertex positions in local (model) space,
/// its local bounds, and its own local-to-world transform.
///
/// Either field may be missing (a mesh handle whose asset has not loaded, or bounds not
/// yet computed). Missing data means the part contributes nothing.
#[derive(Debug, Clone, Copy)]
pub struct MeshPart<'a> {
    pub vertices:       Option<&'a [[f32; 3]]>,
    /// Local-space box as `(center, half_extents)`
    pub local_bounds:   Option<(Vec3, Vec3)>,
    pub local_to_world: Affine3A,
}

impl<'a> MeshPart<'a> {
    /// Part with bounds computed from its own vertices.
    pub fn from_vertices(vertices: &'a [[f32; 3]], local_to_world: Affine3A) -> Self {
        let local_bounds = vertices_bounds(vertices);
        Self {
            vertices: Some(vertices),
            local_bounds,
            local_to_world,
        }
    }

    /// Part with no geometry data attached.
    pub const fn empty(local_to_world: Affine3A) -> Self {
        Self {
            vertices: None,
            local_bounds: None,
            local_to_world,
        }
    }

    pub fn world_bounds(&self) -> Option<WorldAabb> {
        let (center, half_extents) = self.local_bounds?;
        Some(WorldAabb::from_local_box(
            center,
            half_extents,
            &self.local_to_world,
        ))
    }
}

fn vertices_bounds(vertices: &[[f32; 3]]) -> Option<(Vec3, Vec3)> {
    if vertices.is_empty() {
        return None;
    }
    let (min, max) = vertices.iter().fold(
        (Vec3::INFINITY, Vec3::NEG_INFINITY),
        |(min, max), v| {
            let v = Vec3::from_array(*v);
            (min.min(v), max.max(v))
        },
    );
    Some(((min + max) * 0.5, (max - min) * 0.5))
}

/// Exposes the enabled flag and combined world bounds of a tracked object.
pub trait WorldBounds {
    fn is_enabled(&self) -> bool;

    /// Union of the world bounds of every renderable part, `None` when there are none.
    fn world_bounds(&self) -> Option<WorldAabb>;
}

/// Exposes the renderable parts of a tracked object in deterministic order.
pub trait MeshParts {
    fn mesh_parts(&self) -> &[MeshPart<'_>];
}

/// Read-only camera state for one capture.
pub trait CameraView {
    /// Physical viewport size in pixels
    fn viewport_size(&self) -> UVec2;

    /// Projects a world-space point to screen pixels (top-left origin, y down).
    /// Returns `None` when the point cannot be projected.
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2>;

    fn frustum(&self) -> &FrustumPlanes;
}

/// Geometry of one tracked object captured for a single frame.
#[derive(Debug, Clone, Default)]
pub struct ObjectGeometry<'a> {
    pub enabled: bool,
    pub parts:   Vec<MeshPart<'a>>,
}

impl<'a> ObjectGeometry<'a> {
    pub const fn new(enabled: bool, parts: Vec<MeshPart<'a>>) -> Self { Self { enabled, parts } }
}

impl WorldBounds for ObjectGeometry<'_> {
    fn is_enabled(&self) -> bool { self.enabled }

    fn world_bounds(&self) -> Option<WorldAabb> {
        self.parts
            .iter()
            .filter_map(MeshPart::world_bounds)
            .reduce(|combined, bounds| combined.union(&bounds))
    }
}

impl MeshParts for ObjectGeometry<'_> {
    fn mesh_parts(&self) -> &[MeshPart<'_>] { &self.parts }
}
