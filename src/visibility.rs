//! Frustum visibility test for tracked objects.

use bevy::prelude::*;

use crate::camera::FrustumPlanes;
use crate::geometry::WorldBounds;

/// Why a tracked object produced no label in a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SkipReason {
    /// The object is disabled (hidden)
    Disabled,
    /// The object exposes no renderable geometry with bounds
    NoGeometry,
    /// The object's world bounds lie outside the camera frustum
    OutsideFrustum,
    /// Visible, but none of its vertices could be projected
    NoProjectedPoints,
}

/// Outcome of testing one object against the capture frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectVisibility {
    Visible,
    Skipped(SkipReason),
}

impl ObjectVisibility {
    pub const fn is_visible(&self) -> bool { matches!(self, Self::Visible) }
}

/// Tests whether an object's combined world bounds intersect the frustum.
///
/// Disabled objects and objects without geometry are not visible; both are logged and are
/// not errors.
pub fn test_visibility<O>(object: &O, frustum: &FrustumPlanes) -> ObjectVisibility
where
    O: WorldBounds + ?Sized,
{
    if !object.is_enabled() {
        warn!("Object is disabled. Skipping labeling.");
        return ObjectVisibility::Skipped(SkipReason::Disabled);
    }

    let Some(bounds) = object.world_bounds() else {
        warn!("Object has no renderable geometry. Skipping labeling.");
        return ObjectVisibility::Skipped(SkipReason::NoGeometry);
    };

    if frustum.intersects_aabb(&bounds) {
        ObjectVisibility::Visible
    } else {
        debug!("Object is outside camera view. Skipping labeling.");
        ObjectVisibility::Skipped(SkipReason::OutsideFrustum)
    }
}

/// Convenience boolean form of [`test_visibility`].
pub fn is_visible<O>(object: &O, frustum: &FrustumPlanes) -> bool
where
    O: WorldBounds + ?Sized,
{
    test_visibility(object, frustum).is_visible()
}
