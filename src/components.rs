//! Components used by the labeling system.

use bevy::prelude::*;

/// Marks the camera whose view is captured and labeled. Exactly one is expected.
#[derive(Component, Reflect, Debug, Default, Clone, Copy)]
#[reflect(Component)]
pub struct LabelCamera;

/// Tracks an entity (and its mesh descendants) under a class id.
///
/// Inserting it appends the entity to [`crate::TrackedObjects`]; removing it drops the
/// entity from the list.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct LabelTarget {
    pub class_id: u32,
}

impl LabelTarget {
    pub const fn new(class_id: u32) -> Self { Self { class_id } }
}
