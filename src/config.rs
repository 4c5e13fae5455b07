//! Dataset and tracked-object configuration resources.

use std::path::PathBuf;

use bevy::prelude::*;

/// Configuration for where and how captures are written
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct LabelConfig {
    /// Parent of the `images/` and `labels/` directories, created when absent
    pub dataset_root:   PathBuf,
    /// Index of the first image written this run
    pub start_index:    u64,
    /// Key that requests a manual capture, `None` to disable
    pub capture_key:    Option<KeyCode>,
    /// Updates a measured capture waits for its frame before it is dropped
    pub max_frame_wait: u32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            dataset_root:   PathBuf::from("dataset"),
            start_index:    0,
            capture_key:    Some(KeyCode::Space),
            max_frame_wait: 30,
        }
    }
}

/// One tracked entity and the class it is labeled as
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedObject {
    pub entity:   Entity,
    pub class_id: u32,
}

/// Ordered list of tracked objects; label lines follow this order.
#[derive(Resource, Reflect, Debug, Clone, Default)]
#[reflect(Resource)]
pub struct TrackedObjects {
    objects: Vec<TrackedObject>,
}

impl TrackedObjects {
    /// Appends `entity`, or updates its class in place when already tracked.
    pub fn track(&mut self, entity: Entity, class_id: u32) {
        match self.objects.iter_mut().find(|object| object.entity == entity) {
            Some(existing) => existing.class_id = class_id,
            None => self.objects.push(TrackedObject { entity, class_id }),
        }
    }

    pub fn untrack(&mut self, entity: Entity) { self.objects.retain(|object| object.entity != entity); }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> { self.objects.iter() }

    pub fn len(&self) -> usize { self.objects.len() }

    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
}
