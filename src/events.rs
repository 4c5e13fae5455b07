//! Capture request and lifecycle events.

use bevy::prelude::*;

use crate::label::NormalizedLabel;

/// Requests one capture on the next step. Repeated requests before that step collapse
/// into a single capture.
#[derive(Event, Reflect, Debug, Default, Clone, Copy)]
#[reflect(Event, FromReflect)]
pub struct RequestCapture;

/// Asks the host to render the `LabelCamera` view and store it in `RenderedFrames` under
/// `request_id`.
///
/// Triggered in `Last`, after the capture was measured against this frame's transforms. A
/// screenshot requested from an observer of this event is rendered from that same state.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct CaptureFrameRequested {
    #[event_target]
    pub camera_entity: Entity,
    pub request_id:    u64,
    /// Physical size the stored frame must have
    pub viewport:      UVec2,
}

/// Fired after a capture wrote an image and its label file.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct CaptureComplete {
    #[event_target]
    pub camera_entity: Entity,
    pub image_index:   u64,
    pub labels:        Vec<NormalizedLabel>,
}
