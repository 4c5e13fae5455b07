// bevy_dataset_label
// Object-detection dataset capture for Bevy providing:
// - Frustum visibility tests for tracked objects
// - Screen-space bounding boxes projected from mesh vertices
// - YOLO-style label files written alongside each captured image
// - Frames paired with the transforms they were rendered from
// - Timed and manually requested captures

use bevy::prelude::*;

mod camera;
mod capture;
mod components;
mod config;
mod dataset;
mod error;
mod events;
mod frame;
mod geometry;
mod label;
pub mod prelude;
mod projection;
mod support;
mod systems;
mod trigger;
mod visibility;
#[cfg(feature = "visualization")]
mod visualization;

// Public API - Components
pub use components::LabelCamera;
pub use components::LabelTarget;

// Public API - Events
pub use events::CaptureComplete;
pub use events::CaptureFrameRequested;
pub use events::RequestCapture;

// Public API - Configuration resources
pub use config::LabelConfig;
pub use config::TrackedObject;
pub use config::TrackedObjects;
pub use trigger::CaptureTrigger;

// Public API - Session and frame resources
pub use capture::CaptureSession;
pub use capture::PendingCapture;
pub use capture::PendingCaptures;
pub use frame::RenderedFrames;

// Public API - Labeling core (engine-agnostic)
pub use camera::CameraSnapshot;
pub use camera::FrustumPlanes;
pub use capture::CaptureObject;
pub use capture::CapturePlan;
pub use capture::CaptureReport;
pub use capture::SkippedObject;
pub use geometry::CameraView;
pub use geometry::MeshPart;
pub use geometry::MeshParts;
pub use geometry::ObjectGeometry;
pub use geometry::WorldAabb;
pub use geometry::WorldBounds;
pub use label::LABEL_DECIMALS;
pub use label::NormalizedLabel;
pub use label::format_value;
pub use projection::ScreenRect;
pub use projection::project_to_screen;
pub use projection::screen_rect;
pub use visibility::ObjectVisibility;
pub use visibility::SkipReason;
pub use visibility::is_visible;
pub use visibility::test_visibility;

// Public API - Persistence
pub use dataset::DatasetDirectory;
pub use dataset::ImageStore;
pub use dataset::LabelStore;
pub use error::CaptureError;
pub use frame::Frame;
pub use frame::FrameRequest;
pub use frame::FrameSource;

// Public API - ECS adapter
pub use support::GeometryQueries;
pub use support::camera_snapshot;

// Public API - Visualization
#[cfg(feature = "visualization")]
pub use visualization::LabelBoundsGizmo;
#[cfg(feature = "visualization")]
pub use visualization::LabelBoundsVisualizationConfig;
#[cfg(feature = "visualization")]
pub use visualization::LabelBoundsVisualizationPlugin;

// Internal - used by plugin, not for external use
use systems::complete_label_captures;
use systems::on_request_capture;
use systems::prepare_dataset;
use systems::request_capture_on_key;
use systems::run_label_capture;
use systems::track_label_target;
use systems::untrack_label_target;

/// Plugin that adds dataset capture and labeling
pub struct DatasetLabelPlugin;

impl Plugin for DatasetLabelPlugin {
    fn build(&self, app: &mut App) {
        app
            // Register observers for component lifecycle events
            .add_observer(track_label_target)
            .add_observer(untrack_label_target)
            // Register observers for custom events
            .add_observer(on_request_capture)
            // Add systems
            .add_systems(Startup, prepare_dataset)
            .add_systems(Update, request_capture_on_key)
            .add_systems(Last, (run_label_capture, complete_label_captures).chain())
            // Initialize resources
            .init_resource::<LabelConfig>()
            .init_resource::<CaptureTrigger>()
            .init_resource::<CaptureSession>()
            .init_resource::<TrackedObjects>()
            .init_resource::<PendingCaptures>()
            .init_resource::<RenderedFrames>();
    }
}
