//! Convenient re-exports for common types and traits

pub use crate::DatasetLabelPlugin;
pub use crate::capture::CaptureSession;
pub use crate::components::LabelCamera;
pub use crate::components::LabelTarget;
pub use crate::config::LabelConfig;
pub use crate::config::TrackedObjects;
pub use crate::events::CaptureComplete;
pub use crate::events::CaptureFrameRequested;
pub use crate::events::RequestCapture;
pub use crate::frame::Frame;
pub use crate::frame::RenderedFrames;
pub use crate::label::NormalizedLabel;
pub use crate::trigger::CaptureTrigger;
