//! Errors surfaced by dataset persistence.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failures while persisting a capture. Per-object outcomes (disabled, missing geometry,
/// outside the frustum) are not errors; see [`crate::SkipReason`].
#[derive(Debug)]
pub enum CaptureError {
    /// The dataset `images/` or `labels/` directory could not be created
    CreateDirectory { path: PathBuf, source: io::Error },
    /// Encoding or writing `<index>.png` failed
    WriteImage {
        path:   PathBuf,
        source: image::ImageError,
    },
    /// Writing `<index>.txt` failed
    WriteLabels { path: PathBuf, source: io::Error },
    /// Pixel buffer length does not match `width * height * 3`
    InvalidFrame {
        width:  u32,
        height: u32,
        len:    usize,
    },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDirectory { path, source } => {
                write!(f, "failed to create directory {}: {source}", path.display())
            },
            Self::WriteImage { path, source } => {
                write!(f, "failed to write image {}: {source}", path.display())
            },
            Self::WriteLabels { path, source } => {
                write!(f, "failed to write labels {}: {source}", path.display())
            },
            Self::InvalidFrame { width, height, len } => write!(
                f,
                "frame buffer of {len} bytes does not hold {width}x{height} RGB pixels"
            ),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } | Self::WriteLabels { source, .. } => {
                Some(source)
            },
            Self::WriteImage { source, .. } => Some(source),
            Self::InvalidFrame { .. } => None,
        }
    }
}
