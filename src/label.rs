//! Normalized label records and their text encoding.
//!
//! A label line is `class_id center_x center_y width height`, each float written with at
//! most [`LABEL_DECIMALS`] decimal digits and `.` as the separator.

use std::fmt;

use bevy::prelude::*;

use crate::projection::ScreenRect;

/// Maximum number of decimal digits written per value
pub const LABEL_DECIMALS: i32 = 4;

/// Bounding box of one object as fractions of the image size.
///
/// `center_y` is measured from the bottom edge. Values are not clamped, so a box that
/// extends past the viewport keeps its true extent.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct NormalizedLabel {
    pub class_id: u32,
    pub center_x: f32,
    pub center_y: f32,
    pub width:    f32,
    pub height:   f32,
}

impl NormalizedLabel {
    pub fn from_screen_rect(rect: &ScreenRect, class_id: u32, viewport: UVec2) -> Self {
        let size = viewport.as_vec2();
        let center = rect.center();
        Self {
            class_id,
            center_x: center.x / size.x,
            center_y: 1.0 - center.y / size.y,
            width: rect.width / size.x,
            height: rect.height / size.y,
        }
    }

    /// Inverse of [`Self::from_screen_rect`].
    pub fn to_screen_rect(&self, viewport: UVec2) -> ScreenRect {
        let size = viewport.as_vec2();
        let width = self.width * size.x;
        let height = self.height * size.y;
        ScreenRect::new(
            self.center_x * size.x - width * 0.5,
            (1.0 - self.center_y) * size.y - height * 0.5,
            width,
            height,
        )
    }
}

impl fmt::Display for NormalizedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            format_value(self.center_x),
            format_value(self.center_y),
            format_value(self.width),
            format_value(self.height),
        )
    }
}

/// Formats a value with at most [`LABEL_DECIMALS`] decimals, rounding half away from zero
/// and trimming trailing zeros (`0.5`, `0.0938`, `1`, `-0.0313`).
pub fn format_value(value: f32) -> String {
    let scale = 10_f64.powi(LABEL_DECIMALS);
    let rounded = (f64::from(value) * scale).round() / scale;
    if rounded == 0.0 {
        // also folds -0.0
        return "0".to_string();
    }
    rounded.to_string()
}
