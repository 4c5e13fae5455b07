//! Rendered frames and the source the capture pulls them from.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::error::CaptureError;

/// One rendered camera frame as tightly packed RGB8, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width:  u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CaptureError> {
        if pixels.len() != rgb_len(width, height) {
            return Err(CaptureError::InvalidFrame {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Drops the alpha channel of an RGBA8 buffer (screenshots and GPU readbacks).
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, CaptureError> {
        if rgba.len() != rgb_len(width, height) / 3 * 4 {
            return Err(CaptureError::InvalidFrame {
                width,
                height,
                len: rgba.len(),
            });
        }
        let pixels = rgba
            .chunks_exact(4)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub const fn width(&self) -> u32 { self.width }

    pub const fn height(&self) -> u32 { self.height }

    pub const fn size(&self) -> UVec2 { UVec2::new(self.width, self.height) }

    pub fn pixels(&self) -> &[u8] { &self.pixels }
}

fn rgb_len(width: u32, height: u32) -> usize { width as usize * height as usize * 3 }

/// Identifies the frame a capture was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct FrameRequest {
    /// Tag the host stores the rendered frame under
    pub id:       u64,
    /// Physical size the frame must have
    pub viewport: UVec2,
}

/// Produces the frame for a capture. Called at most once per capture, before anything is
/// written.
pub trait FrameSource {
    /// Returns the frame rendered for `request`, or `None` when it is not available.
    fn grab_frame(&mut self, request: &FrameRequest) -> Option<Frame>;
}

/// Frames pushed by the host app (from a screenshot or a render target readback), keyed by
/// the id of the `CaptureFrameRequested` event they answer.
#[derive(Resource, Debug, Default, Clone)]
pub struct RenderedFrames {
    frames: BTreeMap<u64, Frame>,
}

impl RenderedFrames {
    pub fn store(&mut self, request_id: u64, frame: Frame) { self.frames.insert(request_id, frame); }

    pub fn contains(&self, request_id: u64) -> bool { self.frames.contains_key(&request_id) }

    /// Drops every frame tagged below `request_id`
    pub fn discard_before(&mut self, request_id: u64) {
        self.frames = self.frames.split_off(&request_id);
    }

    pub fn clear(&mut self) { self.frames.clear(); }

    pub fn len(&self) -> usize { self.frames.len() }

    pub fn is_empty(&self) -> bool { self.frames.is_empty() }
}

impl FrameSource for RenderedFrames {
    fn grab_frame(&mut self, request: &FrameRequest) -> Option<Frame> {
        let Some(frame) = self.frames.remove(&request.id) else {
            warn!("No frame rendered for capture request {}. Skipping capture.", request.id);
            return None;
        };

        if frame.size() != request.viewport {
            warn!(
                "Frame for capture request {} is {}x{} but the camera viewport is {}x{}. \
                 Skipping capture.",
                request.id, frame.width, frame.height, request.viewport.x, request.viewport.y
            );
            return None;
        }

        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_drops_alpha() {
        let frame = Frame::from_rgba(2, 1, &[1, 2, 3, 255, 4, 5, 6, 0]).expect("valid size");
        assert_eq!(frame.pixels(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.size(), UVec2::new(2, 1));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(matches!(
            Frame::from_rgb(2, 2, vec![0; 11]),
            Err(CaptureError::InvalidFrame { len: 11, .. })
        ));
        assert!(Frame::from_rgba(2, 2, &[0; 12]).is_err());
    }

    fn request(id: u64, width: u32, height: u32) -> FrameRequest {
        FrameRequest {
            id,
            viewport: UVec2::new(width, height),
        }
    }

    #[test]
    fn frames_are_only_handed_to_their_own_request() {
        let mut frames = RenderedFrames::default();
        assert!(frames.grab_frame(&request(1, 2, 2)).is_none());

        frames.store(1, Frame::from_rgb(2, 2, vec![7; 12]).expect("valid size"));
        assert!(frames.grab_frame(&request(2, 2, 2)).is_none());
        assert_eq!(
            frames.grab_frame(&request(1, 2, 2)).map(|f| f.pixels()[0]),
            Some(7)
        );
        // taken by the first grab
        assert!(frames.is_empty());
    }

    #[test]
    fn frame_of_another_size_is_rejected() {
        let mut frames = RenderedFrames::default();
        frames.store(3, Frame::from_rgb(2, 2, vec![7; 12]).expect("valid size"));
        assert!(frames.grab_frame(&request(3, 4, 2)).is_none());
    }

    #[test]
    fn discarding_keeps_frames_from_the_given_request_on() {
        let mut frames = RenderedFrames::default();
        for id in 1..=4 {
            frames.store(id, Frame::from_rgb(1, 1, vec![id as u8; 3]).expect("valid size"));
        }

        frames.discard_before(3);

        assert_eq!(frames.len(), 2);
        assert!(!frames.contains(2));
        assert!(frames.contains(3));
        assert!(frames.contains(4));
    }
}
