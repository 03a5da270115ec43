//! Opening videos and decoding single frames out of them.

pub mod ffmpeg_source;

use std::path::Path;

use image::RgbImage;

use crate::error::DecodeError;

pub use ffmpeg_source::VideoSource;

/// An absolute frame number, counted from the first frame of the video stream.
pub type FrameIndex = u64;

/// What is known about a video right after it has been opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMetadata {
    pub frame_count: FrameIndex,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    /// Milliseconds from the start of the video to the frame at `index`.
    pub fn timestamp_ms(&self, index: FrameIndex) -> f64 {
        (index as f64 / self.frame_rate) * 1000.0
    }
}

/// Something frames can be pulled out of by index, normally a [`VideoSource`].
pub trait FrameSource {
    fn path(&self) -> &Path;

    fn metadata(&self) -> &VideoMetadata;

    /// Decodes the frame at `index`. Every call decodes from scratch.
    fn seek_and_decode(&mut self, index: FrameIndex) -> Result<RgbImage, DecodeError>;
}
