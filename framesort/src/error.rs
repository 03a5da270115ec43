extern crate ffmpeg_next as ffmpeg;

use std::{path::PathBuf, time::Duration};

use crate::video_source::FrameIndex;

/// The video could not be opened at all, no job is started for it.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("failed to initialize ffmpeg")]
    Init(#[source] ffmpeg::Error),
    #[error("failed to open the container {path:?}")]
    Container {
        path: PathBuf,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("{path:?} does not have a video stream")]
    NoVideoStream { path: PathBuf },
    #[error("no usable video decoder for {path:?}")]
    Decoder {
        path: PathBuf,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("{path:?} reports zero frames")]
    NoFrames { path: PathBuf },
}

/// The frame rate and query interval don't give a step of at least one frame.
#[derive(Debug, thiserror::Error)]
#[error("sampling every {interval:?} at {frame_rate} fps does not advance a single frame")]
pub struct DegenerateSamplingError {
    pub frame_rate: f64,
    pub interval: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame {index} is out of range, the video has {frame_count} frames")]
    OutOfRange {
        index: FrameIndex,
        frame_count: FrameIndex,
    },
    #[error("the stream ended before frame {index}")]
    EndOfStream { index: FrameIndex },
    #[error("ffmpeg failed while decoding frame {index}")]
    Ffmpeg {
        index: FrameIndex,
        #[source]
        source: ffmpeg::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to write the thumbnail {path:?}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// Why a job never started.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error(transparent)]
    DegenerateSampling(#[from] DegenerateSamplingError),
}

/// Why a running job stopped early.
#[derive(Debug, thiserror::Error)]
pub enum JobAbort {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Write(#[from] WriteError),
}
