use std::time::Duration;

use framesort_common::args;

use crate::{
    error::DegenerateSamplingError,
    video_source::{FrameIndex, VideoMetadata},
};

args! {
    #[derive(Clone)]
    Sampling {
        "Time between analyzed frames"
        query_interval: humantime::Duration = Duration::from_secs(100).into();
    }
}

impl Sampling {
    pub fn indices(
        &self,
        metadata: &VideoMetadata,
    ) -> Result<SampleIndices, DegenerateSamplingError> {
        indices_to_sample(metadata, *self.query_interval)
    }
}

/// The frame indices to analyze, `step, 2*step, ...` for as long as they are within the
/// video.
#[derive(Debug)]
pub struct SampleIndices {
    step: FrameIndex,
    next: FrameIndex,
    frame_count: FrameIndex,
}

impl SampleIndices {
    pub fn step(&self) -> FrameIndex {
        self.step
    }

    /// How many indices are left to be produced.
    pub fn remaining(&self) -> usize {
        if self.next >= self.frame_count {
            return 0;
        }
        ((self.frame_count - self.next - 1) / self.step + 1)
            .try_into()
            .unwrap_or(usize::MAX)
    }
}

impl Iterator for SampleIndices {
    type Item = FrameIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.frame_count {
            return None;
        }
        let index = self.next;
        self.next = self.next.saturating_add(self.step);
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl std::iter::FusedIterator for SampleIndices {}

/// Plans which frames of a video to look at, one every `interval`. Fails if the frame
/// rate and interval round to less than one frame per step, since such a plan would
/// never get anywhere.
pub fn indices_to_sample(
    metadata: &VideoMetadata,
    interval: Duration,
) -> Result<SampleIndices, DegenerateSamplingError> {
    let step = (metadata.frame_rate * interval.as_secs_f64()).round();
    if !step.is_finite() || step < 1.0 {
        return Err(DegenerateSamplingError {
            frame_rate: metadata.frame_rate,
            interval,
        });
    }

    let step = step as FrameIndex;
    Ok(SampleIndices {
        step,
        next: step,
        frame_count: metadata.frame_count,
    })
}
