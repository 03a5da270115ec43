//! Analysis of a single video, from opening it to the last thumbnail.

use std::path::{Path, PathBuf};

use framesort_common::args;
use image::RgbImage;

use crate::{
    error::{JobAbort, JobError},
    features::Features,
    record::FeatureRecord,
    sampler::{SampleIndices, Sampling},
    thumbnail::{Thumbnail, ThumbnailWriter},
    video_source::{FrameIndex, FrameSource, VideoSource},
};

args! {
    #[derive(Clone)]
    JobArgs {
        sampling_args: Sampling;
        features_args: Features;
        thumbnail_args: Thumbnail;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Everything a job produced. On an abort, `records` holds the records of the frames
/// before the failing one.
#[derive(Debug)]
pub struct JobReport {
    pub source: PathBuf,
    pub state: JobState,
    pub records: Vec<FeatureRecord>,
    pub abort: Option<(FrameIndex, JobAbort)>,
}

impl JobReport {
    pub fn is_complete(&self) -> bool {
        self.state == JobState::Completed
    }
}

pub struct ExtractionJob<S = VideoSource> {
    source: S,
    plan: SampleIndices,
    features: Features,
    thumbnails: ThumbnailWriter,
    state: JobState,
}

impl ExtractionJob<VideoSource> {
    /// Opens the video and plans the whole job. Nothing is decoded yet.
    pub fn new(
        video: impl AsRef<Path>,
        out_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        args: &JobArgs,
    ) -> Result<Self, JobError> {
        let source = VideoSource::open(video)?;
        Self::with_source(source, out_dir, prefix, args)
    }
}

impl<S: FrameSource> ExtractionJob<S> {
    pub fn with_source(
        source: S,
        out_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        args: &JobArgs,
    ) -> Result<Self, JobError> {
        let metadata = *source.metadata();
        let plan = args.sampling_args.indices(&metadata)?;
        let size = args
            .thumbnail_args
            .size_of(metadata.width, metadata.height);

        log::debug!(
            "Planned {} frames with a step of {} for {}",
            plan.remaining(),
            plan.step(),
            source.path().display()
        );

        Ok(Self {
            source,
            plan,
            features: args.features_args,
            thumbnails: ThumbnailWriter::new(out_dir, prefix, size),
            state: JobState::Idle,
        })
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Analyzes every planned frame in order, stopping at the first one that fails.
    pub fn run(mut self) -> JobReport {
        self.state = JobState::Running;
        let path = self.source.path().to_path_buf();
        log::info!("Processing {}", path.display());

        let mut records = Vec::with_capacity(self.plan.remaining());
        let mut abort = None;
        while let Some(index) = self.plan.next() {
            match self.analyze(index, records.len()) {
                Ok(record) => {
                    log::debug!("{record:?}");
                    records.push(record);
                }
                Err(e) => {
                    log::error!(
                        "Aborting {} at frame {} after {} records: {}",
                        path.display(),
                        index,
                        records.len(),
                        e
                    );
                    abort = Some((index, e));
                    break;
                }
            }
        }

        self.state = if abort.is_some() {
            JobState::Aborted
        } else {
            log::info!("Done with {}, {} records", path.display(), records.len());
            JobState::Completed
        };

        JobReport {
            source: path,
            state: self.state,
            records,
            abort,
        }
    }

    fn analyze(&mut self, index: FrameIndex, seq: usize) -> Result<FeatureRecord, JobAbort> {
        let frame: RgbImage = self.source.seek_and_decode(index)?;
        let features = self.features.extract(&frame);
        let thumbnail = self.thumbnails.write(&frame, seq)?;
        Ok(FeatureRecord::new(
            self.source.path(),
            self.source.metadata(),
            index,
            thumbnail,
            features,
        ))
    }
}
