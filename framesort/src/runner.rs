//! Fans the videos of a target out to one worker thread each and collects what they
//! produce.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    sync::{mpsc, Mutex, MutexGuard, PoisonError},
};

use framesort_common::utils::{
    fsutils::{all_files, has_extension},
    workers::{scoped_workers, FinishedWorker},
};

use crate::{
    error::JobError,
    job::{ExtractionJob, JobArgs, JobReport},
    record::FeatureRecord,
};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi"];
pub const DEFAULT_PREFIX: &str = "frame";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single video, its thumbnails are named with `prefix` as is.
    File { path: PathBuf, prefix: String },
    /// Every supported video directly inside the directory.
    Directory(PathBuf),
}

/// One video to analyze and what to call its thumbnails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub video: PathBuf,
    pub prefix: String,
}

impl Target {
    /// A directory target if `path` is a directory, a file target otherwise.
    pub fn from_path(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::File {
                path,
                prefix: prefix.into(),
            }
        }
    }

    pub fn resolve(&self) -> io::Result<Vec<JobSpec>> {
        match self {
            Self::File { path, prefix } => Ok(vec![JobSpec {
                video: path.clone(),
                prefix: prefix.clone(),
            }]),
            Self::Directory(dir) => {
                let mut videos: Vec<PathBuf> = all_files([dir])?;
                videos.retain(|path| has_extension(path, SUPPORTED_EXTENSIONS));
                videos.sort();
                Ok(videos
                    .into_iter()
                    .map(|video| JobSpec {
                        prefix: directory_prefix(&video),
                        video,
                    })
                    .collect())
            }
        }
    }
}

/// File names are unique within a directory, so this is too.
fn directory_prefix(video: &Path) -> String {
    let name = video
        .file_name()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default();
    format!("{name}_")
}

/// The single outcome of a job.
#[derive(Debug)]
pub enum JobEvent {
    /// The job ran, possibly aborting halfway through.
    Finished(JobReport),
    /// The job could not even start.
    Failed { source: PathBuf, error: JobError },
}

impl JobEvent {
    pub fn source(&self) -> &Path {
        match self {
            Self::Finished(report) => &report.source,
            Self::Failed { source, .. } => source,
        }
    }
}

/// Where workers deliver their events. Called concurrently from all workers.
pub trait ResultsSink: Sync {
    fn deliver(&self, event: JobEvent);
}

impl ResultsSink for mpsc::Sender<JobEvent> {
    fn deliver(&self, event: JobEvent) {
        if let Err(mpsc::SendError(event)) = self.send(event) {
            log::warn!("Nobody is listening for the results of {}", event.source().display());
        }
    }
}

impl ResultsSink for mpsc::SyncSender<JobEvent> {
    fn deliver(&self, event: JobEvent) {
        if let Err(mpsc::SendError(event)) = self.send(event) {
            log::warn!("Nobody is listening for the results of {}", event.source().display());
        }
    }
}

pub type Observer = Box<dyn FnMut(&JobEvent) + Send>;

/// Collects the records of all jobs in the order they arrive.
#[derive(Default)]
pub struct RecordStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    records: Vec<FeatureRecord>,
    failed: Vec<PathBuf>,
    aborted: Vec<PathBuf>,
    observers: Vec<Observer>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `observer` is called with every event delivered from now on, before its records
    /// are added.
    pub fn observe(&self, observer: impl FnMut(&JobEvent) + Send + 'static) {
        self.lock().observers.push(Box::new(observer));
    }

    pub fn snapshot(&self) -> Vec<FeatureRecord> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The videos whose jobs never started.
    pub fn failed(&self) -> Vec<PathBuf> {
        self.lock().failed.clone()
    }

    /// The videos whose jobs stopped before their last frame.
    pub fn aborted(&self) -> Vec<PathBuf> {
        self.lock().aborted.clone()
    }

    pub fn into_records(self) -> Vec<FeatureRecord> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .records
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultsSink for RecordStore {
    fn deliver(&self, event: JobEvent) {
        let mut inner = self.lock();
        inner.observers.iter_mut().for_each(|observer| observer(&event));
        match event {
            JobEvent::Finished(report) => {
                if report.abort.is_some() {
                    inner.aborted.push(report.source);
                }
                inner.records.extend(report.records);
            }
            JobEvent::Failed { source, .. } => inner.failed.push(source),
        }
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("RecordStore")
            .field("records", &inner.records.len())
            .field("failed", &inner.failed)
            .field("aborted", &inner.aborted)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub launched: usize,
    pub panicked: usize,
}

/// Runs every job of a target at the same time, one thread each.
#[derive(Debug, Clone)]
pub struct JobRunner {
    pub out_dir: PathBuf,
    pub args: JobArgs,
}

impl JobRunner {
    pub fn new(out_dir: impl Into<PathBuf>, args: JobArgs) -> Self {
        Self {
            out_dir: out_dir.into(),
            args,
        }
    }

    /// Returns once every job has delivered its event to `sink`. Only failing to list a
    /// directory target is an error, everything that goes wrong in a job is reported
    /// through its event.
    pub fn run<S>(&self, target: &Target, sink: &S) -> io::Result<RunSummary>
    where
        S: ResultsSink + ?Sized,
    {
        let specs = target.resolve()?;
        if specs.is_empty() {
            log::warn!("Found no videos to process in {target:?}");
        }

        let finished = scoped_workers(|scope| {
            for spec in &specs {
                scope.spawn("job", move || self.run_one(spec, sink));
            }
        });

        let launched = finished.len();
        let completed = finished
            .into_iter()
            .filter_map(FinishedWorker::ok_or_log)
            .count();
        let summary = RunSummary {
            launched,
            panicked: launched - completed,
        };
        Ok(summary)
    }

    fn run_one<S>(&self, spec: &JobSpec, sink: &S)
    where
        S: ResultsSink + ?Sized,
    {
        let event = match ExtractionJob::new(&spec.video, &self.out_dir, &spec.prefix, &self.args)
        {
            Ok(job) => JobEvent::Finished(job.run()),
            Err(error) => {
                log::error!("Could not start on {}: {}", spec.video.display(), error);
                JobEvent::Failed {
                    source: spec.video.clone(),
                    error,
                }
            }
        };
        sink.deliver(event);
    }
}
