mod common;

use std::{path::PathBuf, time::Duration};

use common::*;
use framesort::{
    error::{DecodeError, OpenError},
    job::{ExtractionJob, JobArgs, JobState},
    rank::{rank, SortKey},
    runner::{JobEvent, JobRunner, RecordStore, Target, DEFAULT_PREFIX},
    sampler::Sampling,
    video_source::{FrameSource, VideoSource},
};

fn every_second() -> JobArgs {
    JobArgs::default()
        .sampling_args(Sampling::default().query_interval(Duration::from_secs(1).into()))
}

#[test]
fn test_open_reads_metadata() -> Result<(), OpenError> {
    let source = VideoSource::open(create_test_video())?;
    let meta = source.metadata();
    assert_eq!(TEST_VIDEO_FRAMES, meta.frame_count);
    assert!((meta.frame_rate - TEST_VIDEO_FPS).abs() < 1e-6);
    assert_eq!(
        (TEST_VIDEO_WIDTH, TEST_VIDEO_HEIGHT),
        (meta.width, meta.height)
    );
    Ok(())
}

#[test]
fn test_open_missing_file() {
    let missing = cargo_tmpdir().join("there-is-no-such-video.mp4");
    assert!(matches!(
        VideoSource::open(&missing),
        Err(OpenError::Container { path, .. }) if path == missing
    ));
}

#[test]
fn test_decode_any_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = VideoSource::open(create_test_video())?;
    for index in [150, 0, 299, 31, 30] {
        let frame = source.seek_and_decode(index)?;
        assert_eq!((TEST_VIDEO_WIDTH, TEST_VIDEO_HEIGHT), frame.dimensions());
    }
    Ok(())
}

#[test]
fn test_decode_out_of_range() -> Result<(), OpenError> {
    let mut source = VideoSource::open(create_test_video())?;
    assert!(matches!(
        source.seek_and_decode(TEST_VIDEO_FRAMES),
        Err(DecodeError::OutOfRange {
            index: 300,
            frame_count: 300
        })
    ));
    assert!(source.seek_and_decode(10_000).is_err());
    Ok(())
}

#[test]
fn test_one_record_per_second() {
    let out = tmp_dir();
    let job = ExtractionJob::new(create_test_video(), out.path(), "frame", &every_second());
    let report = job.expect("the test video opens").run();

    assert_eq!(JobState::Completed, report.state);
    let indices: Vec<u64> = report.records.iter().map(|r| r.frame_index()).collect();
    assert_eq!((30..=270).step_by(30).collect::<Vec<_>>(), indices);

    for (seq, record) in report.records.iter().enumerate() {
        let expected = out.path().join(format!("frame{seq}.png"));
        assert_eq!(expected, record.thumbnail());
        let thumb = image::open(&expected).expect("the thumbnail is a png");
        assert_eq!((80, 60), (thumb.width(), thumb.height()));

        assert!((record.timestamp_ms() - 1000.0 * (seq as f64 + 1.0)).abs() < 1e-6);
        assert_eq!(Duration::from_secs(seq as u64 + 1), record.timestamp());
        assert!(record.hue().std.is_finite());
        assert!(record.saturation().mean > 0.0);
        assert!(record.contours().count > 0);
    }
    assert!(!out.path().join("frame9.png").exists());
}

#[test]
fn test_directory_run() {
    let videos = tmp_dir();
    let out = tmp_dir();
    copy_test_video(videos.path(), "clip.mp4");
    std::fs::write(videos.path().join("clip.txt"), "not a video").unwrap();

    let store = RecordStore::new();
    let summary = JobRunner::new(out.path(), every_second())
        .run(&Target::from_path(videos.path(), DEFAULT_PREFIX), &store)
        .unwrap();

    assert_eq!(1, summary.launched);
    assert_eq!(0, summary.panicked);
    assert!(store.failed().is_empty());
    assert!(store.aborted().is_empty());

    let records = store.snapshot();
    assert_eq!(9, records.len());
    for (seq, record) in records.iter().enumerate() {
        assert_eq!(videos.path().join("clip.mp4"), record.source());
        assert_eq!(
            out.path().join(format!("clip.mp4_{seq}.png")),
            record.thumbnail()
        );
    }

    let view = rank(&records, SortKey::ContourAreaSpread);
    assert_eq!(9, view.len());
    assert!(view
        .records
        .windows(2)
        .all(|w| w[0].contours().area_std <= w[1].contours().area_std));
}

#[test]
fn test_several_videos_at_once() {
    let videos = tmp_dir();
    let out = tmp_dir();
    copy_test_video(videos.path(), "a.mp4");
    copy_test_video(videos.path(), "b.MP4");
    std::fs::write(videos.path().join("c.mkv"), "broken").unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let summary = JobRunner::new(out.path(), every_second())
        .run(&Target::Directory(videos.path().to_path_buf()), &tx)
        .unwrap();
    drop(tx);
    assert_eq!(3, summary.launched);

    let mut finished: Vec<PathBuf> = Vec::new();
    let mut failed: Vec<PathBuf> = Vec::new();
    for event in rx {
        match event {
            JobEvent::Finished(report) => {
                assert_eq!(9, report.records.len());
                finished.push(report.source);
            }
            JobEvent::Failed { source, .. } => failed.push(source),
        }
    }
    finished.sort();
    assert_eq!(
        vec![videos.path().join("a.mp4"), videos.path().join("b.MP4")],
        finished
    );
    assert_eq!(vec![videos.path().join("c.mkv")], failed);
    assert_eq!(18, std::fs::read_dir(out.path()).unwrap().count());
}
