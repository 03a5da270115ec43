// NOTE: every test will complain about the functions it doesn't use
#![allow(unused)]

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::Once,
};

use tempfile::TempDir;

pub const TEST_VIDEO_FRAMES: u64 = 300;
pub const TEST_VIDEO_FPS: f64 = 30.0;
pub const TEST_VIDEO_WIDTH: u32 = 320;
pub const TEST_VIDEO_HEIGHT: u32 = 240;

/// Returns cargo's tmpdir
pub fn cargo_tmpdir() -> PathBuf {
    PathBuf::from(option_env!("CARGO_TARGET_TMPDIR").expect("no cargo tmpdir???"))
}

/// Returns a fresh directory inside cargo's tmpdir, removed when dropped
pub fn tmp_dir() -> TempDir {
    tempfile::tempdir_in(cargo_tmpdir()).expect("could not create temporary dir")
}

/// A 10 second, 30 fps, 320x240 video, created once per test binary
pub fn create_test_video() -> PathBuf {
    let tmpvideo = cargo_tmpdir().join("framesort-testvideo.mp4");

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::fs::remove_file(&tmpvideo).ok();
        let status = std::process::Command::new("ffmpeg")
            .args([
                "-f",
                "lavfi",
                "-i",
                "testsrc=duration=10:rate=30:size=320x240",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(&tmpvideo)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .status()
            .expect("failed to execute ffmpeg");
        assert!(status.success(), "ffmpeg could not create the test video");
    });

    tmpvideo
}

/// Copies the test video into `dir` as `name`
pub fn copy_test_video(dir: &Path, name: &str) -> PathBuf {
    let dst = dir.join(name);
    std::fs::copy(create_test_video(), &dst).expect("could not copy the test video");
    dst
}
