use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use framesort_common::{args, utils::imgutils::resize_area};
use image::{ImageFormat, RgbImage};

use crate::error::WriteError;

args! {
    #[derive(Copy, Clone)]
    Thumbnail {
        "Thumbnails are this many times smaller than the video in each dimension"
        thumbnail_shrink: NonZeroU32 = NonZeroU32::new(4).unwrap();
    }
}

impl Thumbnail {
    pub fn size_of(&self, width: u32, height: u32) -> (u32, u32) {
        thumbnail_size(width, height, self.thumbnail_shrink)
    }
}

/// Each dimension divided by `shrink`, rounded to the nearest integer but never zero.
pub fn thumbnail_size(width: u32, height: u32, shrink: NonZeroU32) -> (u32, u32) {
    let shrink = shrink.get();
    let scale = |dim: u32| ((dim + shrink / 2) / shrink).max(1);
    (scale(width), scale(height))
}

/// Writes the thumbnails of a single job, `{prefix}{seq}.png` in the output directory.
#[derive(Debug, Clone)]
pub struct ThumbnailWriter {
    out_dir: PathBuf,
    prefix: String,
    size: (u32, u32),
}

impl ThumbnailWriter {
    pub fn new(out_dir: impl Into<PathBuf>, prefix: impl Into<String>, size: (u32, u32)) -> Self {
        Self {
            out_dir: out_dir.into(),
            prefix: prefix.into(),
            size,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn path_for(&self, seq: usize) -> PathBuf {
        self.out_dir.join(format!("{}{}.png", self.prefix, seq))
    }

    pub fn write(&self, frame: &RgbImage, seq: usize) -> Result<PathBuf, WriteError> {
        let path = self.path_for(seq);
        let (width, height) = self.size;
        resize_area(frame, width, height)
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| WriteError {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

pub fn write_thumbnail(
    frame: &RgbImage,
    out_dir: &Path,
    prefix: &str,
    seq: usize,
    size: (u32, u32),
) -> Result<PathBuf, WriteError> {
    ThumbnailWriter::new(out_dir, prefix, size).write(frame, seq)
}
