use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::video_source::{FrameIndex, VideoMetadata};

/// Statistics over the bins of a normalized histogram of one color channel.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistogramStats {
    pub mean: f64,
    pub std: f64,
}

/// Statistics over the areas of all contours found in a frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContourStats {
    pub area_std: f64,
    pub count: usize,
}

/// All descriptors computed for one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameFeatures {
    pub hue: HistogramStats,
    pub saturation: HistogramStats,
    pub contours: ContourStats,
}

/// One analyzed frame of a video, together with where its thumbnail was written.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeatureRecord {
    source: PathBuf,
    frame_index: FrameIndex,
    timestamp_ms: f64,
    thumbnail: PathBuf,
    hue: HistogramStats,
    saturation: HistogramStats,
    contours: ContourStats,
}

impl FeatureRecord {
    pub fn new(
        source: impl Into<PathBuf>,
        metadata: &VideoMetadata,
        frame_index: FrameIndex,
        thumbnail: impl Into<PathBuf>,
        features: FrameFeatures,
    ) -> Self {
        let FrameFeatures {
            hue,
            saturation,
            contours,
        } = features;
        Self {
            source: source.into(),
            frame_index,
            timestamp_ms: metadata.timestamp_ms(frame_index),
            thumbnail: thumbnail.into(),
            hue,
            saturation,
            contours,
        }
    }

    /// The video this frame came from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn frame_index(&self) -> FrameIndex {
        self.frame_index
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// Where a player should seek to in order to show this frame
    pub fn timestamp(&self) -> Duration {
        Duration::from_secs_f64(self.timestamp_ms.max(0.0) / 1000.0)
    }

    pub fn thumbnail(&self) -> &Path {
        &self.thumbnail
    }

    pub fn hue(&self) -> HistogramStats {
        self.hue
    }

    pub fn saturation(&self) -> HistogramStats {
        self.saturation
    }

    pub fn contours(&self) -> ContourStats {
        self.contours
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn features(hue_std: f64) -> FrameFeatures {
        FrameFeatures {
            hue: HistogramStats {
                mean: 0.1,
                std: hue_std,
            },
            saturation: HistogramStats {
                mean: 0.1,
                std: 0.0,
            },
            contours: ContourStats {
                area_std: 0.0,
                count: 0,
            },
        }
    }

    #[test]
    fn timestamp_follows_the_frame_rate() {
        let meta = VideoMetadata {
            frame_count: 1000,
            frame_rate: 25.0,
            width: 640,
            height: 480,
        };
        let rec = FeatureRecord::new("a.mkv", &meta, 50, "out/frame0.png", features(0.2));
        assert!((rec.timestamp_ms() - 2000.0).abs() < 1e-9);
        assert_eq!(Duration::from_secs(2), rec.timestamp());
        assert_eq!(Path::new("a.mkv"), rec.source());
        assert_eq!(Path::new("out/frame0.png"), rec.thumbnail());
        assert_eq!(0.2, rec.hue().std);
    }

    #[test]
    fn ron_output() {
        let meta = VideoMetadata {
            frame_count: 100,
            frame_rate: 10.0,
            width: 8,
            height: 8,
        };
        let rec = FeatureRecord::new("v.mp4", &meta, 10, "t0.png", features(0.5));
        let text = ron::ser::to_string(&rec).unwrap();
        assert!(text.contains("frame_index:10"), "{text}");
        let back: FeatureRecord = ron::de::from_str(&text).unwrap();
        assert_eq!(rec, back);
    }
}
