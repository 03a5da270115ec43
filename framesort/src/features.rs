//! The per-frame statistics the records are ranked by.

pub mod contours;
pub mod edges;
pub mod histogram;

use framesort_common::{
    args,
    utils::{imgutils::grayscale, math::Variance},
};
use image::RgbImage;

use crate::record::{ContourStats, FrameFeatures};

use self::{
    contours::{contour_area, find_contours},
    edges::Canny,
    histogram::Histogram,
};

args! {
    #[derive(Copy, Clone)]
    Features {
        histogram_args: Histogram;
        canny_args: Canny;
    }
}

impl Features {
    pub fn extract(&self, frame: &RgbImage) -> FrameFeatures {
        let (hue, saturation) = self.histogram_args.hue_and_saturation(frame);
        FrameFeatures {
            hue,
            saturation,
            contours: self.contour_stats(frame),
        }
    }

    fn contour_stats(&self, frame: &RgbImage) -> ContourStats {
        let edges = self.canny_args.edges(&grayscale(frame));
        let areas: Variance = find_contours(&edges)
            .iter()
            .map(|contour| contour_area(contour))
            .collect();

        ContourStats {
            area_std: areas.std_dev(),
            count: areas.count(),
        }
    }
}
