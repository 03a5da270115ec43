use std::num::NonZeroU32;

use framesort_common::{
    args,
    utils::{imgutils::rgb_to_hsv, math::Variance},
};
use image::RgbImage;

use crate::record::HistogramStats;

args! {
    #[derive(Copy, Clone)]
    Histogram {
        "Number of bins in the hue and saturation histograms"
        histogram_bins: NonZeroU32 = NonZeroU32::new(128).unwrap();
    }
}

impl Histogram {
    /// Statistics of the hue and saturation histograms of the frame, in that order.
    pub fn hue_and_saturation(&self, frame: &RgbImage) -> (HistogramStats, HistogramStats) {
        let bins = self.bins();
        let mut hue = vec![0.0; bins];
        let mut saturation = vec![0.0; bins];

        frame.pixels().for_each(|pixel| {
            let [h, s, _] = rgb_to_hsv(*pixel);
            hue[self.bin_of(h)] += 1.0;
            saturation[self.bin_of(s)] += 1.0;
        });

        normalize_l2(&mut hue);
        normalize_l2(&mut saturation);
        (bin_stats(&hue), bin_stats(&saturation))
    }

    fn bins(&self) -> usize {
        self.histogram_bins
            .get()
            .try_into()
            .expect("a u32 fits in a usize")
    }

    /// The bins cover `[0, 256)` evenly.
    fn bin_of(&self, value: u8) -> usize {
        usize::from(value) * self.bins() / (usize::from(u8::MAX) + 1)
    }
}

/// Scales the histogram to unit euclidean length, which makes it independent of the
/// number of pixels. An empty histogram is left as is.
pub fn normalize_l2(hist: &mut [f64]) {
    let norm = hist.iter().map(|count| count * count).sum::<f64>().sqrt();
    if norm > 0.0 {
        hist.iter_mut().for_each(|count| *count /= norm);
    }
}

/// Mean and population standard deviation of the bin values.
pub fn bin_stats(hist: &[f64]) -> HistogramStats {
    let var: Variance = hist.iter().copied().collect();
    HistogramStats {
        mean: var.mean(),
        std: var.std_dev(),
    }
}
