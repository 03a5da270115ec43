use image::{GrayImage, ImageBuffer, Rgb, RgbImage};

pub use image::imageops::colorops::grayscale;

pub const WHITE: u8 = u8::MAX;
pub const BLACK: u8 = u8::MIN;

/// Hue is stored as half degrees to fit in a byte, so it is always below this.
pub const HUE_RANGE: u8 = 180;

/// Converts a pixel to 8-bit HSV, using the same conventions as OpenCV: hue in
/// `[0, 180)`, saturation and value in `[0, 255]`.
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v == 0 { 0 } else { (diff * 255 + v / 2) / v };

    let h = if diff == 0 {
        0
    } else {
        let sixths = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let h = (f64::from(sixths) * 30.0 / f64::from(diff)).round() as i32;
        if h < 0 {
            h + i32::from(HUE_RANGE)
        } else {
            h
        }
    };

    [
        h.try_into().expect("hue is in [0, 180)"),
        s.try_into().expect("saturation is in [0, 255]"),
        v.try_into().expect("value is in [0, 255]"),
    ]
}

/// Shrinks (or grows) the image by averaging the area each destination pixel covers in
/// the source, like OpenCV's `INTER_AREA`.
pub fn resize_area(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    assert!(width > 0 && height > 0, "can't resize to an empty image");
    let xs = area_weights(img.width(), width);
    let ys = area_weights(img.height(), height);

    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0.0f64; 3];
        for &(sy, wy) in &ys[y as usize] {
            for &(sx, wx) in &xs[x as usize] {
                let pixel = img.get_pixel(sx, sy);
                let weight = wx * wy;
                acc.iter_mut()
                    .zip(pixel.0)
                    .for_each(|(acc, channel)| *acc += f64::from(channel) * weight);
            }
        }
        Rgb(acc.map(|c| c.round().clamp(0.0, 255.0) as u8))
    })
}

/// For every destination index, the source indices it covers together with the
/// fraction of the destination pixel each one makes up.
fn area_weights(src: u32, dst: u32) -> Vec<Vec<(u32, f64)>> {
    let scale = f64::from(src) / f64::from(dst);
    (0..dst)
        .map(|d| {
            let start = f64::from(d) * scale;
            let end = f64::from(d + 1) * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(f64::from(s) + 1.0) - start.max(f64::from(s));
                    (overlap > 1e-9).then_some((s, overlap / scale))
                })
                .collect()
        })
        .collect()
}

pub fn filled(width: u32, height: u32, red: u8, green: u8, blue: u8) -> RgbImage {
    ImageBuffer::from_pixel(width, height, Rgb([red, green, blue]))
}

pub fn construct_gray(raw: &[&[u8]]) -> GrayImage {
    assert!(raw.windows(2).all(|w| w[0].len() == w[1].len()));
    let height = raw.len() as u32;
    let width = raw.iter().next().map(|row| row.len()).unwrap_or(0) as u32;
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([raw[y as usize][x as usize]])
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hsv_primaries() {
        assert_eq!([0, 255, 255], rgb_to_hsv(Rgb([255, 0, 0])));
        assert_eq!([60, 255, 255], rgb_to_hsv(Rgb([0, 255, 0])));
        assert_eq!([120, 255, 255], rgb_to_hsv(Rgb([0, 0, 255])));
        assert_eq!([30, 255, 255], rgb_to_hsv(Rgb([255, 255, 0])));
        assert_eq!([150, 255, 255], rgb_to_hsv(Rgb([255, 0, 255])));
    }

    #[test]
    fn hsv_grays_have_no_hue_or_saturation() {
        assert_eq!([0, 0, 0], rgb_to_hsv(Rgb([0, 0, 0])));
        assert_eq!([0, 0, 128], rgb_to_hsv(Rgb([128, 128, 128])));
        assert_eq!([0, 0, 255], rgb_to_hsv(Rgb([255, 255, 255])));
    }

    #[test]
    fn hsv_half_saturation() {
        // opencv gives [0, 128, 200] for this one
        assert_eq!([0, 128, 200], rgb_to_hsv(Rgb([200, 100, 100])));
    }

    #[test]
    fn area_resize_averages_blocks() {
        let mut img = RgbImage::new(4, 4);
        img.enumerate_pixels_mut().for_each(|(x, y, p)| {
            *p = match (x < 2, y < 2) {
                (true, true) => Rgb([10, 10, 10]),
                (false, true) => Rgb([20, 20, 20]),
                (true, false) => Rgb([30, 30, 30]),
                (false, false) => Rgb([40, 40, 40]),
            }
        });

        let small = resize_area(&img, 2, 2);
        assert_eq!(Rgb([10, 10, 10]), *small.get_pixel(0, 0));
        assert_eq!(Rgb([20, 20, 20]), *small.get_pixel(1, 0));
        assert_eq!(Rgb([30, 30, 30]), *small.get_pixel(0, 1));
        assert_eq!(Rgb([40, 40, 40]), *small.get_pixel(1, 1));
    }

    #[test]
    fn area_resize_stripes_become_gray() {
        let img = RgbImage::from_fn(8, 4, |x, _| {
            if x % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([WHITE, WHITE, WHITE])
            }
        });
        let small = resize_area(&img, 2, 1);
        assert_eq!((2, 1), small.dimensions());
        assert!(small.pixels().all(|p| p.0 == [128, 128, 128]));
    }

    #[test]
    fn area_resize_uneven_ratio() {
        let img = filled(7, 5, 50, 100, 150);
        let small = resize_area(&img, 2, 1);
        assert!(small.pixels().all(|p| p.0 == [50, 100, 150]));
    }

    #[test]
    fn area_weights_sum_to_one() {
        for (src, dst) in [(7, 2), (320, 80), (5, 3), (3, 5)] {
            for weights in area_weights(src, dst) {
                let sum: f64 = weights.iter().map(|(_, w)| w).sum();
                assert!((sum - 1.0).abs() < 1e-9, "{src}->{dst}: {sum}");
            }
        }
    }

    #[test]
    fn construct_gray_layout() {
        let img = construct_gray(&[&[1, 2, 3], &[4, 5, 6]]);
        assert_eq!((3, 2), img.dimensions());
        assert_eq!(6, img.get_pixel(2, 1)[0]);
        assert_eq!(BLACK, construct_gray(&[&[0]]).get_pixel(0, 0)[0]);
    }
}
