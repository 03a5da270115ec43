//! Canny edge detection, with a 3x3 Sobel operator and L1 gradient magnitudes.

use framesort_common::{
    args,
    utils::imgutils::{BLACK, WHITE},
};
use image::GrayImage;

args! {
    #[derive(Copy, Clone)]
    Canny {
        "Gradients at or below this are never part of an edge"
        canny_low: f32 = 30.0;

        "Gradients above this always are part of an edge, the ones in between only if \
         they are connected to such a gradient"
        canny_high: f32 = 570.0;
    }
}

// tan(22.5°) and tan(67.5°), used to bin gradient directions into four sectors
const TAN_22_5: f64 = 0.414_213_562_373_095_1;
const TAN_67_5: f64 = 2.414_213_562_373_095;

impl Canny {
    /// Returns an image where edge pixels are white and everything else is black.
    pub fn edges(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        let mut out = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return out;
        }

        let low = self.canny_low.min(self.canny_high).floor() as i32;
        let high = self.canny_low.max(self.canny_high).floor() as i32;

        let grad = Gradients::sobel(gray);
        let mut marks = vec![Mark::NotEdge; grad.mag.len()];
        let mut stack = Vec::new();

        for y in 0..grad.height {
            for x in 0..grad.width {
                let i = grad.index(x, y);
                let m = grad.mag[i];
                if m <= low || !grad.is_local_max(x, y) {
                    continue;
                }
                if m > high {
                    marks[i] = Mark::Edge;
                    stack.push((x, y));
                } else {
                    marks[i] = Mark::Maybe;
                }
            }
        }

        // hysteresis, grow the strong edges into connected weak ones
        while let Some((x, y)) = stack.pop() {
            for (nx, ny) in grad.neighbours(x, y) {
                let ni = grad.index(nx, ny);
                if marks[ni] == Mark::Maybe {
                    marks[ni] = Mark::Edge;
                    stack.push((nx, ny));
                }
            }
        }

        out.pixels_mut().zip(marks).for_each(|(pixel, mark)| {
            pixel.0 = [if mark == Mark::Edge { WHITE } else { BLACK }];
        });
        out
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    NotEdge,
    Maybe,
    Edge,
}

struct Gradients {
    width: usize,
    height: usize,
    dx: Vec<i32>,
    dy: Vec<i32>,
    mag: Vec<i32>,
}

impl Gradients {
    /// Sobel derivatives, pixels outside of the image are copies of the closest border
    /// pixel.
    fn sobel(gray: &GrayImage) -> Self {
        let width = gray.width() as usize;
        let height = gray.height() as usize;
        let raw = gray.as_raw();
        let px = |x: isize, y: isize| -> i32 {
            let x = x.clamp(0, width as isize - 1) as usize;
            let y = y.clamp(0, height as isize - 1) as usize;
            i32::from(raw[y * width + x])
        };

        let len = width * height;
        let mut dx = Vec::with_capacity(len);
        let mut dy = Vec::with_capacity(len);
        let mut mag = Vec::with_capacity(len);
        for y in 0..height as isize {
            for x in 0..width as isize {
                let gx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
                let gy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
                dx.push(gx);
                dy.push(gy);
                mag.push(gx.abs() + gy.abs());
            }
        }

        Self {
            width,
            height,
            dx,
            dy,
            mag,
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// The magnitude at an offset from `(x, y)`, zero outside of the image.
    fn mag_at(&self, x: usize, y: usize, ox: isize, oy: isize) -> i32 {
        let (Some(x), Some(y)) = (x.checked_add_signed(ox), y.checked_add_signed(oy))
        else {
            return 0;
        };
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.mag[self.index(x, y)]
    }

    /// Non-maximum suppression across the gradient direction. Ties are broken towards
    /// the left/upper pixel so that a ridge two pixels wide becomes one pixel wide.
    fn is_local_max(&self, x: usize, y: usize) -> bool {
        let i = self.index(x, y);
        let m = self.mag[i];
        let gx = f64::from(self.dx[i].abs());
        let gy = f64::from(self.dy[i].abs());

        if gy < gx * TAN_22_5 {
            m > self.mag_at(x, y, -1, 0) && m >= self.mag_at(x, y, 1, 0)
        } else if gy > gx * TAN_67_5 {
            m > self.mag_at(x, y, 0, -1) && m >= self.mag_at(x, y, 0, 1)
        } else {
            let s = if (self.dx[i] ^ self.dy[i]) < 0 { -1 } else { 1 };
            m > self.mag_at(x, y, -s, -1) && m > self.mag_at(x, y, s, 1)
        }
    }

    fn neighbours(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (-1isize..=1)
            .flat_map(|oy| (-1isize..=1).map(move |ox| (ox, oy)))
            .filter(|&offset| offset != (0, 0))
            .filter_map(move |(ox, oy)| {
                let nx = x.checked_add_signed(ox)?;
                let ny = y.checked_add_signed(oy)?;
                (nx < self.width && ny < self.height).then_some((nx, ny))
            })
    }
}
