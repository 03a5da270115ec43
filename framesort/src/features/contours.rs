//! Border following on binary images.
//!
//! Suzuki, S. and Abe, K., "Topological Structural Analysis of Digitized Binary Images
//! by Border Following", 1985. Only the borders themselves are extracted, not how they
//! nest.

use image::GrayImage;

/// A closed border, as the pixel coordinates it passes through.
pub type Contour = Vec<(i64, i64)>;

// Counter-clockwise, as seen with y pointing down, starting to the right.
const DIRECTIONS: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const EAST: usize = 0;
const WEST: usize = 4;

/// Finds the outer borders and the hole borders of all non-black regions.
pub fn find_contours(img: &GrayImage) -> Vec<Contour> {
    let mut labels = Labels::new(img);
    let mut contours = Vec::new();
    let mut nbd = 1;

    for y in 1..labels.height - 1 {
        for x in 1..labels.width - 1 {
            let p = labels.index(x, y);
            let label = labels.get(p);
            let start_from = if label == 1 && labels.get(p - 1) == 0 {
                WEST
            } else if label >= 1 && labels.get(p + 1) == 0 {
                EAST
            } else {
                continue;
            };

            nbd += 1;
            let border = labels.follow(p, start_from, nbd);
            contours.push(border.into_iter().map(|p| labels.coords(p)).collect());
        }
    }

    contours
}

/// The area enclosed by the contour, by the shoelace formula.
pub fn contour_area(contour: &[(i64, i64)]) -> f64 {
    let Some(&last) = contour.last() else {
        return 0.0;
    };
    let twice: i64 = contour
        .iter()
        .scan(last, |prev, &cur| {
            let (x0, y0) = std::mem::replace(prev, cur);
            Some(x0 * cur.1 - cur.0 * y0)
        })
        .sum();
    twice.abs() as f64 / 2.0
}

/// The image with a one pixel wide frame of zeros around it, so that every pixel of the
/// image has eight neighbours.
struct Labels {
    width: usize,
    height: usize,
    labels: Vec<i64>,
}

impl Labels {
    /// The outermost rows and columns of the image itself are treated as background
    /// too, like OpenCV's `findContours` does.
    fn new(img: &GrayImage) -> Self {
        let width = img.width() as usize + 2;
        let height = img.height() as usize + 2;
        let inside = |x: u32, y: u32| {
            x > 0 && y > 0 && x + 1 < img.width() && y + 1 < img.height()
        };
        let mut labels = vec![0; width * height];
        img.enumerate_pixels()
            .filter(|&(x, y, pixel)| pixel[0] != 0 && inside(x, y))
            .for_each(|(x, y, _)| labels[(y as usize + 1) * width + x as usize + 1] = 1);
        Self {
            width,
            height,
            labels,
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn coords(&self, p: usize) -> (i64, i64) {
        ((p % self.width) as i64 - 1, (p / self.width) as i64 - 1)
    }

    fn get(&self, p: usize) -> i64 {
        self.labels[p]
    }

    fn neighbour(&self, p: usize, dir: usize) -> usize {
        let (dx, dy) = DIRECTIONS[dir];
        p.wrapping_add_signed(dx + dy * self.width as isize)
    }

    fn direction_to(&self, from: usize, to: usize) -> usize {
        (0..DIRECTIONS.len())
            .find(|&dir| self.neighbour(from, dir) == to)
            .expect("the pixels are neighbours")
    }

    /// Follows the border starting at `start`, with the zero pixel that identified it
    /// in direction `zero_dir`. Marks the border pixels with `nbd` as it goes.
    fn follow(&mut self, start: usize, zero_dir: usize, nbd: i64) -> Vec<usize> {
        let first_nonzero = (0..DIRECTIONS.len())
            .map(|k| (zero_dir + DIRECTIONS.len() - k) % DIRECTIONS.len())
            .find(|&dir| self.get(self.neighbour(start, dir)) != 0);

        let Some(dir) = first_nonzero else {
            // a lone pixel
            self.labels[start] = -nbd;
            return vec![start];
        };

        let last = self.neighbour(start, dir);
        let mut prev = last;
        let mut cur = start;
        let mut border = Vec::new();
        loop {
            border.push(cur);

            let from = self.direction_to(cur, prev);
            let mut east_is_zero = false;
            let mut next = None;
            for k in 1..=DIRECTIONS.len() {
                let dir = (from + k) % DIRECTIONS.len();
                if self.get(self.neighbour(cur, dir)) != 0 {
                    next = Some(self.neighbour(cur, dir));
                    break;
                }
                if dir == EAST {
                    east_is_zero = true;
                }
            }
            let next = next.expect("prev is non-zero so something is always found");

            if east_is_zero {
                self.labels[cur] = -nbd;
            } else if self.labels[cur] == 1 {
                self.labels[cur] = nbd;
            }

            if next == start && cur == last {
                break;
            }
            prev = cur;
            cur = next;
        }

        border
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use framesort_common::utils::imgutils::construct_gray;

    fn rect(width: u32, height: u32, filled: impl Fn(u32, u32) -> bool) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| image::Luma([if filled(x, y) { 255 } else { 0 }]))
    }

    #[test]
    fn empty_image_has_no_contours() {
        assert!(find_contours(&GrayImage::new(5, 5)).is_empty());
        assert!(find_contours(&GrayImage::new(0, 0)).is_empty());
    }

    #[test]
    fn filled_square() {
        let img = rect(7, 7, |x, y| (2..=4).contains(&x) && (2..=4).contains(&y));
        let contours = find_contours(&img);
        assert_eq!(1, contours.len());
        assert_eq!(
            vec![(2, 2), (2, 3), (2, 4), (3, 4), (4, 4), (4, 3), (4, 2), (3, 2)],
            contours[0]
        );
        assert_eq!(4.0, contour_area(&contours[0]));
    }

    #[test]
    fn ring_has_an_outer_and_a_hole_border() {
        let img = rect(9, 9, |x, y| {
            let outer = (2..=6).contains(&x) && (2..=6).contains(&y);
            let inner = (3..=5).contains(&x) && (3..=5).contains(&y);
            outer && !inner
        });
        let areas: Vec<f64> = find_contours(&img).iter().map(|c| contour_area(c)).collect();
        assert_eq!(vec![16.0, 14.0], areas);
    }

    #[test]
    fn lone_pixels_and_lines() {
        let img = construct_gray(&[
            &[0, 0, 0, 0, 0, 0],
            &[0, 9, 0, 0, 0, 0],
            &[0, 0, 0, 0, 0, 0],
            &[0, 0, 9, 9, 9, 0],
            &[0, 0, 0, 0, 0, 0],
        ]);
        let contours = find_contours(&img);
        assert_eq!(2, contours.len());
        assert_eq!(vec![(1, 1)], contours[0]);
        assert_eq!(0.0, contour_area(&contours[0]));
        assert_eq!(vec![(2, 3), (3, 3), (4, 3), (3, 3)], contours[1]);
        assert_eq!(0.0, contour_area(&contours[1]));
    }

    #[test]
    fn image_border_is_background() {
        let contours = find_contours(&rect(5, 5, |_, _| true));
        assert_eq!(1, contours.len());
        assert_eq!(
            vec![(1, 1), (1, 2), (1, 3), (2, 3), (3, 3), (3, 2), (3, 1), (2, 1)],
            contours[0]
        );
        assert_eq!(4.0, contour_area(&contours[0]));

        assert_eq!(vec![vec![(1, 1)]], find_contours(&rect(3, 3, |_, _| true)));
        assert!(find_contours(&rect(2, 2, |_, _| true)).is_empty());
    }

    #[test]
    fn edge_crossing_the_frame_is_cut_at_the_border() {
        let contours = find_contours(&rect(10, 6, |x, _| x == 4));
        assert_eq!(
            vec![vec![(4, 1), (4, 2), (4, 3), (4, 4), (4, 3), (4, 2)]],
            contours
        );
    }

    #[test]
    fn shoelace() {
        assert_eq!(0.0, contour_area(&[]));
        assert_eq!(12.0, contour_area(&[(0, 0), (4, 0), (4, 3), (0, 3)]));
        assert_eq!(12.0, contour_area(&[(0, 0), (0, 3), (4, 3), (4, 0)]));
        assert_eq!(6.0, contour_area(&[(0, 0), (4, 0), (0, 3)]));
    }
}
