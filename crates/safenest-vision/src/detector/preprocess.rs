//! Pixel-level primitives shared by the crack and color detectors.
//!
//! Color conversions follow the 8-bit OpenCV conventions the detector
//! thresholds were tuned against: BT.601 luma for grayscale, and HSV with
//! hue in [0, 180) and saturation/value in [0, 255].

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Three-channel image holding H, S, V per pixel.
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Convert RGB to 8-bit grayscale with BT.601 weights.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = v - min;

    let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / delta
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    // Hue is halved to fit a byte; 360° wraps back to 0
    let h8 = (h / 2.0).round() as u32 % 180;

    [h8 as u8, s.round().min(255.0) as u8, v as u8]
}

/// Convert an RGB image to 8-bit HSV.
pub fn to_hsv(image: &RgbImage) -> HsvImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Rgb(rgb_to_hsv(r, g, b))
    })
}

/// Binary mask of pixels whose channels all lie in `[lower, upper]`.
///
/// Matching pixels are 255, the rest 0.
pub fn in_range(image: &HsvImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb(px) = *image.get_pixel(x, y);
        let inside = (0..3).all(|c| px[c] >= lower[c] && px[c] <= upper[c]);
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid × grid` layout of tiles. Each tile gets
/// an equalization table built from its clipped histogram, and every pixel
/// is mapped by bilinear interpolation between the four nearest tile tables.
pub fn clahe(image: &GrayImage, clip_limit: f64, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid.min(width));
    let tile_h = height.div_ceil(grid.min(height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);
        let v = image.get_pixel(x, y)[0] as usize;

        let top = lut_at(tx0, ty0)[v] as f64 * (1.0 - ax) + lut_at(tx1, ty0)[v] as f64 * ax;
        let bottom = lut_at(tx0, ty1)[v] as f64 * (1.0 - ax) + lut_at(tx1, ty1)[v] as f64 * ax;
        let value = top * (1.0 - ay) + bottom * ay;

        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Equalization table for one tile.
fn tile_lut(image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f64) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let count = (x1 - x0) * (y1 - y0);
    let mut lut = [0u8; 256];
    if count == 0 {
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
        return lut;
    }

    if clip_limit > 0.0 {
        let clip = ((clip_limit * count as f64 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }

        // Spread clipped mass evenly, remainder to the lowest bins
        let share = excess / 256;
        let remainder = (excess % 256) as usize;
        for (i, bin) in hist.iter_mut().enumerate() {
            *bin += share + u32::from(i < remainder);
        }
    }

    let scale = 255.0 / count as f64;
    let mut cdf = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[i] = (cdf as f64 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Indices of the two tiles whose centres bracket `pos`, and the weight of
/// the second one.
fn neighbours(pos: u32, tile: u32, tiles: u32) -> (u32, u32, f64) {
    let f = (pos as f64 + 0.5) / tile as f64 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let i0 = (f.floor() as u32).min(tiles - 1);
    let i1 = (i0 + 1).min(tiles - 1);
    let a = if i1 == i0 { 0.0 } else { f - i0 as f64 };
    (i0, i1, a)
}

/// Geometry of one external contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourShape {
    /// Polygon area enclosed by the border (shoelace)
    pub area: f64,
    /// Closed border length
    pub perimeter: f64,
    /// Bounding rectangle, inclusive pixel extent
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ContourShape {
    /// Build from border points. Returns `None` for an empty point list.
    pub fn from_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            area: polygon_area(points),
            perimeter: arc_length(points),
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// `max(w, h) / (min(w, h) + 1)`, large for elongated shapes.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = (self.width as f64, self.height as f64);
        w.max(h) / (w.min(h) + 1.0)
    }

    /// Longest bounding-box side.
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Outermost contours of the non-zero regions in a binary image.
///
/// Hole borders and anything nested inside a hole are skipped.
pub fn external_contours(mask: &GrayImage) -> Vec<ContourShape> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| ContourShape::from_points(&c.points))
        .collect()
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Length of a closed polyline.
pub fn arc_length(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| {
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 128, 0), [60, 255, 128]);
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(255, 255, 255), [0, 0, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_in_range_inclusive() {
        let hsv = HsvImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([35, 40, 40]) } else { Rgb([34, 40, 40]) });
        let mask = in_range(&hsv, [35, 40, 40], [85, 255, 200]);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_clahe_keeps_uniform_image_uniform() {
        let gray = GrayImage::from_pixel(64, 64, Luma([255]));
        let out = clahe(&gray, 2.0, 8);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_clahe_handles_tiny_image() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 40 + y * 10) as u8]));
        let out = clahe(&gray, 2.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn test_square_geometry() {
        let points = vec![
            Point::new(0, 0),
            Point::new(9, 0),
            Point::new(9, 9),
            Point::new(0, 9),
        ];
        let shape = ContourShape::from_points(&points).unwrap();
        assert_eq!(shape.area, 81.0);
        assert_eq!(shape.perimeter, 36.0);
        assert_eq!((shape.width, shape.height), (10, 10));
        assert!((shape.aspect_ratio() - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_external_contours_skip_holes() {
        // Filled 20×20 square with a 6×6 hole
        let mask = GrayImage::from_fn(40, 40, |x, y| {
            let in_square = (10..30).contains(&x) && (10..30).contains(&y);
            let in_hole = (17..23).contains(&x) && (17..23).contains(&y);
            Luma([if in_square && !in_hole { 255 } else { 0 }])
        });
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!((contours[0].x, contours[0].y), (10, 10));
        assert_eq!((contours[0].width, contours[0].height), (20, 20));
    }
}
