//! Annotated output images.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use safenest_models::Detection;
use tracing::debug;

use crate::error::VisionResult;
use crate::scorer::canonical_class_key;

const CRACK_RED: Rgb<u8> = Rgb([255, 0, 0]);
const MOLD_GREEN: Rgb<u8> = Rgb([0, 128, 0]);
const WATER_BLUE: Rgb<u8> = Rgb([0, 100, 255]);
const RUST_ORANGE: Rgb<u8> = Rgb([255, 128, 0]);
const OTHER_YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

/// Box color for a class label.
pub fn class_color(class_name: &str) -> Rgb<u8> {
    match canonical_class_key(class_name).as_str() {
        "crack" => CRACK_RED,
        "mold" | "mould" => MOLD_GREEN,
        "water_damage" => WATER_BLUE,
        "rust" => RUST_ORANGE,
        _ => OTHER_YELLOW,
    }
}

/// Return a copy of `image` with a 2px class-colored box per detection.
///
/// Boxes are clamped to the image; detections without a box, or whose box
/// lies entirely outside the image, are not drawn.
pub fn draw_detections(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut out = image.clone();
    let (width, height) = out.dimensions();

    for det in detections {
        let Some(bbox) = det.bbox.and_then(|b| b.clamp(width, height)) else {
            debug!(class = %det.class_name, "Skipping undrawable detection");
            continue;
        };

        let (x1, y1, x2, y2) = bbox.to_pixels();
        let w = (x2 - x1).max(0) as u32;
        let h = (y2 - y1).max(0) as u32;
        if w == 0 || h == 0 {
            continue;
        }

        let color = class_color(&det.class_name);
        draw_hollow_rect_mut(&mut out, Rect::at(x1, y1).of_size(w, h), color);

        // Second ring inside the first for a 2px outline
        if w > 2 && h > 2 {
            draw_hollow_rect_mut(&mut out, Rect::at(x1 + 1, y1 + 1).of_size(w - 2, h - 2), color);
        }
    }

    out
}

/// Draw detections and write the result; the format follows the extension.
pub fn save_annotated(
    image: &RgbImage,
    detections: &[Detection],
    path: impl AsRef<Path>,
) -> VisionResult<()> {
    let annotated = draw_detections(image, detections);
    annotated.save(path.as_ref())?;
    debug!(path = %path.as_ref().display(), count = detections.len(), "Annotated image written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safenest_models::BoundingBox;

    #[test]
    fn test_class_colors() {
        assert_eq!(class_color("crack"), CRACK_RED);
        assert_eq!(class_color("Mold"), MOLD_GREEN);
        assert_eq!(class_color("Water Damage"), WATER_BLUE);
        assert_eq!(class_color("Rust/Corrosion"), RUST_ORANGE);
        assert_eq!(class_color("peeling"), OTHER_YELLOW);
    }

    #[test]
    fn test_draw_outlines_box() {
        let image = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        let det = Detection::new(BoundingBox::new(10.0, 10.0, 30.0, 30.0), "crack", 0.9);
        let out = draw_detections(&image, &[det]);

        assert_eq!(*out.get_pixel(10, 10), CRACK_RED);
        assert_eq!(*out.get_pixel(11, 20), CRACK_RED);
        assert_eq!(*out.get_pixel(20, 20), Rgb([255, 255, 255]));
        // source untouched
        assert_eq!(*image.get_pixel(10, 10), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_out_of_frame_box_ignored() {
        let image = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        let det = Detection::new(BoundingBox::new(40.0, 40.0, 60.0, 60.0), "mold", 0.9);
        let out = draw_detections(&image, &[det]);
        assert_eq!(out, image);
    }

    #[test]
    fn test_save_annotated_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");
        let image = RgbImage::from_pixel(16, 16, Rgb([10, 10, 10]));
        let det = Detection::new(BoundingBox::new(2.0, 2.0, 12.0, 12.0), "rust", 0.5);

        save_annotated(&image, &[det], &path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*reloaded.get_pixel(2, 2), RUST_ORANGE);
    }
}
