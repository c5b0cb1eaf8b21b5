//! Vision layer
//!
//! Template store, fuzzy matcher, and small pixel helpers shared by the
//! action layer and the OCR pipeline.

pub mod matching;
pub mod store;

pub use matching::{Match, Matcher, Specification, DEFAULT_THRESHOLD};
pub use store::{Template, TemplateStore};

use image::{GrayImage, Luma};

/// Binarize with an inverted fixed threshold: pixels darker than
/// `threshold` become foreground (255), everything else background (0).
/// Game text is typically dark on a light panel, so this produces the
/// white-on-black line image the OCR pipeline expects.
pub fn binarize_inv(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] < threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Fraction of pixels in a grayscale image brighter than `threshold`.
/// Used to read fill-style gauges (e.g. the vitality bar).
pub fn bright_fraction(gray: &GrayImage, threshold: u8) -> f32 {
    let total = (gray.width() * gray.height()).max(1);
    let bright = gray.pixels().filter(|p| p.0[0] > threshold).count();
    bright as f32 / total as f32
}
