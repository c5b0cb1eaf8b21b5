//! Frame data structures for captured screen content

use std::time::Instant;

use image::{GrayImage, Luma};

use crate::scaling::Rect;

/// A captured frame from the device screen.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when the frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Create a new frame from raw RGBA data.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Get frame dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Convert the frame to grayscale for matching.
    pub fn gray(&self) -> GrayImage {
        rgba_to_grayscale(&self.data, self.width, self.height)
    }

    /// Crop a grayscale region out of the frame. The rectangle is clamped
    /// to the frame bounds.
    pub fn crop_gray(&self, rect: Rect) -> GrayImage {
        let gray = self.gray();
        crop_gray(&gray, rect)
    }

    /// Cheap sampled content hash, used to detect an unchanged screen
    /// (e.g. end of a scrollable list).
    pub fn sample_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        let step = (self.data.len() / 1000).max(1);
        for (i, &byte) in self.data.iter().enumerate().step_by(step) {
            i.hash(&mut hasher);
            byte.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Convert RGBA image data to grayscale.
pub fn rgba_to_grayscale(data: &[u8], width: u32, height: u32) -> GrayImage {
    let mut gray = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 4) as usize;
            if idx + 2 < data.len() {
                let r = data[idx] as f32;
                let g = data[idx + 1] as f32;
                let b = data[idx + 2] as f32;
                // Standard grayscale conversion
                let gray_val = (0.299 * r + 0.587 * g + 0.114 * b) as u8;
                gray.put_pixel(x, y, Luma([gray_val]));
            }
        }
    }

    gray
}

/// Extract a region from a grayscale image, clamped to its bounds.
pub fn crop_gray(image: &GrayImage, rect: Rect) -> GrayImage {
    let (img_w, img_h) = image.dimensions();
    let (x, y, w, h) = rect;

    let x = x.min(img_w);
    let y = y.min(img_h);
    let w = w.min(img_w.saturating_sub(x));
    let h = h.min(img_h.saturating_sub(y));

    if w == 0 || h == 0 {
        return GrayImage::new(1, 1);
    }

    let mut region = GrayImage::new(w, h);
    for ry in 0..h {
        for rx in 0..w {
            region.put_pixel(rx, ry, *image.get_pixel(x + rx, y + ry));
        }
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_grayscale() {
        let data = vec![
            255, 0, 0, 255, // Red
            0, 255, 0, 255, // Green
            0, 0, 255, 255, // Blue
            128, 128, 128, 255, // Gray
        ];

        let gray = rgba_to_grayscale(&data, 2, 2);
        assert_eq!(gray.dimensions(), (2, 2));

        // Green is brighter than blue in grayscale
        let green_val = gray.get_pixel(1, 0).0[0];
        let blue_val = gray.get_pixel(0, 1).0[0];
        assert!(green_val > blue_val);
    }

    #[test]
    fn test_crop_gray_clamps() {
        let img = GrayImage::from_pixel(4, 4, Luma([7]));
        let region = crop_gray(&img, (2, 2, 10, 10));
        assert_eq!(region.dimensions(), (2, 2));
        assert_eq!(region.get_pixel(0, 0).0[0], 7);
    }

    #[test]
    fn test_crop_gray_empty() {
        let img = GrayImage::from_pixel(4, 4, Luma([7]));
        let region = crop_gray(&img, (4, 4, 2, 2));
        assert_eq!(region.dimensions(), (1, 1));
    }

    #[test]
    fn test_sample_hash_differs() {
        let a = Frame::new(vec![0u8; 64], 4, 4);
        let b = Frame::new(vec![255u8; 64], 4, 4);
        assert_ne!(a.sample_hash(), b.sample_hash());
        assert_eq!(a.sample_hash(), a.sample_hash());
    }
}
