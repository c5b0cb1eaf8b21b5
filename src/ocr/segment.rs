//! Character segmentation for binarized text lines
//!
//! Splits a white-on-black line image into per-character crops:
//! connected components become glyph candidates, near-touching candidates
//! merge (multi-stroke glyphs), and the candidate sequence is regrouped
//! into characters using gap, width, and height heuristics measured
//! against the dominant glyph size.

use image::GrayImage;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::config::OcrConfig;
use crate::device::frame::crop_gray;

/// Segmentation tunables, usually derived from [`OcrConfig`].
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Merge candidates whose horizontal gap is at most this many pixels.
    pub merge_gap_px: u32,
    /// A gap wider than this fraction of the dominant width starts a new
    /// character.
    pub split_gap_ratio: f32,
    /// Combined width beyond this fraction of the dominant width starts
    /// a new character.
    pub max_width_ratio: f32,
    /// Candidates shorter than this fraction of the dominant height are
    /// punctuation and split from full-height neighbors.
    pub short_height_ratio: f32,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self::from(&OcrConfig::default())
    }
}

impl From<&OcrConfig> for SegmentOptions {
    fn from(config: &OcrConfig) -> Self {
        Self {
            merge_gap_px: config.merge_gap_px,
            split_gap_ratio: config.split_gap_ratio,
            max_width_ratio: config.max_width_ratio,
            short_height_ratio: config.short_height_ratio,
        }
    }
}

/// Inclusive bounding box of a glyph candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CandidateBox {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl CandidateBox {
    fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    fn union(self, other: CandidateBox) -> CandidateBox {
        CandidateBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Segment a binarized line image into tightly-cropped character images,
/// left to right. An all-background image yields no characters.
pub fn segment_line(binary: &GrayImage, opts: &SegmentOptions) -> Vec<GrayImage> {
    let boxes = candidate_boxes(binary, opts.merge_gap_px);
    if boxes.is_empty() {
        return Vec::new();
    }

    let (dominant_w, dominant_h) = dominant_size(&boxes, opts.short_height_ratio);
    let regions = assemble_characters(&boxes, dominant_w, dominant_h, opts);

    let mut crops = Vec::with_capacity(regions.len());
    for (start, end) in regions {
        let region = crop_gray(binary, (start, 0, end - start, binary.height()));
        if let Some(tight) = tight_crop(&region) {
            crops.push(tight);
        }
    }
    crops
}

/// Connected foreground components as bounding boxes, sorted left to
/// right, with sub-threshold horizontal gaps merged.
fn candidate_boxes(binary: &GrayImage, merge_gap_px: u32) -> Vec<CandidateBox> {
    let labels = connected_components(binary, Connectivity::Eight, image::Luma([0u8]));

    let mut boxes: std::collections::HashMap<u32, CandidateBox> = std::collections::HashMap::new();
    for (x, y, p) in labels.enumerate_pixels() {
        let label = p.0[0];
        if label == 0 {
            continue;
        }
        boxes
            .entry(label)
            .and_modify(|b| {
                *b = b.union(CandidateBox { x0: x, y0: y, x1: x, y1: y });
            })
            .or_insert(CandidateBox { x0: x, y0: y, x1: x, y1: y });
    }

    let mut boxes: Vec<CandidateBox> = boxes.into_values().collect();
    boxes.sort_by_key(|b| (b.x0, b.y0));

    // Merge horizontally overlapping or near-touching candidates
    let mut merged: Vec<CandidateBox> = Vec::with_capacity(boxes.len());
    for b in boxes {
        match merged.last_mut() {
            Some(last) if b.x0 <= last.x1.saturating_add(1 + merge_gap_px) => {
                *last = last.union(b);
            }
            _ => merged.push(b),
        }
    }
    merged
}

/// Dominant glyph width/height of the candidate set. Height is the
/// tallest candidate; width is the median over full-height candidates so
/// punctuation does not drag it down.
fn dominant_size(boxes: &[CandidateBox], short_height_ratio: f32) -> (u32, u32) {
    let max_h = boxes.iter().map(|b| b.height()).max().unwrap_or(1);
    let cutoff = (max_h as f32 * short_height_ratio).ceil() as u32;

    let mut widths: Vec<u32> = boxes
        .iter()
        .filter(|b| b.height() >= cutoff)
        .map(|b| b.width())
        .collect();
    if widths.is_empty() {
        widths = boxes.iter().map(|b| b.width()).collect();
    }
    widths.sort_unstable();
    let median_w = widths[widths.len() / 2].max(1);

    (median_w, max_h)
}

/// Group candidates into character column ranges `[start, end)`.
fn assemble_characters(
    boxes: &[CandidateBox],
    dominant_w: u32,
    dominant_h: u32,
    opts: &SegmentOptions,
) -> Vec<(u32, u32)> {
    let split_gap = (dominant_w as f32 * opts.split_gap_ratio) as u32;
    let max_width = (dominant_w as f32 * opts.max_width_ratio) as u32;
    let short_cutoff = dominant_h as f32 * opts.short_height_ratio;

    let is_short = |b: &CandidateBox| (b.height() as f32) < short_cutoff;

    let mut regions = Vec::new();
    let mut start = boxes[0].x0;
    let mut group = boxes[0];

    for &b in &boxes[1..] {
        let gap = b.x0.saturating_sub(group.x1 + 1);
        let combined_w = b.x1 - group.x0 + 1;

        let split = gap > split_gap
            || combined_w > max_width
            || is_short(&b) != is_short(&group);

        if split {
            // Cut at the gap midpoint, clipped so the character never
            // extends past the dominant width from its own start.
            let mid = (group.x1 + 1 + b.x0) / 2;
            let cut = mid.min((start + dominant_w).max(group.x1 + 1));
            regions.push((start, cut));
            start = cut;
            group = b;
        } else {
            group = group.union(b);
        }
    }
    regions.push((start, group.x1 + 1));
    regions
}

/// Re-crop to the exact non-zero bounds, dropping the whitespace the
/// coarse column split leaves behind. `None` when the region holds no
/// foreground at all.
fn tight_crop(region: &GrayImage) -> Option<GrayImage> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut any = false;

    for (x, y, p) in region.enumerate_pixels() {
        if p.0[0] > 0 {
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !any {
        return None;
    }
    Some(crop_gray(
        region,
        (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
    ))
}
