//! Fuzzy template matching
//!
//! Finds all locations where a named template visually matches a
//! screenshot, using zero-mean normalized cross-correlation over
//! grayscale pixels. Overlapping detections are collapsed with
//! non-maximum suppression so one physical UI element yields exactly
//! one match. "No match" is an empty result, never an error; callers
//! that need "exactly one" go through the action layer instead.

use image::GrayImage;
use tracing::debug;

use crate::error::Result;
use crate::scaling::{Point, Rect};
use crate::vision::store::TemplateStore;

/// Score slack so a threshold of exactly 1.0 still accepts a pixel-perfect
/// match despite floating-point rounding.
const SCORE_TOLERANCE: f32 = 1e-4;

/// Default similarity threshold for specifications built from a bare name.
pub const DEFAULT_THRESHOLD: f32 = 0.9;

/// A named, thresholded reference pattern used for matching.
///
/// Immutable once constructed; identity is the template name.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    /// Template asset name.
    pub name: String,
    /// Minimum similarity in (0, 1].
    pub threshold: f32,
    /// Optional region (screenshot pixels) matches must fall inside.
    pub anchor: Option<Rect>,
}

impl Specification {
    /// Create a specification with an explicit threshold.
    pub fn new(name: impl Into<String>, threshold: f32) -> Self {
        Self {
            name: name.into(),
            threshold,
            anchor: None,
        }
    }

    /// Restrict matches to the given screenshot region.
    pub fn with_anchor(mut self, anchor: Rect) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

impl From<&str> for Specification {
    fn from(name: &str) -> Self {
        Specification::new(name, DEFAULT_THRESHOLD)
    }
}

/// A located, scored instance of a specification in a screenshot.
#[derive(Debug, Clone)]
pub struct Match {
    /// Name of the specification that matched.
    pub name: String,
    /// Match location (x, y), top-left corner.
    pub position: Point,
    /// Match size (width, height).
    pub size: (u32, u32),
    /// Similarity score (0.0 - 1.0).
    pub score: f32,
}

impl Match {
    /// Center point of the match.
    pub fn center(&self) -> Point {
        (
            self.position.0 + self.size.0 / 2,
            self.position.1 + self.size.1 / 2,
        )
    }

    /// Bounding box as (x, y, width, height).
    pub fn bounds(&self) -> Rect {
        (self.position.0, self.position.1, self.size.0, self.size.1)
    }
}

/// Template matcher over a shared template store.
pub struct Matcher<'a> {
    store: &'a TemplateStore,
}

impl<'a> Matcher<'a> {
    pub fn new(store: &'a TemplateStore) -> Self {
        Self { store }
    }

    /// Find all matches of `spec` in the screenshot.
    ///
    /// Extra templates declared in the asset's `.extra` sidecar are
    /// matched as well (under their own thresholds when given) and
    /// reported under the primary specification name. Returns an empty
    /// vector when nothing matches.
    pub fn find_all(&self, screen: &GrayImage, spec: &Specification) -> Result<Vec<Match>> {
        let tmpl = self.store.load(&spec.name)?;

        let mut matches = scan(screen, &tmpl.gray, spec.threshold, &spec.name);
        for (alias, threshold) in &tmpl.extras {
            let alias_tmpl = self.store.load(alias)?;
            matches.extend(scan(
                screen,
                &alias_tmpl.gray,
                threshold.unwrap_or(spec.threshold),
                &spec.name,
            ));
        }

        if let Some(mask) = &tmpl.pos_mask {
            let (mask_w, mask_h) = mask.dimensions();
            let (screen_w, screen_h) = screen.dimensions();
            matches.retain(|m| {
                let mx = (m.position.0 as u64 * mask_w as u64 / screen_w.max(1) as u64) as u32;
                let my = (m.position.1 as u64 * mask_h as u64 / screen_h.max(1) as u64) as u32;
                mx < mask_w && my < mask_h && mask.get_pixel(mx, my).0[0] > 0
            });
        }

        if let Some((ax, ay, aw, ah)) = spec.anchor {
            matches.retain(|m| {
                let (x, y) = m.position;
                x >= ax && y >= ay && x < ax + aw && y < ay + ah
            });
        }

        let matches = non_maximum_suppression(matches);
        debug!("'{}': {} match(es)", spec.name, matches.len());
        Ok(matches)
    }
}

/// Scan the screenshot for one reference image, keeping every offset
/// whose similarity reaches the threshold.
fn scan(screen: &GrayImage, template: &GrayImage, threshold: f32, name: &str) -> Vec<Match> {
    let (img_w, img_h) = screen.dimensions();
    let (tmpl_w, tmpl_h) = template.dimensions();

    if tmpl_w > img_w || tmpl_h > img_h || tmpl_w == 0 || tmpl_h == 0 {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for y in 0..=(img_h - tmpl_h) {
        for x in 0..=(img_w - tmpl_w) {
            let score = zncc(screen, template, x, y);
            if score >= threshold - SCORE_TOLERANCE {
                matches.push(Match {
                    name: name.to_string(),
                    position: (x, y),
                    size: (tmpl_w, tmpl_h),
                    score,
                });
            }
        }
    }

    matches
}

/// Zero-mean normalized cross-correlation between the template and the
/// screenshot region at (x, y).
fn zncc(image: &GrayImage, template: &GrayImage, x: u32, y: u32) -> f32 {
    let (tmpl_w, tmpl_h) = template.dimensions();

    let mut sum_it = 0.0f64;
    let mut sum_i2 = 0.0f64;
    let mut sum_t2 = 0.0f64;
    let mut sum_i = 0.0f64;
    let mut sum_t = 0.0f64;
    let count = (tmpl_w * tmpl_h) as f64;

    for ty in 0..tmpl_h {
        for tx in 0..tmpl_w {
            let img_val = image.get_pixel(x + tx, y + ty).0[0] as f64;
            let tmpl_val = template.get_pixel(tx, ty).0[0] as f64;

            sum_it += img_val * tmpl_val;
            sum_i2 += img_val * img_val;
            sum_t2 += tmpl_val * tmpl_val;
            sum_i += img_val;
            sum_t += tmpl_val;
        }
    }

    let mean_i = sum_i / count;
    let mean_t = sum_t / count;

    let numerator = sum_it - count * mean_i * mean_t;
    let denom_i = (sum_i2 - count * mean_i * mean_i).sqrt();
    let denom_t = (sum_t2 - count * mean_t * mean_t).sqrt();
    let denominator = denom_i * denom_t;

    if denominator < 1e-10 {
        return 0.0;
    }

    (numerator / denominator).clamp(0.0, 1.0) as f32
}

/// Collapse overlapping detections, using the template bounding box as
/// the exclusion radius. The higher-scoring match wins.
fn non_maximum_suppression(mut matches: Vec<Match>) -> Vec<Match> {
    if matches.len() <= 1 {
        return matches;
    }

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut result: Vec<Match> = Vec::new();
    for m in matches {
        let overlapped = result.iter().any(|kept| {
            let dx = (kept.position.0 as i64 - m.position.0 as i64).unsigned_abs() as u32;
            let dy = (kept.position.1 as i64 - m.position.1 as i64).unsigned_abs() as u32;
            dx < m.size.0 && dy < m.size.1
        });
        if !overlapped {
            result.push(m);
        }
    }

    // Stable reading order for callers that iterate matches
    result.sort_by_key(|m| (m.position.1, m.position.0));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::frame::crop_gray;
    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    /// Deterministic pseudo-random image. Unlike a gradient, this has no
    /// affine self-similarity across offsets, so ZNCC only peaks where a
    /// patch actually came from.
    fn noise(seed: u32, w: u32, h: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(12345);
        GrayImage::from_fn(w, h, move |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Luma([(state & 0xFF) as u8])
        })
    }

    fn store_with(dir: &TempDir, name: &str, img: &GrayImage) -> TemplateStore {
        img.save(dir.path().join(format!("{name}.png"))).unwrap();
        TemplateStore::new(vec![dir.path().to_path_buf()])
    }

    #[test]
    fn test_crop_matches_at_origin_offset() {
        let screen = noise(1, 40, 40);
        let patch = crop_gray(&screen, (12, 8, 10, 10));

        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "patch", &patch);
        let matcher = Matcher::new(&store);

        let spec = Specification::new("patch", 1.0);
        let matches = matcher.find_all(&screen, &spec).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].position, (12, 8));
        assert!(matches[0].score > 0.999);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let screen = noise(1, 30, 30);
        let absent = noise(2, 8, 8);

        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "absent", &absent);
        let matcher = Matcher::new(&store);

        let matches = matcher
            .find_all(&screen, &Specification::new("absent", 0.999))
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_nms_collapses_duplicates() {
        // Two identical glyphs far apart on a flat background; near-threshold
        // neighbors around each must be suppressed to a single match each.
        let mut screen = GrayImage::from_pixel(60, 20, Luma([0]));
        let glyph = GrayImage::from_fn(6, 6, |x, y| Luma([((x + y) % 2 * 255) as u8]));
        for (ox, oy) in [(5u32, 5u32), (40, 5)] {
            for y in 0..6 {
                for x in 0..6 {
                    screen.put_pixel(ox + x, oy + y, *glyph.get_pixel(x, y));
                }
            }
        }

        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "glyph", &glyph);
        let matcher = Matcher::new(&store);

        let matches = matcher
            .find_all(&screen, &Specification::new("glyph", 0.95))
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].position, (5, 5));
        assert_eq!(matches[1].position, (40, 5));
    }

    #[test]
    fn test_anchor_region_filters() {
        let screen = noise(1, 40, 40);
        let patch = crop_gray(&screen, (20, 20, 8, 8));

        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "patch", &patch);
        let matcher = Matcher::new(&store);

        let inside = Specification::new("patch", 0.99).with_anchor((15, 15, 20, 20));
        assert_eq!(matcher.find_all(&screen, &inside).unwrap().len(), 1);

        let outside = Specification::new("patch", 0.99).with_anchor((0, 0, 10, 10));
        assert!(matcher.find_all(&screen, &outside).unwrap().is_empty());
    }

    #[test]
    fn test_position_mask_filters() {
        let screen = noise(1, 40, 40);
        let patch = crop_gray(&screen, (20, 20, 8, 8));

        let dir = TempDir::new().unwrap();
        // Mask allows only the right half of the screen
        let mask = GrayImage::from_fn(40, 40, |x, _| Luma([if x >= 20 { 255 } else { 0 }]));
        patch.save(dir.path().join("patch.png")).unwrap();
        mask.save(dir.path().join("patch.pos.png")).unwrap();

        let store = TemplateStore::new(vec![dir.path().to_path_buf()]);
        let matcher = Matcher::new(&store);
        let matches = matcher
            .find_all(&screen, &Specification::new("patch", 0.99))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].position.0 >= 20);
    }

    #[test]
    fn test_extra_alias_matches_under_primary_name() {
        let screen = noise(1, 40, 40);
        let alias_patch = crop_gray(&screen, (4, 4, 8, 8));
        // Primary template does not occur in the screen
        let primary = noise(3, 8, 8);

        let dir = TempDir::new().unwrap();
        primary.save(dir.path().join("primary.png")).unwrap();
        alias_patch.save(dir.path().join("alias.png")).unwrap();
        std::fs::write(dir.path().join("primary.extra"), "alias 0.99\n").unwrap();

        let store = TemplateStore::new(vec![dir.path().to_path_buf()]);
        let matcher = Matcher::new(&store);
        let matches = matcher
            .find_all(&screen, &Specification::new("primary", 0.999))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "primary");
        assert_eq!(matches[0].position, (4, 4));
    }

    #[test]
    fn test_zncc_perfect_match() {
        let img = noise(4, 10, 10);
        let score = zncc(&img, &img, 0, 0);
        assert!(score > 0.999, "identical images should score ~1.0: {score}");
    }
}
