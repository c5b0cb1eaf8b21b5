//! OCR engine
//!
//! Classifies segmented glyphs through a learned, persisted hash-to-text
//! cache. Unknown glyphs escalate to an interactive labeling collaborator
//! instead of being silently mis-read, so one bad frame never corrupts a
//! long unattended run.

pub mod labels;
pub mod segment;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use image::GrayImage;
use tracing::{debug, warn};

use crate::config::OcrConfig;
use crate::error::{Error, Result};

pub use labels::{glyph_hash, hash_similarity, LabelStore};
pub use segment::{segment_line, SegmentOptions};

/// Interactive fallback for glyphs the label store cannot classify.
///
/// The concrete mechanism (terminal prompt, web form) lives outside the
/// crate; whatever it returns is persisted as ground truth.
pub trait LabelPrompt: Send {
    fn request_label(&self, glyph: &GrayImage, hash: &str) -> anyhow::Result<String>;
}

/// A segmented glyph with its precomputed perceptual hash.
///
/// Preparation is pure CPU work with no shared state, so callers may fan
/// it out over the worker pool; label resolution stays serialized on the
/// engine (single-writer label store).
#[derive(Debug, Clone)]
pub struct PreparedGlyph {
    pub image: GrayImage,
    pub hash: String,
}

/// Segment a binarized line and hash each glyph, ready for label lookup.
pub fn prepare(line: &GrayImage, opts: &SegmentOptions) -> Vec<PreparedGlyph> {
    segment_line(line, opts)
        .into_iter()
        .map(|image| {
            let hash = glyph_hash(&image);
            PreparedGlyph { image, hash }
        })
        .collect()
}

/// Process-wide, stateful OCR service.
pub struct OcrEngine {
    store: LabelStore,
    prompt: Box<dyn LabelPrompt>,
    config: OcrConfig,
    debug_dir: Option<PathBuf>,
}

impl OcrEngine {
    /// Create the engine over an already-opened label store.
    pub fn new(
        store: LabelStore,
        prompt: Box<dyn LabelPrompt>,
        config: OcrConfig,
        debug_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            prompt,
            config,
            debug_dir,
        }
    }

    /// Recognize a single binarized text line, left to right.
    ///
    /// An all-background image yields the empty string without consulting
    /// the labeling collaborator.
    pub fn text(&mut self, line: &GrayImage) -> Result<String> {
        let opts = SegmentOptions::from(&self.config);
        let prepared = prepare(line, &opts);
        self.text_prepared(&prepared)
    }

    /// Classify pre-segmented glyphs (see [`prepare`]) left to right.
    pub fn text_prepared(&mut self, prepared: &[PreparedGlyph]) -> Result<String> {
        if prepared.is_empty() {
            return Ok(String::new());
        }

        let mut out = String::new();
        for glyph in prepared {
            out.push_str(&self.classify(glyph)?);
        }
        debug!("ocr: {} glyph(s) -> {:?}", prepared.len(), out);
        Ok(out)
    }

    /// Recognize a line and parse it as an integer, tolerating thousands
    /// separators and a trailing unit suffix. Parse failures surface as
    /// [`Error::Recognition`] with the offending image saved for
    /// diagnosis.
    pub fn read_int(&mut self, line: &GrayImage, what: &str) -> Result<i64> {
        let opts = SegmentOptions::from(&self.config);
        let prepared = prepare(line, &opts);
        self.read_int_prepared(&prepared, line, what)
    }

    /// Like [`OcrEngine::read_int`], over glyphs prepared elsewhere
    /// (e.g. on the worker pool). `source` is only used for the
    /// diagnostic dump on failure.
    pub fn read_int_prepared(
        &mut self,
        prepared: &[PreparedGlyph],
        source: &GrayImage,
        what: &str,
    ) -> Result<i64> {
        let text = self.text_prepared(prepared)?;
        match parse_int(&text) {
            Some(v) => Ok(v),
            None => {
                let image = self.dump_debug(source, what);
                Err(Error::Recognition {
                    message: format!("unparsable {what} digits: {text:?}"),
                    image,
                })
            }
        }
    }

    /// Re-read the label store's backing file (e.g. after an external
    /// edit).
    pub fn reload_labels(&mut self) -> Result<()> {
        self.store.reload()
    }

    /// Number of learned labels.
    pub fn label_count(&self) -> usize {
        self.store.len()
    }

    /// Classify one prepared glyph: nearest stored hash wins when
    /// similar enough, otherwise the labeling collaborator is asked and
    /// the answer persisted.
    fn classify(&mut self, glyph: &PreparedGlyph) -> Result<String> {
        if let Some((text, similarity)) = self.store.nearest(&glyph.hash) {
            if similarity >= self.config.accept_threshold {
                return Ok(text.to_string());
            }
            debug!(
                "glyph below accept threshold ({similarity:.3} < {}), prompting",
                self.config.accept_threshold
            );
        }

        let text = self.prompt.request_label(&glyph.image, &glyph.hash)?;
        self.store.insert(glyph.hash.clone(), text.clone())?;
        Ok(text)
    }

    /// Save a failed crop as PNG for offline diagnosis. Best effort.
    fn dump_debug(&self, img: &GrayImage, what: &str) -> Option<PathBuf> {
        let dir = self.debug_dir.as_ref()?;
        if std::fs::create_dir_all(dir).is_err() {
            return None;
        }
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let slug: String = what
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let path = dir.join(format!("{slug}_{stamp}.png"));
        match img.save(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("failed to save debug image: {e}");
                None
            }
        }
    }
}

/// Parse OCR digits, dropping thousands separators and a trailing unit
/// suffix (e.g. `"1,234人"` -> `1234`). Anything else is a parse failure,
/// never a guess.
pub fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text
        .trim()
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}
