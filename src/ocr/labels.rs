//! Learned glyph label store
//!
//! Maps perceptual image hashes to recognized text. The store is a JSON
//! lines file loaded eagerly at engine construction and appended to when
//! a new glyph is labeled, so long unattended runs keep learning without
//! rewriting the file. Single-writer discipline: only the OCR engine
//! mutates it.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Hash grid side; 16x16 cells give a 256-bit hash.
const HASH_SIZE: u32 = 16;

/// A persisted glyph label. Labels learned through the interactive
/// prompt are ground truth (confidence 1.0); the field exists so
/// externally merged label files can carry weaker entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub hash: String,
    pub text: String,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

/// Compute the perceptual hash of a glyph crop: resize to a 16x16 grid,
/// threshold each cell at the mean intensity, and pack the bits as hex.
pub fn glyph_hash(img: &GrayImage) -> String {
    let small = image::imageops::resize(
        img,
        HASH_SIZE,
        HASH_SIZE,
        image::imageops::FilterType::Triangle,
    );

    let sum: u64 = small.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum / (HASH_SIZE * HASH_SIZE) as u64) as u8;

    let mut hex = String::with_capacity((HASH_SIZE * HASH_SIZE / 4) as usize);
    let mut nibble = 0u8;
    for (i, p) in small.pixels().enumerate() {
        nibble <<= 1;
        if p.0[0] > mean {
            nibble |= 1;
        }
        if i % 4 == 3 {
            hex.push(char::from_digit(nibble as u32, 16).unwrap_or('0'));
            nibble = 0;
        }
    }
    hex
}

/// Bitwise similarity of two hex hashes in [0.0, 1.0]. Hashes of
/// different lengths never match.
pub fn hash_similarity(a: &str, b: &str) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let total_bits = (a.len() * 4) as u32;
    let mut differing = 0u32;
    for (ca, cb) in a.chars().zip(b.chars()) {
        let na = ca.to_digit(16).unwrap_or(0) as u8;
        let nb = cb.to_digit(16).unwrap_or(0) as u8;
        differing += (na ^ nb).count_ones();
    }

    1.0 - differing as f32 / total_bits as f32
}

/// File-backed hash-to-text label cache.
pub struct LabelStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl LabelStore {
    /// Open the store, eagerly loading every label from disk. A missing
    /// file is an empty store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self {
            path,
            entries: HashMap::new(),
        };
        store.reload()?;
        info!("label store loaded ({} labels)", store.entries.len());
        Ok(store)
    }

    /// Number of known labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-read the backing file, replacing in-memory state. Later lines
    /// win when a hash appears twice.
    pub fn reload(&mut self) -> Result<()> {
        self.entries.clear();
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Label>(line) {
                Ok(label) => {
                    self.entries.insert(label.hash, label.text);
                }
                Err(e) => warn!("skipping malformed label line: {e}"),
            }
        }
        Ok(())
    }

    /// Persist a new label and add it to the in-memory map.
    pub fn insert(&mut self, hash: String, text: String) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let label = Label {
            hash: hash.clone(),
            text: text.clone(),
            confidence: 1.0,
        };
        let line = serde_json::to_string(&label).map_err(std::io::Error::other)?;
        writeln!(file, "{line}")?;

        debug!("learned label {:?} for hash {}", text, hash);
        self.entries.insert(hash, text);
        Ok(())
    }

    /// Nearest-neighbour lookup: the stored label whose hash is most
    /// similar to `hash`, with its similarity.
    pub fn nearest(&self, hash: &str) -> Option<(&str, f32)> {
        self.entries
            .iter()
            .map(|(h, text)| (text.as_str(), hash_similarity(hash, h)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
