//! Engine configuration
//!
//! All tunables live in one TOML-backed struct built once at startup and
//! passed by reference into the engine. There are no mutable module
//! globals; swapping behavior means constructing a different config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Asset and data paths
    pub assets: AssetConfig,
    /// Template matching settings
    pub matching: MatchingConfig,
    /// Action/wait layer settings
    pub action: ActionConfig,
    /// OCR settings
    pub ocr: OcrConfig,
}

/// Asset and data path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Template search directories, highest priority first. The built-in
    /// asset directory goes last so overrides win.
    pub template_dirs: Vec<PathBuf>,
    /// OCR label store file (JSON lines).
    pub label_path: PathBuf,
    /// Where to dump diagnostic images for failed recognitions.
    /// `None` disables the dump.
    pub debug_image_dir: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("rs", "paddock", "paddock")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"));

        Self {
            template_dirs: vec![data_dir.join("templates")],
            label_path: data_dir.join("ocr_labels.jsonl"),
            debug_image_dir: None,
        }
    }
}

/// Template matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Default similarity threshold for specifications built from a bare
    /// name (0.0 - 1.0).
    pub default_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_threshold: 0.9,
        }
    }
}

/// Action/wait layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Sleep between polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Position tolerance in pixels for a match to count as "the same"
    /// during a stability wait.
    pub stable_tolerance_px: u32,
    /// Wait budget for scene signature templates, in seconds.
    pub scene_timeout_secs: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            stable_tolerance_px: 2,
            scene_timeout_secs: 30,
        }
    }
}

/// OCR settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Minimum hash similarity to accept a cached label (0.0 - 1.0).
    pub accept_threshold: f32,
    /// Merge glyph candidates whose horizontal gap is at most this many
    /// pixels (strokes of one glyph).
    pub merge_gap_px: u32,
    /// A gap wider than this fraction of the dominant glyph width starts
    /// a new character.
    pub split_gap_ratio: f32,
    /// Combined width beyond this fraction of the dominant glyph width
    /// starts a new character.
    pub max_width_ratio: f32,
    /// Candidates shorter than this fraction of the dominant glyph
    /// height count as punctuation and split from a full-height neighbor.
    pub short_height_ratio: f32,
    /// Binarization threshold for text crops.
    pub binarize_threshold: u8,
    /// Worker threads for parallel recognition of independent regions.
    pub workers: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.8,
            merge_gap_px: 2,
            split_gap_ratio: 0.35,
            max_width_ratio: 1.2,
            short_height_ratio: 0.55,
            binarize_threshold: 130,
            workers: 4,
        }
    }
}

/// Load configuration from file.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file.
pub fn save_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
