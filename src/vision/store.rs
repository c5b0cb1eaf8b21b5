//! Template asset store
//!
//! Loads named reference images from a prioritized list of search
//! directories and caches the decoded grayscale images process-wide.
//! Override directories are checked before the built-in asset directory,
//! which lets a deployment swap individual templates without touching
//! the shipped set.
//!
//! Alongside `<name>.<ext>` two sidecar files are recognized:
//! - `<name>.pos.<ext>` — a position mask constraining where the
//!   template may match.
//! - `<name>.extra` — additional acceptable template names (one
//!   `name [threshold]` per line) merged into any match call for
//!   `<name>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

const EXTENSIONS: &[&str] = &["png", "jpg", "bmp"];

/// A decoded, cached reference template.
#[derive(Debug)]
pub struct Template {
    /// Template name (file stem).
    pub name: String,
    /// Grayscale reference image.
    pub gray: GrayImage,
    /// Optional position mask; matches are restricted to locations where
    /// this image is non-zero.
    pub pos_mask: Option<GrayImage>,
    /// Extra acceptable templates, with an optional per-alias threshold.
    pub extras: Vec<(String, Option<f32>)>,
}

impl Template {
    /// Template dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.gray.dimensions()
    }
}

/// Process-wide cache of decoded template assets.
pub struct TemplateStore {
    search_dirs: Vec<PathBuf>,
    cache: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateStore {
    /// Create a store over the given search directories, highest
    /// priority first.
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        info!("template store over {} search dirs", search_dirs.len());
        Self {
            search_dirs,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load a template by name, hitting the cache when possible.
    ///
    /// A missing asset is a packaging bug and returns
    /// [`Error::NotFound`]; it is never retried.
    pub fn load(&self, name: &str) -> Result<Arc<Template>> {
        if let Some(tmpl) = self.cache.read().get(name) {
            return Ok(tmpl.clone());
        }

        let tmpl = Arc::new(self.load_uncached(name)?);
        self.cache.write().insert(name.to_string(), tmpl.clone());
        Ok(tmpl)
    }

    /// Drop all cached templates so the next load re-reads from disk.
    pub fn reload(&self) {
        let mut cache = self.cache.write();
        info!("clearing template cache ({} entries)", cache.len());
        cache.clear();
    }

    /// Number of templates currently cached.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    fn load_uncached(&self, name: &str) -> Result<Template> {
        let path = self
            .resolve_image(name)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
                searched: self.search_dirs.clone(),
            })?;

        let gray = decode_gray(&path, name)?;
        let pos_mask = match self.resolve_image(&format!("{name}.pos")) {
            Some(p) => Some(decode_gray(&p, name)?),
            None => None,
        };
        let extras = match self.resolve_file(&format!("{name}.extra")) {
            Some(p) => parse_extra_file(&p)?,
            None => Vec::new(),
        };

        debug!(
            "loaded template '{}' from {:?} (mask: {}, extras: {})",
            name,
            path,
            pos_mask.is_some(),
            extras.len()
        );

        Ok(Template {
            name: name.to_string(),
            gray,
            pos_mask,
            extras,
        })
    }

    /// Find an image file for `stem` by trying the known extensions in
    /// every search dir, highest priority first.
    fn resolve_image(&self, stem: &str) -> Option<PathBuf> {
        for dir in &self.search_dirs {
            for ext in EXTENSIONS {
                let path = dir.join(format!("{stem}.{ext}"));
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    fn resolve_file(&self, filename: &str) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(filename))
            .find(|path| path.is_file())
    }
}

fn decode_gray(path: &Path, name: &str) -> Result<GrayImage> {
    let img = image::open(path).map_err(|e| Error::Recognition {
        message: format!("failed to decode template '{name}' at {path:?}: {e}"),
        image: None,
    })?;
    Ok(img.to_luma8())
}

/// Parse an `.extra` alias file: one `name [threshold]` per line,
/// `#` comments and blank lines ignored.
fn parse_extra_file(path: &Path) -> Result<Vec<(String, Option<f32>)>> {
    let content = std::fs::read_to_string(path)?;
    let mut extras = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let name = match parts.next() {
            Some(n) => n.to_string(),
            None => continue,
        };
        let threshold = parts.next().and_then(|t| t.parse::<f32>().ok());
        extras.push((name, threshold));
    }

    Ok(extras)
}
