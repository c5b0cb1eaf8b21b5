//! Engine wiring
//!
//! One `Engine` owns the capture/input device, the template store, and
//! the OCR service for the lifetime of the process. It is constructed
//! once at startup from an [`EngineConfig`] and passed by reference into
//! scenes and jobs; configuration never lives in mutable globals.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::device::{Device, Frame};
use crate::error::Result;
use crate::ocr::{LabelPrompt, LabelStore, OcrEngine};
use crate::scaling::{Point, Rect, Scaler};
use crate::vision::{Specification, TemplateStore};

/// Width the game's UI coordinates and templates are authored against.
pub const REFERENCE_WIDTH: u32 = 540;

/// The perception/navigation engine.
///
/// The device is a single shared, non-thread-safe resource; the engine
/// assumes exclusive access and serializes every screenshot, tap, and
/// swipe through it.
pub struct Engine {
    device: Box<dyn Device>,
    templates: TemplateStore,
    ocr: OcrEngine,
    config: EngineConfig,
    last_width: u32,
}

impl Engine {
    /// Build an engine: opens the label store eagerly and prepares the
    /// template cache over the configured search directories.
    pub fn new(
        device: Box<dyn Device>,
        prompt: Box<dyn LabelPrompt>,
        config: EngineConfig,
    ) -> Result<Self> {
        let templates = TemplateStore::new(config.assets.template_dirs.clone());
        let store = LabelStore::open(&config.assets.label_path)?;
        let ocr = OcrEngine::new(
            store,
            prompt,
            config.ocr.clone(),
            config.assets.debug_image_dir.clone(),
        );

        Ok(Self {
            device,
            templates,
            ocr,
            config,
            last_width: 0,
        })
    }

    /// Capture the current screen through the device.
    pub fn screenshot(&mut self) -> Result<Frame> {
        let frame = self.device.screenshot()?;
        self.last_width = frame.width;
        Ok(frame)
    }

    /// Tap somewhere inside the given rectangle.
    pub fn tap(&mut self, rect: Rect) -> Result<()> {
        self.device.tap(rect)?;
        Ok(())
    }

    /// Swipe between two points.
    pub fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> Result<()> {
        self.device.swipe(from, to, duration)?;
        Ok(())
    }

    /// Scaler targeting the most recently captured width. Before the
    /// first screenshot this is the reference width (identity mapping).
    pub fn scaler(&self) -> Scaler {
        Scaler::new(if self.last_width == 0 {
            REFERENCE_WIDTH
        } else {
            self.last_width
        })
    }

    /// A specification for `name` at the configured default threshold.
    pub fn spec(&self, name: &str) -> Specification {
        Specification::new(name, self.config.matching.default_threshold)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn ocr(&mut self) -> &mut OcrEngine {
        &mut self.ocr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::test_support::*;
    use tempfile::TempDir;

    #[test]
    fn test_scaler_tracks_captured_width() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let device = ScriptedDevice::new(vec![frame_from_gray(&noise_gray(1, 120, 60))]);
        let mut engine = engine_with(device, config);

        // Identity before the first capture
        assert_eq!(engine.scaler().actual_width(), REFERENCE_WIDTH);

        engine.screenshot().unwrap();
        assert_eq!(engine.scaler().actual_width(), 120);
        assert_eq!(engine.scaler().scale(270, REFERENCE_WIDTH), 60);
    }
}
