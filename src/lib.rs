//! paddock - pixel-driven perception and navigation for UI-only game automation
//!
//! Drives an external mobile game purely through screenshots and
//! synthetic input: fuzzy template matching with coordinate
//! normalization, polling waits with deterministic timeout semantics, a
//! character-segmentation OCR pipeline backed by a learned label cache,
//! and a scene graph that recognizes and transitions between UI screens.
//!
//! The capture/input backend, template image assets, decision heuristics,
//! and job scripts are external collaborators; see [`device::Device`]
//! and [`ocr::LabelPrompt`] for the seams they plug into.

pub mod action;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod ocr;
pub mod pool;
pub mod scaling;
pub mod scene;
pub mod templates;
pub mod vision;

pub use config::EngineConfig;
pub use engine::{Engine, REFERENCE_WIDTH};
pub use error::{Error, Result};
pub use scene::{Context, Scene, SceneHolder, SceneId};
pub use vision::{Match, Specification};

use tracing_subscriber::EnvFilter;

/// Install a global tracing subscriber for the embedding job binary,
/// honoring `RUST_LOG`. Safe to call once at startup.
pub fn init_tracing() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
