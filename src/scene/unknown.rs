//! The unknown scene
//!
//! Initial state of the scene graph: no preconditions, no signature
//! templates, nothing to recognize. Jobs fall back here when they lose
//! track of where the game is.

use crate::engine::Engine;
use crate::error::Result;
use crate::scene::{Context, SceneHolder, SceneId};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownScene;

impl UnknownScene {
    /// Always succeeds; performs no navigation and waits for nothing.
    pub fn enter(_engine: &mut Engine, holder: &mut SceneHolder) -> Result<Self> {
        holder.set_current(SceneId::Unknown);
        Ok(Self)
    }

    pub fn recognize(&mut self, _engine: &mut Engine, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }
}
