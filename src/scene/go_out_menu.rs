//! The go-out menu scene
//!
//! Popup listing the available outing options. Cancel returns to the
//! command screen.

use crate::engine::Engine;
use crate::error::Result;
use crate::scene::{scene_timeout, CommandScene, Context, SceneHolder, SceneId};
use crate::templates;

use std::time::Duration;

/// Settle time for the popup animation.
const MENU_STABLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Default)]
pub struct GoOutMenuScene;

impl GoOutMenuScene {
    /// Open the go-out menu from the command screen and confirm the
    /// popup has settled. Idempotent when already current.
    pub fn enter(engine: &mut Engine, holder: &mut SceneHolder) -> Result<Self> {
        let timeout = scene_timeout(engine);

        if holder.current() != SceneId::GoOutMenu {
            CommandScene::enter(engine, holder)?;
            engine.wait_tap_image(
                &[engine.spec(templates::SINGLE_MODE_COMMAND_GO_OUT)],
                timeout,
            )?;
        }

        engine.wait_image_stable(
            &[engine.spec(templates::SINGLE_MODE_GO_OUT_MENU_TITLE)],
            MENU_STABLE,
            timeout,
        )?;

        holder.set_current(SceneId::GoOutMenu);
        Ok(Self)
    }

    /// Count the outing options on the menu into `ctx`.
    pub fn recognize(&mut self, engine: &mut Engine, ctx: &mut Context) -> Result<()> {
        ctx.go_out_options = engine.count_image(&[
            engine.spec(templates::SINGLE_MODE_GO_OUT_OPTION_ICON)
        ])?;
        Ok(())
    }
}
