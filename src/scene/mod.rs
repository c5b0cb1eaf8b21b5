//! Scene graph
//!
//! UI screens as a closed set of named states. Each scene module knows
//! how to navigate into its screen from wherever the holder currently is
//! (an explicit per-scene exit-tap table, not generic dispatch) and how
//! to extract domain data out of it. Transitions block on the target
//! scene's signature templates; a timeout there propagates to the caller
//! untouched, and the surrounding job decides between retry, falling
//! back to `Unknown`, or aborting.

pub mod command;
pub mod context;
pub mod go_out_menu;
pub mod race_menu;
pub mod scroll;
pub mod training;
pub mod unknown;

use std::fmt;
use std::time::Duration;

pub use command::CommandScene;
pub use context::{Context, RaceEntry, TrainingGain};
pub use go_out_menu::GoOutMenuScene;
pub use race_menu::RaceMenuScene;
pub use scroll::VerticalScroll;
pub use training::TrainingScene;
pub use unknown::UnknownScene;

use crate::engine::Engine;
use crate::error::Result;

/// Identifier of a named screen. The string ids are the stable contract
/// between job scripts and the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneId {
    Unknown,
    Command,
    Training,
    RaceMenu,
    GoOutMenu,
}

impl SceneId {
    pub const fn name(self) -> &'static str {
        match self {
            SceneId::Unknown => "unknown",
            SceneId::Command => "single-mode-command",
            SceneId::Training => "single-mode-training",
            SceneId::RaceMenu => "single-mode-race-menu",
            SceneId::GoOutMenu => "single-mode-go-out-menu",
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks which scene is current. This is a back-reference only: it
/// holds the cheap scene id, never the scene value, and is updated on
/// every successful transition.
#[derive(Debug, Clone)]
pub struct SceneHolder {
    current: SceneId,
}

impl SceneHolder {
    /// Start in the `Unknown` scene, which has no preconditions.
    pub fn new() -> Self {
        Self {
            current: SceneId::Unknown,
        }
    }

    pub fn current(&self) -> SceneId {
        self.current
    }

    pub(crate) fn set_current(&mut self, id: SceneId) {
        self.current = id;
    }
}

impl Default for SceneHolder {
    fn default() -> Self {
        Self::new()
    }
}

/// A recognized scene value, one variant per named screen.
#[derive(Debug, Clone)]
pub enum Scene {
    Unknown(UnknownScene),
    Command(CommandScene),
    Training(TrainingScene),
    RaceMenu(RaceMenuScene),
    GoOutMenu(GoOutMenuScene),
}

impl Scene {
    pub fn id(&self) -> SceneId {
        match self {
            Scene::Unknown(_) => SceneId::Unknown,
            Scene::Command(_) => SceneId::Command,
            Scene::Training(_) => SceneId::Training,
            Scene::RaceMenu(_) => SceneId::RaceMenu,
            Scene::GoOutMenu(_) => SceneId::GoOutMenu,
        }
    }

    pub fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Extract domain data from the now-current screen into `ctx`.
    /// Reads only through the device, writes only into the context.
    pub fn recognize(&mut self, engine: &mut Engine, ctx: &mut Context) -> Result<()> {
        match self {
            Scene::Unknown(s) => s.recognize(engine, ctx),
            Scene::Command(s) => s.recognize(engine, ctx),
            Scene::Training(s) => s.recognize(engine, ctx),
            Scene::RaceMenu(s) => s.recognize(engine, ctx),
            Scene::GoOutMenu(s) => s.recognize(engine, ctx),
        }
    }
}

/// Wait budget for a scene's signature templates.
pub(crate) fn scene_timeout(engine: &Engine) -> Duration {
    Duration::from_secs(engine.config().action.scene_timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::test_support::*;
    use tempfile::TempDir;

    #[test]
    fn test_scene_dispatch() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let device = ScriptedDevice::new(vec![frame_from_gray(&noise_gray(1, 20, 20))]);
        let mut engine = engine_with(device, config);

        let mut scene = Scene::Unknown(UnknownScene);
        assert_eq!(scene.id(), SceneId::Unknown);
        assert_eq!(scene.name(), "unknown");

        let mut ctx = Context::new();
        scene.recognize(&mut engine, &mut ctx).unwrap();
    }

    #[test]
    fn test_scene_names_are_stable() {
        assert_eq!(SceneId::Unknown.name(), "unknown");
        assert_eq!(SceneId::Command.name(), "single-mode-command");
        assert_eq!(SceneId::Training.name(), "single-mode-training");
        assert_eq!(SceneId::RaceMenu.name(), "single-mode-race-menu");
        assert_eq!(SceneId::GoOutMenu.name(), "single-mode-go-out-menu");
    }

    #[test]
    fn test_holder_starts_unknown() {
        let holder = SceneHolder::new();
        assert_eq!(holder.current(), SceneId::Unknown);
    }
}
