//! The command scene
//!
//! The main single-mode screen where turn commands (training, racing,
//! resting, going out) are chosen. Most other scenes navigate back
//! through here.

use crate::engine::{Engine, REFERENCE_WIDTH};
use crate::error::Result;
use crate::scaling::Rect;
use crate::scene::{scene_timeout, Context, SceneHolder, SceneId};
use crate::templates;
use crate::vision::bright_fraction;

/// How to leave each scene that can reach the command screen with one
/// tap. Scenes not listed require no exit action.
const EXIT_TAPS: &[(SceneId, &str)] = &[
    (SceneId::Training, templates::RETURN_BUTTON),
    (SceneId::RaceMenu, templates::RETURN_BUTTON),
    (SceneId::GoOutMenu, templates::CANCEL_BUTTON),
];

/// Vitality gauge region, authored at the reference width.
const VITALITY_BAR: Rect = (148, 106, 180, 8);

/// Gauge pixels brighter than this count as filled.
const VITALITY_BRIGHT: u8 = 180;

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandScene;

impl CommandScene {
    /// Animation can briefly cover UI elements; recognition retries.
    const MAX_RECOGNITION_RETRY: usize = 3;

    /// Navigate to the command screen and confirm arrival.
    ///
    /// Re-entering while already current taps nothing and only
    /// re-confirms the signature templates.
    pub fn enter(engine: &mut Engine, holder: &mut SceneHolder) -> Result<Self> {
        let timeout = scene_timeout(engine);

        if holder.current() != SceneId::Command {
            if let Some((_, exit)) = EXIT_TAPS.iter().find(|(id, _)| *id == holder.current()) {
                engine.wait_tap_image(&[engine.spec(exit)], timeout)?;
            }
        }

        engine.wait_image(
            &[
                engine.spec(templates::SINGLE_MODE_COMMAND_TRAINING),
                engine.spec(templates::SINGLE_MODE_FORMAL_RACE_BANNER),
            ],
            timeout,
        )?;

        holder.set_current(SceneId::Command);
        Ok(Self)
    }

    /// Read command availability and the vitality gauge into `ctx`.
    pub fn recognize(&mut self, engine: &mut Engine, ctx: &mut Context) -> Result<()> {
        engine.run_with_retry(Self::MAX_RECOGNITION_RETRY, |engine| {
            ctx.has_health_care = engine
                .count_image(&[engine.spec(templates::SINGLE_MODE_COMMAND_HEALTH_CARE)])?
                > 0;
            ctx.has_scheduled_race = engine.count_image(&[
                engine.spec(templates::SINGLE_MODE_SCHEDULED_RACE_OPENING_BANNER)
            ])? > 0;
            ctx.can_go_out_with_friend = engine
                .count_image(&[engine.spec(templates::SINGLE_MODE_GO_OUT_FRIEND_ICON)])?
                > 0;

            let frame = engine.screenshot()?;
            let bar = frame.crop_gray(engine.scaler().rect(VITALITY_BAR, REFERENCE_WIDTH));
            ctx.vitality = bright_fraction(&bar, VITALITY_BRIGHT);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::test_support::*;
    use tempfile::TempDir;

    fn command_screen(config: &crate::config::EngineConfig) -> image::GrayImage {
        let training = noise_gray(20, 10, 8);
        save_template(config, templates::SINGLE_MODE_COMMAND_TRAINING, &training);
        save_template(
            config,
            templates::SINGLE_MODE_FORMAL_RACE_BANNER,
            &noise_gray(21, 10, 8),
        );

        let mut screen = noise_gray(1, 120, 200);
        paste(&mut screen, &training, 10, 170);
        screen
    }

    #[test]
    fn test_enter_when_current_taps_nothing() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let screen = command_screen(&config);

        let device = ScriptedDevice::new(vec![frame_from_gray(&screen)]);
        let taps = device.taps.clone();
        let mut engine = engine_with(device, config);

        let mut holder = SceneHolder::new();
        holder.set_current(SceneId::Command);

        CommandScene::enter(&mut engine, &mut holder).unwrap();
        assert_eq!(holder.current(), SceneId::Command);
        assert!(taps.lock().unwrap().is_empty());
    }

    #[test]
    fn test_enter_from_training_taps_return() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());

        let ret = noise_gray(22, 10, 6);
        save_template(&config, templates::RETURN_BUTTON, &ret);
        let mut training_screen = noise_gray(2, 120, 200);
        paste(&mut training_screen, &ret, 30, 180);

        let command = command_screen(&config);

        let device = ScriptedDevice::new(vec![
            frame_from_gray(&training_screen),
            frame_from_gray(&command),
        ]);
        let taps = device.taps.clone();
        let mut engine = engine_with(device, config);

        let mut holder = SceneHolder::new();
        holder.set_current(SceneId::Training);

        CommandScene::enter(&mut engine, &mut holder).unwrap();
        assert_eq!(holder.current(), SceneId::Command);

        let recorded = taps.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], (30, 180, 10, 6));
    }

    #[test]
    fn test_recognize_reads_flags_and_vitality() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let mut screen = command_screen(&config);

        let health = noise_gray(23, 8, 8);
        save_template(&config, templates::SINGLE_MODE_COMMAND_HEALTH_CARE, &health);
        save_template(
            &config,
            templates::SINGLE_MODE_SCHEDULED_RACE_OPENING_BANNER,
            &noise_gray(24, 8, 8),
        );
        save_template(
            &config,
            templates::SINGLE_MODE_GO_OUT_FRIEND_ICON,
            &noise_gray(25, 8, 8),
        );
        paste(&mut screen, &health, 60, 150);

        // Fill the vitality gauge region: screen is 120 wide, so the
        // authored rect scales by 120/540.
        for y in 23..26 {
            for x in 32..73 {
                screen.put_pixel(x, y, image::Luma([255]));
            }
        }

        let device = ScriptedDevice::new(vec![frame_from_gray(&screen)]);
        let mut engine = engine_with(device, config);
        let mut holder = SceneHolder::new();
        let mut scene = CommandScene::enter(&mut engine, &mut holder).unwrap();

        let mut ctx = Context::new();
        scene.recognize(&mut engine, &mut ctx).unwrap();

        assert!(ctx.has_health_care);
        assert!(!ctx.has_scheduled_race);
        assert!(!ctx.can_go_out_with_friend);
        assert!(ctx.vitality > 0.8, "gauge was filled: {}", ctx.vitality);
    }
}
