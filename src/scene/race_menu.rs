//! The race menu scene
//!
//! A scrollable list of race entries. Each visible entry is located by
//! its fan icon; the number-one fan count next to the icon identifies
//! the race to the decision layer.

use crate::engine::{Engine, REFERENCE_WIDTH};
use crate::error::Result;
use crate::scaling::Rect;
use crate::scene::{
    scene_timeout, CommandScene, Context, RaceEntry, SceneHolder, SceneId, VerticalScroll,
};
use crate::templates;
use crate::vision::{binarize_inv, Matcher};

/// Fan count readout relative to the fan icon position, authored at the
/// reference width.
const FAN_COUNT_OFFSET: Rect = (14, 0, 140, 18);

/// Swipe origin and page height for the list, authored at the reference
/// width.
const SCROLL_ORIGIN: (u32, u32) = (15, 600);
const SCROLL_PAGE: u32 = 100;
const SCROLL_MAX_PAGE: u32 = 15;

#[derive(Debug, Clone)]
pub struct RaceMenuScene {
    scroll: VerticalScroll,
}

impl RaceMenuScene {
    /// Navigate from the command screen into the race menu and confirm
    /// arrival. Idempotent when already current.
    pub fn enter(engine: &mut Engine, holder: &mut SceneHolder) -> Result<Self> {
        let timeout = scene_timeout(engine);

        if holder.current() != SceneId::RaceMenu {
            CommandScene::enter(engine, holder)?;
            engine.wait_tap_image(
                &[
                    engine.spec(templates::SINGLE_MODE_COMMAND_RACE),
                    engine.spec(templates::SINGLE_MODE_FORMAL_RACE_BANNER),
                ],
                timeout,
            )?;
        }

        engine.wait_image(
            &[engine.spec(templates::SINGLE_MODE_RACE_MENU_FAN_ICON)],
            timeout,
        )?;

        holder.set_current(SceneId::RaceMenu);

        let scaler = engine.scaler();
        let origin = scaler.point(SCROLL_ORIGIN, REFERENCE_WIDTH);
        let page = scaler.scale(SCROLL_PAGE, REFERENCE_WIDTH);
        Ok(Self {
            scroll: VerticalScroll::new(origin, page, SCROLL_MAX_PAGE),
        })
    }

    /// Scroll through the list and read every visible entry into
    /// `ctx.races`. Pages overlap, so entries may repeat; callers dedupe
    /// by fan count.
    pub fn recognize(&mut self, engine: &mut Engine, ctx: &mut Context) -> Result<()> {
        let binarize_threshold = engine.config().ocr.binarize_threshold;
        ctx.races.clear();

        while self.scroll.next(engine)? {
            let frame = engine.screenshot()?;
            let gray = frame.gray();
            let scaler = engine.scaler();

            let matches = {
                let matcher = Matcher::new(engine.templates());
                matcher.find_all(
                    &gray,
                    &engine.spec(templates::SINGLE_MODE_RACE_MENU_FAN_ICON),
                )?
            };

            for m in matches {
                let (dx, dy, w, h) = scaler.rect(FAN_COUNT_OFFSET, REFERENCE_WIDTH);
                let bbox = (
                    m.position.0 + m.size.0 + dx,
                    m.position.1.saturating_sub(dy),
                    w,
                    h,
                );
                let crop = binarize_inv(&frame.crop_gray(bbox), binarize_threshold);
                let fan_count = engine.ocr().read_int(&crop, "race fan count")?;
                ctx.races.push(RaceEntry {
                    position: m.position,
                    fan_count,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::test_support::*;
    use tempfile::TempDir;

    fn setup_templates(config: &crate::config::EngineConfig) {
        save_template(
            config,
            templates::SINGLE_MODE_COMMAND_TRAINING,
            &noise_gray(20, 10, 8),
        );
        save_template(
            config,
            templates::SINGLE_MODE_FORMAL_RACE_BANNER,
            &noise_gray(21, 10, 8),
        );
        save_template(
            config,
            templates::SINGLE_MODE_COMMAND_RACE,
            &noise_gray(26, 10, 8),
        );
        save_template(
            config,
            templates::SINGLE_MODE_RACE_MENU_FAN_ICON,
            &noise_gray(27, 8, 8),
        );
    }

    #[test]
    fn test_enter_from_command_navigates_via_race_button() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        setup_templates(&config);

        let training_btn = noise_gray(20, 10, 8);
        let race_btn = noise_gray(26, 10, 8);
        let fan_icon = noise_gray(27, 8, 8);

        let mut command = noise_gray(1, 108, 192);
        paste(&mut command, &training_btn, 20, 160);
        paste(&mut command, &race_btn, 60, 160);
        let mut menu = noise_gray(2, 108, 192);
        paste(&mut menu, &fan_icon, 10, 60);

        let device = ScriptedDevice::new(vec![
            frame_from_gray(&command), // command signature wait
            frame_from_gray(&command), // race button tap
            frame_from_gray(&menu),    // fan icon signature
        ]);
        let taps = device.taps.clone();
        let mut engine = engine_with(device, config);

        let mut holder = SceneHolder::new();
        holder.set_current(SceneId::Command);
        RaceMenuScene::enter(&mut engine, &mut holder).unwrap();

        assert_eq!(holder.current(), SceneId::RaceMenu);
        assert_eq!(taps.lock().unwrap().len(), 1);
        assert_eq!(taps.lock().unwrap()[0], (60, 160, 10, 8));
    }

    #[test]
    fn test_recognize_reads_visible_entries() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        setup_templates(&config);

        let fan_icon = noise_gray(27, 8, 8);
        let mut menu = noise_gray(2, 108, 192);
        paste(&mut menu, &fan_icon, 10, 40);
        paste(&mut menu, &fan_icon, 10, 100);
        // Give each entry a readable digit region: a solid block right of
        // the icon becomes one glyph, labeled by the prompt stub.
        for y in 40..48 {
            for x in 25..31 {
                menu.put_pixel(x, y, image::Luma([0]));
            }
        }
        for y in 100..108 {
            for x in 25..31 {
                menu.put_pixel(x, y, image::Luma([0]));
            }
        }

        let device = ScriptedDevice::new(vec![frame_from_gray(&menu)]);
        let mut engine = engine_with(device, config);

        let mut holder = SceneHolder::new();
        holder.set_current(SceneId::RaceMenu);
        let mut scene = RaceMenuScene::enter(&mut engine, &mut holder).unwrap();

        let mut ctx = Context::new();
        scene.recognize(&mut engine, &mut ctx).unwrap();

        assert_eq!(ctx.races.len(), 2);
        assert_eq!(ctx.races[0].position, (10, 40));
        assert_eq!(ctx.races[1].position, (10, 100));
        assert!(ctx.races.iter().all(|r| r.fan_count >= 0));
    }
}
