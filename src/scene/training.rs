//! The training scene
//!
//! Five training slots along the bottom; tapping a slot previews the
//! stat gains it would give. Recognition taps each slot in turn (the
//! device stays single-owner), then fans the per-crop segmentation out
//! over the worker pool before resolving labels serially.

use std::time::Duration;

use image::GrayImage;

use crate::engine::{Engine, REFERENCE_WIDTH};
use crate::error::Result;
use crate::ocr::{prepare, PreparedGlyph, SegmentOptions};
use crate::pool;
use crate::scaling::Rect;
use crate::scene::{scene_timeout, CommandScene, Context, SceneHolder, SceneId, TrainingGain};
use crate::templates;
use crate::vision::binarize_inv;

pub const SLOT_COUNT: usize = 5;

/// Tappable slot buttons, authored at the reference width.
const SLOT_RECTS: [Rect; SLOT_COUNT] = [
    (12, 795, 96, 110),
    (116, 795, 96, 110),
    (220, 795, 96, 110),
    (324, 795, 96, 110),
    (428, 795, 96, 110),
];

/// Stat gain readouts (speed, stamina, power, guts, wisdom), authored at
/// the reference width.
const STAT_RECTS: [Rect; 5] = [
    (27, 186, 62, 18),
    (118, 186, 62, 18),
    (209, 186, 62, 18),
    (300, 186, 62, 18),
    (391, 186, 62, 18),
];

/// Settle time after tapping a slot before reading the preview.
const PREVIEW_STABLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingScene;

impl TrainingScene {
    /// Navigate from the command screen into training and confirm
    /// arrival. Idempotent when already current.
    pub fn enter(engine: &mut Engine, holder: &mut SceneHolder) -> Result<Self> {
        let timeout = scene_timeout(engine);

        if holder.current() != SceneId::Training {
            CommandScene::enter(engine, holder)?;
            engine.wait_tap_image(
                &[engine.spec(templates::SINGLE_MODE_COMMAND_TRAINING)],
                timeout,
            )?;
        }

        engine.wait_image_stable(
            &[engine.spec(templates::SINGLE_MODE_TRAINING_CONFIRM)],
            PREVIEW_STABLE,
            timeout,
        )?;

        holder.set_current(SceneId::Training);
        Ok(Self)
    }

    /// Tap through every slot and read its stat-gain preview into
    /// `ctx.trainings`.
    ///
    /// Screenshots are serialized through the device; only the CPU-bound
    /// segmentation runs on the worker pool.
    pub fn recognize(&mut self, engine: &mut Engine, ctx: &mut Context) -> Result<()> {
        let timeout = scene_timeout(engine);
        let binarize_threshold = engine.config().ocr.binarize_threshold;
        let opts = SegmentOptions::from(&engine.config().ocr);
        let workers = engine.config().ocr.workers;

        // Serial phase: drive the device slot by slot, collect raw crops
        let mut lines: Vec<GrayImage> = Vec::with_capacity(SLOT_COUNT * STAT_RECTS.len());
        for slot_rect in SLOT_RECTS {
            let rect = engine.scaler().rect(slot_rect, REFERENCE_WIDTH);
            engine.tap(rect)?;
            engine.wait_image_stable(
                &[engine.spec(templates::SINGLE_MODE_TRAINING_CONFIRM)],
                PREVIEW_STABLE,
                timeout,
            )?;

            let frame = engine.screenshot()?;
            let scaler = engine.scaler();
            for stat_rect in STAT_RECTS {
                let crop = frame.crop_gray(scaler.rect(stat_rect, REFERENCE_WIDTH));
                lines.push(binarize_inv(&crop, binarize_threshold));
            }
        }

        // Parallel phase: segmentation and hashing only
        let prepared: Vec<(GrayImage, Vec<PreparedGlyph>)> =
            pool::map(lines, workers, |line| {
                let glyphs = prepare(&line, &opts);
                (line, glyphs)
            });

        // Serial phase: label resolution through the single-writer store
        ctx.trainings.clear();
        for (slot, chunk) in prepared.chunks(STAT_RECTS.len()).enumerate() {
            let mut values = [0i64; 5];
            for (stat, (line, glyphs)) in chunk.iter().enumerate() {
                // An empty preview region means no gain for that stat
                values[stat] = if glyphs.is_empty() {
                    0
                } else {
                    engine.ocr().read_int_prepared(
                        glyphs,
                        line,
                        &format!("training slot {slot} stat {stat}"),
                    )?
                };
            }
            ctx.trainings.push(TrainingGain {
                speed: values[0],
                stamina: values[1],
                power: values[2],
                guts: values[3],
                wisdom: values[4],
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::test_support::*;
    use image::Luma;
    use tempfile::TempDir;

    #[test]
    fn test_recognize_taps_every_slot() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());

        let confirm = noise_gray(30, 10, 6);
        save_template(&config, templates::SINGLE_MODE_TRAINING_CONFIRM, &confirm);

        // 108 = reference width / 5, so authored rects scale by 1/5
        let mut screen = noise_gray(1, 108, 192);
        paste(&mut screen, &confirm, 60, 150);
        // Whiten the stat readout band so every preview reads as empty
        for y in 35..45 {
            for x in 0..108 {
                screen.put_pixel(x, y, Luma([255]));
            }
        }

        let device = ScriptedDevice::new(vec![frame_from_gray(&screen)]);
        let taps = device.taps.clone();
        let mut engine = engine_with(device, config);

        let mut holder = SceneHolder::new();
        holder.set_current(SceneId::Training);
        let mut scene = TrainingScene::enter(&mut engine, &mut holder).unwrap();

        let mut ctx = Context::new();
        scene.recognize(&mut engine, &mut ctx).unwrap();

        // One tap per slot, no navigation taps
        assert_eq!(taps.lock().unwrap().len(), SLOT_COUNT);
        assert_eq!(ctx.trainings.len(), SLOT_COUNT);
        assert!(ctx.trainings.iter().all(|t| *t == TrainingGain::default()));
    }

    #[test]
    fn test_enter_from_command_taps_training_button() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());

        let training_btn = noise_gray(20, 10, 8);
        save_template(&config, templates::SINGLE_MODE_COMMAND_TRAINING, &training_btn);
        save_template(
            &config,
            templates::SINGLE_MODE_FORMAL_RACE_BANNER,
            &noise_gray(21, 10, 8),
        );
        let confirm = noise_gray(30, 10, 6);
        save_template(&config, templates::SINGLE_MODE_TRAINING_CONFIRM, &confirm);

        let mut command = noise_gray(1, 108, 192);
        paste(&mut command, &training_btn, 20, 160);
        let mut training = noise_gray(2, 108, 192);
        paste(&mut training, &confirm, 60, 150);

        let device = ScriptedDevice::new(vec![
            frame_from_gray(&command), // command signature wait
            frame_from_gray(&command), // training button tap
            frame_from_gray(&training),
        ]);
        let taps = device.taps.clone();
        let mut engine = engine_with(device, config);

        let mut holder = SceneHolder::new();
        holder.set_current(SceneId::Command);
        TrainingScene::enter(&mut engine, &mut holder).unwrap();

        assert_eq!(holder.current(), SceneId::Training);
        // Only the training button was tapped
        assert_eq!(taps.lock().unwrap().len(), 1);
        assert_eq!(taps.lock().unwrap()[0], (20, 160, 10, 8));
    }
}
