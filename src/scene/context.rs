//! Recognition context
//!
//! The mutable bag scenes write their extracted data into. Decision
//! heuristics (training scoring, race picking) live outside the crate
//! and read from here.

use crate::scaling::Point;

/// Stat gains shown for one training slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingGain {
    pub speed: i64,
    pub stamina: i64,
    pub power: i64,
    pub guts: i64,
    pub wisdom: i64,
}

/// One visible entry in the race menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceEntry {
    /// Position of the entry's fan icon in the screenshot.
    pub position: Point,
    /// Fan count of the number-one slot, as read from the menu row.
    pub fan_count: i64,
}

/// Domain data extracted from screens. Scenes only ever write here;
/// nothing in the engine reads it back.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Vitality gauge fill fraction (0.0 - 1.0).
    pub vitality: f32,
    /// Whether the health-care command is currently offered.
    pub has_health_care: bool,
    /// Whether a scheduled race banner is showing.
    pub has_scheduled_race: bool,
    /// Whether going out with a friend is available.
    pub can_go_out_with_friend: bool,
    /// Per-slot training gains, indexed by slot.
    pub trainings: Vec<TrainingGain>,
    /// Entries visible while scrolling the race menu. May contain
    /// repeats from overlapping pages; callers dedupe.
    pub races: Vec<RaceEntry>,
    /// Number of go-out options on the menu.
    pub go_out_options: usize,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }
}
