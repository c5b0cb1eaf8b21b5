//! Coordinate normalization between reference and actual resolutions
//!
//! UI coordinates are authored against a reference width (the game runs
//! portrait, so width is the sole tunable). A `Scaler` maps them onto the
//! captured resolution with deterministic rounding so identical inputs
//! always land on identical pixels.

/// A point in pixel coordinates.
pub type Point = (u32, u32);

/// A rectangle as (x, y, width, height) in pixel coordinates.
pub type Rect = (u32, u32, u32, u32);

/// Maps coordinates authored at a reference width onto the actual
/// captured width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaler {
    actual_width: u32,
}

impl Scaler {
    /// Create a scaler targeting the given captured width.
    pub fn new(actual_width: u32) -> Self {
        Self { actual_width }
    }

    /// The captured width this scaler targets.
    pub fn actual_width(&self) -> u32 {
        self.actual_width
    }

    /// Scale a single coordinate authored at `reference_width`.
    ///
    /// Rounds to nearest so the mapping is reproducible across calls.
    pub fn scale(&self, v: u32, reference_width: u32) -> u32 {
        (v as f64 * self.actual_width as f64 / reference_width as f64).round() as u32
    }

    /// Scale a point authored at `reference_width`.
    pub fn point(&self, p: Point, reference_width: u32) -> Point {
        (self.scale(p.0, reference_width), self.scale(p.1, reference_width))
    }

    /// Scale a rectangle authored at `reference_width`.
    pub fn rect(&self, r: Rect, reference_width: u32) -> Rect {
        (
            self.scale(r.0, reference_width),
            self.scale(r.1, reference_width),
            self.scale(r.2, reference_width),
            self.scale(r.3, reference_width),
        )
    }
}

/// Center point of a rectangle.
pub fn rect_center(r: Rect) -> Point {
    (r.0 + r.2 / 2, r.1 + r.3 / 2)
}
