//! Swipe-based list paging
//!
//! Scrolls a vertical list one page at a time and detects the end of the
//! list by comparing consecutive frames: when a swipe no longer changes
//! the screen, there is nothing left to scroll.

use std::time::Duration;

use crate::engine::Engine;
use crate::error::Result;
use crate::scaling::Point;

/// Pages through a vertical list via swipes.
#[derive(Debug, Clone)]
pub struct VerticalScroll {
    origin: Point,
    page_size: u32,
    max_page: u32,
    page: u32,
    last_hash: Option<u64>,
    ended: bool,
}

impl VerticalScroll {
    /// `origin` is where the swipe starts (screen pixels); each page
    /// swipes up by `page_size` pixels; `max_page` bounds runaway lists.
    pub fn new(origin: Point, page_size: u32, max_page: u32) -> Self {
        Self {
            origin,
            page_size,
            max_page,
            page: 0,
            last_hash: None,
            ended: false,
        }
    }

    /// Advance to the next page, returning `false` once the list is
    /// exhausted. The first call returns `true` without swiping so the
    /// caller reads the initial page.
    pub fn next(&mut self, engine: &mut Engine) -> Result<bool> {
        if self.ended {
            return Ok(false);
        }

        if self.page == 0 {
            self.page = 1;
            self.last_hash = Some(engine.screenshot()?.sample_hash());
            return Ok(true);
        }

        if self.page >= self.max_page {
            self.ended = true;
            return Ok(false);
        }

        let to = (
            self.origin.0,
            self.origin.1.saturating_sub(self.page_size),
        );
        engine.swipe(self.origin, to, Duration::from_millis(200))?;
        std::thread::sleep(Duration::from_millis(
            engine.config().action.poll_interval_ms,
        ));

        let hash = engine.screenshot()?.sample_hash();
        if self.last_hash == Some(hash) {
            // Screen did not move: end of list
            self.ended = true;
            return Ok(false);
        }

        self.last_hash = Some(hash);
        self.page += 1;
        Ok(true)
    }
}
