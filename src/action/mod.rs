//! Action/wait layer
//!
//! Blocking polling primitives on top of the matcher and the device.
//! This is the first place "no match" becomes an error: the matcher
//! itself returns empty results, and these waits convert an empty
//! result that persists past the budget into [`Error::Timeout`].
//!
//! All waits are cooperative sleep-and-retry loops on the caller's
//! thread; timeouts are wall-clock and scoped to a single call.

use std::time::{Duration, Instant};

use image::GrayImage;
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::vision::{Match, Matcher, Specification, TemplateStore};

/// A timeout of zero means "wait forever".
pub const INFINITE: Duration = Duration::ZERO;

fn spec_names(specs: &[Specification]) -> String {
    specs
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// First match in declaration order: specs earlier in the slice take
/// precedence when several match the same frame.
fn find_first(
    store: &TemplateStore,
    gray: &GrayImage,
    specs: &[Specification],
) -> Result<Option<Match>> {
    let matcher = Matcher::new(store);
    for spec in specs {
        let mut matches = matcher.find_all(gray, spec)?;
        if !matches.is_empty() {
            return Ok(Some(matches.remove(0)));
        }
    }
    Ok(None)
}

impl Engine {
    /// Poll until one of `specs` matches and return the first match,
    /// first-spec-wins. `timeout == INFINITE` never gives up.
    pub fn wait_image(&mut self, specs: &[Specification], timeout: Duration) -> Result<Match> {
        let start = Instant::now();
        let poll = Duration::from_millis(self.config().action.poll_interval_ms);

        loop {
            let gray = self.screenshot()?.gray();
            if let Some(m) = find_first(self.templates(), &gray, specs)? {
                debug!("wait_image: '{}' at {:?}", m.name, m.position);
                return Ok(m);
            }

            if !timeout.is_zero() && start.elapsed() >= timeout {
                return Err(Error::Timeout {
                    what: spec_names(specs),
                    waited: start.elapsed(),
                });
            }
            std::thread::sleep(poll);
        }
    }

    /// Wait for a match, then tap its bounding rectangle.
    pub fn wait_tap_image(&mut self, specs: &[Specification], timeout: Duration) -> Result<Match> {
        let m = self.wait_image(specs, timeout)?;
        self.tap(m.bounds())?;
        Ok(m)
    }

    /// Wait until the same match (same spec, position within a small
    /// tolerance) has been observed continuously for `duration`.
    ///
    /// A single transient hit does not satisfy stability; the window
    /// resets whenever the match disappears or moves. This absorbs UI
    /// transition animations that would otherwise trigger a premature
    /// tap.
    pub fn wait_image_stable(
        &mut self,
        specs: &[Specification],
        duration: Duration,
        timeout: Duration,
    ) -> Result<Match> {
        let start = Instant::now();
        let poll = Duration::from_millis(self.config().action.poll_interval_ms);
        let tolerance = self.config().action.stable_tolerance_px;
        let mut stable: Option<(Match, Instant)> = None;

        loop {
            let gray = self.screenshot()?.gray();
            match find_first(self.templates(), &gray, specs)? {
                Some(m) => match &stable {
                    Some((prev, since))
                        if prev.name == m.name
                            && within_tolerance(prev.position, m.position, tolerance) =>
                    {
                        if since.elapsed() >= duration {
                            debug!("stable '{}' for {:?}", m.name, since.elapsed());
                            return Ok(m);
                        }
                    }
                    _ => stable = Some((m, Instant::now())),
                },
                None => stable = None,
            }

            if !timeout.is_zero() && start.elapsed() >= timeout {
                return Err(Error::Timeout {
                    what: format!("stable {}", spec_names(specs)),
                    waited: start.elapsed(),
                });
            }
            std::thread::sleep(poll);
        }
    }

    /// Count matches of all `specs` in a single fresh screenshot.
    pub fn count_image(&mut self, specs: &[Specification]) -> Result<usize> {
        let gray = self.screenshot()?.gray();
        let matcher = Matcher::new(self.templates());
        let mut count = 0;
        for spec in specs {
            count += matcher.find_all(&gray, spec)?.len();
        }
        Ok(count)
    }

    /// Lazily yield live matches of `spec`, one per fresh screenshot,
    /// until it no longer matches. Used to drain repeated UI elements
    /// (claim lists and the like) while the list shrinks underneath.
    pub fn match_image_until_disappear(
        &mut self,
        spec: Specification,
        sort: Option<Box<dyn FnMut(&mut Vec<Match>)>>,
    ) -> UntilDisappear<'_> {
        UntilDisappear {
            engine: self,
            spec,
            sort,
            done: false,
        }
    }

    /// Invoke `action`, retrying up to `max_retries` times on any error
    /// before re-raising the last one. Absorbs one-off recognition
    /// misfires.
    pub fn run_with_retry<T>(
        &mut self,
        max_retries: usize,
        mut action: impl FnMut(&mut Engine) -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match action(self) {
                Ok(v) => return Ok(v),
                Err(e) if attempt < max_retries => {
                    attempt += 1;
                    warn!("attempt {attempt}/{max_retries} failed: {e}; retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn within_tolerance(a: (u32, u32), b: (u32, u32), tolerance: u32) -> bool {
    a.0.abs_diff(b.0) <= tolerance && a.1.abs_diff(b.1) <= tolerance
}

/// Iterator over live matches of one spec; see
/// [`Engine::match_image_until_disappear`].
pub struct UntilDisappear<'a> {
    engine: &'a mut Engine,
    spec: Specification,
    sort: Option<Box<dyn FnMut(&mut Vec<Match>)>>,
    done: bool,
}

impl Iterator for UntilDisappear<'_> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let gray = match self.engine.screenshot() {
            Ok(frame) => frame.gray(),
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let matcher = Matcher::new(self.engine.templates());
        let mut matches = match matcher.find_all(&gray, &self.spec) {
            Ok(m) => m,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if matches.is_empty() {
            self.done = true;
            return None;
        }
        if let Some(sort) = &mut self.sort {
            sort(&mut matches);
        }
        Some(Ok(matches.remove(0)))
    }
}
