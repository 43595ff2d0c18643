// src/browser/mod.rs
//! # Browser session seam
//!
//! The crawler never talks to a browser directly. It addresses elements through
//! [`Locator`] chains and asks a [`Session`] to count, read or click them.
//!
//! Two sessions ship with the crate:
//! - `chrome::ChromeSession` (feature `chrome`): a headless Chromium tab.
//! - [`fixture::FixtureSession`]: an in-memory DataTables-like page for offline runs and tests.
//!
//! ## Contract
//! - Reads on absent elements return `0` / `None`, never an error.
//! - Anything that mutates the DOM (click, select) may fail; callers decide whether
//!   the failure matters. Almost always it does not.
//! - Every mutation is followed by a bounded wait before the next read is trusted,
//!   see [`act_then_await`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::BrowserError;

#[cfg(feature = "chrome")]
pub mod chrome;
pub mod fixture;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Step {
    pub css: String,
    pub nth: Option<usize>,
}

/// A chain of CSS steps. Each step searches inside every element matched by the
/// previous one; `nth` then narrows that step's combined matches to a single element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self { steps: vec![Step { css: selector.into(), nth: None }] }
    }

    /// Descend: elements matching `selector` inside the current matches.
    pub fn locate(&self, selector: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step { css: selector.into(), nth: None });
        Self { steps }
    }

    pub fn nth(mut self, index: usize) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.nth = Some(index);
        }
        self
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            f.write_str(&step.css)?;
            if let Some(n) = step.nth {
                write!(f, " >> nth={n}")?;
            }
        }
        Ok(())
    }
}

/// What the crawler needs from a browser tab.
pub trait Session {
    /// Load `url` and wait for DOM content.
    fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Wait until at least one element matches `css`.
    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), BrowserError>;

    fn count(&mut self, loc: &Locator) -> usize;

    /// Rendered text of the first match.
    fn inner_text(&mut self, loc: &Locator) -> Option<String>;

    fn attribute(&mut self, loc: &Locator, name: &str) -> Option<String>;

    fn is_visible(&mut self, loc: &Locator) -> bool;

    fn click(&mut self, loc: &Locator, timeout: Duration) -> Result<(), BrowserError>;

    /// Pick an `<option>` of the first matching `<select>` by value, falling back to its label.
    fn select_option(&mut self, loc: &Locator, value: &str) -> Result<(), BrowserError>;

    /// Inject a stylesheet into the page.
    fn add_style(&mut self, css: &str) -> Result<(), BrowserError>;

    /// Fixed delay.
    fn pause(&mut self, ms: u64);
}

/// Bounded polling budget: `attempts` checks, `interval_ms` apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poll {
    pub attempts: u32,
    pub interval_ms: u64,
}

/// Outcome of [`act_then_await`].
#[derive(Debug)]
pub enum Awaited {
    /// The condition held after `attempts` polls.
    Observed { attempts: u32 },
    /// The action ran but the condition never held within the budget.
    Unchanged,
    /// The action itself failed; nothing was polled.
    ActFailed(BrowserError),
}

/// Trigger a DOM mutation, then poll for an observable condition.
///
/// Shared by row expansion (condition: the next row is a child row) and pagination
/// (condition: the first row's text changed). Each poll waits `interval_ms` before checking.
pub fn act_then_await<S, A, C>(session: &mut S, act: A, mut until: C, poll: Poll) -> Awaited
where
    S: Session + ?Sized,
    A: FnOnce(&mut S) -> Result<(), BrowserError>,
    C: FnMut(&mut S) -> bool,
{
    if let Err(e) = act(session) {
        return Awaited::ActFailed(e);
    }
    for attempt in 1..=poll.attempts {
        session.pause(poll.interval_ms);
        if until(session) {
            return Awaited::Observed { attempts: attempt };
        }
    }
    Awaited::Unchanged
}

/// First candidate selector that matches within `timeout`, tried in order.
pub fn wait_for_any<S: Session + ?Sized>(
    session: &mut S,
    candidates: &[String],
    timeout: Duration,
) -> Option<String> {
    for css in candidates {
        match session.wait_for(css, timeout) {
            Ok(()) => return Some(css.clone()),
            Err(e) => logd!("wait for `{css}`: {e}"),
        }
    }
    None
}

/// First element among `candidates` that exists and is visible.
pub fn first_visible<S: Session + ?Sized>(session: &mut S, candidates: &[String]) -> Option<Locator> {
    candidates.iter().find_map(|css| {
        let loc = Locator::css(css.as_str()).first();
        (session.count(&loc) > 0 && session.is_visible(&loc)).then_some(loc)
    })
}

/// Best-effort click on the first visible candidate. Returns the selector that was clicked.
pub fn click_first_visible<S: Session + ?Sized>(
    session: &mut S,
    candidates: &[String],
    timeout: Duration,
) -> Option<String> {
    for css in candidates {
        let loc = Locator::css(css.as_str()).first();
        if session.count(&loc) == 0 || !session.is_visible(&loc) {
            continue;
        }
        match session.click(&loc, timeout) {
            Ok(()) => return Some(css.clone()),
            Err(e) => logd!("click `{css}` failed: {e}"),
        }
    }
    None
}

/// Whether the first match carries `class` as one of its class tokens.
pub fn has_class<S: Session + ?Sized>(session: &mut S, loc: &Locator, class: &str) -> bool {
    session
        .attribute(loc, "class")
        .is_some_and(|c| c.split_whitespace().any(|t| t.eq_ignore_ascii_case(class)))
}
