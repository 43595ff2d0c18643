// src/scrape/crawl.rs
use std::fmt;

use chrono::{DateTime, Utc};

use crate::browser::{
    Awaited, Locator, Session, act_then_await, click_first_visible, first_visible, wait_for_any,
};
use crate::config::CrawlOptions;
use crate::error::CrawlError;
use crate::progress::Progress;
use crate::specs::{HeaderMap, extract_page};
use crate::store::FineStore;

/// Where the crawler is in its page loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrawlState {
    /// Navigate, clear the consent banner, find the rows, widen the page.
    Loading,
    /// Rows are on screen; headers not read yet.
    Ready,
    /// Read the current page and commit it.
    Extracting,
    /// Try to move to the next page.
    Advancing,
    Done,
}

/// Why a crawl that did not fail stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// No visible next-page control.
    NoNextPage,
    /// `max_pages` reached.
    PageCap,
    /// The next click did not change the table within the poll budget.
    NoProgress,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::NoNextPage => "last page reached",
            StopReason::PageCap => "page cap reached",
            StopReason::NoProgress => "pagination stopped responding",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages extracted (including ones that produced no records).
    pub pages: usize,
    /// Records handed to the store.
    pub records: usize,
    pub duplicates: usize,
    pub keyless: usize,
    pub stop: Option<StopReason>,
}

/// Drives one crawl pass over the registry table, one page at a time.
///
/// ```text
/// Loading → Ready → Extracting → Advancing ─┬→ Extracting
///                                           └→ Done
/// ```
/// Only a missing table, a failed navigation or a failed page commit end the run
/// with an error. Everything else degrades the row or stops the loop cleanly.
pub struct Crawler<'a, S: Session + ?Sized, St: FineStore + ?Sized> {
    session: &'a mut S,
    store: &'a mut St,
    opts: &'a CrawlOptions,
    state: CrawlState,
    row_selector: String,
    headers: HeaderMap,
    scraped_at: DateTime<Utc>,
    summary: CrawlSummary,
}

impl<'a, S: Session + ?Sized, St: FineStore + ?Sized> Crawler<'a, S, St> {
    pub fn new(session: &'a mut S, store: &'a mut St, opts: &'a CrawlOptions) -> Self {
        Self {
            session,
            store,
            opts,
            state: CrawlState::Loading,
            row_selector: s!(),
            headers: HeaderMap::default(),
            scraped_at: Utc::now(),
            summary: CrawlSummary::default(),
        }
    }

    /// Stamp every record of this pass with `at` instead of the construction time.
    pub fn scraped_at(mut self, at: DateTime<Utc>) -> Self {
        self.scraped_at = at;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    /// Run one transition and return the new state. `Done` is sticky.
    pub fn step(&mut self, progress: &mut dyn Progress) -> Result<CrawlState, CrawlError> {
        self.state = match self.state {
            CrawlState::Loading => self.load()?,
            CrawlState::Ready => {
                self.headers = HeaderMap::read(self.session, &self.opts.selectors.headers);
                progress.begin(self.opts.max_pages);
                CrawlState::Extracting
            }
            CrawlState::Extracting => self.extract(progress)?,
            CrawlState::Advancing => self.advance(progress),
            CrawlState::Done => CrawlState::Done,
        };
        Ok(self.state)
    }

    /// Step until `Done`.
    pub fn run(mut self, progress: &mut dyn Progress) -> Result<CrawlSummary, CrawlError> {
        while self.step(progress)? != CrawlState::Done {}
        progress.finish(&self.summary);
        Ok(self.summary)
    }

    fn load(&mut self) -> Result<CrawlState, CrawlError> {
        let opts = self.opts;
        let (sel, w) = (&opts.selectors, &opts.waits);

        logf!("loading {}", opts.base_url);
        self.session
            .goto(&opts.base_url, w.navigation)
            .map_err(|source| CrawlError::Navigation { url: opts.base_url.clone(), source })?;
        self.session.pause(w.settle_ms);

        if let Some(css) = click_first_visible(self.session, &sel.consent, w.click) {
            logd!("consent banner dismissed via `{css}`");
            self.session.pause(w.settle_ms);
        }

        let Some(rows) = wait_for_any(self.session, &sel.rows, w.rows) else {
            loge!("no table rows found; tried {:?}", sel.rows);
            return Err(CrawlError::StructuralTimeout { tried: sel.rows.clone() });
        };
        logd!("rows located with `{rows}`");

        if let Some(len) = opts.page_length {
            self.set_page_length(len, &rows);
        }
        if let Err(e) = self.session.add_style(&sel.unhide_css) {
            logd!("unhide stylesheet not applied: {e}");
        }

        self.row_selector = rows;
        Ok(CrawlState::Ready)
    }

    /// Best effort: the crawl still works page by page at the site default.
    fn set_page_length(&mut self, len: u32, rows: &str) {
        let opts = self.opts;
        let value = len.to_string();
        for css in &opts.selectors.page_length {
            let loc = Locator::css(css.as_str()).first();
            if self.session.count(&loc) == 0 {
                continue;
            }
            match self.session.select_option(&loc, &value) {
                Ok(()) => {
                    self.session.pause(opts.waits.length_settle_ms);
                    if let Err(e) = self.session.wait_for(rows, opts.waits.rows) {
                        logd!("rows after page length change: {e}");
                    }
                    logd!("page length set to {len} via `{css}`");
                    return;
                }
                Err(e) => logd!("page length via `{css}`: {e}"),
            }
        }
        logd!("no page length control; keeping site default");
    }

    fn extract(&mut self, progress: &mut dyn Progress) -> Result<CrawlState, CrawlError> {
        let page = self.summary.pages + 1;
        let batch = extract_page(
            self.session,
            self.opts,
            &self.row_selector,
            &self.headers,
            page,
            self.scraped_at,
        );

        if !batch.is_empty() {
            self.store
                .upsert_batch(&batch.records)
                .map_err(|source| CrawlError::Persistence { page, source })?;
        }

        self.summary.pages = page;
        self.summary.records += batch.len();
        self.summary.duplicates += batch.duplicates;
        self.summary.keyless += batch.keyless;

        logf!("page {page}: {} records from {} rows", batch.len(), batch.rows_seen);
        progress.page_done(page, batch.len());
        Ok(CrawlState::Advancing)
    }

    fn advance(&mut self, progress: &mut dyn Progress) -> CrawlState {
        let opts = self.opts;
        let page = self.summary.pages;

        if opts.max_pages.is_some_and(|cap| page >= cap) {
            return self.stop(StopReason::PageCap);
        }
        let Some(next) = first_visible(self.session, &opts.selectors.next_page) else {
            return self.stop(StopReason::NoNextPage);
        };

        let first_row = Locator::css(self.row_selector.as_str()).first();
        let before = self.session.inner_text(&first_row).unwrap_or_default();
        let click = opts.waits.click;

        let awaited = act_then_await(
            self.session,
            |s| s.click(&next, click),
            |s| s.inner_text(&first_row).is_some_and(|now| now != before),
            opts.waits.paginate,
        );
        match awaited {
            Awaited::Observed { attempts } => {
                logd!("page {} on screen after {attempts} polls", page + 1);
                self.session.pause(opts.waits.settle_ms);
                self.headers = HeaderMap::read(self.session, &opts.selectors.headers);
                progress.log(&format!("moving to page {}", page + 1));
                CrawlState::Extracting
            }
            Awaited::Unchanged => {
                logf!("first row unchanged after next click on page {page}");
                self.stop(StopReason::NoProgress)
            }
            Awaited::ActFailed(e) => {
                logd!("next click failed on page {page}: {e}");
                self.stop(StopReason::NoProgress)
            }
        }
    }

    fn stop(&mut self, why: StopReason) -> CrawlState {
        logf!("crawl done after {} pages, {} records: {why}", self.summary.pages, self.summary.records);
        self.summary.stop = Some(why);
        CrawlState::Done
    }
}
