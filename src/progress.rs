// src/progress.rs
use crate::scrape::CrawlSummary;

/// Lightweight progress reporting for a crawl.
/// Frontends (CLI, tests) implement this to surface status to users.
pub trait Progress {
    /// Called once the table is on screen, before the first page is read.
    fn begin(&mut self, _max_pages: Option<usize>) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Called when one page has been extracted and committed.
    fn page_done(&mut self, _page: usize, _records: usize) {}

    /// Called at the end of a run that did not fail.
    fn finish(&mut self, _summary: &CrawlSummary) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
