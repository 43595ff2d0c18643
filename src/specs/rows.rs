// src/specs/rows.rs
use std::time::Duration;

use super::detail::DetailSnapshot;
use crate::browser::{act_then_await, has_class, Awaited, Locator, Poll, Session};
use crate::config::CrawlOptions;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellSnapshot {
    pub text: String,
    /// `href` of the first link inside the cell.
    pub href: Option<String>,
}

impl CellSnapshot {
    pub fn text(text: &str) -> Self {
        Self { text: s!(text), href: None }
    }
}

/// A primary row and, when it expanded, its child row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowPair {
    /// Position of the primary row in the live row list.
    pub index: usize,
    pub cells: Vec<CellSnapshot>,
    pub detail: Option<DetailSnapshot>,
}

/// Walks the rendered rows in document order, expanding each primary row and
/// yielding it together with its child row.
///
/// Child rows are only ever consumed as the partner of the row before them.
/// Rows without cells are skipped. A failed expand click is not fatal: the row is
/// yielded without a detail partner.
pub struct RowPairs<'a, S: Session + ?Sized> {
    session: &'a mut S,
    rows: Locator,
    cells: String,
    links: String,
    detail_class: String,
    titles: String,
    data: String,
    max_links: usize,
    expand_poll: Poll,
    click_timeout: Duration,
    cursor: usize,
}

impl<'a, S: Session + ?Sized> RowPairs<'a, S> {
    pub fn new(session: &'a mut S, row_selector: &str, opts: &CrawlOptions) -> Self {
        let sel = &opts.selectors;
        Self {
            session,
            rows: Locator::css(row_selector),
            cells: sel.cells.clone(),
            links: sel.links.clone(),
            detail_class: sel.detail_row_class.clone(),
            titles: sel.detail_titles.clone(),
            data: sel.detail_data.clone(),
            max_links: sel.detail_max_links,
            expand_poll: opts.waits.expand,
            click_timeout: opts.waits.click,
            cursor: 0,
        }
    }

    fn row(&self, i: usize) -> Locator {
        self.rows.clone().nth(i)
    }

    fn is_detail(&mut self, i: usize) -> bool {
        let row = self.row(i);
        has_class(self.session, &row, &self.detail_class)
    }

    /// Click the row open unless its child is already showing.
    fn expand(&mut self, idx: usize, first_cell: &Locator) {
        if self.has_child(idx) {
            return;
        }
        let next = self.row(idx + 1);
        let class = self.detail_class.clone();
        let timeout = self.click_timeout;
        let awaited = act_then_await(
            self.session,
            |s| s.click(first_cell, timeout),
            |s| has_class(s, &next, &class),
            self.expand_poll,
        );
        if let Awaited::ActFailed(e) = awaited {
            logd!("row {idx}: expand failed: {e}");
        }
    }

    fn has_child(&mut self, idx: usize) -> bool {
        idx + 1 < self.session.count(&self.rows) && self.is_detail(idx + 1)
    }

    fn snapshot_cells(&mut self, cells: &Locator, n: usize) -> Vec<CellSnapshot> {
        (0..n)
            .map(|i| {
                let cell = cells.clone().nth(i);
                let text = self.session.inner_text(&cell).unwrap_or_default();
                let href = self.session.attribute(&cell.locate(self.links.as_str()).first(), "href");
                CellSnapshot { text: s!(text.trim()), href }
            })
            .collect()
    }

    fn snapshot_detail(&mut self, row: &Locator) -> DetailSnapshot {
        let titles = row.locate(self.titles.as_str());
        let data = row.locate(self.data.as_str());
        let n = self.session.count(&titles).min(self.session.count(&data));
        let fields = (0..n)
            .map(|i| {
                let t = self.session.inner_text(&titles.clone().nth(i)).unwrap_or_default();
                let d = self.session.inner_text(&data.clone().nth(i)).unwrap_or_default();
                (s!(t.trim()), s!(d.trim()))
            })
            .collect();

        let anchors = row.locate(self.links.as_str());
        let n = self.session.count(&anchors).min(self.max_links);
        let links = (0..n)
            .filter_map(|i| self.session.attribute(&anchors.clone().nth(i), "href"))
            .collect();

        DetailSnapshot {
            fields,
            text: self.session.inner_text(row).unwrap_or_default(),
            links,
        }
    }
}

impl<S: Session + ?Sized> Iterator for RowPairs<'_, S> {
    type Item = RowPair;

    fn next(&mut self) -> Option<RowPair> {
        loop {
            let idx = self.cursor;
            if idx >= self.session.count(&self.rows) {
                return None;
            }
            if self.is_detail(idx) {
                self.cursor += 1;
                continue;
            }

            let row = self.row(idx);
            let cells = row.locate(self.cells.as_str());
            let n = self.session.count(&cells);
            if n == 0 {
                self.cursor += 1;
                continue;
            }

            self.expand(idx, &cells.clone().first());
            // Re-read: the row list may have grown by the child row.
            let paired = self.has_child(idx);

            let cells = self.snapshot_cells(&cells, n);
            let detail = paired.then(|| {
                let child = self.row(idx + 1);
                self.snapshot_detail(&child)
            });

            self.cursor += if paired { 2 } else { 1 };
            return Some(RowPair { index: idx, cells, detail });
        }
    }
}
