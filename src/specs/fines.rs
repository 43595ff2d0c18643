// src/specs/fines.rs
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::detail::DetailBag;
use super::header::{HeaderKey, HeaderMap};
use super::rows::{RowPair, RowPairs};
use crate::browser::Session;
use crate::config::CrawlOptions;
use crate::config::consts::HEARTBEAT_ROWS;
use crate::core::{absolute_url, parse_amount_eur, parse_decision_date};
use crate::data::FineRecord;

/// One page worth of assembled records, already deduplicated by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageBatch {
    pub records: Vec<FineRecord>,
    pub rows_seen: usize,
    /// Repeats of a key already in this batch; the first occurrence was kept.
    pub duplicates: usize,
    /// Rows dropped for an empty key.
    pub keyless: usize,
    seen: HashSet<String>,
}

impl PageBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record unless its key is empty or already present. Returns whether it was kept.
    pub fn admit(&mut self, rec: FineRecord) -> bool {
        self.rows_seen += 1;
        if rec.key.trim().is_empty() {
            self.keyless += 1;
            return false;
        }
        if !self.seen.insert(rec.key.clone()) {
            self.duplicates += 1;
            return false;
        }
        self.records.push(rec);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Text that should be taken as a link rather than a caption.
fn looks_like_link(s: &str) -> bool {
    let l = s.trim().to_ascii_lowercase();
    l.starts_with("http://") || l.starts_with("https://") || l.starts_with('/')
}

/// Build one record from a primary row and its optional detail.
///
/// Each column prefers the primary cell, then the labelled detail value.
/// `authority` and the sector prefix of `summary` only ever come from the freeform text.
pub fn assemble(pair: &RowPair, headers: &HeaderMap, base_url: &str, scraped_at: DateTime<Utc>) -> FineRecord {
    let bag = pair
        .detail
        .as_ref()
        .map(|d| DetailBag::from_snapshot(d, base_url))
        .unwrap_or_default();

    let cell = |key: HeaderKey| headers.column(key).and_then(|i| pair.cells.get(i));
    let text = |key: HeaderKey| cell(key).map(|c| c.text.as_str());
    let field = |key: HeaderKey| first_filled!(text(key), bag.label(key)).unwrap_or_default();

    let key = field(HeaderKey::Key);
    let mut rec = FineRecord::new(key, scraped_at);
    rec.country = field(HeaderKey::Country);
    rec.decision_date = parse_decision_date(&field(HeaderKey::Date));
    rec.amount_eur = parse_amount_eur(&field(HeaderKey::Fine));
    rec.controller_or_processor = field(HeaderKey::Controller);
    rec.quoted_articles = field(HeaderKey::Quoted);
    rec.kind = field(HeaderKey::Type);

    let ff = &bag.freeform;
    rec.authority = ff.authority.clone();
    rec.summary = if ff.sector.is_empty() {
        ff.summary.clone()
    } else {
        format!("Sector: {}. {}", ff.sector, ff.summary)
    };

    let source_cell = cell(HeaderKey::Source);
    rec.source_url = first_filled!(
        source_cell.and_then(|c| c.href.as_deref()),
        source_cell.map(|c| c.text.as_str()).filter(|t| looks_like_link(t)),
        bag.label(HeaderKey::Source).filter(|t| looks_like_link(t)),
        ff.source_url.as_deref(),
    )
    .and_then(|u| absolute_url(&u, base_url));

    rec.direct_url = first_filled!(
        ff.direct_url.as_deref(),
        bag.direct_url_label().filter(|t| looks_like_link(t)),
    )
    .and_then(|u| absolute_url(&u, base_url));

    rec
}

/// Pair, assemble and deduplicate every row on the current page.
pub fn extract_page<S: Session + ?Sized>(
    session: &mut S,
    opts: &CrawlOptions,
    row_selector: &str,
    headers: &HeaderMap,
    page: usize,
    scraped_at: DateTime<Utc>,
) -> PageBatch {
    let mut batch = PageBatch::new();
    for (n, pair) in RowPairs::new(session, row_selector, opts).enumerate() {
        let rec = assemble(&pair, headers, &opts.base_url, scraped_at);
        if n < HEARTBEAT_ROWS {
            let raw = |key: HeaderKey| headers.column(key).and_then(|i| pair.cells.get(i)).map(|c| c.text.as_str());
            logd!(
                "page {page} row {n}: key={:?} fine={:?} date={:?} detail={}",
                rec.key,
                raw(HeaderKey::Fine).unwrap_or(""),
                raw(HeaderKey::Date).unwrap_or(""),
                pair.detail.is_some()
            );
        }
        batch.admit(rec);
    }
    if batch.keyless > 0 || batch.duplicates > 0 {
        logd!("page {page}: dropped {} keyless, {} duplicate rows", batch.keyless, batch.duplicates);
    }
    batch
}
