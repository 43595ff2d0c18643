// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;
use crate::browser::Poll;

/// Everything the crawler needs to know about the site, injected rather than global
/// so fixture documents can stand in for the live registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrawlOptions {
    pub base_url: String,
    pub selectors: Selectors,
    pub waits: Waits,
    /// Rows per page to request from the table; `None` keeps the site default.
    pub page_length: Option<u32>,
    /// Stop after this many pages.
    pub max_pages: Option<usize>,
    pub headless: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            selectors: Selectors::default(),
            waits: Waits::default(),
            page_length: Some(PAGE_LENGTH),
            max_pages: None,
            headless: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selectors {
    pub rows: Vec<String>,
    pub headers: String,
    pub cells: String,
    pub links: String,
    pub detail_row_class: String,
    pub detail_titles: String,
    pub detail_data: String,
    pub detail_max_links: usize,
    pub consent: Vec<String>,
    pub page_length: Vec<String>,
    pub next_page: Vec<String>,
    pub unhide_css: String,
}

impl Default for Selectors {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s!(*s)).collect::<Vec<_>>();
        Self {
            rows: owned(ROW_SELECTORS),
            headers: s!(HEADER_SELECTOR),
            cells: s!(CELL_SELECTOR),
            links: s!(LINK_SELECTOR),
            detail_row_class: s!(DETAIL_ROW_CLASS),
            detail_titles: s!(DETAIL_TITLE_SELECTOR),
            detail_data: s!(DETAIL_DATA_SELECTOR),
            detail_max_links: DETAIL_MAX_LINKS,
            consent: owned(CONSENT_SELECTORS),
            page_length: owned(LENGTH_SELECTORS),
            next_page: owned(NEXT_SELECTORS),
            unhide_css: s!(UNHIDE_COLUMNS_CSS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Waits {
    pub navigation: Duration,
    pub rows: Duration,
    pub click: Duration,
    pub settle_ms: u64,
    pub length_settle_ms: u64,
    /// Row expansion: how long to watch for the child row.
    pub expand: Poll,
    /// Pagination: how long to watch for the first row to change.
    pub paginate: Poll,
}

impl Default for Waits {
    fn default() -> Self {
        Self {
            navigation: Duration::from_millis(NAV_TIMEOUT_MS),
            rows: Duration::from_millis(ROWS_TIMEOUT_MS),
            click: Duration::from_millis(CLICK_TIMEOUT_MS),
            settle_ms: SETTLE_MS,
            length_settle_ms: LENGTH_SETTLE_MS,
            expand: Poll { attempts: EXPAND_ATTEMPTS, interval_ms: EXPAND_INTERVAL_MS },
            paginate: Poll { attempts: PAGINATE_ATTEMPTS, interval_ms: PAGINATE_INTERVAL_MS },
        }
    }
}

pub fn default_store_dir() -> PathBuf {
    PathBuf::from(STORE_DIR)
}

pub fn default_db_path() -> PathBuf {
    default_store_dir().join(DB_FILE)
}

pub fn default_log_path() -> PathBuf {
    default_store_dir().join(LOG_FILE)
}
