// src/error.rs
use thiserror::Error;

/// Failures reported by a browser session. Call sites treat most of these as
/// transient: the row or page carries on in a degraded form.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("timed out after {ms} ms waiting for `{what}`")]
    Timeout { what: String, ms: u64 },

    #[error("no element matches `{0}`")]
    Missing(String),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("browser driver: {0}")]
    Driver(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("record without a key cannot be stored")]
    EmptyKey,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a crawl stops early. Anything not listed here is absorbed locally.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("no table rows appeared within the wait budget (tried {tried:?})")]
    StructuralTimeout { tried: Vec<String> },

    #[error("could not load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("page {page}: batch upsert failed: {source}")]
    Persistence {
        page: usize,
        #[source]
        source: StoreError,
    },
}
