// src/scrape/mod.rs
mod crawl;

pub use crawl::{CrawlState, CrawlSummary, Crawler, StopReason};
