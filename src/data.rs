// src/data.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One fine as read from the registry, normalized.
///
/// Field names on the wire follow the registry's column names (`etid`, `type`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FineRecord {
    /// External tracking id (ETId). Never empty once a record leaves the assembler.
    #[serde(rename = "etid")]
    pub key: String,
    pub country: String,
    pub authority: String,
    pub decision_date: Option<NaiveDate>,
    pub amount_eur: Option<f64>,
    pub controller_or_processor: String,
    pub quoted_articles: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
    pub source_url: Option<String>,
    pub direct_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl FineRecord {
    /// Empty record for `key`, stamped with the crawl pass time.
    pub fn new(key: impl Into<String>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            country: s!(),
            authority: s!(),
            decision_date: None,
            amount_eur: None,
            controller_or_processor: s!(),
            quoted_articles: s!(),
            kind: s!(),
            summary: s!(),
            source_url: None,
            direct_url: None,
            scraped_at,
        }
    }
}
