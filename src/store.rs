// src/store.rs
//! Durable fines table keyed by ETId.
//!
//! Each crawl page arrives as one batch and is merged in one transaction:
//! either every record of the page lands or none does.
//!
//! Merge policy on an existing key:
//! - `country`, `decision_date`, `amount_eur`, `controller_or_processor`,
//!   `quoted_articles`, `type`, `scraped_at`: always replaced.
//! - `authority`, `summary`, `source_url`, `direct_url`: replaced only by a
//!   non-empty value, otherwise the stored value stays.
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::data::FineRecord;
use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS fines (
    etid                    TEXT PRIMARY KEY CHECK (length(etid) > 0),
    country                 TEXT NOT NULL DEFAULT '',
    authority               TEXT NOT NULL DEFAULT '',
    decision_date           TEXT,
    amount_eur              REAL,
    controller_or_processor TEXT NOT NULL DEFAULT '',
    quoted_articles         TEXT NOT NULL DEFAULT '',
    type                    TEXT NOT NULL DEFAULT '',
    summary                 TEXT NOT NULL DEFAULT '',
    source_url              TEXT,
    direct_url              TEXT,
    scraped_at              TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS fines_country ON fines (country);
CREATE INDEX IF NOT EXISTS fines_decision_date ON fines (decision_date);
CREATE INDEX IF NOT EXISTS fines_amount ON fines (amount_eur);
";

const UPSERT: &str = "
INSERT INTO fines (
    etid, country, authority, decision_date, amount_eur, controller_or_processor,
    quoted_articles, type, summary, source_url, direct_url, scraped_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
ON CONFLICT (etid) DO UPDATE SET
    country                 = excluded.country,
    decision_date           = excluded.decision_date,
    amount_eur              = excluded.amount_eur,
    controller_or_processor = excluded.controller_or_processor,
    quoted_articles         = excluded.quoted_articles,
    type                    = excluded.type,
    scraped_at              = excluded.scraped_at,
    authority  = COALESCE(NULLIF(excluded.authority, ''), fines.authority),
    summary    = COALESCE(NULLIF(excluded.summary, ''), fines.summary),
    source_url = COALESCE(NULLIF(excluded.source_url, ''), fines.source_url),
    direct_url = COALESCE(NULLIF(excluded.direct_url, ''), fines.direct_url)
";

const COLUMNS: &str = "etid, country, authority, decision_date, amount_eur, controller_or_processor, \
    quoted_articles, type, summary, source_url, direct_url, scraped_at";

pub const DEFAULT_LIMIT: usize = 100;

/// Where a crawl commits its pages.
pub trait FineStore {
    /// Merge one page's records atomically. Returns how many rows were written.
    fn upsert_batch(&mut self, records: &[FineRecord]) -> Result<usize, StoreError>;
}

/// Filters for [`SqliteStore::query`]. Unset fields do not filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FineQuery {
    pub country: Option<String>,
    pub authority: Option<String>,
    /// Substring of `quoted_articles`.
    pub article: Option<String>,
    /// Substring of `controller_or_processor`.
    pub controller: Option<String>,
    pub kind: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyTotal {
    /// `YYYY-MM`, empty for undated fines.
    pub year_month: String,
    pub count: u64,
    pub total_eur: f64,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<FineRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM fines WHERE etid = ?1");
        let rec = self.conn.query_row(&sql, params![key], from_row).optional()?;
        Ok(rec)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM fines", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Filtered page of fines, newest decision first, then largest amount.
    pub fn query(&self, q: &FineQuery) -> Result<Vec<FineRecord>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let text = |v: &Option<String>| v.as_deref().map(|s| Value::Text(s!(s)));
        let like = |v: &Option<String>| v.as_deref().map(|s| Value::Text(format!("%{s}%")));
        let day = |v: &Option<NaiveDate>| v.map(|d| Value::Text(d.format("%Y-%m-%d").to_string()));

        let filters = [
            ("country = ?", text(&q.country)),
            ("authority = ?", text(&q.authority)),
            ("quoted_articles LIKE ?", like(&q.article)),
            ("controller_or_processor LIKE ?", like(&q.controller)),
            ("type = ?", text(&q.kind)),
            ("amount_eur >= ?", q.min_amount.map(Value::Real)),
            ("amount_eur <= ?", q.max_amount.map(Value::Real)),
            ("decision_date >= ?", day(&q.from)),
            ("decision_date <= ?", day(&q.to)),
        ];
        for (clause, value) in filters {
            if let Some(v) = value {
                clauses.push(clause);
                values.push(v);
            }
        }

        let mut sql = format!("SELECT {COLUMNS} FROM fines");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY decision_date DESC, amount_eur DESC LIMIT ? OFFSET ?");
        values.push(Value::Integer(q.limit.unwrap_or(DEFAULT_LIMIT) as i64));
        values.push(Value::Integer(q.offset.unwrap_or(0) as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count and euro sum per decision month, newest first; undated fines last.
    pub fn monthly_totals(&self) -> Result<Vec<MonthlyTotal>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(substr(decision_date, 1, 7), '') AS ym,
                    COUNT(*),
                    COALESCE(SUM(amount_eur), 0.0)
             FROM fines GROUP BY ym ORDER BY ym DESC",
        )?;
        let rows = stmt.query_map([], |r| {
            let count: i64 = r.get(1)?;
            Ok(MonthlyTotal { year_month: r.get(0)?, count: count as u64, total_eur: r.get(2)? })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every fine, newest decision first.
    pub fn all_by_date(&self) -> Result<Vec<FineRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM fines ORDER BY decision_date DESC, etid");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl FineStore for SqliteStore {
    fn upsert_batch(&mut self, records: &[FineRecord]) -> Result<usize, StoreError> {
        // Dropping the transaction on an early return rolls the whole page back.
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT)?;
            for r in records {
                if r.key.trim().is_empty() {
                    return Err(StoreError::EmptyKey);
                }
                stmt.execute(params![
                    r.key,
                    r.country,
                    r.authority,
                    r.decision_date,
                    r.amount_eur,
                    r.controller_or_processor,
                    r.quoted_articles,
                    r.kind,
                    r.summary,
                    r.source_url,
                    r.direct_url,
                    r.scraped_at,
                ])?;
            }
        }
        tx.commit()?;
        logd!("upserted {} records", records.len());
        Ok(records.len())
    }
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<FineRecord> {
    Ok(FineRecord {
        key: row.get(0)?,
        country: row.get(1)?,
        authority: row.get(2)?,
        decision_date: row.get(3)?,
        amount_eur: row.get(4)?,
        controller_or_processor: row.get(5)?,
        quoted_articles: row.get(6)?,
        kind: row.get(7)?,
        summary: row.get(8)?,
        source_url: row.get(9)?,
        direct_url: row.get(10)?,
        scraped_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 8, 30, 0).unwrap()
    }

    fn fine(key: &str, country: &str, date: Option<(i32, u32, u32)>, amount: Option<f64>) -> FineRecord {
        let mut r = FineRecord::new(key, at(1));
        r.country = s!(country);
        r.decision_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        r.amount_eur = amount;
        r
    }

    #[test]
    fn second_upsert_keeps_enrichment_and_replaces_columns() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let mut first = fine("DE-1", "Germany", Some((2022, 2, 3)), Some(10_000.0));
        first.authority = s!("LDA");
        first.summary = s!("Sector: Retail. Misuse of data");
        first.source_url = Some(s!("http://src"));
        first.direct_url = Some(s!("https://www.enforcementtracker.com/ETid-1"));
        store.upsert_batch(&[first]).unwrap();

        let mut second = fine("DE-1", "Deutschland", None, None);
        second.source_url = Some(s!(""));
        second.scraped_at = at(2);
        store.upsert_batch(&[second]).unwrap();

        let got = store.get("DE-1").unwrap().unwrap();
        assert_eq!(got.country, "Deutschland");
        assert_eq!(got.decision_date, None, "dates are replaced even by nothing");
        assert_eq!(got.amount_eur, None);
        assert_eq!(got.authority, "LDA");
        assert_eq!(got.summary, "Sector: Retail. Misuse of data");
        assert_eq!(got.source_url.as_deref(), Some("http://src"));
        assert_eq!(got.direct_url.as_deref(), Some("https://www.enforcementtracker.com/ETid-1"));
        assert_eq!(got.scraped_at, at(2));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn non_empty_enrichment_overwrites() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut a = fine("FR-1", "France", None, None);
        a.authority = s!("CNIL");
        store.upsert_batch(&[a]).unwrap();
        let mut b = fine("FR-1", "France", None, None);
        b.authority = s!("CNIL (FR)");
        store.upsert_batch(&[b]).unwrap();
        assert_eq!(store.get("FR-1").unwrap().unwrap().authority, "CNIL (FR)");
    }

    #[test]
    fn empty_key_rolls_back_the_page() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let batch = [fine("A-1", "Austria", None, None), fine(" ", "Nowhere", None, None)];
        assert!(matches!(store.upsert_batch(&batch), Err(StoreError::EmptyKey)));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get("A-1").unwrap().is_none());
    }

    #[test]
    fn query_filters_and_orders() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut es = fine("ES-1", "Spain", Some((2021, 6, 1)), Some(5_000.0));
        es.quoted_articles = s!("Art. 6 (1) GDPR, Art. 13 GDPR");
        es.controller_or_processor = s!("Banco Ejemplo");
        es.kind = s!("Insufficient legal basis");
        store
            .upsert_batch(&[
                es,
                fine("ES-2", "Spain", Some((2022, 1, 15)), Some(1_000.0)),
                fine("ES-3", "Spain", Some((2022, 1, 15)), Some(9_000.0)),
                fine("IT-1", "Italy", Some((2020, 3, 9)), Some(50_000.0)),
                fine("IT-2", "Italy", None, None),
            ])
            .unwrap();

        let keys = |q: &FineQuery| -> Vec<String> {
            store.query(q).unwrap().into_iter().map(|r| r.key).collect()
        };

        assert_eq!(keys(&FineQuery::default()), ["ES-3", "ES-2", "ES-1", "IT-1", "IT-2"]);
        assert_eq!(
            keys(&FineQuery { country: Some(s!("Spain")), ..FineQuery::default() }),
            ["ES-3", "ES-2", "ES-1"]
        );
        assert_eq!(keys(&FineQuery { article: Some(s!("Art. 13")), ..FineQuery::default() }), ["ES-1"]);
        assert_eq!(keys(&FineQuery { controller: Some(s!("ejemplo")), ..FineQuery::default() }), ["ES-1"]);
        assert_eq!(
            keys(&FineQuery { kind: Some(s!("Insufficient legal basis")), ..FineQuery::default() }),
            ["ES-1"]
        );
        assert_eq!(
            keys(&FineQuery { min_amount: Some(5_000.0), max_amount: Some(10_000.0), ..FineQuery::default() }),
            ["ES-3", "ES-1"]
        );
        assert_eq!(
            keys(&FineQuery {
                from: NaiveDate::from_ymd_opt(2021, 1, 1),
                to: NaiveDate::from_ymd_opt(2021, 12, 31),
                ..FineQuery::default()
            }),
            ["ES-1"]
        );
        assert_eq!(keys(&FineQuery { limit: Some(2), offset: Some(1), ..FineQuery::default() }), ["ES-2", "ES-1"]);
    }

    #[test]
    fn monthly_totals_group_by_decision_month() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_batch(&[
                fine("A", "Spain", Some((2022, 1, 3)), Some(100.0)),
                fine("B", "Spain", Some((2022, 1, 28)), None),
                fine("C", "Spain", Some((2021, 12, 1)), Some(50.5)),
                fine("D", "Spain", None, Some(7.0)),
            ])
            .unwrap();

        let totals = store.monthly_totals().unwrap();
        let flat: Vec<(&str, u64, f64)> =
            totals.iter().map(|t| (t.year_month.as_str(), t.count, t.total_eur)).collect();
        assert_eq!(flat, [("2022-01", 2, 100.0), ("2021-12", 1, 50.5), ("", 1, 7.0)]);
    }

    #[test]
    fn open_creates_parent_dirs_and_persists() {
        let dir = std::env::temp_dir().join(format!("fine_scrape_store_{}", std::process::id()));
        let path = dir.join("nested").join("fines.db");
        let _ = fs::remove_dir_all(&dir);

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert_batch(&[fine("PL-1", "Poland", Some((2019, 9, 10)), Some(3_000.0))]).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let got = store.get("PL-1").unwrap().unwrap();
        assert_eq!(got.decision_date, NaiveDate::from_ymd_opt(2019, 9, 10));
        assert_eq!(got.scraped_at, at(1));

        let _ = fs::remove_dir_all(&dir);
    }
}
