// tests/export_ndjson.rs
use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, TimeZone, Utc};

use fine_scrape::data::FineRecord;
use fine_scrape::file;
use fine_scrape::store::{FineStore, SqliteStore};

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("fine_scrape_e2e_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&p);
    p
}

fn fine(key: &str, date: Option<(i32, u32, u32)>) -> FineRecord {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let mut r = FineRecord::new(key, at);
    r.decision_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
    r
}

#[test]
fn export_writes_newest_first_and_creates_dirs() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .upsert_batch(&[fine("OLD", Some((2019, 1, 1))), fine("NONE", None), fine("NEW", Some((2023, 6, 30)))])
        .unwrap();

    let dir = tmp_dir("export");
    let path = dir.join("deep").join("fines.ndjson");
    assert_eq!(file::export_ndjson(&store, &path).unwrap(), 3);

    let text = fs::read_to_string(&path).unwrap();
    let keys: Vec<String> = text
        .lines()
        .map(|l| serde_json::from_str::<FineRecord>(l).unwrap().key)
        .collect();
    assert_eq!(keys, ["NEW", "OLD", "NONE"]);

    // Overwrites rather than appends.
    assert_eq!(file::export_ndjson(&store, &path).unwrap(), 3);
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn exported_lines_round_trip() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut r = fine("IE-7", Some((2022, 9, 2)));
    r.amount_eur = Some(405_000_000.0);
    r.authority = s("DPC");
    r.direct_url = Some(s("https://www.enforcementtracker.com/ETid-7"));
    store.upsert_batch(&[r.clone()]).unwrap();

    let dir = tmp_dir("roundtrip");
    let path = dir.join("one.ndjson");
    file::export_ndjson(&store, &path).unwrap();
    let line = fs::read_to_string(&path).unwrap();
    let back: FineRecord = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(back, r);

    let _ = fs::remove_dir_all(&dir);
}

fn s(v: &str) -> String {
    v.to_string()
}
