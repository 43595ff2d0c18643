// src/file.rs

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::FineRecord;
use crate::error::StoreError;
use crate::store::SqliteStore;

pub const DEFAULT_EXPORT_FILENAME: &str = "fines.ndjson";

/// One JSON object per line, in the order given. Returns the number of lines written.
pub fn write_ndjson<W: Write>(out: &mut W, records: &[FineRecord]) -> Result<usize, StoreError> {
    for rec in records {
        serde_json::to_writer(&mut *out, rec)?;
        out.write_all(b"\n")?;
    }
    Ok(records.len())
}

/// Dump every stored fine (newest decision first) to `path` as NDJSON.
pub fn export_ndjson(store: &SqliteStore, path: &Path) -> Result<usize, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let records = store.all_by_date()?;
    let mut out = BufWriter::new(File::create(path)?); // truncate/overwrite
    let n = write_ndjson(&mut out, &records)?;
    out.flush()?;
    logf!("exported {n} fines to {}", path.display());
    Ok(n)
}

/// `-o` may name a file or a directory (existing, or hinted by a trailing separator).
pub fn resolve_export_path(user_o: &str) -> io::Result<PathBuf> {
    if user_o.is_empty() {
        return Ok(PathBuf::from(DEFAULT_EXPORT_FILENAME));
    }
    let p = PathBuf::from(normalize_separators(user_o));
    if looks_like_dir_hint(user_o) || p.is_dir() {
        ensure_directory(&p)?;
        Ok(p.join(DEFAULT_EXPORT_FILENAME))
    } else {
        Ok(p)
    }
}

pub fn normalize_separators(p: &str) -> String {
    let sep = std::path::MAIN_SEPARATOR;
    p.chars().map(|c| if c == '/' || c == '\\' { sep } else { c }).collect()
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::other(format!("Path exists but is not a directory: {}", dir.display())));
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn looks_like_dir_hint(p: &str) -> bool {
    p.ends_with('/') || p.ends_with('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn ndjson_is_one_object_per_line() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut a = FineRecord::new("A-1", at);
        a.summary = s!("line one\nline two");
        let b = FineRecord::new("B-2", at);

        let mut buf = Vec::new();
        assert_eq!(write_ndjson(&mut buf, &[a, b]).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "embedded newlines stay escaped");
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["etid"], "A-1");
        assert_eq!(first["summary"], "line one\nline two");
    }

    #[test]
    fn export_path_accepts_directory_hints() {
        let dir = std::env::temp_dir().join(format!("fine_scrape_hint_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let hinted = format!("{}/", dir.display());

        let p = resolve_export_path(&hinted).unwrap();
        assert!(dir.is_dir());
        assert!(p.ends_with(DEFAULT_EXPORT_FILENAME));

        let file = dir.join("out.json");
        assert_eq!(resolve_export_path(file.to_str().unwrap()).unwrap(), file);
        assert_eq!(resolve_export_path("").unwrap(), PathBuf::from(DEFAULT_EXPORT_FILENAME));

        let _ = fs::remove_dir_all(&dir);
    }
}
