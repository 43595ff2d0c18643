// src/cli.rs
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};

use crate::config::CrawlOptions;
use crate::config::options::{default_db_path, default_log_path};
use crate::file;
use crate::progress::Progress;
use crate::scrape::CrawlSummary;
use crate::store::{FineQuery, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "fine_scrape", version, about = "Crawl the fines registry into SQLite and read it back")]
pub struct Cli {
    /// Debug-level lines in the log file.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log file (appended to).
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk every page of the registry and merge it into the database.
    Crawl {
        #[arg(long)]
        db: Option<PathBuf>,
        /// Stop after this many pages; 0 means no cap.
        #[arg(long)]
        max_pages: Option<usize>,
        /// Rows per table page; 0 keeps the site default.
        #[arg(long)]
        page_length: Option<u32>,
        #[arg(long)]
        base_url: Option<String>,
        /// Run Chromium with a visible window.
        #[arg(long)]
        show_browser: bool,
    },
    /// Print matching fines as NDJSON.
    Query {
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        authority: Option<String>,
        #[arg(long)]
        article: Option<String>,
        #[arg(long)]
        controller: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        min_amount: Option<f64>,
        #[arg(long)]
        max_amount: Option<f64>,
        /// Earliest decision date, YYYY-MM-DD.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest decision date, YYYY-MM-DD.
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Fine count and euro total per decision month.
    Stats {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Write every stored fine to an NDJSON file.
    Export {
        #[arg(long)]
        db: Option<PathBuf>,
        /// Output file, or a directory to write `fines.ndjson` into.
        #[arg(short, long, default_value = "")]
        out: String,
    },
}

/// Prints one line per page to stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    max_pages: Option<usize>,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, max_pages: Option<usize>) {
        self.max_pages = max_pages;
        eprintln!("Table found, reading pages…");
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn page_done(&mut self, page: usize, records: usize) {
        match self.max_pages {
            Some(max) => eprintln!("[{page}/{max}] {records} records"),
            None => eprintln!("[{page}] {records} records"),
        }
    }

    fn finish(&mut self, summary: &CrawlSummary) {
        let why = summary.stop.map(|s| s.to_string()).unwrap_or_default();
        eprintln!(
            "Done: {} records over {} pages ({} duplicates, {} without key). {why}",
            summary.records, summary.pages, summary.duplicates, summary.keyless
        );
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let log_path = cli.log.clone().unwrap_or_else(default_log_path);
    crate::log::init(&log_path, cli.verbose)
        .wrap_err_with(|| format!("opening log {}", log_path.display()))?;

    match cli.command {
        Command::Crawl { db, max_pages, page_length, base_url, show_browser } => {
            let opts = crawl_options(max_pages, page_length, base_url, show_browser);
            crawl(&opts, &db.unwrap_or_else(default_db_path))
        }
        Command::Query {
            db,
            country,
            authority,
            article,
            controller,
            kind,
            min_amount,
            max_amount,
            from,
            to,
            limit,
            offset,
        } => {
            let store = open(db)?;
            let q = FineQuery {
                country,
                authority,
                article,
                controller,
                kind,
                min_amount,
                max_amount,
                from,
                to,
                limit,
                offset,
            };
            let fines = store.query(&q)?;
            let mut out = BufWriter::new(io::stdout().lock());
            file::write_ndjson(&mut out, &fines)?;
            out.flush()?;
            Ok(())
        }
        Command::Stats { db } => {
            let store = open(db)?;
            let mut out = BufWriter::new(io::stdout().lock());
            writeln!(out, "year_month,count,total_eur")?;
            for m in store.monthly_totals()? {
                writeln!(out, "{},{},{:.2}", m.year_month, m.count, m.total_eur)?;
            }
            out.flush()?;
            Ok(())
        }
        Command::Export { db, out } => {
            let store = open(db)?;
            let path = file::resolve_export_path(&out)?;
            let n = file::export_ndjson(&store, &path)?;
            eprintln!("Wrote {n} fines to {}", path.display());
            Ok(())
        }
    }
}

/// `0` means "no limit" for `--max-pages` and "site default" for `--page-length`.
fn crawl_options(
    max_pages: Option<usize>,
    page_length: Option<u32>,
    base_url: Option<String>,
    show_browser: bool,
) -> CrawlOptions {
    let mut opts = CrawlOptions {
        headless: !show_browser,
        max_pages: max_pages.filter(|&n| n > 0),
        ..CrawlOptions::default()
    };
    if let Some(url) = base_url {
        opts.base_url = url;
    }
    match page_length {
        Some(0) => opts.page_length = None,
        Some(n) => opts.page_length = Some(n),
        None => {}
    }
    opts
}

fn open(db: Option<PathBuf>) -> Result<SqliteStore> {
    let path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&path).wrap_err_with(|| format!("opening database {}", path.display()))
}

#[cfg(feature = "chrome")]
fn crawl(opts: &CrawlOptions, db: &Path) -> Result<()> {
    use crate::browser::chrome::ChromeSession;
    use crate::scrape::Crawler;

    let mut store = SqliteStore::open(db).wrap_err_with(|| format!("opening database {}", db.display()))?;
    let mut session = ChromeSession::launch(opts).wrap_err("launching Chromium")?;
    Crawler::new(&mut session, &mut store, opts).run(&mut ConsoleProgress::default())?;
    Ok(())
}

#[cfg(not(feature = "chrome"))]
fn crawl(_opts: &CrawlOptions, _db: &Path) -> Result<()> {
    color_eyre::eyre::bail!("crawling needs a browser; rebuild with `--features chrome`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_filters() {
        let cli = Cli::try_parse_from([
            "fine_scrape",
            "query",
            "--country",
            "Spain",
            "--type",
            "Insufficient legal basis",
            "--from",
            "2021-01-01",
            "--min-amount",
            "1000",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Query { country, kind, from, min_amount, limit, .. } => {
                assert_eq!(country.as_deref(), Some("Spain"));
                assert_eq!(kind.as_deref(), Some("Insufficient legal basis"));
                assert_eq!(from, NaiveDate::from_ymd_opt(2021, 1, 1));
                assert_eq!(min_amount, Some(1000.0));
                assert_eq!(limit, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_crawl_flags() {
        let cli = Cli::try_parse_from(["fine_scrape", "crawl", "--max-pages", "3", "--show-browser"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Crawl { max_pages: Some(3), show_browser: true, page_length: None, .. }
        ));
    }

    #[test]
    fn zero_limits_fall_back_to_defaults() {
        let opts = crawl_options(Some(0), Some(0), None, false);
        assert_eq!(opts.max_pages, None, "zero pages means no cap");
        assert_eq!(opts.page_length, None);
        assert!(opts.headless);

        let opts = crawl_options(Some(2), Some(50), Some(s!("http://localhost/")), true);
        assert_eq!(opts.max_pages, Some(2));
        assert_eq!(opts.page_length, Some(50));
        assert_eq!(opts.base_url, "http://localhost/");
        assert!(!opts.headless);
    }
}
