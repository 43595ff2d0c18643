// src/specs/mod.rs
//! # Registry table “specs”
//!
//! This module knows **how to read the fines table** once a page is on screen.
//! The crawler in `scrape` decides *when* a page is ready; everything here works
//! against whatever the [`Session`](crate::browser::Session) currently shows.
//!
//! ## What lives here
//! - **Header resolution** (`header`): free-text column captions → a fixed
//!   [`HeaderKey`] → column index map. Column order on the site is not stable.
//! - **Row pairing** (`rows`): walk the live rows, open each one, and hand out the
//!   primary row together with the child row the table inserts beneath it.
//! - **Detail interpretation** (`detail`): labelled title/data spans plus the
//!   freeform `Authority:` / `Sector:` / `Summary:` lines and links.
//! - **Record assembly** (`fines`): primary cell first, detail label second, freeform
//!   last, then currency/date/link normalization from `core::normalize`.
//!
//! ## What does **not** live here
//! - Navigation, consent banners, page length and pagination (`scrape::crawl`).
//! - Persistence and the merge policy (`store`).
//!
//! ## Typical call chain
//! ```text
//! scrape::Crawler → specs::header::HeaderMap::read()
//!                 → specs::fines::extract_page() → RowPairs → assemble()
//!                 ↘ PageBatch → store::FineStore::upsert_batch (outside of specs)
//! ```
//!
//! ## Conventions & invariants
//! - **Nothing here fails.** A missing cell, label or link leaves the field empty.
//!   Only the crawler turns structural problems into errors.
//! - Snapshots (`RowPair`, `DetailSnapshot`) are owned copies; assembly never
//!   touches the session.
//! - Keys are unique within a [`PageBatch`](fines::PageBatch); the first row wins.
//!
//! ## Testing notes
//! Everything is testable offline with `browser::fixture::FixtureSession`.
pub mod detail;
pub mod fines;
pub mod header;
pub mod rows;

pub use fines::{PageBatch, assemble, extract_page};
pub use header::{HeaderKey, HeaderMap};
pub use rows::{CellSnapshot, RowPair, RowPairs};
