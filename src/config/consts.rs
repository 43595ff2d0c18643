// src/config/consts.rs

// Site
pub const BASE_URL: &str = "https://www.enforcementtracker.com";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const VIEWPORT: (u32, u32) = (1366, 900);

// Table structure (first candidate that shows rows wins)
pub const ROW_SELECTORS: &[&str] = &[
    "table.dataTable tbody tr",
    "table#datatable tbody tr",
    "table tbody tr",
];
pub const HEADER_SELECTOR: &str = "table thead th";
pub const CELL_SELECTOR: &str = "td";
pub const LINK_SELECTOR: &str = "a[href]";

// DataTables Responsive child rows
pub const DETAIL_ROW_CLASS: &str = "child";
pub const DETAIL_TITLE_SELECTOR: &str = "span.dtr-title";
pub const DETAIL_DATA_SELECTOR: &str = "span.dtr-data";
pub const DETAIL_MAX_LINKS: usize = 10;

// Page chrome
pub const CONSENT_SELECTORS: &[&str] = &[
    "button.cc-allow",
    "#onetrust-accept-btn-handler",
    "button[aria-label='Accept']",
    "button[aria-label='Accept all']",
];
pub const LENGTH_SELECTORS: &[&str] = &[
    "div.dataTables_length select",
    "select[name$=\"_length\"]",
];
pub const NEXT_SELECTORS: &[&str] = &[
    "a.paginate_button.next:not(.disabled)",
    "li.next:not(.disabled) a",
];
pub const PAGE_LENGTH: u32 = 100;

// Responsive mode hides columns it cannot fit; force them back into the main row.
pub const UNHIDE_COLUMNS_CSS: &str = "\
.dtr-hidden { display: table-cell !important; }
table.dataTable thead th, table.dataTable tbody td { white-space: nowrap; }";

// Waits (ms)
pub const NAV_TIMEOUT_MS: u64 = 120_000;
pub const ROWS_TIMEOUT_MS: u64 = 60_000;
pub const CLICK_TIMEOUT_MS: u64 = 2_000;
pub const SETTLE_MS: u64 = 150;
pub const LENGTH_SETTLE_MS: u64 = 600;
// Most rows have no child; one short wait per row keeps a 100-row page cheap.
pub const EXPAND_ATTEMPTS: u32 = 1;
pub const EXPAND_INTERVAL_MS: u64 = 100;
pub const PAGINATE_ATTEMPTS: u32 = 20;
pub const PAGINATE_INTERVAL_MS: u64 = 250;

// Logging
pub const HEARTBEAT_ROWS: usize = 10;

// Local store
pub const STORE_DIR: &str = ".store";
pub const DB_FILE: &str = "fines.db";
pub const LOG_FILE: &str = "debug.log";
