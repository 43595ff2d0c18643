// src/log.rs
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing_subscriber::fmt::time::Uptime;

#[doc(hidden)]
pub use tracing;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Route `logf!` / `logd!` / `loge!` into an append-only log file.
/// Lines carry the elapsed time since `init`. Only the first call installs anything;
/// before that, events go nowhere.
pub fn init(path: &Path, verbose: bool) -> std::io::Result<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let installed = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(Uptime::default())
        .with_max_level(level)
        .try_init()
        .is_ok();
    if installed {
        let _ = INSTALLED.set(());
    }
    Ok(())
}

/// Info-level logging
#[macro_export]
macro_rules! logf {
    ($($arg:tt)*) => {
        $crate::log::tracing::info!($($arg)*)
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! logd {
    ($($arg:tt)*) => {
        $crate::log::tracing::debug!($($arg)*)
    };
}

/// Error-level logging
#[macro_export]
macro_rules! loge {
    ($($arg:tt)*) => {
        $crate::log::tracing::error!($($arg)*)
    };
}
