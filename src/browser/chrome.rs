// src/browser/chrome.rs
// Headless Chromium session (feature `chrome`).
//
// Locator chains are resolved in the page with one injected script per call, so
// nth-addressing and scoped lookups behave exactly like the fixture's.

use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;

use super::{Locator, Session};
use crate::config::consts::{USER_AGENT, VIEWPORT};
use crate::config::CrawlOptions;
use crate::error::BrowserError;

pub struct ChromeSession {
    // Keeps the browser process alive for as long as the tab is in use.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(opts: &CrawlOptions) -> Result<Self, BrowserError> {
        let launch = LaunchOptions::default_builder()
            .headless(opts.headless)
            .window_size(Some(VIEWPORT))
            .build()
            .map_err(|e| BrowserError::Driver(e.to_string()))?;
        let browser = Browser::new(launch).map_err(driver)?;
        let tab = browser.new_tab().map_err(driver)?;
        tab.set_user_agent(USER_AGENT, None, None).map_err(driver)?;
        tab.set_default_timeout(opts.waits.navigation);
        logf!("chromium up (headless={})", opts.headless);
        Ok(Self { _browser: browser, tab })
    }

    /// Evaluate `body` with `el` bound to the first match and `all` to every match.
    fn eval(&self, loc: &Locator, body: &str) -> Option<Value> {
        let steps = serde_json::to_string(loc.steps()).ok()?;
        let js = format!(
            r#"(() => {{
                let scope = [document];
                for (const s of {steps}) {{
                    let found = [];
                    for (const root of scope) found.push(...root.querySelectorAll(s.css));
                    if (s.nth !== null) found = found[s.nth] ? [found[s.nth]] : [];
                    scope = found;
                }}
                const all = scope;
                const el = all[0] || null;
                return {body};
            }})()"#
        );
        match self.tab.evaluate(&js, false) {
            Ok(obj) => obj.value,
            Err(e) => {
                logd!("evaluate on {loc}: {e}");
                None
            }
        }
    }
}

fn driver(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

fn js_str(s: &str) -> String {
    Value::String(s!(s)).to_string()
}

impl Session for ChromeSession {
    fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.tab.set_default_timeout(timeout);
        self.tab.navigate_to(url).map_err(driver)?;
        self.tab.wait_until_navigated().map_err(driver)?;
        Ok(())
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.tab
            .wait_for_element_with_custom_timeout(css, timeout)
            .map(|_| ())
            .map_err(|_| BrowserError::Timeout { what: s!(css), ms: timeout.as_millis() as u64 })
    }

    fn count(&mut self, loc: &Locator) -> usize {
        self.eval(loc, "all.length")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize
    }

    fn inner_text(&mut self, loc: &Locator) -> Option<String> {
        self.eval(loc, "el ? el.innerText : null")
            .and_then(|v| v.as_str().map(String::from))
    }

    fn attribute(&mut self, loc: &Locator, name: &str) -> Option<String> {
        let body = format!("el ? el.getAttribute({}) : null", js_str(name));
        self.eval(loc, &body).and_then(|v| v.as_str().map(String::from))
    }

    fn is_visible(&mut self, loc: &Locator) -> bool {
        self.eval(loc, "!!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    // Script clicks are synchronous; the timeout only matters to drivers that
    // wait for actionability.
    fn click(&mut self, loc: &Locator, _timeout: Duration) -> Result<(), BrowserError> {
        match self.eval(loc, "el ? (el.click(), true) : false").and_then(|v| v.as_bool()) {
            Some(true) => Ok(()),
            _ => Err(BrowserError::Missing(loc.to_string())),
        }
    }

    fn select_option(&mut self, loc: &Locator, value: &str) -> Result<(), BrowserError> {
        let body = format!(
            r#"(() => {{
                if (!el || el.tagName !== 'SELECT') return false;
                const want = {v};
                const opt = [...el.options].find(o => o.value === want)
                    || [...el.options].find(o => o.text.trim() === want);
                if (!opt) return false;
                el.value = opt.value;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            v = js_str(value)
        );
        match self.eval(loc, &body).and_then(|v| v.as_bool()) {
            Some(true) => Ok(()),
            _ => Err(BrowserError::Missing(format!("option `{value}` in {loc}"))),
        }
    }

    fn add_style(&mut self, css: &str) -> Result<(), BrowserError> {
        let js = format!(
            "(() => {{ const s = document.createElement('style'); s.textContent = {}; document.head.appendChild(s); return true; }})()",
            js_str(css)
        );
        self.tab.evaluate(&js, false).map(|_| ()).map_err(driver)
    }

    fn pause(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
