// src/browser/fixture.rs
//! In-memory stand-in for the registry page.
//!
//! The fixture keeps a model of a DataTables table (pages of rows, which rows are
//! expanded, whether the consent banner is up) and re-renders it to HTML on every
//! query. Locators are then resolved against the rendered document with `scraper`,
//! so the crawler sees the same markup shapes it meets on the live site:
//! `tbody tr` rows, Responsive `tr.child` detail rows with `span.dtr-title` /
//! `span.dtr-data` pairs, a page-length `<select>` and a `paginate_button next`.
//!
//! Clicks are mapped back onto the model through `data-row` / `data-action`
//! attributes on the clicked element or its ancestors.

use std::collections::BTreeSet;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use super::{Locator, Session};
use crate::error::BrowserError;

const PAGE_LENGTHS: &[&str] = &["10", "25", "50", "100"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixtureCell {
    pub text: String,
    pub href: Option<String>,
}

/// Content of an expanded child row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixtureDetail {
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    links: Vec<String>,
}

impl FixtureDetail {
    pub fn new() -> Self {
        Self::default()
    }

    /// A Responsive title/data pair (a column the main row could not show).
    pub fn field(mut self, title: &str, data: &str) -> Self {
        self.fields.push((s!(title), s!(data)));
        self
    }

    /// Freeform text, one panel line per input line.
    pub fn text(mut self, text: &str) -> Self {
        self.lines.extend(text.lines().map(String::from));
        self
    }

    pub fn link(mut self, href: &str) -> Self {
        self.links.push(s!(href));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixtureRow {
    cells: Vec<FixtureCell>,
    detail: Option<FixtureDetail>,
}

impl FixtureRow {
    pub fn new(cells: &[&str]) -> Self {
        Self {
            cells: cells.iter().map(|t| FixtureCell { text: s!(*t), href: None }).collect(),
            detail: None,
        }
    }

    /// Wrap cell `col` in a link.
    pub fn link(mut self, col: usize, href: &str) -> Self {
        if let Some(cell) = self.cells.get_mut(col) {
            cell.href = Some(s!(href));
        }
        self
    }

    pub fn detail(mut self, detail: FixtureDetail) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixturePage {
    headers: Vec<String>,
    rows: Vec<FixtureRow>,
}

impl FixturePage {
    pub fn new(headers: &[&str]) -> Self {
        Self { headers: headers.iter().map(|h| s!(*h)).collect(), rows: Vec::new() }
    }

    pub fn row(mut self, row: FixtureRow) -> Self {
        self.rows.push(row);
        self
    }
}

enum ClickTarget {
    Row(usize),
    Next { disabled: bool },
    Consent,
    Inert,
}

pub struct FixtureSession {
    pages: Vec<FixturePage>,
    current: usize,
    expanded: BTreeSet<usize>,
    consent_open: bool,
    rows_hidden: bool,
    stall_pagination: bool,
    broken_expand: bool,
    visited: Vec<String>,
    styles: Vec<String>,
    page_length: Option<String>,
    paused_ms: u64,
    clicks: usize,
}

impl FixtureSession {
    pub fn new(pages: Vec<FixturePage>) -> Self {
        Self {
            pages,
            current: 0,
            expanded: BTreeSet::new(),
            consent_open: false,
            rows_hidden: false,
            stall_pagination: false,
            broken_expand: false,
            visited: Vec::new(),
            styles: Vec::new(),
            page_length: None,
            paused_ms: 0,
            clicks: 0,
        }
    }

    /// Show a cookie banner that must be clicked away.
    pub fn with_consent_banner(mut self) -> Self {
        self.consent_open = true;
        self
    }

    /// The next button stays enabled but clicking it re-renders nothing.
    pub fn stall_pagination(mut self) -> Self {
        self.stall_pagination = true;
        self
    }

    /// The table body never gets any rows.
    pub fn without_rows(mut self) -> Self {
        self.rows_hidden = true;
        self
    }

    /// Clicks on table rows fail as if the element went stale.
    pub fn failing_expand(mut self) -> Self {
        self.broken_expand = true;
        self
    }

    /// Zero-based index of the page on screen.
    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn page_length(&self) -> Option<&str> {
        self.page_length.as_deref()
    }

    /// Total time spent in `pause`; the fixture never actually sleeps.
    pub fn paused_ms(&self) -> u64 {
        self.paused_ms
    }

    pub fn consent_open(&self) -> bool {
        self.consent_open
    }

    pub fn clicks(&self) -> usize {
        self.clicks
    }

    /// The page as HTML, as it would look right now.
    pub fn render(&self) -> String {
        let mut out = s!("<html><head><title>Enforcement Tracker</title></head><body>");

        if self.consent_open {
            out.push_str(r#"<div id="consent"><button class="cc-allow" data-action="consent">Accept</button></div>"#);
        }

        out.push_str(r#"<div class="dataTables_length"><label>Show <select name="datatable_length">"#);
        for len in PAGE_LENGTHS {
            let selected = if self.page_length.as_deref() == Some(*len) { " selected" } else { "" };
            out.push_str(&format!(r#"<option value="{len}"{selected}>{len}</option>"#));
        }
        out.push_str("</select> entries</label></div>");

        out.push_str(r#"<table id="datatable" class="dataTable"><thead><tr>"#);
        let page = self.pages.get(self.current);
        for h in page.map(|p| p.headers.as_slice()).unwrap_or_default() {
            out.push_str(&format!("<th>{}</th>", esc(h)));
        }
        out.push_str("</tr></thead><tbody>");

        if let (Some(page), false) = (page, self.rows_hidden) {
            for (i, row) in page.rows.iter().enumerate() {
                self.render_row(&mut out, i, row);
            }
        }
        out.push_str("</tbody></table>");

        let last = self.current + 1 >= self.pages.len();
        let disabled = if last { " disabled" } else { "" };
        out.push_str(r#"<div class="dataTables_paginate"><a class="paginate_button previous">Previous</a>"#);
        out.push_str(&format!(r#"<a class="paginate_button next{disabled}" data-action="next">Next</a></div>"#));
        out.push_str("</body></html>");
        out
    }

    fn render_row(&self, out: &mut String, i: usize, row: &FixtureRow) {
        let open = self.expanded.contains(&i) && row.detail.is_some();
        let parity = if i % 2 == 0 { "odd" } else { "even" };
        let class = if open { format!("{parity} parent") } else { s!(parity) };

        out.push_str(&format!(r#"<tr class="{class}" data-row="{i}">"#));
        for cell in &row.cells {
            match &cell.href {
                Some(h) => out.push_str(&format!(r#"<td><a href="{}">{}</a></td>"#, esc(h), esc(&cell.text))),
                None => out.push_str(&format!("<td>{}</td>", esc(&cell.text))),
            }
        }
        out.push_str("</tr>");

        let Some(detail) = row.detail.as_ref().filter(|_| open) else { return };
        out.push_str(&format!(r#"<tr class="child"><td class="child" colspan="{}">"#, row.cells.len().max(1)));
        out.push_str(r#"<ul class="dtr-details">"#);
        for (title, data) in &detail.fields {
            out.push_str(&format!(
                r#"<li><span class="dtr-title">{}</span> <span class="dtr-data">{}</span></li>"#,
                esc(title),
                esc(data)
            ));
            out.push('\n');
        }
        out.push_str("</ul>\n");
        let lines: Vec<String> = detail.lines.iter().map(|l| esc(l)).collect();
        out.push_str(&format!(r#"<div class="dtr-text">{}</div>"#, lines.join("\n")));
        for href in &detail.links {
            out.push_str(&format!("\n<a href=\"{}\">Link</a>", esc(href)));
        }
        out.push_str("</td></tr>");
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.render())
    }
}

impl Session for FixtureSession {
    fn goto(&mut self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.visited.push(s!(url));
        self.current = 0;
        self.expanded.clear();
        Ok(())
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.count(&Locator::css(css)) > 0 {
            Ok(())
        } else {
            Err(BrowserError::Timeout { what: s!(css), ms: timeout.as_millis() as u64 })
        }
    }

    fn count(&mut self, loc: &Locator) -> usize {
        let doc = self.document();
        let n = resolve(&doc, loc).map(|v| v.len()).unwrap_or(0);
        n
    }

    fn inner_text(&mut self, loc: &Locator) -> Option<String> {
        let doc = self.document();
        let text = first(&doc, loc).map(|el| el.text().collect::<String>());
        text
    }

    fn attribute(&mut self, loc: &Locator, name: &str) -> Option<String> {
        let doc = self.document();
        let value = first(&doc, loc).and_then(|el| el.value().attr(name).map(String::from));
        value
    }

    fn is_visible(&mut self, loc: &Locator) -> bool {
        let doc = self.document();
        let visible = first(&doc, loc).is_some_and(|el| !hidden(el));
        visible
    }

    fn click(&mut self, loc: &Locator, _timeout: Duration) -> Result<(), BrowserError> {
        let target = {
            let doc = self.document();
            let el = first(&doc, loc).ok_or_else(|| BrowserError::Missing(loc.to_string()))?;
            click_target(el)
        };
        self.clicks += 1;

        match target {
            ClickTarget::Row(_) if self.broken_expand => {
                Err(BrowserError::Driver(s!("element is detached from the DOM")))
            }
            ClickTarget::Row(i) => {
                if !self.expanded.remove(&i) {
                    self.expanded.insert(i);
                }
                Ok(())
            }
            ClickTarget::Next { disabled } => {
                if !disabled && !self.stall_pagination && self.current + 1 < self.pages.len() {
                    self.current += 1;
                    self.expanded.clear();
                }
                Ok(())
            }
            ClickTarget::Consent => {
                self.consent_open = false;
                Ok(())
            }
            ClickTarget::Inert => Ok(()),
        }
    }

    fn select_option(&mut self, loc: &Locator, value: &str) -> Result<(), BrowserError> {
        let picked = {
            let doc = self.document();
            let el = first(&doc, loc).ok_or_else(|| BrowserError::Missing(loc.to_string()))?;
            if el.value().name() != "select" {
                return Err(BrowserError::Driver(format!("{loc} is not a <select>")));
            }
            let options = Selector::parse("option").map_err(|_| BrowserError::Selector(s!("option")))?;
            el.select(&options)
                .find(|o| {
                    o.value().attr("value") == Some(value) || o.text().collect::<String>().trim() == value
                })
                .map(|o| o.value().attr("value").map(String::from).unwrap_or_else(|| o.text().collect()))
        };
        match picked {
            Some(v) => {
                self.page_length = Some(v);
                Ok(())
            }
            None => Err(BrowserError::Missing(format!("option `{value}` in {loc}"))),
        }
    }

    fn add_style(&mut self, css: &str) -> Result<(), BrowserError> {
        self.styles.push(s!(css));
        Ok(())
    }

    fn pause(&mut self, ms: u64) {
        self.paused_ms += ms;
    }
}

fn resolve<'a>(doc: &'a Html, loc: &Locator) -> Result<Vec<ElementRef<'a>>, BrowserError> {
    let mut scope: Option<Vec<ElementRef<'a>>> = None;
    for step in loc.steps() {
        let sel = Selector::parse(&step.css).map_err(|_| BrowserError::Selector(step.css.clone()))?;
        let found: Vec<ElementRef<'a>> = match &scope {
            None => doc.select(&sel).collect(),
            Some(parents) => parents.iter().flat_map(|p| p.select(&sel)).collect(),
        };
        scope = Some(match step.nth {
            Some(i) => found.into_iter().nth(i).into_iter().collect(),
            None => found,
        });
    }
    Ok(scope.unwrap_or_default())
}

fn first<'a>(doc: &'a Html, loc: &Locator) -> Option<ElementRef<'a>> {
    resolve(doc, loc).ok()?.into_iter().next()
}

fn self_and_ancestors(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    std::iter::successors(Some(el), |e| e.parent().and_then(ElementRef::wrap))
}

fn hidden(el: ElementRef<'_>) -> bool {
    self_and_ancestors(el).any(|e| {
        let v = e.value();
        v.attr("hidden").is_some()
            || v.attr("style").is_some_and(|s| s.replace(' ', "").contains("display:none"))
    })
}

fn click_target(el: ElementRef<'_>) -> ClickTarget {
    for e in self_and_ancestors(el) {
        let v = e.value();
        match v.attr("data-action") {
            Some("next") => return ClickTarget::Next { disabled: v.classes().any(|c| c == "disabled") },
            Some("consent") => return ClickTarget::Consent,
            _ => {}
        }
        if let Some(i) = v.attr("data-row").and_then(|r| r.parse().ok()) {
            return ClickTarget::Row(i);
        }
    }
    ClickTarget::Inert
}

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
