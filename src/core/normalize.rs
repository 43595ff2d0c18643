// src/core/normalize.rs
//! Raw cell text → typed values.
//!
//! Every function here is total: bad input comes back as `None`, never as a panic
//! or an error, so one unreadable cell costs one field and nothing more.

use chrono::{Datelike, NaiveDate};
use url::Url;

/// Day-first before month-first, two-digit years before four-digit ones
/// (`%Y` would happily read `21` as the year 21).
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d.%m.%y", "%d-%m-%y",
    "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y",
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d",
    "%d %B %Y", "%d. %B %Y", "%B %d, %Y", "%B %d %Y",
];

/// Plausible decision years; anything else is a misread.
const YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Currency text → euros. `"1.234,56 €"` → `1234.56`, `"10.000"` → `10000.0`.
///
/// Decimal commas become points, then a point that follows a digit and is followed
/// by exactly three digits (and a non-digit or the end) is a thousands separator.
pub fn parse_amount_eur(raw: &str) -> Option<f64> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '€' | '\u{a0}' | '\u{202f}' | ' '))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if compact.is_empty() {
        return None;
    }

    let value: f64 = drop_thousands_separators(&compact).parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn drop_thousands_separators(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        let grouped = c == '.'
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && is_digit_group(&chars[i + 1..]);
        if !grouped {
            out.push(c);
        }
    }
    out
}

fn is_digit_group(rest: &[char]) -> bool {
    rest.len() >= 3
        && rest[..3].iter().all(|c| c.is_ascii_digit())
        && rest.get(3).is_none_or(|c| !c.is_ascii_digit())
}

/// Registry date text → calendar date, day before month. `"05/03/2021"` → 2021-03-05.
/// A trailing time (`"05/03/2021 10:00"`, `"2021-03-05T10:00:00"`) is ignored.
pub fn parse_decision_date(raw: &str) -> Option<NaiveDate> {
    let txt = raw.trim();
    if txt.is_empty() {
        return None;
    }

    let mut candidates = vec![txt];
    if let Some((day, _)) = txt.split_once('T') {
        candidates.push(day);
    }
    if let Some(first) = txt.split_whitespace().next() {
        candidates.push(first);
    }

    candidates.into_iter().find_map(|c| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(c, fmt).ok())
            .filter(|d| YEARS.contains(&d.year()))
    })
}

/// Make `href` absolute against `base`. Links that already carry a scheme pass
/// through untouched; anything else, `//etid-1` included, is joined onto `base`
/// with the slashes at the seam collapsed to one.
pub fn absolute_url(href: &str, base: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if Url::parse(href).is_ok() {
        return Some(s!(href));
    }
    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        href.trim_start_matches('/')
    ))
}
