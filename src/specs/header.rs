// src/specs/header.rs
use std::fmt;

use crate::browser::{Locator, Session};
use crate::core::sanitize::fold_header;

/// The logical columns the registry table carries, whatever their order on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    Key,
    Country,
    Date,
    Fine,
    Controller,
    Quoted,
    Type,
    Source,
}

impl HeaderKey {
    pub const COUNT: usize = 8;
    pub const ALL: [HeaderKey; Self::COUNT] = [
        HeaderKey::Key,
        HeaderKey::Country,
        HeaderKey::Date,
        HeaderKey::Fine,
        HeaderKey::Controller,
        HeaderKey::Quoted,
        HeaderKey::Type,
        HeaderKey::Source,
    ];

    pub(crate) fn idx(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            HeaderKey::Key => "key",
            HeaderKey::Country => "country",
            HeaderKey::Date => "date",
            HeaderKey::Fine => "fine",
            HeaderKey::Controller => "controller",
            HeaderKey::Quoted => "quoted",
            HeaderKey::Type => "type",
            HeaderKey::Source => "source",
        }
    }

    /// Substrings that identify this column in a folded header text, most specific first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            HeaderKey::Key => &["etid"],
            HeaderKey::Country => &["country"],
            HeaderKey::Date => &["date of decision", "decision date", "date"],
            HeaderKey::Fine => &["fine"],
            HeaderKey::Controller => &["controller", "processor", "controller/processor"],
            HeaderKey::Quoted => &["quoted art", "article"],
            HeaderKey::Type => &["type"],
            HeaderKey::Source => &["source"],
        }
    }
}

/// Which cell index holds each logical column on the current page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    cols: [Option<usize>; HeaderKey::COUNT],
}

impl HeaderMap {
    /// For every key, the first header (in document order) containing one of its candidates.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let folded: Vec<String> = headers.iter().map(|h| fold_header(h.as_ref())).collect();
        let mut map = Self::default();
        for key in HeaderKey::ALL {
            map.cols[key.idx()] = folded
                .iter()
                .position(|h| key.candidates().iter().any(|c| h.contains(c)));
        }
        map
    }

    /// Read the header row off the page and resolve it.
    pub fn read<S: Session + ?Sized>(session: &mut S, header_css: &str) -> Self {
        let cells = Locator::css(header_css);
        let n = session.count(&cells);
        let texts: Vec<String> = (0..n)
            .map(|i| session.inner_text(&cells.clone().nth(i)).unwrap_or_default())
            .collect();
        let map = Self::resolve(&texts);
        logd!("header detected: {map} from {texts:?}");
        let missing: Vec<&str> = map.missing().map(HeaderKey::name).collect();
        if !missing.is_empty() {
            logd!("no header column for {}; labels only", missing.join(", "));
        }
        map
    }

    pub fn column(&self, key: HeaderKey) -> Option<usize> {
        self.cols[key.idx()]
    }

    pub fn missing(&self) -> impl Iterator<Item = HeaderKey> + '_ {
        HeaderKey::ALL.into_iter().filter(|k| self.column(*k).is_none())
    }
}

impl fmt::Display for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in HeaderKey::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match self.column(*key) {
                Some(c) => write!(f, "{}={c}", key.name())?,
                None => write!(f, "{}=-", key.name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixture::{FixturePage, FixtureSession};

    const REGISTRY: [&str; 9] = [
        "View", "ETId", "Country", "Date of decision", "Fine [€]",
        "Controller/processor", "Quoted Art.", "Type", "Source",
    ];

    #[test]
    fn registry_headers_map_in_order() {
        let m = HeaderMap::resolve(&REGISTRY);
        assert_eq!(m.column(HeaderKey::Key), Some(1));
        assert_eq!(m.column(HeaderKey::Country), Some(2));
        assert_eq!(m.column(HeaderKey::Date), Some(3));
        assert_eq!(m.column(HeaderKey::Fine), Some(4));
        assert_eq!(m.column(HeaderKey::Controller), Some(5));
        assert_eq!(m.column(HeaderKey::Quoted), Some(6));
        assert_eq!(m.column(HeaderKey::Type), Some(7));
        assert_eq!(m.column(HeaderKey::Source), Some(8));
        assert_eq!(m.missing().count(), 0);
    }

    #[test]
    fn tolerant_of_case_spacing_and_order() {
        let m = HeaderMap::resolve(&["  SOURCE ", "Decision\n Date", "ETID", "Controller / Processor"]);
        assert_eq!(m.column(HeaderKey::Source), Some(0));
        assert_eq!(m.column(HeaderKey::Date), Some(1));
        assert_eq!(m.column(HeaderKey::Key), Some(2));
        assert_eq!(m.column(HeaderKey::Controller), Some(3));
        assert_eq!(m.column(HeaderKey::Fine), None);
    }

    #[test]
    fn first_matching_header_wins() {
        let m = HeaderMap::resolve(&["Date", "Date of decision"]);
        assert_eq!(m.column(HeaderKey::Date), Some(0));
    }

    #[test]
    fn hidden_columns_surface_as_missing() {
        let m = HeaderMap::resolve(&["View", "ETId", "Country"]);
        let missing: Vec<_> = m.missing().collect();
        assert!(missing.contains(&HeaderKey::Fine));
        assert!(missing.contains(&HeaderKey::Source));
        assert_eq!(m.to_string(), "key=1 country=2 date=- fine=- controller=- quoted=- type=- source=-");
    }

    #[test]
    fn empty_header_row_is_all_missing() {
        let none: [&str; 0] = [];
        assert_eq!(HeaderMap::resolve(&none), HeaderMap::default());
    }

    #[test]
    fn read_pulls_header_cells_from_page() {
        let mut s = FixtureSession::new(vec![FixturePage::new(&REGISTRY)]);
        let m = HeaderMap::read(&mut s, "table thead th");
        assert_eq!(m, HeaderMap::resolve(&REGISTRY));
    }

    #[test]
    fn read_with_hidden_columns_reports_them_missing() {
        let mut s = FixtureSession::new(vec![FixturePage::new(&["View", "ETId", "Country"])]);
        let m = HeaderMap::read(&mut s, "table thead th");
        assert_eq!(m.column(HeaderKey::Key), Some(1));
        assert_eq!(m.missing().count(), HeaderKey::COUNT - 2);
    }
}
