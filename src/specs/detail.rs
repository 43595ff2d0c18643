// src/specs/detail.rs
use super::header::HeaderKey;
use crate::core::normalize::absolute_url;
use crate::core::sanitize::{after_label, normalize_label};

/// What an expanded child row showed, read off the page as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailSnapshot {
    /// Responsive title/data span pairs, in order.
    pub fields: Vec<(String, String)>,
    /// Full rendered text of the child row.
    pub text: String,
    /// `href`s of the first few links.
    pub links: Vec<String>,
}

/// Fields only the freeform part of the panel carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Freeform {
    pub authority: String,
    pub sector: String,
    pub summary: String,
    pub direct_url: Option<String>,
    pub source_url: Option<String>,
}

/// One child row, interpreted: labelled values by logical key plus the freeform fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailBag {
    labels: [Option<String>; HeaderKey::COUNT],
    direct_url: Option<String>,
    pub freeform: Freeform,
}

enum Label {
    Column(HeaderKey),
    DirectUrl,
}

/// Exact matches on `normalize_label` output.
fn classify(label: &str) -> Option<Label> {
    let key = match label {
        "etid" => HeaderKey::Key,
        "country" => HeaderKey::Country,
        "date of decision" | "decision date" | "date" => HeaderKey::Date,
        "fine e" | "fine" => HeaderKey::Fine,
        "controller/processor" | "controller" | "processor" => HeaderKey::Controller,
        "quoted art" | "quoted articles" | "article" | "articles" => HeaderKey::Quoted,
        "type" => HeaderKey::Type,
        "source" => HeaderKey::Source,
        "direct url" | "direct link" => return Some(Label::DirectUrl),
        _ => return None,
    };
    Some(Label::Column(key))
}

impl DetailBag {
    pub fn from_snapshot(snap: &DetailSnapshot, base_url: &str) -> Self {
        let mut bag = Self { freeform: freeform(snap, base_url), ..Self::default() };
        for (title, data) in &snap.fields {
            let value = data.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match classify(&normalize_label(title)) {
                Some(Label::Column(key)) => &mut bag.labels[key.idx()],
                Some(Label::DirectUrl) => &mut bag.direct_url,
                None => continue,
            };
            if slot.is_none() {
                *slot = Some(s!(value));
            }
        }
        bag
    }

    pub fn label(&self, key: HeaderKey) -> Option<&str> {
        self.labels[key.idx()].as_deref()
    }

    pub fn direct_url_label(&self) -> Option<&str> {
        self.direct_url.as_deref()
    }
}

fn freeform(snap: &DetailSnapshot, base_url: &str) -> Freeform {
    let mut out = Freeform::default();
    for line in snap.text.lines() {
        if let Some(v) = after_label(line, "Authority") {
            out.authority = s!(v);
        } else if let Some(v) = after_label(line, "Sector") {
            out.sector = s!(v);
        } else if let Some(v) = after_label(line, "Summary") {
            out.summary = s!(v);
        }
    }

    for href in &snap.links {
        let Some(full) = absolute_url(href, base_url) else { continue };
        let lower = full.to_ascii_lowercase();
        if !lower.starts_with("http") {
            continue;
        }
        if lower.contains("/etid-") {
            if out.direct_url.is_none() {
                out.direct_url = Some(full);
            }
        } else if out.source_url.is_none() {
            out.source_url = Some(full);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.enforcementtracker.com";

    fn snap(text: &str) -> DetailSnapshot {
        DetailSnapshot { text: s!(text), ..DetailSnapshot::default() }
    }

    #[test]
    fn freeform_lines() {
        let bag = DetailBag::from_snapshot(&snap("Authority: LDA\nSector: Retail\nSummary: Misuse of data"), BASE);
        assert_eq!(bag.freeform.authority, "LDA");
        assert_eq!(bag.freeform.sector, "Retail");
        assert_eq!(bag.freeform.summary, "Misuse of data");
    }

    #[test]
    fn freeform_missing_lines_stay_empty() {
        let bag = DetailBag::from_snapshot(&snap("Something else entirely"), BASE);
        assert_eq!(bag.freeform, Freeform::default());
    }

    #[test]
    fn labels_match_through_punctuation() {
        let s = DetailSnapshot {
            fields: vec![
                (s!("Fine [€]"), s!("20.000")),
                (s!("Controller / Processor"), s!("Acme")),
                (s!("Quoted Art."), s!("Art. 6")),
                (s!("Date of Decision:"), s!("01/02/2020")),
                (s!("Direct URL"), s!("/etid-9")),
                (s!("Colour"), s!("blue")),
                (s!("Country"), s!("  ")),
            ],
            ..DetailSnapshot::default()
        };
        let bag = DetailBag::from_snapshot(&s, BASE);
        assert_eq!(bag.label(HeaderKey::Fine), Some("20.000"));
        assert_eq!(bag.label(HeaderKey::Controller), Some("Acme"));
        assert_eq!(bag.label(HeaderKey::Quoted), Some("Art. 6"));
        assert_eq!(bag.label(HeaderKey::Date), Some("01/02/2020"));
        assert_eq!(bag.direct_url_label(), Some("/etid-9"));
        assert_eq!(bag.label(HeaderKey::Country), None);
        assert_eq!(bag.label(HeaderKey::Key), None);
    }

    #[test]
    fn first_label_occurrence_wins() {
        let s = DetailSnapshot {
            fields: vec![(s!("Type"), s!("Controller")), (s!("type"), s!("Processor"))],
            ..DetailSnapshot::default()
        };
        assert_eq!(DetailBag::from_snapshot(&s, BASE).label(HeaderKey::Type), Some("Controller"));
    }

    #[test]
    fn links_split_into_direct_and_source() {
        let s = DetailSnapshot {
            links: vec![
                s!("javascript:void(0)"),
                s!("/ETid-123"),
                s!("https://dpa.example/decision.pdf"),
                s!("https://other.example/"),
            ],
            ..DetailSnapshot::default()
        };
        let ff = DetailBag::from_snapshot(&s, BASE).freeform;
        assert_eq!(ff.direct_url.as_deref(), Some("https://www.enforcementtracker.com/ETid-123"));
        assert_eq!(ff.source_url.as_deref(), Some("https://dpa.example/decision.pdf"));
    }

    #[test]
    fn first_etid_link_wins() {
        let s = DetailSnapshot {
            links: vec![s!("//etid-5"), s!("/etid-6"), s!("https://www.enforcementtracker.com/etid-7")],
            ..DetailSnapshot::default()
        };
        let ff = DetailBag::from_snapshot(&s, BASE).freeform;
        assert_eq!(ff.direct_url.as_deref(), Some("https://www.enforcementtracker.com/etid-5"));
        assert_eq!(ff.source_url, None, "etid links never count as the source");
    }
}
