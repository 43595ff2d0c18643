// src/core/sanitize.rs

/// Collapse runs of whitespace (including NBSP) to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Header text as the resolver compares it: lower-case, `€` folded to `e`,
/// whitespace collapsed. Punctuation is kept so substring candidates can use it.
pub fn fold_header(s: &str) -> String {
    normalize_ws(&s.to_lowercase().replace('€', "e"))
}

/// Detail-panel label as a lookup key: `fold_header`, then brackets, colons and
/// dots dropped and spacing around `/` removed.
/// `"Fine [€]"` → `"fine e"`, `"Controller / Processor:"` → `"controller/processor"`.
pub fn normalize_label(s: &str) -> String {
    let folded = fold_header(s);
    let mut out = String::with_capacity(folded.len());
    for ch in folded.chars() {
        match ch {
            '[' | ']' | '(' | ')' | ':' | '.' => out.push(' '),
            _ => out.push(ch),
        }
    }
    let out = normalize_ws(&out);
    out.replace(" /", "/").replace("/ ", "/")
}

/// If `line` starts with `label`, the remainder with surrounding spaces and colons removed.
/// `"Authority: LDA"` with label `"Authority"` → `Some("LDA")`.
pub fn after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix(label)?;
    Some(rest.trim_matches(|c: char| c == ':' || c.is_whitespace()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_collapses_nbsp_and_newlines() {
        assert_eq!(normalize_ws("  Date of\n\u{a0}decision "), "Date of decision");
    }

    #[test]
    fn header_folding_keeps_punctuation() {
        assert_eq!(fold_header("Fine [€]"), "fine [e]");
        assert_eq!(fold_header("Quoted  Art."), "quoted art.");
    }

    #[test]
    fn labels_lose_brackets_and_slash_spacing() {
        assert_eq!(normalize_label("Fine [€]"), "fine e");
        assert_eq!(normalize_label("Controller / Processor:"), "controller/processor");
        assert_eq!(normalize_label("Quoted Art."), "quoted art");
        assert_eq!(normalize_label("  Date of Decision "), "date of decision");
    }

    #[test]
    fn after_label_strips_colon() {
        assert_eq!(after_label("Authority: LDA", "Authority"), Some("LDA"));
        assert_eq!(after_label("  Sector : Retail ", "Sector"), Some("Retail"));
        assert_eq!(after_label("Summary", "Summary"), Some(""));
        assert_eq!(after_label("Country: DE", "Authority"), None);
    }
}
