pub mod competitive;
pub mod content;
pub mod icp;
pub mod personas;
pub mod positioning;
pub mod products;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub use competitive::{CompetitiveAnalysis, CompetitorComparison};
pub use content::{ContentAudit, PriorityRecommendation};
pub use icp::{IcpResearch, JtbdEntry, SignalEntry};
pub use personas::Persona;
pub use positioning::CompanyAnalysis;

static SEPARATOR_ROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s\-:|]+$").unwrap());

/// One extractor result per document shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "record", rename_all = "camelCase")]
pub enum ExtractedRecord {
    Positioning(CompanyAnalysis),
    Icp(IcpResearch),
    Personas(Vec<Persona>),
    Competitive(CompetitiveAnalysis),
    Content(ContentAudit),
    Products(Vec<String>),
}

/// Outcome check for cascade tiers: an empty result lets the next tier run.
pub trait Harvest {
    fn is_miss(&self) -> bool;
}

impl<T> Harvest for Vec<T> {
    fn is_miss(&self) -> bool {
        self.is_empty()
    }
}

impl Harvest for String {
    fn is_miss(&self) -> bool {
        self.trim().is_empty()
    }
}

/// A named parsing strategy over some input.
pub struct Tier<I: ?Sized, T> {
    pub name: &'static str,
    pub run: fn(&I) -> T,
}

/// Run tiers in order and keep the first non-miss result.
pub fn cascade<I: ?Sized, T: Harvest + Default>(input: &I, tiers: &[Tier<I, T>]) -> T {
    for tier in tiers {
        let out = (tier.run)(input);
        if !out.is_miss() {
            debug!(tier = tier.name, "extraction tier hit");
            return out;
        }
    }
    T::default()
}

/// Capture the text after the first of `starts` up to the next of `stops`.
///
/// Phrases opening a line (after optional markdown marks) match in any case.
/// A stop only counts there, so prose that mentions a header phrase never ends
/// the span. A start falls back to an exact-case match mid-line. A missing
/// start yields an empty string; empty `stops` runs to the end.
pub fn anchored_span(text: &str, starts: &[&str], stops: &[&str]) -> String {
    let Some(m) = alternation(starts, true, r"[:\s]*")
        .and_then(|re| re.find(text))
        .or_else(|| alternation(starts, false, r"[:\s]*").and_then(|re| re.find(text)))
    else {
        return String::new();
    };
    let rest = &text[m.end()..];
    let end = alternation(stops, true, "")
        .and_then(|re| re.find(rest))
        .map(|s| s.start())
        .unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

fn alternation(phrases: &[&str], line_start: bool, suffix: &str) -> Option<Regex> {
    if phrases.is_empty() {
        return None;
    }
    let body = phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    let lead = if line_start { r"(?im)^[ \t#*>]*" } else { "" };
    Regex::new(&format!("{lead}(?:{body}){suffix}")).ok()
}

/// Pull delimiter-separated rows out of `span`.
///
/// A line qualifies when it splits into at least `min_cells` cells, its first
/// cell is non-empty and does not echo a column header. Rows are padded to
/// `columns` cells with empty strings so columns never shift.
pub fn delimited_rows(
    span: &str,
    delimiter: &str,
    min_cells: usize,
    columns: usize,
    header_echo: &[&str],
) -> Vec<Vec<String>> {
    span.lines()
        .filter_map(|line| parse_row(line, delimiter, min_cells, columns, header_echo))
        .collect()
}

pub(crate) fn parse_row(
    line: &str,
    delimiter: &str,
    min_cells: usize,
    columns: usize,
    header_echo: &[&str],
) -> Option<Vec<String>> {
    let line = line.trim();
    if !line.contains(delimiter) || SEPARATOR_ROW_RE.is_match(line) {
        return None;
    }
    let line = line.trim_start_matches('|').trim_end_matches('|');
    let mut cells: Vec<String> = line.split(delimiter).map(|c| c.trim().to_string()).collect();
    if cells.len() < min_cells || cells[0].is_empty() {
        return None;
    }
    let first = cells[0].to_lowercase();
    if header_echo.iter().any(|h| first.contains(h)) {
        return None;
    }
    cells.resize(columns.max(cells.len()), String::new());
    Some(cells)
}

/// Truncate to `max` chars, appending "..." when cut.
pub fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

/// Truncate to `max` chars without a marker.
pub fn take_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Collapse internal whitespace runs to single spaces.
pub fn squash_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const VOCAB: &[&str] = &["WHAT YOU DO", "THE PAIN YOU ADDRESS", "POSITIONING OBSERVATION"];

    #[test]
    fn span_between_anchors() {
        let text = "WHAT YOU DO\nShips invoices.\nTHE PAIN YOU ADDRESS\nSlow closes.";
        assert_eq!(anchored_span(text, &["what you do"], VOCAB), "Ships invoices.");
        assert_eq!(anchored_span(text, &["THE PAIN YOU ADDRESS"], VOCAB), "Slow closes.");
    }

    #[test]
    fn span_missing_anchor_is_empty() {
        assert_eq!(anchored_span("nothing here", &["WHAT YOU DO"], VOCAB), "");
        assert_eq!(anchored_span("", &["WHAT YOU DO"], VOCAB), "");
    }

    #[test]
    fn span_ignores_header_phrase_inside_prose() {
        let text = "POSITIONING OBSERVATION\nYour site explains what you do but never says why it matters.";
        assert_eq!(
            anchored_span(text, &["POSITIONING OBSERVATION"], VOCAB),
            "Your site explains what you do but never says why it matters."
        );
    }

    #[test]
    fn span_stops_at_marked_up_header_line() {
        let text = "## WHAT YOU DO\nShips invoices.\n**THE PAIN YOU ADDRESS**\nSlow closes.";
        assert_eq!(anchored_span(text, &["WHAT YOU DO"], VOCAB), "Ships invoices.");
    }

    #[test]
    fn span_prefers_line_start_anchor() {
        let text = "I'll look at what you do first.\nWHAT YOU DO\nShips invoices.";
        assert_eq!(anchored_span(text, &["WHAT YOU DO"], VOCAB), "Ships invoices.");
    }

    #[test]
    fn span_mid_line_start_needs_exact_case() {
        assert_eq!(anchored_span("Notes. WHAT YOU DO: Ships invoices.", &["WHAT YOU DO"], &[]), "Ships invoices.");
        assert_eq!(anchored_span("We know what you do here.", &["WHAT YOU DO"], &[]), "");
    }

    #[test]
    fn span_consumes_colon() {
        assert_eq!(anchored_span("Grade: B", &["grade"], &[]), "B");
    }

    #[test]
    fn rows_skip_separator_and_echo() {
        let span = "| Competitor | Strength |\n|---|---|\n| Acme | Fast |\nprose line";
        let rows = delimited_rows(span, "|", 2, 2, &["competitor"]);
        assert_eq!(rows, vec![vec!["Acme".to_string(), "Fast".to_string()]]);
    }

    #[test]
    fn rows_pad_missing_trailing_cells() {
        let rows = delimited_rows("Acme | Fast | Pricey", "|", 3, 4, &[]);
        assert_eq!(rows[0], vec!["Acme", "Fast", "Pricey", ""]);
    }

    #[test]
    fn rows_keep_empty_middle_cells_in_place() {
        let rows = delimited_rows("Acme | | Pricey | SMB", "|", 3, 4, &[]);
        assert_eq!(rows[0], vec!["Acme", "", "Pricey", "SMB"]);
    }

    #[test]
    fn rows_require_first_cell() {
        assert!(delimited_rows("| | Fast | Pricey |", "|", 3, 4, &[]).is_empty());
    }

    #[test]
    fn cascade_takes_first_hit() {
        fn none(_: &str) -> Vec<u8> {
            Vec::new()
        }
        fn some(s: &str) -> Vec<u8> {
            vec![s.len() as u8]
        }
        let tiers = [Tier { name: "none", run: none }, Tier { name: "some", run: some }];
        assert_eq!(cascade("abc", &tiers), vec![3]);
        assert_eq!(cascade("abc", &tiers[..1]), Vec::<u8>::new());
    }

    #[test]
    fn clip_marks_truncation() {
        assert_eq!(clip("abcdef", 3), "abc...");
        assert_eq!(clip("abc", 3), "abc");
    }
}
