use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z\s\-:]+$").unwrap());

/// Lines past this point are ignored.
const MAX_LINES: usize = 200;
const HEADER_MIN_CHARS: usize = 2;
const HEADER_MAX_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: Vec<String>,
}

impl Section {
    fn untitled() -> Self {
        Section {
            title: String::new(),
            content: Vec::new(),
        }
    }

    fn is_open(&self) -> bool {
        !self.title.is_empty() || !self.content.is_empty()
    }

    /// Content lines joined with single spaces.
    pub fn text(&self) -> String {
        self.content.join(" ")
    }
}

/// Heuristic: a short line made only of capitals, spaces, hyphens and colons
/// is a header. Short all-caps content lines are misread as headers.
pub fn is_header(line: &str) -> bool {
    let n = line.chars().count();
    (HEADER_MIN_CHARS..HEADER_MAX_CHARS).contains(&n) && HEADER_RE.is_match(line)
}

/// Split sanitized text into titled sections. Never returns an empty Vec.
pub fn segment(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section::untitled();

    for line in text.lines().take(MAX_LINES) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_header(line) {
            if current.is_open() {
                sections.push(current);
            }
            current = Section {
                title: line.trim_end_matches(':').trim_end().to_string(),
                content: Vec::new(),
            };
        } else {
            current.content.push(line.to_string());
        }
    }

    if current.is_open() {
        sections.push(current);
    }

    if sections.is_empty() {
        return vec![Section {
            title: String::new(),
            content: vec!["No data".to_string()],
        }];
    }
    sections
}

/// First section whose title contains any of `needles` (case-insensitive).
pub fn find_section<'a>(sections: &'a [Section], needles: &[&str]) -> Option<&'a Section> {
    sections.iter().find(|s| {
        let title = s.title.to_uppercase();
        needles.iter().any(|n| title.contains(&n.to_uppercase()))
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sanitize::sanitize;
    use proptest::prelude::*;

    fn titles(text: &str) -> Vec<String> {
        segment(text).into_iter().map(|s| s.title).collect()
    }

    #[test]
    fn empty_input_yields_placeholder() {
        let sections = segment("");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "");
        assert_eq!(sections[0].content, vec!["No data".to_string()]);
    }

    #[test]
    fn blank_input_yields_placeholder() {
        assert_eq!(segment("\n   \n\n")[0].content, vec!["No data".to_string()]);
    }

    #[test]
    fn content_before_first_header_is_untitled() {
        let sections = segment("Intro line\nWHAT YOU DO\nShips invoices.");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "");
        assert_eq!(sections[0].content, vec!["Intro line".to_string()]);
        assert_eq!(sections[1].title, "WHAT YOU DO");
    }

    #[test]
    fn trailing_colon_stripped() {
        assert_eq!(titles("POSITIONING OBSERVATION:\nYou blend in."), vec!["POSITIONING OBSERVATION"]);
    }

    #[test]
    fn consecutive_headers_keep_empty_section() {
        let sections = segment("SIGNAL SYSTEM\nBEHAVIORAL SIGNALS\nDemo request | Pricing visit | Warm Outreach");
        assert_eq!(sections.len(), 2);
        assert!(sections[0].content.is_empty());
        assert_eq!(sections[1].content.len(), 1);
    }

    #[test]
    fn preserves_line_order() {
        let sections = segment("WHAT YOU DO\nfirst\nsecond\n\nthird");
        assert_eq!(sections[0].content, vec!["first", "second", "third"]);
    }

    #[test]
    fn header_length_bounds() {
        assert!(!is_header("A"));
        assert!(is_header("AB"));
        assert!(!is_header(&"A".repeat(60)));
        assert!(is_header(&"A".repeat(59)));
        assert!(!is_header("What you do"));
        assert!(!is_header("HOW YOU'RE POSITIONED"));
    }

    // Known false positive: short all-caps content reads as a header.
    #[test]
    fn acronym_line_is_misread_as_header() {
        let sections = segment("WHAT YOU DO\nCRM AND ERP SYNC FOR SMB\nReal sentence.");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "CRM AND ERP SYNC FOR SMB");
    }

    #[test]
    fn scan_is_capped() {
        let mut text = String::from("FIRST\n");
        for i in 0..250 {
            text.push_str(&format!("line {i}\n"));
        }
        text.push_str("LATE HEADER\nlate content");
        let sections = segment(&text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content.len(), 199);
    }

    #[test]
    fn find_section_by_keyword() {
        let sections = segment("JOBS TO BE DONE\nPERSONA: CFO\nSIGNAL BLIND SPOT\nHiring.");
        let s = find_section(&sections, &["blind spot"]).unwrap();
        assert_eq!(s.text(), "Hiring.");
    }

    #[test]
    fn competitive_fixture_sections() {
        let raw = std::fs::read_to_string("tests/fixtures/competitive.txt").unwrap();
        let titles = titles(&sanitize(&raw));
        assert!(titles.contains(&"COMPETITIVE LANDSCAPE".to_string()));
        assert!(titles.contains(&"COMPETITOR COMPARISON".to_string()));
        assert!(titles.contains(&"DEFENSIBILITY ASSESSMENT".to_string()));
    }

    proptest! {
        #[test]
        fn never_empty(text in "\\PC*") {
            prop_assert!(!segment(&text).is_empty());
        }

        #[test]
        fn never_empty_for_line_soup(lines in proptest::collection::vec("[A-Za-z :\\-]{0,12}", 0..20)) {
            prop_assert!(!segment(&lines.join("\n")).is_empty());
        }
    }
}
