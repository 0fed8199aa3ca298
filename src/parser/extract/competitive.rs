use serde::{Deserialize, Serialize};

use super::{anchored_span, cascade, delimited_rows, Harvest, Tier};

const LANDSCAPE: &[&str] = &["COMPETITIVE LANDSCAPE"];
const COMPARISON: &[&str] = &["COMPETITOR COMPARISON"];
const GAPS: &[&str] = &["COMPETITIVE GAPS"];
const DEFENSIBILITY: &[&str] = &["DEFENSIBILITY ASSESSMENT"];

const COLUMNS: usize = 4;
const PIPE_MIN_CELLS: usize = 3;
const HEADER_ECHO: &[&str] = &["competitor"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetitorComparison {
    #[serde(alias = "name")]
    pub competitor: String,
    pub primary_strength: String,
    pub primary_weakness: String,
    pub battleground: String,
}

impl CompetitorComparison {
    fn from_cells(cells: Vec<String>) -> Self {
        let mut it = cells.into_iter();
        CompetitorComparison {
            competitor: it.next().unwrap_or_default(),
            primary_strength: it.next().unwrap_or_default(),
            primary_weakness: it.next().unwrap_or_default(),
            battleground: it.next().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetitiveAnalysis {
    pub competitive_landscape: String,
    #[serde(alias = "competitors")]
    pub competitor_comparison: Vec<CompetitorComparison>,
    pub competitive_gaps: String,
    pub defensibility_assessment: String,
}

impl Harvest for CompetitiveAnalysis {
    fn is_miss(&self) -> bool {
        self.competitive_landscape.is_empty()
            && self.competitor_comparison.is_empty()
            && self.competitive_gaps.is_empty()
            && self.defensibility_assessment.is_empty()
    }
}

fn vocabulary() -> Vec<&'static str> {
    [LANDSCAPE, COMPARISON, GAPS, DEFENSIBILITY].concat()
}

pub fn extract(text: &str) -> CompetitiveAnalysis {
    let vocab = vocabulary();
    let tiers: [Tier<str, Vec<CompetitorComparison>>; 3] = [
        Tier { name: "comparison_pipe_rows", run: |t| pipe_rows(&comparison_span(t)) },
        Tier { name: "any_pipe_rows", run: pipe_rows },
        Tier { name: "comparison_dash_rows", run: |t| dash_rows(&comparison_span(t)) },
    ];

    CompetitiveAnalysis {
        competitive_landscape: anchored_span(text, LANDSCAPE, &vocab),
        competitor_comparison: cascade(text, &tiers),
        competitive_gaps: anchored_span(text, GAPS, &vocab),
        defensibility_assessment: anchored_span(text, DEFENSIBILITY, &[]),
    }
}

fn comparison_span(text: &str) -> String {
    anchored_span(text, COMPARISON, &vocabulary())
}

fn pipe_rows(span: &str) -> Vec<CompetitorComparison> {
    delimited_rows(span, "|", PIPE_MIN_CELLS, COLUMNS, HEADER_ECHO)
        .into_iter()
        .map(CompetitorComparison::from_cells)
        .collect()
}

fn dash_rows(span: &str) -> Vec<CompetitorComparison> {
    let normalized = span.replace(" – ", " - ").replace(" — ", " - ");
    delimited_rows(&normalized, " - ", COLUMNS, COLUMNS, HEADER_ECHO)
        .into_iter()
        .map(CompetitorComparison::from_cells)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sanitize::sanitize_tabular;

    #[test]
    fn comparison_table_three_rows() {
        let text = "COMPETITOR COMPARISON\n| Competitor | Primary Strength | Primary Weakness | Battleground |\n|---|---|---|---|\n| Bill.com | Brand | Clunky UI | SMB AP |\n| Tipalti | Global payouts | Price | Mid-market |\n| Ramp | Cards | Shallow AP | Startups |";
        let c = extract(text);
        assert_eq!(c.competitor_comparison.len(), 3);
        assert_eq!(c.competitor_comparison[0].competitor, "Bill.com");
        assert_eq!(c.competitor_comparison[2].battleground, "Startups");
        assert!(c.competitor_comparison.iter().all(|r| !r.competitor.starts_with("---")));
    }

    #[test]
    fn same_table_after_tabular_sanitize() {
        let text = "COMPETITOR COMPARISON\n| Competitor | Primary Strength | Primary Weakness | Battleground |\n|---|---|---|---|\n| Bill.com | Brand | Clunky UI | SMB AP |\n| Tipalti | Global payouts | Price | Mid-market |\n| Ramp | Cards | Shallow AP | Startups |";
        let c = extract(&sanitize_tabular(text));
        assert_eq!(c.competitor_comparison.len(), 3);
        assert_eq!(c.competitor_comparison[1].primary_strength, "Global payouts");
    }

    #[test]
    fn prose_spans() {
        let text = "COMPETITIVE LANDSCAPE\nCrowded.\nCOMPETITOR COMPARISON\nAcme | Fast | Pricey | SMB\nCOMPETITIVE GAPS\nNo one owns audit trails.\nDEFENSIBILITY ASSESSMENT\nModerate.";
        let c = extract(text);
        assert_eq!(c.competitive_landscape, "Crowded.");
        assert_eq!(c.competitive_gaps, "No one owns audit trails.");
        assert_eq!(c.defensibility_assessment, "Moderate.");
        assert_eq!(c.competitor_comparison.len(), 1);
    }

    #[test]
    fn defensibility_keeps_prose_mentioning_headers() {
        let text = "COMPETITIVE GAPS\nNo one owns audit trails.\nDEFENSIBILITY ASSESSMENT\nModerate: the competitive landscape shifts fast, and competitive gaps close within a year.";
        let c = extract(text);
        assert_eq!(c.competitive_gaps, "No one owns audit trails.");
        assert_eq!(
            c.defensibility_assessment,
            "Moderate: the competitive landscape shifts fast, and competitive gaps close within a year."
        );
    }

    #[test]
    fn short_row_padded() {
        let c = extract("COMPETITOR COMPARISON\nAcme | Fast | Pricey");
        assert_eq!(c.competitor_comparison[0].battleground, "");
    }

    #[test]
    fn rows_without_header_are_found() {
        let c = extract("Here are the rivals:\nAcme | Fast | Pricey | SMB");
        assert_eq!(c.competitor_comparison.len(), 1);
    }

    #[test]
    fn dash_rows_fallback() {
        let c = extract("COMPETITOR COMPARISON\nAcme – Fast – Pricey – SMB\nCOMPETITIVE GAPS\nNone.");
        assert_eq!(c.competitor_comparison.len(), 1);
        assert_eq!(c.competitor_comparison[0].primary_weakness, "Pricey");
    }

    #[test]
    fn nothing_found() {
        let c = extract("Just prose about the market.");
        assert!(c.is_miss());
    }

    #[test]
    fn competitive_fixture() {
        let raw = std::fs::read_to_string("tests/fixtures/competitive.txt").unwrap();
        let c = extract(&sanitize_tabular(&raw));
        assert_eq!(c.competitor_comparison.len(), 4);
        assert!(!c.competitive_landscape.is_empty());
        assert!(!c.competitive_gaps.is_empty());
        assert!(!c.defensibility_assessment.is_empty());
    }
}
