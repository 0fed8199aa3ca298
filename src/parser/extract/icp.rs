use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::personas::parse_persona_blocks;
use super::{anchored_span, cascade, parse_row, Harvest, Tier};

static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([A-Z][A-Z\s]*?)\s*SIGNALS?$").unwrap());
static LEADING_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*•]\s+").unwrap());

const JOBS: &[&str] = &["JOBS TO BE DONE"];
const SIGNAL_SYSTEM: &[&str] = &["SIGNAL SYSTEM"];
const BLIND_SPOT: &[&str] = &["SIGNAL BLIND SPOT"];
const SIGNAL_COLUMNS: usize = 3;
/// Pipe rows may drop an empty trailing cell; dash rows are looser and need all three.
const PIPE_MIN_CELLS: usize = 2;
const SIGNAL_HEADER_ECHO: &[&str] = &["signal name"];
const DEFAULT_CATEGORY: &str = "General";
const TOP_SIGNALS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JtbdEntry {
    pub persona: String,
    pub jtbd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignalEntry {
    pub category: String,
    pub signal_name: String,
    pub what_to_detect: String,
    pub recommended_motion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IcpResearch {
    #[serde(alias = "jobsToBeDone")]
    pub jtbd_list: Vec<JtbdEntry>,
    pub signal_system: Vec<SignalEntry>,
    pub signal_blind_spot: String,
}

impl IcpResearch {
    /// Signal names in table order.
    pub fn signal_summary(&self) -> Vec<String> {
        self.signal_system.iter().map(|s| s.signal_name.clone()).collect()
    }

    pub fn top_signals(&self) -> &[SignalEntry] {
        &self.signal_system[..self.signal_system.len().min(TOP_SIGNALS)]
    }
}

impl Harvest for IcpResearch {
    fn is_miss(&self) -> bool {
        self.jtbd_list.is_empty() && self.signal_system.is_empty() && self.signal_blind_spot.is_empty()
    }
}

pub fn extract(text: &str) -> IcpResearch {
    let jtbd_tiers: [Tier<str, Vec<JtbdEntry>>; 2] = [
        Tier { name: "jobs_span", run: |t| jtbd_entries(&anchored_span(t, JOBS, &[SIGNAL_SYSTEM, BLIND_SPOT].concat())) },
        Tier { name: "whole_text", run: jtbd_entries },
    ];
    let signal_tiers: [Tier<str, Vec<SignalEntry>>; 2] = [
        Tier { name: "pipe_rows", run: |t| signal_rows(&signal_span(t), "|", PIPE_MIN_CELLS) },
        Tier { name: "dash_rows", run: |t| signal_rows(&dashes_to_hyphen(&signal_span(t)), " - ", SIGNAL_COLUMNS) },
    ];

    IcpResearch {
        jtbd_list: cascade(text, &jtbd_tiers),
        signal_system: cascade(text, &signal_tiers),
        signal_blind_spot: anchored_span(text, BLIND_SPOT, &[]),
    }
}

fn jtbd_entries(span: &str) -> Vec<JtbdEntry> {
    parse_persona_blocks(span)
        .into_iter()
        .filter(|p| !p.jtbd.is_empty())
        .map(|p| JtbdEntry {
            persona: p.title,
            jtbd: p.jtbd,
        })
        .collect()
}

fn signal_span(text: &str) -> String {
    anchored_span(text, SIGNAL_SYSTEM, BLIND_SPOT)
}

fn dashes_to_hyphen(span: &str) -> String {
    span.lines()
        .map(|l| LEADING_BULLET_RE.replace(l, "").replace(" – ", " - ").replace(" — ", " - "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows grouped under the most recent `... SIGNALS` category line.
fn signal_rows(span: &str, delimiter: &str, min_cells: usize) -> Vec<SignalEntry> {
    let mut category = String::new();
    let mut rows = Vec::new();
    for line in span.lines() {
        let line = line.trim();
        if let Some(caps) = CATEGORY_RE.captures(line) {
            category = caps[1].trim().to_string();
            continue;
        }
        let Some(cells) = parse_row(line, delimiter, min_cells, SIGNAL_COLUMNS, SIGNAL_HEADER_ECHO) else {
            continue;
        };
        rows.push(SignalEntry {
            category: if category.is_empty() { DEFAULT_CATEGORY.to_string() } else { category.clone() },
            signal_name: cells[0].clone(),
            what_to_detect: cells[1].clone(),
            recommended_motion: cells[2].clone(),
        });
    }
    rows
}

// ── Tests ──
