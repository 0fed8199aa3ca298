use serde::{Deserialize, Serialize};

use super::{anchored_span, cascade, clip, Harvest, Tier};
use crate::parser::sections::{find_section, segment, Section};

const WHAT_YOU_DO: &[&str] = &["WHAT YOU DO"];
const PAIN: &[&str] = &["THE PAIN YOU ADDRESS", "THE PROBLEM YOU SOLVE"];
const HOW_POSITIONED: &[&str] = &["HOW YOU'RE POSITIONED", "HOW YOU ARE POSITIONED", "YOUR DIFFERENTIATION"];
const OBSERVATION: &[&str] = &["POSITIONING OBSERVATION"];

const SUMMARY_FALLBACK_CHARS: usize = 300;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyAnalysis {
    pub positioning_summary: String,
    pub pain_addressed: String,
    pub positioning_observation: String,
}

impl Harvest for CompanyAnalysis {
    fn is_miss(&self) -> bool {
        self.positioning_summary.is_empty()
            && self.pain_addressed.is_empty()
            && self.positioning_observation.is_empty()
    }
}

fn vocabulary() -> Vec<&'static str> {
    [WHAT_YOU_DO, PAIN, HOW_POSITIONED, OBSERVATION].concat()
}

pub fn extract(text: &str) -> CompanyAnalysis {
    let tiers: [Tier<str, CompanyAnalysis>; 3] = [
        Tier { name: "anchored_headers", run: anchored },
        Tier { name: "section_titles", run: by_section_title },
        Tier { name: "first_section", run: first_section },
    ];
    cascade(text, &tiers)
}

fn anchored(text: &str) -> CompanyAnalysis {
    let vocab = vocabulary();
    let what = anchored_span(text, WHAT_YOU_DO, &vocab);
    let how = anchored_span(text, HOW_POSITIONED, &vocab);
    CompanyAnalysis {
        positioning_summary: join_nonempty(&[what, how]),
        pain_addressed: anchored_span(text, PAIN, &vocab),
        positioning_observation: anchored_span(text, OBSERVATION, &[]),
    }
}

/// The model sometimes invents its own headers; match them by keyword.
fn by_section_title(text: &str) -> CompanyAnalysis {
    let sections = segment(text);
    let text_of = |needles: &[&str], exclude: &str| -> String {
        let filtered: Vec<Section> = sections
            .iter()
            .filter(|s| exclude.is_empty() || !s.title.contains(exclude))
            .cloned()
            .collect();
        find_section(&filtered, needles).map(Section::text).unwrap_or_default()
    };
    let what = text_of(&["WHAT", "OVERVIEW", "SUMMARY"], "");
    let how = text_of(&["POSITION", "DIFFERENTIAT"], "OBSERVATION");
    CompanyAnalysis {
        positioning_summary: join_nonempty(&[what, how]),
        pain_addressed: text_of(&["PAIN", "PROBLEM", "CHALLENGE"], ""),
        positioning_observation: text_of(&["OBSERVATION"], ""),
    }
}

fn first_section(text: &str) -> CompanyAnalysis {
    if text.trim().is_empty() {
        return CompanyAnalysis::default();
    }
    let summary = segment(text)
        .iter()
        .find(|s| !s.content.is_empty())
        .map(|s| clip(&s.text(), SUMMARY_FALLBACK_CHARS))
        .unwrap_or_default();
    CompanyAnalysis {
        positioning_summary: summary,
        ..Default::default()
    }
}

fn join_nonempty(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──
