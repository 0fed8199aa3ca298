use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{anchored_span, cascade, squash_ws, Harvest, Tier};

/// A lower-case grade letter only counts when nothing but punctuation follows
/// it on the line, so `Grade: a strong start` is not an A.
static GRADE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?i:grade)\s*:\s*(?:([A-F][+-]?)(?:[^A-Za-z]|$)|([a-f][+-]?)[ \t]*(?:[.,;)]|$))").unwrap()
});
static LONE_GRADE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*([A-Fa-f][+-]?)\s*$").unwrap());
static RATIONALE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)rationale:\s*([^\n]+)").unwrap());
static BRACKETED_REC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*\[([^\]\n]*?(?i:impact))\]\s*").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").unwrap());
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

const FOOTPRINT: &[&str] = &["CONTENT FOOTPRINT"];
const ALIGNMENT: &[&str] = &["BUYER ALIGNMENT AUDIT"];
const SIGNAL_OPPORTUNITY: &[&str] = &["SIGNAL OPPORTUNITY ASSESSMENT"];
const GRADE: &[&str] = &["CONTENT GRADE"];
const RECOMMENDATIONS: &[&str] = &["PRIORITY RECOMMENDATIONS"];

const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriorityRecommendation {
    pub rank: u32,
    pub impact: String,
    pub title: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentAudit {
    pub content_footprint: String,
    pub buyer_alignment_audit: String,
    pub signal_opportunity_assessment: String,
    pub content_grade: String,
    pub content_grade_rationale: String,
    pub priority_recommendations: Vec<PriorityRecommendation>,
}

impl Harvest for ContentAudit {
    fn is_miss(&self) -> bool {
        self.content_footprint.is_empty()
            && self.buyer_alignment_audit.is_empty()
            && self.signal_opportunity_assessment.is_empty()
            && self.content_grade.is_empty()
            && self.content_grade_rationale.is_empty()
            && self.priority_recommendations.is_empty()
    }
}

fn vocabulary() -> Vec<&'static str> {
    [FOOTPRINT, ALIGNMENT, SIGNAL_OPPORTUNITY, GRADE, RECOMMENDATIONS].concat()
}

pub fn extract(text: &str) -> ContentAudit {
    let vocab = vocabulary();
    let grade_tiers: [Tier<str, String>; 2] = [
        Tier { name: "grade_label", run: grade_label },
        Tier { name: "lone_letter", run: |t| lone_grade(&grade_span(t)) },
    ];
    let rationale_tiers: [Tier<str, String>; 2] = [
        Tier { name: "rationale_label", run: rationale_label },
        Tier { name: "grade_span_rest", run: |t| grade_span_rest(&grade_span(t)) },
    ];
    let rec_tiers: [Tier<str, Vec<PriorityRecommendation>>; 2] = [
        Tier { name: "bracketed_impact", run: bracketed_recommendations },
        Tier { name: "numbered_lines", run: numbered_recommendations },
    ];

    let recs_span = anchored_span(text, RECOMMENDATIONS, &[]);
    ContentAudit {
        content_footprint: anchored_span(text, FOOTPRINT, &vocab),
        buyer_alignment_audit: anchored_span(text, ALIGNMENT, &vocab),
        signal_opportunity_assessment: anchored_span(text, SIGNAL_OPPORTUNITY, &vocab),
        content_grade: cascade(text, &grade_tiers),
        content_grade_rationale: cascade(text, &rationale_tiers),
        priority_recommendations: rank(cascade(recs_span.as_str(), &rec_tiers)),
    }
}

fn grade_span(text: &str) -> String {
    anchored_span(text, GRADE, &vocabulary())
}

fn grade_label(text: &str) -> String {
    GRADE_LABEL_RE
        .captures(text)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_uppercase())
        .unwrap_or_default()
}

fn lone_grade(span: &str) -> String {
    LONE_GRADE_RE
        .captures(span)
        .map(|c| c[1].to_uppercase())
        .unwrap_or_default()
}

fn rationale_label(text: &str) -> String {
    RATIONALE_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default()
}

/// Whatever prose in the grade span is not the grade itself.
fn grade_span_rest(span: &str) -> String {
    let rest: Vec<&str> = span
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !GRADE_LABEL_RE.is_match(l) && !LONE_GRADE_RE.is_match(l))
        .collect();
    squash_ws(&rest.join(" "))
}

/// `1. [HIGHEST IMPACT] Title` followed by an explanation.
fn bracketed_recommendations(span: &str) -> Vec<PriorityRecommendation> {
    let marks: Vec<(usize, usize, String)> = BRACKETED_REC_RE
        .captures_iter(span)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((whole.start(), whole.end(), c[1].trim().to_uppercase()))
        })
        .collect();

    marks
        .iter()
        .enumerate()
        .filter_map(|(i, (_, body_start, impact))| {
            let body_end = marks.get(i + 1).map(|m| m.0).unwrap_or(span.len());
            let (title, explanation) = split_title(&span[*body_start..body_end]);
            if title.is_empty() {
                return None;
            }
            Some(PriorityRecommendation {
                rank: 0,
                impact: impact.clone(),
                title,
                explanation,
            })
        })
        .collect()
}

/// Plain `1. Title` lines; following unnumbered lines are the explanation.
fn numbered_recommendations(span: &str) -> Vec<PriorityRecommendation> {
    let mut recs: Vec<PriorityRecommendation> = Vec::new();
    let mut explanation: Vec<String> = Vec::new();
    for line in span.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = NUMBERED_RE.captures(line) {
            if let Some(prev) = recs.last_mut() {
                prev.explanation = squash_ws(&explanation.join(" "));
            }
            explanation.clear();
            let (title, inline) = split_title(&caps[1]);
            explanation.extend((!inline.is_empty()).then_some(inline));
            recs.push(PriorityRecommendation {
                title,
                ..Default::default()
            });
        } else if !recs.is_empty() {
            explanation.push(line.to_string());
        }
    }
    if let Some(prev) = recs.last_mut() {
        prev.explanation = squash_ws(&explanation.join(" "));
    }
    recs.retain(|r| !r.title.is_empty());
    recs
}

/// Title is the first line; when the sanitizer joined title and explanation
/// onto one line the title is the first sentence instead.
fn split_title(body: &str) -> (String, String) {
    let body = body.trim();
    if let Some((first, rest)) = body.split_once('\n') {
        return (first.trim().trim_end_matches('.').to_string(), squash_ws(rest));
    }
    match SENTENCE_END_RE.find(body) {
        Some(m) => (
            body[..m.start()].trim().to_string(),
            squash_ws(&body[m.end()..]),
        ),
        None => (body.trim_end_matches('.').to_string(), String::new()),
    }
}

fn rank(recs: Vec<PriorityRecommendation>) -> Vec<PriorityRecommendation> {
    recs.into_iter()
        .take(MAX_RECOMMENDATIONS)
        .enumerate()
        .map(|(i, r)| PriorityRecommendation {
            rank: i as u32 + 1,
            ..r
        })
        .collect()
}

// ── Tests ──
