use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{cascade, clip, squash_ws, take_chars, Tier};

static PERSONA_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)persona:").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)persona:\s*(.*?)\s*(?:goal:|jtbd:|$)").unwrap());
static TITLE_STOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:signal|behavioral|technographic|intent|contextual|blind)|---").unwrap()
});
static GOAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)goal:\s*(.*?)\s*(?:jtbd:|signal|$)").unwrap());
static JTBD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)jtbd:\s*(.*)$").unwrap());
static JTBD_STOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)persona:|signal\s*system|behavioral\s*signal|technographic|intent\s*signal|contextual|blind\s*spot|---",
    )
    .unwrap()
});
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*(.+)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[•\-*]\s+(.+)$").unwrap());
static TITLE_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+[-–—]\s+|:\s+").unwrap());

pub const TITLE_MAX: usize = 100;
pub const GOAL_MAX: usize = 200;
pub const JTBD_MAX: usize = 400;
/// A sentence cut shorter than this falls back to a hard cut.
const JTBD_MIN_SENTENCE_CUT: usize = 200;
const LIST_FALLBACK_CAP: usize = 4;
pub const PLACEHOLDER_TITLE: &str = "Key Buyer Persona";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Persona {
    pub title: String,
    pub goal: String,
    pub jtbd: String,
}

/// Extract persona cards from section content lines. Always returns at least
/// one persona; the last resort is a placeholder carrying the raw text.
pub fn extract_personas(content: &[String]) -> Vec<Persona> {
    let tiers: [Tier<[String], Vec<Persona>>; 3] = [
        Tier { name: "persona_blocks", run: |c| parse_persona_blocks(&c.join(" ")) },
        Tier { name: "numbered_list", run: numbered_list },
        Tier { name: "bullet_list", run: bullet_list },
    ];
    let personas = cascade(content, &tiers);
    if !personas.is_empty() {
        return personas;
    }
    vec![Persona {
        title: PLACEHOLDER_TITLE.to_string(),
        goal: take_chars(&content.join(" "), GOAL_MAX),
        jtbd: String::new(),
    }]
}

/// `PERSONA: ... GOAL: ... JTBD: ...` blocks. Titles of two chars or fewer
/// are dropped as noise.
pub fn parse_persona_blocks(text: &str) -> Vec<Persona> {
    let starts: Vec<usize> = PERSONA_MARK_RE.find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[s..end]
        })
        .map(parse_block)
        .filter(|p| p.title.chars().count() > 2)
        .collect()
}

fn parse_block(chunk: &str) -> Persona {
    let title = TITLE_RE
        .captures(chunk)
        .map(|c| {
            let t = squash_ws(&c[1]);
            let cut = TITLE_STOP_RE.find(&t).map(|m| m.start()).unwrap_or(t.len());
            take_chars(t[..cut].trim(), TITLE_MAX)
        })
        .unwrap_or_default();

    let goal = GOAL_RE
        .captures(chunk)
        .map(|c| clip(&squash_ws(&c[1]), GOAL_MAX))
        .unwrap_or_default();

    let jtbd = JTBD_RE
        .captures(chunk)
        .map(|c| {
            let raw = &c[1];
            let cut = JTBD_STOP_RE.find(raw).map(|m| m.start()).unwrap_or(raw.len());
            cap_job_statement(&squash_ws(&raw[..cut]))
        })
        .unwrap_or_default();

    Persona { title, goal, jtbd }
}

/// Keep whole sentences when a period falls late enough, else hard-cut.
fn cap_job_statement(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= JTBD_MAX {
        return s.to_string();
    }
    let last_period = chars[..=JTBD_MAX].iter().rposition(|&c| c == '.');
    match last_period {
        Some(p) if p > JTBD_MIN_SENTENCE_CUT => chars[..=p].iter().collect(),
        _ => clip(s, JTBD_MAX),
    }
}

fn numbered_list(content: &[String]) -> Vec<Persona> {
    list_items(content, &NUMBERED_RE, 2)
}

fn bullet_list(content: &[String]) -> Vec<Persona> {
    let mut lines: Vec<String> = Vec::new();
    for line in content {
        if line.contains('•') {
            lines.extend(line.split('•').map(|p| format!("• {}", p.trim())));
        } else {
            lines.push(line.clone());
        }
    }
    list_items(&lines, &BULLET_RE, 5)
}

fn list_items(lines: &[String], marker: &Regex, min_len: usize) -> Vec<Persona> {
    lines
        .iter()
        .filter_map(|l| marker.captures(l).map(|c| c[1].trim().to_string()))
        .filter(|item| item.chars().count() > min_len)
        .map(|item| {
            let mut parts = TITLE_SPLIT_RE.splitn(&item, 2);
            let title = parts.next().unwrap_or_default().trim();
            let goal = parts.next().unwrap_or_default().trim();
            Persona {
                title: take_chars(title, TITLE_MAX),
                goal: clip(goal, GOAL_MAX),
                jtbd: String::new(),
            }
        })
        .filter(|p| p.title.chars().count() > 2)
        .take(LIST_FALLBACK_CAP)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn primary_blocks() {
        let content = lines(
            "PERSONA: VP of Revenue Operations\nGOAL: Forecast accurately\nJTBD: When the quarter closes, I want clean data, so I can report.\nPERSONA: Head of Sales\nJTBD: When reps churn, I want ramp playbooks, so I can hit quota.",
        );
        let personas = extract_personas(&content);
        assert_eq!(personas.len(), 2);
        assert_eq!(personas[0].title, "VP of Revenue Operations");
        assert_eq!(personas[0].goal, "Forecast accurately");
        assert_eq!(
            personas[0].jtbd,
            "When the quarter closes, I want clean data, so I can report."
        );
        assert_eq!(personas[1].title, "Head of Sales");
        assert_eq!(personas[1].goal, "");
    }

    #[test]
    fn title_stops_at_signal_vocabulary() {
        let p = parse_persona_blocks("PERSONA: Controller SIGNAL SYSTEM follows");
        assert_eq!(p[0].title, "Controller");
    }

    #[test]
    fn jtbd_stops_at_next_section() {
        let p = parse_persona_blocks("PERSONA: CFO JTBD: When audits loom, I want proof. SIGNAL SYSTEM rows");
        assert_eq!(p[0].jtbd, "When audits loom, I want proof.");
    }

    #[test]
    fn noise_titles_dropped() {
        assert!(parse_persona_blocks("PERSONA: X JTBD: something").is_empty());
    }

    #[test]
    fn long_goal_gets_ellipsis() {
        let goal = "g".repeat(250);
        let p = parse_persona_blocks(&format!("PERSONA: Buyer GOAL: {goal}"));
        assert_eq!(p[0].goal.chars().count(), GOAL_MAX + 3);
        assert!(p[0].goal.ends_with("..."));
    }

    #[test]
    fn long_jtbd_cut_at_sentence() {
        let first = format!("{}.", "a".repeat(300));
        let jtbd = format!("{first} {}", "b".repeat(200));
        let p = parse_persona_blocks(&format!("PERSONA: Buyer JTBD: {jtbd}"));
        assert_eq!(p[0].jtbd, first);
    }

    #[test]
    fn long_jtbd_period_at_limit_is_kept() {
        let first = format!("{}.", "a".repeat(JTBD_MAX));
        let jtbd = format!("{first} {}", "b".repeat(50));
        let p = parse_persona_blocks(&format!("PERSONA: Buyer JTBD: {jtbd}"));
        assert_eq!(p[0].jtbd, first);
    }

    #[test]
    fn long_jtbd_without_late_period_is_hard_cut() {
        let jtbd = format!("short. {}", "c".repeat(500));
        let p = parse_persona_blocks(&format!("PERSONA: Buyer JTBD: {jtbd}"));
        assert_eq!(p[0].jtbd.chars().count(), JTBD_MAX + 3);
        assert!(p[0].jtbd.ends_with("..."));
    }

    #[test]
    fn numbered_fallback() {
        let content = lines("1. Finance Leader – owns the close\n2. IT Admin: keeps systems running\n3. QA");
        let personas = extract_personas(&content);
        assert_eq!(personas.len(), 2);
        assert_eq!(personas[0].title, "Finance Leader");
        assert_eq!(personas[0].goal, "owns the close");
        assert_eq!(personas[1].title, "IT Admin");
    }

    #[test]
    fn numbered_fallback_caps_at_four() {
        let content = lines("1. Alpha buyer\n2. Beta buyer\n3. Gamma buyer\n4. Delta buyer\n5. Epsilon buyer");
        assert_eq!(extract_personas(&content).len(), 4);
    }

    #[test]
    fn bullet_fallback() {
        let content = lines("Buyers include:\n- Procurement lead - signs the contract\n• Security reviewer • Data engineer");
        let personas = extract_personas(&content);
        assert_eq!(personas.len(), 3);
        assert_eq!(personas[0].title, "Procurement lead");
        assert_eq!(personas[0].goal, "signs the contract");
        assert_eq!(personas[1].title, "Security reviewer");
    }

    #[test]
    fn placeholder_floor() {
        let content = lines("Nothing structured here at all.");
        let personas = extract_personas(&content);
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].title, PLACEHOLDER_TITLE);
        assert_eq!(personas[0].goal, "Nothing structured here at all.");
    }

    #[test]
    fn placeholder_for_empty_input() {
        let personas = extract_personas(&[]);
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].goal, "");
    }

    proptest! {
        #[test]
        fn floor_and_bounds(content in proptest::collection::vec(
            "(PERSONA: |GOAL: |JTBD: |1\\. |- |• )?[A-Za-z .,–:]{0,300}", 0..8)
        ) {
            let personas = extract_personas(&content);
            prop_assert!(!personas.is_empty());
            for p in &personas {
                prop_assert!(p.title.chars().count() <= TITLE_MAX);
                prop_assert!(p.goal.chars().count() <= GOAL_MAX + 3);
                prop_assert!(p.jtbd.chars().count() <= JTBD_MAX + 3);
            }
        }
    }
}
