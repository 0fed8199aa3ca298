use std::sync::LazyLock;

use regex::Regex;

use super::sections::is_header;

static PREAMBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:i'll|i will|let me|based on|here's|here is|after|now i'll)\b.*(?:research|search|analy[sz]e|create|provide|analysis)",
    )
    .unwrap()
});
static SEARCH_NARRATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)web search|my search|searching|searched").unwrap());
static TOPIC_ECHO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bICP\b.*\b(?:section|profile|for)\b.*:\s*$").unwrap());
static HEADER_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#{1,6}\s*").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static UNDERLINE_BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__([^_\n]+)__").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\s][^*\n]*)\*").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*•]\s+").unwrap());
static CAPS_LEAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][A-Z\s\-:]{3,}").unwrap());
static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static QUOTE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\n]+)"\s*([,.])"#).unwrap());
static CURLY_QUOTE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"“([^”\n]+)”\s*([,.])").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s\-:|]+$").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]*)`").unwrap());

/// A joined line can newly match a removal rule, so both sanitizers run to a
/// fixpoint. Every pass either shortens the text or removes a newline.
const MAX_PASSES: usize = 8;

/// Clean prose-style model output: drop preamble and narration lines, strip
/// markdown, rejoin wrapped sentences and repair quote punctuation.
pub fn sanitize(text: &str) -> String {
    to_fixpoint(text, sanitize_once)
}

/// Variant of [`sanitize`] for output carrying pipe-delimited tables. Table
/// rows keep their own lines and are never merged with prose.
pub fn sanitize_tabular(text: &str) -> String {
    to_fixpoint(text, sanitize_tabular_once)
}

/// Strip inline markdown from a short display string.
pub fn strip_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let out = BOLD_RE.replace_all(text, "$1");
    let out = ITALIC_RE.replace_all(&out, "$1");
    let out = CODE_RE.replace_all(&out, "$1");
    out.lines()
        .map(|l| HEADER_MARK_RE.replace(l, "").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn to_fixpoint(text: &str, pass: fn(&str) -> String) -> String {
    let mut current = pass(text);
    for _ in 1..MAX_PASSES {
        let next = pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn sanitize_once(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let normalized = normalize_breaks(text);

    let lines: Vec<String> = normalized
        .split('\n')
        .filter(|l| !is_noise_line(l))
        .map(|l| {
            let l = strip_header_mark(l);
            let l = unwrap_emphasis(&l);
            BULLET_RE.replace(&l, "").trim_end().to_string()
        })
        .collect();
    let trimmed = lines.join("\n").trim().to_string();

    let joined = join_wrapped_lines(&trimmed);
    let joined = join_continuations(&joined);
    let collapsed = BLANK_RUN_RE.replace_all(&joined, "\n\n");

    let repaired = QUOTE_PUNCT_RE.replace_all(&collapsed, "\"$1$2\"");
    let repaired = CURLY_QUOTE_PUNCT_RE.replace_all(&repaired, "“$1$2”");
    repaired.trim().to_string()
}

fn sanitize_tabular_once(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let normalized = normalize_breaks(text);
    let mut out: Vec<String> = Vec::new();

    for raw in normalized.split('\n') {
        if is_noise_line(raw) {
            continue;
        }
        let line = unwrap_emphasis(&strip_header_mark(raw));
        let line = line.trim();
        if line.is_empty() || SEPARATOR_RE.is_match(line) {
            continue;
        }
        let line = line.trim_start_matches('|').trim_end_matches('|').trim();
        let line = BULLET_RE.replace(line, "");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains('|') {
            let cells: Vec<&str> = line.split('|').map(str::trim).collect();
            out.push(cells.join(" | "));
        } else if is_header(line) {
            out.push(line.to_string());
        } else {
            match out.last_mut() {
                Some(prev) if !prev.contains('|') && !is_header(prev) => {
                    prev.push(' ');
                    prev.push_str(line);
                }
                _ => out.push(line.to_string()),
            }
        }
    }

    out.join("\n")
}

fn normalize_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Preamble, search narration and topic restatements are dropped whole so no
/// dangling fragment survives.
fn is_noise_line(line: &str) -> bool {
    PREAMBLE_RE.is_match(line) || SEARCH_NARRATION_RE.is_match(line) || TOPIC_ECHO_RE.is_match(line)
}

fn strip_header_mark(line: &str) -> String {
    HEADER_MARK_RE.replace(line, "").into_owned()
}

fn unwrap_emphasis(line: &str) -> String {
    let out = BOLD_RE.replace_all(line, "$1");
    let out = UNDERLINE_BOLD_RE.replace_all(&out, "$1");
    ITALIC_RE.replace_all(&out, "$1").into_owned()
}

/// A line ending mid-sentence (lowercase letter, comma or quote) absorbs the
/// next line unless that line opens with an all-caps run or a list number.
fn join_wrapped_lines(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let next = line.trim_start();
        match out.last_mut() {
            Some(prev) if ends_mid_sentence(prev) && !next.is_empty() && !opens_block(next) => {
                prev.push(' ');
                prev.push_str(next);
            }
            _ => out.push(line.to_string()),
        }
    }
    out.join("\n")
}

/// A line opening in lowercase (or with a clause-continuing mark) belongs to
/// the previous non-blank line, even across blank lines. This is where
/// wrapped conjunctions, prepositions and "is/are/was" clauses end up.
fn join_continuations(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut pending_blank = 0usize;
    for line in text.split('\n') {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            pending_blank += 1;
            continue;
        }
        let target = out.last_mut().filter(|prev| !is_header(prev.trim()));
        match target {
            Some(prev) if starts_as_continuation(trimmed) => {
                prev.push(' ');
                prev.push_str(trimmed);
            }
            _ => {
                if !out.is_empty() {
                    out.extend(std::iter::repeat(String::new()).take(pending_blank));
                }
                out.push(line.to_string());
            }
        }
        pending_blank = 0;
    }
    out.join("\n")
}

fn opens_block(line: &str) -> bool {
    CAPS_LEAD_RE.is_match(line) || LIST_ITEM_RE.is_match(line)
}

fn ends_mid_sentence(line: &str) -> bool {
    line.trim_end()
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_lowercase() || matches!(c, ',' | '"' | '\'' | '”' | '’'))
}

fn starts_as_continuation(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || matches!(c, ',' | ';' | ':' | '–' | '—'))
}

// ── Tests ──
