use std::sync::LazyLock;

use regex::Regex;

use super::{cascade, Tier};
use crate::parser::sanitize::strip_markdown;

static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s*(.+)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*[•\-*]\s*(.+)$").unwrap());
static LIST_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s*|^[•\-*]\s*").unwrap());

const MAX_PRODUCTS: usize = 8;
const MAX_NAME_CHARS: usize = 100;

/// Product or offering names from a short list answer. Falls back to
/// `[fallback]` (usually the domain) when nothing usable is found.
pub fn extract_products(text: &str, fallback: &str) -> Vec<String> {
    let tiers: [Tier<str, Vec<String>>; 3] = [
        Tier { name: "numbered", run: |t| marked_items(t, &NUMBERED_RE) },
        Tier { name: "bullets", run: |t| marked_items(t, &BULLET_RE) },
        Tier { name: "bare_lines", run: bare_lines },
    ];
    let mut products = cascade(text, &tiers);
    if products.is_empty() {
        return vec![fallback.to_string()];
    }
    products.truncate(MAX_PRODUCTS);
    products
}

fn marked_items(text: &str, marker: &Regex) -> Vec<String> {
    marker
        .captures_iter(text)
        .map(|c| strip_markdown(c[1].trim()))
        .filter(|name| !name.is_empty() && name.chars().count() < MAX_NAME_CHARS)
        .collect()
}

/// Unmarked lines, minus chatter that mentions "product" or "here".
fn bare_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| strip_markdown(LIST_MARK_RE.replace(l.trim(), "").trim()))
        .filter(|name| {
            let n = name.chars().count();
            let lower = name.to_lowercase();
            n > 2 && n < MAX_NAME_CHARS && !lower.contains("product") && !lower.contains("here")
        })
        .collect()
}

// ── Tests ──
