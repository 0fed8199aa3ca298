pub mod extract;
pub mod sanitize;
pub mod sections;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use extract::personas::extract_personas;
use extract::products::extract_products;
use extract::ExtractedRecord;
use sections::{segment, Section};

/// Floor for the product list when the caller has no better name.
pub const PRODUCTS_FALLBACK: &str = "Core offering";

const PERSONA_SECTIONS: &[&str] = &["JOBS TO BE DONE", "PERSONA"];

/// The kinds of model output the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentShape {
    Positioning,
    Icp,
    Personas,
    Competitive,
    Content,
    Products,
}

impl DocumentShape {
    pub const ALL: [DocumentShape; 6] = [
        DocumentShape::Positioning,
        DocumentShape::Icp,
        DocumentShape::Personas,
        DocumentShape::Competitive,
        DocumentShape::Content,
        DocumentShape::Products,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentShape::Positioning => "positioning",
            DocumentShape::Icp => "icp",
            DocumentShape::Personas => "personas",
            DocumentShape::Competitive => "competitive",
            DocumentShape::Content => "content",
            DocumentShape::Products => "products",
        }
    }

    /// Shapes whose output carries pipe tables.
    pub fn is_tabular(self) -> bool {
        matches!(self, DocumentShape::Icp | DocumentShape::Competitive)
    }
}

impl fmt::Display for DocumentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentShape::ALL
            .into_iter()
            .find(|shape| shape.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown document shape: {s}"))
    }
}

/// Raw model text -> sanitize -> extract, for one document shape. Product
/// lists skip the sanitizer: rejoining would merge one-word list items.
pub fn process_response(shape: DocumentShape, raw: &str) -> ExtractedRecord {
    let clean = || {
        let text = if shape.is_tabular() {
            sanitize::sanitize_tabular(raw)
        } else {
            sanitize::sanitize(raw)
        };
        debug!(shape = shape.as_str(), raw_len = raw.len(), clean_len = text.len(), "sanitized response");
        text
    };

    match shape {
        DocumentShape::Positioning => ExtractedRecord::Positioning(extract::positioning::extract(&clean())),
        DocumentShape::Icp => ExtractedRecord::Icp(extract::icp::extract(&clean())),
        DocumentShape::Personas => ExtractedRecord::Personas(extract_personas(&persona_lines(&segment(&clean())))),
        DocumentShape::Competitive => ExtractedRecord::Competitive(extract::competitive::extract(&clean())),
        DocumentShape::Content => ExtractedRecord::Content(extract::content::extract(&clean())),
        DocumentShape::Products => ExtractedRecord::Products(extract_products(raw, PRODUCTS_FALLBACK)),
    }
}

/// Content lines from the persona section onward, or from every section when
/// there is none. `PERSONA: CFO` reads as a header, so such titles are put back.
fn persona_lines(sections: &[Section]) -> Vec<String> {
    let start = sections
        .iter()
        .position(|s| {
            let title = s.title.to_uppercase();
            PERSONA_SECTIONS.iter().any(|n| title.contains(n))
        })
        .unwrap_or(0);

    let mut lines = Vec::new();
    for section in &sections[start..] {
        if section.title.contains(':') {
            lines.push(section.title.clone());
        }
        lines.extend(section.content.iter().cloned());
    }
    lines
}

// ── Tests ──
