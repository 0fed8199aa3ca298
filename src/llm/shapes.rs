use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::structured::{StructuredClient, StructuredSchema};
use super::Transport;
use crate::error::StructuredError;
use crate::parser::extract::{
    CompanyAnalysis, CompetitiveAnalysis, ContentAudit, ExtractedRecord, IcpResearch, Persona,
};
use crate::parser::{DocumentShape, PRODUCTS_FALLBACK};

static GRADE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-F][+-]?$").unwrap());

const MAX_OFFERINGS: usize = 8;

/// A payload type the structured client can ask for: it carries the shape
/// description sent with the prompt and the predicate applied to the answer.
pub trait StructuredShape: DeserializeOwned + Clone + Default + Send + Sync + 'static {
    const SHAPE: &'static str;

    fn is_valid(&self) -> bool;

    fn schema() -> StructuredSchema<Self> {
        StructuredSchema::new().describe(Self::SHAPE).validate(Self::is_valid)
    }

    /// Same as [`schema`](Self::schema) but degrading to the empty value.
    fn lenient_schema() -> StructuredSchema<Self> {
        Self::schema().fallback(Self::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductExtraction {
    pub company_type: String,
    pub primary_offering: String,
    pub additional_offerings: Vec<String>,
}

impl ProductExtraction {
    /// Primary offering first, then the rest, without blanks or repeats.
    pub fn offerings(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in std::iter::once(&self.primary_offering).chain(&self.additional_offerings) {
            let name = name.trim();
            if !name.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(name)) {
                out.push(name.to_string());
            }
        }
        out.truncate(MAX_OFFERINGS);
        out
    }
}

impl StructuredShape for ProductExtraction {
    const SHAPE: &'static str =
        r#"{"companyType": string, "primaryOffering": string, "additionalOfferings": [string]}"#;

    fn is_valid(&self) -> bool {
        !self.primary_offering.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdealCompanyProfile {
    pub description: String,
    pub company_stage: String,
    pub company_size: String,
    pub industry_verticals: Vec<String>,
    pub key_characteristics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuyingCommitteeMember {
    pub role: String,
    /// Economic Buyer, Champion, Evaluator, End User or free text.
    #[serde(rename = "type")]
    pub member_type: String,
    pub pain_trigger: String,
    pub evaluation_priority: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IcpDiscovery {
    pub ideal_company_profile: IdealCompanyProfile,
    pub buying_committee: Vec<BuyingCommitteeMember>,
}

impl StructuredShape for IcpDiscovery {
    const SHAPE: &'static str = r#"{"idealCompanyProfile": {"description": string, "companyStage": string, "companySize": string, "industryVerticals": [string], "keyCharacteristics": [string]}, "buyingCommittee": [{"role": string, "type": "Economic Buyer" | "Champion" | "Evaluator" | "End User", "painTrigger": string, "evaluationPriority": string}]}"#;

    fn is_valid(&self) -> bool {
        !self.buying_committee.is_empty() && self.buying_committee.iter().all(|m| !m.role.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlphaSignal {
    pub name: String,
    pub why_alpha: String,
    pub source: String,
    pub detection: String,
    pub motion: String,
    pub example: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlphaSignals {
    pub signals: Vec<AlphaSignal>,
}

impl StructuredShape for AlphaSignals {
    const SHAPE: &'static str = r#"{"signals": [{"name": string, "whyAlpha": string, "source": string, "detection": string, "motion": string, "example": string}]}"#;

    fn is_valid(&self) -> bool {
        !self.signals.is_empty() && self.signals.iter().all(|s| !s.name.trim().is_empty())
    }
}

impl StructuredShape for CompanyAnalysis {
    const SHAPE: &'static str =
        r#"{"positioningSummary": string, "painAddressed": string, "positioningObservation": string}"#;

    fn is_valid(&self) -> bool {
        !self.positioning_summary.trim().is_empty()
    }
}

impl StructuredShape for IcpResearch {
    const SHAPE: &'static str = r#"{"jobsToBeDone": [{"persona": string, "jtbd": string}], "signalSystem": [{"category": string, "signalName": string, "whatToDetect": string, "recommendedMotion": string}], "signalBlindSpot": string}"#;

    fn is_valid(&self) -> bool {
        !self.jtbd_list.is_empty() || !self.signal_system.is_empty()
    }
}

impl StructuredShape for CompetitiveAnalysis {
    const SHAPE: &'static str = r#"{"competitiveLandscape": string, "competitors": [{"name": string, "primaryStrength": string, "primaryWeakness": string, "battleground": string}], "competitiveGaps": string, "defensibilityAssessment": string}"#;

    fn is_valid(&self) -> bool {
        !self.competitor_comparison.is_empty()
    }
}

impl StructuredShape for ContentAudit {
    const SHAPE: &'static str = r#"{"contentFootprint": string, "buyerAlignmentAudit": string, "signalOpportunityAssessment": string, "contentGrade": "A" | "B" | "C" | "D" | "F" (optionally with + or -), "contentGradeRationale": string, "priorityRecommendations": [{"rank": number, "impact": string, "title": string, "explanation": string}]}"#;

    /// The grade lands in a CRM field, so it must be a real letter grade.
    fn is_valid(&self) -> bool {
        GRADE_RE.is_match(&self.content_grade.trim().to_uppercase())
    }
}

impl StructuredShape for Vec<Persona> {
    const SHAPE: &'static str = r#"[{"title": string, "goal": string, "jtbd": string}]"#;

    fn is_valid(&self) -> bool {
        !self.is_empty() && self.iter().all(|p| !p.title.trim().is_empty())
    }
}

/// Schema-guided request for one document shape. `strict` drops the empty
/// fallback so failures surface as errors.
pub async fn request_record<Tr: Transport>(
    client: &StructuredClient<Tr>,
    shape: DocumentShape,
    prompt: &str,
    strict: bool,
) -> Result<ExtractedRecord, StructuredError> {
    Ok(match shape {
        DocumentShape::Positioning => ExtractedRecord::Positioning(ask(client, prompt, strict).await?),
        DocumentShape::Icp => ExtractedRecord::Icp(ask(client, prompt, strict).await?),
        DocumentShape::Personas => ExtractedRecord::Personas(ask(client, prompt, strict).await?),
        DocumentShape::Competitive => ExtractedRecord::Competitive(ask(client, prompt, strict).await?),
        DocumentShape::Content => ExtractedRecord::Content(normalize_grade(ask(client, prompt, strict).await?)),
        DocumentShape::Products => {
            let products: ProductExtraction = ask(client, prompt, strict).await?;
            let names = products.offerings();
            if names.is_empty() {
                ExtractedRecord::Products(vec![PRODUCTS_FALLBACK.to_string()])
            } else {
                ExtractedRecord::Products(names)
            }
        }
    })
}

async fn ask<Tr: Transport, S: StructuredShape>(
    client: &StructuredClient<Tr>,
    prompt: &str,
    strict: bool,
) -> Result<S, StructuredError> {
    let schema = if strict { S::schema() } else { S::lenient_schema() };
    client.request_structured(prompt, &schema).await
}

fn normalize_grade(mut audit: ContentAudit) -> ContentAudit {
    audit.content_grade = audit.content_grade.trim().to_uppercase();
    audit.priority_recommendations.truncate(5);
    for (i, rec) in audit.priority_recommendations.iter_mut().enumerate() {
        rec.rank = i as u32 + 1;
    }
    audit
}

// ── Tests ──
