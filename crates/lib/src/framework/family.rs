//! Framework families: the fixed set of categories frameworks are grouped by.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Technology,
    Healthcare,
    Financial,
    Legal,
    Education,
    Marketing,
    Operations,
    #[serde(rename = "Human Resources")]
    HumanResources,
    Sales,
    Design,
    Research,
    Strategy,
    Compliance,
    #[serde(rename = "Project Management")]
    ProjectManagement,
    Other,
}

/// Title keywords per family, checked in this order.
const TITLE_KEYWORDS: &[(Family, &[&str])] = &[
    (
        Family::Technology,
        &[
            "ai", "artificial intelligence", "machine learning", "ml", "tech", "software",
            "system", "platform", "data", "algorithm", "digital", "cloud", "api", "code",
            "programming",
        ],
    ),
    (
        Family::Healthcare,
        &[
            "health", "medical", "patient", "hospital", "clinical", "wellbeing", "wellness",
            "healthcare", "care", "medicine", "diagnosis", "treatment", "therapy",
            "pharmaceutical",
        ],
    ),
    (
        Family::Legal,
        &[
            "legal", "law", "compliance", "regulation", "regulatory", "audit", "governance",
            "policy", "risk management", "gdpr", "privacy", "data protection", "contract",
        ],
    ),
    (
        Family::Financial,
        &[
            "finance", "financial", "bank", "invest", "investment", "accounting", "treasury",
            "payment", "trading", "fund", "capital", "credit", "loan", "insurance",
        ],
    ),
    (
        Family::Education,
        &[
            "education", "training", "learning", "course", "curriculum", "teaching", "student",
            "academic", "school", "university", "certification", "workshop",
        ],
    ),
    (
        Family::Marketing,
        &[
            "marketing", "brand", "campaign", "advertising", "promotion", "social media", "seo",
            "content marketing", "pr", "communication", "outreach",
        ],
    ),
    (
        Family::Operations,
        &[
            "operation", "process", "workflow", "supply chain", "logistics", "manufacturing",
            "production", "delivery", "optimization", "efficiency",
        ],
    ),
    (
        Family::HumanResources,
        &[
            "hr", "human resource", "recruit", "employee", "talent", "hiring", "onboarding",
            "performance", "compensation", "benefits", "workforce",
        ],
    ),
    (
        Family::Sales,
        &[
            "sales", "sell", "selling", "revenue", "customer", "business development",
            "account management", "crm", "pipeline", "deal",
        ],
    ),
    (
        Family::Design,
        &[
            "design", "ux", "ui", "user experience", "interface", "product design", "visual",
            "creative", "prototype", "wireframe", "mockup",
        ],
    ),
    (
        Family::Research,
        &[
            "research", "study", "analysis", "investigation", "survey", "questionnaire",
            "data collection", "findings", "methodology", "hypothesis",
        ],
    ),
    (
        Family::Strategy,
        &[
            "strategy", "strategic", "planning", "roadmap", "business plan", "vision", "mission",
            "objectives", "goals", "initiative",
        ],
    ),
    (
        Family::ProjectManagement,
        &[
            "project", "program", "delivery", "implementation", "milestone", "sprint", "agile",
            "scrum", "waterfall", "gantt", "timeline",
        ],
    ),
];

/// Keywords this short only match whole words ("ai" must not match "maintain").
const WHOLE_WORD_MAX_LEN: usize = 3;

impl Family {
    pub const ALL: [Family; 15] = [
        Family::Technology,
        Family::Healthcare,
        Family::Financial,
        Family::Legal,
        Family::Education,
        Family::Marketing,
        Family::Operations,
        Family::HumanResources,
        Family::Sales,
        Family::Design,
        Family::Research,
        Family::Strategy,
        Family::Compliance,
        Family::ProjectManagement,
        Family::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Technology => "Technology",
            Family::Healthcare => "Healthcare",
            Family::Financial => "Financial",
            Family::Legal => "Legal",
            Family::Education => "Education",
            Family::Marketing => "Marketing",
            Family::Operations => "Operations",
            Family::HumanResources => "Human Resources",
            Family::Sales => "Sales",
            Family::Design => "Design",
            Family::Research => "Research",
            Family::Strategy => "Strategy",
            Family::Compliance => "Compliance",
            Family::ProjectManagement => "Project Management",
            Family::Other => "Other",
        }
    }

    /// Parses an exact family label.
    pub fn from_label(label: &str) -> Option<Family> {
        Family::ALL.into_iter().find(|f| f.as_str() == label.trim())
    }

    /// Infers a family from title keywords, falling back to `Other`.
    pub fn infer_from_title(title: &str) -> Family {
        let lowered = title.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let matches = |keyword: &&str| {
            if keyword.len() <= WHOLE_WORD_MAX_LEN {
                words.contains(keyword)
            } else {
                lowered.contains(keyword)
            }
        };

        TITLE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(matches))
            .map(|(family, _)| *family)
            .unwrap_or(Family::Other)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The family of a framework: its own `family` (or `category`) when that is a
/// known label, otherwise inferred from its title.
pub fn ensure_family(framework: &Value) -> Family {
    let label = framework
        .get("family")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| framework.get("category").and_then(Value::as_str));

    if let Some(family) = label.and_then(Family::from_label) {
        return family;
    }
    let title = framework.get("title").and_then(Value::as_str).unwrap_or_default();
    Family::infer_from_title(title)
}
