//! Deterministic framework builder used when no framework model is available.
//!
//! Everything is derived from the metadata record alone, so the same input
//! always yields the same framework.

use crate::merge::truncate_chars;
use crate::schema::Record;
use serde_json::{json, Map, Value};

const MAX_CLUSTERS_FROM_FACETS: usize = 4;
const MAX_BULLETS: usize = 6;
const MAX_TAGS: usize = 12;
const MAX_LAYERS: usize = 4;

struct ArtefactPlan {
    primary_name: &'static str,
    primary_purpose: &'static str,
    optional: &'static [&'static str],
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn artefact_plan(title_lower: &str) -> ArtefactPlan {
    if contains_any(title_lower, &["compliance", "audit"]) {
        ArtefactPlan {
            primary_name: "Compliance Checklist",
            primary_purpose: "Systematic verification of regulatory requirements and controls",
            optional: &["Audit Report", "Risk Register", "Policy Documentation", "Board Brief"],
        }
    } else if contains_any(title_lower, &["ai", "ml", "machine learning"]) {
        ArtefactPlan {
            primary_name: "AI Implementation Plan",
            primary_purpose: "Comprehensive guide for deploying and managing AI systems",
            optional: &[
                "Model Documentation",
                "Risk Assessment",
                "Ethics Guidelines",
                "Performance Dashboard",
            ],
        }
    } else if contains_any(title_lower, &["wellbeing", "health"]) {
        ArtefactPlan {
            primary_name: "Health Assessment Report",
            primary_purpose: "Structured evaluation of health and wellbeing metrics",
            optional: &["Wellbeing Dashboard", "Action Plan", "Progress Report", "Clinical Guidelines"],
        }
    } else if contains_any(title_lower, &["question", "survey"]) {
        ArtefactPlan {
            primary_name: "Question Set Document",
            primary_purpose: "Structured questionnaire with scoring methodology",
            optional: &["Survey Results Dashboard", "Analysis Report", "Respondent Guide"],
        }
    } else if contains_any(title_lower, &["strategy", "business"]) {
        ArtefactPlan {
            primary_name: "Strategic Plan",
            primary_purpose: "Comprehensive strategic planning document with actionable roadmap",
            optional: &["Business Case", "Roadmap", "Executive Summary", "Risk Analysis"],
        }
    } else {
        ArtefactPlan {
            primary_name: "Framework Document",
            primary_purpose: "Comprehensive framework documentation and implementation guide",
            optional: &[
                "Implementation Guide",
                "Best Practices",
                "Case Studies",
                "Reference Materials",
            ],
        }
    }
}

fn points_of_view(title_lower: &str) -> [&'static str; 3] {
    if contains_any(title_lower, &["compliance", "audit"]) {
        [
            "Proactive risk identification and mitigation",
            "Continuous compliance monitoring",
            "Stakeholder transparency and accountability",
        ]
    } else if contains_any(title_lower, &["ai", "ml"]) {
        [
            "Risk-first approach to AI implementation",
            "Data-driven decision making with human oversight",
            "Ethical AI practices throughout the lifecycle",
        ]
    } else if contains_any(title_lower, &["wellbeing", "health"]) {
        [
            "Patient-centered care as the foundation",
            "Evidence-based protocols with clinical flexibility",
            "Holistic wellbeing assessment approach",
        ]
    } else {
        [
            "Structured approach to problem-solving",
            "Stakeholder-aligned decision making",
            "Continuous improvement and adaptation",
        ]
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn non_empty_str<'a>(md: &'a Record, key: &str) -> Option<&'a str> {
    md.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn list<'a>(md: &'a Record, key: &str) -> &'a [Value] {
    md.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn facet_clusters(md: &Record) -> Map<String, Value> {
    let mut clusters = Map::new();
    let Some(facets) = md.get("facets").and_then(Value::as_object) else {
        return clusters;
    };
    for (name, body) in facets.iter().take(MAX_CLUSTERS_FROM_FACETS) {
        let items: Vec<Value> = match body {
            Value::Object(obj) => obj.get("items").and_then(Value::as_array).cloned().unwrap_or_default(),
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        let bullets: Vec<Value> = items
            .iter()
            .take(MAX_BULLETS)
            .map(|item| match item {
                Value::Object(obj) => obj.get("value").map(text_of).unwrap_or_default(),
                other => text_of(other),
            })
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Value::String)
            .collect();
        if !bullets.is_empty() {
            clusters.insert(name.clone(), Value::Array(bullets));
        }
    }
    clusters
}

fn section_bullets(md: &Record) -> Vec<Value> {
    list(md, "sections")
        .iter()
        .take(MAX_BULLETS)
        .filter_map(|section| {
            let title = section.get("title").map(text_of).unwrap_or_default();
            let content = section.get("content").map(text_of).unwrap_or_default();
            let one = if title.trim().is_empty() {
                content.trim()
            } else {
                title.trim()
            };
            (!one.is_empty()).then(|| Value::String(truncate_chars(one, 120)))
        })
        .collect()
}

fn short_bullets(values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .take(MAX_BULLETS)
        .map(text_of)
        .filter(|s| !s.trim().is_empty())
        .map(|s| Value::String(truncate_chars(&s, 60)))
        .collect()
}

fn concept_clusters(md: &Record, title: &str) -> Map<String, Value> {
    let mut clusters = facet_clusters(md);
    if clusters.is_empty() {
        let bullets = section_bullets(md);
        if !bullets.is_empty() {
            clusters.insert("sections".into(), Value::Array(bullets));
        }
    }
    for key in ["keywords", "entities"] {
        if clusters.is_empty() {
            let bullets = short_bullets(list(md, key));
            if !bullets.is_empty() {
                clusters.insert(key.into(), Value::Array(bullets));
            }
        }
    }
    if clusters.is_empty() {
        clusters.insert(
            "general".into(),
            json!([
                format!("{title} - key idea 1"),
                format!("{title} - key idea 2"),
                "Align team and stakeholders",
                "Translate insights to actions",
            ]),
        );
    }
    clusters
}

/// `snake_case_name` to `Snake Case Name`.
fn title_case(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tags(md: &Record) -> Vec<Value> {
    let mut tags: Vec<String> = Vec::new();
    for key in ["keywords", "industry", "jurisdiction"] {
        for value in list(md, key) {
            let tag = text_of(value).trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags.into_iter().take(MAX_TAGS).map(Value::String).collect()
}

/// Builds a complete framework from a metadata record without any model call.
pub fn build_mock_framework(md: &Record) -> Record {
    let title = non_empty_str(md, "title")
        .or_else(|| non_empty_str(md, "subject"))
        .unwrap_or("Untitled Framework")
        .trim()
        .to_string();
    let attribution = non_empty_str(md, "author")
        .map(|a| Value::String(a.to_string()))
        .or_else(|| list(md, "entities").first().cloned())
        .unwrap_or(Value::Null);

    let clusters = concept_clusters(md, &title);
    let workflow_layers: Vec<Value> = clusters
        .keys()
        .take(MAX_LAYERS)
        .map(|k| {
            json!({
                "name": title_case(k),
                "guidance": ["Ground in evidence", "Keep copy plain", "Place into journeys", "Validate with users"],
            })
        })
        .collect();

    let title_lower = title.to_lowercase();
    let plan = artefact_plan(&title_lower);
    let doc_id = non_empty_str(md, "doc_id").unwrap_or("seed");
    let used_facets: Vec<&String> = clusters.keys().collect();
    let used_triples: Vec<&Value> = list(md, "triples").iter().take(5).collect();
    let used_key_values: Vec<&Value> = list(md, "key_values").iter().take(5).collect();

    let framework = json!({
        "id": format!("framework-{doc_id}-v1.0"),
        "title": title,
        "type": "evergreen",
        "attribution": attribution,
        "quadrant": null,
        "version": "1.0",
        "core_method": ["Reframe", "Draft", "Embed", "Validate"],
        "pov": points_of_view(&title_lower),
        "primary_artefact": {
            "name": plan.primary_name,
            "purpose": plan.primary_purpose,
            "when_to_use": ["Project kickoff", "Stakeholder alignment", "Implementation planning"],
        },
        "concept_clusters": clusters,
        "trigger_context": ["When teams need repeatable guidance", "When multiple stakeholders align"],
        "workflow_layers": workflow_layers,
        "inputs_required": ["Summary notes", "Current artefacts", "Known constraints"],
        "risks_watchouts": ["Over-generalization", "Jargon-heavy copy", "No traceability"],
        "research_required": ["Usability testing", "Benchmark peers"],
        "outputs_deliverables": {
            "default": plan.primary_name,
            "optional": plan.optional,
        },
        "escalation": ["Legal ambiguity", "Sensitive data", "Conflicting policies"],
        "tags": tags(md),
        "derived_from_metadata": {
            "used_facets": used_facets,
            "used_triples": used_triples,
            "used_key_values": used_key_values,
        },
    });

    match framework {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
