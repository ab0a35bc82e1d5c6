//! Prompts for the per-chunk metadata extraction stage.

/// The system prompt for metadata extraction.
pub const SEED_SYSTEM_PROMPT: &str = "Extract structured data from text. Return ONLY valid JSON. NO markdown, NO explanations. Start with { end with }. Use null for unknown, [] for empty lists. All text in English.";

/// The per-chunk user prompt.
///
/// Placeholders: `{text}`
pub const SEED_USER_PROMPT_TEMPLATE: &str = r#"Return ONLY valid JSON. NO markdown.

Extract metadata from this text:
"""{text}"""

Required JSON structure:
{
  "title": null, "subject": null, "keywords": [], "entities": [],
  "facets": {}, "industry": []
}

Rules:
- facets: topic groups. Each item has "value", "evidence" (max 15 words), "confidence" (0-1)
- ALL text in English
- If unknown: null or []
- NO verbatim quotes

Return JSON only."#;

/// Fills the chunk user prompt.
pub fn seed_user_prompt(text: &str) -> String {
    SEED_USER_PROMPT_TEMPLATE.replace("{text}", text)
}

/// Builds the compact prompt sent in place of the full document once it has
/// been summarized locally.
pub fn enhanced_summary_prompt(summary: &str, title: &str, keywords: &[String], entities: &[String]) -> String {
    let keywords = keywords.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    let entities = entities.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    format!(
        "\nBased on this document summary, extract structured metadata:\n\n{summary}\n\nPre-extracted info:\n- Title: {title}\n- Keywords: {keywords}\n- Entities: {entities}\n\nEnhance and validate this information, return complete metadata JSON.\n"
    )
}
