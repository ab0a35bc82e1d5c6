//! Prompts for turning a metadata record into a framework.

/// The system prompt for framework generation.
pub const FRAMEWORK_SYSTEM_PROMPT: &str = "You are a senior framework designer. Transform metadata into a comprehensive framework.

CRITICAL REQUIREMENTS:
1. workflow_layers MUST include 'focus' (1-2 sentence overview) AND 'guidance' (3-5 actionable steps)
2. risks_watchouts MUST be objects with 'risk', 'impact', and 'mitigation' fields
3. escalation MUST be objects with 'trigger' and 'action' fields
4. primary_artefact MUST have meaningful 'name' and 'purpose' - NEVER leave as null
5. outputs_deliverables MUST include 'default' and 3-5 'optional' artefacts specific to this framework
6. family: Categorize into one of these: Technology, Healthcare, Financial, Legal, Education, Marketing, Operations, Human Resources, Sales, Design, Research, Strategy, Compliance, Project Management, or Other
7. Be specific and actionable, not generic - use actual content from metadata
8. Return ONLY valid JSON - no markdown, no code fences, no comments

Use null or [] ONLY for truly unknown fields, NOT for artefacts.";

/// The framework shape the model is asked to fill.
pub const FRAMEWORK_SCHEMA: &str = r#"{
  "id": null,
  "title": null,
  "type": null,
  "attribution": null,
  "quadrant": null,
  "version": "1.0",
  "family": null,
  "core_method": [],
  "pov": [
    "<point of view 1 - one sentence describing approach>",
    "<point of view 2 - another perspective or principle>"
  ],
  "primary_artefact": {
    "name": "<specific artefact name, e.g., 'Compliance Checklist', 'Implementation Plan'>",
    "purpose": "<clear purpose in 1-2 sentences>",
    "when_to_use": ["<scenario 1>", "<scenario 2>", "<scenario 3>"]
  },
  "concept_clusters": {},
  "trigger_context": [],
  "workflow_layers": [
    {
      "name": "<layer name>",
      "focus": "<1-2 sentence description of what this layer achieves>",
      "guidance": ["<specific actionable step 1>", "<specific actionable step 2>", "<specific actionable step 3>"]
    }
  ],
  "inputs_required": [],
  "risks_watchouts": [
    {"risk": "<risk title>", "impact": "<why this matters>", "mitigation": "<how to address>"}
  ],
  "research_required": [],
  "outputs_deliverables": {
    "default": "<primary deliverable name>",
    "optional": [
      {"name": "<specific artefact name>", "description": "<10-20 word description of purpose and use case>"},
      {"name": "<another specific artefact>", "description": "<10-20 word description of purpose and use case>"},
      {"name": "<third artefact>", "description": "<10-20 word description of purpose and use case>"}
    ]
  },
  "escalation": [
    {"trigger": "<specific condition that requires escalation>", "action": "<who to escalate to and what action to take>"}
  ],
  "tags": [],
  "derived_from_metadata": {"used_facets": [], "used_triples": [], "used_key_values": []}
}"#;

const FRAMEWORK_INSTRUCTIONS: &str = r#"CRITICAL INSTRUCTIONS:

0. POINT OF VIEW (POV):
   - Generate 2-4 concise points of view as an ARRAY of strings
   - Each POV is ONE sentence describing a key principle or approach
   - Base POVs on the document's core themes and methodologies
   Example for compliance frameworks:
     ["Proactive risk identification and mitigation", "Continuous compliance monitoring", "Stakeholder transparency and accountability"]

1. WORKFLOW LAYERS:
   - Each workflow_layer MUST have 'name', 'focus' (description), and 'guidance' (3-5 steps)
   - Extract from metadata.sections if available
   - Be SPECIFIC using actual content, not generic placeholders

2. ARTEFACTS (DO NOT SKIP):
   - primary_artefact.name: a SPECIFIC deliverable name based on the document type
   - primary_artefact.purpose: WHY this artefact matters in 1-2 sentences
   - primary_artefact.when_to_use: 2-3 specific scenarios
   - outputs_deliverables.default: same as primary_artefact.name
   - outputs_deliverables.optional: 3-5 RELATED artefacts as OBJECTS {"name": "...", "description": "..."}
     Each description is 10-20 words. Base artefacts on document topics, not generic categories.
     DO NOT use simple strings like ['Artefact 1', 'Artefact 2'].

3. RISKS:
   - Each risk MUST have 'risk', 'impact', 'mitigation'
   - Extract from metadata.risks if available

4. ESCALATION:
   - Each escalation MUST have 'trigger' and 'action'

5. FAMILY CLASSIFICATION (REQUIRED):
   - Technology: AI, ML, software, systems, platforms, data science
   - Healthcare: health, medical, wellbeing, patient care, clinical
   - Financial: finance, banking, investment, accounting, treasury
   - Legal: law, compliance, regulation, governance, audit
   - Education: learning, training, curriculum, academic
   - Marketing: brand, campaign, advertising, social media
   - Operations: process, workflow, supply chain, logistics
   - Human Resources: HR, recruitment, employee, talent
   - Sales: selling, revenue, business development
   - Design: UX, UI, product design, creative
   - Research: study, analysis, investigation, academic research
   - Strategy: strategic planning, business strategy, roadmap
   - Compliance: regulatory compliance, audit, risk management
   - Project Management: project planning, delivery, program management
   - Other: only if none of the above fit
   Choose the MOST SPECIFIC category that fits.

NEVER return null for primary_artefact.name, outputs_deliverables.default, or family.
NEVER use generic placeholders like 'Framework Document' unless truly appropriate.
"#;

/// Builds the user prompt carrying the schema and the pretty-printed metadata.
pub fn framework_user_prompt(metadata_json: &str) -> String {
    format!(
        "Build the framework JSON from this metadata. Keep lists short (<=6). Schema:\n{FRAMEWORK_SCHEMA}\n\nMetadata:\n{metadata_json}\n\n{FRAMEWORK_INSTRUCTIONS}"
    )
}

/// System prompt for the single repair attempt after an unparseable answer.
pub const JSON_REPAIR_SYSTEM_PROMPT: &str = "You convert text to strict JSON. Return the same content as a SINGLE valid JSON object only. No markdown, no comments.";

/// System prompt for improving a framework a user has edited.
pub const FRAMEWORK_IMPROVE_SYSTEM_PROMPT: &str = "You are a framework improvement assistant. The user has edited a framework and wants you to review and improve it. CRITICAL: Keep ALL user modifications intact. Only fill in missing parts and suggest improvements. Return the improved framework as valid JSON matching the original structure.";

/// Builds the user prompt for framework improvement.
pub fn framework_improve_prompt(framework_json: &str) -> String {
    format!(
        "Here is a framework that the user has edited:\n\n{framework_json}\n\n\
Please:\n\
1. Keep all user modifications intact (especially steps, risks, escalation)\n\
2. Fill in missing sections if any:\n\
   - Add 'trigger_context' or 'pov' if missing\n\
   - Add 'inputs_required' if missing\n\
   - Add 'research_required' if missing\n\
   - Add 'attribution' if appropriate\n\
   - Add 'quadrant' (QI/QII/QIII/QIV) if appropriate\n\
3. Ensure consistency across all sections\n\
4. Improve descriptions to be more specific and actionable\n\
5. Return the complete improved framework as JSON\n\n\
IMPORTANT: Do NOT remove or significantly change user's content. Only enhance and complete."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_carries_schema_and_metadata() {
        let prompt = framework_user_prompt("{\"title\": \"Audit Playbook\"}");
        assert!(prompt.starts_with("Build the framework JSON from this metadata."));
        assert!(prompt.contains("\"primary_artefact\""));
        assert!(prompt.contains("Metadata:\n{\"title\": \"Audit Playbook\"}"));
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(FRAMEWORK_SCHEMA).unwrap();
        assert!(schema["workflow_layers"].is_array());
    }
}
