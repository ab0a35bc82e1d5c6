//! Text renderings of an editor-shaped framework.
//!
//! The editor shape is `{metadata: {title, version, ..}, steps: [{name,
//! description, subSteps}], artefacts: {primary, additional}, risks: [{title,
//! description}], escalation: [{trigger, action}]}`.

use serde_json::Value;

fn str_or<'a>(value: &'a Value, key: &str, default: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn items<'a>(framework: &'a Value, key: &str) -> &'a [Value] {
    framework
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn title_of(framework: &Value) -> &str {
    framework
        .get("metadata")
        .map(|md| str_or(md, "title", "Framework"))
        .unwrap_or("Framework")
}

fn sub_steps(step: &Value) -> impl Iterator<Item = String> + '_ {
    items(step, "subSteps").iter().map(|sub| match sub {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Renders a framework back into a pseudo-document so it can be run through
/// seed extraction again.
pub fn framework_to_text(framework: &Value) -> String {
    let mut parts: Vec<String> = vec![format!("# {}\n", title_of(framework))];

    let steps = items(framework, "steps");
    if !steps.is_empty() {
        parts.push("\n## Framework Steps\n".into());
        for step in steps {
            parts.push(format!("\n### {}", str_or(step, "name", "Step")));
            parts.push(str_or(step, "description", "").to_string());
            parts.extend(sub_steps(step).map(|sub| format!("- {sub}")));
        }
    }

    let risks = items(framework, "risks");
    if !risks.is_empty() {
        parts.push("\n## Risks\n".into());
        for risk in risks {
            parts.push(format!("\n### {}", str_or(risk, "title", "Risk")));
            parts.push(str_or(risk, "description", "").to_string());
        }
    }

    let escalation = items(framework, "escalation");
    if !escalation.is_empty() {
        parts.push("\n## Escalation Points\n".into());
        for esc in escalation {
            parts.push(format!("- When: {}", str_or(esc, "trigger", "Unknown")));
            parts.push(format!("  Action: {}", str_or(esc, "action", "Escalate")));
        }
    }

    parts.join("\n")
}

fn push_artefact(out: &mut String, heading: &str, artefact: &Value) {
    let name = str_or(artefact, "name", "");
    if name.is_empty() {
        return;
    }
    out.push_str(&format!("### {heading}: {name}\n\n"));
    let description = str_or(artefact, "description", str_or(artefact, "purpose", ""));
    if !description.is_empty() {
        out.push_str(description);
        out.push_str("\n\n");
    }
}

/// Renders a framework as a Markdown document for export.
pub fn framework_to_markdown(framework: &Value) -> String {
    let metadata = framework.get("metadata").cloned().unwrap_or(Value::Null);
    let mut out = format!("# {}\n\n", title_of(framework));

    let version = str_or(&metadata, "version", "");
    if !version.is_empty() {
        out.push_str(&format!("**Version:** {version}\n\n"));
    }
    if let Some(family) = framework.get("family").and_then(Value::as_str) {
        out.push_str(&format!("**Family:** {family}\n\n"));
    }
    let description = str_or(&metadata, "description", "");
    if !description.is_empty() {
        out.push_str(description);
        out.push_str("\n\n");
    }

    let steps = items(framework, "steps");
    if !steps.is_empty() {
        out.push_str("## Steps\n\n");
        for (i, step) in steps.iter().enumerate() {
            out.push_str(&format!("### {}. {}\n\n", i + 1, str_or(step, "name", "Step")));
            let description = str_or(step, "description", "");
            if !description.is_empty() {
                out.push_str(description);
                out.push_str("\n\n");
            }
            let subs: Vec<String> = sub_steps(step).collect();
            if !subs.is_empty() {
                for sub in subs {
                    out.push_str(&format!("- {sub}\n"));
                }
                out.push('\n');
            }
        }
    }

    if let Some(artefacts) = framework.get("artefacts").filter(|a| a.is_object()) {
        let mut section = String::new();
        if let Some(primary) = artefacts.get("primary") {
            push_artefact(&mut section, "Primary", primary);
        }
        for extra in items(artefacts, "additional") {
            push_artefact(&mut section, "Additional", extra);
        }
        if !section.is_empty() {
            out.push_str("## Artefacts\n\n");
            out.push_str(&section);
        }
    }

    let risks = items(framework, "risks");
    if !risks.is_empty() {
        out.push_str("## Risks\n\n");
        for risk in risks {
            let title = str_or(risk, "title", "Risk");
            match str_or(risk, "description", "") {
                "" => out.push_str(&format!("- **{title}**\n")),
                d => out.push_str(&format!("- **{title}**: {d}\n")),
            }
        }
        out.push('\n');
    }

    let escalation = items(framework, "escalation");
    if !escalation.is_empty() {
        out.push_str("## Escalation\n\n");
        for esc in escalation {
            out.push_str(&format!(
                "- **When:** {} **Action:** {}\n",
                str_or(esc, "trigger", "Unknown"),
                str_or(esc, "action", "Escalate")
            ));
        }
        out.push('\n');
    }

    format!("{}\n", out.trim_end())
}

/// Download filename for an exported framework: anything other than letters,
/// digits, spaces, `-` and `_` becomes `_`, then spaces become `_`.
pub fn export_filename(title: &str) -> String {
    let safe: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.md", safe.replace(' ', "_"))
}
