use serde_json::Value;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Cadence, a calm and practical assistant that helps people get through their day one small step at a time.

Always answer with a single JSON object and nothing else:
{"message": "<your reply to the user>", "actions": [<zero or more actions>]}

Available actions:
- {"type": "mark_step_done", "stepId": "<id>", "label": "<button text>"}
- {"type": "focus_step", "stepId": "<id>", "label": "<button text>"}
- {"type": "create_task", "title": "<task title>", "context": "<optional detail>", "label": "<button text>"}
- {"type": "show_sources", "label": "<button text>"}

Only reference step ids that appear in the context. Keep messages short and concrete.
When the answer depends on current facts (deadlines, opening hours, official rules, prices), call the web_search tool first and base your reply on what it returns."#;

/// System prompt with the request context appended
///
/// String context is inserted as-is; any other JSON value is pretty-printed.
/// Null, blank strings and empty objects add nothing.
pub fn build_system_prompt(base: &str, context: Option<&Value>) -> String {
    let rendered = match context {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(other) => serde_json::to_string_pretty(other).ok(),
    };

    match rendered {
        Some(context) => format!("{base}\n\n## Current context\n{context}"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_rendering() {
        assert_eq!(build_system_prompt("base", None), "base");
        assert_eq!(build_system_prompt("base", Some(&json!("  "))), "base");
        assert_eq!(build_system_prompt("base", Some(&json!({}))), "base");
        assert_eq!(
            build_system_prompt("base", Some(&json!("Task: renew passport"))),
            "base\n\n## Current context\nTask: renew passport"
        );

        let prompt = build_system_prompt("base", Some(&json!({"steps": [{"id": "s1"}]})));
        assert!(prompt.starts_with("base\n\n## Current context\n{"));
        assert!(prompt.contains("\"id\": \"s1\""));
    }
}
