//! Schemas for every structured output the model is asked to produce

use cadence_types::Action;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::schema::{require_text, Schema};

/// Chat reply: user-facing message plus follow-up actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<Action>,
}

impl Schema for ChatReply {
    const NAME: &'static str = "chat_reply";

    fn fallback() -> Self {
        Self {
            message: "Sorry, I couldn't put together a reply just now. Could you try asking again?"
                .to_string(),
            actions: Vec::new(),
        }
    }
}

fn lenient_actions<'de, D>(deserializer: D) -> Result<Vec<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(validate_actions(&value))
}

/// Keep the well-formed actions of a model-provided list
///
/// A non-list yields no actions. Each entry is checked on its own and dropped
/// with a log line when its type is unknown or a required field is blank.
/// Whether a `stepId` refers to a real step is left to the client.
pub fn validate_actions(value: &Value) -> Vec<Action> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            tracing::warn!(schema = ChatReply::NAME, field = "actions", "Actions is not a list, ignoring");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let action = match Action::deserialize(item) {
                Ok(action) => action,
                Err(e) => {
                    tracing::warn!(schema = ChatReply::NAME, index, error = %e, "Dropping malformed action");
                    return None;
                }
            };
            match check_action(&action) {
                Ok(()) => Some(action),
                Err(field) => {
                    tracing::warn!(schema = ChatReply::NAME, index, field = %field, "Dropping action with blank field");
                    None
                }
            }
        })
        .collect()
}

fn check_action(action: &Action) -> Result<(), String> {
    require_text("label", action.label())?;
    match action {
        Action::MarkStepDone { step_id, .. } | Action::FocusStep { step_id, .. } => {
            require_text("stepId", step_id)
        }
        Action::CreateTask { title, .. } => require_text("title", title),
        Action::ShowSources { .. } => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStep {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

/// Breakdown of a task into small concrete steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub steps: Vec<TaskStep>,
}

impl Schema for TaskBreakdown {
    const NAME: &'static str = "task_breakdown";

    fn fallback() -> Self {
        Self {
            steps: vec![
                TaskStep {
                    title: "Write down what \"done\" looks like".to_string(),
                    estimated_minutes: Some(5),
                },
                TaskStep {
                    title: "Do the smallest first piece".to_string(),
                    estimated_minutes: Some(10),
                },
            ],
        }
    }

    fn check(&self) -> Result<(), String> {
        if self.steps.is_empty() {
            return Err("steps".to_string());
        }
        for (i, step) in self.steps.iter().enumerate() {
            require_text(&format!("steps[{i}].title"), &step.title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailCategory {
    ActionRequired,
    Fyi,
    Newsletter,
    Promotion,
    Personal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailClassification {
    pub category: EmailCategory,
    pub priority: Priority,
    pub summary: String,
    #[serde(default)]
    pub needs_reply: bool,
}

impl Schema for EmailClassification {
    const NAME: &'static str = "email_classification";

    fn fallback() -> Self {
        Self {
            category: EmailCategory::Other,
            priority: Priority::Low,
            summary: "Could not classify this email.".to_string(),
            needs_reply: false,
        }
    }

    fn check(&self) -> Result<(), String> {
        require_text("summary", &self.summary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDigest {
    pub headline: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub suggestion: String,
}

impl Schema for WeeklyDigest {
    const NAME: &'static str = "weekly_digest";

    fn fallback() -> Self {
        Self {
            headline: "Here's your week at a glance".to_string(),
            highlights: Vec::new(),
            suggestion: "Pick one thing to finish first this week.".to_string(),
        }
    }

    fn check(&self) -> Result<(), String> {
        require_text("headline", &self.headline)?;
        require_text("suggestion", &self.suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate, validate_text};
    use cadence_types::ActionKind;
    use serde_json::json;

    #[test]
    fn test_invalid_actions_dropped_individually() {
        let reply: ChatReply = validate(&json!({
            "message": "ok",
            "actions": [
                {"type": "mark_step_done", "stepId": "s1", "label": "Done"},
                {"type": "launch_rockets", "label": "Go"},
                {"type": "focus_step", "stepId": "", "label": "Focus"},
                {"type": "show_sources", "label": ""},
                {"type": "create_task", "title": "Call mom", "label": "Add"},
                "not an object"
            ]
        }));

        let kinds: Vec<ActionKind> = reply.actions.iter().map(Action::kind).collect();
        assert_eq!(kinds, vec![ActionKind::MarkStepDone, ActionKind::CreateTask]);
        assert_eq!(reply.message, "ok");
    }

    #[test]
    fn test_non_list_actions_become_empty() {
        let reply: ChatReply = validate(&json!({"message": "ok", "actions": "none"}));
        assert!(reply.actions.is_empty());
        let reply: ChatReply = validate(&json!({"message": "ok", "actions": null}));
        assert!(reply.actions.is_empty());
        let reply: ChatReply = validate(&json!({"message": "ok"}));
        assert!(reply.actions.is_empty());
    }

    #[test]
    fn test_chat_reply_missing_message_falls_back() {
        let reply: ChatReply = validate(&json!({"actions": []}));
        assert_eq!(reply, ChatReply::fallback());
    }

    #[test]
    fn test_task_breakdown() {
        let breakdown: TaskBreakdown = validate_text(
            r#"{"steps": [{"title": "Open the form", "estimatedMinutes": 2}, {"title": "Fill in page one"}]}"#,
        );
        assert_eq!(breakdown.steps.len(), 2);
        assert_eq!(breakdown.steps[0].estimated_minutes, Some(2));

        let empty: TaskBreakdown = validate(&json!({"steps": []}));
        assert_eq!(empty, TaskBreakdown::fallback());

        let blank: TaskBreakdown = validate(&json!({"steps": [{"title": " "}]}));
        assert_eq!(blank, TaskBreakdown::fallback());
    }

    #[test]
    fn test_email_classification() {
        let parsed: EmailClassification = validate(&json!({
            "category": "action_required",
            "priority": "high",
            "summary": "Landlord needs the signed lease by Friday",
            "needsReply": true
        }));
        assert_eq!(parsed.category, EmailCategory::ActionRequired);
        assert!(parsed.needs_reply);

        let unknown: EmailClassification = validate(&json!({
            "category": "spam", "priority": "high", "summary": "x"
        }));
        assert_eq!(unknown, EmailClassification::fallback());
    }

    #[test]
    fn test_weekly_digest() {
        let digest: WeeklyDigest = validate(&json!({
            "headline": "Solid week",
            "highlights": ["Finished taxes"],
            "suggestion": "Keep mornings for deep work"
        }));
        assert_eq!(digest.highlights, vec!["Finished taxes"]);

        let bad: WeeklyDigest = validate(&json!({"headline": "", "suggestion": "x"}));
        assert_eq!(bad, WeeklyDigest::fallback());
    }
}
