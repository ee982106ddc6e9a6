use serde::{Deserialize, Serialize};

/// Follow-up action the client can offer next to the reply
///
/// Serialized as `{"type": "mark_step_done", "stepId": "...", "label": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    MarkStepDone {
        #[serde(alias = "step_id")]
        step_id: String,
        label: String,
    },

    FocusStep {
        #[serde(alias = "step_id")]
        step_id: String,
        label: String,
    },

    CreateTask {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        label: String,
    },

    ShowSources {
        label: String,
    },
}

/// Closed set of action types understood downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    MarkStepDone,
    FocusStep,
    CreateTask,
    ShowSources,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::MarkStepDone,
        ActionKind::FocusStep,
        ActionKind::CreateTask,
        ActionKind::ShowSources,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarkStepDone => "mark_step_done",
            Self::FocusStep => "focus_step",
            Self::CreateTask => "create_task",
            Self::ShowSources => "show_sources",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::MarkStepDone { .. } => ActionKind::MarkStepDone,
            Self::FocusStep { .. } => ActionKind::FocusStep,
            Self::CreateTask { .. } => ActionKind::CreateTask,
            Self::ShowSources { .. } => ActionKind::ShowSources,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::MarkStepDone { label, .. }
            | Self::FocusStep { label, .. }
            | Self::CreateTask { label, .. }
            | Self::ShowSources { label } => label,
        }
    }

    pub fn step_id(&self) -> Option<&str> {
        match self {
            Self::MarkStepDone { step_id, .. } | Self::FocusStep { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}

/// Which degradation tier produced a parsed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    /// Strict JSON parse of the first balanced object
    Strict,
    /// `message` value recovered by targeted extraction
    Repaired,
    /// No structure found; the raw text is the message
    RawFallback,
}

/// Reduction of the model's accumulated output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub message: String,
    pub actions: Vec<Action>,
    pub raw: String,
    pub tier: ParseTier,
}

impl ParsedResponse {
    pub fn is_structured(&self) -> bool {
        self.tier != ParseTier::RawFallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_wire_shape() {
        let action = Action::MarkStepDone {
            step_id: "s1".to_string(),
            label: "Done".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"type": "mark_step_done", "stepId": "s1", "label": "Done"})
        );
    }

    #[test]
    fn test_create_task_context_is_optional() {
        let action: Action = serde_json::from_value(json!({
            "type": "create_task", "title": "Call the bank", "label": "Add task"
        }))
        .unwrap();
        assert_eq!(action.kind(), ActionKind::CreateTask);
        assert!(serde_json::to_value(&action).unwrap().get("context").is_none());
    }

    #[test]
    fn test_snake_case_step_id_alias() {
        let action: Action = serde_json::from_value(json!({
            "type": "focus_step", "step_id": "s2", "label": "Focus"
        }))
        .unwrap();
        assert_eq!(action.step_id(), Some("s2"));
    }

    #[test]
    fn test_raw_fallback_is_not_structured() {
        let response = |tier| ParsedResponse {
            message: "hi".to_string(),
            actions: vec![],
            raw: "hi".to_string(),
            tier,
        };
        assert!(response(ParseTier::Strict).is_structured());
        assert!(response(ParseTier::Repaired).is_structured());
        assert!(!response(ParseTier::RawFallback).is_structured());
    }

    #[test]
    fn test_action_kind_parse() {
        assert_eq!(ActionKind::parse("show_sources"), Some(ActionKind::ShowSources));
        assert_eq!(ActionKind::parse("delete_everything"), None);
    }
}
