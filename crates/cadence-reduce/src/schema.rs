use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::parser::first_balanced_object;

/// Structured model output with a hard-coded safe default
///
/// Validation never fails from the caller's point of view: anything that
/// does not deserialize, or deserializes but fails [`Schema::check`], is
/// replaced by [`Schema::fallback`] and logged.
pub trait Schema: DeserializeOwned {
    /// Name used in validation logs
    const NAME: &'static str;

    fn fallback() -> Self;

    /// Semantic checks beyond the serde shape; `Err` names the offending field
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Validate an already-parsed JSON value
pub fn validate<S: Schema>(value: &Value) -> S {
    match S::deserialize(value) {
        Ok(parsed) => match parsed.check() {
            Ok(()) => parsed,
            Err(field) => {
                tracing::warn!(schema = S::NAME, field = %field, "Schema check failed, using fallback");
                S::fallback()
            }
        },
        Err(e) => {
            tracing::warn!(schema = S::NAME, error = %e, "Schema validation failed, using fallback");
            S::fallback()
        }
    }
}

/// Validate raw model text that should contain one JSON object
pub fn validate_text<S: Schema>(text: &str) -> S {
    let Some(object) = first_balanced_object(text) else {
        tracing::warn!(schema = S::NAME, "No JSON object in model output, using fallback");
        return S::fallback();
    };

    match serde_json::from_str::<Value>(object) {
        Ok(value) => validate(&value),
        Err(e) => {
            tracing::warn!(schema = S::NAME, error = %e, "Model output is not valid JSON, using fallback");
            S::fallback()
        }
    }
}

/// Reject blank strings in `check` implementations
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(field.to_string())
    } else {
        Ok(())
    }
}
