use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::buffer_utils::SseLineParser;
use crate::streaming::StreamEvent;

/// Wire payload of one Anthropic Messages streaming event
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    MessageStart,
    ContentBlockStart {
        index: u64,
        content_block: WireBlock,
    },
    ContentBlockDelta {
        index: u64,
        delta: WireDelta,
    },
    ContentBlockStop {
        index: u64,
    },
    MessageDelta {
        delta: MessageDeltaBody,
    },
    MessageStop,
    Ping,
    Error {
        error: WireError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text,
    ToolUse { id: String, name: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
}

/// Maps Anthropic wire events onto [`StreamEvent`]s
///
/// Tool-use deltas and stops are addressed by block index on the wire; the
/// parser remembers which index belongs to which tool id.
#[derive(Debug, Default)]
pub struct AnthropicLineParser {
    tool_blocks: HashMap<u64, String>,
    stop_reason: Option<String>,
}

impl AnthropicLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn tool_id(&self, index: u64) -> String {
        self.tool_blocks
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("unknown_block_{}", index))
    }
}

impl SseLineParser for AnthropicLineParser {
    fn parse_data_line(&mut self, event_name: Option<&str>, data: &str) -> Option<StreamEvent> {
        let raw: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                tracing::trace!(error = %e, data = %data, "Ignoring unparseable SSE payload");
                return None;
            }
        };

        let event: WireEvent = match serde_json::from_value(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::trace!(error = %e, event = ?event_name, "Ignoring unknown SSE event");
                return None;
            }
        };

        match event {
            WireEvent::ContentBlockStart {
                index,
                content_block: WireBlock::ToolUse { id, name },
            } => {
                self.tool_blocks.insert(index, id.clone());
                Some(StreamEvent::ToolUseStart { id, name })
            }
            WireEvent::ContentBlockDelta { index, delta } => match delta {
                WireDelta::TextDelta { text } => Some(StreamEvent::TokenDelta { text }),
                WireDelta::InputJsonDelta { partial_json } => Some(StreamEvent::ToolInputDelta {
                    id: self.tool_id(index),
                    partial_json,
                }),
                WireDelta::Other => None,
            },
            WireEvent::ContentBlockStop { index } => self
                .tool_blocks
                .remove(&index)
                .map(|id| StreamEvent::ToolUseStop { id }),
            WireEvent::MessageDelta { delta } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                None
            }
            WireEvent::MessageStop => Some(StreamEvent::MessageStop {
                stop_reason: self.stop_reason.take(),
            }),
            WireEvent::Error { error } => Some(StreamEvent::Error {
                message: error.message,
            }),
            WireEvent::ContentBlockStart { .. } | WireEvent::MessageStart | WireEvent::Ping => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &mut AnthropicLineParser, data: &str) -> Option<StreamEvent> {
        parser.parse_data_line(None, data)
    }

    #[test]
    fn test_text_delta() {
        let mut parser = AnthropicLineParser::new();
        let event = parse(
            &mut parser,
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        );
        assert_eq!(event, Some(StreamEvent::token("Hi")));
    }

    #[test]
    fn test_tool_block_lifecycle() {
        let mut parser = AnthropicLineParser::new();

        let start = parse(
            &mut parser,
            r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"web_search","input":{}}}"#,
        );
        assert_eq!(start, Some(StreamEvent::tool_start("toolu_1", "web_search")));

        let delta = parse(
            &mut parser,
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"query\":"}}"#,
        );
        assert_eq!(delta, Some(StreamEvent::tool_input("toolu_1", "{\"query\":")));

        let stop = parse(&mut parser, r#"{"type":"content_block_stop","index":1}"#);
        assert_eq!(stop, Some(StreamEvent::tool_stop("toolu_1")));
    }

    #[test]
    fn test_text_block_stop_emits_nothing() {
        let mut parser = AnthropicLineParser::new();
        parse(
            &mut parser,
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
        );
        assert_eq!(parse(&mut parser, r#"{"type":"content_block_stop","index":0}"#), None);
    }

    #[test]
    fn test_stop_reason_carried_to_message_stop() {
        let mut parser = AnthropicLineParser::new();
        assert_eq!(
            parse(
                &mut parser,
                r#"{"type":"message_delta","delta":{"stop_reason":"tool_use"},"usage":{"output_tokens":12}}"#,
            ),
            None
        );
        let stop = parse(&mut parser, r#"{"type":"message_stop"}"#);
        assert_eq!(stop, Some(StreamEvent::stop(Some("tool_use"))));
        assert!(stop.unwrap().requests_tools());
    }

    #[test]
    fn test_delta_for_unknown_index_gets_synthetic_id() {
        let mut parser = AnthropicLineParser::new();
        let event = parse(
            &mut parser,
            r#"{"type":"content_block_delta","index":7,"delta":{"type":"input_json_delta","partial_json":"{}"}}"#,
        );
        assert_eq!(event, Some(StreamEvent::tool_input("unknown_block_7", "{}")));
    }

    #[test]
    fn test_error_and_garbage() {
        let mut parser = AnthropicLineParser::new();
        assert_eq!(
            parse(&mut parser, r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            Some(StreamEvent::Error { message: "Overloaded".to_string() })
        );
        assert_eq!(parse(&mut parser, "not json"), None);
        assert_eq!(parse(&mut parser, r#"{"type":"brand_new_event"}"#), None);
        assert_eq!(parse(&mut parser, r#"{"type":"ping"}"#), None);
    }
}
