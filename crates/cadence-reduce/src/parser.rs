//! Extraction of the reply `message` from model output
//!
//! Two entry points share one string scanner:
//!
//! - [`parse_full`] runs on the complete text once streaming has finished and
//!   degrades through three tiers (strict JSON, targeted repair, raw text).
//! - [`parse_partial`] runs on a prefix that may stop anywhere, including in
//!   the middle of an escape sequence, and drives the live preview.
//!
//! Neither function can fail.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const MESSAGE_KEY: &str = "\"message\"";

static MESSAGE_VALUE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""message"\s*:\s*""#).expect("message pattern should be valid")
});

/// Result of a full parse, tagged by how much structure was recovered
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// First balanced object parsed as JSON and carries a string `message`
    Strict(Map<String, Value>),
    /// Only the `message` value could be recovered
    Repaired { message: String },
    /// No structure; the trimmed input text
    RawFallback { text: String },
}

impl Extraction {
    pub fn message(&self) -> &str {
        match self {
            Self::Strict(object) => object.get("message").and_then(Value::as_str).unwrap_or_default(),
            Self::Repaired { message } => message,
            Self::RawFallback { text } => text,
        }
    }
}

/// Unescaped content of a JSON string literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedString {
    pub value: String,
    /// Whether an unescaped closing quote was reached
    pub closed: bool,
}

/// Scan a JSON string value starting just after its opening quote
///
/// Stops at the first unescaped `"` or at end of input. Escapes are resolved
/// left to right, so `\\n` yields a backslash followed by `n`. An escape cut
/// off by the end of input is dropped rather than guessed.
pub fn scan_string_value(input: &str) -> ScannedString {
    let mut value = String::with_capacity(input.len());
    let mut rest = input;

    loop {
        let Some(pos) = rest.find(|c: char| c == '"' || c == '\\') else {
            value.push_str(rest);
            return ScannedString { value, closed: false };
        };

        value.push_str(&rest[..pos]);
        let is_quote = rest.as_bytes()[pos] == b'"';
        rest = &rest[pos + 1..];

        if is_quote {
            return ScannedString { value, closed: true };
        }

        let Some(escaped) = rest.chars().next() else {
            return ScannedString { value, closed: false };
        };

        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'u' => match decode_unicode_escape(&rest[1..]) {
                UnicodeEscape::Complete(ch, used) => {
                    value.push(ch);
                    rest = &rest[1 + used..];
                    continue;
                }
                UnicodeEscape::Incomplete => return ScannedString { value, closed: false },
                UnicodeEscape::Invalid => value.push('u'),
            },
            // `"`, `\`, `/` and anything unrecognised stand for themselves
            other => value.push(other),
        }

        rest = &rest[escaped.len_utf8()..];
    }
}

enum UnicodeEscape {
    /// Decoded char and the number of input bytes consumed after `\u`
    Complete(char, usize),
    Incomplete,
    Invalid,
}

enum Hex4 {
    Value(u32),
    Short,
    Invalid,
}

fn read_hex4(s: &str) -> Hex4 {
    match s.get(..4) {
        Some(digits) if digits.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(digits, 16).map_or(Hex4::Invalid, Hex4::Value)
        }
        Some(_) => Hex4::Invalid,
        None if s.len() < 4 && s.bytes().all(|b| b.is_ascii_hexdigit()) => Hex4::Short,
        None => Hex4::Invalid,
    }
}

fn decode_unicode_escape(s: &str) -> UnicodeEscape {
    let high = match read_hex4(s) {
        Hex4::Value(code) => code,
        Hex4::Short => return UnicodeEscape::Incomplete,
        Hex4::Invalid => return UnicodeEscape::Invalid,
    };

    if !(0xD800..0xDC00).contains(&high) {
        let ch = char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER);
        return UnicodeEscape::Complete(ch, 4);
    }

    // High surrogate: the low half must follow as another `\uXXXX`
    let tail = &s[4..];
    if tail.is_empty() || tail == "\\" {
        return UnicodeEscape::Incomplete;
    }
    if let Some(low_digits) = tail.strip_prefix("\\u") {
        match read_hex4(low_digits) {
            Hex4::Short => return UnicodeEscape::Incomplete,
            Hex4::Value(low) if (0xDC00..0xE000).contains(&low) => {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                return UnicodeEscape::Complete(ch, 10);
            }
            _ => {}
        }
    }

    UnicodeEscape::Complete(char::REPLACEMENT_CHARACTER, 4)
}

/// First `{...}` substring whose braces balance, ignoring braces inside strings
pub fn first_balanced_object(text: &str) -> Option<&str> {
    balanced_objects(text).next()
}

/// Every balanced `{...}` substring, one per opening brace, in start order
pub fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_from(&text[start..]).map(|len| &text[start..start + len]))
}

fn balanced_from(candidate: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, byte) in candidate.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Full parse of completed model output
pub fn parse_full(text: &str) -> Extraction {
    for object in balanced_objects(text) {
        match serde_json::from_str::<Value>(object) {
            Ok(Value::Object(map)) if map.get("message").is_some_and(Value::is_string) => {
                return Extraction::Strict(map);
            }
            Ok(_) => tracing::debug!("Balanced object has no string message field"),
            Err(e) => tracing::debug!(error = %e, "Balanced candidate is not JSON"),
        }
    }

    if let Some(found) = MESSAGE_VALUE_START.find(text) {
        let scanned = scan_string_value(&text[found.end()..]);
        if !scanned.closed {
            tracing::debug!("Repaired message value is unterminated");
        }
        return Extraction::Repaired {
            message: scanned.value,
        };
    }

    Extraction::RawFallback {
        text: text.trim().to_string(),
    }
}

/// Best-effort `message` from a prefix of the model output
///
/// Text without a `"message"` key is returned trimmed so that any preamble
/// still shows progress. Once the key is present the result only ever grows
/// as the prefix grows.
pub fn parse_partial(text: &str) -> String {
    let Some(key) = text.find(MESSAGE_KEY) else {
        return text.trim().to_string();
    };

    let after_key = &text[key + MESSAGE_KEY.len()..];
    let Some(colon) = after_key.find(':') else {
        return String::new();
    };

    match after_key[colon + 1..].trim_start().strip_prefix('"') {
        Some(body) => scan_string_value(body).value,
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_basic_escapes() {
        let scanned = scan_string_value(r#"line\none \"two\"\tend" trailing"#);
        assert_eq!(scanned.value, "line\none \"two\"\tend");
        assert!(scanned.closed);
    }

    #[test]
    fn test_double_backslash_resolved_first() {
        let scanned = scan_string_value(r#"C:\\new\\table""#);
        assert_eq!(scanned.value, r"C:\new\table");
    }

    #[test]
    fn test_unicode_escapes() {
        assert_eq!(scan_string_value(r#"caf\u00e9""#).value, "café");
        assert_eq!(scan_string_value(r#"\ud83d\ude00""#).value, "😀");
        assert_eq!(scan_string_value(r#"\ud83d!""#).value, "\u{FFFD}!");
        assert_eq!(scan_string_value(r#"\uzzzz""#).value, "uzzzz");
    }

    #[test]
    fn test_dangling_escapes_are_dropped() {
        assert_eq!(scan_string_value("abc\\").value, "abc");
        assert_eq!(scan_string_value("abc\\u00").value, "abc");
        assert_eq!(scan_string_value("abc\\ud83d\\u").value, "abc");
        assert!(!scan_string_value("abc\\").closed);
    }

    #[test]
    fn test_first_balanced_object_is_string_aware() {
        let text = r#"Here: {"message": "a } brace", "n": {"x": 1}} tail"#;
        assert_eq!(
            first_balanced_object(text),
            Some(r#"{"message": "a } brace", "n": {"x": 1}}"#)
        );
        assert_eq!(first_balanced_object("no braces"), None);
        assert_eq!(first_balanced_object(r#"{"message": "open"#), None);
    }

    #[test]
    fn test_first_balanced_object_skips_unclosed_start() {
        let text = r#"{oops {"message":"hi"}"#;
        assert_eq!(first_balanced_object(text), Some(r#"{"message":"hi"}"#));
    }

    #[test]
    fn test_strict_tier_skips_non_json_braces() {
        let text = r#"Use {curly} braces like this: {"message":"hi","actions":[]}"#;
        match parse_full(text) {
            Extraction::Strict(map) => assert_eq!(map["message"], "hi"),
            other => panic!("expected strict extraction, got {other:?}"),
        }

        let objects: Vec<&str> = balanced_objects(r#"{a} {"b": {"c": 1}}"#).collect();
        assert_eq!(objects, vec!["{a}", r#"{"b": {"c": 1}}"#, r#"{"c": 1}"#]);
    }

    #[test]
    fn test_full_parse_tiers() {
        match parse_full(r#"{"message":"hello","actions":[]}"#) {
            Extraction::Strict(map) => assert_eq!(map["message"], "hello"),
            other => panic!("expected strict, got {other:?}"),
        }

        // Trailing comma breaks strict parsing
        let repaired = parse_full(r#"{"message": "hi \"there\"", "actions": [,]}"#);
        assert_eq!(
            repaired,
            Extraction::Repaired {
                message: "hi \"there\"".to_string()
            }
        );

        assert_eq!(
            parse_full("  just words  "),
            Extraction::RawFallback {
                text: "just words".to_string()
            }
        );
    }

    #[test]
    fn test_full_parse_without_string_message_falls_through() {
        assert_eq!(
            parse_full(r#"{"message": 42}"#),
            Extraction::RawFallback {
                text: r#"{"message": 42}"#.to_string()
            }
        );
    }

    #[test]
    fn test_partial_parse_truncated() {
        assert_eq!(parse_partial(r#"Sorry, {"message": "partial"#), "partial");
        assert_eq!(parse_partial(r#"{"message":"#), "");
        assert_eq!(parse_partial(r#"{"message""#), "");
        assert_eq!(parse_partial(r#"{"message": 12"#), "");
        assert_eq!(parse_partial("  Thinking about it  "), "Thinking about it");
    }
}
