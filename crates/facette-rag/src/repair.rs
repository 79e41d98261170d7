//! Generator-output repair.
//!
//! Text generators routinely wrap JSON in code fences, use curly or
//! single quotes, leak control characters, or drop the quotes around
//! object keys. Repair is an ordered chain of normalization passes, each
//! producing a candidate string; candidates are parsed in order and the
//! least-modified one that parses wins. The chain is independent of the
//! retry loop so it stays testable in isolation.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Accepted key spellings for the explanation field, probed in order.
const WHY_KEYS: [&str; 3] = ["why_it_matches", "whyItMatches", "whyItMatchesReasoning"];
/// Accepted key spellings for the caution field, probed in order.
const AWARENESS_KEYS: [&str; 4] = ["awareness", "Awareness", "warning", "tip"];

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```json|```").expect("static pattern"))
}

fn control_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x1f\x7f]").expect("static pattern"))
}

fn bare_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+):").expect("static pattern"))
}

/// Cumulative repair candidates, least-modified first.
fn candidates(raw: &str) -> Vec<String> {
    let mut out = Vec::new();

    let unfenced = fence_re().replace_all(raw, "").trim().to_string();
    out.push(unfenced.clone());

    let straight_quotes = unfenced
        .replace('\u{2019}', "'")
        .replace('\u{201c}', "\"")
        .replace('\u{201d}', "\"");
    out.push(straight_quotes.clone());

    let no_controls = control_re().replace_all(&straight_quotes, "").to_string();
    out.push(no_controls.clone());

    let quoted_keys = bare_key_re()
        .replace_all(&no_controls, "\"${1}\":")
        .to_string();
    out.push(quoted_keys.clone());

    // Last resort: single-quoted strings → double-quoted
    out.push(quoted_keys.replace('\'', "\""));

    out.dedup();
    out
}

/// Parse generator output, tolerating the common formatting defects.
/// Returns `None` only when no candidate parses.
pub fn parse_lenient(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    for candidate in candidates(raw) {
        if let Ok(value) = serde_json::from_str(&candidate) {
            return Some(value);
        }
    }
    None
}

/// Explanation and caution text recovered from a parsed response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub why_it_matches: String,
    pub awareness: String,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.why_it_matches.is_empty() && self.awareness.is_empty()
    }
}

/// Probe the explanation keys: only non-empty strings count.
fn why_from(obj: &serde_json::Map<String, Value>) -> Option<String> {
    for key in WHY_KEYS {
        if let Some(Value::String(s)) = obj.get(key) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Probe the caution keys; list and object values flatten to JSON text.
fn awareness_from(obj: &serde_json::Map<String, Value>) -> Option<String> {
    for key in AWARENESS_KEYS {
        match obj.get(key) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(value @ Value::Array(_)) | Some(value @ Value::Object(_)) => {
                let is_empty = match value {
                    Value::Array(items) => items.is_empty(),
                    Value::Object(map) => map.is_empty(),
                    _ => true,
                };
                if !is_empty {
                    return Some(value.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn collect(obj: &serde_json::Map<String, Value>, why: &mut Vec<String>, aware: &mut Vec<String>) {
    if let Some(w) = why_from(obj) {
        why.push(w);
    }
    if let Some(a) = awareness_from(obj) {
        aware.push(a);
    }
}

/// Extract the two recommendation fields from a parsed response, probing
/// the top-level object, a `steps` sub-list of objects, or a top-level
/// array of objects.
pub fn extract_fields(parsed: &Value) -> ExtractedFields {
    let mut why = Vec::new();
    let mut aware = Vec::new();

    match parsed {
        Value::Object(obj) => {
            collect(obj, &mut why, &mut aware);
            if let Some(Value::Array(steps)) = obj.get("steps") {
                for step in steps {
                    if let Value::Object(step_obj) = step {
                        collect(step_obj, &mut why, &mut aware);
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Value::Object(obj) = item {
                    collect(obj, &mut why, &mut aware);
                }
            }
        }
        _ => {}
    }

    ExtractedFields {
        why_it_matches: why.join(" "),
        awareness: aware.join(" "),
    }
}
