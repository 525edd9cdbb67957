// src/subscription/extract.rs
//! Format classification and record extraction.
//!
//! Strategies run in a fixed priority order and the first one producing
//! records wins:
//! 1. JSON array of objects → one structured profile per object.
//! 2. Speculative base64 decode of the whole payload.
//! 3. Line scan for recognized scheme prefixes on the (possibly decoded) text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::decode::decode;

/// Recognized URI schemes. Every line filter goes through [`has_scheme_prefix`].
pub const SCHEME_PREFIXES: [&str; 3] = ["vless://", "vmess://", "trojan://"];

/// Label used when a profile carries neither `remarks` nor `ps`.
pub const DEFAULT_PROFILE_LABEL: &str = "Advanced Profile";

static RE_LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("line-break regex compiles"));

/// Which extraction path produced the records of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    StructuredProfile,
    EncodedLineList,
    PlainLineList,
}

/// One extracted configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigRecord {
    /// A single `scheme://...` line, already trimmed.
    SchemeUri(String),
    /// A JSON object rendered for display/copy.
    Profile { label: String, body: String },
}

impl ConfigRecord {
    /// Canonical string form used for dedup and display.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigRecord::SchemeUri(uri) => f.write_str(uri),
            ConfigRecord::Profile { label, body } => write!(f, "# {label}\n{body}"),
        }
    }
}

/// True if the (already trimmed) line starts with a recognized scheme.
pub fn has_scheme_prefix(line: &str) -> bool {
    SCHEME_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Extract every configuration record from a raw payload.
pub fn extract(payload: &str) -> Vec<ConfigRecord> {
    classify_and_extract(payload).1
}

/// Like [`extract`], also reporting which path was taken.
pub fn classify_and_extract(payload: &str) -> (PayloadFormat, Vec<ConfigRecord>) {
    let profiles = extract_profiles(payload);
    if !profiles.is_empty() {
        return (PayloadFormat::StructuredProfile, profiles);
    }

    let working = decode(payload);
    let format = if working != payload {
        PayloadFormat::EncodedLineList
    } else {
        PayloadFormat::PlainLineList
    };
    (format, extract_lines(&working))
}

fn extract_profiles(payload: &str) -> Vec<ConfigRecord> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(payload) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|v| v.is_object())
        .filter_map(|obj| {
            let body = serde_json::to_string_pretty(obj).ok()?;
            Some(ConfigRecord::Profile {
                label: profile_label(obj).to_string(),
                body,
            })
        })
        .collect()
}

fn profile_label(obj: &Value) -> &str {
    ["remarks", "ps"]
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PROFILE_LABEL)
}

fn extract_lines(text: &str) -> Vec<ConfigRecord> {
    RE_LINE_BREAKS
        .split(text)
        .map(str::trim)
        .filter(|l| has_scheme_prefix(l))
        .map(|l| ConfigRecord::SchemeUri(l.to_string()))
        .collect()
}
