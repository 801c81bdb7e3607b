//! Frontmatter extraction: split the leading YAML header from the body.
//!
//! The header must start on the very first line:
//!
//! ```text
//! ---
//! title: Исследование протоколов
//! author: Иванов И.И.
//! ---
//! # Введение
//! ```
//!
//! Only the eleven [`Metadata`] keys are read; everything else in the header
//! is ignored. Values of any YAML type are coerced to strings so that
//! `year: 2024` and `work_number: 3` behave like their quoted forms.
//! A repeated key keeps its last value.

use crate::error::FrontmatterError;
use crate::model::Metadata;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, Visitor};
use serde_yaml::{Mapping, Number, Value};
use std::fmt;
use tracing::debug;

static RE_FRONTMATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A---[ \t\r]*\n((?s:.*?))\n---[ \t\r]*(?:\n|\z)").unwrap());

/// Split `text` into decoded metadata and the remaining Markdown body.
///
/// Without a header the whole text is returned as the body together with
/// empty metadata.
pub fn extract_frontmatter(text: &str) -> Result<(Metadata, &str), FrontmatterError> {
    let Some(caps) = RE_FRONTMATTER.captures(text) else {
        return Ok((Metadata::default(), text));
    };
    let header = caps.get(1).map_or("", |m| m.as_str());
    let body_start = caps.get(0).map_or(0, |m| m.end());

    let metadata = decode_header(header)?;
    debug!(
        "Frontmatter decoded: {} header bytes, body starts at {}",
        header.len(),
        body_start
    );
    Ok((metadata, &text[body_start..]))
}

/// Decode the YAML between the delimiters into [`Metadata`].
fn decode_header(header: &str) -> Result<Metadata, FrontmatterError> {
    if header.trim().is_empty() {
        return Ok(Metadata::default());
    }
    let LastWins(value) =
        serde_yaml::from_str(header).map_err(|e| FrontmatterError::new(e.to_string()))?;

    let mapping = match value {
        Value::Null => return Ok(Metadata::default()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(FrontmatterError::new(format!(
                "expected `key: value` lines, found {}",
                yaml_kind(&other)
            )))
        }
    };

    let mut metadata = Metadata::default();
    for (key, value) in &mapping {
        let Some(key) = key.as_str() else { continue };
        metadata.set(key, scalar_to_string(value));
    }
    Ok(metadata)
}

/// A YAML value decoded like [`Value`], except that a repeated mapping key
/// replaces the earlier entry instead of failing.
struct LastWins(Value);

impl<'de> Deserialize<'de> for LastWins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LastWinsVisitor)
    }
}

struct LastWinsVisitor;

impl<'de> Visitor<'de> for LastWinsVisitor {
    type Value = LastWins;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<LastWins, E> {
        Ok(LastWins(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<LastWins, E> {
        Ok(LastWins(Value::Number(Number::from(v))))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<LastWins, E> {
        Ok(LastWins(Value::Number(Number::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<LastWins, E> {
        Ok(LastWins(Value::Number(Number::from(v))))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<LastWins, E> {
        Ok(LastWins(Value::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<LastWins, E> {
        Ok(LastWins(Value::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<LastWins, E> {
        Ok(LastWins(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<LastWins, E> {
        Ok(LastWins(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<LastWins, D::Error> {
        LastWins::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<LastWins, A::Error> {
        let mut items = Vec::new();
        while let Some(LastWins(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(LastWins(Value::Sequence(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<LastWins, A::Error> {
        let mut mapping = Mapping::new();
        while let Some((LastWins(key), LastWins(value))) = map.next_entry()? {
            mapping.insert(key, value);
        }
        Ok(LastWins(Value::Mapping(mapping)))
    }

    // Tagged values (`!tag x`) arrive as enums.
    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<LastWins, A::Error> {
        Value::deserialize(de::value::EnumAccessDeserializer::new(data)).map(LastWins)
    }
}

/// Render any YAML value as the string the title page should show.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a plain string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header_returns_whole_text() {
        let text = "# Heading\n\nBody";
        let (meta, body) = extract_frontmatter(text).unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, text);
    }

    #[test]
    fn header_must_be_at_the_very_start() {
        let text = "\n---\ntitle: X\n---\nBody";
        let (meta, body) = extract_frontmatter(text).unwrap();
        assert!(meta.title.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn decodes_known_keys_and_ignores_others() {
        let text = "---\ntitle: X\nauthor: Y\ntags: [a, b]\n---\nBody";
        let (meta, body) = extract_frontmatter(text).unwrap();
        assert_eq!(meta.title, "X");
        assert_eq!(meta.author, "Y");
        assert!(meta.teacher.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn every_key_round_trips_as_string() {
        for key in Metadata::KEYS {
            let text = format!("---\n{key}: значение {key}\n---\n");
            let (meta, _) = extract_frontmatter(&text).unwrap();
            assert_eq!(meta.get(key), Some(format!("значение {key}").as_str()));
            for other in Metadata::KEYS.iter().filter(|k| **k != key) {
                assert_eq!(meta.get(other), Some(""), "{other} should be empty");
            }
        }
    }

    #[test]
    fn non_string_values_are_coerced() {
        let text = "---\nyear: 2024\nwork_number: 3\ntitle: true\nsubject:\n---\n";
        let (meta, _) = extract_frontmatter(text).unwrap();
        assert_eq!(meta.year, "2024");
        assert_eq!(meta.work_number, "3");
        assert_eq!(meta.title, "true");
        assert_eq!(meta.subject, "");
    }

    #[test]
    fn empty_header_is_empty_metadata() {
        let (meta, body) = extract_frontmatter("---\n\n---\nBody").unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn header_closing_at_end_of_input() {
        let (meta, body) = extract_frontmatter("---\ntitle: X\n---").unwrap();
        assert_eq!(meta.title, "X");
        assert_eq!(body, "");
    }

    #[test]
    fn crlf_line_endings() {
        let (meta, body) = extract_frontmatter("---\r\ntitle: X\r\n---\r\nBody").unwrap();
        assert_eq!(meta.title, "X");
        assert_eq!(body, "Body");
    }

    #[test]
    fn repeated_key_keeps_the_last_value() {
        let (meta, body) = extract_frontmatter("---\ntitle: A\nauthor: Y\ntitle: B\n---\nx").unwrap();
        assert_eq!(meta.title, "B");
        assert_eq!(meta.author, "Y");
        assert_eq!(body, "x");
    }

    #[test]
    fn repeated_keys_in_nested_values_are_accepted() {
        let text = "---\nextra:\n  a: 1\n  a: 2\ngroup: ИТ-21\n---\n";
        let (meta, _) = extract_frontmatter(text).unwrap();
        assert_eq!(meta.group, "ИТ-21");
    }

    #[test]
    fn malformed_header_is_an_error() {
        let err = extract_frontmatter("---\n: : :\n---\nBody").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("YAML"), "got: {msg}");
        assert!(!err.cause.is_empty());
    }

    #[test]
    fn scalar_header_is_an_error() {
        let err = extract_frontmatter("---\njust a sentence\n---\nBody").unwrap_err();
        assert!(err.cause.contains("plain string"), "got: {}", err.cause);
    }
}
