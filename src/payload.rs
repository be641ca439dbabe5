//! Canonical JSON payload: the cleartext metadata object before ECC,
//! encryption, and bit-packing (§3, §4.4).
//!
//! [`build`] emits compact JSON (no inserted whitespace) with keys in
//! lexicographic order, relying on `serde_json`'s default map
//! representation (a `BTreeMap`, since this crate does not enable the
//! `preserve_order` feature) rather than sorting by hand. [`parse`] is the
//! exact inverse: `parse(build(x)) == x` for every representable `x`,
//! including fields this crate doesn't know the name of — those round-trip
//! untouched.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

pub const FIELD_COPYRIGHT: &str = "copyright";
pub const FIELD_AUTHOR: &str = "author";
pub const FIELD_AI_TOOL: &str = "ai_tool";
pub const FIELD_AI_GENERATED: &str = "ai_generated";
pub const FIELD_TRUTHMARK_ID: &str = "truthmark_id";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_AI_COMPLIANCE: &str = "ai_compliance";
pub const FIELD_FINGERPRINT: &str = "fingerprint";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("custom field keys must start with \"custom_\", got {0:?}")]
    InvalidCustomKey(String),

    #[error("payload bytes are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload root must be a JSON object")]
    NotAnObject,
}

/// A parsed or assembled cleartext payload. Backed by a `BTreeMap` so the
/// declared field set (`copyright`, `author`, ...) and any unrecognized
/// fields live side by side and round-trip identically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayloadFields {
    map: BTreeMap<String, JsonValue>,
}

impl PayloadFields {
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(JsonValue::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).and_then(JsonValue::as_bool)
    }

    pub fn copyright(&self) -> Option<&str> {
        self.get_str(FIELD_COPYRIGHT)
    }

    pub fn author(&self) -> Option<&str> {
        self.get_str(FIELD_AUTHOR)
    }

    pub fn ai_tool(&self) -> Option<&str> {
        self.get_str(FIELD_AI_TOOL)
    }

    pub fn ai_generated(&self) -> Option<bool> {
        self.get_bool(FIELD_AI_GENERATED)
    }

    pub fn truthmark_id(&self) -> Option<&str> {
        self.get_str(FIELD_TRUTHMARK_ID)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.get_str(FIELD_TIMESTAMP)
    }

    pub fn ai_compliance(&self) -> Option<&JsonValue> {
        self.get(FIELD_AI_COMPLIANCE)
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.get_str(FIELD_FINGERPRINT)
    }

    /// Iterates all fields, declared and unrecognized alike, in the same
    /// lexicographic order [`build`] serializes them in.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Assembles a [`PayloadFields`] from typed setters, mirroring the
/// metadata-builder shape this crate's payload handling grew out of, but
/// over a plain JSON object rather than a private binary encoding.
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    map: BTreeMap<String, JsonValue>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copyright(mut self, value: impl Into<String>) -> Self {
        self.map
            .insert(FIELD_COPYRIGHT.to_string(), JsonValue::String(value.into()));
        self
    }

    pub fn author(mut self, value: impl Into<String>) -> Self {
        self.map
            .insert(FIELD_AUTHOR.to_string(), JsonValue::String(value.into()));
        self
    }

    pub fn ai_tool(mut self, value: impl Into<String>) -> Self {
        self.map
            .insert(FIELD_AI_TOOL.to_string(), JsonValue::String(value.into()));
        self
    }

    pub fn ai_generated(mut self, value: bool) -> Self {
        self.map
            .insert(FIELD_AI_GENERATED.to_string(), JsonValue::Bool(value));
        self
    }

    pub fn truthmark_id(mut self, value: impl Into<String>) -> Self {
        self.map
            .insert(FIELD_TRUTHMARK_ID.to_string(), JsonValue::String(value.into()));
        self
    }

    /// Generates a fresh random v4 UUID for `truthmark_id`, as
    /// `original_source/sdk/embedder.py`'s `embed()` does when the caller
    /// doesn't supply one.
    pub fn with_generated_truthmark_id(self) -> Self {
        self.truthmark_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn timestamp(mut self, value: impl Into<String>) -> Self {
        self.map
            .insert(FIELD_TIMESTAMP.to_string(), JsonValue::String(value.into()));
        self
    }

    /// Stamps `timestamp` with the current UTC time in ISO-8601 (RFC 3339).
    pub fn with_current_timestamp(self, now: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp(now.to_rfc3339())
    }

    pub fn ai_compliance(mut self, value: JsonValue) -> Self {
        self.map.insert(FIELD_AI_COMPLIANCE.to_string(), value);
        self
    }

    pub fn fingerprint(mut self, value: impl Into<String>) -> Self {
        self.map
            .insert(FIELD_FINGERPRINT.to_string(), JsonValue::String(value.into()));
        self
    }

    /// Inserts an arbitrary field. Keys outside the declared field set must
    /// use the `custom_` prefix (§3); declared field names bypass this
    /// check via their dedicated setters above.
    pub fn custom_field(mut self, key: impl Into<String>, value: JsonValue) -> Result<Self, PayloadError> {
        let key = key.into();
        if !key.starts_with("custom_") {
            return Err(PayloadError::InvalidCustomKey(key));
        }
        self.map.insert(key, value);
        Ok(self)
    }

    pub fn build(self) -> PayloadFields {
        PayloadFields { map: self.map }
    }
}

/// Serializes `fields` to compact, lexicographically-keyed JSON bytes.
pub fn build(fields: &PayloadFields) -> Vec<u8> {
    // serde_json's Map is backed by a BTreeMap without the "preserve_order"
    // feature, so `to_vec` already emits keys in sorted order.
    serde_json::to_vec(&fields.map).expect("a map of JSON values always serializes")
}

/// Parses bytes produced by [`build`] (or any compact canonical-JSON object
/// with this field set) back into [`PayloadFields`]. Unrecognized keys are
/// preserved rather than rejected.
pub fn parse(bytes: &[u8]) -> Result<PayloadFields, PayloadError> {
    let value: JsonValue = serde_json::from_slice(bytes)?;
    match value {
        JsonValue::Object(map) => Ok(PayloadFields {
            map: map.into_iter().collect(),
        }),
        _ => Err(PayloadError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_is_exact() {
        let fields = PayloadBuilder::new()
            .copyright("(c) 2026 Example Corp")
            .author("jdoe")
            .ai_tool("rastermark-demo")
            .ai_generated(true)
            .truthmark_id("11111111-1111-4111-8111-111111111111")
            .timestamp("2026-07-30T00:00:00Z")
            .build();

        let bytes = build(&fields);
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed, fields);
    }

    #[test]
    fn serialization_is_compact_and_sorted() {
        let fields = PayloadBuilder::new()
            .timestamp("2026-07-30T00:00:00Z")
            .author("a")
            .build();

        let bytes = build(&fields);
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains(' '), "must be compact: {text}");
        // "author" sorts before "timestamp" lexicographically.
        assert!(text.find("author").unwrap() < text.find("timestamp").unwrap());
    }

    #[test]
    fn unknown_fields_round_trip() {
        let input = br#"{"author":"a","mystery_field":42}"#;
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.get("mystery_field"), Some(&JsonValue::from(42)));

        let rebuilt = build(&parsed);
        let reparsed = parse(&rebuilt).unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn custom_field_requires_prefix() {
        let result = PayloadBuilder::new().custom_field("not_prefixed", JsonValue::Bool(true));
        assert!(matches!(result, Err(PayloadError::InvalidCustomKey(_))));
    }

    #[test]
    fn custom_field_with_prefix_succeeds() {
        let fields = PayloadBuilder::new()
            .custom_field("custom_prompt_hash", JsonValue::String("abc123".into()))
            .unwrap()
            .build();
        assert_eq!(
            fields.get("custom_prompt_hash"),
            Some(&JsonValue::String("abc123".into()))
        );
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(parse(b"[1,2,3]"), Err(PayloadError::NotAnObject)));
    }
}
