//! Extraction result envelope.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Outcome tag of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// The model answered and its payload was decoded.
    Success,
    /// The model answered but the text was not a JSON object; the raw text is kept.
    ParsedError,
    /// The model call itself failed.
    Error,
}

impl ExtractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::Success => "success",
            ExtractionStatus::ParsedError => "parsed_error",
            ExtractionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `extract` call.
///
/// `fields` always carries the canonical `url` and `status` keys; the
/// remaining keys depend on the status:
/// - `success`: the decoded payload's keys
/// - `parsed_error`: `raw_response` and `parse_error`
/// - `error`: `error` only
///
/// Serializes as the `fields` map.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    url: String,
    status: ExtractionStatus,
    fields: Map<String, Value>,
}

impl ExtractionResult {
    /// Merge a decoded payload over the `{url, status}` envelope.
    ///
    /// Payload keys named `url` or `status` never replace the envelope values.
    pub fn success(url: &str, payload: Map<String, Value>) -> Self {
        let mut fields = payload;
        Self::stamp(&mut fields, url, ExtractionStatus::Success);
        Self { url: url.to_string(), status: ExtractionStatus::Success, fields }
    }

    pub fn parsed_error(url: &str, raw_response: &str, parse_error: &str) -> Self {
        let mut fields = Map::new();
        Self::stamp(&mut fields, url, ExtractionStatus::ParsedError);
        fields.insert("raw_response".into(), Value::String(raw_response.to_string()));
        fields.insert("parse_error".into(), Value::String(parse_error.to_string()));
        Self { url: url.to_string(), status: ExtractionStatus::ParsedError, fields }
    }

    pub fn error(url: &str, error: &str) -> Self {
        let mut fields = Map::new();
        Self::stamp(&mut fields, url, ExtractionStatus::Error);
        fields.insert("error".into(), Value::String(error.to_string()));
        Self { url: url.to_string(), status: ExtractionStatus::Error, fields }
    }

    fn stamp(fields: &mut Map<String, Value>, url: &str, status: ExtractionStatus) {
        fields.insert("url".into(), Value::String(url.to_string()));
        fields.insert("status".into(), Value::String(status.as_str().to_string()));
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> ExtractionStatus {
        self.status
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Success
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
