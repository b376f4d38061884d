//! Lookup response types
//!
//! The service reports missing specifications with the literal string
//! `"unknown"`. Everything is validated here so the rest of the client only
//! sees [`SpecValue`] and never has to poke at raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Sentinel the backend uses for a value it could not find
const UNKNOWN: &str = "unknown";

/// Raw spec fields as the backend sends them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecFields {
    #[serde(rename = "FLOWNOM56", default)]
    pub flow: Option<Value>,
    #[serde(rename = "HEADNOM56", default)]
    pub head: Option<Value>,
    #[serde(rename = "PHASE", default)]
    pub phase: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Comparison {
    #[serde(default)]
    pub overall_label: Option<Value>,
    #[serde(default)]
    pub overall_confidence: Option<Value>,
}

/// `/api/lookup` response body
///
/// Every field is kept as raw JSON so one badly typed value cannot sink the
/// whole reply. Types are checked in `From<LookupResponse> for LookupResult`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub manufacturer: Option<Value>,
    #[serde(default)]
    pub prodname: Option<Value>,
    #[serde(default)]
    pub is_question: Option<Value>,
    #[serde(default)]
    pub web_result: Option<Value>,
    #[serde(default)]
    pub hybrid_comparison: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    /// Some deployments return the spec fields at the top level
    #[serde(flatten)]
    pub inline: SpecFields,
}

impl LookupResponse {
    /// Message the service attached to an unresolved lookup
    pub fn error_message(&self) -> Option<String> {
        text(self.error.as_ref())
    }
}

/// A single specification value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SpecValue {
    Number(f64),
    Text(String),
    Unknown,
}

impl SpecValue {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map(SpecValue::Number).unwrap_or(SpecValue::Unknown),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case(UNKNOWN) {
                    SpecValue::Unknown
                } else if let Ok(n) = s.parse::<f64>() {
                    SpecValue::Number(n)
                } else {
                    SpecValue::Text(s.to_string())
                }
            }
            _ => SpecValue::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SpecValue::Unknown)
    }

    /// Value with `unit` appended, or "N/A"
    pub fn display_with(&self, unit: &str) -> String {
        match self {
            SpecValue::Unknown => "N/A".to_string(),
            known => format!("{}{}", known, unit),
        }
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Number(n) => write!(f, "{}", n),
            SpecValue::Text(s) => write!(f, "{}", s),
            SpecValue::Unknown => write!(f, "{}", UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confidence {
    pub label: String,
    /// 0.0 to 1.0
    pub score: f64,
}

impl Confidence {
    /// Percentage rounded to one decimal place
    pub fn percent(&self) -> f64 {
        (self.score * 1000.0).round() / 10.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.label, self.percent())
    }
}

/// Validated lookup outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub flow: SpecValue,
    pub head: SpecValue,
    pub phase: SpecValue,
    pub confidence: Option<Confidence>,
    pub is_question: bool,
}

impl LookupResult {
    /// "manufacturer product" when the lookup resolved both
    pub fn product_title(&self) -> Option<String> {
        match (&self.manufacturer, &self.product) {
            (Some(m), Some(p)) => Some(format!("{} {}", m, p)),
            _ => None,
        }
    }

    pub fn flow_display(&self) -> String {
        self.flow.display_with(" m3/h")
    }

    pub fn head_display(&self) -> String {
        self.head.display_with(" m")
    }

    pub fn phase_display(&self) -> String {
        self.phase.display_with("-Phase")
    }

    /// Plain-text line stored in the conversation for this result
    pub fn summary(&self) -> String {
        let title = self
            .product_title()
            .or_else(|| self.product.clone())
            .unwrap_or_else(|| "Pump".to_string());

        format!(
            "[Specs] {} | Flow={} | Head={} | Phase={}",
            title, self.flow, self.head, self.phase
        )
    }
}

/// Strings and numbers as display text; anything else counts as absent
fn text(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(s).filter(|s| !s.is_empty())
}

/// JavaScript-style truthiness, which is how the service's own UI reads flags
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

impl From<LookupResponse> for LookupResult {
    fn from(response: LookupResponse) -> Self {
        let fields = response
            .web_result
            .and_then(|v| serde_json::from_value::<SpecFields>(v).ok())
            .unwrap_or(response.inline);

        let confidence = response
            .hybrid_comparison
            .and_then(|v| serde_json::from_value::<Comparison>(v).ok())
            .and_then(|c| {
                Some(Confidence {
                    label: text(c.overall_label.as_ref())?,
                    score: c.overall_confidence.as_ref()?.as_f64()?,
                })
            });

        Self {
            manufacturer: text(response.manufacturer.as_ref()),
            product: text(response.prodname.as_ref()),
            flow: SpecValue::from_json(fields.flow.as_ref()),
            head: SpecValue::from_json(fields.head.as_ref()),
            phase: SpecValue::from_json(fields.phase.as_ref()),
            confidence,
            is_question: truthy(response.is_question.as_ref()),
        }
    }
}
