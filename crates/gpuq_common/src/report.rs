//! Raw capability report schema.
//!
//! Only the fields the analysis reads are typed; everything else in a report
//! is ignored. A document that does not fit this shape is a malformed corpus
//! entry and is skipped by the caller.

use crate::error::{QueryError, Result};
use crate::limits::Limits;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One parsed report document.
#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub properties: Properties,

    /// Flat core feature map (`robustBufferAccess: true`, or `1`).
    #[serde(default)]
    pub features: Map<String, Value>,

    /// `[formatId, {optimalTilingFeatures, linearTilingFeatures, ...}]` pairs.
    #[serde(default)]
    pub formats: Vec<(u32, FormatProperties)>,

    #[serde(default)]
    pub extensions: Vec<Extension>,

    #[serde(default)]
    pub queues: Vec<QueueFamily>,

    #[serde(default)]
    pub extended: Option<Extended>,

    /// Remaining top-level objects; version-gated blocks (`core11`, `core12`,
    /// ...) are read from here.
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    #[serde(rename = "apiVersion", deserialize_with = "lenient_u32")]
    pub api_version: u32,

    #[serde(rename = "deviceName")]
    pub device_name: String,

    #[serde(rename = "vendorID", alias = "vendorId", default, deserialize_with = "lenient_opt_u32")]
    pub vendor_id: Option<u32>,

    #[serde(rename = "deviceID", alias = "deviceId", default, deserialize_with = "lenient_opt_u32")]
    pub device_id: Option<u32>,

    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatProperties {
    #[serde(default)]
    pub optimal_tiling_features: u64,
    #[serde(default)]
    pub linear_tiling_features: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Extension {
    #[serde(rename = "extensionName")]
    pub extension_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct QueueFamily {
    #[serde(rename = "timestampValidBits", default)]
    pub timestamp_valid_bits: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extended {
    #[serde(default)]
    pub devicefeatures2: Vec<ExtendedFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedFeature {
    pub name: String,
    #[serde(default)]
    pub supported: Value,
}

impl Report {
    /// Parse one report. Any failure is a malformed corpus entry.
    pub fn parse(report_id: u64, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| QueryError::malformed(report_id, e))
    }

    /// Version-gated feature blocks (`core11`, `core12`, `core13`, ...).
    pub fn core_sections(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.sections.iter().filter_map(|(key, value)| {
            let suffix = key.strip_prefix("core")?;
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            value.as_object().map(|obj| (key.as_str(), obj))
        })
    }
}

/// Truthiness the way report producers use it: `true`, non-zero numbers
/// and non-empty strings.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

/// Ids are numbers in most reports; a few producers write them as strings.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_u32(&value).ok_or_else(|| serde::de::Error::custom(format!("expected a 32-bit integer, got {value}")))
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    value_to_u32(&value)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a 32-bit integer, got {value}")))
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => crate::literal::parse_int_literal(s).and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "properties": {
            "apiVersion": 4206842,
            "deviceName": "AMD RADV NAVI10 (ACO)",
            "vendorID": 4098,
            "deviceID": "0x731f",
            "limits": { "maxBoundDescriptorSets": 32 }
        },
        "features": { "robustBufferAccess": 1, "sparseBinding": false },
        "formats": [[126, {"linearTilingFeatures": 0, "optimalTilingFeatures": 513, "bufferFeatures": 0}]],
        "extensions": [{"extensionName": "VK_KHR_maintenance1", "specVersion": 2}],
        "queues": [{"timestampValidBits": 64, "queueCount": 1}],
        "core12": { "features": { "timelineSemaphore": true } },
        "core13": { "properties": {} },
        "coreish": { "features": { "bogus": true } },
        "extended": { "devicefeatures2": [{"name": "shaderFloat16", "supported": "true", "extension": "x"}] }
    }"#;

    #[test]
    fn test_parse_minimal_report() {
        let r = Report::parse(1, MINIMAL).unwrap();
        assert_eq!(r.properties.api_version, 4_206_842);
        assert_eq!(r.properties.vendor_id, Some(0x1002));
        assert_eq!(r.properties.device_id, Some(0x731f));
        assert_eq!(r.formats, vec![(126, FormatProperties { optimal_tiling_features: 513, linear_tiling_features: 0 })]);
        assert_eq!(r.extensions[0].extension_name, "VK_KHR_maintenance1");
        assert_eq!(r.queues[0].timestamp_valid_bits, Some(64));
        assert_eq!(r.extended.unwrap().devicefeatures2.len(), 1);
    }

    #[test]
    fn test_core_sections_only_numbered_blocks() {
        let r = Report::parse(1, MINIMAL).unwrap();
        let keys: Vec<&str> = r.core_sections().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["core12", "core13"]);
    }

    #[test]
    fn test_truncated_report_is_malformed() {
        let err = Report::parse(9, &MINIMAL[..40]).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_api_version_is_malformed() {
        let err = Report::parse(3, r#"{"properties": {"deviceName": "x"}}"#).unwrap_err();
        assert!(matches!(err, QueryError::CorpusEntryMalformed { report_id: 3, .. }));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&Value::from(1)));
        assert!(!is_truthy(&Value::from(0)));
        assert!(is_truthy(&Value::from(true)));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::from("")));
    }
}
