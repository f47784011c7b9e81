//! Devices observed in the corpus, grouped by vendor id and device id.

use crate::error::{QueryError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Name recorded for reports that carry no device name.
pub const UNKNOWN_DEVICE_NAME: &str = "[unknown]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedDevice {
    /// Every device name reported under this id.
    pub names: BTreeSet<String>,
    /// Number of reports naming this id.
    pub count: usize,
}

/// Observed devices, `vendor_id -> device_id -> device`.
#[derive(Debug, Clone, Default)]
pub struct ObservedDevices {
    vendors: BTreeMap<u32, BTreeMap<u32, ObservedDevice>>,
}

/// The part of a report the device scan reads. Missing fields take
/// defaults instead of failing the report.
#[derive(Debug, Deserialize)]
struct IdentityDoc {
    #[serde(default)]
    properties: BTreeMap<String, Value>,
}

impl ObservedDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, vendor_id: u32, device_id: u32, name: &str) {
        let device = self.vendors.entry(vendor_id).or_default().entry(device_id).or_default();
        device.names.insert(name.to_string());
        device.count += 1;
    }

    /// Record one raw report. Malformed JSON is a recoverable error.
    pub fn record_text(&mut self, report_id: u64, text: &str) -> Result<()> {
        let doc: IdentityDoc = serde_json::from_str(text).map_err(|e| QueryError::malformed(report_id, e))?;
        let id = |key: &str| doc.properties.get(key).and_then(id_value).unwrap_or(0);
        let name = doc
            .properties
            .get("deviceName")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_DEVICE_NAME);
        self.record(id("vendorID"), id("deviceID"), name);
        Ok(())
    }

    pub fn vendor_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.vendors.keys().copied()
    }

    pub fn devices_of(&self, vendor_id: u32) -> Option<&BTreeMap<u32, ObservedDevice>> {
        self.vendors.get(&vendor_id)
    }

    pub fn device(&self, vendor_id: u32, device_id: u32) -> Option<&ObservedDevice> {
        self.vendors.get(&vendor_id)?.get(&device_id)
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }
}

fn id_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => crate::literal::parse_int_literal(s).and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_and_names() {
        let mut d = ObservedDevices::new();
        d.record_text(1, r#"{"properties": {"vendorID": 4318, "deviceID": 8708, "deviceName": "RTX 3080"}}"#)
            .unwrap();
        d.record_text(2, r#"{"properties": {"vendorID": 4318, "deviceID": 8708, "deviceName": "GeForce RTX 3080"}}"#)
            .unwrap();
        d.record_text(3, r#"{"properties": {"vendorID": 4318, "deviceID": 8708, "deviceName": "RTX 3080"}}"#)
            .unwrap();

        let dev = d.device(0x10de, 0x2204).unwrap();
        assert_eq!(dev.count, 3);
        assert_eq!(dev.names.len(), 2);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let mut d = ObservedDevices::new();
        d.record_text(1, r#"{"properties": {}}"#).unwrap();
        d.record_text(2, r#"{}"#).unwrap();
        let dev = d.device(0, 0).unwrap();
        assert_eq!(dev.count, 2);
        assert!(dev.names.contains(UNKNOWN_DEVICE_NAME));
    }

    #[test]
    fn test_malformed_is_recoverable() {
        let mut d = ObservedDevices::new();
        let err = d.record_text(4, "{\"properties\"").unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(d.vendor_count(), 0);
    }
}
