//! Device architecture classification.
//!
//! An architecture is a list of device groups; a group is a mask plus a set
//! of target ids. A device id belongs to the first architecture (in
//! declaration order) with any group where `id & mask` hits a target.
//!
//! The taxonomy file looks like:
//!
//! ```json
//! {"vendors": {"NVIDIA": {"id": "0x10DE", "devices": [
//!     {"mask": "0xFF00", "architecture": {"Ampere": ["0x2200", "0x2500"]}}
//! ]}}}
//! ```
//!
//! Names starting with `_` are comments and are skipped.

use crate::bitmask::matches_any;
use crate::error::{QueryError, Result};
use crate::literal::parse_int_literal;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Mask applied when a device group does not specify one.
pub const DEFAULT_DEVICE_MASK: u32 = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGroup {
    pub mask: u32,
    pub device_ids: BTreeSet<u32>,
}

impl DeviceGroup {
    pub fn new(mask: u32, device_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            mask,
            device_ids: device_ids.into_iter().collect(),
        }
    }

    pub fn matches(&self, device_id: u32) -> bool {
        matches_any(
            u64::from(device_id),
            u64::from(self.mask),
            self.device_ids.iter().map(|id| u64::from(*id)),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Architecture {
    pub name: String,
    pub groups: Vec<DeviceGroup>,
}

impl Architecture {
    pub fn matches(&self, device_id: u32) -> bool {
        self.groups.iter().any(|g| g.matches(device_id))
    }
}

/// Architectures of one vendor, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorTaxonomy {
    pub name: String,
    pub vendor_id: u32,
    pub architectures: Vec<Architecture>,
}

impl VendorTaxonomy {
    pub fn new(name: impl Into<String>, vendor_id: u32) -> Self {
        Self {
            name: name.into(),
            vendor_id,
            architectures: Vec::new(),
        }
    }

    /// Append a group to an architecture. Repeated names accumulate groups
    /// and keep the position of their first declaration.
    pub fn add_group(&mut self, architecture: &str, group: DeviceGroup) {
        match self.architectures.iter_mut().find(|a| a.name == architecture) {
            Some(arch) => arch.groups.push(group),
            None => self.architectures.push(Architecture {
                name: architecture.to_string(),
                groups: vec![group],
            }),
        }
    }

    /// First architecture matching `device_id`, if any.
    pub fn classify(&self, device_id: u32) -> Option<&str> {
        self.architectures
            .iter()
            .find(|a| a.matches(device_id))
            .map(|a| a.name.as_str())
    }

    /// Partition device ids into architectures.
    ///
    /// Architectures take their matches out of the unmatched set in
    /// declaration order, so overlapping masks resolve to the earliest
    /// declaration.
    pub fn classify_all(&self, device_ids: impl IntoIterator<Item = u32>) -> Classification {
        let mut unmatched: BTreeSet<u32> = device_ids.into_iter().collect();
        let mut by_architecture = Vec::with_capacity(self.architectures.len());

        for arch in &self.architectures {
            let matched: BTreeSet<u32> = unmatched.iter().copied().filter(|id| arch.matches(*id)).collect();
            unmatched.retain(|id| !matched.contains(id));
            by_architecture.push((arch.name.clone(), matched));
        }

        Classification {
            by_architecture,
            unmatched,
        }
    }
}

/// Result of partitioning device ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Every architecture in declaration order, with its ids ascending.
    pub by_architecture: Vec<(String, BTreeSet<u32>)>,
    pub unmatched: BTreeSet<u32>,
}

impl Classification {
    pub fn architecture_of(&self, device_id: u32) -> Option<&str> {
        self.by_architecture
            .iter()
            .find(|(_, ids)| ids.contains(&device_id))
            .map(|(name, _)| name.as_str())
    }

    pub fn matched_count(&self) -> usize {
        self.by_architecture.iter().map(|(_, ids)| ids.len()).sum()
    }
}

/// All vendors of a taxonomy, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    pub vendors: Vec<VendorTaxonomy>,
}

impl Taxonomy {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| QueryError::TaxonomySourceMalformed(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        let vendors = root
            .get("vendors")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("missing \"vendors\" object"))?;

        let mut taxonomy = Taxonomy::default();
        for (vendor_name, vendor_json) in vendors {
            if vendor_name.starts_with('_') {
                continue;
            }
            let id = vendor_json
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("vendor {vendor_name} has no id")))?;
            let mut vendor = VendorTaxonomy::new(vendor_name, parse_u32(id, vendor_name)?);

            let groups = vendor_json.get("devices").and_then(Value::as_array);
            for group_json in groups.into_iter().flatten() {
                let mask = match group_json.get("mask") {
                    Some(m) => parse_u32(m.as_str().unwrap_or_default(), vendor_name)?,
                    None => DEFAULT_DEVICE_MASK,
                };
                let Some(archs) = group_json.get("architecture").and_then(Value::as_object) else {
                    continue;
                };
                for (arch_name, ids_json) in archs {
                    if arch_name.starts_with('_') {
                        continue;
                    }
                    let ids = ids_json
                        .as_array()
                        .ok_or_else(|| malformed(format!("{vendor_name}/{arch_name} is not a list")))?
                        .iter()
                        .map(|v| parse_u32(v.as_str().unwrap_or_default(), arch_name))
                        .collect::<Result<Vec<u32>>>()?;
                    vendor.add_group(arch_name, DeviceGroup::new(mask, ids));
                }
            }
            taxonomy.add_vendor(vendor);
        }
        Ok(taxonomy)
    }

    /// Add a vendor; a vendor id seen before merges into the earlier entry.
    pub fn add_vendor(&mut self, vendor: VendorTaxonomy) {
        match self.vendors.iter_mut().find(|v| v.vendor_id == vendor.vendor_id) {
            Some(existing) => {
                for arch in vendor.architectures {
                    for group in arch.groups {
                        existing.add_group(&arch.name, group);
                    }
                }
            }
            None => self.vendors.push(vendor),
        }
    }

    pub fn vendor(&self, vendor_id: u32) -> Option<&VendorTaxonomy> {
        self.vendors.iter().find(|v| v.vendor_id == vendor_id)
    }

    /// Architecture of one device, or `None` when unmatched.
    pub fn classify(&self, vendor_id: u32, device_id: u32) -> Option<&str> {
        self.vendor(vendor_id)?.classify(device_id)
    }
}

fn parse_u32(literal: &str, context: &str) -> Result<u32> {
    parse_int_literal(literal)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| malformed(format!("{context}: invalid id {literal:?}")))
}

fn malformed(msg: impl Into<String>) -> QueryError {
    QueryError::TaxonomySourceMalformed(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPU_INFO: &str = r#"{
        "_comment": "reference taxonomy",
        "vendors": {
            "_doc": "ignored",
            "NVIDIA": {
                "id": "0x10DE",
                "devices": [
                    {"architecture": {"Ampere": ["0x2200"], "_note": "x"}},
                    {"mask": "0xFF00", "architecture": {"Turing": ["0x1E00"], "Ampere": ["0x2500"]}}
                ]
            },
            "Apple": {"id": "0x106b"}
        }
    }"#;

    #[test]
    fn test_parse_keeps_declaration_order_and_accumulates() {
        let t = Taxonomy::parse(GPU_INFO).unwrap();
        assert_eq!(t.vendors.len(), 2);
        let nv = t.vendor(0x10de).unwrap();
        assert_eq!(nv.name, "NVIDIA");
        let names: Vec<&str> = nv.architectures.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ampere", "Turing"]);
        assert_eq!(
            nv.architectures[0].groups,
            vec![DeviceGroup::new(0xFFFF, [0x2200]), DeviceGroup::new(0xFF00, [0x2500])]
        );
        assert!(t.vendor(0x106b).unwrap().architectures.is_empty());
    }

    #[test]
    fn test_classify_masked_groups() {
        let t = Taxonomy::parse(GPU_INFO).unwrap();
        assert_eq!(t.classify(0x10de, 0x2200), Some("Ampere"));
        assert_eq!(t.classify(0x10de, 0x2500), Some("Ampere"));
        assert_eq!(t.classify(0x10de, 0x2501), Some("Ampere"));
        assert_eq!(t.classify(0x10de, 0x2201), None);
        assert_eq!(t.classify(0x10de, 0x2301), None);
        assert_eq!(t.classify(0x10de, 0x1E87), Some("Turing"));
        assert_eq!(t.classify(0x8086, 0x2200), None);
    }

    #[test]
    fn test_classify_all_first_declaration_wins() {
        let mut v = VendorTaxonomy::new("X", 1);
        v.add_group("Broad", DeviceGroup::new(0xF000, [0x1000]));
        v.add_group("Narrow", DeviceGroup::new(0xFFFF, [0x1234]));
        let c = v.classify_all([0x1234, 0x1001, 0x2000]);
        assert_eq!(c.architecture_of(0x1234), Some("Broad"));
        assert_eq!(c.by_architecture[1].1, BTreeSet::new());
        assert_eq!(c.unmatched, BTreeSet::from([0x2000]));
        assert_eq!(c.matched_count(), 2);
    }

    #[test]
    fn test_malformed_taxonomy_is_fatal() {
        for bad in [
            "not json",
            r#"{"nothing": {}}"#,
            r#"{"vendors": {"A": {}}}"#,
            r#"{"vendors": {"A": {"id": "zz"}}}"#,
            r#"{"vendors": {"A": {"id": "1", "devices": [{"mask": "q", "architecture": {}}]}}}"#,
            r#"{"vendors": {"A": {"id": "1", "devices": [{"architecture": {"B": "0x1"}}]}}}"#,
        ] {
            let err = Taxonomy::parse(bad).unwrap_err();
            assert!(matches!(err, QueryError::TaxonomySourceMalformed(_)), "{bad}");
        }
    }
}
