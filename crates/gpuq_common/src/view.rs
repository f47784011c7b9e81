//! Capability view: the normalized, query-friendly projection of one report.
//!
//! Built once per report and never mutated afterwards. Requirement
//! predicates only ever see this type, never the raw document.

use crate::limits::Limits;
use crate::report::{is_truthy, FormatProperties, QueueFamily, Report};
use crate::version::ApiVersion;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Normalized capabilities of one sampled device.
#[derive(Debug, Clone)]
pub struct CapabilityView {
    /// Device name with driver-backend annotations stripped.
    pub device_name: String,
    pub api_version: ApiVersion,
    /// Every feature reported as supported, from all feature sources.
    pub features: BTreeSet<String>,
    pub formats: BTreeMap<u32, FormatProperties>,
    pub limits: Limits,
    pub extensions: BTreeSet<String>,
    pub queues: Vec<QueueFamily>,
    pub vendor_id: Option<u32>,
    pub device_id: Option<u32>,
}

impl CapabilityView {
    /// Project a parsed report.
    ///
    /// Features are merged from the flat feature map, the `features` object
    /// of every numbered core block, and supported `extended.devicefeatures2`
    /// entries.
    pub fn from_report(report: &Report) -> Self {
        let mut features: BTreeSet<String> = truthy_keys(&report.features).collect();

        for (_, section) in report.core_sections() {
            if let Some(core_features) = section.get("features").and_then(|v| v.as_object()) {
                features.extend(truthy_keys(core_features));
            }
        }

        if let Some(extended) = &report.extended {
            features.extend(
                extended
                    .devicefeatures2
                    .iter()
                    .filter(|f| is_truthy(&f.supported))
                    .map(|f| f.name.clone()),
            );
        }

        Self {
            device_name: normalize_device_name(&report.properties.device_name),
            api_version: ApiVersion::decode(report.properties.api_version),
            features,
            formats: report.formats.iter().copied().collect(),
            limits: report.properties.limits.clone(),
            extensions: report.extensions.iter().map(|e| e.extension_name.clone()).collect(),
            queues: report.queues.clone(),
            vendor_id: report.properties.vendor_id,
            device_id: report.properties.device_id,
        }
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains(name)
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn format(&self, format_id: u32) -> Option<&FormatProperties> {
        self.formats.get(&format_id)
    }

    /// Whether any queue family supports timestamps.
    pub fn has_timestamp_queue(&self) -> bool {
        self.queues.iter().any(|q| q.timestamp_valid_bits.unwrap_or(0) > 0)
    }
}

fn truthy_keys(map: &serde_json::Map<String, serde_json::Value>) -> impl Iterator<Item = String> + '_ {
    map.iter().filter(|(_, v)| is_truthy(v)).map(|(k, _)| k.clone())
}

/// Strip driver-backend annotations such as `" (ACO)"` or
/// `" (LLVM 15.0.7, 256 bits)"` so that reports from the same device group
/// together regardless of shader compiler.
pub fn normalize_device_name(name: &str) -> String {
    static BACKEND: OnceLock<Regex> = OnceLock::new();
    let re = BACKEND.get_or_init(|| {
        Regex::new(r" \((?:LLVM|ACO|Subzero)[^)]*\)").expect("Failed to compile backend annotation pattern")
    });
    re.replace_all(name, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(extra: &str) -> Report {
        let text = format!(
            r#"{{
                "properties": {{
                    "apiVersion": 4198400,
                    "deviceName": "llvmpipe (LLVM 15.0.7, 256 bits)",
                    "limits": {{}}
                }},
                "features": {{ "robustBufferAccess": true, "geometryShader": 0 }},
                "formats": [[126, {{"optimalTilingFeatures": 3, "linearTilingFeatures": 1}}]],
                "extensions": [{{"extensionName": "VK_KHR_swapchain"}}]
                {extra}
            }}"#
        );
        Report::parse(1, &text).unwrap()
    }

    #[test]
    fn test_flat_features_truthy_only() {
        let view = CapabilityView::from_report(&report(""));
        assert!(view.has_feature("robustBufferAccess"));
        assert!(!view.has_feature("geometryShader"));
    }

    #[test]
    fn test_core_and_extended_features_merged() {
        let view = CapabilityView::from_report(&report(
            r#", "core11": {"features": {"multiview": true, "protectedMemory": false}},
                 "core13": {"features": {"dynamicRendering": 1}},
                 "extended": {"devicefeatures2": [
                    {"name": "shaderFloat16", "supported": true},
                    {"name": "shaderInt8", "supported": false}
                 ]}"#,
        ));
        assert!(view.has_feature("multiview"));
        assert!(view.has_feature("dynamicRendering"));
        assert!(view.has_feature("shaderFloat16"));
        assert!(!view.has_feature("protectedMemory"));
        assert!(!view.has_feature("shaderInt8"));
    }

    #[test]
    fn test_view_fields() {
        let view = CapabilityView::from_report(&report(r#", "queues": [{"timestampValidBits": 0}, {"timestampValidBits": 36}]"#));
        assert_eq!(view.device_name, "llvmpipe");
        assert_eq!(view.api_version.major, 1);
        assert_eq!(view.api_version.minor, 1);
        assert_eq!(view.format(126).map(|f| f.optimal_tiling_features), Some(3));
        assert!(view.has_extension("VK_KHR_swapchain"));
        assert!(view.has_timestamp_queue());
    }

    #[test]
    fn test_normalize_device_name() {
        assert_eq!(normalize_device_name("AMD RADV NAVI10 (ACO)"), "AMD RADV NAVI10");
        assert_eq!(normalize_device_name("AMD RADV POLARIS10 (LLVM 12.0.0)"), "AMD RADV POLARIS10");
        assert_eq!(normalize_device_name("SwiftShader Device (Subzero)"), "SwiftShader Device");
        assert_eq!(normalize_device_name("NVIDIA GeForce RTX 3080 (Laptop)"), "NVIDIA GeForce RTX 3080 (Laptop)");
        assert_eq!(normalize_device_name("Intel(R) UHD Graphics 620"), "Intel(R) UHD Graphics 620");
    }
}
