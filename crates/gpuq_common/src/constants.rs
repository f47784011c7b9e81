//! Reference constants from the API registry (`vk.xml`).
//!
//! Requirements name formats and flag bits symbolically; this module turns
//! those names into integers. A registry that cannot be parsed is fatal.

use crate::error::{QueryError, Result};
use crate::literal::parse_int_literal;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Named integer constants, grouped by enum.
#[derive(Debug, Clone, Default)]
pub struct VkConstants {
    /// `VK_FORMAT_D32_SFLOAT` is stored as `D32_SFLOAT`.
    pub formats: BTreeMap<String, u32>,
    /// `VK_FORMAT_FEATURE_SAMPLED_IMAGE_BIT` is stored as `SAMPLED_IMAGE`.
    pub format_features: BTreeMap<String, u64>,
    /// `VK_SAMPLE_COUNT_4_BIT` is stored as `4`.
    pub sample_counts: BTreeMap<String, u64>,
}

impl VkConstants {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| QueryError::ConstantSourceMalformed(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| QueryError::ConstantSourceMalformed(e.to_string()))?;
        let mut constants = VkConstants::default();

        for group in doc.descendants().filter(|n| n.has_tag_name("enums")) {
            let Some(group_name) = group.attribute("name") else {
                continue;
            };
            let entries = group.children().filter(|n| n.has_tag_name("enum"));
            match group_name {
                "VkFormat" => {
                    for e in entries {
                        if let (Some(name), Some(value)) = (e.attribute("name"), e.attribute("value")) {
                            let short = strip(name, "VK_FORMAT_", "");
                            let value = parse_int_literal(value)
                                .and_then(|v| u32::try_from(v).ok())
                                .ok_or_else(|| malformed(name, value))?;
                            constants.formats.insert(short.to_string(), value);
                        }
                    }
                }
                "VkFormatFeatureFlagBits" => {
                    for e in entries {
                        if let Some((name, bit)) = bit_entry(&e)? {
                            constants
                                .format_features
                                .insert(strip(name, "VK_FORMAT_FEATURE_", "_BIT").to_string(), bit);
                        }
                    }
                }
                "VkSampleCountFlagBits" => {
                    for e in entries {
                        if let Some((name, bit)) = bit_entry(&e)? {
                            constants
                                .sample_counts
                                .insert(strip(name, "VK_SAMPLE_COUNT_", "_BIT").to_string(), bit);
                        }
                    }
                }
                _ => {}
            }
        }

        debug!(
            formats = constants.formats.len(),
            format_features = constants.format_features.len(),
            sample_counts = constants.sample_counts.len(),
            "loaded reference constants"
        );
        Ok(constants)
    }

    pub fn format(&self, name: &str) -> Result<u32> {
        self.formats.get(name).copied().ok_or_else(|| unknown("format", name))
    }

    pub fn format_feature(&self, name: &str) -> Result<u64> {
        self.format_features
            .get(name)
            .copied()
            .ok_or_else(|| unknown("format feature", name))
    }

    pub fn sample_count(&self, name: &str) -> Result<u64> {
        self.sample_counts
            .get(name)
            .copied()
            .ok_or_else(|| unknown("sample count", name))
    }
}

/// `(name, 1 << bitpos)`; alias entries carry no bitpos and are skipped.
fn bit_entry<'a>(node: &roxmltree::Node<'a, '_>) -> Result<Option<(&'a str, u64)>> {
    let (Some(name), Some(bitpos)) = (node.attribute("name"), node.attribute("bitpos")) else {
        return Ok(None);
    };
    let bit = bitpos
        .parse::<u32>()
        .ok()
        .and_then(|pos| 1u64.checked_shl(pos))
        .ok_or_else(|| malformed(name, bitpos))?;
    Ok(Some((name, bit)))
}

fn strip<'a>(name: &'a str, prefix: &str, suffix: &str) -> &'a str {
    let name = name.strip_prefix(prefix).unwrap_or(name);
    name.strip_suffix(suffix).unwrap_or(name)
}

fn malformed(name: &str, value: &str) -> QueryError {
    QueryError::ConstantSourceMalformed(format!("{name} has invalid value {value:?}"))
}

fn unknown(namespace: &'static str, name: &str) -> QueryError {
    QueryError::UnknownConstant {
        namespace,
        name: name.to_string(),
    }
}
