//! Requirements: named, stateless predicates over a capability view.
//!
//! A requirement holds no per-run state. Outcomes are recorded by the
//! [`Aggregator`](crate::waterfall::Aggregator), keyed by the requirement's
//! position in the declared sequence, so the same list can drive any number
//! of runs.
//!
//! Predicates must tolerate missing data: every accessor on
//! [`CapabilityView`] returns an `Option`, and a limit that is absent from a
//! report fails the requirement that reads it.

use crate::bitmask::has_all_bits;
use crate::report::FormatProperties;
use crate::view::CapabilityView;
use std::collections::BTreeMap;
use std::fmt;

type Predicate = Box<dyn Fn(&CapabilityView) -> bool + Send + Sync>;

/// One minimum-capability rule.
pub struct Requirement {
    name: String,
    predicate: Predicate,
}

impl Requirement {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&CapabilityView) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passes(&self, view: &CapabilityView) -> bool {
        (self.predicate)(view)
    }

    /// `limits[name] >= threshold`.
    pub fn min_limit(name: &str, threshold: i64) -> Self {
        let limit = name.to_string();
        Self::new(format!("{name} >= {threshold}"), move |view| {
            view.limits.scalar(&limit).map_or(false, |v| v >= threshold as f64)
        })
    }

    /// `parse_int_literal(limits[name]) <= threshold`, for limits reported as
    /// radix-prefixed strings.
    pub fn max_limit(name: &str, threshold: i64) -> Self {
        let limit = name.to_string();
        Self::new(format!("{name} <= {threshold}"), move |view| {
            view.limits.literal(&limit).map_or(false, |v| v <= threshold)
        })
    }

    /// `limits[name] & bits == bits`.
    pub fn bits_limit(name: &str, bits: u64) -> Self {
        let limit = name.to_string();
        Self::new(format!("{name} has bits 0b{bits:b}"), move |view| {
            view.limits.flags(&limit).map_or(false, |v| has_all_bits(v, bits))
        })
    }

    /// Component `index` of a tuple limit compared against a floor.
    pub fn min_component(name: &str, index: usize, threshold: f64) -> Self {
        let limit = name.to_string();
        Self::new(format!("{name}[{index}] >= {threshold}"), move |view| {
            view.limits.component(&limit, index).map_or(false, |v| v >= threshold)
        })
    }

    /// Component `index` of a tuple limit compared against a ceiling.
    pub fn max_component(name: &str, index: usize, threshold: f64) -> Self {
        let limit = name.to_string();
        Self::new(format!("{name}[{index}] <= {threshold}"), move |view| {
            view.limits.component(&limit, index).map_or(false, |v| v <= threshold)
        })
    }

    /// Every component of a tuple limit meets its own floor.
    pub fn min_components(name: &str, thresholds: &[f64]) -> Self {
        let limit = name.to_string();
        let floors = thresholds.to_vec();
        let shown: Vec<String> = thresholds.iter().map(|t| t.to_string()).collect();
        Self::new(format!("{name} >= [{}]", shown.join(",")), move |view| {
            floors
                .iter()
                .enumerate()
                .all(|(i, floor)| view.limits.component(&limit, i).map_or(false, |v| v >= *floor))
        })
    }

    /// The named feature is reported as supported.
    pub fn feature(name: &str) -> Self {
        let feature = name.to_string();
        Self::new(name, move |view| view.has_feature(&feature))
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement").field("name", &self.name).finish()
    }
}

/// Which tiling-features field a format check reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tiling {
    Optimal,
    Linear,
}

impl Tiling {
    fn features(self, props: &FormatProperties) -> u64 {
        match self {
            Tiling::Optimal => props.optimal_tiling_features,
            Tiling::Linear => props.linear_tiling_features,
        }
    }
}

/// True iff `format` is present and its `tiling` features contain all `flags`.
pub fn format_supported_with_tiling_features(
    formats: &BTreeMap<u32, FormatProperties>,
    format: u32,
    flags: u64,
    tiling: Tiling,
) -> bool {
    formats
        .get(&format)
        .map_or(false, |props| has_all_bits(tiling.features(props), flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;

    fn view(limits: &str) -> CapabilityView {
        let text = format!(
            r#"{{"properties": {{"apiVersion": 4198400, "deviceName": "Test GPU", "limits": {limits}}},
                "features": {{"robustBufferAccess": true}},
                "formats": [[126, {{"optimalTilingFeatures": 515, "linearTilingFeatures": 1}}]]}}"#
        );
        CapabilityView::from_report(&Report::parse(1, &text).unwrap())
    }

    #[test]
    fn test_min_limit() {
        let rq = Requirement::min_limit("maxBoundDescriptorSets", 4);
        assert_eq!(rq.name(), "maxBoundDescriptorSets >= 4");
        assert!(rq.passes(&view(r#"{"maxBoundDescriptorSets": 4}"#)));
        assert!(!rq.passes(&view(r#"{"maxBoundDescriptorSets": 3}"#)));
    }

    #[test]
    fn test_missing_limit_fails() {
        let rq = Requirement::min_limit("maxBoundDescriptorSets", 4);
        assert!(!rq.passes(&view("{}")));
    }

    #[test]
    fn test_max_limit_parses_radix() {
        let rq = Requirement::max_limit("minUniformBufferOffsetAlignment", 256);
        assert_eq!(rq.name(), "minUniformBufferOffsetAlignment <= 256");
        assert!(rq.passes(&view(r#"{"minUniformBufferOffsetAlignment": "0x100"}"#)));
        assert!(!rq.passes(&view(r#"{"minUniformBufferOffsetAlignment": "0x200"}"#)));
        assert!(rq.passes(&view(r#"{"minUniformBufferOffsetAlignment": 64}"#)));
    }

    #[test]
    fn test_bits_limit() {
        let rq = Requirement::bits_limit("framebufferColorSampleCounts", 0b101);
        assert_eq!(rq.name(), "framebufferColorSampleCounts has bits 0b101");
        assert!(rq.passes(&view(r#"{"framebufferColorSampleCounts": 15}"#)));
        assert!(!rq.passes(&view(r#"{"framebufferColorSampleCounts": 3}"#)));
    }

    #[test]
    fn test_components() {
        let v = view(r#"{"maxComputeWorkGroupSize": [1024, 1024, 64], "viewportBoundsRange": [-16384, 16383]}"#);
        assert!(Requirement::min_components("maxComputeWorkGroupSize", &[256.0, 256.0, 64.0]).passes(&v));
        assert!(!Requirement::min_components("maxComputeWorkGroupSize", &[256.0, 256.0, 65.0]).passes(&v));
        assert!(Requirement::max_component("viewportBoundsRange", 0, -8192.0).passes(&v));
        assert!(Requirement::min_component("viewportBoundsRange", 1, 8192.0).passes(&v));
        assert_eq!(
            Requirement::min_components("maxComputeWorkGroupSize", &[256.0, 256.0, 64.0]).name(),
            "maxComputeWorkGroupSize >= [256,256,64]"
        );
    }

    #[test]
    fn test_feature() {
        let v = view("{}");
        assert!(Requirement::feature("robustBufferAccess").passes(&v));
        assert!(!Requirement::feature("imageCubeArray").passes(&v));
    }

    #[test]
    fn test_format_tiling() {
        let v = view("{}");
        assert!(format_supported_with_tiling_features(&v.formats, 126, 0b11, Tiling::Optimal));
        assert!(!format_supported_with_tiling_features(&v.formats, 126, 0b11, Tiling::Linear));
        assert!(!format_supported_with_tiling_features(&v.formats, 124, 0, Tiling::Optimal));
    }
}
