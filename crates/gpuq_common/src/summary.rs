//! Post-pass summaries over a finished [`Aggregator`].
//!
//! Pure functions; device names are ordered lexicographically so the output
//! is deterministic.

use crate::requirement::Requirement;
use crate::waterfall::Aggregator;
use serde::Serialize;

/// Share of supported reports at or above which a device counts as
/// "still supported".
pub const WELL_SUPPORTED_PERCENT: usize = 90;

/// A device that lost reports to one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceLoss {
    pub device: String,
    pub failed: Vec<u64>,
    pub passed: Vec<u64>,
}

/// Devices lost to one requirement.
#[derive(Debug, Clone, Serialize)]
pub struct RequirementSummary {
    pub name: String,
    /// Devices that failed this requirement in every report that reached it.
    pub lost_all: Vec<DeviceLoss>,
    /// Devices that failed in some reports and passed in others.
    pub lost_some: Vec<DeviceLoss>,
}

impl RequirementSummary {
    pub fn loses_nothing(&self) -> bool {
        self.lost_all.is_empty() && self.lost_some.is_empty()
    }
}

/// A device with at least one fully supported report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSupport {
    pub device: String,
    pub supported: usize,
    pub total: usize,
}

impl DeviceSupport {
    pub fn ratio(&self) -> f64 {
        self.supported as f64 / self.total as f64
    }
}

/// Devices bucketed by support ratio. Devices with no supported report
/// appear in neither bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SupportSummary {
    pub well_supported: Vec<DeviceSupport>,
    pub partially_supported: Vec<DeviceSupport>,
}

/// Everything the renderer needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub device_count: usize,
    pub corpus_size: usize,
    pub requirements: Vec<RequirementSummary>,
    pub support: SupportSummary,
}

impl RunSummary {
    pub fn build(requirements: &[Requirement], agg: &Aggregator) -> Self {
        Self {
            device_count: agg.device_count(),
            corpus_size: agg.corpus_size(),
            requirements: requirement_summaries(requirements, agg),
            support: support_summary(agg),
        }
    }
}

/// One summary per requirement, in declared order.
pub fn requirement_summaries(requirements: &[Requirement], agg: &Aggregator) -> Vec<RequirementSummary> {
    requirements
        .iter()
        .zip(agg.outcomes())
        .map(|(rq, outcome)| {
            let mut lost_all = Vec::new();
            let mut lost_some = Vec::new();
            // BTreeMap iteration is already name-ordered.
            for (device, failed) in &outcome.failed {
                let loss = DeviceLoss {
                    device: device.clone(),
                    failed: failed.clone(),
                    passed: outcome.passed_for(device).to_vec(),
                };
                if loss.passed.is_empty() {
                    lost_all.push(loss);
                } else {
                    lost_some.push(loss);
                }
            }
            RequirementSummary {
                name: rq.name().to_string(),
                lost_all,
                lost_some,
            }
        })
        .collect()
}

pub fn support_summary(agg: &Aggregator) -> SupportSummary {
    let mut summary = SupportSummary::default();
    for (device, compliance) in agg.devices() {
        let supported = compliance.supported.len();
        let total = compliance.total();
        if supported == 0 {
            continue;
        }
        let entry = DeviceSupport {
            device: device.clone(),
            supported,
            total,
        };
        // Integer form of supported / total >= 0.9.
        if supported * 100 >= total * WELL_SUPPORTED_PERCENT {
            summary.well_supported.push(entry);
        } else {
            summary.partially_supported.push(entry);
        }
    }
    summary
}
