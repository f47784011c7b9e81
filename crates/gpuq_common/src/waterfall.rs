//! Requirement waterfall evaluation.
//!
//! Every report runs through the requirement list in declared order. The
//! first requirement a report fails is the only one it is charged to;
//! evaluation stops there. This answers "which single requirement, if
//! adopted, would first exclude this device".
//!
//! All outcomes land in one [`Aggregator`], constructed by the caller before
//! the pass and read only after it completes.

use crate::corpus::{CorpusEntry, ReportCorpus};
use crate::error::QueryError;
use crate::report::Report;
use crate::requirement::Requirement;
use crate::view::CapabilityView;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Report ids per device name, in evaluation order.
pub type IdsByDevice = BTreeMap<String, Vec<u64>>;

/// Terminal state of one report's walk down the waterfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVerdict {
    /// Passed every requirement.
    Supported,
    /// Failed the requirement at this index; later requirements were not evaluated.
    FailedAt(usize),
}

/// Pass/fail report ids for one requirement.
#[derive(Debug, Clone, Default)]
pub struct RequirementOutcome {
    pub passed: IdsByDevice,
    pub failed: IdsByDevice,
}

impl RequirementOutcome {
    pub fn passed_for(&self, device: &str) -> &[u64] {
        self.passed.get(device).map_or(&[], Vec::as_slice)
    }

    pub fn failed_for(&self, device: &str) -> &[u64] {
        self.failed.get(device).map_or(&[], Vec::as_slice)
    }
}

/// Overall compliance for one device name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCompliance {
    /// Reports that passed every requirement.
    pub supported: Vec<u64>,
    /// Reports that failed at least one requirement.
    pub unsupported: Vec<u64>,
}

impl DeviceCompliance {
    pub fn total(&self) -> usize {
        self.supported.len() + self.unsupported.len()
    }

    /// `supported / total`, or 0.0 for a device with no reports.
    pub fn support_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.supported.len() as f64 / total as f64
        }
    }
}

/// Accumulated outcomes of one corpus pass.
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// One entry per requirement, in declared order.
    outcomes: Vec<RequirementOutcome>,
    devices: BTreeMap<String, DeviceCompliance>,
    /// Every corpus entry seen, including the ones that failed to parse.
    corpus_size: usize,
    skipped: Vec<u64>,
}

impl Aggregator {
    pub fn new(requirement_count: usize) -> Self {
        Self {
            outcomes: vec![RequirementOutcome::default(); requirement_count],
            devices: BTreeMap::new(),
            corpus_size: 0,
            skipped: Vec::new(),
        }
    }

    /// Run one report through the waterfall and record the outcome.
    pub fn evaluate(&mut self, requirements: &[Requirement], report_id: u64, view: &CapabilityView) -> ReportVerdict {
        debug_assert_eq!(requirements.len(), self.outcomes.len());
        self.corpus_size += 1;

        let device = view.device_name.as_str();
        let mut verdict = ReportVerdict::Supported;

        for (index, (rq, outcome)) in requirements.iter().zip(self.outcomes.iter_mut()).enumerate() {
            if rq.passes(view) {
                push_id(&mut outcome.passed, device, report_id);
            } else {
                push_id(&mut outcome.failed, device, report_id);
                verdict = ReportVerdict::FailedAt(index);
                break;
            }
        }

        let compliance = self.devices.entry(device.to_string()).or_default();
        match verdict {
            ReportVerdict::Supported => compliance.supported.push(report_id),
            ReportVerdict::FailedAt(index) => {
                debug!(report_id, device, requirement = requirements[index].name(), "report unsupported");
                compliance.unsupported.push(report_id);
            }
        }
        verdict
    }

    /// Parse and evaluate one raw report. A malformed report is counted
    /// toward the corpus size and otherwise skipped.
    pub fn evaluate_text(
        &mut self,
        requirements: &[Requirement],
        report_id: u64,
        text: &str,
    ) -> Result<ReportVerdict, QueryError> {
        match Report::parse(report_id, text) {
            Ok(report) => Ok(self.evaluate(requirements, report_id, &CapabilityView::from_report(&report))),
            Err(e) => {
                self.record_skipped(report_id);
                Err(e)
            }
        }
    }

    /// Count an entry that contributes to no aggregate.
    pub fn record_skipped(&mut self, report_id: u64) {
        self.corpus_size += 1;
        self.skipped.push(report_id);
    }

    pub fn outcomes(&self) -> &[RequirementOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, index: usize) -> Option<&RequirementOutcome> {
        self.outcomes.get(index)
    }

    pub fn devices(&self) -> &BTreeMap<String, DeviceCompliance> {
        &self.devices
    }

    pub fn device(&self, name: &str) -> Option<&DeviceCompliance> {
        self.devices.get(name)
    }

    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    pub fn skipped(&self) -> &[u64] {
        &self.skipped
    }

    /// Distinct device names among successfully parsed reports.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

fn push_id(map: &mut IdsByDevice, device: &str, report_id: u64) {
    match map.get_mut(device) {
        Some(ids) => ids.push(report_id),
        None => {
            map.insert(device.to_string(), vec![report_id]);
        }
    }
}

/// Evaluate `(report_id, raw_text)` pairs in the order given.
///
/// Malformed reports are logged and skipped; the pass never aborts.
pub fn run<I>(requirements: &[Requirement], reports: I) -> Aggregator
where
    I: IntoIterator<Item = (u64, String)>,
{
    let mut agg = Aggregator::new(requirements.len());
    for (report_id, text) in reports {
        if let Err(e) = agg.evaluate_text(requirements, report_id, &text) {
            warn!("error parsing report {report_id}: {e}");
        }
    }
    agg
}

/// Progress of a corpus pass, handed to the `run_corpus` callback after
/// each entry.
#[derive(Debug)]
pub struct EntryProgress<'a> {
    pub entry: &'a CorpusEntry,
    /// Why the entry was skipped, if it was.
    pub skipped: Option<&'a QueryError>,
    pub done: usize,
    pub total: usize,
}

/// Evaluate every report in a corpus directory, ascending by id.
///
/// Skipped entries are not logged here; `on_entry` sees the error and
/// decides how to surface it, so a progress display can stay intact.
pub fn run_corpus<F>(requirements: &[Requirement], corpus: &ReportCorpus, mut on_entry: F) -> Aggregator
where
    F: FnMut(EntryProgress<'_>),
{
    let mut agg = Aggregator::new(requirements.len());
    let total = corpus.len();

    for (i, entry) in corpus.entries().iter().enumerate() {
        let result = corpus
            .read(entry)
            .and_then(|text| agg.evaluate_text(requirements, entry.id, &text));
        let error = match result {
            Ok(_) => None,
            Err(e) => {
                // Unreadable file: counted, never evaluated.
                if !e.is_recoverable() {
                    agg.record_skipped(entry.id);
                }
                debug!(report_id = entry.id, "skipped: {e}");
                Some(e)
            }
        };
        on_entry(EntryProgress {
            entry,
            skipped: error.as_ref(),
            done: i + 1,
            total,
        });
    }
    agg
}

/// Log line for a skipped corpus entry.
pub fn skip_notice(progress: &EntryProgress<'_>) -> Option<String> {
    progress.skipped.map(|e| match e {
        QueryError::CorpusEntryMalformed { .. } => format!("error parsing {}", progress.entry.path.display()),
        other => format!("error reading {}: {other}", progress.entry.path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, sets: u32) -> String {
        format!(
            r#"{{"properties": {{"apiVersion": 4198400, "deviceName": "{name}",
                "limits": {{"maxBoundDescriptorSets": {sets}}}}},
                "features": {{"robustBufferAccess": true}}}}"#
        )
    }

    fn requirements() -> Vec<Requirement> {
        vec![
            Requirement::feature("robustBufferAccess"),
            Requirement::min_limit("maxBoundDescriptorSets", 4),
            Requirement::min_limit("maxBoundDescriptorSets", 8),
        ]
    }

    #[test]
    fn test_supported_report_passes_everything() {
        let rqs = requirements();
        let mut agg = Aggregator::new(rqs.len());
        let verdict = agg.evaluate_text(&rqs, 1, &report("A", 32)).unwrap();
        assert_eq!(verdict, ReportVerdict::Supported);
        for outcome in agg.outcomes() {
            assert_eq!(outcome.passed_for("A"), &[1]);
            assert!(outcome.failed_for("A").is_empty());
        }
        assert_eq!(agg.device("A").unwrap().supported, vec![1]);
    }

    #[test]
    fn test_short_circuit_on_first_failure() {
        let rqs = requirements();
        let mut agg = Aggregator::new(rqs.len());
        // Fails both limit requirements; charged only to the first.
        let verdict = agg.evaluate_text(&rqs, 5, &report("B", 2)).unwrap();
        assert_eq!(verdict, ReportVerdict::FailedAt(1));
        assert_eq!(agg.outcome(0).unwrap().passed_for("B"), &[5]);
        assert_eq!(agg.outcome(1).unwrap().failed_for("B"), &[5]);
        assert!(agg.outcome(2).unwrap().failed_for("B").is_empty());
        assert!(agg.outcome(2).unwrap().passed_for("B").is_empty());
        assert_eq!(agg.device("B").unwrap().unsupported, vec![5]);
    }

    #[test]
    fn test_malformed_report_counted_not_aggregated() {
        let rqs = requirements();
        let agg = run(&rqs, vec![(1, report("A", 32)), (2, "{\"properties\": ".to_string())]);
        assert_eq!(agg.corpus_size(), 2);
        assert_eq!(agg.skipped(), &[2]);
        assert_eq!(agg.device_count(), 1);
        let recorded: usize = agg
            .outcomes()
            .iter()
            .flat_map(|o| o.passed.values().chain(o.failed.values()))
            .map(|ids| ids.iter().filter(|id| **id == 2).count())
            .sum();
        assert_eq!(recorded, 0);
    }

    #[test]
    fn test_ids_keep_evaluation_order() {
        let rqs = requirements();
        let agg = run(&rqs, vec![(3, report("A", 32)), (7, report("A", 6)), (9, report("A", 32))]);
        assert_eq!(agg.outcome(1).unwrap().passed_for("A"), &[3, 7, 9]);
        assert_eq!(agg.outcome(2).unwrap().passed_for("A"), &[3, 9]);
        assert_eq!(agg.outcome(2).unwrap().failed_for("A"), &[7]);
    }

    #[test]
    fn test_support_ratio() {
        let c = DeviceCompliance {
            supported: vec![1],
            unsupported: vec![2, 3, 4],
        };
        assert_eq!(c.total(), 4);
        assert_eq!(c.support_ratio(), 0.25);
        assert_eq!(DeviceCompliance::default().support_ratio(), 0.0);
    }
}
