//! Plain-text rendering of a run summary, and result-file persistence.

use crate::error::Result;
use crate::summary::{DeviceLoss, RunSummary};
use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

fn join_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(" ")
}

fn lost_all_line(loss: &DeviceLoss) -> String {
    format!("    x {}: {} ({})\n", loss.device, loss.failed.len(), join_ids(&loss.failed))
}

fn lost_some_line(loss: &DeviceLoss) -> String {
    format!(
        "    ~ {}: {} of {} ({}; ok: {})\n",
        loss.device,
        loss.failed.len(),
        loss.failed.len() + loss.passed.len(),
        join_ids(&loss.failed),
        join_ids(&loss.passed)
    )
}

/// Render the full report. Byte-for-byte deterministic for a given summary.
pub fn render(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "Beginning with {} unique deviceNames in {} reports.\n\n",
        summary.device_count, summary.corpus_size
    );

    for rq in &summary.requirements {
        if rq.loses_nothing() {
            let _ = writeln!(out, "Requirement \"{}\" loses no further reports!", rq.name);
            continue;
        }
        let _ = writeln!(
            out,
            "Requirement \"{}\" loses {} (and partially loses {}) further deviceNames:",
            rq.name,
            rq.lost_all.len(),
            rq.lost_some.len()
        );
        let _ = writeln!(out, "  In ALL reports ({} deviceNames):", rq.lost_all.len());
        rq.lost_all.iter().for_each(|l| out.push_str(&lost_all_line(l)));
        let _ = writeln!(out, "  In SOME reports ({} deviceNames):", rq.lost_some.len());
        rq.lost_some.iter().for_each(|l| out.push_str(&lost_some_line(l)));
    }

    out.push_str("At least 90% of each of the following was still supported:\n");
    for d in &summary.support.well_supported {
        let _ = writeln!(out, "  + {} ({} of {})", d.device, d.supported, d.total);
    }
    out.push_str("At least one, but under 90% of each of the following was still supported:\n");
    for d in &summary.support.partially_supported {
        let _ = writeln!(out, "  ? {} ({} of {})", d.device, d.supported, d.total);
    }
    out
}

/// `result-YYYYmmdd-HHMMSS.txt`, local time.
pub fn result_file_name() -> String {
    format!("result-{}.txt", Local::now().format("%Y%m%d-%H%M%S"))
}

/// Write the rendered report into `dir` under a timestamped name.
pub fn save_result(dir: &Path, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(result_file_name());
    fs::write(&path, text)?;
    Ok(path)
}
