//! Command implementations.
//!
//! Each command loads what it needs, runs one pass, and prints a plain
//! text report (or JSON with `--json`) to stdout. Progress and diagnostics
//! go to stderr.

use anyhow::{Context, Result};
use gpuq_common::fetch::Fetcher;
use gpuq_common::inventory::{self, render_inventory};
use gpuq_common::render::{render, save_result};
use gpuq_common::summary::RunSummary;
use gpuq_common::waterfall::{run_corpus, skip_notice};
use gpuq_common::{catalog, ObservedDevices, QueryConfig, ReportCorpus, Taxonomy, VkConstants};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")?);
    Ok(bar)
}

fn open_corpus(config: &QueryConfig) -> Result<ReportCorpus> {
    let dir = config.reports_dir();
    ReportCorpus::open(&dir).with_context(|| format!("Failed to list reports in {}", dir.display()))
}

/// Run the baseline requirement waterfall and print the summary.
pub fn query(
    mut config: QueryConfig,
    data_dir: Option<PathBuf>,
    vk_xml: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    no_save: bool,
    json: bool,
) -> Result<()> {
    if let Some(dir) = data_dir {
        config.paths.data_dir = dir;
    }
    if let Some(path) = vk_xml {
        config.paths.vk_xml = path;
    }
    if let Some(dir) = results_dir {
        config.paths.results_dir = dir;
    }

    let vk = VkConstants::load(&config.paths.vk_xml)
        .with_context(|| format!("Failed to load {}", config.paths.vk_xml.display()))?;
    let requirements = catalog::baseline(&vk)?;
    let corpus = open_corpus(&config)?;
    info!("evaluating {} requirements over {} reports", requirements.len(), corpus.len());

    let bar = progress_bar(corpus.len())?;
    let agg = run_corpus(&requirements, &corpus, |p| {
        if let Some(notice) = skip_notice(&p) {
            bar.suspend(|| warn!("{notice}"));
        }
        bar.set_position(p.done as u64);
    });
    bar.finish_and_clear();
    if !agg.skipped().is_empty() {
        warn!("{} reports skipped", agg.skipped().len());
    }

    let summary = RunSummary::build(&requirements, &agg);
    let text = render(&summary);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{text}");
    }

    if !no_save {
        let path = save_result(&config.paths.results_dir, &text)?;
        info!("result written to {}", path.display());
    }
    Ok(())
}

/// List observed devices, classified by the taxonomy when one is given.
pub fn devices(
    mut config: QueryConfig,
    data_dir: Option<PathBuf>,
    gpu_info: Option<PathBuf>,
    all: bool,
    json: bool,
) -> Result<()> {
    if let Some(dir) = data_dir {
        config.paths.data_dir = dir;
    }
    if gpu_info.is_some() {
        config.paths.gpu_info = gpu_info;
    }
    let show_all = all || config.devices.show_all;

    let taxonomy = match &config.paths.gpu_info {
        Some(path) => Some(Taxonomy::load(path)?),
        None => None,
    };

    let corpus = open_corpus(&config)?;
    let bar = progress_bar(corpus.len())?;
    let mut observed = ObservedDevices::new();
    for entry in corpus.entries() {
        let recorded = corpus.read(entry).and_then(|text| observed.record_text(entry.id, &text));
        if recorded.is_err() {
            bar.suspend(|| warn!("error parsing {}", entry.path.display()));
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let report = inventory::build(&observed, taxonomy.as_ref(), show_all);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_inventory(&report));
    }
    Ok(())
}

/// Download every report the data directory does not have yet.
pub fn fetch(mut config: QueryConfig, data_dir: Option<PathBuf>, delay: Option<f64>) -> Result<()> {
    if let Some(dir) = data_dir {
        config.paths.data_dir = dir;
    }
    if let Some(secs) = delay {
        config.fetch.delay_secs = secs;
    }
    config.validate()?;

    let reports_dir = config.reports_dir();
    let fetcher = Fetcher::new(config.fetch.clone())?;
    // The total is only known once the report list is in.
    let mut bar: Option<ProgressBar> = None;
    let fetched = fetcher.fetch_new(&reports_dir, |report, done, total| {
        let bar = bar.get_or_insert_with(|| ProgressBar::new(total as u64));
        bar.set_position(done as u64);
        bar.set_message(report.id.to_string());
    })?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    info!("fetched {fetched} new reports into {}", reports_dir.display());
    Ok(())
}
