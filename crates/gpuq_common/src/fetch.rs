//! Downloading new reports from the public report database.
//!
//! Already-downloaded reports are never fetched again, so an interrupted
//! run can simply be restarted. There are no retries; a failed download
//! leaves no file behind and is picked up by the next run.

use crate::config::FetchConfig;
use crate::corpus::{exists_and_not_empty, report_file};
use crate::error::{QueryError, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// One entry of the report list.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportListing {
    pub url: String,
}

/// A report that still needs downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReport {
    pub id: u64,
    pub url: String,
}

/// Collapse raw line breaks and tabs (and the indentation after them) into
/// one space. The upstream API does not escape newlines inside strings.
pub fn clean_json(s: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let re = WS.get_or_init(|| Regex::new(r"[\r\n\t]+ *").expect("Failed to compile line break pattern"));
    re.replace_all(s, " ").into_owned()
}

/// Report id from a listing url such as `...getreport.php?id=12345`.
pub fn report_id_from_url(url: &str) -> Option<u64> {
    url.split('=').nth(1)?.split('&').next()?.trim().parse().ok()
}

/// Listings whose report file is missing or empty, in listing order.
pub fn pending(listings: &[ReportListing], reports_dir: &Path) -> Vec<PendingReport> {
    listings
        .iter()
        .filter_map(|l| match report_id_from_url(&l.url) {
            Some(id) => Some(PendingReport { id, url: l.url.clone() }),
            None => {
                warn!("skipping listing with unparseable url {}", l.url);
                None
            }
        })
        .filter(|p| !exists_and_not_empty(&report_file(reports_dir, p.id)))
        .collect()
}

/// Blocking HTTP fetcher.
pub struct Fetcher {
    config: FetchConfig,
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QueryError::Fetch(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| QueryError::Fetch(format!("{url}: {e}")))?;
        let text = response.text().map_err(|e| QueryError::Fetch(format!("{url}: {e}")))?;
        Ok(clean_json(&text))
    }

    pub fn report_list(&self) -> Result<Vec<ReportListing>> {
        let text = self.get_text(&self.config.report_list_url)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Download every pending report into `reports_dir`.
    ///
    /// `on_report` is called after each download, for progress display.
    /// Returns the number of reports written.
    pub fn fetch_new<F>(&self, reports_dir: &Path, mut on_report: F) -> Result<usize>
    where
        F: FnMut(&PendingReport, usize, usize),
    {
        if !reports_dir.is_dir() {
            return Err(QueryError::Fetch(format!(
                "{} does not exist; run from outside the data repository",
                reports_dir.display()
            )));
        }

        let listings = self.report_list()?;
        info!("found {} reports", listings.len());
        let todo = pending(&listings, reports_dir);
        info!("need to get {} more reports", todo.len());

        let delay = Duration::from_secs_f64(self.config.delay_secs);
        for (i, report) in todo.iter().enumerate() {
            let path = report_file(reports_dir, report.id);
            info!("getting {}", path.display());
            let text = self.get_text(&report.url)?;
            fs::write(&path, text)?;
            on_report(report, i + 1, todo.len());
            if i + 1 < todo.len() {
                std::thread::sleep(delay);
            }
        }
        Ok(todo.len())
    }
}
