//! Report corpus on disk: one `<report_id>.json` file per report.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub id: u64,
    pub path: PathBuf,
}

/// Report files in a directory, sorted ascending by report id.
#[derive(Debug, Clone, Default)]
pub struct ReportCorpus {
    entries: Vec<CorpusEntry>,
}

impl ReportCorpus {
    /// List `*.json` files whose stem is a report id. Other files are ignored.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for item in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let item = item.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            if !item.file_type().is_file() {
                continue;
            }
            let path = item.into_path();
            match report_id_of(&path) {
                Some(id) => entries.push(CorpusEntry { id, path }),
                None => debug!("ignoring {}", path.display()),
            }
        }
        entries.sort_by_key(|e| e.id);
        debug!("corpus {} has {} reports", dir.display(), entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn read(&self, entry: &CorpusEntry) -> Result<String> {
        Ok(fs::read_to_string(&entry.path)?)
    }
}

/// Reports directory inside a data directory.
pub fn reports_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("reports")
}

/// Path of one report file.
pub fn report_file(reports_dir: &Path, report_id: u64) -> PathBuf {
    reports_dir.join(format!("{report_id}.json"))
}

/// True if the file exists and has content.
pub fn exists_and_not_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() != 0).unwrap_or(false)
}

fn report_id_of(path: &Path) -> Option<u64> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
