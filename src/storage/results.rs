//! Durable on-disk store for research outcomes: one JSON file per record,
//! named `YYYYmmdd_HHMMSS_<report_id>.json` so saves never overwrite and the
//! directory sorts chronologically. The report id is the logical key, found
//! by linear scan; unreadable files are skipped, never fatal.

use anyhow::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info};

use crate::models::StoredRecord;

pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a record under a fresh unique name.
    pub fn save(&self, record: &StoredRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stem = format!(
            "{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            record.report_id()
        );
        let mut path = self.dir.join(format!("{stem}.json"));
        let mut attempt = 1;
        while path.exists() {
            path = self.dir.join(format!("{stem}_{attempt}.json"));
            attempt += 1;
        }

        let serialized = serde_json::to_vec_pretty(record)?;
        fs::write(&path, serialized)?;

        info!(path = %path.display(), "saved research record");
        Ok(path)
    }

    /// Fetch a record by report id: first match in directory iteration order.
    pub fn get_by_id(&self, report_id: &str) -> Option<StoredRecord> {
        self.scan()
            .into_iter()
            .map(|(_, _, record)| record)
            .find(|record| record.report_id() == report_id)
    }

    /// Fetch a record by the originating request id. Used by the status
    /// endpoint once the in-memory task entry has been cleaned up.
    pub fn find_by_request(&self, request_id: &str) -> Option<StoredRecord> {
        self.scan()
            .into_iter()
            .map(|(_, _, record)| record)
            .find(|record| record.request_id() == request_id)
    }

    /// List records newest-first by modification time.
    pub fn list(&self, limit: usize, offset: usize) -> Vec<StoredRecord> {
        let mut entries = self.scan();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, _, record)| record)
            .collect()
    }

    /// Delete the first record matching the report id.
    pub fn delete(&self, report_id: &str) -> bool {
        for (path, _, record) in self.scan() {
            if record.report_id() == report_id {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!(report_id, "deleted research record");
                        return true;
                    }
                    Err(err) => {
                        error!(path = %path.display(), %err, "failed to delete research record");
                        return false;
                    }
                }
            }
        }
        false
    }

    fn scan(&self) -> Vec<(PathBuf, SystemTime, StoredRecord)> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(err) => {
                    error!(path = %path.display(), %err, "failed to read record");
                    continue;
                }
            };

            // A concurrent writer may be mid-write; skip anything unparsable.
            let record: StoredRecord = match serde_json::from_slice(&data) {
                Ok(record) => record,
                Err(err) => {
                    error!(path = %path.display(), %err, "skipping unreadable record");
                    continue;
                }
            };

            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            records.push((path, modified, record));
        }

        records
    }
}
