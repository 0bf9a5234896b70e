//! In-memory archive source
//!
//! Serves records held in memory, either inserted directly or loaded from a
//! saved `getData.json` response. Used for offline analysis and in tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use vibguard_core::TimeWindow;

use crate::wire::{parse_response, PvPayload};
use crate::{ArchiveError, ArchiveRecord, ArchiveSource, ConnectionStats};

/// Archive source backed by a map of PV name to records
#[derive(Default)]
pub struct MemorySource {
    name: String,
    records: HashMap<String, Vec<ArchiveRecord>>,
    stats: Mutex<ConnectionStats>,
}

impl MemorySource {
    /// Empty source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add records for `pv`, keeping them ordered by timestamp
    pub fn insert(&mut self, pv: impl Into<String>, records: impl IntoIterator<Item = ArchiveRecord>) {
        let entry = self.records.entry(pv.into()).or_default();
        entry.extend(records);
        entry.sort_by_key(|r| r.timestamp_ms);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, pv: impl Into<String>, records: impl IntoIterator<Item = ArchiveRecord>) -> Self {
        self.insert(pv, records);
        self
    }

    /// Source holding every payload of a parsed response
    pub fn from_payloads(name: impl Into<String>, payloads: &[PvPayload]) -> Self {
        let mut source = Self::new(name);
        for payload in payloads {
            source.insert(payload.meta.name.clone(), payload.records());
        }
        source
    }

    /// Source from a `getData.json` body
    pub fn from_json_str(name: impl Into<String>, body: &str) -> Result<Self, ArchiveError> {
        Ok(Self::from_payloads(name, &parse_response(body)?))
    }

    /// Source from a saved `getData.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(path.display().to_string(), &body)?;
        log::info!("Loaded {} PVs from {}", source.records.len(), path.display());
        Ok(source)
    }

    /// PV names held, sorted
    pub fn pvs(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait::async_trait]
impl ArchiveSource for MemorySource {
    async fn fetch(&self, pv: &str, window: TimeWindow) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(records) = self.records.get(pv) else {
            let err = ArchiveError::UnknownPv {
                pv: pv.to_string(),
                source_name: self.name.clone(),
            };
            stats.requests_failed += 1;
            stats.last_error = Some(err.to_string());
            return Err(err);
        };

        let selected: Vec<ArchiveRecord> = records
            .iter()
            .filter(|r| window.contains(r.timestamp_ms))
            .cloned()
            .collect();

        stats.requests_ok += 1;
        stats.records_returned += selected.len() as u64;
        Ok(selected)
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn stats(&self) -> ConnectionStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source() -> MemorySource {
        MemorySource::new("test").with(
            "PV:VC_PEAK",
            vec![
                ArchiveRecord::scalar(3_000, 3.0),
                ArchiveRecord::scalar(1_000, 1.0),
                ArchiveRecord::scalar(2_000, 2.0),
            ],
        )
    }

    #[tokio::test]
    async fn fetch_filters_by_window() {
        let records = source().fetch("PV:VC_PEAK", TimeWindow::new(1_500, 3_000)).await.unwrap();
        assert_eq!(records, vec![ArchiveRecord::scalar(2_000, 2.0)]);
    }

    #[tokio::test]
    async fn records_are_kept_in_time_order() {
        let records = source().fetch("PV:VC_PEAK", TimeWindow::new(0, 10_000)).await.unwrap();
        let times: Vec<u64> = records.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(times, vec![1_000, 2_000, 3_000]);
    }

    #[tokio::test]
    async fn unknown_pv_is_an_error() {
        let source = source();
        let err = source.fetch("PV:MISSING", TimeWindow::new(0, 10_000)).await.unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownPv { .. }));
        assert_eq!(source.stats().requests_failed, 1);
    }

    #[tokio::test]
    async fn load_saved_response() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{ "meta": {{ "name": "PV:VC_PEAK" }},
                  "data": [ {{ "secs": 1, "nanos": 0, "val": 4.0e-7 }} ] }}]"#
        )
        .unwrap();

        let source = MemorySource::load(file.path()).unwrap();
        assert_eq!(source.pvs(), vec!["PV:VC_PEAK"]);

        let records = source.fetch("PV:VC_PEAK", TimeWindow::new(0, 2_000)).await.unwrap();
        assert_eq!(records, vec![ArchiveRecord::scalar(1_000, 4.0e-7)]);
        assert_eq!(source.stats().records_returned, 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            MemorySource::load("/nonexistent/vibguard/dump.json"),
            Err(ArchiveError::Io(_))
        ));
    }
}
