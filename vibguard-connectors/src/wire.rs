//! Archiver Appliance JSON wire format
//!
//! `getData.json` answers with one payload per PV:
//!
//! ```json
//! [ { "meta": { "name": "BL20I-DI-ACCEL-01:DATA:CH01:VC_PEAK", "PREC": "3" },
//!     "data": [ { "secs": 1651536000, "nanos": 250000000,
//!                 "val": 1.2e-7, "severity": 0, "status": 0 } ] } ]
//! ```
//!
//! `val` is a number for scalar PVs and an array for waveforms. Anything
//! else (strings, enums) is not vibration data and is skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vibguard_core::time::timestamp_from_parts;

use crate::{ArchiveError, ArchiveRecord, ArchivedValue};

/// One PV's answer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PvPayload {
    /// PV metadata
    pub meta: PvMeta,
    /// Archived updates
    #[serde(default)]
    pub data: Vec<DataPoint>,
}

/// PV metadata; only the name is interpreted
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PvMeta {
    /// Full PV name
    pub name: String,
    /// Remaining fields (`PREC`, `EGU`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One archived update
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataPoint {
    /// Seconds since epoch
    pub secs: i64,
    /// Nanoseconds within the second
    #[serde(default)]
    pub nanos: u32,
    /// Value: number or array of numbers
    pub val: serde_json::Value,
    /// EPICS alarm severity
    #[serde(default)]
    pub severity: i32,
    /// EPICS alarm status
    #[serde(default)]
    pub status: i32,
}

impl DataPoint {
    /// Convert to a record; `None` for non-numeric values
    pub fn to_record(&self) -> Option<ArchiveRecord> {
        let value = match &self.val {
            serde_json::Value::Number(n) => ArchivedValue::Scalar(n.as_f64()?),
            serde_json::Value::Array(items) => ArchivedValue::Waveform(
                items.iter().map(|v| v.as_f64()).collect::<Option<Vec<f64>>>()?,
            ),
            _ => return None,
        };
        Some(ArchiveRecord {
            timestamp_ms: timestamp_from_parts(self.secs, self.nanos),
            value,
        })
    }
}

impl PvPayload {
    /// Numeric records of this payload, oldest first
    pub fn records(&self) -> Vec<ArchiveRecord> {
        let mut records: Vec<ArchiveRecord> = self.data.iter().filter_map(DataPoint::to_record).collect();

        let skipped = self.data.len() - records.len();
        if skipped > 0 {
            log::warn!("{}: skipped {} non-numeric archive values", self.meta.name, skipped);
        }

        records.sort_by_key(|r| r.timestamp_ms);
        records
    }
}

/// Parse a `getData.json` response body
pub fn parse_response(body: &str) -> Result<Vec<PvPayload>, ArchiveError> {
    serde_json::from_str(body).map_err(|e| ArchiveError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        { "meta": { "name": "PV:VC_PEAK", "PREC": "3" },
          "data": [
            { "secs": 20, "nanos": 0, "val": 2.5e-7, "severity": 0, "status": 0 },
            { "secs": 10, "nanos": 500000000, "val": 1.0e-7 },
            { "secs": 30, "val": "Disconnected" }
          ] },
        { "meta": { "name": "PV:FFT" },
          "data": [ { "secs": 10, "val": [0.0, 1.5, 2.0] } ] }
    ]"#;

    #[test]
    fn parses_scalar_and_waveform_payloads() {
        let payloads = parse_response(BODY).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].meta.name, "PV:VC_PEAK");
        assert!(payloads[0].meta.extra.contains_key("PREC"));

        let records = payloads[0].records();
        assert_eq!(
            records,
            vec![ArchiveRecord::scalar(10_500, 1.0e-7), ArchiveRecord::scalar(20_000, 2.5e-7)]
        );

        let waveform = payloads[1].records();
        assert_eq!(waveform, vec![ArchiveRecord::waveform(10_000, vec![0.0, 1.5, 2.0])]);
    }

    #[test]
    fn rejects_non_json_body() {
        assert!(matches!(
            parse_response("<html>Bad gateway</html>"),
            Err(ArchiveError::Serialization(_))
        ));
    }

    #[test]
    fn empty_answer_is_no_payloads() {
        assert!(parse_response("[]").unwrap().is_empty());
    }
}
