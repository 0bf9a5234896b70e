//! Concurrent multi-channel retrieval
//!
//! Each PV is fetched as its own tokio task; results come back in the order
//! the PVs were requested, whatever order the tasks finish in.

use std::sync::Arc;

use tokio::task::JoinSet;
use vibguard_core::{ChannelSeries, Sample, SpectrumFrame, SpectrumSeries, TimeWindow};

use crate::{ArchiveError, ArchiveRecord, ArchiveSource, ArchivedValue};

/// Fetch every PV in `pvs` over `window`, concurrently.
///
/// Returns `(pv, records)` pairs in input order. The first failing PV
/// aborts the whole fetch.
pub async fn fetch_channels<S>(
    source: Arc<S>,
    pvs: &[String],
    window: TimeWindow,
) -> Result<Vec<(String, Vec<ArchiveRecord>)>, ArchiveError>
where
    S: ArchiveSource + ?Sized + 'static,
{
    let mut set = JoinSet::new();
    for (index, pv) in pvs.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        set.spawn(async move {
            log::info!("Fetching {} from {}", pv, source.describe());
            let result = source.fetch(&pv, window).await;
            (index, pv, result)
        });
    }

    let mut slots: Vec<Option<(String, Vec<ArchiveRecord>)>> = vec![None; pvs.len()];
    while let Some(joined) = set.join_next().await {
        let (index, pv, result) = joined.map_err(|e| ArchiveError::Task(e.to_string()))?;
        let records = result?;
        log::debug!("{}: {} records", pv, records.len());
        slots[index] = Some((pv, records));
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Fetch scalar PVs as [`ChannelSeries`], in input order
pub async fn fetch_series<S>(
    source: Arc<S>,
    pvs: &[String],
    window: TimeWindow,
) -> Result<Vec<ChannelSeries>, ArchiveError>
where
    S: ArchiveSource + ?Sized + 'static,
{
    let fetched = fetch_channels(source, pvs, window).await?;
    Ok(fetched.iter().map(|(pv, records)| to_channel_series(pv, records)).collect())
}

/// Fetch waveform PVs as [`SpectrumSeries`], in input order
pub async fn fetch_spectra<S>(
    source: Arc<S>,
    pvs: &[String],
    window: TimeWindow,
) -> Result<Vec<SpectrumSeries>, ArchiveError>
where
    S: ArchiveSource + ?Sized + 'static,
{
    let fetched = fetch_channels(source, pvs, window).await?;
    Ok(fetched.iter().map(|(pv, records)| to_spectrum_series(pv, records)).collect())
}

/// Scalar records as a series; waveform records are dropped
pub fn to_channel_series(pv: &str, records: &[ArchiveRecord]) -> ChannelSeries {
    let samples: Vec<Sample> = records
        .iter()
        .filter_map(|r| match r.value {
            ArchivedValue::Scalar(v) => Some(Sample::new(r.timestamp_ms, v)),
            ArchivedValue::Waveform(_) => None,
        })
        .collect();

    if samples.len() < records.len() {
        log::warn!("{}: dropped {} waveform records from scalar series", pv, records.len() - samples.len());
    }
    if samples.is_empty() {
        log::warn!("{}: no samples in window", pv);
    }
    ChannelSeries::new(pv, samples)
}

/// Waveform records as spectrum frames; scalar records are dropped
pub fn to_spectrum_series(pv: &str, records: &[ArchiveRecord]) -> SpectrumSeries {
    let frames: Vec<SpectrumFrame> = records
        .iter()
        .filter_map(|r| match &r.value {
            ArchivedValue::Waveform(bins) => Some(SpectrumFrame {
                timestamp_ms: r.timestamp_ms,
                bins: bins.clone(),
            }),
            ArchivedValue::Scalar(_) => None,
        })
        .collect();

    if frames.is_empty() {
        log::warn!("{}: no spectrum frames in window", pv);
    }
    SpectrumSeries::new(pv, frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;

    fn pvs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(
            MemorySource::new("test")
                .with("A", vec![ArchiveRecord::scalar(1_000, 1.0e-7)])
                .with("B", vec![ArchiveRecord::scalar(1_000, 2.0e-7), ArchiveRecord::scalar(2_000, 3.0e-7)])
                .with("FFT", vec![ArchiveRecord::waveform(1_000, vec![1.0, 2.0, 3.0])]),
        )
    }

    #[tokio::test]
    async fn results_follow_input_order() {
        let fetched = fetch_channels(source(), &pvs(&["B", "A"]), TimeWindow::new(0, 10_000))
            .await
            .unwrap();
        let names: Vec<&str> = fetched.iter().map(|(pv, _)| pv.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(fetched[0].1.len(), 2);
    }

    #[tokio::test]
    async fn unknown_pv_fails_the_fetch() {
        let result = fetch_channels(source(), &pvs(&["A", "NOPE"]), TimeWindow::new(0, 10_000)).await;
        assert!(matches!(result, Err(ArchiveError::UnknownPv { .. })));
    }

    #[tokio::test]
    async fn trait_object_source() {
        let source: Arc<dyn ArchiveSource> = source();
        let series = fetch_series(source, &pvs(&["A"]), TimeWindow::new(0, 10_000)).await.unwrap();
        assert_eq!(series[0].samples, vec![Sample::new(1_000, 1.0e-7)]);
    }

    #[tokio::test]
    async fn waveforms_become_spectra() {
        let spectra = fetch_spectra(source(), &pvs(&["FFT"]), TimeWindow::new(0, 10_000)).await.unwrap();
        assert_eq!(spectra[0].frames.len(), 1);
        assert_eq!(spectra[0].frames[0].bins, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn mixed_records_split_by_kind() {
        let records = vec![ArchiveRecord::scalar(1, 1.0), ArchiveRecord::waveform(2, vec![0.5])];
        assert_eq!(to_channel_series("X", &records).len(), 1);
        assert_eq!(to_spectrum_series("X", &records).frames.len(), 1);
    }
}
