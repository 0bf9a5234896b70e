//! Text and JSON rendering of command results

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use vibguard_core::time::ms_to_seconds;
use vibguard_core::{
    AlarmReport, ClassifiedSeries, LevelHistogram, LogHistogram, ReferenceLine, SeverityScale, Spectrogram,
    Timestamp, VcLevel,
};

use crate::cli::OutputFormat;

/// Velocities are printed in µm/s
const MICRONS_PER_METRE: f64 = 1e6;

/// Write `value` as JSON, or call `text` for the human-readable form
pub fn emit<W, T, F>(out: &mut W, format: OutputFormat, value: &T, text: F) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
    F: FnOnce(&mut W) -> std::io::Result<()>,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => text(out)?,
    }
    Ok(())
}

/// One classified input value
#[derive(Debug, Serialize)]
pub struct Classification {
    pub value: f64,
    pub level: VcLevel,
}

/// Level and bound of one threshold lookup
#[derive(Debug, Serialize)]
pub struct Threshold<'a> {
    pub label: &'a str,
    pub threshold: f64,
}

/// Classified samples of one channel with the VC gridlines of the time-series view
#[derive(Debug, Serialize)]
pub struct FetchReport {
    #[serde(flatten)]
    pub series: ClassifiedSeries,
    pub reference_lines: Vec<ReferenceLine>,
}

/// Both histograms of one channel
#[derive(Debug, Serialize)]
pub struct HistogramReport {
    pub levels: LevelHistogram,
    pub velocity: LogHistogram,
}

pub fn format_time(timestamp_ms: Timestamp) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn microns(value: f64) -> f64 {
    value * MICRONS_PER_METRE
}

pub fn levels_text<W: Write>(out: &mut W, scale: &SeverityScale) -> std::io::Result<()> {
    writeln!(out, "{:<8} {:>14}", "LEVEL", "LIMIT (µm/s)")?;
    for (bound, label) in scale.entries() {
        writeln!(out, "{:<8} {:>14.3}", label, microns(bound))?;
    }
    if let Some((bound, _)) = scale.entries().last() {
        writeln!(out, "{:<8} {:>14}", scale.out_of_range_label(), format!("> {:.3}", microns(bound)))?;
    }
    Ok(())
}

pub fn classifications_text<W: Write>(out: &mut W, rows: &[Classification]) -> std::io::Result<()> {
    for row in rows {
        writeln!(out, "{:>12.4e} m/s  {}", row.value, row.level)?;
    }
    Ok(())
}

pub fn series_text<W: Write>(out: &mut W, report: &FetchReport, head: usize) -> std::io::Result<()> {
    let series = &report.series;
    write!(out, "{} ({} samples", series.pv, series.len())?;
    if let (Some(peak), Some(worst)) = (series.peak(), series.worst_level()) {
        write!(out, ", peak {:.3} µm/s, worst {}", microns(peak.value), worst)?;
    }
    writeln!(out, ")")?;

    for sample in series.samples.iter().take(head) {
        writeln!(
            out,
            "  {}  {:>10.3}  {}",
            format_time(sample.timestamp_ms),
            microns(sample.value),
            sample.level
        )?;
    }
    if series.len() > head {
        writeln!(out, "  ... {} more", series.len() - head)?;
    }

    let grid: Vec<String> = report
        .reference_lines
        .iter()
        .map(|line| format!("{} {:.3}", line.caption, microns(line.bound)))
        .collect();
    if !grid.is_empty() {
        writeln!(out, "  gridlines (µm/s): {}", grid.join(", "))?;
    }
    Ok(())
}

pub fn alarms_text<W: Write>(out: &mut W, report: &AlarmReport) -> std::io::Result<()> {
    writeln!(
        out,
        "{}: {} of {} samples at or above {} ({:.3} µm/s), {} events",
        report.pv,
        report.samples.len(),
        report.examined,
        report.threshold_label,
        microns(report.threshold),
        report.events.len()
    )?;

    for event in &report.events {
        writeln!(
            out,
            "  {}  {:>8.1} s  {:>5} samples  peak {:.3} µm/s ({})",
            format_time(event.start_ms),
            ms_to_seconds(event.duration_ms),
            event.sample_count,
            microns(event.peak_value),
            event.peak_level
        )?;
    }
    Ok(())
}

pub fn histogram_text<W: Write>(out: &mut W, report: &HistogramReport) -> std::io::Result<()> {
    let levels = &report.levels;
    writeln!(out, "{} ({} samples)", levels.pv, levels.total_count())?;
    writeln!(out, "  {:<8} {:>8} {:>8}", "LEVEL", "COUNT", "TIME %")?;
    for bin in &levels.bins {
        writeln!(
            out,
            "  {:<8} {:>8} {:>7.2}%",
            bin.level,
            bin.count,
            100.0 * levels.time_fraction(bin.level.label())
        )?;
    }

    writeln!(out, "  {:>12} {:>12} {:>8}", "FROM µm/s", "TO µm/s", "COUNT")?;
    for bin in &report.velocity.bins {
        writeln!(out, "  {:>12.4} {:>12.4} {:>8}", microns(bin.lower), microns(bin.upper), bin.count)?;
    }
    if report.velocity.skipped > 0 {
        writeln!(out, "  ({} values not binned)", report.velocity.skipped)?;
    }
    Ok(())
}

pub fn spectrogram_text<W: Write>(out: &mut W, spectrogram: &Spectrogram) -> std::io::Result<()> {
    let span = match (spectrogram.times_ms.first(), spectrogram.times_ms.last()) {
        (Some(&first), Some(&last)) => format!("{} .. {}", format_time(first), format_time(last)),
        _ => "-".to_string(),
    };
    writeln!(out, "{}: {} frames, {}", spectrogram.pv, spectrogram.times_ms.len(), span)?;

    if let (Some(lo), Some(hi)) = (spectrogram.frequencies_hz.first(), spectrogram.frequencies_hz.last()) {
        writeln!(out, "  frequencies {} .. {} Hz", lo, hi)?;
    }
    if let Some(peak) = spectrogram.peak_frequency_hz() {
        writeln!(out, "  max-hold peak at {} Hz", peak)?;
    }
    Ok(())
}
