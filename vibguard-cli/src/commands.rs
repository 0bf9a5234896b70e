use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use vibguard_connectors::archiver::{ArchiverClient, ArchiverConfig};
use vibguard_connectors::{fetch_series, fetch_spectra, ArchiveSource, MemorySource};
use vibguard_core::constants::{
    BEAMLINE_ENV_VAR, DEFAULT_BEAMLINE, DEFAULT_LOOKBACK_HOURS, DEFAULT_REFERENCE_RANGE, MS_PER_HOUR, MS_PER_SECOND,
};
use vibguard_core::{
    classify_series, detect_alarms_all, AlarmConfig, Beamline, ChannelSeries, Classifier, LevelHistogram,
    LogHistogram, PvNaming, ScaleConfig, SeverityScale, Spectrogram, SpectrumSeries, TimeWindow, Timestamp,
    Variable,
};

use crate::cli::{Cli, Commands, DataArgs};
use crate::output::{self, emit, Classification, FetchReport, HistogramReport, Threshold};

/// Run the parsed command line, writing results to `out`
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let scale = load_scale(cli.scale.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::Levels => {
            emit(out, format, &scale.to_config(), |out| output::levels_text(out, &scale))?;
        }

        Commands::Classify { values } => {
            let rows: Vec<Classification> = values
                .iter()
                .map(|&value| Classification { value, level: scale.classify(value) })
                .collect();
            emit(out, format, &rows, |out| output::classifications_text(out, &rows))?;
        }

        Commands::Threshold { label } => {
            let threshold = scale.threshold(&label)?;
            let answer = Threshold { label: &label, threshold };
            emit(out, format, &answer, |out| writeln!(out, "{:e}", threshold))?;
        }

        Commands::Fetch { data, head } => {
            let request = DataRequest::from_args(&data, data.variable.unwrap_or(Variable::VcPeak))?;
            if request.variable.is_waveform() {
                let spectra = request.spectra().await?;
                for series in spectra.iter().filter(|s| has_frames(s)) {
                    let spectrogram = Spectrogram::build(series, 0..frame_width(series))?;
                    emit(out, format, &spectrogram, |out| output::spectrogram_text(out, &spectrogram))?;
                }
            } else {
                for series in request.series().await? {
                    let report = FetchReport {
                        series: classify_series(&scale, &series),
                        reference_lines: scale.reference_lines(DEFAULT_REFERENCE_RANGE),
                    };
                    emit(out, format, &report, |out| output::series_text(out, &report, head))?;
                }
            }
        }

        Commands::Alarms { data, threshold, merge_gap } => {
            let request = DataRequest::from_args(&data, scalar_variable(&data)?)?;
            let gap_ms = merge_gap
                .checked_mul(MS_PER_SECOND)
                .with_context(|| format!("--merge-gap {} s is too large", merge_gap))?;
            let config = AlarmConfig::new(threshold).merge_gap_ms(gap_ms);
            // Unknown labels fail before anything is fetched
            scale.threshold(&config.threshold_label)?;

            let series = request.series().await?;
            for report in detect_alarms_all(&scale, &series, &config)? {
                emit(out, format, &report, |out| output::alarms_text(out, &report))?;
            }
        }

        Commands::Histogram { data, bins } => {
            let request = DataRequest::from_args(&data, scalar_variable(&data)?)?;
            for series in request.series().await? {
                if series.is_empty() {
                    log::warn!("{}: no samples in the window, skipping histogram", series.pv);
                    continue;
                }
                let report = histogram(&scale, &series, bins)?;
                emit(out, format, &report, |out| output::histogram_text(out, &report))?;
            }
        }

        Commands::Spectrogram { data, fmin, fmax } => {
            if data.variable.is_some_and(|v| !v.is_waveform()) {
                bail!("spectrogram needs the {} variable", Variable::Fft);
            }
            let request = DataRequest::from_args(&data, Variable::Fft)?;
            for series in request.spectra().await?.iter().filter(|s| has_frames(s)) {
                let spectrogram = Spectrogram::build(series, fmin..fmax)
                    .with_context(|| format!("building spectrogram of {}", series.pv))?;
                emit(out, format, &spectrogram, |out| output::spectrogram_text(out, &spectrogram))?;
            }
        }
    }

    Ok(())
}

/// Severity scale from `path`, or the standard VC table
pub fn load_scale(path: Option<&Path>) -> Result<SeverityScale> {
    let Some(path) = path else {
        return Ok(SeverityScale::iest_rp_cc012());
    };

    let text = std::fs::read_to_string(path).with_context(|| format!("reading scale file {}", path.display()))?;
    let config: ScaleConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing scale file {}", path.display()))?;
    let scale = SeverityScale::try_from(config).with_context(|| format!("invalid scale in {}", path.display()))?;

    log::info!("Loaded {} levels from {}", scale.len(), path.display());
    Ok(scale)
}

/// Parse an RFC 3339 time or a `YYYY-MM-DD` date (midnight UTC)
pub fn parse_time(text: &str) -> Result<Timestamp> {
    let millis = if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        time.timestamp_millis()
    } else if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc().timestamp_millis())
            .with_context(|| format!("invalid date {}", text))?
    } else {
        bail!("cannot parse time {:?}: expected RFC 3339 or YYYY-MM-DD", text);
    };

    Timestamp::try_from(millis).with_context(|| format!("time {} is before 1970", text))
}

/// Window from the optional `--start`/`--end`; default the last day up to now
pub fn resolve_window(start: Option<&str>, end: Option<&str>, now_ms: Timestamp) -> Result<TimeWindow> {
    let end_ms = end.map(parse_time).transpose()?.unwrap_or(now_ms);
    let start_ms = match start.map(parse_time).transpose()? {
        Some(start_ms) => start_ms,
        None => end_ms.saturating_sub(u64::from(DEFAULT_LOOKBACK_HOURS) * MS_PER_HOUR),
    };

    if start_ms >= end_ms {
        bail!("empty time window: start must be before end");
    }
    Ok(TimeWindow::new(start_ms, end_ms))
}

fn scalar_variable(data: &DataArgs) -> Result<Variable> {
    match data.variable {
        Some(variable) if variable.is_waveform() => {
            bail!("{} is a waveform; use the spectrogram command", variable)
        }
        _ => Ok(Variable::VcPeak),
    }
}

fn has_frames(series: &SpectrumSeries) -> bool {
    if series.frames.is_empty() {
        log::warn!("{}: no spectra in the window, skipping", series.pv);
        return false;
    }
    true
}

fn frame_width(series: &SpectrumSeries) -> usize {
    series.frames.first().map(|f| f.bins.len()).unwrap_or(0)
}

fn histogram<C: Classifier>(classifier: &C, series: &ChannelSeries, bins: usize) -> Result<HistogramReport> {
    let classified = classify_series(classifier, series);
    let velocity = LogHistogram::build(&series.values(), bins, None)
        .with_context(|| format!("velocity histogram of {}", series.pv))?;
    Ok(HistogramReport {
        levels: LevelHistogram::build(classifier, &classified),
        velocity,
    })
}

/// Resolved PVs, window and source of one data command
struct DataRequest {
    source: Arc<dyn ArchiveSource>,
    pvs: Vec<String>,
    variable: Variable,
    window: TimeWindow,
}

impl DataRequest {
    fn from_args(data: &DataArgs, variable: Variable) -> Result<Self> {
        let raw = match data.beamline.as_deref() {
            Some(raw) => raw,
            None => {
                log::warn!("{} not set, defaulting to {}", BEAMLINE_ENV_VAR, DEFAULT_BEAMLINE);
                DEFAULT_BEAMLINE
            }
        };
        let beamline = Beamline::canonical(raw)?;

        let naming = PvNaming::new(data.pv_template.clone());
        let pvs = naming.build(&beamline, variable, data.id, &data.channels);

        let window = resolve_window(data.start.as_deref(), data.end.as_deref(), now_ms())?;

        let source: Arc<dyn ArchiveSource> = match &data.input {
            Some(path) => Arc::new(MemorySource::load(path)?),
            None => Arc::new(ArchiverClient::new(ArchiverConfig::new(data.appliance.as_str()))?),
        };
        log::debug!("{} PVs from {} over {:?}", pvs.len(), source.describe(), window);

        Ok(Self { source, pvs, variable, window })
    }

    async fn series(&self) -> Result<Vec<ChannelSeries>> {
        let series = fetch_series(Arc::clone(&self.source), &self.pvs, self.window)
            .await
            .with_context(|| format!("fetching from {}", self.source.describe()))?;
        Ok(series)
    }

    async fn spectra(&self) -> Result<Vec<SpectrumSeries>> {
        let spectra = fetch_spectra(Arc::clone(&self.source), &self.pvs, self.window)
            .await
            .with_context(|| format!("fetching from {}", self.source.describe()))?;
        Ok(spectra)
    }
}

fn now_ms() -> Timestamp {
    Timestamp::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
