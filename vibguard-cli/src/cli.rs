use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use vibguard_connectors::archiver::DEFAULT_APPLIANCE_URL;
use vibguard_core::constants::{
    DEFAULT_ALARM_LABEL, DEFAULT_ALARM_MERGE_GAP_MS, DEFAULT_CHANNEL, DEFAULT_FREQ_RANGE, DEFAULT_HISTOGRAM_BINS,
    DEFAULT_KIT_ID, DEFAULT_PV_TEMPLATE, MS_PER_SECOND,
};
use vibguard_core::Variable;

#[derive(Parser, Debug)]
#[command(name = "vibguard", author, version, long_about = None)]
#[command(about = "Classify archived beamline vibration against the VC curves")]
pub struct Cli {
    /// Severity scale JSON file (default: IEST-RP-CC012 VC curves)
    #[arg(long, global = true, value_name = "FILE")]
    pub scale: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the severity scale
    Levels,
    /// Classify velocities given in m/s
    Classify {
        /// Velocities (m/s)
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },
    /// Print the upper velocity bound of a level
    Threshold {
        /// Level label, e.g. G
        label: String,
    },
    /// Fetch channels and classify every sample
    Fetch {
        #[command(flatten)]
        data: DataArgs,
        /// Rows printed per PV
        #[arg(long, default_value_t = 10)]
        head: usize,
    },
    /// Alarm events at or above a VC level
    Alarms {
        #[command(flatten)]
        data: DataArgs,
        /// Level whose limit raises an alarm
        #[arg(long, default_value = DEFAULT_ALARM_LABEL)]
        threshold: String,
        /// Largest gap between samples of one event (seconds)
        #[arg(long, default_value_t = DEFAULT_ALARM_MERGE_GAP_MS / MS_PER_SECOND)]
        merge_gap: u64,
    },
    /// Time spent at each level and velocity distribution
    Histogram {
        #[command(flatten)]
        data: DataArgs,
        /// Logarithmic velocity bins
        #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
        bins: usize,
    },
    /// Spectrum summary of FFT channels
    Spectrogram {
        #[command(flatten)]
        data: DataArgs,
        /// Lowest frequency bin (Hz)
        #[arg(long, default_value_t = DEFAULT_FREQ_RANGE.start)]
        fmin: usize,
        /// Frequency bin past the last one kept (Hz)
        #[arg(long, default_value_t = DEFAULT_FREQ_RANGE.end)]
        fmax: usize,
    },
}

/// Where the data comes from
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Beamline, e.g. i20 or BL20I
    #[arg(long, env = "BEAMLINE")]
    pub beamline: Option<String>,

    /// Variable to fetch (VC_PEAK or FFT)
    #[arg(long)]
    pub variable: Option<Variable>,

    /// Accelerometer kit number
    #[arg(long, default_value_t = DEFAULT_KIT_ID)]
    pub id: u32,

    /// Channel number (repeatable)
    #[arg(long = "channel", default_values_t = [DEFAULT_CHANNEL])]
    pub channels: Vec<u32>,

    /// Window start, RFC 3339 or YYYY-MM-DD (UTC)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end, RFC 3339 or YYYY-MM-DD (UTC); default now
    #[arg(long)]
    pub end: Option<String>,

    /// Archiver Appliance base URL
    #[arg(long, default_value = DEFAULT_APPLIANCE_URL)]
    pub appliance: String,

    /// Saved getData.json response to read instead of the appliance
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// PV name template
    #[arg(long, default_value = DEFAULT_PV_TEMPLATE)]
    pub pv_template: String,
}
