//! PV naming for the vibration IOCs
//!
//! Each accelerometer kit publishes one PV per channel and variable:
//!
//! ```text
//! BL20I-DI-ACCEL-01:DATA:CH02:VC_PEAK
//! └─┬─┘          └┬┘      └┬┘ └──┬──┘
//! beamline       kit    chan   variable
//! ```
//!
//! Beamlines are usually known by their short name (`i20`, `j08`); the PV
//! uses the canonical form (`BL20I`, `BL08J`).

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Write};
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::channels::{CANONICAL_BEAMLINE_PREFIXES, DEFAULT_PV_TEMPLATE};
use crate::errors::ChannelError;

/// Variables published per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Variable {
    /// Peak 1/3-octave velocity (scalar, m/s)
    #[cfg_attr(feature = "serde", serde(rename = "VC_PEAK"))]
    VcPeak,
    /// FFT waveform
    #[cfg_attr(feature = "serde", serde(rename = "FFT"))]
    Fft,
}

impl Variable {
    /// Every supported variable
    pub const ALL: [Variable; 2] = [Variable::VcPeak, Variable::Fft];

    /// PV suffix
    pub const fn as_str(&self) -> &'static str {
        match self {
            Variable::VcPeak => "VC_PEAK",
            Variable::Fft => "FFT",
        }
    }

    /// True if the PV archives arrays rather than scalars
    pub const fn is_waveform(&self) -> bool {
        matches!(self, Variable::Fft)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variable {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChannelError::UnsupportedVariable { variable: s.to_string() })
    }
}

/// Beamline in canonical `BL<nn><X>` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Beamline(String);

impl Beamline {
    /// Canonicalise a beamline name: `i20` → `BL20I`.
    ///
    /// Names already starting with `BL` are kept as given.
    pub fn canonical(raw: &str) -> Result<Self, ChannelError> {
        let raw = raw.trim();
        let unsupported = || ChannelError::UnsupportedBeamline { beamline: raw.to_string() };

        if raw.starts_with("BL") && raw.len() > 2 {
            return Ok(Self(raw.to_string()));
        }

        let mut chars = raw.chars();
        let prefix = chars.next().ok_or_else(unsupported)?;
        let number = chars.as_str();

        if !CANONICAL_BEAMLINE_PREFIXES.contains(&prefix)
            || number.is_empty()
            || !number.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(unsupported());
        }

        Ok(Self(alloc::format!("BL{}{}", number, prefix.to_ascii_uppercase())))
    }

    /// Canonical name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Beamline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// PV name template.
///
/// Placeholders `{beamline}`, `{id}`, `{chan}` and `{var}`; numeric ones
/// accept a zero-padded width, e.g. `{chan:02}`. Unknown placeholders are
/// copied through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvNaming {
    template: String,
}

impl Default for PvNaming {
    fn default() -> Self {
        Self::new(DEFAULT_PV_TEMPLATE)
    }
}

impl PvNaming {
    /// Naming from a custom template
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Template text
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Name of one channel's PV
    pub fn pv_name(&self, beamline: &Beamline, variable: Variable, id: u32, channel: u32) -> String {
        let mut out = String::with_capacity(self.template.len() + 8);
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };

            let placeholder = &after[..close];
            if !render_placeholder(&mut out, placeholder, beamline, variable, id, channel) {
                out.push('{');
                out.push_str(placeholder);
                out.push('}');
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    /// PV names for several channels of one kit
    pub fn build(&self, beamline: &Beamline, variable: Variable, id: u32, channels: &[u32]) -> Vec<String> {
        channels
            .iter()
            .map(|&channel| self.pv_name(beamline, variable, id, channel))
            .collect()
    }
}

fn render_placeholder(
    out: &mut String,
    placeholder: &str,
    beamline: &Beamline,
    variable: Variable,
    id: u32,
    channel: u32,
) -> bool {
    let (name, spec) = match placeholder.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (placeholder, None),
    };

    let number = match name {
        "beamline" => return spec.is_none() && out.write_str(beamline.as_str()).is_ok(),
        "var" => return spec.is_none() && out.write_str(variable.as_str()).is_ok(),
        "id" => id,
        "chan" => channel,
        _ => return false,
    };

    let width = match spec {
        None => 0,
        Some(spec) => match spec.strip_prefix('0').and_then(|w| w.parse::<usize>().ok()) {
            Some(width) => width,
            None => return false,
        },
    };

    write!(out, "{:0width$}", number, width = width).is_ok()
}
