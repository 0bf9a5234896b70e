//! Vibration IOC Channel Naming
//!
//! The accelerometer IOCs publish one PV per channel and variable, named
//! after the beamline, the kit id and the channel number.

/// Default PV template.
///
/// Placeholders: `{beamline}`, `{id}`, `{chan}`, `{var}`. `{id}` and
/// `{chan}` may carry a `:02` width to zero-pad.
pub const DEFAULT_PV_TEMPLATE: &str = "{beamline}-DI-ACCEL-{id:02}:DATA:CH{chan:02}:{var}";

/// Beamline used when none is given and `BEAMLINE` is unset.
pub const DEFAULT_BEAMLINE: &str = "i20";

/// Environment variable naming the current beamline.
pub const BEAMLINE_ENV_VAR: &str = "BEAMLINE";

/// Beamline prefixes that follow the `BL<nn><X>` canonical scheme.
pub const CANONICAL_BEAMLINE_PREFIXES: [char; 3] = ['i', 'j', 'k'];

/// Default accelerometer kit id.
pub const DEFAULT_KIT_ID: u32 = 1;

/// Default channel list.
pub const DEFAULT_CHANNEL: u32 = 1;
