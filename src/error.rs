use std::fmt;

/// Top-level error for compiling and rendering scores.
#[derive(Debug)]
pub enum SynthError {
    Config(ConfigError),
    Json(serde_json::Error),
    Wav(hound::Error),
    /// The encoded stream left [-1, 1]. The file is still complete.
    Clipping { peak: f64, frames: u64 },
}

/// A chirp description that cannot be turned into a voice.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownOscillator { kind: String },
    UnknownEnvelope { kind: String },
    InvalidOscillator { kind: String, reason: String },
    FirstKeyframeAfterZero { param: &'static str, time: f64 },
    NotAscending { param: &'static str, previous: f64, next: f64 },
    HoldWithoutPredecessor { param: &'static str },
    ExtractionFailed { param: &'static str, time: f64 },
    NonFiniteTime { param: &'static str, time: f64 },
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::Config(e) => write!(f, "Config error: {e}"),
            SynthError::Json(e) => write!(f, "JSON error: {e}"),
            SynthError::Wav(e) => write!(f, "WAV error: {e}"),
            SynthError::Clipping { peak, frames } => {
                write!(f, "Clipping: peak {peak} > 1.0 in {frames} frames")
            }
        }
    }
}

impl std::error::Error for SynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthError::Config(e) => Some(e),
            SynthError::Json(e) => Some(e),
            SynthError::Wav(e) => Some(e),
            SynthError::Clipping { .. } => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownOscillator { kind } => {
                write!(f, "Unhandled kind of oscillator: '{kind}'")
            }
            ConfigError::UnknownEnvelope { kind } => {
                write!(f, "Unhandled kind of envelope: '{kind}'")
            }
            ConfigError::InvalidOscillator { kind, reason } => {
                write!(f, "Invalid '{kind}' oscillator: {reason}")
            }
            ConfigError::FirstKeyframeAfterZero { param, time } => write!(
                f,
                "Interpolation sequence for {param}: first value cannot have time > 0 (got {time})"
            ),
            ConfigError::NotAscending {
                param,
                previous,
                next,
            } => write!(
                f,
                "Interpolation sequence for {param}: times not strictly ascending \
                 ({previous} >= {next})"
            ),
            ConfigError::HoldWithoutPredecessor { param } => {
                write!(f, "Interpolation sequence for {param}: hold with no previous value")
            }
            ConfigError::ExtractionFailed { param, time } => {
                write!(f, "Interpolation sequence for {param}: no value at t={time}")
            }
            ConfigError::NonFiniteTime { param, time } => {
                write!(f, "Interpolation sequence for {param}: keyframe time {time} is not finite")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for SynthError {
    fn from(e: ConfigError) -> Self {
        SynthError::Config(e)
    }
}

impl From<serde_json::Error> for SynthError {
    fn from(e: serde_json::Error) -> Self {
        SynthError::Json(e)
    }
}

impl From<hound::Error> for SynthError {
    fn from(e: hound::Error) -> Self {
        SynthError::Wav(e)
    }
}
