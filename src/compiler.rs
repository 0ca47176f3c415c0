//! Keyframe compiler — turns declarative chirp descriptions into voices.
//!
//! A chirp is described by sparse keyframes that set any subset of six
//! parameters. Each parameter is compiled into its own trajectory; values
//! missing at time zero come from a context that layers built-in defaults,
//! a shared context, and a per-chirp override.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::dsp::envelope::{self, Adsr, Envelope};
use crate::dsp::harmonics;
use crate::dsp::oscillator::{self, Falloff, Oscillator, SpectrumPoint};
use crate::dsp::varying::{Interpolated, Oscillating, Point};
use crate::dsp::voice::{Chirp, TimedChirp};
use crate::error::ConfigError;

// ── Keyframes ───────────────────────────────────────────────

/// A keyframe value: either a number, or "keep the previous value".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrHold {
    Value(f64),
    Hold,
}

/// Parameter settings at one keyframe. `None` leaves a parameter untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointSettings {
    /// Carrier frequency in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<ValueOrHold>,
    /// Gain [0, 1] applied on top of the envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<ValueOrHold>,
    /// Tremolo depth (absolute amplitude swing).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo_strength: Option<ValueOrHold>,
    /// Tremolo rate in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo_freq: Option<ValueOrHold>,
    /// Vibrato depth as a fraction of the carrier frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato_strength: Option<ValueOrHold>,
    /// Vibrato rate in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato_freq: Option<ValueOrHold>,
}

/// Settings that take effect `t` seconds into the chirp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub t: f64,
    #[serde(default)]
    pub settings: PointSettings,
}

/// The six parameters tracked per chirp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Freq,
    Amplitude,
    TremoloStrength,
    TremoloFreq,
    VibratoStrength,
    VibratoFreq,
}

impl Param {
    pub const ALL: [Param; 6] = [
        Param::Freq,
        Param::Amplitude,
        Param::TremoloStrength,
        Param::TremoloFreq,
        Param::VibratoStrength,
        Param::VibratoFreq,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Freq => "freq",
            Param::Amplitude => "amplitude",
            Param::TremoloStrength => "tremolo_strength",
            Param::TremoloFreq => "tremolo_freq",
            Param::VibratoStrength => "vibrato_strength",
            Param::VibratoFreq => "vibrato_freq",
        }
    }

    pub fn get(self, settings: &PointSettings) -> Option<ValueOrHold> {
        match self {
            Param::Freq => settings.freq,
            Param::Amplitude => settings.amplitude,
            Param::TremoloStrength => settings.tremolo_strength,
            Param::TremoloFreq => settings.tremolo_freq,
            Param::VibratoStrength => settings.vibrato_strength,
            Param::VibratoFreq => settings.vibrato_freq,
        }
    }

    fn slot(self, settings: &mut PointSettings) -> &mut Option<ValueOrHold> {
        match self {
            Param::Freq => &mut settings.freq,
            Param::Amplitude => &mut settings.amplitude,
            Param::TremoloStrength => &mut settings.tremolo_strength,
            Param::TremoloFreq => &mut settings.tremolo_freq,
            Param::VibratoStrength => &mut settings.vibrato_strength,
            Param::VibratoFreq => &mut settings.vibrato_freq,
        }
    }
}

// ── Instrument Configuration ────────────────────────────────

/// Oscillator selection. `kind` is one of "sine", "null", "randomized",
/// "spectrum", "harmonics"; the other fields apply to some kinds only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorConfig {
    pub kind: String,
    /// Template for "randomized" and "harmonics" (None = sine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Box<OscillatorConfig>>,
    /// Number of copies ("randomized") or harmonics ("harmonics").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Maximum relative detune for "randomized".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Weighting of detuned copies (None = linear).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub falloff: Option<Falloff>,
    /// Harmonic gain falloff exponent (None = 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Pitch the spectrum was measured at (None = 440 Hz).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<SpectrumPoint>,
}

impl OscillatorConfig {
    pub fn of_kind(kind: &str) -> Self {
        OscillatorConfig {
            kind: kind.to_string(),
            base: None,
            count: None,
            width: None,
            falloff: None,
            power: None,
            nominal_frequency: None,
            points: Vec::new(),
        }
    }
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        OscillatorConfig::of_kind("sine")
    }
}

/// Envelope selection: "adsr" (straight segments) or "cosine_adsr".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    pub kind: String,
    /// Attack time in seconds (None = engine default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<f64>,
    /// Decay time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay: Option<f64>,
    /// Sustain level [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustain: Option<f64>,
    /// Release time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<f64>,
}

pub const DEFAULT_ADSR: Adsr = Adsr {
    attack: 0.15,
    decay: 0.15,
    sustain: 0.7,
    release: 0.5,
};

impl EnvelopeConfig {
    pub fn adsr(&self) -> Adsr {
        Adsr {
            attack: self.attack.unwrap_or(DEFAULT_ADSR.attack),
            decay: self.decay.unwrap_or(DEFAULT_ADSR.decay),
            sustain: self.sustain.unwrap_or(DEFAULT_ADSR.sustain),
            release: self.release.unwrap_or(DEFAULT_ADSR.release),
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            kind: "adsr".to_string(),
            attack: Some(DEFAULT_ADSR.attack),
            decay: Some(DEFAULT_ADSR.decay),
            sustain: Some(DEFAULT_ADSR.sustain),
            release: Some(DEFAULT_ADSR.release),
        }
    }
}

/// Defaults for a chirp: initial parameter values and instrument choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<PointSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscillator: Option<OscillatorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<EnvelopeConfig>,
}

/// One chirp as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChirpConfig {
    /// Total length in seconds, release included.
    pub duration: f64,
    /// Onset in seconds from the start of the mix.
    #[serde(default)]
    pub begin_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_override: Option<Context>,
    #[serde(default)]
    pub points: Vec<Keyframe>,
    /// Seed for randomized oscillators (None = 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// A set of chirps sharing one context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub context: Option<Context>,
    #[serde(default)]
    pub chirps: Vec<ChirpConfig>,
}

// ── Context Resolution ──────────────────────────────────────

/// Built-in defaults: 440 Hz at full amplitude, no modulation (6 Hz rates),
/// sine oscillator, ADSR {0.15, 0.15, 0.7, 0.5}.
pub fn default_context() -> Context {
    let v = |x| Some(ValueOrHold::Value(x));
    Context {
        initial: Some(PointSettings {
            freq: v(440.0),
            amplitude: v(1.0),
            tremolo_strength: v(0.0),
            tremolo_freq: v(6.0),
            vibrato_strength: v(0.0),
            vibrato_freq: v(6.0),
        }),
        oscillator: Some(OscillatorConfig::default()),
        envelope: Some(EnvelopeConfig::default()),
    }
}

/// Layer `over` on top of `base`, field by field. Instrument configs are
/// replaced whole; initial settings per parameter.
pub fn merge(base: &Context, over: &Context) -> Context {
    let mut out = base.clone();
    if let Some(osc) = &over.oscillator {
        out.oscillator = Some(osc.clone());
    }
    if let Some(env) = &over.envelope {
        out.envelope = Some(env.clone());
    }
    if let Some(initial) = &over.initial {
        let target = out.initial.get_or_insert_with(PointSettings::default);
        for param in Param::ALL {
            if let Some(v) = param.get(initial) {
                *param.slot(target) = Some(v);
            }
        }
    }
    out
}

/// Defaults, then the shared context, then the per-chirp override.
pub fn resolve_context(context: Option<&Context>, chirp_override: Option<&Context>) -> Context {
    let empty = Context::default();
    merge(
        &merge(&default_context(), context.unwrap_or(&empty)),
        chirp_override.unwrap_or(&empty),
    )
}

// ── Compiler ────────────────────────────────────────────────

/// Compile one parameter's keyframes into a trajectory that holds its last
/// value forever.
///
/// Keyframes that don't mention `param` are skipped. If the first remaining
/// keyframe is after zero (or there is none), `initial` supplies the value at
/// time zero. A hold repeats the previous resolved value. Times must be
/// finite and strictly ascending.
pub fn compile_track(
    param: Param,
    initial: &PointSettings,
    points: &[Keyframe],
) -> Result<Interpolated, ConfigError> {
    let name = param.name();

    let mut entries: Vec<(f64, Option<ValueOrHold>)> = points
        .iter()
        .filter_map(|kf| param.get(&kf.settings).map(|v| (kf.t, Some(v))))
        .collect();
    if let Some(&(time, _)) = entries.iter().find(|(t, _)| !t.is_finite()) {
        return Err(ConfigError::NonFiniteTime { param: name, time });
    }

    if entries.first().is_none_or(|&(t, _)| t > 0.0) {
        entries.insert(0, (0.0, param.get(initial)));
    }
    let first_time = entries[0].0;
    if first_time > 0.0 {
        return Err(ConfigError::FirstKeyframeAfterZero { param: name, time: first_time });
    }

    let mut resolved: Vec<Point> = Vec::with_capacity(entries.len());
    for (t, setting) in entries {
        let previous = resolved.last().copied();
        if let Some(prev) = previous {
            if !(t > prev.time) {
                return Err(ConfigError::NotAscending {
                    param: name,
                    previous: prev.time,
                    next: t,
                });
            }
        }
        let value = match setting {
            Some(ValueOrHold::Value(v)) => v,
            Some(ValueOrHold::Hold) => match previous {
                Some(prev) => prev.value,
                None => return Err(ConfigError::HoldWithoutPredecessor { param: name }),
            },
            None => return Err(ConfigError::ExtractionFailed { param: name, time: t }),
        };
        resolved.push(Point::new(t, value));
    }

    Ok(Interpolated::new(resolved).infinite())
}

pub fn build_envelope(config: &EnvelopeConfig, duration: f64) -> Result<Envelope, ConfigError> {
    log::debug!("loading envelope: {config:?} for {duration}s");
    match config.kind.as_str() {
        "adsr" => Ok(envelope::linear_adsr(duration, config.adsr())),
        "cosine_adsr" => Ok(envelope::cosine_adsr(duration, config.adsr())),
        other => Err(ConfigError::UnknownEnvelope { kind: other.to_string() }),
    }
}

pub fn build_oscillator(
    config: &OscillatorConfig,
    rng: &mut StdRng,
) -> Result<Oscillator, ConfigError> {
    log::debug!("loading oscillator: {}", config.kind);
    let base = |rng: &mut StdRng| match &config.base {
        Some(b) => build_oscillator(b, rng),
        None => Ok(Oscillator::sine()),
    };
    let require_count = || {
        config.count.ok_or_else(|| ConfigError::InvalidOscillator {
            kind: config.kind.clone(),
            reason: "missing count".to_string(),
        })
    };

    match config.kind.as_str() {
        "sine" => Ok(Oscillator::sine()),
        "null" => Ok(Oscillator::Null),
        "spectrum" => Ok(oscillator::from_spectrum(
            config.nominal_frequency.unwrap_or(0.0),
            &config.points,
        )),
        "randomized" => {
            let count = require_count()?;
            let width = config.width.ok_or_else(|| ConfigError::InvalidOscillator {
                kind: config.kind.clone(),
                reason: "missing width".to_string(),
            })?;
            let falloff = config.falloff.unwrap_or(Falloff::Linear);
            let template = base(&mut *rng)?;
            Ok(oscillator::randomized(&template, count, width, |t| falloff.weight(t), rng))
        }
        "harmonics" => {
            let count = require_count()?;
            let template = base(&mut *rng)?;
            Ok(harmonics::with_harmonics(
                &template,
                harmonics::simple_seq(count, config.power.unwrap_or(1.0)),
            ))
        }
        other => Err(ConfigError::UnknownOscillator { kind: other.to_string() }),
    }
}

/// Compile a chirp description into a scheduled voice.
///
/// Either the whole chirp compiles or the first error is returned.
pub fn compile_chirp(
    config: &ChirpConfig,
    context: Option<&Context>,
) -> Result<TimedChirp, ConfigError> {
    let ctx = resolve_context(context, config.context_override.as_ref());
    let initial = ctx.initial.unwrap_or_default();

    let track = |param| compile_track(param, &initial, &config.points);
    let freq = track(Param::Freq)?;
    let amplitude = track(Param::Amplitude)?;
    let tremolo_strength = track(Param::TremoloStrength)?;
    let tremolo_freq = track(Param::TremoloFreq)?;
    let vibrato_strength = track(Param::VibratoStrength)?;
    let vibrato_freq = track(Param::VibratoFreq)?;

    let envelope = build_envelope(&ctx.envelope.unwrap_or_default(), config.duration)?;
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
    let oscillator = build_oscillator(&ctx.oscillator.unwrap_or_default(), &mut rng)?;

    let frequency = Oscillating::new(freq)
        .frequency(vibrato_freq)
        .multiplicative(vibrato_strength);
    let tremolo = Oscillating::new(1.0)
        .frequency(tremolo_freq)
        .additive(tremolo_strength);

    let chirp = Chirp::new(frequency, oscillator, envelope.scaled(amplitude)).with_tremolo(tremolo);
    log::debug!(
        "compiled chirp at {}s lasting {}s with {} keyframes",
        config.begin_time,
        config.duration,
        config.points.len()
    );
    Ok(TimedChirp::at(config.begin_time, chirp))
}

/// Compile every chirp in a score against the score's shared context.
pub fn compile_score(score: &Score) -> Result<Vec<TimedChirp>, ConfigError> {
    score
        .chirps
        .iter()
        .map(|c| compile_chirp(c, score.context.as_ref()))
        .collect()
}
