//! Amplitude envelopes.
//!
//! An envelope shapes a voice's loudness over its lifetime and decides when
//! the voice is finished. Amplitudes lie in [0, 1].

use super::interpolation::Interpolation;
use super::oscillator::Oscillator;
use super::varying::{Interpolated, Point, Varying};

/// Attack/decay/sustain/release durations (seconds) and sustain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    pub release: f64,
}

#[derive(Debug, Clone)]
pub enum Envelope {
    /// Fixed level; done only when the level is exactly 0.
    Constant(f64),
    /// Full volume until the remaining time runs out, then silence.
    BrickWall { remaining: f64 },
    /// Amplitude follows a keyframe curve; done when a finite curve runs out.
    Segment(Interpolated),
    /// Product of all children; done as soon as any child is.
    Composite(Vec<Envelope>),
    /// Inner envelope multiplied by a gain trajectory.
    Scaled { inner: Box<Envelope>, gain: Varying },
    /// Periodic dip of depth `strength` driven by an oscillator. Never done.
    Tremolo { osc: Oscillator, strength: f64 },
}

impl Envelope {
    pub fn brick_wall(duration: f64) -> Self {
        Envelope::BrickWall { remaining: duration }
    }

    pub fn scaled(self, gain: impl Into<Varying>) -> Self {
        Envelope::Scaled {
            inner: Box::new(self),
            gain: gain.into(),
        }
    }

    pub fn amplitude(&self) -> f64 {
        match self {
            Envelope::Constant(level) => *level,
            Envelope::BrickWall { remaining } => {
                if *remaining > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Envelope::Segment(curve) => curve.value(),
            Envelope::Composite(children) => children.iter().map(Envelope::amplitude).product(),
            Envelope::Scaled { inner, gain } => inner.amplitude() * gain.value().clamp(0.0, 1.0),
            Envelope::Tremolo { osc, strength } => {
                let swing = 0.5 * (osc.value() + 1.0);
                (1.0 - strength * swing).max(0.0)
            }
        }
    }

    pub fn done(&self) -> bool {
        match self {
            Envelope::Constant(level) => *level == 0.0,
            Envelope::BrickWall { remaining } => *remaining <= 0.0,
            Envelope::Segment(curve) => curve.is_exhausted(),
            Envelope::Composite(children) => children.iter().any(Envelope::done),
            Envelope::Scaled { inner, .. } => inner.done(),
            Envelope::Tremolo { .. } => false,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        match self {
            Envelope::Constant(_) => {}
            Envelope::BrickWall { remaining } => *remaining -= dt,
            Envelope::Segment(curve) => curve.advance(dt),
            Envelope::Composite(children) => {
                // Finished children keep ticking; their contribution is already fixed.
                for child in children.iter_mut() {
                    child.advance(dt);
                }
            }
            Envelope::Scaled { inner, gain } => {
                inner.advance(dt);
                gain.advance(dt);
            }
            Envelope::Tremolo { osc, .. } => osc.advance(dt),
        }
    }
}

/// ADSR with straight-line segments, lasting exactly `total_duration`.
pub fn linear_adsr(total_duration: f64, params: Adsr) -> Envelope {
    adsr_with(total_duration, params, Interpolation::Linear)
}

/// ADSR with cosine-eased segments, lasting exactly `total_duration`.
pub fn cosine_adsr(total_duration: f64, params: Adsr) -> Envelope {
    adsr_with(total_duration, params, Interpolation::Cosine)
}

/// Two independent curves multiplied together: a finite release curve that
/// alone sets the lifetime, and an infinite attack/decay curve that settles
/// on the sustain level.
pub fn adsr_with(total_duration: f64, params: Adsr, interpolation: Interpolation) -> Envelope {
    let total = total_duration.max(0.0);
    let release_dur = params.release.clamp(0.0, total);
    let before_release = total - release_dur;

    let release = Interpolated::new(vec![
        Point::new(0.0, 1.0),
        Point::new(before_release, 1.0),
        Point::new(total, 0.0),
    ])
    .with_interpolation(interpolation);

    let attack_decay = Interpolated::new(vec![
        Point::new(0.0, 0.0),
        Point::new(params.attack, 1.0),
        Point::new(params.attack + params.decay, params.sustain),
    ])
    .with_interpolation(interpolation)
    .infinite();

    Envelope::Composite(vec![Envelope::Segment(release), Envelope::Segment(attack_decay)])
}
