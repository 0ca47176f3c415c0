//! Varying — scalars that change over time.
//!
//! A `Varying` owns its own clock. Callers move it forward with
//! [`Varying::advance`] and read it with [`Varying::value`]; reading never
//! mutates. Frequencies, amplitudes, and modulation depths are all expressed
//! as Varyings, so any of them can follow keyframes or wobble periodically.

use super::interpolation::Interpolation;
use super::oscillator::Oscillator;

/// Oscillation rate used when an [`Oscillating`] is built without one.
pub const DEFAULT_OSCILLATION_HZ: f64 = 5.0;

/// A time-varying scalar.
#[derive(Debug, Clone)]
pub enum Varying {
    Constant(f64),
    Interpolated(Interpolated),
    Oscillating(Box<Oscillating>),
    /// Applies a pure function to the inner value on read.
    Map(Box<Varying>, fn(f64) -> f64),
}

impl Varying {
    pub fn value(&self) -> f64 {
        match self {
            Varying::Constant(c) => *c,
            Varying::Interpolated(v) => v.value(),
            Varying::Oscillating(v) => v.value(),
            Varying::Map(inner, f) => f(inner.value()),
        }
    }

    pub fn advance(&mut self, dt: f64) {
        match self {
            Varying::Constant(_) => {}
            Varying::Interpolated(v) => v.advance(dt),
            Varying::Oscillating(v) => v.advance(dt),
            Varying::Map(inner, _) => inner.advance(dt),
        }
    }

    pub fn map(self, f: fn(f64) -> f64) -> Varying {
        Varying::Map(Box::new(self), f)
    }
}

impl From<f64> for Varying {
    fn from(c: f64) -> Self {
        Varying::Constant(c)
    }
}

impl From<Interpolated> for Varying {
    fn from(v: Interpolated) -> Self {
        Varying::Interpolated(v)
    }
}

impl From<Oscillating> for Varying {
    fn from(v: Oscillating) -> Self {
        Varying::Oscillating(Box::new(v))
    }
}

// ── Keyframe interpolation ──────────────────────────────────

/// A keyframe: `value` at `time` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub time: f64,
    pub value: f64,
}

impl Point {
    pub fn new(time: f64, value: f64) -> Self {
        Point { time, value }
    }
}

/// Piecewise-interpolated keyframe sequence.
///
/// Past the last keyframe a finite sequence reads 0 and reports
/// [`is_exhausted`](Self::is_exhausted); an infinite one holds the last value.
/// A cyclic sequence wraps its clock at the last keyframe's time.
#[derive(Debug, Clone)]
pub struct Interpolated {
    points: Vec<Point>,
    interpolation: Interpolation,
    cyclic: bool,
    infinite: bool,
    t: f64,
    /// Index of the segment start; only moves forward unless cyclic.
    index: usize,
}

impl Interpolated {
    /// Build from time-ascending points. Times are shifted so the first
    /// point sits at zero.
    pub fn new(mut points: Vec<Point>) -> Self {
        if let Some(origin) = points.first().map(|p| p.time) {
            if origin != 0.0 {
                for p in &mut points {
                    p.time -= origin;
                }
            }
        }
        Interpolated {
            points,
            interpolation: Interpolation::Linear,
            cyclic: false,
            infinite: false,
            t: 0.0,
            index: 0,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Hold the last value forever instead of dropping to 0.
    pub fn infinite(mut self) -> Self {
        self.infinite = true;
        self
    }

    /// Loop back to the start after the last keyframe. Implies `infinite`.
    pub fn cyclic(mut self) -> Self {
        self.cyclic = true;
        self.infinite = true;
        self
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Local clock in seconds (wrapped for cyclic sequences).
    pub fn time(&self) -> f64 {
        self.t
    }

    /// True once a finite sequence has run past its last keyframe.
    ///
    /// This is the single past-the-end rule: [`value`](Self::value) reads 0
    /// exactly when this holds, and envelope segments use it as `done`.
    pub fn is_exhausted(&self) -> bool {
        if self.infinite {
            return false;
        }
        match self.points.last() {
            Some(last) => self.t >= last.time,
            None => true,
        }
    }

    pub fn value(&self) -> f64 {
        let Some(last) = self.points.last() else {
            return 0.0;
        };
        if self.t >= last.time {
            return if self.infinite { last.value } else { 0.0 };
        }

        let p0 = self.points[self.index];
        let p1 = self.points[self.index + 1];
        if p0.value == p1.value {
            return p0.value;
        }
        let span = p1.time - p0.time;
        if span <= 0.0 {
            return p1.value;
        }
        self.interpolation.apply((self.t - p0.time) / span, p0.value, p1.value)
    }

    pub fn advance(&mut self, dt: f64) {
        let n = self.points.len();
        let Some(last_time) = self.points.last().map(|p| p.time) else {
            return;
        };

        self.t += dt;
        if self.t >= last_time && !self.cyclic {
            return;
        }

        loop {
            while self.index + 1 < n && self.t >= self.points[self.index + 1].time {
                self.index += 1;
            }
            if self.index + 1 < n {
                return;
            }
            // Ran off the end; only cyclic sequences get here.
            if last_time <= 0.0 {
                return;
            }
            self.index = 0;
            self.t -= last_time;
        }
    }
}

// ── Periodic modulation ─────────────────────────────────────

/// A base Varying with sine modulation on top.
///
/// `value = base + (additive + base * multiplicative) * sin(phase)`.
/// Vibrato uses the multiplicative term on a frequency trajectory; tremolo
/// uses the additive term around a constant 1.
#[derive(Debug, Clone)]
pub struct Oscillating {
    base: Varying,
    osc: Oscillator,
    freq: Varying,
    additive: Option<Varying>,
    multiplicative: Option<Varying>,
}

impl Oscillating {
    pub fn new(base: impl Into<Varying>) -> Self {
        Oscillating {
            base: base.into(),
            osc: Oscillator::sine(),
            freq: Varying::Constant(DEFAULT_OSCILLATION_HZ),
            additive: None,
            multiplicative: None,
        }
    }

    /// Modulation rate in Hz.
    pub fn frequency(mut self, freq: impl Into<Varying>) -> Self {
        self.freq = freq.into();
        self
    }

    /// Depth in absolute units.
    pub fn additive(mut self, depth: impl Into<Varying>) -> Self {
        self.additive = Some(depth.into());
        self
    }

    /// Depth as a fraction of the base value.
    pub fn multiplicative(mut self, depth: impl Into<Varying>) -> Self {
        self.multiplicative = Some(depth.into());
        self
    }

    pub fn value(&self) -> f64 {
        let base = self.base.value();
        let mut delta = 0.0;
        if let Some(add) = &self.additive {
            delta += add.value();
        }
        if let Some(mul) = &self.multiplicative {
            delta += base * mul.value();
        }
        base + delta * self.osc.value()
    }

    pub fn advance(&mut self, dt: f64) {
        self.osc.advance(self.freq.value() * dt);
        self.base.advance(dt);
        self.freq.advance(dt);
        if let Some(add) = &mut self.additive {
            add.advance(dt);
        }
        if let Some(mul) = &mut self.multiplicative {
            mul.advance(dt);
        }
    }
}
