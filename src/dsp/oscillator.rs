//! Phase-accumulating oscillators.
//!
//! Oscillators run "at 1 Hz": [`Oscillator::advance`] takes a phase step in
//! cycles, so callers scale by frequency × dt. Cloning gives an independent
//! copy of the phase state, which is how harmonic stacks and detuned
//! ensembles get their own voices from one template.

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::varying::Varying;

/// Nominal pitch assumed for spectra that don't declare one.
pub const DEFAULT_SPECTRUM_FREQ: f64 = 440.0;

/// Carrier waveform generator. Values lie in [-1, 1].
#[derive(Debug, Clone)]
pub enum Oscillator {
    Null,
    Sine { phase: f64 },
    Multi(MultiOscillator),
}

impl Oscillator {
    pub fn sine() -> Self {
        Oscillator::Sine { phase: 0.0 }
    }

    pub fn value(&self) -> f64 {
        match self {
            Oscillator::Null => 0.0,
            Oscillator::Sine { phase } => (2.0 * PI * phase).sin(),
            Oscillator::Multi(m) => m.value(),
        }
    }

    /// Step the phase by `du` cycles.
    pub fn advance(&mut self, du: f64) {
        match self {
            Oscillator::Null => {}
            Oscillator::Sine { phase } => *phase += du,
            Oscillator::Multi(m) => m.advance(du),
        }
    }
}

/// Weighted sum of child oscillators, each running at its own multiple of
/// the carrier rate.
///
/// Multipliers are Varyings so harmonic tuning and weight can drift. They are
/// clocked by the same phase step the children receive.
#[derive(Debug, Clone)]
pub struct MultiOscillator {
    children: Vec<Oscillator>,
    freq_mul: Vec<Varying>,
    weights: Vec<Varying>,
    scale: f64,
}

impl MultiOscillator {
    pub fn new(scale: f64) -> Self {
        MultiOscillator {
            children: Vec::new(),
            freq_mul: Vec::new(),
            weights: Vec::new(),
            scale,
        }
    }

    pub fn push(
        &mut self,
        child: Oscillator,
        freq_mul: impl Into<Varying>,
        weight: impl Into<Varying>,
    ) {
        self.children.push(child);
        self.freq_mul.push(freq_mul.into());
        self.weights.push(weight.into());
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current frequency multiplier of each child.
    pub fn multipliers(&self) -> Vec<f64> {
        self.freq_mul.iter().map(Varying::value).collect()
    }

    /// Current weight of each child.
    pub fn weights(&self) -> Vec<f64> {
        self.weights.iter().map(Varying::value).collect()
    }

    pub fn value(&self) -> f64 {
        let sum: f64 = self
            .children
            .iter()
            .zip(&self.weights)
            .map(|(osc, w)| osc.value() * w.value())
            .sum();
        sum * self.scale
    }

    pub fn advance(&mut self, du: f64) {
        let voices = self.children.iter_mut().zip(&mut self.freq_mul);
        for ((osc, mul), w) in voices.zip(&mut self.weights) {
            osc.advance(mul.value() * du);
            mul.advance(du);
            w.advance(du);
        }
    }
}

impl From<MultiOscillator> for Oscillator {
    fn from(m: MultiOscillator) -> Self {
        Oscillator::Multi(m)
    }
}

/// `1/sqrt(total)`, or silence if there is no weight at all.
fn energy_scale(total: f64) -> f64 {
    if total > 0.0 { 1.0 / total.sqrt() } else { 0.0 }
}

// ── Randomized detune ensemble ──────────────────────────────

/// Standard weighting curves for [`randomized`]. The argument is
/// `1 - p` for a uniform draw `p`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    Linear,
    Exponential(f64),
}

impl Falloff {
    pub fn weight(self, t: f64) -> f64 {
        match self {
            Falloff::Linear => t,
            Falloff::Exponential(c) => (-c * t).exp(),
        }
    }
}

/// Ensemble of `n` randomly phased, randomly detuned copies of `template`.
///
/// Each copy gets multiplier `1 + width * (2p - 1)` and weight
/// `weight(1 - p)` for its own uniform draw `p`. Output is scaled by
/// `1/sqrt(total weight)` to keep power steady across `n`.
pub fn randomized<R: Rng>(
    template: &Oscillator,
    n: usize,
    width: f64,
    weight: impl Fn(f64) -> f64,
    rng: &mut R,
) -> Oscillator {
    let mut children = Vec::with_capacity(n);
    let mut total = 0.0;
    for _ in 0..n {
        let p: f64 = rng.random();
        let w = weight(1.0 - p);
        total += w;
        let mut osc = template.clone();
        osc.advance(rng.random());
        children.push((osc, 1.0 + width * (p * 2.0 - 1.0), w));
    }

    let mut multi = MultiOscillator::new(energy_scale(total));
    for (osc, mul, w) in children {
        multi.push(osc, mul, w);
    }
    multi.into()
}

// ── Spectrum ────────────────────────────────────────────────

/// One partial of a measured spectrum. `phase` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub frequency: f64,
    pub amplitude: f64,
    #[serde(default)]
    pub phase: f64,
}

/// One sine per partial, retuned so that playing the result at `nominal` Hz
/// reproduces the measured spectrum. `nominal <= 0` means 440 Hz.
pub fn from_spectrum(nominal: f64, points: &[SpectrumPoint]) -> Oscillator {
    let nominal = if nominal > 0.0 { nominal } else { DEFAULT_SPECTRUM_FREQ };
    let correction = 1.0 / nominal;

    let total: f64 = points.iter().map(|p| p.amplitude).sum();
    let mut multi = MultiOscillator::new(energy_scale(total));
    for p in points {
        let mut osc = Oscillator::sine();
        if p.phase > 0.0 {
            osc.advance((PI + p.phase) / (2.0 * PI));
        }
        multi.push(osc, p.frequency * correction, p.amplitude);
    }
    log::debug!("loaded spectrum with {} partials at nominal {nominal} Hz", points.len());
    multi.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sine_zero_at_start() {
        let osc = Oscillator::sine();
        assert!(osc.value().abs() < 1e-12);
    }

    #[test]
    fn sine_quarter_cycle_peaks() {
        let mut osc = Oscillator::sine();
        osc.advance(0.25);
        assert!((osc.value() - 1.0).abs() < 1e-12);
        osc.advance(0.5);
        assert!((osc.value() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn sine_range() {
        let mut osc = Oscillator::sine();
        for _ in 0..44100 {
            osc.advance(440.0 / 44100.0);
            let s = osc.value();
            assert!((-1.0..=1.0).contains(&s), "Sine out of range: {s}");
        }
    }

    #[test]
    fn null_is_silent() {
        let mut osc = Oscillator::Null;
        osc.advance(0.3);
        assert_eq!(osc.value(), 0.0);
    }

    #[test]
    fn clone_has_independent_phase() {
        let mut a = Oscillator::sine();
        a.advance(0.1);
        let mut b = a.clone();
        b.advance(0.15);
        assert!((a.value() - (2.0 * PI * 0.1).sin()).abs() < 1e-12);
        assert!((b.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn multi_scales_children_by_multiplier() {
        let mut m = MultiOscillator::new(1.0);
        m.push(Oscillator::sine(), 2.0, 1.0);
        let mut osc: Oscillator = m.into();
        osc.advance(0.125);
        assert!((osc.value() - 1.0).abs() < 1e-12, "child should be a quarter cycle in");
    }

    #[test]
    fn multi_weighted_sum() {
        let mut m = MultiOscillator::new(0.5);
        m.push(Oscillator::sine(), 1.0, 1.0);
        m.push(Oscillator::sine(), 1.0, 3.0);
        m.advance(0.25);
        assert!((m.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn randomized_energy_normalization() {
        let mut rng = StdRng::seed_from_u64(7);
        let falloff = Falloff::Exponential(2.0);
        let osc = randomized(&Oscillator::sine(), 16, 0.01, |t| falloff.weight(t), &mut rng);
        let Oscillator::Multi(m) = osc else {
            panic!("expected a multi-oscillator");
        };
        assert_eq!(m.len(), 16);
        let total: f64 = m.weights().iter().sum();
        assert!((m.scale() - 1.0 / total.sqrt()).abs() < 1e-12);
        for mul in m.multipliers() {
            assert!((0.99..=1.01).contains(&mul), "detune out of range: {mul}");
        }
    }

    #[test]
    fn randomized_is_reproducible_with_seed() {
        let a = randomized(&Oscillator::sine(), 4, 0.05, |t| t, &mut StdRng::seed_from_u64(1));
        let b = randomized(&Oscillator::sine(), 4, 0.05, |t| t, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn randomized_empty_is_silent() {
        let osc = randomized(&Oscillator::sine(), 0, 0.1, |t| t, &mut StdRng::seed_from_u64(0));
        assert_eq!(osc.value(), 0.0);
    }

    #[test]
    fn spectrum_retunes_to_nominal() {
        let points = [
            SpectrumPoint { frequency: 220.0, amplitude: 1.0, phase: 0.0 },
            SpectrumPoint { frequency: 440.0, amplitude: 3.0, phase: 0.0 },
        ];
        let Oscillator::Multi(m) = from_spectrum(0.0, &points) else {
            panic!("expected a multi-oscillator");
        };
        assert_eq!(m.multipliers(), vec![0.5, 1.0]);
        assert!((m.scale() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn spectrum_applies_phase_offset() {
        let points = [SpectrumPoint { frequency: 100.0, amplitude: 1.0, phase: PI / 2.0 }];
        let osc = from_spectrum(100.0, &points);
        // Pre-advanced by (π + π/2) / 2π = 0.75 cycles.
        assert!((osc.value() + 1.0).abs() < 1e-12, "got {}", osc.value());
    }

    #[test]
    fn falloff_curves() {
        assert_eq!(Falloff::Linear.weight(0.3), 0.3);
        assert!((Falloff::Exponential(1.0).weight(1.0) - (-1.0f64).exp()).abs() < 1e-12);
    }
}
