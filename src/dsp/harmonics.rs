//! Harmonic stacks built from a template oscillator.

use super::oscillator::{MultiOscillator, Oscillator};
use super::varying::Varying;

/// One partial of a harmonic stack.
#[derive(Debug, Clone)]
pub struct Harmonic {
    /// Frequency relative to the fundamental.
    pub freq_mul: Varying,
    /// Gain relative to the fundamental.
    pub amp_mul: Varying,
}

impl Harmonic {
    pub fn new(freq_mul: impl Into<Varying>, amp_mul: impl Into<Varying>) -> Self {
        Harmonic {
            freq_mul: freq_mul.into(),
            amp_mul: amp_mul.into(),
        }
    }
}

/// The first `n` harmonics, with the i-th (1-based) at `i` times the
/// fundamental and gain `1 / i^power`.
pub fn simple_seq(n: usize, power: f64) -> Vec<Harmonic> {
    (1..=n)
        .map(|i| {
            let i = i as f64;
            Harmonic::new(i, 1.0 / i.powf(power))
        })
        .collect()
}

/// Clone `template` once per harmonic and sum the clones.
pub fn with_harmonics(template: &Oscillator, harmonics: Vec<Harmonic>) -> Oscillator {
    let mut multi = MultiOscillator::new(1.0);
    for h in harmonics {
        multi.push(template.clone(), h.freq_mul, h.amp_mul);
    }
    multi.into()
}
