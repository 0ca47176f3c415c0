//! Chirp — a single monophonic sound event.

use super::envelope::Envelope;
use super::oscillator::Oscillator;
use super::varying::Varying;

/// One voice: an oscillator swept along a frequency trajectory, shaped by an
/// envelope and an optional tremolo multiplier.
#[derive(Debug, Clone)]
pub struct Chirp {
    pub oscillator: Oscillator,
    pub envelope: Envelope,
    /// Frequency in Hz.
    pub frequency: Varying,
    pub tremolo: Option<Varying>,
}

impl Chirp {
    pub fn new(frequency: impl Into<Varying>, oscillator: Oscillator, envelope: Envelope) -> Self {
        Chirp {
            oscillator,
            envelope,
            frequency: frequency.into(),
            tremolo: None,
        }
    }

    pub fn with_tremolo(mut self, tremolo: impl Into<Varying>) -> Self {
        self.tremolo = Some(tremolo.into());
        self
    }

    /// Current output sample.
    pub fn sample(&self) -> f64 {
        let mut s = self.oscillator.value() * self.envelope.amplitude();
        if let Some(tremolo) = &self.tremolo {
            s *= tremolo.value();
        }
        s
    }

    /// Move the voice forward by `dt` seconds.
    ///
    /// The phase step uses the frequency from before this tick, so frequency
    /// changes are heard one tick later.
    pub fn advance(&mut self, dt: f64) {
        self.oscillator.advance(self.frequency.value() * dt);
        self.envelope.advance(dt);
        self.frequency.advance(dt);
        if let Some(tremolo) = &mut self.tremolo {
            tremolo.advance(dt);
        }
    }

    /// Is this voice finished (envelope done)?
    pub fn done(&self) -> bool {
        self.envelope.done()
    }
}

/// A chirp scheduled to start `time` seconds into the mix.
#[derive(Debug, Clone)]
pub struct TimedChirp {
    pub time: f64,
    pub chirp: Chirp,
}

impl TimedChirp {
    pub fn at(time: f64, chirp: Chirp) -> Self {
        TimedChirp { time, chirp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::{Adsr, linear_adsr};
    use crate::dsp::varying::{Interpolated, Point};

    #[test]
    fn voice_produces_sound() {
        let mut c = Chirp::new(440.0, Oscillator::sine(), Envelope::Constant(0.8));

        let mut has_nonzero = false;
        for _ in 0..4410 {
            c.advance(1.0 / 44100.0);
            if c.sample().abs() > 0.001 {
                has_nonzero = true;
            }
        }
        assert!(has_nonzero, "Chirp should produce non-zero output");
    }

    #[test]
    fn frequency_change_lags_one_tick() {
        // Frequency jumps from 1 Hz to 100 Hz right after t = 0.
        let freq =
            Interpolated::new(vec![Point::new(0.0, 1.0), Point::new(1e-9, 100.0)]).infinite();
        let mut c = Chirp::new(freq, Oscillator::sine(), Envelope::Constant(1.0));
        c.advance(0.25);
        // First tick used the 1 Hz value read before advancing.
        assert!((c.sample() - 1.0).abs() < 1e-12, "got {}", c.sample());
    }

    #[test]
    fn tremolo_multiplies_sample() {
        let mut plain = Chirp::new(1.0, Oscillator::sine(), Envelope::Constant(1.0));
        let mut shaded = plain.clone().with_tremolo(0.5);
        plain.advance(0.25);
        shaded.advance(0.25);
        assert!((shaded.sample() - 0.5 * plain.sample()).abs() < 1e-12);
    }

    #[test]
    fn done_follows_envelope() {
        let adsr = Adsr {
            attack: 0.01,
            decay: 0.01,
            sustain: 0.5,
            release: 0.05,
        };
        let mut c = Chirp::new(440.0, Oscillator::sine(), linear_adsr(0.1, adsr));
        for _ in 0..99 {
            c.advance(0.001);
        }
        assert!(!c.done());
        for _ in 0..2 {
            c.advance(0.001);
        }
        assert!(c.done(), "Chirp should be finished after its duration");
        assert_eq!(c.sample(), 0.0);
    }

    #[test]
    fn voice_output_range() {
        let mut c = Chirp::new(880.0, Oscillator::sine(), Envelope::Constant(1.0));
        for _ in 0..44100 {
            c.advance(1.0 / 44100.0);
            let s = c.sample();
            assert!(s.abs() <= 1.0, "Chirp output should be within [-1, 1], got {s}");
        }
    }
}
