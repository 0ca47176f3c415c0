//! Mixer — schedules timed chirps and sums them into one sample stream.
//!
//! The mixer is a pull iterator over the sample clock. It applies no gain or
//! clipping of its own: the stream is the plain sum of active voices.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use super::voice::{Chirp, TimedChirp};

#[derive(Debug)]
pub struct Mixer {
    /// Not yet started, in onset order.
    pending: VecDeque<TimedChirp>,
    active: Vec<Chirp>,
    sample_rate: u32,
    time_limit: Option<f64>,
    frame: u64,
}

impl Mixer {
    /// `time_limit` stops the stream once the clock passes it, even if voices
    /// are still sounding.
    pub fn new(mut chirps: Vec<TimedChirp>, sample_rate: u32, time_limit: Option<f64>) -> Self {
        // Stable, so equal onsets start in input order.
        chirps.sort_by(|a, b| a.time.total_cmp(&b.time));
        Mixer {
            pending: chirps.into(),
            active: Vec::new(),
            sample_rate,
            time_limit,
            frame: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of voices currently sounding.
    pub fn active_voices(&self) -> usize {
        self.active.len()
    }

    /// Number of voices yet to start.
    pub fn pending_voices(&self) -> usize {
        self.pending.len()
    }

    /// Produce the whole stream eagerly.
    pub fn render(self) -> Vec<f64> {
        self.collect()
    }

    /// Produce the stream on a background thread through a bounded queue of
    /// one second of samples.
    pub fn into_channel(self) -> Receiver<f64> {
        let (tx, rx) = mpsc::sync_channel(self.sample_rate.max(1) as usize);
        thread::spawn(move || {
            for sample in self {
                if tx.send(sample).is_err() {
                    log::debug!("mixer consumer hung up; stopping");
                    break;
                }
            }
        });
        rx
    }
}

impl Iterator for Mixer {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.active.is_empty() && self.pending.is_empty() {
            return None;
        }

        let sr = self.sample_rate as f64;
        let t = self.frame as f64 / sr;
        if let Some(limit) = self.time_limit {
            if t > limit {
                return None;
            }
        }

        while self.pending.front().is_some_and(|c| c.time <= t) {
            if let Some(timed) = self.pending.pop_front() {
                self.active.push(timed.chirp);
            }
        }

        let step = 1.0 / sr;
        let mut sum = 0.0;
        for chirp in self.active.iter_mut() {
            sum += chirp.sample();
            chirp.advance(step);
        }
        self.active.retain(|c| !c.done());

        self.frame += 1;
        Some(sum)
    }
}
