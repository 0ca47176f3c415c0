//! Audio Engine — compiles a score and mixes its chirps.

use std::path::Path;

use crate::compiler::{self, Score};
use crate::error::{ConfigError, SynthError};

use super::mixer::Mixer;
use super::renderer::{self, WavSummary};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioEngine {
    pub sample_rate: u32,
    /// Stop rendering after this many seconds (None = until the last voice ends).
    pub time_limit: Option<f64>,
}

impl Default for AudioEngine {
    fn default() -> Self {
        AudioEngine::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioEngine {
    pub fn new(sample_rate: u32) -> Self {
        AudioEngine {
            sample_rate,
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Compile every chirp and schedule it. Fails on the first bad chirp.
    pub fn mixer(&self, score: &Score) -> Result<Mixer, ConfigError> {
        let chirps = compiler::compile_score(score)?;
        log::debug!("scheduled {} chirps at {} Hz", chirps.len(), self.sample_rate);
        Ok(Mixer::new(chirps, self.sample_rate, self.time_limit))
    }

    /// Render the score to mono samples.
    pub fn render(&self, score: &Score) -> Result<Vec<f64>, ConfigError> {
        Ok(self.mixer(score)?.render())
    }

    /// Parse a JSON score and render it.
    pub fn render_json(&self, json: &str) -> Result<Vec<f64>, SynthError> {
        let score = parse_score(json)?;
        Ok(self.render(&score)?)
    }

    /// Render straight to a WAV file, streaming samples from a producer thread.
    pub fn render_wav_file(
        &self,
        score: &Score,
        path: impl AsRef<Path>,
    ) -> Result<WavSummary, SynthError> {
        let samples = self.mixer(score)?.into_channel();
        renderer::write_wav_file(path, self.sample_rate, samples)
    }

    /// Render to in-memory WAV bytes. Clipped output is returned as-is,
    /// flagged in the summary.
    pub fn render_wav_bytes(&self, score: &Score) -> Result<(Vec<u8>, WavSummary), SynthError> {
        let mixer = self.mixer(score)?;
        renderer::render_wav_bytes(self.sample_rate, mixer)
    }
}

pub fn parse_score(json: &str) -> Result<Score, SynthError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{
        ChirpConfig, Context, EnvelopeConfig, Keyframe, PointSettings, ValueOrHold,
    };

    fn note(begin_time: f64, duration: f64) -> ChirpConfig {
        ChirpConfig {
            duration,
            begin_time,
            context_override: None,
            points: Vec::new(),
            seed: None,
        }
    }

    #[test]
    fn empty_score_is_silent() {
        let out = AudioEngine::new(1000).render(&Score::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn output_covers_last_voice() {
        let score = Score {
            context: None,
            chirps: vec![note(0.0, 0.25), note(0.5, 0.25)],
        };
        let out = AudioEngine::new(1024).render(&score).unwrap();
        assert_eq!(out.len(), 768);
        assert!(out[256..512].iter().all(|&s| s == 0.0), "gap should be silent");
    }

    #[test]
    fn time_limit_cuts_render() {
        let score = Score {
            context: None,
            chirps: vec![note(0.0, 5.0)],
        };
        let out = AudioEngine::new(1024).with_time_limit(1.0).render(&score).unwrap();
        assert_eq!(out.len(), 1025);
    }

    #[test]
    fn bad_chirp_fails_whole_score() {
        let mut bad = note(0.0, 1.0);
        bad.points.push(Keyframe {
            t: 0.0,
            settings: PointSettings {
                freq: Some(ValueOrHold::Hold),
                ..Default::default()
            },
        });
        let score = Score {
            context: None,
            chirps: vec![note(0.0, 1.0), bad],
        };
        assert!(AudioEngine::new(1000).render(&score).is_err());
    }

    #[test]
    fn shared_context_applies_to_all_chirps() {
        let score = Score {
            context: Some(Context {
                envelope: Some(EnvelopeConfig {
                    kind: "bogus".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            chirps: vec![note(0.0, 1.0)],
        };
        let err = AudioEngine::new(1000).render(&score).unwrap_err();
        assert_eq!(err, ConfigError::UnknownEnvelope { kind: "bogus".into() });
    }

    #[test]
    fn render_json_reports_parse_errors() {
        let err = AudioEngine::new(1000).render_json("{ not json").unwrap_err();
        assert!(matches!(err, SynthError::Json(_)));
    }

    #[test]
    fn full_pipeline_json_to_wav() {
        let _ = env_logger::builder().is_test(true).try_init();
        let json = r#"{
            "context": {"initial": {"freq": {"value": 220}, "amplitude": {"value": 0.3}}},
            "chirps": [
                {"duration": 0.25, "points": [{"t": 0.1, "settings": {"freq": {"value": 440}}}]},
                {"duration": 0.25, "begin_time": 0.125,
                 "context_override": {"oscillator": {"kind": "harmonics", "count": 4, "power": 2}}}
            ]
        }"#;
        let engine = AudioEngine::new(8192);
        let score = parse_score(json).unwrap();
        let (wav, summary) = engine.render_wav_bytes(&score).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert!(!summary.clipped());

        let samples = engine.render(&score).unwrap();
        assert_eq!(samples.len(), 3072);
        assert!(samples.iter().any(|&s| s.abs() > 0.01), "rendered audio should not be silent");
        assert!(samples.iter().all(|&s| s.abs() <= 1.0));
    }

    #[test]
    fn overlapping_voices_still_produce_wav_bytes() {
        let json = r#"{
            "context": {"envelope": {
                "kind": "adsr", "attack": 0, "decay": 0, "sustain": 1, "release": 0
            }},
            "chirps": [
                {"duration": 0.5, "points": [{"t": 0, "settings": {"freq": {"value": 256}}}]},
                {"duration": 0.5, "points": [{"t": 0, "settings": {"freq": {"value": 256}}}]}
            ]
        }"#;
        let score = parse_score(json).unwrap();
        let (wav, summary) = AudioEngine::new(1024).render_wav_bytes(&score).unwrap();
        assert!(summary.clipped(), "two in-phase voices at full level should clip");
        assert_eq!(summary.frames, 512);

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.len(), 512, "clipped audio should still be encoded");
    }
}
