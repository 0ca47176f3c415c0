//! WAV renderer — encodes a float sample stream as 32-bit mono PCM.
//!
//! Samples are scaled by 2^31 without normalization. Anything outside
//! [-1, 1] saturates. [`write_wav`] reports it as an error once the file is
//! complete; [`render_wav_bytes`] hands back the bytes with a summary.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::SynthError;

/// What was written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavSummary {
    pub frames: u64,
    pub seconds: f64,
    /// Largest absolute sample value seen.
    pub peak: f64,
}

pub fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Int,
    }
}

/// Float sample to fixed point. Saturates outside [-1, 1].
fn to_i32(x: f64) -> i32 {
    (x * 2_147_483_648.0) as i32
}

impl WavSummary {
    /// True when some sample left [-1, 1] and was saturated.
    pub fn clipped(&self) -> bool {
        self.peak > 1.0
    }
}

/// Encode `samples` into `writer` and finalize the file. Clipping is only
/// logged; the caller decides what to do with it via [`WavSummary::clipped`].
pub fn encode_wav<W, I>(writer: W, sample_rate: u32, samples: I) -> Result<WavSummary, SynthError>
where
    W: Write + Seek,
    I: IntoIterator<Item = f64>,
{
    let mut wav = WavWriter::new(writer, wav_spec(sample_rate))?;
    let mut peak = 0.0_f64;
    let mut frames = 0u64;
    for x in samples {
        frames += 1;
        peak = peak.max(x.abs());
        wav.write_sample(to_i32(x))?;
    }
    wav.finalize()?;

    let summary = WavSummary {
        frames,
        seconds: frames as f64 / sample_rate as f64,
        peak,
    };
    log::info!(
        "wrote WAV ({} frames, {} seconds, largest: {})",
        summary.frames,
        summary.seconds,
        summary.peak
    );
    if summary.clipped() {
        log::warn!("output clipped: peak {peak} > 1.0");
    }
    Ok(summary)
}

/// Write `samples` to `writer`, returning `SynthError::Clipping` after the
/// file is finalized if any sample exceeded 1.0 in magnitude.
pub fn write_wav<W, I>(writer: W, sample_rate: u32, samples: I) -> Result<WavSummary, SynthError>
where
    W: Write + Seek,
    I: IntoIterator<Item = f64>,
{
    let summary = encode_wav(writer, sample_rate, samples)?;
    if summary.clipped() {
        return Err(SynthError::Clipping {
            peak: summary.peak,
            frames: summary.frames,
        });
    }
    Ok(summary)
}

pub fn write_wav_file<P, I>(path: P, sample_rate: u32, samples: I) -> Result<WavSummary, SynthError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = f64>,
{
    let file = File::create(path.as_ref()).map_err(hound::Error::IoError)?;
    write_wav(BufWriter::new(file), sample_rate, samples)
}

/// Encode into an in-memory WAV file. Clipped output is kept; check
/// [`WavSummary::clipped`] on the returned summary.
pub fn render_wav_bytes<I>(
    sample_rate: u32,
    samples: I,
) -> Result<(Vec<u8>, WavSummary), SynthError>
where
    I: IntoIterator<Item = f64>,
{
    let mut buf = Vec::new();
    let summary = encode_wav(Cursor::new(&mut buf), sample_rate, samples)?;
    Ok((buf, summary))
}
