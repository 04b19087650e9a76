//! Mono 16-bit PCM buffers that carry their own sample rate.
//!
//! Nothing in the crate resamples a finished buffer, so the rate recorded
//! here is the rate it must be played back at.

use crate::error::{Result, SenseError};
use std::path::Path;
use std::time::Duration;

/// Mono signed 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Wrap samples recorded or synthesized at `sample_rate`.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Empty buffer at `sample_rate`.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Take the samples.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playing time.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Append another buffer recorded at the same rate.
    ///
    /// # Errors
    ///
    /// Returns [`SenseError::Audio`] if the rates differ.
    pub fn append(&mut self, other: &PcmBuffer) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(SenseError::Audio(format!(
                "cannot join {}Hz audio onto {}Hz audio",
                other.sample_rate, self.sample_rate
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Little-endian byte encoding (the raw `LINEAR16` wire layout).
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Decode little-endian 16-bit samples.
    ///
    /// # Errors
    ///
    /// Returns [`SenseError::Audio`] for an odd number of bytes.
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(SenseError::Audio(format!(
                "PCM byte stream has odd length {}",
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self::new(samples, sample_rate))
    }

    /// Samples scaled to `[-1, 1]` for output devices.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&s| f32::from(s) / f32::from(i16::MAX))
            .collect()
    }

    /// Build from `[-1, 1]` floats, clamping out-of-range values.
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        Self::new(samples.iter().map(|&s| f32_to_i16(s)).collect(), sample_rate)
    }

    /// Load a WAV file, mixing down to mono.
    ///
    /// # Errors
    ///
    /// Returns [`SenseError::Audio`] if the file cannot be opened or decoded.
    pub fn load_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| SenseError::Audio(format!("cannot open WAV {}: {e}", path.display())))?;
        let spec = reader.spec();

        let interleaved: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int if spec.bits_per_sample == 16 => reader
                .samples::<i16>()
                .map(|s| s.map_err(|e| SenseError::Audio(format!("WAV read error: {e}"))))
                .collect::<Result<_>>()?,
            hound::SampleFormat::Int => {
                let shift = i32::from(spec.bits_per_sample) - 16;
                reader
                    .samples::<i32>()
                    .map(|s| {
                        s.map_err(|e| SenseError::Audio(format!("WAV read error: {e}")))
                            .map(|v| rescale_int(v, shift))
                    })
                    .collect::<Result<_>>()?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| {
                    s.map_err(|e| SenseError::Audio(format!("WAV read error: {e}")))
                        .map(f32_to_i16)
                })
                .collect::<Result<_>>()?,
        };

        let samples = if spec.channels > 1 {
            let ch = usize::from(spec.channels);
            interleaved
                .chunks(ch)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                    (sum / frame.len() as i32) as i16
                })
                .collect()
        } else {
            interleaved
        };

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Write a mono 16-bit WAV file.
    ///
    /// # Errors
    ///
    /// Returns [`SenseError::Audio`] if the file cannot be written.
    pub fn save_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| SenseError::Audio(format!("failed to create wav writer: {e}")))?;
        for &s in &self.samples {
            writer
                .write_sample(s)
                .map_err(|e| SenseError::Audio(format!("failed to write wav sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| SenseError::Audio(format!("failed to finalize wav: {e}")))?;
        Ok(())
    }
}

fn f32_to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

fn rescale_int(v: i32, shift: i32) -> i16 {
    if shift >= 0 {
        (v >> shift) as i16
    } else {
        (v << -shift) as i16
    }
}
