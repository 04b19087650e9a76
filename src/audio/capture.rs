//! Microphone capture using cpal.
//!
//! Captures at the device's native sample rate, mixes to mono and resamples
//! to the configured capture rate, then hands 16-bit chunks to whoever is
//! draining the source.

use crate::config::AudioConfig;
use crate::error::{Result, SenseError};
use crossbeam_channel::{Receiver, Sender};
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Seconds of audio the chunk queue holds before the device callback drops data.
const QUEUE_SECONDS: usize = 60;

/// A microphone that can be opened, drained and closed repeatedly.
pub trait CaptureSource: Send {
    /// Start capturing.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened.
    fn open(&mut self) -> Result<()>;

    /// Everything captured since the last drain. Never blocks.
    fn drain(&mut self) -> Result<Vec<i16>>;

    /// Stop capturing. Samples captured before the stop stay drainable.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be shut down cleanly.
    fn close(&mut self) -> Result<()>;

    /// Rate of the drained samples in Hz.
    fn sample_rate(&self) -> u32;
}

struct Worker {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Audio capture from the system microphone via cpal.
///
/// The cpal stream lives on its own thread between [`open`](CaptureSource::open)
/// and [`close`](CaptureSource::close), so this type stays `Send` and can be
/// owned by whichever thread delivers joystick events.
pub struct CpalCapture {
    device_name: Option<String>,
    target_sample_rate: u32,
    chunk_size: usize,
    chunks: Option<Receiver<Vec<i16>>>,
    worker: Option<Worker>,
}

impl CpalCapture {
    /// Create a new capture instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured input device is not available.
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let device = find_input_device(config.input_device.as_deref())?;
        let device_name = device
            .description()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        info!("using input device: {device_name}");

        Ok(Self {
            device_name: config.input_device.clone(),
            target_sample_rate: config.capture_sample_rate,
            chunk_size: config.chunk_size.max(1),
            chunks: None,
            worker: None,
        })
    }

    /// List available input devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_input_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| SenseError::Audio(format!("cannot enumerate devices: {e}")))?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(desc) = device.description() {
                names.push(desc.name().to_owned());
            }
        }
        Ok(names)
    }
}

impl CaptureSource for CpalCapture {
    fn open(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let capacity = (QUEUE_SECONDS * self.target_sample_rate as usize).div_ceil(self.chunk_size);
        let (chunk_tx, chunk_rx) = crossbeam_channel::bounded(capacity);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);

        let device_name = self.device_name.clone();
        let target_rate = self.target_sample_rate;
        let chunk_size = self.chunk_size;

        let thread = std::thread::Builder::new()
            .name("sensevox-capture".into())
            .spawn(move || {
                let pending = Arc::new(Mutex::new(Vec::with_capacity(chunk_size)));
                let stream = match build_stream(
                    device_name.as_deref(),
                    target_rate,
                    chunk_size,
                    Arc::clone(&pending),
                    chunk_tx.clone(),
                ) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Hold the stream alive until told to stop (or the capture is dropped).
                let _ = stop_rx.recv();
                drop(stream);

                // Hand over the partial chunk the callback was still filling.
                if let Ok(mut rest) = pending.lock() {
                    if !rest.is_empty() && chunk_tx.try_send(std::mem::take(&mut *rest)).is_err() {
                        debug!("audio channel full, dropping final partial chunk");
                    }
                }
            })
            .map_err(|e| SenseError::Audio(format!("failed to spawn capture thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|e| SenseError::Channel(format!("capture thread exited early: {e}")))??;

        self.chunks = Some(chunk_rx);
        self.worker = Some(Worker {
            stop: stop_tx,
            thread,
        });
        info!("audio capture started at {target_rate}Hz");
        Ok(())
    }

    fn drain(&mut self) -> Result<Vec<i16>> {
        let Some(chunks) = &self.chunks else {
            return Ok(Vec::new());
        };
        Ok(chunks.try_iter().flatten().collect())
    }

    fn close(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = worker.stop.send(());
        worker
            .thread
            .join()
            .map_err(|_| SenseError::Audio("capture thread panicked".into()))?;
        info!("audio capture stopped");
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.target_sample_rate
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to stop audio capture: {e}");
        }
    }
}

fn find_input_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = name {
        host.input_devices()
            .map_err(|e| SenseError::Audio(format!("cannot enumerate devices: {e}")))?
            .find(|d| {
                d.description()
                    .ok()
                    .map(|desc| desc.name() == name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| SenseError::Audio(format!("input device '{name}' not found")))
    } else {
        host.default_input_device()
            .ok_or_else(|| SenseError::Audio("no default input device".into()))
    }
}

fn build_stream(
    device_name: Option<&str>,
    target_rate: u32,
    chunk_size: usize,
    pending: Arc<Mutex<Vec<i16>>>,
    tx: Sender<Vec<i16>>,
) -> Result<cpal::Stream> {
    let device = find_input_device(device_name)?;

    // Use the device's default config for best compatibility
    let default_config = device
        .default_input_config()
        .map_err(|e| SenseError::Audio(format!("no default input config: {e}")))?;

    let native_rate = default_config.sample_rate();
    let native_channels = default_config.channels();

    let stream_config = StreamConfig {
        channels: native_channels,
        sample_rate: native_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    info!(
        "native input config: {}Hz, {} channels",
        native_rate, native_channels
    );
    if native_rate != target_rate {
        info!("will resample from {}Hz to {}Hz", native_rate, target_rate);
    }

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = if native_channels > 1 {
                    to_mono(data, native_channels)
                } else {
                    data.to_vec()
                };
                let samples = resample(&mono, native_rate, target_rate);

                let Ok(mut buf) = pending.lock() else {
                    return;
                };
                buf.extend(samples.iter().map(|&s| to_i16(s)));
                while buf.len() >= chunk_size {
                    let chunk: Vec<i16> = buf.drain(..chunk_size).collect();
                    // Use try_send to avoid blocking the audio thread
                    if tx.try_send(chunk).is_err() {
                        debug!("audio channel full, dropping chunk");
                    }
                }
            },
            move |err| {
                error!("audio input stream error: {err}");
            },
            None,
        )
        .map_err(|e| SenseError::Audio(format!("failed to build input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| SenseError::Audio(format!("failed to start input stream: {e}")))?;

    Ok(stream)
}

/// Convert interleaved multi-channel audio to mono by averaging channels.
fn to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

fn to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

/// Linear-interpolation resampler.
///
/// Good enough for speech, whose energy sits well below either Nyquist
/// limit involved here.
fn resample(samples: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || samples.is_empty() || dst_rate == 0 {
        return samples.to_vec();
    }

    let ratio = src_rate as f64 / dst_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] as f64 * (1.0 - frac) + samples[idx + 1] as f64 * frac
        } else {
            samples[idx.min(samples.len() - 1)] as f64
        };

        output.push(sample as f32);
    }

    output
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn stereo_is_averaged() {
        assert_eq!(to_mono(&[0.5, -0.5, 1.0, 0.0], 2), vec![0.0, 0.5]);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let s = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&s, 44_100, 44_100), s);
    }

    #[test]
    fn resample_halves_length_when_halving_rate() {
        let s: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample(&s, 48_000, 24_000);
        assert_eq!(out.len(), 50);
        assert!((out[10] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn resample_48k_to_16k_keeps_every_third_sample() {
        let s: Vec<f32> = (0..480).map(|i| i as f32).collect();
        let out = resample(&s, 48_000, 16_000);
        assert_eq!(out.len(), 160);
        assert_eq!(out[5], 15.0);
    }

    #[test]
    fn samples_are_clamped_to_i16() {
        assert_eq!(to_i16(1.5), i16::MAX);
        assert_eq!(to_i16(-1.5), -i16::MAX);
        assert_eq!(to_i16(0.0), 0);
    }
}
