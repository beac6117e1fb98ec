//! Audio resampling.
//!
//! The default path is plain linear interpolation over evenly spaced source
//! positions, which is what every clip already in the catalog was produced
//! with. An FFT resampler backed by rubato is available for higher-fidelity
//! re-ingestion.

use super::AudioBuffer;
use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};
use serde::{Deserialize, Serialize};

/// Resampling algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Band-limited FFT resampling.
    Fft,
}

/// Resample mono samples to the target sample rate.
///
/// Returns the input unchanged if already at the target rate.
pub fn resample(
    samples: Vec<f32>,
    from_rate: u32,
    to_rate: u32,
    method: ResampleMethod,
) -> Result<Vec<f32>> {
    for rate in [from_rate, to_rate] {
        if rate == 0 {
            return Err(Error::InvalidSampleRate { rate });
        }
    }
    match method {
        ResampleMethod::Linear => Ok(resample_linear(samples, from_rate, to_rate)),
        ResampleMethod::Fft => resample_fft(samples, from_rate, to_rate),
    }
}

/// Resample every channel of a buffer.
pub fn resample_buffer(
    buffer: AudioBuffer,
    to_rate: u32,
    method: ResampleMethod,
) -> Result<AudioBuffer> {
    let from_rate = buffer.sample_rate();
    if from_rate == to_rate {
        return Ok(buffer);
    }
    let channels = buffer
        .into_channels()
        .into_iter()
        .map(|channel| resample(channel, from_rate, to_rate, method))
        .collect::<Result<Vec<_>>>()?;
    AudioBuffer::new(channels, to_rate)
}

/// Linear-interpolation resampler.
///
/// Output length is `round(len / from_rate * to_rate)`. Output sample `i`
/// reads the input at `i * (len - 1) / (new_len - 1)`, so both endpoints of
/// the input are hit exactly.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn resample_linear(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples;
    }

    let len = samples.len();
    let new_len = (len as f64 / f64::from(from_rate) * f64::from(to_rate)).round() as usize;
    if len == 0 || new_len == 0 {
        return Vec::new();
    }
    if new_len == 1 {
        return vec![samples[0]];
    }

    let last = len - 1;
    let scale = last as f64 / (new_len - 1) as f64;
    (0..new_len)
        .map(|i| {
            let position = i as f64 * scale;
            let lower = (position.floor() as usize).min(last);
            let upper = (lower + 1).min(last);
            let frac = (position - lower as f64) as f32;
            samples[lower] + (samples[upper] - samples[lower]) * frac
        })
        .collect()
}

/// FFT resampler using rubato.
fn resample_fft(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples);
    }

    let chunk_size = 1024;
    let sub_chunks = 1;
    let channels = 1;

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        chunk_size,
        sub_chunks,
        channels,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let input_frames_needed = resampler.input_frames_next();
    let expected_len = expected_output_len(samples.len(), from_rate, to_rate);
    let mut output = Vec::with_capacity(expected_len + chunk_size);

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + input_frames_needed).min(samples.len());
        let mut chunk = samples[pos..end].to_vec();
        chunk.resize(input_frames_needed, 0.0);

        let input_adapter =
            SequentialSlice::new(&chunk, channels, input_frames_needed).map_err(|e| {
                Error::Resample {
                    reason: format!("failed to create input adapter: {e}"),
                }
            })?;

        let resampled = resampler
            .process(&input_adapter, 0, None)
            .map_err(|e| Error::Resample {
                reason: e.to_string(),
            })?;

        output.extend_from_slice(&resampled.take_data());
        pos = end;
    }

    // Zero padding of the final chunk produces a tail; cut back to the
    // length the input duration implies.
    output.resize(expected_len, 0.0);
    Ok(output)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn expected_output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    ((input_len as f64) * f64::from(to_rate) / f64::from(from_rate)).round() as usize
}
