//! Integrated loudness measurement and normalization (ITU-R BS.1770).

use crate::error::{Error, Result};
use ebur128::{EbuR128, Mode};
use tracing::debug;

/// Result of loudness normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Gain-adjusted samples, clipped to [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Loudness of the input, if measurable.
    pub input_lufs: Option<f64>,
    /// Loudness re-measured after gain and clipping, if measurable.
    pub loudness_lufs: Option<f64>,
}

/// Measure integrated gated loudness of mono samples.
///
/// Silence and signals too short to fill a gating block have no defined
/// loudness and yield `None`.
pub fn measure_lufs(samples: &[f32], sample_rate: u32) -> Result<Option<f64>> {
    if sample_rate == 0 {
        return Err(Error::InvalidSampleRate { rate: sample_rate });
    }

    let mut meter =
        EbuR128::new(1, sample_rate, Mode::I).map_err(|e| Error::Loudness { source: e })?;
    meter
        .add_frames_f32(samples)
        .map_err(|e| Error::Loudness { source: e })?;
    let loudness = meter
        .loudness_global()
        .map_err(|e| Error::Loudness { source: e })?;

    Ok(loudness.is_finite().then_some(loudness))
}

/// Apply gain so the integrated loudness approaches `target_lufs`.
///
/// Unmeasurable input is passed through untouched. The reported loudness is
/// the re-measured value, which can fall short of the target when the gain
/// drives peaks into clipping.
pub fn normalize_loudness(samples: Vec<f32>, sample_rate: u32, target_lufs: f64) -> Result<Normalized> {
    let Some(input_lufs) = measure_lufs(&samples, sample_rate)? else {
        debug!("Loudness undefined; leaving {} samples unchanged", samples.len());
        return Ok(Normalized {
            samples,
            input_lufs: None,
            loudness_lufs: None,
        });
    };

    #[allow(clippy::cast_possible_truncation)]
    let gain = 10_f64.powf((target_lufs - input_lufs) / 20.0) as f32;
    let samples: Vec<f32> = samples
        .into_iter()
        .map(|s| (s * gain).clamp(-1.0, 1.0))
        .collect();
    let loudness_lufs = measure_lufs(&samples, sample_rate)?;

    debug!(
        "Normalized loudness {input_lufs:.1} -> {:?} LUFS (gain {gain:.3})",
        loudness_lufs
    );

    Ok(Normalized {
        samples,
        input_lufs: Some(input_lufs),
        loudness_lufs,
    })
}
