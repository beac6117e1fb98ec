//! Clip duration bounds.

use crate::constants::pipeline::{MAX_DURATION_SECS, MIN_DURATION_SECS};
use crate::error::{Error, Result};

/// Allowed clip duration range in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationBounds {
    /// Shortest allowed clip.
    pub min_secs: f64,
    /// Longest allowed clip.
    pub max_secs: f64,
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self {
            min_secs: MIN_DURATION_SECS,
            max_secs: MAX_DURATION_SECS,
        }
    }
}

impl DurationBounds {
    /// Minimum length in samples at `sample_rate`.
    pub fn min_samples(&self, sample_rate: u32) -> usize {
        secs_to_samples(self.min_secs, sample_rate)
    }

    /// Maximum length in samples at `sample_rate`.
    pub fn max_samples(&self, sample_rate: u32) -> usize {
        secs_to_samples(self.max_secs, sample_rate)
    }

    /// Reject a requested duration outside the bounds.
    pub fn validate(&self, duration_secs: f64) -> Result<()> {
        if !duration_secs.is_finite()
            || duration_secs < self.min_secs
            || duration_secs > self.max_secs
        {
            return Err(Error::InvalidDuration {
                value: duration_secs,
                min: self.min_secs,
                max: self.max_secs,
            });
        }
        Ok(())
    }
}

/// Pad with trailing silence or truncate so the length is within bounds.
pub fn enforce_duration(mut samples: Vec<f32>, sample_rate: u32, bounds: DurationBounds) -> Vec<f32> {
    let min = bounds.min_samples(sample_rate);
    let max = bounds.max_samples(sample_rate);
    if samples.len() < min {
        samples.resize(min, 0.0);
    } else if samples.len() > max {
        samples.truncate(max);
    }
    samples
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    (secs * f64::from(sample_rate)).round().max(0.0) as usize
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RATE: u32 = 44_100;

    #[test]
    fn short_clip_is_padded_with_silence() {
        let out = enforce_duration(vec![0.5; 1000], RATE, DurationBounds::default());
        assert_eq!(out.len(), 22_050);
        assert!(out[..1000].iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
        assert!(out[1000..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn long_clip_is_truncated() {
        let out = enforce_duration(vec![0.1; 200_000], RATE, DurationBounds::default());
        assert_eq!(out.len(), 132_300);
    }

    #[test]
    fn clip_inside_bounds_is_untouched() {
        let samples: Vec<f32> = (0..44_100_u32).map(|i| (i % 100) as f32 / 100.0).collect();
        let out = enforce_duration(samples.clone(), RATE, DurationBounds::default());
        assert_eq!(out, samples);
    }

    #[test]
    fn output_length_always_within_bounds() {
        let bounds = DurationBounds::default();
        for len in [0, 1, 22_049, 22_050, 100_000, 132_300, 132_301, 500_000] {
            let out = enforce_duration(vec![0.0; len], RATE, bounds);
            assert!(out.len() >= bounds.min_samples(RATE));
            assert!(out.len() <= bounds.max_samples(RATE));
        }
    }

    #[test]
    fn validate_names_the_range() {
        let bounds = DurationBounds::default();
        assert!(bounds.validate(0.5).is_ok());
        assert!(bounds.validate(3.0).is_ok());
        let err = bounds.validate(5.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "duration must be between 0.5 and 3.0 seconds, got 5"
        );
        assert!(bounds.validate(0.2).is_err());
        assert!(bounds.validate(f64::NAN).is_err());
    }
}
