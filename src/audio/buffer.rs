//! Planar audio buffer shared by every pipeline stage.

use crate::error::{Error, Result};

/// Decoded audio as one sample vector per channel.
///
/// All channels have the same length and the sample rate is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Build a buffer from planar channel data.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate { rate: sample_rate });
        }
        let Some(first) = channels.first() else {
            return Err(Error::InvalidAudioBuffer {
                reason: "buffer has no channels".to_string(),
            });
        };
        let frames = first.len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != frames)
        {
            return Err(Error::InvalidAudioBuffer {
                reason: format!(
                    "channel {index} has {} samples, expected {frames}",
                    channel.len()
                ),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Assemble a buffer whose shape is already known to be valid.
    pub(crate) fn from_parts_unchecked(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0 && !channels.is_empty());
        Self {
            channels,
            sample_rate,
        }
    }

    /// Build a single-channel buffer.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Build a buffer from frame-interleaved samples.
    pub fn from_interleaved(data: &[f32], channel_count: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::InvalidAudioBuffer {
                reason: "buffer has no channels".to_string(),
            });
        }
        if data.len() % channel_count != 0 {
            return Err(Error::InvalidAudioBuffer {
                reason: format!(
                    "{} interleaved samples do not divide into {channel_count} channels",
                    data.len()
                ),
            });
        }
        let frames = data.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in data.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Length in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Samples of one channel, if it exists.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Samples of the first channel.
    ///
    /// After downmixing this is the whole signal.
    pub fn mono(&self) -> &[f32] {
        self.channels.first().map_or(&[], Vec::as_slice)
    }

    /// Consume the buffer, returning all channels.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sample_rate() {
        let err = AudioBuffer::from_mono(vec![0.0; 4], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidSampleRate { rate: 0 }));
    }

    #[test]
    fn rejects_ragged_channels() {
        let err = AudioBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 8000).unwrap_err();
        assert!(err.to_string().contains("channel 1 has 3 samples"));
    }

    #[test]
    fn deinterleaves_frames() {
        let buffer = AudioBuffer::from_interleaved(&[1.0, -1.0, 2.0, -2.0], 2, 8000).unwrap();
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(buffer.channel(1).unwrap(), &[-1.0, -2.0]);
    }

    #[test]
    fn duration_from_frames_and_rate() {
        let buffer = AudioBuffer::from_mono(vec![0.0; 22_050], 44_100).unwrap();
        assert!((buffer.duration_secs() - 0.5).abs() < f64::EPSILON);
    }
}
