//! Mono downmix.

use super::AudioBuffer;

/// Collapse all channels into one by averaging them sample by sample.
///
/// A buffer that is already mono is returned as-is.
pub fn downmix(buffer: AudioBuffer) -> AudioBuffer {
    if buffer.channels() == 1 {
        return buffer;
    }

    let sample_rate = buffer.sample_rate();
    let frames = buffer.frames();
    let channels = buffer.into_channels();
    #[allow(clippy::cast_precision_loss)]
    let count = channels.len() as f32;

    let mut mixed = vec![0.0_f32; frames];
    for channel in &channels {
        for (out, &sample) in mixed.iter_mut().zip(channel) {
            *out += sample;
        }
    }
    for sample in &mut mixed {
        *sample /= count;
    }

    // Channel lengths and rate were validated when `buffer` was built.
    AudioBuffer::from_parts_unchecked(vec![mixed], sample_rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mono_input_is_untouched() {
        let samples = vec![0.1, -0.7, 0.33, 1.0];
        let buffer = AudioBuffer::from_mono(samples.clone(), 8000).unwrap();
        let mixed = downmix(buffer);
        assert_eq!(mixed.channels(), 1);
        assert_eq!(mixed.mono(), samples.as_slice());
    }

    #[test]
    fn averages_channels() {
        let buffer =
            AudioBuffer::new(vec![vec![1.0, 0.5, -1.0], vec![0.0, 0.5, 1.0]], 16_000).unwrap();
        let mixed = downmix(buffer);
        assert_eq!(mixed.channels(), 1);
        assert_eq!(mixed.sample_rate(), 16_000);
        assert_eq!(mixed.mono(), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_is_idempotent() {
        let buffer = AudioBuffer::new(
            vec![vec![0.2, 0.4, 0.6], vec![0.6, 0.0, -0.6], vec![0.1, 0.2, 0.3]],
            44_100,
        )
        .unwrap();
        let once = downmix(buffer);
        let twice = downmix(once.clone());
        assert_eq!(once, twice);
    }
}
