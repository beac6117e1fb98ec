//! WAV encoding with hound.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{Seek, Write};

/// Encode mono samples as 16-bit PCM WAV.
///
/// Samples are clamped to [-1.0, 1.0] before conversion.
pub fn encode_wav<W: Write + Seek>(
    writer: W,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(writer, spec)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let sample_i16 = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(sample_i16)?;
    }
    writer.finalize()
}
