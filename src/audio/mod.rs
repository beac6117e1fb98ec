//! Audio processing stages: decode, downmix, resample, encode.

mod buffer;
mod decode;
mod downmix;
mod resample;
mod wav;

pub use buffer::AudioBuffer;
pub use decode::{decode_audio_bytes, decode_audio_file};
pub use downmix::downmix;
pub use resample::{ResampleMethod, resample, resample_buffer, resample_linear};
pub use wav::encode_wav;
