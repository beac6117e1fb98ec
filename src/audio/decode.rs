//! Audio decoding using symphonia.

use super::AudioBuffer;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decode an audio file into a planar buffer.
///
/// Supports WAV, FLAC, MP3, and AAC formats. Channels are kept separate;
/// downmixing is a later pipeline stage.
pub fn decode_audio_file(path: &Path) -> Result<AudioBuffer> {
    let file = File::open(path).map_err(|e| Error::AudioOpen {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    decode_source(Box::new(file), &hint, path)
}

/// Decode an in-memory recording, such as a downloaded file.
///
/// `origin` names the recording in errors (usually its URL).
pub fn decode_audio_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
    origin: &str,
) -> Result<AudioBuffer> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    decode_source(Box::new(Cursor::new(bytes)), &hint, &PathBuf::from(origin))
}

fn decode_source(source: Box<dyn MediaSource>, hint: &Hint, path: &Path) -> Result<AudioBuffer> {
    let mss = MediaSourceStream::new(source, MediaSourceStreamOptions::default());

    let probed = symphonia::default::get_probe()
        .format(
            hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::AudioOpen {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::NoAudioTracks {
            path: path.to_path_buf(),
        })?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::AudioDecode {
            path: path.to_path_buf(),
            source: "missing sample rate".into(),
        })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::AudioDecode {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut interleaved = Vec::new();
    let mut channel_count = 0;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => {
                return Err(Error::AudioDecode {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frames are common in MP3 downloads; drop the packet.
            Err(symphonia::core::errors::Error::DecodeError(reason)) => {
                debug!("Skipping undecodable packet in {}: {reason}", path.display());
                continue;
            }
            Err(e) => {
                return Err(Error::AudioDecode {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                });
            }
        };

        let spec = *decoded.spec();
        if channel_count == 0 {
            channel_count = spec.channels.count();
        }

        let needed = decoded.capacity() * spec.channels.count();
        if sample_buf.as_ref().is_none_or(|b| b.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if channel_count == 0 {
        // No packets decoded; report an empty mono recording.
        return AudioBuffer::from_mono(Vec::new(), sample_rate);
    }

    debug!(
        "Decoded {} ({} channels, {} Hz, {} samples)",
        path.display(),
        channel_count,
        sample_rate,
        interleaved.len()
    );

    AudioBuffer::from_interleaved(&interleaved, channel_count, sample_rate)
}
