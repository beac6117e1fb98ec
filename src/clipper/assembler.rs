//! Turns a decoded source recording into finished clips on disk.
//!
//! Every clip of a request is computed and every identifier allocated
//! before the first file is written. Files are staged next to their
//! destinations and only renamed into place once all of them were staged,
//! so a failure leaves no partial output behind.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::duration::secs_to_samples;
use super::{
    ClipRequest, IdAllocator, IdKey, SegmentWindow, Selection, enforce_duration,
    normalize_loudness, normalize_species_code, select_best, select_distinct, step_samples,
};
use crate::audio::{AudioBuffer, downmix, encode_wav, resample_buffer};
use crate::catalog::{ClipMetadata, round_lufs};
use crate::config::{PipelineSettings, ProjectLayout};
use crate::error::{Error, Result};
use crate::output::StagedFile;
use crate::spectrogram::SpectrogramRenderer;

/// A processed clip that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    /// Mono samples at the output rate.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Source window the clip was cut from.
    pub window: SegmentWindow,
    /// Loudness before normalization.
    pub input_lufs: Option<f64>,
    /// Loudness after normalization.
    pub loudness_lufs: Option<f64>,
}

impl RenderedClip {
    /// Length in whole milliseconds.
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        let ms = self.samples.len() as u64 * 1000 / u64::from(self.sample_rate);
        u32::try_from(ms).unwrap_or(u32::MAX)
    }
}

/// Runs the clip pipeline with one set of settings.
pub struct ClipAssembler<'a> {
    settings: &'a PipelineSettings,
    layout: &'a ProjectLayout,
    renderer: &'a dyn SpectrogramRenderer,
}

impl<'a> ClipAssembler<'a> {
    /// Create an assembler.
    pub fn new(
        settings: &'a PipelineSettings,
        layout: &'a ProjectLayout,
        renderer: &'a dyn SpectrogramRenderer,
    ) -> Self {
        Self {
            settings,
            layout,
            renderer,
        }
    }

    /// Downmix to mono and resample to the output rate.
    pub fn prepare(&self, source: AudioBuffer) -> Result<AudioBuffer> {
        let mono = downmix(source);
        resample_buffer(
            mono,
            self.settings.output_sample_rate,
            self.settings.resampler,
        )
    }

    /// Windows of `prepared` that become clips.
    pub fn plan(&self, prepared: &AudioBuffer, selection: &Selection) -> Result<Vec<SegmentWindow>> {
        let samples = prepared.mono();
        let rate = prepared.sample_rate();
        let bounds = self.settings.duration_bounds();

        match *selection {
            Selection::Auto => {
                let max = bounds.max_samples(rate);
                let step = step_samples(rate, self.settings.single_step_secs);
                Ok(vec![select_best(samples, max, step)])
            }
            Selection::Distinct { window_secs } => {
                bounds.validate(window_secs)?;
                let window = secs_to_samples(window_secs, rate);
                let step = step_samples(rate, self.settings.multi_step_secs);
                Ok(select_distinct(
                    samples,
                    window,
                    step,
                    self.settings.max_segments,
                ))
            }
            Selection::Manual {
                start_secs,
                duration_secs,
            } => {
                bounds.validate(duration_secs)?;
                let length = prepared.duration_secs();
                let out_of_bounds = || Error::SelectionOutOfBounds {
                    start: start_secs,
                    end: start_secs + duration_secs,
                    length,
                };
                if !start_secs.is_finite() || start_secs < 0.0 {
                    return Err(out_of_bounds());
                }
                let start = secs_to_samples(start_secs, rate);
                let len = secs_to_samples(duration_secs, rate);
                if start + len > samples.len() {
                    return Err(out_of_bounds());
                }
                Ok(vec![SegmentWindow { start, len }])
            }
        }
    }

    /// Cut, length-enforce and normalize one window.
    pub fn render(&self, prepared: &AudioBuffer, window: SegmentWindow) -> Result<RenderedClip> {
        let rate = prepared.sample_rate();
        let samples = window.slice(prepared.mono()).to_vec();
        let samples = enforce_duration(samples, rate, self.settings.duration_bounds());
        let normalized = normalize_loudness(samples, rate, self.settings.target_lufs)?;

        debug!(
            "Rendered window at {:.2}s: {:?} -> {:?} LUFS",
            window.start_secs(rate),
            normalized.input_lufs,
            normalized.loudness_lufs
        );

        Ok(RenderedClip {
            samples: normalized.samples,
            sample_rate: rate,
            window,
            input_lufs: normalized.input_lufs,
            loudness_lufs: normalized.loudness_lufs,
        })
    }

    /// Run the whole pipeline for one source recording and write its clips.
    ///
    /// Identifiers taken from `ids` are released again if the request fails.
    pub fn assemble(
        &self,
        source: AudioBuffer,
        request: &ClipRequest,
        ids: &mut IdAllocator,
    ) -> Result<Vec<ClipMetadata>> {
        request.validate(&self.settings.duration_bounds())?;
        let species_code = normalize_species_code(&request.species_code)?;

        let prepared = self.prepare(source)?;
        let windows = self.plan(&prepared, &request.selection)?;
        let clips = windows
            .into_iter()
            .map(|window| self.render(&prepared, window))
            .collect::<Result<Vec<_>>>()?;

        let mut allocated = Vec::with_capacity(clips.len());
        for clip in &clips {
            let key = IdKey {
                species_code: &species_code,
                source_id: request.source_id.as_deref(),
                source_file: &request.source_file,
                start_sample: clip.window.start,
            };
            match ids.allocate(request.id_scheme, &key) {
                Ok(id) => allocated.push(id),
                Err(e) => {
                    ids.release(&allocated);
                    return Err(e);
                }
            }
        }

        match self.persist(&allocated, &clips) {
            Ok(spectrograms) => Ok(allocated
                .iter()
                .zip(&clips)
                .zip(spectrograms)
                .map(|((id, clip), spectrogram_path)| {
                    self.metadata(id, &species_code, request, clip, spectrogram_path)
                })
                .collect()),
            Err(e) => {
                ids.release(&allocated);
                Err(e)
            }
        }
    }

    /// Stage every output, then commit them all. Returns the relative
    /// spectrogram path of each clip.
    fn persist(&self, ids: &[String], clips: &[RenderedClip]) -> Result<Vec<Option<String>>> {
        let mut staged = Vec::new();
        let mut spectrograms = Vec::with_capacity(clips.len());

        for (id, clip) in ids.iter().zip(clips) {
            let wav_path = self.layout.resolve(&self.layout.clip_file(id));
            staged.push(StagedFile::stage(&wav_path, |file| {
                encode_wav(file, &clip.samples, clip.sample_rate).map_err(|e| {
                    Error::WavWriteFailed {
                        path: wav_path.clone(),
                        source: e,
                    }
                })
            })?);

            if let Some(bytes) = self.renderer.render(&clip.samples, clip.sample_rate)? {
                let relative = self.layout.spectrogram_file(id);
                let png_path = self.layout.resolve(&relative);
                staged.push(StagedFile::stage(&png_path, |file| {
                    file.write_all(&bytes).map_err(|e| Error::Persist {
                        path: png_path.clone(),
                        source: e,
                    })
                })?);
                spectrograms.push(Some(relative));
            } else {
                spectrograms.push(None);
            }
        }

        let mut committed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for file in staged {
            match file.commit() {
                Ok(path) => committed.push(path),
                Err(e) => {
                    for path in &committed {
                        if let Err(remove_err) = fs::remove_file(path) {
                            warn!("Failed to remove {}: {remove_err}", path.display());
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(spectrograms)
    }

    fn metadata(
        &self,
        id: &str,
        species_code: &str,
        request: &ClipRequest,
        clip: &RenderedClip,
        spectrogram_path: Option<String>,
    ) -> ClipMetadata {
        let metadata = ClipMetadata {
            clip_id: id.to_string(),
            species_code: species_code.to_string(),
            common_name: request.common_name.clone(),
            vocalization_type: request.vocalization_type,
            duration_ms: clip.duration_ms(),
            quality_score: request.quality_score,
            loudness_lufs: clip.loudness_lufs.map(round_lufs),
            source: request.source.clone(),
            source_id: request.source_id.clone(),
            source_url: request.source_url.clone(),
            recordist: request.recordist.clone(),
            file_path: self.layout.clip_file(id),
            spectrogram_path,
            canonical: false,
            rejected: false,
            extra: serde_json::Map::new(),
        };
        info!(
            "Wrote {} ({} ms, {})",
            metadata.file_path,
            metadata.duration_ms,
            metadata
                .loudness_lufs
                .map_or_else(|| "loudness undefined".to_string(), |l| format!("{l:.1} LUFS"))
        );
        metadata
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
mod tests {
    use super::*;
    use crate::catalog::VocalizationType;
    use crate::clipper::IdScheme;
    use crate::config::PathsConfig;
    use crate::spectrogram::{NoSpectrogram, PngSpectrogram};
    use std::f32::consts::PI;
    use tempfile::TempDir;

    fn tone(secs: f64, rate: u32, amplitude: f32) -> Vec<f32> {
        let n = (secs * f64::from(rate)) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * PI * 3000.0 * i as f32 / rate as f32).sin())
            .collect()
    }

    fn request(selection: Selection, scheme: IdScheme) -> ClipRequest {
        ClipRequest {
            species_code: "noca".to_string(),
            common_name: "Northern Cardinal".to_string(),
            vocalization_type: VocalizationType::Song,
            quality_score: 4,
            source: "local".to_string(),
            source_id: Some("XC1".to_string()),
            source_url: None,
            recordist: Some("Jane Doe".to_string()),
            source_file: "noca.wav".to_string(),
            selection,
            id_scheme: scheme,
        }
    }

    fn layout(dir: &TempDir) -> ProjectLayout {
        ProjectLayout::new(dir.path(), &PathsConfig::default(), None)
    }

    #[test]
    fn auto_trims_long_source_to_max_duration() {
        let dir = TempDir::new().unwrap();
        let settings = PipelineSettings::default();
        let layout = layout(&dir);
        let assembler = ClipAssembler::new(&settings, &layout, &NoSpectrogram);

        let source = AudioBuffer::from_mono(tone(5.0, 44_100, 0.1), 44_100).unwrap();
        let mut ids = IdAllocator::default();
        let clips = assembler
            .assemble(source, &request(Selection::Auto, IdScheme::ContentHash), &mut ids)
            .unwrap();

        assert_eq!(clips.len(), 1);
        let clip = &clips[0];
        assert_eq!(clip.duration_ms, 3000);
        assert_eq!(clip.species_code, "NOCA");
        assert!(clip.clip_id.starts_with("NOCA_"));
        assert!(clip.spectrogram_path.is_none());
        assert!((clip.loudness_lufs.unwrap() + 16.0).abs() <= 1.0);
        assert!(layout.resolve(&clip.file_path).exists());
    }

    #[test]
    fn short_source_is_padded_and_written_with_spectrogram() {
        let dir = TempDir::new().unwrap();
        let settings = PipelineSettings::default();
        let layout = layout(&dir);
        let renderer = PngSpectrogram::default();
        let assembler = ClipAssembler::new(&settings, &layout, &renderer);

        let source = AudioBuffer::from_mono(tone(0.2, 48_000, 0.3), 48_000).unwrap();
        let mut ids = IdAllocator::default();
        let clips = assembler
            .assemble(source, &request(Selection::Auto, IdScheme::Sequential), &mut ids)
            .unwrap();

        let clip = &clips[0];
        assert_eq!(clip.clip_id, "NOCA_XC1_1");
        assert_eq!(clip.duration_ms, 500);
        let png = clip.spectrogram_path.as_deref().unwrap();
        assert_eq!(png, "data/spectrograms/NOCA_XC1_1.png");
        assert!(layout.resolve(png).exists());

        let reader = hound::WavReader::open(layout.resolve(&clip.file_path)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 22_050);
    }

    #[test]
    fn distinct_selection_yields_non_overlapping_clips() {
        let dir = TempDir::new().unwrap();
        let settings = PipelineSettings::default();
        let layout = layout(&dir);
        let assembler = ClipAssembler::new(&settings, &layout, &NoSpectrogram);

        let source = AudioBuffer::from_mono(tone(10.0, 44_100, 0.1), 44_100).unwrap();
        let mut ids = IdAllocator::default();
        let clips = assembler
            .assemble(
                source,
                &request(Selection::Distinct { window_secs: 2.0 }, IdScheme::ContentHash),
                &mut ids,
            )
            .unwrap();

        assert_eq!(clips.len(), 3);
        let mut unique: Vec<_> = clips.iter().map(|c| c.clip_id.clone()).collect();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn manual_selection_past_end_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let settings = PipelineSettings::default();
        let layout = layout(&dir);
        let assembler = ClipAssembler::new(&settings, &layout, &NoSpectrogram);

        let source = AudioBuffer::from_mono(tone(2.0, 44_100, 0.1), 44_100).unwrap();
        let mut ids = IdAllocator::default();
        let err = assembler
            .assemble(
                source,
                &request(
                    Selection::Manual {
                        start_secs: 1.5,
                        duration_secs: 1.0,
                    },
                    IdScheme::Sequential,
                ),
                &mut ids,
            )
            .unwrap_err();

        assert!(matches!(err, Error::SelectionOutOfBounds { .. }));
        assert!(err.to_string().contains("recording is 2.00s"));
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn duplicate_id_fails_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let settings = PipelineSettings::default();
        let layout = layout(&dir);
        let assembler = ClipAssembler::new(&settings, &layout, &NoSpectrogram);

        let samples = tone(1.0, 44_100, 0.1);
        let request = request(Selection::Auto, IdScheme::ContentHash);
        let mut ids = IdAllocator::default();
        let first = assembler
            .assemble(
                AudioBuffer::from_mono(samples.clone(), 44_100).unwrap(),
                &request,
                &mut ids,
            )
            .unwrap();
        fs::remove_file(layout.resolve(&first[0].file_path)).unwrap();

        let err = assembler
            .assemble(AudioBuffer::from_mono(samples, 44_100).unwrap(), &request, &mut ids)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateClipId { .. }));
        assert!(!layout.resolve(&first[0].file_path).exists());
    }

    #[test]
    fn duration_ms_floors() {
        let clip = RenderedClip {
            samples: vec![0.0; 44_099],
            sample_rate: 44_100,
            window: SegmentWindow { start: 0, len: 44_099 },
            input_lufs: None,
            loudness_lufs: None,
        };
        assert_eq!(clip.duration_ms(), 999);
    }
}
