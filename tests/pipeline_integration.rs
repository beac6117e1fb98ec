//! End-to-end tests for the clip pipeline.

#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use chipnotes::audio::AudioBuffer;
use chipnotes::catalog::VocalizationType;
use chipnotes::clipper::{
    ClipAssembler, ClipRequest, IdAllocator, IdScheme, Selection, measure_lufs,
    normalize_loudness, select_best, step_samples,
};
use chipnotes::config::{PathsConfig, PipelineSettings, ProjectLayout};
use chipnotes::constants::pipeline::{LUFS_TOLERANCE, TARGET_LUFS};
use chipnotes::spectrogram::PngSpectrogram;
use tempfile::TempDir;

const RATE: u32 = 44_100;

fn tone(secs: f64, rate: u32, amplitude: f32) -> Vec<f32> {
    let n = (secs * f64::from(rate)) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * 2_000.0 * t).sin()
        })
        .collect()
}

fn request(selection: Selection) -> ClipRequest {
    ClipRequest {
        species_code: "carw".to_string(),
        common_name: "Carolina Wren".to_string(),
        vocalization_type: VocalizationType::Song,
        quality_score: 5,
        source: "local".to_string(),
        source_id: None,
        source_url: None,
        recordist: None,
        source_file: "carw.wav".to_string(),
        selection,
        id_scheme: IdScheme::ContentHash,
    }
}

#[test]
fn best_window_contains_short_burst() {
    let mut samples = vec![0.0_f32; 10 * RATE as usize];
    let burst_start = 4 * RATE as usize;
    let burst = tone(0.3, RATE, 0.5);
    let burst_end = burst_start + burst.len();
    samples[burst_start..burst_end].copy_from_slice(&burst);

    let window = select_best(&samples, 2 * RATE as usize, step_samples(RATE, 0.1));

    assert_eq!(window.len, 2 * RATE as usize);
    assert!(window.start <= burst_start, "window starts at {}", window.start);
    assert!(window.end() >= burst_end, "window ends at {}", window.end());
}

#[test]
fn burst_scenario_through_assembler() {
    let dir = TempDir::new().unwrap();
    let settings = PipelineSettings::default();
    let layout = ProjectLayout::new(dir.path(), &PathsConfig::default(), None);
    let assembler = ClipAssembler::new(&settings, &layout, &chipnotes::spectrogram::NoSpectrogram);

    let mut samples = vec![0.0_f32; 10 * RATE as usize];
    let burst_start = 4 * RATE as usize;
    let burst = tone(0.3, RATE, 0.9);
    let burst_end = burst_start + burst.len();
    samples[burst_start..burst_end].copy_from_slice(&burst);
    let source = AudioBuffer::from_mono(samples, RATE).unwrap();
    let selection = Selection::Distinct { window_secs: 2.0 };

    let prepared = assembler.prepare(source.clone()).unwrap();
    let windows = assembler.plan(&prepared, &selection).unwrap();
    let top = windows[0];
    assert!(top.start <= burst_start && top.end() >= burst_end, "{top:?}");
    // Equal-energy windows resolve to the earliest one holding the burst.
    assert!(top.start_secs(RATE) >= 4.3 - 2.0 - 1e-9, "{top:?}");

    let rendered = assembler.render(&prepared, top).unwrap();
    assert_eq!(rendered.duration_ms(), 2000);
    let native = rendered.input_lufs.unwrap();
    let normalized = rendered.loudness_lufs.unwrap();
    assert!((normalized - TARGET_LUFS).abs() < (native - TARGET_LUFS).abs());
    assert!((normalized - TARGET_LUFS).abs() <= LUFS_TOLERANCE, "got {normalized} LUFS");

    let mut ids = IdAllocator::default();
    let clips = assembler
        .assemble(source, &request(selection), &mut ids)
        .unwrap();
    assert_eq!(clips[0].duration_ms, 2000);
    assert!((clips[0].loudness_lufs.unwrap() - TARGET_LUFS).abs() <= LUFS_TOLERANCE);
    assert!(layout.resolve(&clips[0].file_path).exists());
}

#[test]
fn quiet_clip_is_normalized_to_target() {
    let quiet = tone(2.0, RATE, 0.01);
    let before = measure_lufs(&quiet, RATE).unwrap().unwrap();
    assert!(before < TARGET_LUFS - 10.0);

    let normalized = normalize_loudness(quiet, RATE, TARGET_LUFS).unwrap();
    let after = measure_lufs(&normalized.samples, RATE).unwrap().unwrap();
    assert!((after - TARGET_LUFS).abs() <= LUFS_TOLERANCE, "got {after} LUFS");
}

#[test]
fn stereo_48k_source_becomes_mono_44k_clip_with_spectrogram() {
    let dir = TempDir::new().unwrap();
    let settings = PipelineSettings::default();
    let layout = ProjectLayout::new(dir.path(), &PathsConfig::default(), None);
    let renderer = PngSpectrogram::default();
    let assembler = ClipAssembler::new(&settings, &layout, &renderer);

    let left = tone(1.0, 48_000, 0.2);
    let right = left.iter().map(|s| s * 0.5).collect();
    let source = AudioBuffer::new(vec![left, right], 48_000).unwrap();

    let mut ids = IdAllocator::default();
    let clips = assembler
        .assemble(source, &request(Selection::Auto), &mut ids)
        .unwrap();

    assert_eq!(clips.len(), 1);
    let clip = &clips[0];
    assert_eq!(clip.species_code, "CARW");
    assert!((990..=1010).contains(&clip.duration_ms), "{} ms", clip.duration_ms);
    assert!((clip.loudness_lufs.unwrap() - TARGET_LUFS).abs() <= LUFS_TOLERANCE);

    let reader = hound::WavReader::open(layout.resolve(&clip.file_path)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, RATE);
    assert_eq!(spec.bits_per_sample, 16);

    let png = layout.resolve(clip.spectrogram_path.as_deref().unwrap());
    let bytes = std::fs::read(png).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
}

#[test]
fn reingesting_the_same_recording_is_a_duplicate() {
    let dir = TempDir::new().unwrap();
    let settings = PipelineSettings {
        spectrograms: false,
        ..PipelineSettings::default()
    };
    let layout = ProjectLayout::new(dir.path(), &PathsConfig::default(), None);
    let assembler = ClipAssembler::new(&settings, &layout, &chipnotes::spectrogram::NoSpectrogram);

    let samples = tone(4.0, RATE, 0.1);
    let mut ids = IdAllocator::default();
    let first = assembler
        .assemble(
            AudioBuffer::from_mono(samples.clone(), RATE).unwrap(),
            &request(Selection::Auto),
            &mut ids,
        )
        .unwrap();

    let err = assembler
        .assemble(
            AudioBuffer::from_mono(samples, RATE).unwrap(),
            &request(Selection::Auto),
            &mut ids,
        )
        .unwrap_err();
    assert!(matches!(err, chipnotes::Error::DuplicateClipId { ref id } if *id == first[0].clip_id));
}
