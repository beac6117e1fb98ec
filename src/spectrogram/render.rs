//! Spectrogram rendering to PNG.

use super::SpectrogramRenderer;
use super::colormap::magma;
use crate::constants::spectrogram::{
    DYNAMIC_RANGE_DB, FREQ_MAX_HZ, FREQ_MIN_HZ, HEIGHT, HOP_LENGTH, N_FFT, WIDTH,
};
use crate::error::{Error, Result};
use image::{ImageFormat, RgbImage};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;
use std::io::Cursor;

/// Reference level used when the whole clip is quieter than this, so
/// near-silence renders dark instead of being stretched to full range.
const QUIET_PEAK_DB: f32 = -20.0;

/// Renders a fixed-size magma spectrogram of the bird frequency band.
#[derive(Debug, Clone)]
pub struct PngSpectrogram {
    n_fft: usize,
    hop: usize,
    freq_min_hz: f32,
    freq_max_hz: f32,
    width: u32,
    height: u32,
    dynamic_range_db: f32,
}

impl Default for PngSpectrogram {
    fn default() -> Self {
        Self {
            n_fft: N_FFT,
            hop: HOP_LENGTH,
            freq_min_hz: FREQ_MIN_HZ,
            freq_max_hz: FREQ_MAX_HZ,
            width: WIDTH,
            height: HEIGHT,
            dynamic_range_db: DYNAMIC_RANGE_DB,
        }
    }
}

impl PngSpectrogram {
    /// Power spectrum in dB, one row of `n_fft / 2 + 1` bins per frame.
    fn power_db(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let window = hann_window(self.n_fft);
        let bins = self.n_fft / 2 + 1;

        let mut padded = samples.to_vec();
        if padded.len() < self.n_fft {
            padded.resize(self.n_fft, 0.0);
        }
        let frames = 1 + (padded.len() - self.n_fft) / self.hop;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(self.n_fft);
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];

        (0..frames)
            .map(|frame| {
                let start = frame * self.hop;
                for (slot, (&sample, &w)) in buffer
                    .iter_mut()
                    .zip(padded[start..start + self.n_fft].iter().zip(&window))
                {
                    *slot = Complex::new(sample * w, 0.0);
                }
                fft.process(&mut buffer);
                buffer[..bins]
                    .iter()
                    .map(|c| 10.0 * (c.norm_sqr() + 1e-12).log10())
                    .collect()
            })
            .collect()
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn bin_for(&self, freq_hz: f32, sample_rate: u32, bins: usize) -> usize {
        let bin = (freq_hz * self.n_fft as f32 / sample_rate as f32).round() as usize;
        bin.min(bins - 1)
    }
}

impl SpectrogramRenderer for PngSpectrogram {
    #[allow(clippy::cast_precision_loss)]
    fn render(&self, samples: &[f32], sample_rate: u32) -> Result<Option<Vec<u8>>> {
        let spectrum = self.power_db(samples);
        let bins = self.n_fft / 2 + 1;
        let low = self.bin_for(self.freq_min_hz, sample_rate, bins);
        let high = self.bin_for(self.freq_max_hz, sample_rate, bins).max(low);

        let peak = spectrum
            .iter()
            .flat_map(|frame| frame[low..=high].iter().copied())
            .fold(f32::NEG_INFINITY, f32::max)
            .max(QUIET_PEAK_DB);
        let floor = peak - self.dynamic_range_db;

        let frames = spectrum.len();
        let span = self.freq_max_hz - self.freq_min_hz;
        let image = RgbImage::from_fn(self.width, self.height, |x, y| {
            let frame = (x as usize * frames / self.width as usize).min(frames - 1);
            // Row 0 is the top of the image, i.e. the highest frequency.
            let freq = self.freq_max_hz - (y as f32 + 0.5) / self.height as f32 * span;
            let db = spectrum[frame][self.bin_for(freq, sample_rate, bins)];
            image::Rgb(magma((db - floor) / self.dynamic_range_db))
        });

        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Error::SpectrogramEncode { source: e })?;
        Ok(Some(bytes))
    }
}

#[allow(clippy::cast_precision_loss)]
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn tone(freq: f32, secs: f32, rate: u32) -> Vec<f32> {
        let len = (rate as f32 * secs) as usize;
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn renders_fixed_size_png() {
        let bytes = PngSpectrogram::default()
            .render(&tone(3000.0, 1.0, 44_100), 44_100)
            .unwrap()
            .unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.width(), WIDTH);
        assert_eq!(image.height(), HEIGHT);
    }

    #[test]
    fn tone_is_brightest_at_its_frequency() {
        let renderer = PngSpectrogram::default();
        let bytes = renderer
            .render(&tone(5250.0, 0.5, 44_100), 44_100)
            .unwrap()
            .unwrap();
        let image = image::load_from_memory(&bytes).unwrap().to_rgb8();

        // 5250 Hz sits at the vertical middle of 500-10000 Hz.
        let x = WIDTH / 2;
        let brightness = |y: u32| {
            let p = image.get_pixel(x, y);
            u32::from(p[0]) + u32::from(p[1]) + u32::from(p[2])
        };
        let brightest = (0..HEIGHT).max_by_key(|&y| brightness(y)).unwrap();
        assert!(brightest.abs_diff(HEIGHT / 2) <= 3, "brightest row {brightest}");
    }

    #[test]
    fn very_short_input_still_renders() {
        let bytes = PngSpectrogram::default()
            .render(&[0.1; 100], 22_050)
            .unwrap();
        assert!(bytes.is_some());
    }
}
