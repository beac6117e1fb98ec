//! Energy-based segment selection.
//!
//! Windows are scored by RMS energy. All lengths and offsets are in samples.

/// A contiguous range of samples inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentWindow {
    /// First sample of the window.
    pub start: usize,
    /// Number of samples.
    pub len: usize,
}

impl SegmentWindow {
    /// One past the last sample.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Start offset in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn start_secs(&self, sample_rate: u32) -> f64 {
        self.start as f64 / f64::from(sample_rate)
    }

    /// Borrow the window's samples, clamped to the buffer.
    pub fn slice<'a>(&self, samples: &'a [f32]) -> &'a [f32] {
        let start = self.start.min(samples.len());
        let end = self.end().min(samples.len());
        &samples[start..end]
    }
}

/// Root-mean-square energy, 0 for an empty slice.
#[allow(clippy::cast_precision_loss)]
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt()
}

/// Score every window of `window` samples, advancing by `step`.
///
/// Only windows fully inside the buffer are scored.
pub fn scan_windows(samples: &[f32], window: usize, step: usize) -> Vec<(usize, f64)> {
    let step = step.max(1);
    if window == 0 || window > samples.len() {
        return Vec::new();
    }
    (0..=samples.len() - window)
        .step_by(step)
        .map(|start| (start, rms(&samples[start..start + window])))
        .collect()
}

/// Pick the single highest-energy window.
///
/// A buffer no longer than the window is returned whole. Ties go to the
/// earliest window.
pub fn select_best(samples: &[f32], window: usize, step: usize) -> SegmentWindow {
    if samples.len() <= window {
        return SegmentWindow {
            start: 0,
            len: samples.len(),
        };
    }

    let mut best = SegmentWindow {
        start: 0,
        len: window,
    };
    let mut best_rms = f64::NEG_INFINITY;
    for (start, energy) in scan_windows(samples, window, step) {
        if energy > best_rms {
            best_rms = energy;
            best.start = start;
        }
    }
    best
}

/// Pick up to `max_segments` non-overlapping high-energy windows.
///
/// Candidates are taken in order of descending energy and accepted only if
/// their start is at least one window away from every accepted start.
pub fn select_distinct(
    samples: &[f32],
    window: usize,
    step: usize,
    max_segments: usize,
) -> Vec<SegmentWindow> {
    if samples.len() <= window {
        return vec![SegmentWindow {
            start: 0,
            len: samples.len(),
        }];
    }

    let mut ranked = scan_windows(samples, window, step);
    // Stable sort keeps scan order among equal energies.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut accepted: Vec<SegmentWindow> = Vec::new();
    for (start, _) in ranked {
        if accepted.len() >= max_segments {
            break;
        }
        if accepted.iter().all(|w| w.start.abs_diff(start) >= window) {
            accepted.push(SegmentWindow { start, len: window });
        }
    }

    if accepted.is_empty() {
        let best = select_best(samples, window, step);
        accepted.push(SegmentWindow {
            start: best.start,
            len: window,
        });
    }
    accepted
}

/// Convert a step in seconds to samples, never less than one.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn step_samples(sample_rate: u32, step_secs: f64) -> usize {
    ((f64::from(sample_rate) * step_secs).round() as usize).max(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn burst(len: usize, at: usize, burst_len: usize, amplitude: f32) -> Vec<f32> {
        let mut samples = vec![0.0; len];
        for s in &mut samples[at..at + burst_len] {
            *s = amplitude;
        }
        samples
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&[0.5; 100]) - 0.5).abs() < 1e-9);
        assert!(rms(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn scan_stays_inside_buffer() {
        let samples = vec![0.0; 100];
        let windows = scan_windows(&samples, 30, 20);
        let starts: Vec<usize> = windows.iter().map(|w| w.0).collect();
        assert_eq!(starts, vec![0, 20, 40, 60]);
        assert!(windows.iter().all(|(s, _)| s + 30 <= 100));
    }

    #[test]
    fn short_buffer_is_returned_whole() {
        let samples = vec![0.1; 50];
        assert_eq!(
            select_best(&samples, 50, 5),
            SegmentWindow { start: 0, len: 50 }
        );
        assert_eq!(
            select_distinct(&samples, 80, 5, 3),
            vec![SegmentWindow { start: 0, len: 50 }]
        );
    }

    #[test]
    fn best_window_covers_the_burst() {
        let samples = burst(1000, 600, 50, 0.9);
        let window = select_best(&samples, 100, 10);
        assert_eq!(window.len, 100);
        assert!(window.start <= 600 && window.end() >= 650);
    }

    #[test]
    fn ties_go_to_earliest_window() {
        let samples = vec![0.25; 1000];
        assert_eq!(select_best(&samples, 100, 10).start, 0);
    }

    #[test]
    fn distinct_windows_do_not_overlap() {
        let mut samples = burst(2000, 100, 50, 0.9);
        for s in &mut samples[1000..1050] {
            *s = 0.5;
        }
        for s in &mut samples[1600..1650] {
            *s = 0.3;
        }
        let windows = select_distinct(&samples, 200, 50, 3);
        assert_eq!(windows.len(), 3);
        for (i, a) in windows.iter().enumerate() {
            for b in &windows[i + 1..] {
                assert!(a.start.abs_diff(b.start) >= 200);
            }
        }
        // Highest energy first.
        assert!(windows[0].start <= 100 && windows[0].end() >= 150);
    }

    #[test]
    fn distinct_respects_segment_cap() {
        let samples: Vec<f32> = (0..10_000).map(|i| if i % 7 == 0 { 0.8 } else { 0.1 }).collect();
        let windows = select_distinct(&samples, 500, 250, 2);
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn step_is_never_zero() {
        assert_eq!(step_samples(44_100, 0.1), 4410);
        assert_eq!(step_samples(44_100, 0.5), 22_050);
        assert_eq!(step_samples(10, 0.0), 1);
    }
}
