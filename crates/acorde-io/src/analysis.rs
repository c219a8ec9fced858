//! Spectrum analysis tap on the output bus.
//!
//! The render callback ships fixed-size frames of the post-master bus
//! through a bounded channel; [`SpectrumAnalyzer`] collects them into a
//! rolling window on the control side and turns the window into
//! [`AnalysisSnapshot`] values on demand. Analysis never feeds back into
//! synthesis: a dropped frame costs display freshness, nothing else.

use crossbeam_channel::Sender;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;
use std::sync::Arc;

/// Samples in the rolling analysis window.
pub const WINDOW_LEN: usize = 2048;

/// Bins in the one-sided spectrum of the window (DC to Nyquist).
pub const SPECTRUM_BINS: usize = WINDOW_LEN / 2 + 1;

/// Samples per frame shipped out of the render context.
pub(crate) const FRAME_LEN: usize = 256;

/// Frames the render side may queue before new ones are dropped.
pub(crate) const FRAME_QUEUE: usize = 32;

/// Exponential smoothing factor applied to bin magnitudes between
/// successive snapshots.
const SMOOTHING: f32 = 0.85;

/// A fixed block of bus samples captured after the master gain stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnalysisFrame {
    /// Mono bus samples, oldest first.
    pub(crate) samples: [f32; FRAME_LEN],
}

/// Render-side accumulator that chops the mono bus into analysis frames.
///
/// `push_block` never blocks or allocates. When the queue is full the
/// finished frame is dropped and the display falls behind instead of the
/// audio glitching.
#[derive(Debug)]
pub(crate) struct FrameTap {
    frame: [f32; FRAME_LEN],
    fill: usize,
}

impl FrameTap {
    pub(crate) fn new() -> Self {
        Self {
            frame: [0.0; FRAME_LEN],
            fill: 0,
        }
    }

    /// Append bus samples, sending a frame each time one fills.
    pub(crate) fn push_block(&mut self, samples: &[f32], out: &Sender<AnalysisFrame>) {
        for &sample in samples {
            self.frame[self.fill] = sample;
            self.fill += 1;
            if self.fill == FRAME_LEN {
                self.fill = 0;
                let _ = out.try_send(AnalysisFrame {
                    samples: self.frame,
                });
            }
        }
    }
}

/// One view of the output bus: the raw window plus its smoothed spectrum.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    /// The most recent [`WINDOW_LEN`] bus samples, oldest first.
    pub waveform: [f32; WINDOW_LEN],
    /// One-sided magnitude spectrum in dB, floored at -100 dB.
    pub spectrum_db: [f32; SPECTRUM_BINS],
}

/// Control-side analyser holding the rolling window and bin smoothing state.
pub(crate) struct SpectrumAnalyzer {
    window: [f32; WINDOW_LEN],
    magnitudes: [f32; SPECTRUM_BINS],
    fft: Arc<dyn rustfft::Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub(crate) fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(WINDOW_LEN);

        Self {
            window: [0.0; WINDOW_LEN],
            magnitudes: [0.0; SPECTRUM_BINS],
            fft,
            scratch: Vec::with_capacity(WINDOW_LEN),
        }
    }

    /// Shift the rolling window left and append one frame.
    pub(crate) fn push(&mut self, frame: &AnalysisFrame) {
        self.window.copy_within(FRAME_LEN.., 0);
        self.window[WINDOW_LEN - FRAME_LEN..].copy_from_slice(&frame.samples);
    }

    /// Hann-window the current contents, transform, and fold the fresh bin
    /// magnitudes into the smoothed spectrum.
    ///
    /// Magnitudes are normalized by the window length, so a full-scale sine
    /// lands well below 0 dB; silence sits exactly on the -100 dB floor.
    pub(crate) fn snapshot(&mut self) -> AnalysisSnapshot {
        self.scratch.clear();
        self.scratch
            .extend(self.window.iter().enumerate().map(|(i, &sample)| {
                let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / WINDOW_LEN as f32).cos());
                Complex::new(sample * w, 0.0)
            }));

        self.fft.process(&mut self.scratch);

        let mut spectrum_db = [0.0_f32; SPECTRUM_BINS];
        let scale = 1.0 / WINDOW_LEN as f32;
        for (bin, db) in spectrum_db.iter_mut().enumerate() {
            let magnitude = self.scratch[bin].norm() * scale;
            let smoothed = SMOOTHING * self.magnitudes[bin] + (1.0 - SMOOTHING) * magnitude;
            self.magnitudes[bin] = smoothed;
            *db = 10.0 * (smoothed * smoothed).max(1e-10).log10();
        }

        AnalysisSnapshot {
            waveform: self.window,
            spectrum_db,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(value: f32) -> AnalysisFrame {
        AnalysisFrame {
            samples: [value; FRAME_LEN],
        }
    }

    /// Fill the whole window with a sine placed exactly on `bin`.
    fn push_sine(analyzer: &mut SpectrumAnalyzer, bin: usize, amplitude: f32) {
        let mut k = 0usize;
        for _ in 0..(WINDOW_LEN / FRAME_LEN) {
            let mut samples = [0.0f32; FRAME_LEN];
            for sample in &mut samples {
                *sample =
                    amplitude * (2.0 * PI * bin as f32 * k as f32 / WINDOW_LEN as f32).sin();
                k += 1;
            }
            analyzer.push(&AnalysisFrame { samples });
        }
    }

    #[test]
    fn quiet_window_sits_on_the_floor() {
        let mut analyzer = SpectrumAnalyzer::new();
        let snapshot = analyzer.snapshot();

        assert!(snapshot.waveform.iter().all(|&s| s == 0.0));
        for &db in &snapshot.spectrum_db {
            assert!((db + 100.0).abs() < 0.01, "expected floor, got {db}");
        }
    }

    #[test]
    fn sine_peak_lands_in_its_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        push_sine(&mut analyzer, 64, 1.0);

        let snapshot = analyzer.snapshot();
        let peak = snapshot
            .spectrum_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin)
            .unwrap();

        assert_eq!(peak, 64);
        // Full-scale sine, Hann gain 0.5, one smoothing step at 0.15.
        assert!(snapshot.spectrum_db[64] > -35.0);
        assert!(snapshot.spectrum_db[64] < -22.0);
        // An exact-bin sine leaks into its neighbors only.
        assert!(snapshot.spectrum_db[1000] < -80.0);
    }

    #[test]
    fn smoothing_carries_energy_across_snapshots() {
        let mut analyzer = SpectrumAnalyzer::new();
        push_sine(&mut analyzer, 64, 1.0);
        let loud = analyzer.snapshot().spectrum_db[64];

        for _ in 0..(WINDOW_LEN / FRAME_LEN) {
            analyzer.push(&frame_of(0.0));
        }
        let after = analyzer.snapshot().spectrum_db[64];

        // One silent snapshot keeps 0.85 of the magnitude: a 1.41 dB drop.
        let drop = loud - after;
        assert!(drop > 1.0 && drop < 2.0, "drop was {drop}");
    }

    #[test]
    fn waveform_window_keeps_frames_in_arrival_order() {
        let mut analyzer = SpectrumAnalyzer::new();
        for value in 1..=8 {
            analyzer.push(&frame_of(value as f32));
        }

        let snapshot = analyzer.snapshot();
        assert_eq!(snapshot.waveform[0], 1.0);
        assert_eq!(snapshot.waveform[FRAME_LEN], 2.0);
        assert_eq!(snapshot.waveform[WINDOW_LEN - 1], 8.0);
    }

    #[test]
    fn tap_sends_only_complete_frames() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut tap = FrameTap::new();

        tap.push_block(&[0.5; 100], &tx);
        assert!(rx.try_recv().is_err());

        tap.push_block(&[0.5; FRAME_LEN - 100], &tx);
        let frame = rx.try_recv().unwrap();
        assert!(frame.samples.iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
    }

    #[test]
    fn tap_drops_frames_when_the_queue_is_full() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut tap = FrameTap::new();

        tap.push_block(&[1.0; FRAME_LEN], &tx);
        tap.push_block(&[2.0; FRAME_LEN], &tx);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.samples[0], 1.0);
        assert!(rx.try_recv().is_err(), "second frame should be dropped");
    }
}
