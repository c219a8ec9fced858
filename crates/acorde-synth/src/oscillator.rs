//! Phase-accumulator oscillator with naive geometric waveforms.
//!
//! The accumulator holds a normalized phase in `[0.0, 1.0)` and advances by
//! `frequency / sample_rate` per sample, wrapping by subtraction so phase
//! stays continuous across frequency and waveform changes. Shapes are
//! evaluated directly from the phase with no band-limiting; aliasing above
//! Nyquist is part of the sound.

use core::f32::consts::TAU;
use libm::{fabsf, sinf};

/// Waveform shapes selectable per oscillator.
///
/// `Pulse` reads the oscillator's pulse width; all other shapes ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    /// Pure sine wave.
    #[default]
    Sine,
    /// Rising sawtooth, `-1.0` to `1.0` over one cycle.
    Saw,
    /// Symmetric triangle.
    Triangle,
    /// Square wave, 50% duty cycle.
    Square,
    /// Rectangular pulse with adjustable duty cycle.
    Pulse,
}

/// A single phase-accumulator oscillator.
///
/// # Example
///
/// ```
/// use acorde_synth::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new(48000.0);
/// osc.set_waveform(Waveform::Saw);
/// osc.set_frequency(440.0);
///
/// let sample = osc.advance();
/// assert!(sample >= -1.0 && sample <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Current phase position, normalized to `[0.0, 1.0)`.
    phase: f32,
    /// Phase increment per sample, `frequency / sample_rate`.
    phase_inc: f32,
    /// Oscillation frequency in Hz.
    frequency: f32,
    /// Sample rate in Hz.
    sample_rate: f32,
    /// Active waveform shape.
    waveform: Waveform,
    /// Duty cycle for [`Waveform::Pulse`], in `[0.01, 0.99]`.
    pulse_width: f32,
}

impl Oscillator {
    /// Create an oscillator at the given sample rate, defaulting to a
    /// 440 Hz sine.
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_inc: 0.0,
            frequency: 440.0,
            sample_rate,
            waveform: Waveform::default(),
            pulse_width: 0.5,
        };
        osc.recalculate_increment();
        osc
    }

    /// Set the oscillation frequency in Hz. Clamped to
    /// `0.0 ..= sample_rate / 2`; nothing above Nyquist is representable
    /// and an increment past 1.0 would break the phase wrap.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.clamp(0.0, self.sample_rate * 0.5);
        self.recalculate_increment();
    }

    /// Current frequency in Hz (after clamping).
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Select the waveform shape. Takes effect on the next sample; phase is
    /// untouched, so the switch is a plain discontinuity in the output.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Active waveform shape.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set the pulse duty cycle. Clamped to `0.01 ..= 0.99` so the pulse
    /// never degenerates into DC.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width = width.clamp(0.01, 0.99);
    }

    /// Current pulse width (after clamping).
    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Change the sample rate, preserving frequency and phase.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.frequency = self.frequency.clamp(0.0, sample_rate * 0.5);
        self.recalculate_increment();
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current normalized phase in `[0.0, 1.0)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Set the phase directly. Clamped to `[0.0, 1.0]`; 1.0 lands back on 0.0.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.clamp(0.0, 1.0) % 1.0;
    }

    /// Reset phase to zero for a clean cycle start.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample at the current phase, then advance.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let output = self.generate_sample();
        self.advance_phase();
        output
    }

    fn recalculate_increment(&mut self) {
        self.phase_inc = self.frequency / self.sample_rate;
    }

    #[inline]
    fn generate_sample(&self) -> f32 {
        let t = self.phase;
        match self.waveform {
            Waveform::Sine => sinf(t * TAU),
            Waveform::Saw => 2.0 * t - 1.0,
            Waveform::Triangle => 2.0 * fabsf(2.0 * t - 1.0) - 1.0,
            Waveform::Square => {
                if t < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Pulse => {
                if t < self.pulse_width {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    #[inline]
    fn advance_phase(&mut self) {
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SR: f32 = 48000.0;

    fn render(osc: &mut Oscillator, frames: usize) -> Vec<f32> {
        (0..frames).map(|_| osc.advance()).collect()
    }

    #[test]
    fn sine_starts_at_zero_phase() {
        let mut osc = Oscillator::new(SR);
        osc.set_frequency(440.0);
        let first = osc.advance();
        assert!(fabsf(first) < 1e-6, "sine at phase 0 should be 0, got {first}");
    }

    // 375 Hz at 48 kHz gives a phase increment of exactly 1/128, so every
    // phase value in the cycle is exact and duty-cycle counts are stable.
    const DYADIC_FREQ: f32 = 375.0;
    const CYCLE: usize = 128;

    #[test]
    fn saw_rises_through_one_cycle() {
        let mut osc = Oscillator::new(SR);
        osc.set_waveform(Waveform::Saw);
        osc.set_frequency(DYADIC_FREQ);
        let samples = render(&mut osc, CYCLE);
        assert_eq!(samples[0], -1.0);
        for pair in samples.windows(2) {
            assert!(pair[1] > pair[0], "saw must rise monotonically within a cycle");
        }
    }

    #[test]
    fn square_duty_cycle_is_half() {
        let mut osc = Oscillator::new(SR);
        osc.set_waveform(Waveform::Square);
        osc.set_frequency(DYADIC_FREQ);
        let samples = render(&mut osc, CYCLE);
        let high = samples.iter().filter(|&&s| s > 0.0).count();
        assert_eq!(high, CYCLE / 2);
    }

    #[test]
    fn pulse_duty_cycle_follows_width() {
        let mut osc = Oscillator::new(SR);
        osc.set_waveform(Waveform::Pulse);
        osc.set_frequency(DYADIC_FREQ);
        osc.set_pulse_width(0.25);
        let samples = render(&mut osc, CYCLE);
        let high = samples.iter().filter(|&&s| s > 0.0).count();
        assert_eq!(high, CYCLE / 4);
    }

    #[test]
    fn triangle_peaks_at_half_cycle() {
        let mut osc = Oscillator::new(SR);
        osc.set_waveform(Waveform::Triangle);
        osc.set_frequency(DYADIC_FREQ);
        let samples = render(&mut osc, CYCLE);
        assert!(fabsf(samples[0] - 1.0) < 1e-6, "triangle at phase 0 is +1");
        assert!(
            fabsf(samples[CYCLE / 2] + 1.0) < 1e-6,
            "triangle at half cycle is -1"
        );
    }

    #[test]
    fn frequency_sets_cycle_length() {
        let mut osc = Oscillator::new(SR);
        osc.set_frequency(1000.0);
        let samples = render(&mut osc, SR as usize);
        // Count positive-going zero crossings over one second
        let mut crossings = 0;
        for pair in samples.windows(2) {
            if pair[0] <= 0.0 && pair[1] > 0.0 {
                crossings += 1;
            }
        }
        assert!(
            (crossings as i32 - 1000).abs() <= 2,
            "expected ~1000 crossings, got {crossings}"
        );
    }

    #[test]
    fn phase_accumulates_exactly() {
        let mut osc = Oscillator::new(SR);
        osc.set_frequency(440.0);
        let frames = 10_000u32;
        for _ in 0..frames {
            osc.advance();
        }
        let expected = (f64::from(frames) * 440.0 / f64::from(SR)).fract() as f32;
        let diff = fabsf(osc.phase() - expected);
        assert!(
            diff < 1e-2,
            "phase drifted: expected {expected}, got {}",
            osc.phase()
        );
    }

    #[test]
    fn phase_survives_waveform_switch() {
        let mut osc = Oscillator::new(SR);
        osc.set_frequency(440.0);
        render(&mut osc, 37);
        let before = osc.phase();
        osc.set_waveform(Waveform::Square);
        assert_eq!(osc.phase(), before);
    }

    #[test]
    fn frequency_clamps_at_nyquist() {
        let mut osc = Oscillator::new(SR);
        osc.set_frequency(1_000_000.0);
        assert_eq!(osc.frequency(), SR * 0.5);
        // Phase keeps wrapping even at the extreme
        for _ in 0..1000 {
            osc.advance();
        }
        assert!(osc.phase() >= 0.0 && osc.phase() < 1.0);
    }

    #[test]
    fn reset_returns_phase_to_zero() {
        let mut osc = Oscillator::new(SR);
        osc.set_frequency(440.0);
        render(&mut osc, 123);
        osc.reset();
        assert_eq!(osc.phase(), 0.0);
    }

    proptest! {
        #[test]
        fn output_always_within_unit_range(
            freq in 0.0f32..24000.0,
            width in 0.0f32..1.0,
            shape in 0usize..5,
        ) {
            let mut osc = Oscillator::new(SR);
            osc.set_frequency(freq);
            osc.set_pulse_width(width);
            osc.set_waveform(match shape {
                0 => Waveform::Sine,
                1 => Waveform::Saw,
                2 => Waveform::Triangle,
                3 => Waveform::Square,
                _ => Waveform::Pulse,
            });
            for _ in 0..256 {
                let s = osc.advance();
                prop_assert!((-1.0..=1.0).contains(&s), "sample {s} out of range");
            }
        }
    }
}
