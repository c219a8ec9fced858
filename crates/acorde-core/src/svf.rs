//! State variable filter, the per-voice tone-shaping stage.
//!
//! Implements the Topology-Preserving Transform (TPT) SVF after Zavalishin,
//! "The Art of VA Filter Design" (rev. 2.1.2, 2018), Chapter 3. The
//! trapezoidal integrator discretization keeps the analog prototype's
//! frequency response and stays stable under cutoff modulation, which matters
//! here because cutoff and Q are live controls that get swept while voices
//! are sounding.
//!
//! One state pair yields the lowpass, highpass, bandpass, and notch responses
//! simultaneously; [`process`](StateVariableFilter::process) returns all four
//! and the caller picks the one it is configured for. A filter set to "off"
//! upstream is expressed by parking the cutoff at the Nyquist clamp and
//! taking the lowpass output, so the stage keeps running and switching it
//! back on later cannot click.

use core::f32::consts::PI;
use libm::tanf;

use crate::flush_denormal;

/// All four responses computed by one filter tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SvfOutputs {
    /// Passes below the cutoff.
    pub lowpass: f32,
    /// Passes above the cutoff.
    pub highpass: f32,
    /// Passes around the cutoff.
    pub bandpass: f32,
    /// Rejects around the cutoff.
    pub notch: f32,
}

/// Two-pole (12 dB/oct) TPT state variable filter.
///
/// ## Parameters
///
/// - `cutoff`: Hz, clamped to 20.0 ..= sample_rate × 0.49 (default 1000.0)
/// - `resonance`: Q factor, clamped to 0.5 ..= 20.0 (default 0.707,
///   Butterworth)
///
/// # Example
///
/// ```rust
/// use acorde_core::StateVariableFilter;
///
/// let mut svf = StateVariableFilter::new(48000.0);
/// svf.set_cutoff(2000.0);
/// svf.set_resonance(1.5);
///
/// let outs = svf.process(0.5);
/// let filtered = outs.lowpass;
/// ```
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    // Trapezoidal integrator state
    ic1eq: f32,
    ic2eq: f32,

    // Coefficients
    g: f32,
    k: f32,

    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl StateVariableFilter {
    /// Create a new SVF at the given sample rate, cutoff 1000 Hz, Q 0.707.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707,
        };
        svf.update_coefficients();
        svf
    }

    /// Set cutoff frequency in Hz. Clamped to 20.0 ..= `sample_rate × 0.49`.
    pub fn set_cutoff(&mut self, freq: f32) {
        self.cutoff = freq.clamp(20.0, self.sample_rate * 0.49);
        self.update_coefficients();
    }

    /// Current cutoff frequency in Hz (after clamping).
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (Q). Clamped to 0.5 ..= 20.0. Q = 0.707 is maximally
    /// flat; higher values peak at the cutoff.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(0.5, 20.0);
        self.update_coefficients();
    }

    /// Current resonance (after clamping).
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Update the sample rate and recompute coefficients. Re-applies the
    /// cutoff clamp against the new Nyquist bound.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.cutoff = self.cutoff.clamp(20.0, self.sample_rate * 0.49);
        self.update_coefficients();
    }

    /// Clear the integrator state.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    fn update_coefficients(&mut self) {
        // g = tan(pi * fc / sr), k = 1/Q (Zavalishin ch. 3.5)
        self.g = tanf(PI * self.cutoff / self.sample_rate);
        self.k = 1.0 / self.resonance;
    }

    /// Process one sample and return all four responses.
    #[inline]
    pub fn process(&mut self, input: f32) -> SvfOutputs {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        let lowpass = v2;
        let bandpass = v1;
        let highpass = input - self.k * v1 - v2;

        SvfOutputs {
            lowpass,
            highpass,
            bandpass,
            notch: lowpass + highpass,
        }
    }
}
