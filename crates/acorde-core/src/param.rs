//! Smoothed parameters for click-free live control.
//!
//! Every continuously variable control in the synthesizer (oscillator
//! frequency, filter cutoff, mix level, the per-voice gain share) is wrapped
//! in one of these types so that a control-context change becomes a short
//! ramp in the render context instead of a discontinuity.
//!
//! Two flavors:
//!
//! - [`SmoothedParam`] - one-pole exponential approach. Natural sounding,
//!   never quite "arrives"; right for frequency glides and tone controls.
//! - [`LinearSmoothedParam`] - constant-rate ramp that reaches the target in
//!   an exact number of samples and snaps there. Right where completion time
//!   is part of the contract, like the gain crossfade when the voice count
//!   changes.
//!
//! ```rust
//! use acorde_core::SmoothedParam;
//!
//! let mut cutoff = SmoothedParam::with_config(8000.0, 48000.0, 20.0);
//! cutoff.set_target(2000.0);
//! for _ in 0..960 {
//!     let _hz = cutoff.advance(); // one call per sample
//! }
//! assert!((cutoff.get() - 2000.0).abs() < 2000.0 * 0.4);
//! ```

use libm::expf;

/// Exponentially smoothed parameter (one-pole lowpass on the control value).
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// One-pole coefficient; 1.0 means instant.
    coeff: f32,
    sample_rate: f32,
    smoothing_ms: f32,
}

impl SmoothedParam {
    /// Create with an initial value and smoothing disabled (instant changes)
    /// until [`set_sample_rate`](Self::set_sample_rate) and
    /// [`set_smoothing_ms`](Self::set_smoothing_ms) configure it.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_ms: 0.0,
        }
    }

    /// Create fully configured.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_ms = smoothing_ms;
        param.update_coeff();
        param
    }

    /// Set the value the parameter approaches.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set and jump to a value with no smoothing.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update the sample rate (recomputes the smoothing coefficient).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coeff();
    }

    /// Set the smoothing time constant in milliseconds. Zero disables
    /// smoothing.
    pub fn set_smoothing_ms(&mut self, ms: f32) {
        self.smoothing_ms = ms;
        self.update_coeff();
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // y[n] = y[n-1] + coeff * (target - y[n-1])
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// The value being approached.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the current value has effectively reached the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Jump the current value to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    // coeff = 1 - e^(-1 / (tau * sr)); tau in seconds. After 5 tau the value
    // is within 0.7% of the target.
    fn update_coeff(&mut self) {
        if self.smoothing_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples_per_tau = self.smoothing_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples_per_tau);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Linearly smoothed parameter: ramps at constant rate and lands on the
/// target after exactly the configured transition time.
#[derive(Debug, Clone)]
pub struct LinearSmoothedParam {
    current: f32,
    target: f32,
    increment: f32,
    samples_remaining: u32,
    sample_rate: f32,
    transition_ms: f32,
}

impl LinearSmoothedParam {
    /// Create with an initial value and a default 10 ms transition.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate: 48000.0,
            transition_ms: 10.0,
        }
    }

    /// Create fully configured.
    pub fn with_config(initial: f32, sample_rate: f32, transition_ms: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            transition_ms,
        }
    }

    /// Start a ramp from the current value to `target` over the configured
    /// transition time. Retargeting mid-ramp restarts the ramp from wherever
    /// the value is now.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() < 1e-9 && self.samples_remaining == 0 {
            return;
        }
        self.target = target;

        let samples = (self.transition_ms / 1000.0 * self.sample_rate) as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Set and jump with no ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Update the sample rate. Affects ramps started afterwards.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set the ramp duration in milliseconds. Affects ramps started
    /// afterwards.
    pub fn set_transition_ms(&mut self, ms: f32) {
        self.transition_ms = ms;
    }

    /// Advance one sample and return the value. Snaps exactly onto the
    /// target at the end of the ramp.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// The ramp destination.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the ramp has finished.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }

    /// Abandon the ramp and jump to the target.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }
}

impl Default for LinearSmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_snaps_when_unsmoothed() {
        let mut param = SmoothedParam::with_config(1.0, 48000.0, 0.0);
        param.set_target(0.25);
        assert!((param.advance() - 0.25).abs() < 1e-6, "zero smoothing must snap");
    }

    #[test]
    fn exponential_converges_within_five_tau() {
        let mut param = SmoothedParam::with_config(0.0, 48000.0, 20.0);
        param.set_target(1.0);
        for _ in 0..(48000 / 10) {
            // 100 ms = 5 tau
            param.advance();
        }
        assert!(
            (param.get() - 1.0).abs() < 0.01,
            "expected convergence, got {}",
            param.get()
        );
    }

    #[test]
    fn exponential_hits_one_tau_mark() {
        let mut param = SmoothedParam::with_config(0.0, 48000.0, 20.0);
        param.set_target(1.0);
        for _ in 0..960 {
            param.advance();
        }
        let expected = 1.0 - expf(-1.0);
        assert!(
            (param.get() - expected).abs() < 0.05,
            "after one tau expected ~{expected}, got {}",
            param.get()
        );
    }

    #[test]
    fn linear_reaches_target_in_exact_time() {
        let mut param = LinearSmoothedParam::with_config(1.0, 48000.0, 20.0);
        param.set_target(0.5);

        let samples = 960;
        for i in 0..samples {
            let v = param.advance();
            if i + 1 < samples {
                assert!(!param.is_settled(), "settled {} samples early", samples - i - 1);
            }
            assert!((0.5..=1.0).contains(&v), "ramp escaped its endpoints: {v}");
        }
        assert_eq!(param.get(), 0.5, "linear ramp must snap to target exactly");
        assert!(param.is_settled());
    }

    #[test]
    fn linear_ramp_is_constant_rate() {
        let mut param = LinearSmoothedParam::with_config(0.0, 48000.0, 20.0);
        param.set_target(1.0);
        for _ in 0..480 {
            param.advance();
        }
        assert!(
            (param.get() - 0.5).abs() < 0.01,
            "halfway through a linear ramp should be halfway there, got {}",
            param.get()
        );
    }

    #[test]
    fn linear_retarget_restarts_from_current() {
        let mut param = LinearSmoothedParam::with_config(0.0, 48000.0, 20.0);
        param.set_target(1.0);
        for _ in 0..480 {
            param.advance();
        }
        let midway = param.get();
        param.set_target(0.0);
        let next = param.advance();
        assert!(
            (next - midway).abs() < 0.01,
            "retarget must ramp from the current value, jumped {midway} -> {next}"
        );
    }
}
