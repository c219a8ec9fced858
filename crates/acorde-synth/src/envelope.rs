//! ADSR amplitude envelope.
//!
//! Output is normalized to `[0.0, 1.0]`; the voice applies its own peak gain
//! on top. Attack and release are linear ramps with exact sample counts,
//! armed when the gate changes so later knob edits never stretch a ramp
//! already in flight. Decay is a one-pole exponential toward the sustain
//! level with a time constant of a quarter of the decay time, putting the
//! level within 2% of sustain by the end of the nominal decay window.

use libm::{expf, fabsf};

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStage {
    /// Silent; the voice slot can be reclaimed.
    #[default]
    Idle,
    /// Linear ramp from the gate-on level up to 1.0.
    Attack,
    /// Exponential approach from 1.0 down to the sustain level.
    Decay,
    /// Holding at the level reached when decay settled.
    Sustain,
    /// Linear ramp from the gate-off level down to 0.0.
    Release,
}

/// ADSR envelope generator.
///
/// Retrigger-safe: `gate_on` ramps from the current level rather than
/// snapping to zero, so restarting a sounding or releasing note never
/// clicks.
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    stage: EnvelopeStage,
    /// Current output level in `[0.0, 1.0]`.
    level: f32,
    sample_rate: f32,
    attack_sec: f32,
    decay_sec: f32,
    sustain_level: f32,
    release_sec: f32,
    /// Per-sample step for the attack ramp, armed at `gate_on`.
    attack_increment: f32,
    /// Samples left in the attack ramp.
    attack_remaining: u32,
    /// One-pole coefficient for the decay approach.
    decay_coeff: f32,
    /// Per-sample step for the release ramp (negative), armed at `gate_off`.
    release_increment: f32,
    /// Samples left in the release ramp.
    release_remaining: u32,
}

impl AdsrEnvelope {
    /// Create an idle envelope with 20 ms attack, 100 ms decay, 0.8 sustain,
    /// and 50 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            sample_rate,
            attack_sec: 0.02,
            decay_sec: 0.1,
            sustain_level: 0.8,
            release_sec: 0.05,
            attack_increment: 0.0,
            attack_remaining: 0,
            decay_coeff: 0.0,
            release_increment: 0.0,
            release_remaining: 0,
        };
        env.recalculate_decay_coeff();
        env
    }

    /// Open the gate: ramp from the current level to 1.0 over the attack
    /// time. Starting from the current level keeps retriggers click-free.
    pub fn gate_on(&mut self) {
        let samples = self.attack_samples();
        self.attack_increment = (1.0 - self.level) / samples as f32;
        self.attack_remaining = samples;
        self.stage = EnvelopeStage::Attack;
    }

    /// Close the gate: ramp from the current level to 0.0 over the release
    /// time. Does nothing if already idle or releasing.
    pub fn gate_off(&mut self) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }
        let samples = self.release_samples();
        self.release_increment = -self.level / samples as f32;
        self.release_remaining = samples;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level += self.attack_increment;
                self.attack_remaining -= 1;
                if self.attack_remaining == 0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                self.level += self.decay_coeff * (self.sustain_level - self.level);
                if fabsf(self.level - self.sustain_level) < 1e-4 {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            // Sustain holds whatever level decay settled at; moving the
            // sustain knob mid-hold only affects later notes.
            EnvelopeStage::Sustain => {}
            EnvelopeStage::Release => {
                self.level += self.release_increment;
                self.release_remaining -= 1;
                if self.release_remaining == 0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
        self.level
    }

    /// Current output level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// True while the envelope produces signal (any stage but idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// True while ramping down after `gate_off`.
    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    /// Cut to silence immediately, skipping the release ramp.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.attack_remaining = 0;
        self.release_remaining = 0;
    }

    /// Set attack time in seconds. Applies to the next `gate_on`.
    pub fn set_attack_sec(&mut self, sec: f32) {
        self.attack_sec = sec.max(0.0);
    }

    /// Attack time in seconds.
    pub fn attack_sec(&self) -> f32 {
        self.attack_sec
    }

    /// Set decay time in seconds. A decay already in flight bends to the
    /// new curve on the next sample.
    pub fn set_decay_sec(&mut self, sec: f32) {
        self.decay_sec = sec.max(0.0);
        self.recalculate_decay_coeff();
    }

    /// Decay time in seconds.
    pub fn decay_sec(&self) -> f32 {
        self.decay_sec
    }

    /// Set the sustain level, clamped to `[0.0, 1.0]`.
    pub fn set_sustain_level(&mut self, level: f32) {
        self.sustain_level = level.clamp(0.0, 1.0);
    }

    /// Sustain level.
    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    /// Set release time in seconds. Applies to the next `gate_off`; a
    /// release already in flight keeps its armed ramp.
    pub fn set_release_sec(&mut self, sec: f32) {
        self.release_sec = sec.max(0.0);
    }

    /// Release time in seconds.
    pub fn release_sec(&self) -> f32 {
        self.release_sec
    }

    /// Change the sample rate. Times in seconds are preserved; ramps in
    /// flight keep their remaining sample counts.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_decay_coeff();
    }

    /// Length of a full release ramp in samples at the current settings.
    /// The pool uses this to schedule slot disposal after `gate_off`.
    pub fn release_samples(&self) -> u32 {
        ((self.release_sec * self.sample_rate) as u32).max(1)
    }

    fn attack_samples(&self) -> u32 {
        ((self.attack_sec * self.sample_rate) as u32).max(1)
    }

    fn recalculate_decay_coeff(&mut self) {
        // tau = decay / 4: one full decay time is 4 tau, leaving the level
        // within e^-4 (under 2%) of sustain.
        let tau_samples = (self.decay_sec * 0.25 * self.sample_rate).max(1.0);
        self.decay_coeff = 1.0 - expf(-1.0 / tau_samples);
    }
}
