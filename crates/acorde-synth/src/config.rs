//! Layer profiles and engine-wide configuration constants.
//!
//! A layer profile is a fixed record: every field is always present and
//! carries a concrete value, enabled or not, so profile edits are plain
//! field stores with no defaulting logic downstream. Setter methods clamp
//! out-of-range values to the nearest legal bound rather than rejecting
//! them.

use crate::oscillator::Waveform;

/// Number of oscillator layers a note fans out across.
pub const MAX_LAYERS: usize = 3;

/// Default master output gain.
pub const DEFAULT_MASTER_GAIN: f32 = 0.2;

/// Default gain budget shared by sounding voices.
pub const DEFAULT_GAIN_BUDGET: f32 = 1.0;

/// Filter response selectable per layer. `Off` parks the cutoff at the
/// sample rate so the lowpass output passes the signal through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// No filtering.
    #[default]
    Off,
    /// Lowpass response.
    Lowpass,
    /// Highpass response.
    Highpass,
    /// Bandpass response.
    Bandpass,
    /// Notch response.
    Notch,
}

/// Note allocation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every note-on allocates fresh voices.
    #[default]
    Poly,
    /// A note-on while notes are held glides the held voices to the new
    /// pitch without restarting their envelopes.
    Mono,
}

/// Oscillator section of a layer profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorConfig {
    /// Waveform shape.
    pub waveform: Waveform,
    /// Pulse duty cycle in `[0.01, 0.99]`; only [`Waveform::Pulse`] reads it.
    pub pulse_width: f32,
    /// Detune in semitones, `[-24, 24]`.
    pub semitone: i32,
    /// Detune in cents, `[-100, 100]`.
    pub cent: i32,
    /// Detune in octaves, `[-2, 2]`.
    pub octave: i32,
}

/// Filter section of a layer profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Filter response, or `Off` for a transparent pass.
    pub kind: FilterKind,
    /// Cutoff frequency in Hz, `[20, 20000]`.
    pub cutoff_hz: f32,
    /// Resonance Q, `[0.1, 20]`.
    pub resonance_q: f32,
}

/// Envelope section of a layer profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeConfig {
    /// Attack time in seconds, `[0.001, 10]`.
    pub attack_sec: f32,
    /// Decay time in seconds, `[0.001, 10]`.
    pub decay_sec: f32,
    /// Sustain level in `[0.0, 1.0]`.
    pub sustain_level: f32,
    /// Release time in seconds, `[0.001, 10]`.
    pub release_sec: f32,
}

/// Full profile for one oscillator layer.
///
/// `enabled` is consulted at allocation time only: disabling a layer stops
/// future notes from spawning a voice on it but leaves voices already
/// sounding on it alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerConfig {
    /// Whether note-ons allocate a voice on this layer.
    pub enabled: bool,
    /// Oscillator settings.
    pub oscillator: OscillatorConfig,
    /// Filter settings.
    pub filter: FilterConfig,
    /// Envelope settings.
    pub envelope: EnvelopeConfig,
    /// Pre-envelope gain for this layer's voices, `[0.0, 1.0]`.
    pub mix_level: f32,
}

impl Default for LayerConfig {
    /// The layer 0 power-on profile: an audible sine layer.
    fn default() -> Self {
        Self {
            enabled: true,
            oscillator: OscillatorConfig {
                waveform: Waveform::Sine,
                pulse_width: 0.5,
                semitone: 0,
                cent: 0,
                octave: 0,
            },
            filter: FilterConfig {
                kind: FilterKind::Off,
                cutoff_hz: 8000.0,
                resonance_q: 0.7,
            },
            envelope: EnvelopeConfig {
                attack_sec: 0.02,
                decay_sec: 0.1,
                sustain_level: 0.8,
                release_sec: 0.05,
            },
            mix_level: 0.7,
        }
    }
}

impl LayerConfig {
    /// The power-on bank: layer 0 enabled as a sine, layers 1 and 2 staged
    /// as disabled octave-up saw and octave-down square companions.
    pub fn default_bank() -> [LayerConfig; MAX_LAYERS] {
        let mut bank = [LayerConfig::default(); MAX_LAYERS];

        bank[1].enabled = false;
        bank[1].oscillator.waveform = Waveform::Saw;
        bank[1].oscillator.semitone = 12;
        bank[1].filter.resonance_q = 1.0;
        bank[1].mix_level = 0.5;

        bank[2].enabled = false;
        bank[2].oscillator.waveform = Waveform::Square;
        bank[2].oscillator.semitone = -12;
        bank[2].filter.resonance_q = 1.0;
        bank[2].mix_level = 0.5;

        bank
    }

    /// Set the pulse width, clamped to `[0.01, 0.99]`.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.oscillator.pulse_width = width.clamp(0.01, 0.99);
    }

    /// Set semitone detune, clamped to `[-24, 24]`.
    pub fn set_semitone(&mut self, semitone: i32) {
        self.oscillator.semitone = semitone.clamp(-24, 24);
    }

    /// Set cent detune, clamped to `[-100, 100]`.
    pub fn set_cent(&mut self, cent: i32) {
        self.oscillator.cent = cent.clamp(-100, 100);
    }

    /// Set octave detune, clamped to `[-2, 2]`.
    pub fn set_octave(&mut self, octave: i32) {
        self.oscillator.octave = octave.clamp(-2, 2);
    }

    /// Set filter cutoff in Hz, clamped to `[20, 20000]`.
    pub fn set_cutoff_hz(&mut self, hz: f32) {
        self.filter.cutoff_hz = hz.clamp(20.0, 20000.0);
    }

    /// Set filter resonance Q, clamped to `[0.1, 20]`.
    pub fn set_resonance_q(&mut self, q: f32) {
        self.filter.resonance_q = q.clamp(0.1, 20.0);
    }

    /// Set attack time in seconds, clamped to `[0.001, 10]`.
    pub fn set_attack_sec(&mut self, sec: f32) {
        self.envelope.attack_sec = sec.clamp(0.001, 10.0);
    }

    /// Set decay time in seconds, clamped to `[0.001, 10]`.
    pub fn set_decay_sec(&mut self, sec: f32) {
        self.envelope.decay_sec = sec.clamp(0.001, 10.0);
    }

    /// Set sustain level, clamped to `[0.0, 1.0]`.
    pub fn set_sustain_level(&mut self, level: f32) {
        self.envelope.sustain_level = level.clamp(0.0, 1.0);
    }

    /// Set release time in seconds, clamped to `[0.001, 10]`.
    pub fn set_release_sec(&mut self, sec: f32) {
        self.envelope.release_sec = sec.clamp(0.001, 10.0);
    }

    /// Set the layer mix level, clamped to `[0.0, 1.0]`.
    pub fn set_mix_level(&mut self, level: f32) {
        self.mix_level = level.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bank_matches_power_on_profile() {
        let bank = LayerConfig::default_bank();

        assert!(bank[0].enabled);
        assert_eq!(bank[0].oscillator.waveform, Waveform::Sine);
        assert_eq!(bank[0].filter.kind, FilterKind::Off);
        assert_eq!(bank[0].filter.cutoff_hz, 8000.0);
        assert_eq!(bank[0].mix_level, 0.7);

        assert!(!bank[1].enabled);
        assert_eq!(bank[1].oscillator.waveform, Waveform::Saw);
        assert_eq!(bank[1].oscillator.semitone, 12);
        assert_eq!(bank[1].filter.resonance_q, 1.0);

        assert!(!bank[2].enabled);
        assert_eq!(bank[2].oscillator.waveform, Waveform::Square);
        assert_eq!(bank[2].oscillator.semitone, -12);
        assert_eq!(bank[2].mix_level, 0.5);
    }

    #[test]
    fn setters_clamp_to_legal_bounds() {
        let mut layer = LayerConfig::default();

        layer.set_cutoff_hz(50_000.0);
        assert_eq!(layer.filter.cutoff_hz, 20_000.0);
        layer.set_cutoff_hz(1.0);
        assert_eq!(layer.filter.cutoff_hz, 20.0);

        layer.set_resonance_q(0.01);
        assert_eq!(layer.filter.resonance_q, 0.1);

        layer.set_pulse_width(1.5);
        assert_eq!(layer.oscillator.pulse_width, 0.99);

        layer.set_semitone(100);
        assert_eq!(layer.oscillator.semitone, 24);
        layer.set_octave(-9);
        assert_eq!(layer.oscillator.octave, -2);
        layer.set_cent(250);
        assert_eq!(layer.oscillator.cent, 100);

        layer.set_attack_sec(0.0);
        assert_eq!(layer.envelope.attack_sec, 0.001);
        layer.set_release_sec(60.0);
        assert_eq!(layer.envelope.release_sec, 10.0);
        layer.set_sustain_level(-0.5);
        assert_eq!(layer.envelope.sustain_level, 0.0);

        layer.set_mix_level(2.0);
        assert_eq!(layer.mix_level, 1.0);
    }

    #[test]
    fn in_range_values_round_trip_unchanged() {
        let mut layer = LayerConfig::default();
        layer.set_cutoff_hz(1234.5);
        assert_eq!(layer.filter.cutoff_hz, 1234.5);
        layer.set_semitone(-7);
        assert_eq!(layer.oscillator.semitone, -7);
        layer.set_sustain_level(0.33);
        assert_eq!(layer.envelope.sustain_level, 0.33);
    }
}
