//! Control messages consumed by the render-side engine.
//!
//! The control context never touches voices directly: note events and
//! parameter edits cross over as [`Command`] values and are applied at the
//! start of the next render block, which makes block boundaries the only
//! points where engine state changes. Every payload is `Copy` so the
//! handoff never allocates.

use crate::config::{FilterKind, LayerConfig, Mode};
use crate::oscillator::Waveform;

/// One field of a layer profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerParam {
    /// Whether note-ons allocate a voice on this layer.
    Enabled(bool),
    /// Waveform shape.
    Waveform(Waveform),
    /// Pulse duty cycle.
    PulseWidth(f32),
    /// Detune in semitones.
    Semitone(i32),
    /// Detune in cents.
    Cent(i32),
    /// Detune in octaves.
    Octave(i32),
    /// Filter response kind.
    Filter(FilterKind),
    /// Filter cutoff in Hz.
    FilterCutoff(f32),
    /// Filter resonance Q.
    FilterResonance(f32),
    /// Envelope attack in seconds.
    Attack(f32),
    /// Envelope decay in seconds.
    Decay(f32),
    /// Envelope sustain level.
    Sustain(f32),
    /// Envelope release in seconds.
    Release(f32),
    /// Layer mix gain.
    MixLevel(f32),
}

impl LayerParam {
    /// Clamp and store this field into a layer profile. Both sides of the
    /// control/render split store through here, so read-back on the control
    /// side always matches what the engine is using.
    pub fn store(self, config: &mut LayerConfig) {
        match self {
            LayerParam::Enabled(on) => config.enabled = on,
            LayerParam::Waveform(waveform) => config.oscillator.waveform = waveform,
            LayerParam::PulseWidth(width) => config.set_pulse_width(width),
            LayerParam::Semitone(semitone) => config.set_semitone(semitone),
            LayerParam::Cent(cent) => config.set_cent(cent),
            LayerParam::Octave(octave) => config.set_octave(octave),
            LayerParam::Filter(kind) => config.filter.kind = kind,
            LayerParam::FilterCutoff(hz) => config.set_cutoff_hz(hz),
            LayerParam::FilterResonance(q) => config.set_resonance_q(q),
            LayerParam::Attack(sec) => config.set_attack_sec(sec),
            LayerParam::Decay(sec) => config.set_decay_sec(sec),
            LayerParam::Sustain(level) => config.set_sustain_level(level),
            LayerParam::Release(sec) => config.set_release_sec(sec),
            LayerParam::MixLevel(level) => config.set_mix_level(level),
        }
    }
}

/// A message from the control context to the render context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Start a note. Pitch is a MIDI note number, `0..=127`.
    NoteOn {
        /// MIDI note number.
        pitch: u8,
    },
    /// Release a note. Unknown or already-releasing pitches are absorbed.
    NoteOff {
        /// MIDI note number.
        pitch: u8,
    },
    /// Edit one field of one layer profile.
    SetLayer {
        /// Layer index, `0..MAX_LAYERS`; out-of-range indices are ignored.
        layer: usize,
        /// The field to store.
        param: LayerParam,
    },
    /// Switch between poly and mono allocation. Affects future note-ons only.
    SetMode(Mode),
    /// Set the master output gain, clamped to `[0.0, 1.0]`.
    SetMasterGain(f32),
    /// Set the gain budget shared by sounding voices, clamped to
    /// `[0.01, 1.0]`. Sounding voices rebalance immediately.
    SetGainBudget(f32),
}
