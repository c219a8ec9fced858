//! A single voice: one pitch sounding through one layer profile.
//!
//! The per-sample chain is oscillator, then state variable filter, then the
//! layer mix gain, then envelope times peak gain. Continuous parameters ride
//! smoothing ramps so live profile edits and gain redistribution reach the
//! chain without clicks; the peak gain uses a linear ramp with an exact end
//! time so budget crossfades complete together.

use acorde_core::{LinearSmoothedParam, SmoothedParam, StateVariableFilter};
use libm::powf;

use crate::config::{EnvelopeConfig, FilterKind, LayerConfig, OscillatorConfig};
use crate::envelope::AdsrEnvelope;
use crate::oscillator::{Oscillator, Waveform};

/// Ramp window for live parameter changes and gain crossfades, in ms.
pub(crate) const SMOOTHING_MS: f32 = 20.0;

/// Convert a MIDI note number to a frequency in Hz (A4 = 69 = 440 Hz).
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * powf(2.0, (f32::from(note) - 69.0) / 12.0)
}

/// Frequency ratio for a detune of the given semitones, cents, and octaves.
pub fn detune_ratio(semitone: i32, cent: i32, octave: i32) -> f32 {
    let cents = (semitone + octave * 12) * 100 + cent;
    powf(2.0, cents as f32 / 1200.0)
}

/// One mono signal chain bound to a `(pitch, layer)` pair while it sounds.
///
/// A voice stays active through its release tail; the pool reclaims the
/// slot once the tail has elapsed.
#[derive(Debug, Clone)]
pub struct Voice {
    oscillator: Oscillator,
    filter: StateVariableFilter,
    filter_kind: FilterKind,
    envelope: AdsrEnvelope,
    /// Oscillator frequency in Hz; legato glides retarget this.
    frequency: SmoothedParam,
    pulse_width: SmoothedParam,
    cutoff: SmoothedParam,
    resonance: SmoothedParam,
    /// Pre-envelope layer mix gain.
    mix: SmoothedParam,
    /// This voice's share of the pool's gain budget.
    peak: LinearSmoothedParam,
    pitch: u8,
    layer: usize,
    /// Allocation order stamp; lower means older, stolen first.
    age: u64,
    active: bool,
    sample_rate: f32,
}

impl Voice {
    /// Create an inactive voice.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(sample_rate),
            filter: StateVariableFilter::new(sample_rate),
            filter_kind: FilterKind::Off,
            envelope: AdsrEnvelope::new(sample_rate),
            frequency: SmoothedParam::with_config(440.0, sample_rate, SMOOTHING_MS),
            pulse_width: SmoothedParam::with_config(0.5, sample_rate, SMOOTHING_MS),
            cutoff: SmoothedParam::with_config(sample_rate, sample_rate, SMOOTHING_MS),
            resonance: SmoothedParam::with_config(0.707, sample_rate, SMOOTHING_MS),
            mix: SmoothedParam::with_config(0.7, sample_rate, SMOOTHING_MS),
            peak: LinearSmoothedParam::with_config(0.0, sample_rate, SMOOTHING_MS),
            pitch: 0,
            layer: 0,
            age: 0,
            active: false,
            sample_rate,
        }
    }

    /// Start this slot sounding `pitch` through `config`.
    ///
    /// Profile values land immediately rather than smoothed. A slot whose
    /// envelope is idle gets clean oscillator phase and filter memory and a
    /// peak ramp starting from zero; a stolen slot keeps both, so the new
    /// note rides the waveform the voice was already producing.
    pub fn trigger(&mut self, pitch: u8, layer: usize, config: &LayerConfig, age: u64) {
        self.pitch = pitch;
        self.layer = layer;
        self.age = age;

        let osc = &config.oscillator;
        self.oscillator.set_waveform(osc.waveform);
        self.frequency
            .set_immediate(midi_to_freq(pitch) * detune_ratio(osc.semitone, osc.cent, osc.octave));
        self.pulse_width.set_immediate(osc.pulse_width);

        self.filter_kind = config.filter.kind;
        self.cutoff
            .set_immediate(self.effective_cutoff(config.filter.kind, config.filter.cutoff_hz));
        self.resonance.set_immediate(config.filter.resonance_q);
        self.mix.set_immediate(config.mix_level);
        self.apply_envelope_config(&config.envelope);

        if !self.envelope.is_active() {
            self.oscillator.reset();
            self.filter.reset();
            self.peak.set_immediate(0.0);
        }
        self.active = true;
        self.envelope.gate_on();
    }

    /// Restart this voice in place: same pitch and layer, envelope re-opened
    /// from its current level, profile values re-applied as smoothed targets.
    /// Used for duplicate note-ons and for catching a release in flight.
    pub fn rearm(&mut self, config: &LayerConfig, age: u64) {
        self.age = age;

        let osc = &config.oscillator;
        self.oscillator.set_waveform(osc.waveform);
        self.pulse_width.set_target(osc.pulse_width);
        self.retune(osc);

        self.filter_kind = config.filter.kind;
        self.cutoff
            .set_target(self.effective_cutoff(config.filter.kind, config.filter.cutoff_hz));
        self.resonance.set_target(config.filter.resonance_q);
        self.mix.set_target(config.mix_level);
        self.apply_envelope_config(&config.envelope);

        self.active = true;
        self.envelope.gate_on();
    }

    /// Glide to a new pitch without touching the envelope. The frequency
    /// target moves; everything else keeps sounding as it was.
    pub fn glide_to(&mut self, pitch: u8, config: &LayerConfig) {
        self.pitch = pitch;
        self.retune(&config.oscillator);
    }

    /// Recompute the frequency target from the voice's pitch and the given
    /// detune settings.
    pub fn retune(&mut self, osc: &OscillatorConfig) {
        self.frequency
            .set_target(midi_to_freq(self.pitch) * detune_ratio(osc.semitone, osc.cent, osc.octave));
    }

    /// Begin the release tail.
    pub fn release(&mut self) {
        self.envelope.gate_off();
    }

    /// Free the slot immediately, without a release tail.
    pub fn kill(&mut self) {
        self.active = false;
        self.envelope.reset();
    }

    /// Render one sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        self.oscillator.set_frequency(self.frequency.advance());
        self.oscillator.set_pulse_width(self.pulse_width.advance());
        let raw = self.oscillator.advance();

        self.filter.set_cutoff(self.cutoff.advance());
        self.filter.set_resonance(self.resonance.advance());
        let outputs = self.filter.process(raw);
        let shaped = match self.filter_kind {
            FilterKind::Off | FilterKind::Lowpass => outputs.lowpass,
            FilterKind::Highpass => outputs.highpass,
            FilterKind::Bandpass => outputs.bandpass,
            FilterKind::Notch => outputs.notch,
        };

        shaped * self.mix.advance() * self.envelope.advance() * self.peak.advance()
    }

    // Live profile edits, pushed in by the engine while the voice sounds.

    /// Switch the waveform shape.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.oscillator.set_waveform(waveform);
    }

    /// Retarget the pulse width.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width.set_target(width);
    }

    /// Switch the filter kind and retarget the cutoff. `Off` parks the
    /// cutoff at the sample rate, which the filter clamps to just under
    /// Nyquist, leaving the lowpass output near-transparent.
    pub fn set_filter(&mut self, kind: FilterKind, cutoff_hz: f32) {
        self.filter_kind = kind;
        self.cutoff.set_target(self.effective_cutoff(kind, cutoff_hz));
    }

    /// Retarget the filter resonance.
    pub fn set_filter_resonance(&mut self, q: f32) {
        self.resonance.set_target(q);
    }

    /// Retarget the layer mix gain.
    pub fn set_mix_level(&mut self, level: f32) {
        self.mix.set_target(level);
    }

    /// Apply new envelope settings. Ramps already armed keep their counts;
    /// the new times govern later gate changes.
    pub fn set_envelope(&mut self, config: &EnvelopeConfig) {
        self.apply_envelope_config(config);
    }

    /// Retarget this voice's share of the gain budget. The ramp runs from
    /// the current value and completes in the fixed crossfade window.
    pub fn set_peak_target(&mut self, peak: f32) {
        self.peak.set_target(peak);
    }

    /// Current peak gain.
    pub fn peak(&self) -> f32 {
        self.peak.get()
    }

    /// Peak gain target.
    pub fn peak_target(&self) -> f32 {
        self.peak.target()
    }

    /// MIDI pitch this voice is sounding.
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    /// Layer index this voice sounds through.
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Allocation order stamp.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// True while the slot is occupied, release tail included.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while the gate is down: attacking, decaying, or sustaining.
    pub fn is_sounding(&self) -> bool {
        self.active && self.envelope.is_active() && !self.envelope.is_releasing()
    }

    /// True while ramping down after a note-off.
    pub fn is_releasing(&self) -> bool {
        self.active && self.envelope.is_releasing()
    }

    /// The envelope, for state inspection.
    pub fn envelope(&self) -> &AdsrEnvelope {
        &self.envelope
    }

    /// Length of this voice's release tail in samples.
    pub fn release_samples(&self) -> u32 {
        self.envelope.release_samples()
    }

    /// Active waveform shape.
    pub fn waveform(&self) -> Waveform {
        self.oscillator.waveform()
    }

    /// Current frequency target in Hz.
    pub fn frequency_target(&self) -> f32 {
        self.frequency.target()
    }

    /// Change the sample rate, preserving musical settings.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.oscillator.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.envelope.set_sample_rate(sample_rate);
        self.frequency.set_sample_rate(sample_rate);
        self.pulse_width.set_sample_rate(sample_rate);
        self.cutoff.set_sample_rate(sample_rate);
        self.resonance.set_sample_rate(sample_rate);
        self.mix.set_sample_rate(sample_rate);
        self.peak.set_sample_rate(sample_rate);
    }

    fn apply_envelope_config(&mut self, config: &EnvelopeConfig) {
        self.envelope.set_attack_sec(config.attack_sec);
        self.envelope.set_decay_sec(config.decay_sec);
        self.envelope.set_sustain_level(config.sustain_level);
        self.envelope.set_release_sec(config.release_sec);
    }

    fn effective_cutoff(&self, kind: FilterKind, cutoff_hz: f32) -> f32 {
        if kind == FilterKind::Off {
            self.sample_rate
        } else {
            cutoff_hz
        }
    }
}
