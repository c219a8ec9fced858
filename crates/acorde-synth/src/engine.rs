//! Render-side engine core.
//!
//! [`EngineCore`] owns the layer profiles, the voice pool, and the master
//! gain, and runs entirely inside the render context. The host drains its
//! command queue through [`EngineCore::apply`] at the start of each block
//! and then calls [`EngineCore::render`]; nothing here allocates or blocks,
//! so the pair is safe to call from an audio callback.

use acorde_core::SmoothedParam;

use crate::command::{Command, LayerParam};
use crate::config::{DEFAULT_MASTER_GAIN, LayerConfig, MAX_LAYERS};
use crate::pool::{MAX_VOICES, VoicePool};
use crate::voice::SMOOTHING_MS;

/// The synthesizer engine: layer profiles, voice pool, and output gain.
///
/// # Example
///
/// ```
/// use acorde_synth::{Command, EngineCore};
///
/// let mut engine = EngineCore::new(48000.0);
/// engine.apply(Command::NoteOn { pitch: 60 });
///
/// let mut block = [0.0f32; 256];
/// engine.render(&mut block);
/// ```
#[derive(Debug)]
pub struct EngineCore {
    layers: [LayerConfig; MAX_LAYERS],
    pool: VoicePool<MAX_VOICES>,
    master_gain: SmoothedParam,
    /// Absolute frame position, advanced by each render call.
    frame: u64,
    sample_rate: f32,
}

impl EngineCore {
    /// Create an engine with the power-on layer bank and nothing sounding.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            layers: LayerConfig::default_bank(),
            pool: VoicePool::new(sample_rate),
            master_gain: SmoothedParam::with_config(DEFAULT_MASTER_GAIN, sample_rate, SMOOTHING_MS),
            frame: 0,
            sample_rate,
        }
    }

    /// Apply one control message. Called between blocks, so every change
    /// lands on a block boundary.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::NoteOn { pitch } => self.pool.note_on(pitch.min(127), &self.layers),
            Command::NoteOff { pitch } => self.pool.note_off(pitch.min(127), self.frame),
            Command::SetLayer { layer, param } => self.set_layer(layer, param),
            Command::SetMode(mode) => self.pool.set_mode(mode),
            Command::SetMasterGain(gain) => self.master_gain.set_target(gain.clamp(0.0, 1.0)),
            Command::SetGainBudget(budget) => self.pool.set_gain_budget(budget),
        }
    }

    /// Render one block of mono samples.
    ///
    /// Reclaims expired voice slots, accumulates every active voice into
    /// the buffer, and applies the master gain. A voice sample that is not
    /// finite is dropped from the mix, degrading that voice to silence
    /// instead of poisoning the whole block.
    pub fn render(&mut self, out: &mut [f32]) {
        self.pool.reclaim(self.frame);

        out.fill(0.0);
        for voice in self.pool.voices_mut() {
            if !voice.is_active() {
                continue;
            }
            for sample in out.iter_mut() {
                let s = voice.process();
                if s.is_finite() {
                    *sample += s;
                }
            }
        }

        for sample in out.iter_mut() {
            *sample *= self.master_gain.advance();
        }

        self.frame += out.len() as u64;
    }

    /// The voice pool, for state inspection.
    pub fn pool(&self) -> &VoicePool<MAX_VOICES> {
        &self.pool
    }

    /// A layer profile as the engine currently sees it.
    ///
    /// # Panics
    ///
    /// Panics if `index >= MAX_LAYERS`.
    pub fn layer(&self, index: usize) -> &LayerConfig {
        &self.layers[index]
    }

    /// Master gain target.
    pub fn master_gain(&self) -> f32 {
        self.master_gain.target()
    }

    /// Absolute frame position.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Store a profile edit and push it into voices already sounding on the
    /// layer. Enable toggles are allocation-time only, so they touch nothing
    /// here.
    fn set_layer(&mut self, layer: usize, param: LayerParam) {
        if layer >= MAX_LAYERS {
            return;
        }
        param.store(&mut self.layers[layer]);
        let config = self.layers[layer];

        for voice in self
            .pool
            .voices_mut()
            .iter_mut()
            .filter(|v| v.is_sounding() && v.layer() == layer)
        {
            match param {
                LayerParam::Enabled(_) => {}
                LayerParam::Waveform(_) => voice.set_waveform(config.oscillator.waveform),
                LayerParam::PulseWidth(_) => voice.set_pulse_width(config.oscillator.pulse_width),
                LayerParam::Semitone(_) | LayerParam::Cent(_) | LayerParam::Octave(_) => {
                    voice.retune(&config.oscillator);
                }
                LayerParam::Filter(_) | LayerParam::FilterCutoff(_) => {
                    voice.set_filter(config.filter.kind, config.filter.cutoff_hz);
                }
                LayerParam::FilterResonance(_) => {
                    voice.set_filter_resonance(config.filter.resonance_q);
                }
                LayerParam::Attack(_)
                | LayerParam::Decay(_)
                | LayerParam::Sustain(_)
                | LayerParam::Release(_) => voice.set_envelope(&config.envelope),
                LayerParam::MixLevel(_) => voice.set_mix_level(config.mix_level),
            }
        }
    }
}
