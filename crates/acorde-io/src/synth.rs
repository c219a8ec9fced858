//! The control-context engine shell.
//!
//! [`Synth`] owns the output stream and the control ends of two channels:
//! an unbounded command channel into the render context and a bounded
//! frame channel back out of it. The cpal callback owns the engine core
//! exclusively. At each callback it drains pending commands, renders the
//! mono bus in engine-sized blocks, taps the bus for analysis, and fans
//! the result out to the device's channels. Nothing on that path
//! allocates, blocks, or logs.

use crate::analysis::{AnalysisFrame, AnalysisSnapshot, FRAME_QUEUE, FrameTap, SpectrumAnalyzer};
use crate::stream;
use crate::{Error, Result};
use acorde_synth::{
    Command, DEFAULT_GAIN_BUDGET, DEFAULT_MASTER_GAIN, EngineCore, FilterKind, LayerConfig,
    LayerParam, MAX_LAYERS, Mode, Waveform,
};
use cpal::Stream;
use crossbeam_channel::{Receiver, Sender};

/// Configuration for a [`Synth`].
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Sample rate in Hz the engine renders at.
    pub sample_rate: u32,
    /// Frames per engine block; also the requested stream buffer size.
    pub buffer_size: u32,
    /// Output device selector: an index into the device listing, an exact
    /// name, or a case-insensitive fragment. `None` uses the system default.
    pub output_device: Option<String>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            output_device: None,
        }
    }
}

/// Lifecycle of the audio engine behind a [`Synth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No stream has been opened yet.
    Uninitialized,
    /// The stream is live and rendering.
    Ready,
    /// The stream was torn down; a later `start` opens a fresh one.
    Stopped,
    /// Stream setup failed. The failure is terminal for this instance.
    Failed,
}

/// The live connection to a render context.
///
/// Dropping this drops the stream, and with it the engine core the
/// callback owns: every voice and pending disposal dies here.
struct RenderLink {
    commands: Sender<Command>,
    frames: Receiver<AnalysisFrame>,
    _stream: Stream,
}

/// Control-context handle to the synthesizer.
///
/// All mutation funnels through `&mut self` and a single command channel,
/// so the control side needs no further synchronization. Parameter setters
/// clamp and store their value locally before forwarding it, which makes
/// [`Synth::layer`] read back exactly what the engine is using.
///
/// ```rust,ignore
/// use acorde_io::{Synth, SynthConfig};
/// use acorde_synth::Waveform;
///
/// let mut synth = Synth::new(SynthConfig::default());
/// synth.set_waveform(0, Waveform::Saw);
/// synth.note_on(60); // lazily opens the stream
/// ```
pub struct Synth {
    config: SynthConfig,
    layers: [LayerConfig; MAX_LAYERS],
    mode: Mode,
    master_gain: f32,
    gain_budget: f32,
    analyzer: SpectrumAnalyzer,
    link: Option<RenderLink>,
    state: EngineState,
    failure: Option<String>,
}

impl Synth {
    /// Create a synthesizer shell. No device work happens here; the stream
    /// opens on the first [`start`](Synth::start) or
    /// [`note_on`](Synth::note_on).
    pub fn new(config: SynthConfig) -> Self {
        Self {
            config,
            layers: LayerConfig::default_bank(),
            mode: Mode::default(),
            master_gain: DEFAULT_MASTER_GAIN,
            gain_budget: DEFAULT_GAIN_BUDGET,
            analyzer: SpectrumAnalyzer::new(),
            link: None,
            state: EngineState::Uninitialized,
            failure: None,
        }
    }

    /// Current engine lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The configuration this shell was built with.
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Open the output stream and start rendering. Idempotent while the
    /// stream is live.
    ///
    /// A fresh engine core is built from the stored control-side settings,
    /// so a `start` after [`stop`](Synth::stop) comes up with the same
    /// profiles but no sounding voices.
    ///
    /// # Errors
    ///
    /// Returns an error if no device matches the selector or the stream
    /// cannot be built. Failure is terminal: the state moves to
    /// [`EngineState::Failed`] and later calls return the recorded error
    /// without touching the device again.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            EngineState::Ready => return Ok(()),
            EngineState::Failed => {
                return Err(Error::Stream(
                    self.failure
                        .clone()
                        .unwrap_or_else(|| "engine previously failed".into()),
                ));
            }
            EngineState::Uninitialized | EngineState::Stopped => {}
        }

        match self.open_stream() {
            Ok(link) => {
                self.link = Some(link);
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "engine start failed");
                self.failure = Some(err.to_string());
                self.state = EngineState::Failed;
                Err(err)
            }
        }
    }

    /// Tear down the stream. Idempotent.
    ///
    /// The render engine lives inside the stream callback, so dropping the
    /// stream clears every voice and pending disposal with it.
    pub fn stop(&mut self) {
        if self.state != EngineState::Ready {
            return;
        }
        self.link = None;
        self.state = EngineState::Stopped;
        tracing::info!("engine stopped");
    }

    /// Start a note. Opens the stream first if it is not running; if that
    /// fails the call is a no-op (the failure is recorded by `start`).
    pub fn note_on(&mut self, pitch: u8) {
        if self.state != EngineState::Ready && self.start().is_err() {
            return;
        }
        self.send(Command::NoteOn { pitch });
    }

    /// Release a note. Unknown or already-released pitches are absorbed.
    pub fn note_off(&mut self, pitch: u8) {
        self.send(Command::NoteOff { pitch });
    }

    /// Switch between poly and mono allocation for future note-ons.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.send(Command::SetMode(mode));
    }

    /// Current allocation mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Set the master output gain, clamped to `[0.0, 1.0]`.
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
        self.send(Command::SetMasterGain(self.master_gain));
    }

    /// Current master output gain.
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Set the gain budget shared by sounding voices, clamped to
    /// `[0.01, 1.0]`.
    pub fn set_gain_budget(&mut self, budget: f32) {
        self.gain_budget = budget.clamp(0.01, 1.0);
        self.send(Command::SetGainBudget(self.gain_budget));
    }

    /// Current gain budget.
    pub fn gain_budget(&self) -> f32 {
        self.gain_budget
    }

    /// Read back a layer profile exactly as the engine uses it.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is not below [`MAX_LAYERS`].
    pub fn layer(&self, layer: usize) -> &LayerConfig {
        &self.layers[layer]
    }

    /// Enable or disable a layer for future note-ons.
    pub fn set_layer_enabled(&mut self, layer: usize, enabled: bool) {
        self.set_layer_param(layer, LayerParam::Enabled(enabled));
    }

    /// Set a layer's waveform shape.
    pub fn set_waveform(&mut self, layer: usize, waveform: Waveform) {
        self.set_layer_param(layer, LayerParam::Waveform(waveform));
    }

    /// Set a layer's pulse duty cycle, clamped to `[0.01, 0.99]`.
    pub fn set_pulse_width(&mut self, layer: usize, width: f32) {
        self.set_layer_param(layer, LayerParam::PulseWidth(width));
    }

    /// Set a layer's detune in semitones, clamped to `[-24, 24]`.
    pub fn set_semitone(&mut self, layer: usize, semitone: i32) {
        self.set_layer_param(layer, LayerParam::Semitone(semitone));
    }

    /// Set a layer's detune in cents, clamped to `[-100, 100]`.
    pub fn set_cent(&mut self, layer: usize, cent: i32) {
        self.set_layer_param(layer, LayerParam::Cent(cent));
    }

    /// Set a layer's detune in octaves, clamped to `[-2, 2]`.
    pub fn set_octave(&mut self, layer: usize, octave: i32) {
        self.set_layer_param(layer, LayerParam::Octave(octave));
    }

    /// Set a layer's filter response kind.
    pub fn set_filter_kind(&mut self, layer: usize, kind: FilterKind) {
        self.set_layer_param(layer, LayerParam::Filter(kind));
    }

    /// Set a layer's filter cutoff in Hz, clamped to `[20, 20000]`.
    pub fn set_filter_cutoff(&mut self, layer: usize, hz: f32) {
        self.set_layer_param(layer, LayerParam::FilterCutoff(hz));
    }

    /// Set a layer's filter resonance Q, clamped to `[0.1, 20]`.
    pub fn set_filter_resonance(&mut self, layer: usize, q: f32) {
        self.set_layer_param(layer, LayerParam::FilterResonance(q));
    }

    /// Set a layer's envelope attack in seconds, clamped to `[0.001, 10]`.
    pub fn set_attack(&mut self, layer: usize, sec: f32) {
        self.set_layer_param(layer, LayerParam::Attack(sec));
    }

    /// Set a layer's envelope decay in seconds, clamped to `[0.001, 10]`.
    pub fn set_decay(&mut self, layer: usize, sec: f32) {
        self.set_layer_param(layer, LayerParam::Decay(sec));
    }

    /// Set a layer's sustain level, clamped to `[0.0, 1.0]`.
    pub fn set_sustain(&mut self, layer: usize, level: f32) {
        self.set_layer_param(layer, LayerParam::Sustain(level));
    }

    /// Set a layer's envelope release in seconds, clamped to `[0.001, 10]`.
    pub fn set_release(&mut self, layer: usize, sec: f32) {
        self.set_layer_param(layer, LayerParam::Release(sec));
    }

    /// Set a layer's mix gain, clamped to `[0.0, 1.0]`.
    pub fn set_mix_level(&mut self, layer: usize, level: f32) {
        self.set_layer_param(layer, LayerParam::MixLevel(level));
    }

    /// Drain pending analysis frames and snapshot the bus.
    ///
    /// Read-only with respect to synthesis: the spectrum and waveform
    /// describe what already left through the master stage. With no stream
    /// running the snapshot decays toward the -100 dB floor.
    pub fn analysis_snapshot(&mut self) -> AnalysisSnapshot {
        if let Some(link) = &self.link {
            while let Ok(frame) = link.frames.try_recv() {
                self.analyzer.push(&frame);
            }
        }
        self.analyzer.snapshot()
    }

    /// Clamp and store one layer field, then forward it to the engine.
    /// Out-of-range layer indices are ignored, mirroring the engine.
    fn set_layer_param(&mut self, layer: usize, param: LayerParam) {
        if layer >= MAX_LAYERS {
            return;
        }
        param.store(&mut self.layers[layer]);
        self.send(Command::SetLayer { layer, param });
    }

    /// Forward a command to the render context, if one is running.
    fn send(&self, command: Command) {
        if let Some(link) = &self.link {
            let _ = link.commands.send(command);
        }
    }

    /// Resolve the device, build an engine from the stored settings, and
    /// wire it into a live output stream.
    fn open_stream(&self) -> Result<RenderLink> {
        let device = stream::resolve_output(self.config.output_device.as_deref())?;
        let name = stream::device_name(&device).unwrap_or_else(|_| "unknown".into());
        let channels = stream::output_channels(&device);
        tracing::info!(device = %name, channels, "output device selected");

        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_QUEUE);

        let mut engine = self.build_engine();
        let mut tap = FrameTap::new();
        let fan_out = channels as usize;
        let block = self.config.buffer_size.max(1) as usize;
        let mut bus = vec![0.0_f32; block];

        let stream = stream::spawn_output(
            &device,
            self.config.sample_rate,
            self.config.buffer_size,
            channels,
            move |data: &mut [f32]| {
                while let Ok(command) = command_rx.try_recv() {
                    engine.apply(command);
                }

                for chunk in data.chunks_mut(block * fan_out) {
                    let frames = chunk.len() / fan_out;
                    let bus = &mut bus[..frames];
                    engine.render(bus);
                    tap.push_block(bus, &frame_tx);

                    for (frame, &sample) in chunk.chunks_mut(fan_out).zip(bus.iter()) {
                        frame.fill(sample);
                    }
                }
            },
        )?;

        Ok(RenderLink {
            commands: command_tx,
            frames: frame_rx,
            _stream: stream,
        })
    }

    /// A fresh engine core carrying the stored control-side settings.
    fn build_engine(&self) -> EngineCore {
        let mut engine = EngineCore::new(self.config.sample_rate as f32);
        engine.apply(Command::SetMode(self.mode));
        engine.apply(Command::SetMasterGain(self.master_gain));
        engine.apply(Command::SetGainBudget(self.gain_budget));
        for (layer, config) in self.layers.iter().enumerate() {
            for param in layer_params(config) {
                engine.apply(Command::SetLayer { layer, param });
            }
        }
        engine
    }
}

/// Every field of a layer profile, as the params that would store it.
fn layer_params(config: &LayerConfig) -> [LayerParam; 14] {
    [
        LayerParam::Enabled(config.enabled),
        LayerParam::Waveform(config.oscillator.waveform),
        LayerParam::PulseWidth(config.oscillator.pulse_width),
        LayerParam::Semitone(config.oscillator.semitone),
        LayerParam::Cent(config.oscillator.cent),
        LayerParam::Octave(config.oscillator.octave),
        LayerParam::Filter(config.filter.kind),
        LayerParam::FilterCutoff(config.filter.cutoff_hz),
        LayerParam::FilterResonance(config.filter.resonance_q),
        LayerParam::Attack(config.envelope.attack_sec),
        LayerParam::Decay(config.envelope.decay_sec),
        LayerParam::Sustain(config.envelope.sustain_level),
        LayerParam::Release(config.envelope.release_sec),
        LayerParam::MixLevel(config.mix_level),
    ]
}
