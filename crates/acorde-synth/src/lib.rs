//! Acorde Synth - Layered polyphonic synthesis engine
//!
//! This crate implements the render-side half of the acorde synthesizer:
//! oscillators, envelopes, layered voices, note allocation, and the engine
//! core that a host drives from its audio callback. Everything here is
//! allocation-free after construction and runs without `std`.
//!
//! # Core Components
//!
//! ## Oscillator
//!
//! A phase-accumulator oscillator with naive geometric waveforms:
//!
//! - [`Oscillator`] - Audio-rate oscillator
//! - [`Waveform`] - Shape selection (Sine, Saw, Triangle, Square, Pulse)
//!
//! ```rust
//! use acorde_synth::{Oscillator, Waveform};
//!
//! let mut osc = Oscillator::new(48000.0);
//! osc.set_frequency(440.0);
//! osc.set_waveform(Waveform::Saw);
//!
//! let sample = osc.advance();
//! ```
//!
//! ## Envelope
//!
//! - [`AdsrEnvelope`] - Linear attack and release with exact durations,
//!   exponential decay
//! - [`EnvelopeStage`] - Stage tracking
//!
//! ```rust
//! use acorde_synth::AdsrEnvelope;
//!
//! let mut env = AdsrEnvelope::new(48000.0);
//! env.set_attack_sec(0.01);
//! env.set_sustain_level(0.7);
//!
//! env.gate_on();
//! let level = env.advance();
//! ```
//!
//! ## Layers and Voices
//!
//! A note fans out across up to [`MAX_LAYERS`] oscillator layers, each with
//! its own waveform, detune, filter, envelope, and mix level:
//!
//! - [`LayerConfig`] - One layer's full profile
//! - [`Voice`] - One pitch sounding through one layer profile
//! - [`VoicePool`] - Allocation, stealing, and gain renormalization
//!
//! ## Engine
//!
//! - [`EngineCore`] - Owns the profiles, the pool, and the master gain
//! - [`Command`] / [`LayerParam`] - Control messages applied at block
//!   boundaries
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! acorde-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example: Rendering a Chord
//!
//! ```rust
//! use acorde_synth::{Command, EngineCore, LayerParam, Waveform};
//!
//! let mut engine = EngineCore::new(48000.0);
//!
//! // Brighten layer 0 and open the filter
//! engine.apply(Command::SetLayer {
//!     layer: 0,
//!     param: LayerParam::Waveform(Waveform::Saw),
//! });
//! engine.apply(Command::SetLayer {
//!     layer: 0,
//!     param: LayerParam::FilterCutoff(4000.0),
//! });
//!
//! // Play a C major triad
//! engine.apply(Command::NoteOn { pitch: 60 });
//! engine.apply(Command::NoteOn { pitch: 64 });
//! engine.apply(Command::NoteOn { pitch: 67 });
//!
//! // Render in blocks
//! let mut block = [0.0f32; 256];
//! for _ in 0..16 {
//!     engine.render(&mut block);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod command;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod oscillator;
pub mod pool;
pub mod voice;

// Re-export main types at crate root
pub use command::{Command, LayerParam};
pub use config::{
    DEFAULT_GAIN_BUDGET, DEFAULT_MASTER_GAIN, EnvelopeConfig, FilterConfig, FilterKind,
    LayerConfig, MAX_LAYERS, Mode, OscillatorConfig,
};
pub use engine::EngineCore;
pub use envelope::{AdsrEnvelope, EnvelopeStage};
pub use oscillator::{Oscillator, Waveform};
pub use pool::{MAX_VOICES, VoicePool};
pub use voice::{Voice, detune_ratio, midi_to_freq};

// Re-export commonly used types from acorde-core
pub use acorde_core::{LinearSmoothedParam, SmoothedParam, StateVariableFilter, SvfOutputs};
