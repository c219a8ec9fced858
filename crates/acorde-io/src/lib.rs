//! Host integration layer for the acorde synthesizer.
//!
//! This crate connects the device-free [`acorde_synth`] engine to a real
//! machine:
//!
//! - **Engine shell**: [`Synth`] owns the cpal output stream plus the
//!   control side of the command and analysis channels
//! - **Device discovery**: [`list_output_devices`] for selector UIs
//! - **WAV export**: [`write_wav`] and [`read_wav`] for offline renders
//! - **Analysis tap**: [`AnalysisSnapshot`] — the bus waveform and its
//!   smoothed spectrum, captured after the master gain stage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acorde_io::{Synth, SynthConfig};
//!
//! let mut synth = Synth::new(SynthConfig::default());
//! synth.start()?;
//!
//! // Hold a C major chord for a second.
//! for pitch in [60, 64, 67] {
//!     synth.note_on(pitch);
//! }
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! for pitch in [60, 64, 67] {
//!     synth.note_off(pitch);
//! }
//!
//! synth.stop();
//! ```

mod analysis;
mod stream;
mod synth;
mod wav;

pub use analysis::{AnalysisSnapshot, SPECTRUM_BINS, WINDOW_LEN};
pub use stream::{AudioDevice, list_output_devices};
pub use synth::{EngineState, Synth, SynthConfig};
pub use wav::{WavSpec, read_wav, write_wav};

/// Error types for host integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for host integration.
pub type Result<T> = std::result::Result<T, Error>;
