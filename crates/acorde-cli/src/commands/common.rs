//! Shared CLI helpers used across multiple commands.

use acorde_synth::Waveform;
use clap::ValueEnum;

/// Waveform types for CLI
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliWaveform {
    #[default]
    Sine,
    Saw,
    Triangle,
    Square,
    Pulse,
}

impl From<CliWaveform> for Waveform {
    fn from(w: CliWaveform) -> Self {
        match w {
            CliWaveform::Sine => Waveform::Sine,
            CliWaveform::Saw => Waveform::Saw,
            CliWaveform::Triangle => Waveform::Triangle,
            CliWaveform::Square => Waveform::Square,
            CliWaveform::Pulse => Waveform::Pulse,
        }
    }
}

/// Parse a comma-separated MIDI note list like "60,64,67".
pub fn parse_notes(notes: &str) -> anyhow::Result<Vec<u8>> {
    let midi_notes: Vec<u8> = notes
        .split(',')
        .filter_map(|s| s.trim().parse::<u8>().ok())
        .collect();

    if midi_notes.is_empty() {
        anyhow::bail!("No valid MIDI notes provided. Use format: --notes \"60,64,67\"");
    }

    Ok(midi_notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_lists_with_whitespace() {
        let notes = parse_notes("60, 64 ,67").unwrap();
        assert_eq!(notes, vec![60, 64, 67]);
    }

    #[test]
    fn skips_invalid_entries() {
        let notes = parse_notes("60,abc,300,72").unwrap();
        assert_eq!(notes, vec![60, 72]);
    }

    #[test]
    fn rejects_empty_lists() {
        assert!(parse_notes("").is_err());
        assert!(parse_notes("abc,def").is_err());
    }
}
