//! Offline note rendering command.

use super::common::{CliWaveform, parse_notes};
use acorde_io::{WavSpec, write_wav};
use acorde_synth::{Command, EngineCore, FilterKind, LayerParam, Mode, midi_to_freq};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long, default_value = "60,64,67")]
    notes: String,

    /// Total duration in seconds
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Gate time in seconds; notes release here and ring out to the end
    #[arg(long, default_value = "1.5")]
    gate: f32,

    /// Waveform for layer 0
    #[arg(long, value_enum, default_value = "sine")]
    waveform: CliWaveform,

    /// Mono legato allocation instead of poly
    #[arg(long)]
    mono: bool,

    /// Lowpass filter cutoff in Hz (enables the filter)
    #[arg(long)]
    cutoff: Option<f32>,

    /// Amplitude envelope attack in seconds
    #[arg(long)]
    attack: Option<f32>,

    /// Amplitude envelope release in seconds
    #[arg(long)]
    release: Option<f32>,

    /// Master output gain (0-1)
    #[arg(long)]
    gain: Option<f32>,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let midi_notes = parse_notes(&args.notes)?;
    if args.duration <= 0.0 {
        anyhow::bail!("Duration must be positive");
    }

    println!("Rendering chord...");
    println!("  Notes: {:?}", midi_notes);
    let freqs: Vec<f32> = midi_notes.iter().map(|&n| midi_to_freq(n)).collect();
    println!(
        "  Frequencies: {:?}",
        freqs
            .iter()
            .map(|f| format!("{:.1} Hz", f))
            .collect::<Vec<_>>()
    );
    let gate = args.gate.clamp(0.0, args.duration);
    println!("  Duration: {:.2}s, gate: {:.2}s", args.duration, gate);

    let mut engine = EngineCore::new(args.sample_rate as f32);
    engine.apply(Command::SetLayer {
        layer: 0,
        param: LayerParam::Waveform(args.waveform.into()),
    });
    if args.mono {
        engine.apply(Command::SetMode(Mode::Mono));
    }
    if let Some(cutoff) = args.cutoff {
        engine.apply(Command::SetLayer {
            layer: 0,
            param: LayerParam::Filter(FilterKind::Lowpass),
        });
        engine.apply(Command::SetLayer {
            layer: 0,
            param: LayerParam::FilterCutoff(cutoff),
        });
    }
    if let Some(attack) = args.attack {
        engine.apply(Command::SetLayer {
            layer: 0,
            param: LayerParam::Attack(attack),
        });
    }
    if let Some(release) = args.release {
        engine.apply(Command::SetLayer {
            layer: 0,
            param: LayerParam::Release(release),
        });
    }
    if let Some(gain) = args.gain {
        engine.apply(Command::SetMasterGain(gain));
    }

    for &note in &midi_notes {
        engine.apply(Command::NoteOn { pitch: note });
    }

    let num_samples = (args.duration * args.sample_rate as f32) as usize;
    let gate_off_sample = (gate * args.sample_rate as f32) as usize;

    let pb = ProgressBar::new(num_samples as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut samples = vec![0.0_f32; num_samples];
    let mut notes_released = false;
    let block = 256;
    let mut rendered = 0;

    while rendered < num_samples {
        if !notes_released && rendered >= gate_off_sample {
            for &note in &midi_notes {
                engine.apply(Command::NoteOff { pitch: note });
            }
            notes_released = true;
        }

        // Stop the block at the gate boundary so the release lands exactly.
        let mut end = (rendered + block).min(num_samples);
        if !notes_released {
            end = end.min(gate_off_sample);
        }

        engine.render(&mut samples[rendered..end]);
        rendered = end;
        pb.set_position(rendered as u64);
    }

    pb.finish_with_message("done");

    let spec = WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
    };

    write_wav(&args.output, &samples, spec)?;
    println!("Wrote {} samples to {}", samples.len(), args.output.display());

    Ok(())
}
