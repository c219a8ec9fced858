//! Live note playback command.

use super::common::{CliWaveform, parse_notes};
use acorde_io::{Synth, SynthConfig, WINDOW_LEN};
use acorde_synth::{FilterKind, Mode, midi_to_freq};
use clap::Args;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Args)]
pub struct PlayArgs {
    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long, default_value = "60,64,67")]
    notes: String,

    /// Hold duration in seconds; 0 holds until Ctrl+C
    #[arg(long, default_value = "0.0")]
    duration: f32,

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

    /// Output device (index, exact name, or partial name)
    #[arg(long)]
    device: Option<String>,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Buffer size in frames
    #[arg(long, default_value = "256")]
    buffer_size: u32,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let midi_notes = parse_notes(&args.notes)?;

    let mut synth = Synth::new(SynthConfig {
        sample_rate: args.sample_rate,
        buffer_size: args.buffer_size,
        output_device: args.device,
    });

    synth.set_waveform(0, args.waveform.into());
    if args.mono {
        synth.set_mode(Mode::Mono);
    }
    if let Some(cutoff) = args.cutoff {
        synth.set_filter_kind(0, FilterKind::Lowpass);
        synth.set_filter_cutoff(0, cutoff);
    }
    if let Some(attack) = args.attack {
        synth.set_attack(0, attack);
    }
    if let Some(release) = args.release {
        synth.set_release(0, release);
    }
    if let Some(gain) = args.gain {
        synth.set_master_gain(gain);
    }

    let freqs: Vec<f32> = midi_notes.iter().map(|&n| midi_to_freq(n)).collect();
    println!("Playing {} note(s)", midi_notes.len());
    println!("  Notes: {:?}", midi_notes);
    println!(
        "  Frequencies: {:?}",
        freqs
            .iter()
            .map(|f| format!("{:.1} Hz", f))
            .collect::<Vec<_>>()
    );
    println!("  Sample rate: {} Hz", args.sample_rate);
    println!("  Buffer size: {} samples", args.buffer_size);

    synth.start()?;

    for &note in &midi_notes {
        synth.note_on(note);
    }

    if args.duration > 0.0 {
        println!(
            "\nHolding for {:.2}s... Press Ctrl+C to stop early.\n",
            args.duration
        );
    } else {
        println!("\nHolding... Press Ctrl+C to stop.\n");
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    let mut last_peak = Instant::now();
    while running.load(Ordering::SeqCst) {
        if args.duration > 0.0 && started.elapsed().as_secs_f32() >= args.duration {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));

        if last_peak.elapsed() >= Duration::from_millis(500) {
            let snapshot = synth.analysis_snapshot();
            if let Some((bin, db)) = snapshot
                .spectrum_db
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
            {
                let peak_hz = bin as f32 * args.sample_rate as f32 / WINDOW_LEN as f32;
                tracing::debug!(peak_hz, peak_db = db, "spectrum peak");
            }
            last_peak = Instant::now();
        }
    }

    for &note in &midi_notes {
        synth.note_off(note);
    }

    // Let release tails ring out before the stream is torn down.
    let tail = synth.layer(0).envelope.release_sec.min(2.0) + 0.05;
    std::thread::sleep(Duration::from_secs_f32(tail));
    synth.stop();

    println!("Done!");
    Ok(())
}
