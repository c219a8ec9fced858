//! Criterion benchmarks for the acorde synthesis engine
//!
//! Run with: cargo bench -p acorde-synth

use acorde_synth::{
    AdsrEnvelope, Command, EngineCore, LayerConfig, LayerParam, Oscillator, Voice, Waveform,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ============================================================================
// Oscillator benchmarks
// ============================================================================

fn bench_oscillator_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Oscillator");

    let waveforms = [
        ("Sine", Waveform::Sine),
        ("Saw", Waveform::Saw),
        ("Triangle", Waveform::Triangle),
        ("Square", Waveform::Square),
        ("Pulse", Waveform::Pulse),
    ];

    for (name, waveform) in &waveforms {
        let mut osc = Oscillator::new(SAMPLE_RATE);
        osc.set_frequency(440.0);
        osc.set_waveform(*waveform);

        group.bench_function(*name, |b| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for _ in 0..256 {
                    sum += osc.advance();
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Envelope benchmarks
// ============================================================================

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");

    group.bench_function("sustain_hold", |b| {
        let mut env = AdsrEnvelope::new(SAMPLE_RATE);
        env.gate_on();
        for _ in 0..48000 {
            env.advance();
        }
        b.iter(|| {
            let mut sum = 0.0f32;
            for _ in 0..256 {
                sum += env.advance();
            }
            black_box(sum)
        })
    });

    group.bench_function("full_cycle", |b| {
        let mut env = AdsrEnvelope::new(SAMPLE_RATE);
        env.set_attack_sec(0.001);
        env.set_decay_sec(0.001);
        env.set_release_sec(0.001);
        b.iter(|| {
            env.gate_on();
            let mut sum = 0.0f32;
            for _ in 0..128 {
                sum += env.advance();
            }
            env.gate_off();
            for _ in 0..128 {
                sum += env.advance();
            }
            black_box(sum)
        })
    });

    group.finish();
}

// ============================================================================
// Voice benchmarks
// ============================================================================

fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("Voice");

    let mut config = LayerConfig::default();
    config.oscillator.waveform = Waveform::Saw;

    let mut voice = Voice::new(SAMPLE_RATE);
    voice.trigger(60, 0, &config, 1);
    voice.set_peak_target(1.0);

    group.bench_function("process_block", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for _ in 0..256 {
                sum += voice.process();
            }
            black_box(sum)
        })
    });

    group.finish();
}

// ============================================================================
// Engine benchmarks
// ============================================================================

fn bench_engine_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine");

    for &block_size in BLOCK_SIZES {
        let mut engine = EngineCore::new(SAMPLE_RATE);
        engine.apply(Command::SetLayer {
            layer: 1,
            param: LayerParam::Enabled(true),
        });
        engine.apply(Command::SetLayer {
            layer: 2,
            param: LayerParam::Enabled(true),
        });
        for pitch in [60, 64, 67, 71] {
            engine.apply(Command::NoteOn { pitch });
        }
        let mut out = vec![0.0f32; block_size];

        group.bench_with_input(
            BenchmarkId::new("chord_12_voices", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    engine.render(&mut out);
                    black_box(out[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_engine_note_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine");

    let mut engine = EngineCore::new(SAMPLE_RATE);
    let mut out = vec![0.0f32; 256];
    let mut pitch = 36u8;

    group.bench_function("note_churn", |b| {
        b.iter(|| {
            engine.apply(Command::NoteOn { pitch });
            engine.render(&mut out);
            engine.apply(Command::NoteOff { pitch });
            engine.render(&mut out);
            pitch = if pitch >= 84 { 36 } else { pitch + 1 };
            black_box(out[0])
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_oscillator_waveforms,
    bench_envelope,
    bench_voice,
    bench_engine_render,
    bench_engine_note_churn
);
criterion_main!(benches);
