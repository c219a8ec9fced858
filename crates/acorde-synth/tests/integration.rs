//! Integration tests for the acorde synthesis engine.
//!
//! These drive [`EngineCore`] the way a host does: commands applied between
//! blocks, audio rendered block by block, and state inspected through the
//! pool. Timing assertions are written against block boundaries, since that
//! is the only granularity at which the engine changes state.

use acorde_synth::{
    Command, EngineCore, EnvelopeStage, LayerParam, Mode, Waveform, midi_to_freq,
};

const SR: f32 = 48000.0;
const BLOCK: usize = 256;

fn render_blocks(engine: &mut EngineCore, blocks: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(blocks * BLOCK);
    let mut block = [0.0f32; BLOCK];
    for _ in 0..blocks {
        engine.render(&mut block);
        out.extend_from_slice(&block);
    }
    out
}

fn rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Sum of peak-gain targets across voices with the gate still down.
fn sum_of_sounding_targets(engine: &EngineCore) -> f32 {
    engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding())
        .map(|v| v.peak_target())
        .sum()
}

/// Sum of current peak gains across voices with the gate still down.
fn sum_of_sounding_peaks(engine: &EngineCore) -> f32 {
    engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding())
        .map(|v| v.peak())
        .sum()
}

fn blocks_for(seconds: f32) -> usize {
    ((seconds * SR) as usize).div_ceil(BLOCK)
}

// ---------------------------------------------------------------------------
// 1. Single note lifecycle
// ---------------------------------------------------------------------------

#[test]
fn single_note_reaches_sustain_then_dies_on_schedule() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });

    // Default profile: 20 ms attack, 100 ms decay, 0.8 sustain. By 120 ms
    // the envelope should sit within 1% of sustain, with the full budget.
    render_blocks(&mut engine, blocks_for(0.125));
    let voice = engine
        .pool()
        .voices()
        .iter()
        .find(|v| v.is_sounding())
        .expect("note held");
    let heard = voice.envelope().level() * voice.peak();
    assert!(
        (heard - 0.8).abs() < 0.008,
        "expected within 1% of sustain after attack+decay, got {heard}"
    );

    // Hold to 0.5 s, then release.
    while engine.frame() < (0.5 * SR) as u64 {
        render_blocks(&mut engine, 1);
    }
    let off_frame = engine.frame();
    let tail = u64::from(
        engine
            .pool()
            .voices()
            .iter()
            .find(|v| v.is_active())
            .expect("voice held")
            .release_samples(),
    );
    engine.apply(Command::NoteOff { pitch: 60 });

    let mut block = [0.0f32; BLOCK];
    while engine.pool().active_count() > 0 {
        engine.render(&mut block);
        assert!(
            engine.frame() <= off_frame + tail + 2 * BLOCK as u64,
            "slot should be reclaimed within a block of the tail's end"
        );
    }
    assert!(engine.frame() >= off_frame + tail, "release tail cut short");
    assert_eq!(rms(&render_blocks(&mut engine, 4)), 0.0, "pool must go silent");
}

#[test]
fn releasing_note_fades_rather_than_cutting() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 69 });
    render_blocks(&mut engine, blocks_for(0.3));

    engine.apply(Command::NoteOff { pitch: 69 });
    let first = render_blocks(&mut engine, 2);
    assert!(
        rms(&first) > 0.01,
        "release must fade out, not cut to silence"
    );
}

// ---------------------------------------------------------------------------
// 2. Gain renormalization
// ---------------------------------------------------------------------------

#[test]
fn two_note_crossfade_never_exceeds_the_budget() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });
    render_blocks(&mut engine, blocks_for(0.25));
    assert!((sum_of_sounding_peaks(&engine) - 1.0).abs() < 1e-3);

    engine.apply(Command::NoteOn { pitch: 64 });

    // Both retargets land before any audio: the survivor aims at 0.5 and
    // the new voice ramps up from zero into the vacated space.
    let targets: Vec<f32> = engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding())
        .map(|v| v.peak_target())
        .collect();
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().all(|&t| (t - 0.5).abs() < 1e-6));

    // Through the crossfade the instantaneous sum stays pinned to the
    // budget: the down-ramp and the up-ramp cancel sample for sample.
    for _ in 0..8 {
        render_blocks(&mut engine, 1);
        let sum = sum_of_sounding_peaks(&engine);
        assert!(
            sum <= 1.0 + 1e-4,
            "sum of peaks {sum} exceeded the budget mid-crossfade"
        );
        assert!((sum - 1.0).abs() < 1e-3, "crossfade should conserve the budget");
    }
}

#[test]
fn note_off_hands_the_budget_back_to_survivors() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });
    engine.apply(Command::NoteOn { pitch: 64 });
    engine.apply(Command::NoteOn { pitch: 67 });
    render_blocks(&mut engine, blocks_for(0.25));

    engine.apply(Command::NoteOff { pitch: 64 });
    let survivors: Vec<f32> = engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding())
        .map(|v| v.peak_target())
        .collect();
    assert_eq!(survivors.len(), 2);
    assert!(survivors.iter().all(|&t| (t - 0.5).abs() < 1e-6));

    // The releasing voice fades from its old share; it is outside the
    // budget by design.
    let releasing = engine
        .pool()
        .voices()
        .iter()
        .find(|v| v.is_releasing())
        .expect("64 releasing");
    assert!((releasing.peak_target() - 1.0 / 3.0).abs() < 1e-6);
}

#[test]
fn chord_storm_keeps_target_sum_at_the_budget() {
    let mut engine = EngineCore::new(SR);
    let script: &[(bool, u8)] = &[
        (true, 60),
        (true, 64),
        (true, 67),
        (false, 64),
        (true, 71),
        (true, 72),
        (false, 60),
        (false, 67),
        (true, 48),
    ];

    for &(on, pitch) in script {
        if on {
            engine.apply(Command::NoteOn { pitch });
        } else {
            engine.apply(Command::NoteOff { pitch });
        }
        let sounding = engine.pool().sounding_count();
        if sounding > 0 {
            let sum = sum_of_sounding_targets(&engine);
            assert!(
                (sum - 1.0).abs() < 1e-4,
                "after event ({on}, {pitch}): target sum {sum} for {sounding} voices"
            );
        }
        render_blocks(&mut engine, 2);
    }
}

#[test]
fn gain_budget_command_rebalances_live_notes() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });
    engine.apply(Command::NoteOn { pitch: 64 });
    render_blocks(&mut engine, 4);

    engine.apply(Command::SetGainBudget(0.6));
    let targets: Vec<f32> = engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding())
        .map(|v| v.peak_target())
        .collect();
    assert!(targets.iter().all(|&t| (t - 0.3).abs() < 1e-6));
}

// ---------------------------------------------------------------------------
// 3. Retrigger and note-off semantics
// ---------------------------------------------------------------------------

#[test]
fn duplicate_note_on_restarts_without_a_dip() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });
    render_blocks(&mut engine, blocks_for(0.3));

    let voice_level = |engine: &EngineCore| {
        engine
            .pool()
            .voices()
            .iter()
            .find(|v| v.is_sounding())
            .map(|v| v.envelope().level())
            .expect("note held")
    };
    let held = voice_level(&engine);
    assert!((held - 0.8).abs() < 1e-3);

    engine.apply(Command::NoteOn { pitch: 60 });
    assert_eq!(engine.pool().sounding_count(), 1, "retrigger allocates nothing");

    // The envelope climbs from the held level back to the peak; at no block
    // boundary does it fall below where it was.
    let mut min_level = voice_level(&engine);
    for _ in 0..blocks_for(0.03) {
        render_blocks(&mut engine, 1);
        min_level = min_level.min(voice_level(&engine));
    }
    assert!(
        min_level >= held - 1e-3,
        "retrigger dipped to {min_level} from {held}"
    );
}

#[test]
fn retrigger_catches_a_release_in_flight() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });
    render_blocks(&mut engine, blocks_for(0.3));
    engine.apply(Command::NoteOff { pitch: 60 });
    render_blocks(&mut engine, 2);

    let fading = engine
        .pool()
        .voices()
        .iter()
        .find(|v| v.is_releasing())
        .expect("release in flight")
        .envelope()
        .level();
    assert!(fading > 0.0 && fading < 0.8);

    engine.apply(Command::NoteOn { pitch: 60 });
    assert_eq!(engine.pool().active_count(), 1, "the fading voice is reused");
    let voice = &engine.pool().voices()[0];
    assert!(voice.is_sounding());
    assert!(voice.envelope().level() >= fading - 1e-4);

    // The cancelled disposal must not reap the reborn voice.
    render_blocks(&mut engine, blocks_for(0.2));
    assert_eq!(engine.pool().active_count(), 1);
}

#[test]
fn duplicate_note_off_changes_nothing_audible() {
    let run = |extra_off: bool| -> Vec<f32> {
        let mut engine = EngineCore::new(SR);
        engine.apply(Command::NoteOn { pitch: 60 });
        engine.apply(Command::NoteOn { pitch: 67 });
        let mut out = render_blocks(&mut engine, 20);
        engine.apply(Command::NoteOff { pitch: 60 });
        if extra_off {
            engine.apply(Command::NoteOff { pitch: 60 });
        }
        out.extend(render_blocks(&mut engine, 10));
        if extra_off {
            engine.apply(Command::NoteOff { pitch: 60 });
        }
        out.extend(render_blocks(&mut engine, 30));
        out
    };

    let once = run(false);
    let twice = run(true);
    assert_eq!(once, twice, "duplicate note-off must be a no-op");
}

// ---------------------------------------------------------------------------
// 4. Mono legato
// ---------------------------------------------------------------------------

#[test]
fn mono_legato_glides_without_reopening_the_envelope() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::SetMode(Mode::Mono));
    engine.apply(Command::NoteOn { pitch: 60 });
    render_blocks(&mut engine, blocks_for(0.3));

    let stage_before = engine.pool().voices()[0].envelope().stage();
    assert_eq!(stage_before, EnvelopeStage::Sustain);

    engine.apply(Command::NoteOn { pitch: 72 });
    let voice = &engine.pool().voices()[0];
    assert_eq!(engine.pool().sounding_count(), 1);
    assert_eq!(voice.pitch(), 72);
    assert_eq!(voice.envelope().stage(), EnvelopeStage::Sustain);
    assert!((voice.frequency_target() - midi_to_freq(72)).abs() < 1e-2);

    // The glide is smoothed: no level dip, no new attack.
    render_blocks(&mut engine, 4);
    assert_eq!(
        engine.pool().voices()[0].envelope().level(),
        0.8,
        "legato must hold the sustain level"
    );
}

#[test]
fn mode_switch_leaves_current_notes_and_governs_the_next() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::NoteOn { pitch: 60 });
    engine.apply(Command::NoteOn { pitch: 64 });
    render_blocks(&mut engine, blocks_for(0.3));
    assert_eq!(engine.pool().sounding_count(), 2);

    engine.apply(Command::SetMode(Mode::Mono));
    assert_eq!(engine.pool().sounding_count(), 2, "switch kills nothing");

    // The next note-on glides both held voices instead of allocating.
    engine.apply(Command::NoteOn { pitch: 67 });
    assert_eq!(engine.pool().sounding_count(), 2);
    for voice in engine.pool().voices().iter().filter(|v| v.is_sounding()) {
        assert_eq!(voice.pitch(), 67);
        assert_ne!(voice.envelope().stage(), EnvelopeStage::Attack);
    }
}

// ---------------------------------------------------------------------------
// 5. Layers
// ---------------------------------------------------------------------------

#[test]
fn enabled_layers_stack_detuned_voices_on_one_note() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::SetLayer {
        layer: 1,
        param: LayerParam::Enabled(true),
    });
    engine.apply(Command::SetLayer {
        layer: 2,
        param: LayerParam::Enabled(true),
    });
    engine.apply(Command::NoteOn { pitch: 69 });

    let mut freqs: Vec<f32> = engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding())
        .map(|v| v.frequency_target())
        .collect();
    freqs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(freqs.len(), 3);
    assert!((freqs[0] - 220.0).abs() < 0.1, "octave-down layer");
    assert!((freqs[1] - 440.0).abs() < 0.1, "root layer");
    assert!((freqs[2] - 880.0).abs() < 0.1, "octave-up layer");

    for voice in engine.pool().voices().iter().filter(|v| v.is_sounding()) {
        assert!((voice.peak_target() - 1.0 / 3.0).abs() < 1e-6);
    }
}

#[test]
fn disabling_a_layer_only_affects_future_notes() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::SetLayer {
        layer: 1,
        param: LayerParam::Enabled(true),
    });
    engine.apply(Command::NoteOn { pitch: 60 });
    assert_eq!(engine.pool().sounding_count(), 2);

    engine.apply(Command::SetLayer {
        layer: 1,
        param: LayerParam::Enabled(false),
    });
    assert_eq!(engine.pool().sounding_count(), 2, "held voices survive");

    engine.apply(Command::NoteOn { pitch: 64 });
    let on_64 = engine
        .pool()
        .voices()
        .iter()
        .filter(|v| v.is_sounding() && v.pitch() == 64)
        .count();
    assert_eq!(on_64, 1, "new note only sounds the remaining layer");
}

#[test]
fn all_layers_disabled_makes_note_on_inert() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::SetLayer {
        layer: 0,
        param: LayerParam::Enabled(false),
    });
    engine.apply(Command::NoteOn { pitch: 60 });
    assert_eq!(engine.pool().active_count(), 0);
    let out = render_blocks(&mut engine, 4);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn live_profile_edits_reach_sounding_voices_smoothly() {
    let mut engine = EngineCore::new(SR);
    engine.apply(Command::SetLayer {
        layer: 0,
        param: LayerParam::Waveform(Waveform::Saw),
    });
    engine.apply(Command::NoteOn { pitch: 57 });
    render_blocks(&mut engine, blocks_for(0.25));

    let bright = rms(&render_blocks(&mut engine, 8));
    engine.apply(Command::SetLayer {
        layer: 0,
        param: LayerParam::Filter(acorde_synth::FilterKind::Lowpass),
    });
    engine.apply(Command::SetLayer {
        layer: 0,
        param: LayerParam::FilterCutoff(300.0),
    });
    // Past the cutoff smoothing ramp
    render_blocks(&mut engine, blocks_for(0.05));
    let dark = rms(&render_blocks(&mut engine, 8));
    assert!(
        dark < bright * 0.9,
        "closing the filter should darken the held saw: {dark} vs {bright}"
    );
}

// ---------------------------------------------------------------------------
// 6. Pool exhaustion
// ---------------------------------------------------------------------------

#[test]
fn a_storm_of_notes_never_exceeds_the_pool_or_the_budget() {
    let mut engine = EngineCore::new(SR);
    for pitch in 30..75 {
        engine.apply(Command::NoteOn { pitch });
        render_blocks(&mut engine, 1);
    }

    assert_eq!(engine.pool().active_count(), acorde_synth::MAX_VOICES);
    let sum = sum_of_sounding_targets(&engine);
    assert!(
        (sum - 1.0).abs() < 1e-3,
        "steals must keep the target sum at the budget, got {sum}"
    );

    // Output stays sane through heavy stealing.
    let out = render_blocks(&mut engine, 20);
    assert!(out.iter().all(|s| s.is_finite()));
    assert!(out.iter().all(|&s| s.abs() <= 1.0), "mix must stay inside full scale");
    assert!(rms(&out) > 0.001, "a full pool should be audible");
}
