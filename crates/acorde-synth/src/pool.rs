//! Voice pool: note allocation, stealing, and gain renormalization.
//!
//! The pool owns a fixed array of voice slots and a parallel disposal table
//! of absolute frame deadlines. There is no separate held-note map: a pitch
//! is sounding exactly when some voice is sounding it, so membership is
//! derived by scanning the slots and can never drift out of sync with them.
//!
//! Sounding voices share a gain budget. Every note event retargets the
//! survivors to `budget / n` before the event's own voices are touched, so
//! all crossfades start on the same sample and the sum of peak gains never
//! ramps above the budget.

use crate::config::{DEFAULT_GAIN_BUDGET, LayerConfig, MAX_LAYERS, Mode};
use crate::voice::Voice;

/// Total voice slots in the engine pool.
pub const MAX_VOICES: usize = 32;

/// Fixed-size pool of voice slots.
#[derive(Debug)]
pub struct VoicePool<const N: usize> {
    voices: [Voice; N],
    /// Absolute frame at which each slot's release tail is over and the
    /// slot may be reclaimed. Checked at block start, so disposal lands at
    /// block granularity.
    free_at: [Option<u64>; N],
    age_counter: u64,
    mode: Mode,
    gain_budget: f32,
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of `N` inactive voices.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            free_at: [None; N],
            age_counter: 0,
            mode: Mode::default(),
            gain_budget: DEFAULT_GAIN_BUDGET,
        }
    }

    /// Start a note: one voice per enabled layer.
    ///
    /// In mono mode with other notes held, the held voices glide to the new
    /// pitch instead. A note already sounding retriggers its voices in
    /// place. Otherwise voices are allocated, preferring a releasing voice
    /// for the same key, then a free slot, then stealing the oldest
    /// releasing voice, then the oldest outright.
    pub fn note_on(&mut self, pitch: u8, layers: &[LayerConfig; MAX_LAYERS]) {
        if self.mode == Mode::Mono
            && self
                .voices
                .iter()
                .any(|v| v.is_sounding() && v.pitch() != pitch)
        {
            for voice in self.voices.iter_mut().filter(|v| v.is_sounding()) {
                let config = &layers[voice.layer()];
                voice.glide_to(pitch, config);
            }
            return;
        }

        // Same pitch already held: reopen its envelopes from their current
        // levels. The voice count is unchanged, so shares stay as they are.
        let mut retriggered = false;
        for slot in 0..N {
            if self.voices[slot].is_sounding() && self.voices[slot].pitch() == pitch {
                self.age_counter += 1;
                let layer = self.voices[slot].layer();
                self.voices[slot].rearm(&layers[layer], self.age_counter);
                retriggered = true;
            }
        }
        if retriggered {
            return;
        }

        // Pick a slot per enabled layer, never picking the same slot twice
        // within one event.
        let mut picks = [(0usize, 0usize); MAX_LAYERS];
        let mut pick_count = 0;
        let mut claimed = [false; N];
        for (layer, config) in layers.iter().enumerate() {
            if !config.enabled {
                continue;
            }
            let slot = self.allocate(pitch, layer, &claimed);
            claimed[slot] = true;
            picks[pick_count] = (slot, layer);
            pick_count += 1;
        }
        if pick_count == 0 {
            return;
        }

        // Survivors rebalance to the post-event share first; the new voices
        // then ramp up into the space being vacated.
        let surviving = self
            .voices
            .iter()
            .enumerate()
            .filter(|&(i, v)| v.is_sounding() && !claimed[i])
            .count();
        let share = self.gain_budget / (surviving + pick_count) as f32;
        for (slot, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_sounding() && !claimed[slot] {
                voice.set_peak_target(share);
            }
        }

        for &(slot, layer) in &picks[..pick_count] {
            self.free_at[slot] = None;
            self.age_counter += 1;
            let voice = &mut self.voices[slot];
            if voice.is_releasing() && voice.pitch() == pitch && voice.layer() == layer {
                // Release caught in flight: cancel the teardown and reopen
                // from the current level.
                voice.rearm(&layers[layer], self.age_counter);
            } else {
                voice.trigger(pitch, layer, &layers[layer], self.age_counter);
            }
            voice.set_peak_target(share);
        }
    }

    /// Release a note: every voice sounding the pitch starts its release
    /// tail and is scheduled for disposal once the tail has elapsed.
    /// Unknown or already-releasing pitches are absorbed, so duplicate
    /// note-offs are harmless.
    pub fn note_off(&mut self, pitch: u8, now: u64) {
        let mut leaving = [false; N];
        let mut any = false;
        for (slot, voice) in self.voices.iter().enumerate() {
            if voice.is_sounding() && voice.pitch() == pitch {
                leaving[slot] = true;
                any = true;
            }
        }
        if !any {
            return;
        }

        // Survivors take over the budget on the same sample the releases
        // begin.
        let remaining = self
            .voices
            .iter()
            .enumerate()
            .filter(|&(i, v)| v.is_sounding() && !leaving[i])
            .count();
        if remaining > 0 {
            let share = self.gain_budget / remaining as f32;
            for (slot, voice) in self.voices.iter_mut().enumerate() {
                if voice.is_sounding() && !leaving[slot] {
                    voice.set_peak_target(share);
                }
            }
        }

        for (slot, voice) in self.voices.iter_mut().enumerate() {
            if leaving[slot] {
                voice.release();
                self.free_at[slot] = Some(now + u64::from(voice.release_samples()));
            }
        }
    }

    /// Reclaim slots whose release tails have fully elapsed. Called once
    /// per render block, before rendering.
    pub fn reclaim(&mut self, now: u64) {
        for (slot, entry) in self.free_at.iter_mut().enumerate() {
            if let Some(at) = *entry {
                if now >= at {
                    self.voices[slot].kill();
                    *entry = None;
                }
            }
        }
    }

    /// Cut every voice to silence and clear the disposal table.
    pub fn all_off(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
        self.free_at = [None; N];
    }

    /// Switch allocation mode. Voices already sounding are unaffected; the
    /// new mode governs the next note-on.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Current allocation mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Set the gain budget, clamped to `[0.01, 1.0]`, and rebalance the
    /// voices currently sounding.
    pub fn set_gain_budget(&mut self, budget: f32) {
        self.gain_budget = budget.clamp(0.01, 1.0);
        let sounding = self.sounding_count();
        if sounding > 0 {
            let share = self.gain_budget / sounding as f32;
            for voice in self.voices.iter_mut().filter(|v| v.is_sounding()) {
                voice.set_peak_target(share);
            }
        }
    }

    /// Current gain budget.
    pub fn gain_budget(&self) -> f32 {
        self.gain_budget
    }

    /// All voice slots.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// All voice slots, mutable. The engine pushes live profile edits
    /// through here.
    pub fn voices_mut(&mut self) -> &mut [Voice; N] {
        &mut self.voices
    }

    /// Number of voices with the gate still down.
    pub fn sounding_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_sounding()).count()
    }

    /// Number of occupied slots, release tails included.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    fn allocate(&self, pitch: u8, layer: usize, claimed: &[bool; N]) -> usize {
        // A releasing voice for the same key: catch it
        if let Some(slot) = self
            .voices
            .iter()
            .enumerate()
            .find(|&(i, v)| {
                !claimed[i] && v.is_releasing() && v.pitch() == pitch && v.layer() == layer
            })
            .map(|(i, _)| i)
        {
            return slot;
        }

        // A free slot
        if let Some(slot) = (0..N).find(|&i| !claimed[i] && !self.voices[i].is_active()) {
            return slot;
        }

        // Steal the oldest releasing voice; it was on its way out anyway
        if let Some(slot) = self
            .voices
            .iter()
            .enumerate()
            .filter(|&(i, v)| !claimed[i] && v.is_releasing())
            .min_by_key(|&(_, v)| v.age())
            .map(|(i, _)| i)
        {
            return slot;
        }

        // Steal the oldest voice outright
        self.voices
            .iter()
            .enumerate()
            .filter(|&(i, _)| !claimed[i])
            .min_by_key(|&(_, v)| v.age())
            .map_or(0, |(i, _)| i)
    }
}
