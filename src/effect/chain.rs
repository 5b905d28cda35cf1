use std::sync::{atomic::Ordering, Arc};

use crate::{
    dsp::lfo::{LfoPhase, LfoWaveform},
    effect::{Effect, EffectApplication, EffectHandle, EffectShared},
    error::{Result, ScopeError},
    shape::Point,
};

/*
Effect Chain
============

The chain is the authoritative, ordered list of effects. Voices never run
the chain's effects directly; each voice builds its own `VoiceEffects`
from it and runs those.

Ordering
--------

Effects run in ascending precedence. Only enabled effects take part:

    inserted:   rotate(5)  scale(1)  delay(3)
    applied:    scale(1) → delay(3) → rotate(5)

Precedences are unique within a chain; `add` and `set_precedence` refuse a
clash. Should two ever compare equal, insertion order decides.

Sharing vs Owning
-----------------

                     chain effect          voice A clone       voice B clone
    parameters       ───────────── shared handles ─────────────────────
    enabled flag     ───────────── shared ─────────────────────────────
    precedence       ───────────── shared ─────────────────────────────
    DSP state        prototype             own buffers          own buffers
    LFO phases       -                     own phases           own phases

One automation write is heard by every voice on its next block. Delay lines
and smoothers are never shared, so one voice cannot smear into another.

Snapshots
---------

`refresh` runs once at the top of each block. It reads every shared atomic
(enabled, precedence, values, LFO settings) into the clone's own storage and
recomputes the order. Per sample only the LFOs move. Nothing here allocates
after construction: the order is rebuilt with an in-place insertion sort.
*/

/// Authoritative list of effects.
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Effect>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Add an effect. Fails if its id or precedence is already taken.
    pub fn add(&mut self, effect: Effect) -> Result<EffectHandle> {
        if self.effects.iter().any(|e| e.id() == effect.id()) {
            return Err(ScopeError::DuplicateEffect(effect.id().to_string()));
        }
        self.check_precedence(effect.id(), effect.precedence())?;

        let handle = effect.handle();
        self.effects.push(effect);
        Ok(handle)
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, effect: Effect) -> Result<Self> {
        self.add(effect)?;
        Ok(self)
    }

    pub fn remove(&mut self, id: &str) -> Option<Effect> {
        let index = self.effects.iter().position(|e| e.id() == id)?;
        Some(self.effects.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<EffectHandle> {
        self.effects
            .iter()
            .find(|e| e.id() == id)
            .map(Effect::handle)
    }

    /// Move an effect to a new precedence, refusing clashes.
    pub fn set_precedence(&self, id: &str, precedence: i32) -> Result<()> {
        let effect = self
            .effects
            .iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| ScopeError::UnknownEffect(id.to_string()))?;
        self.check_precedence(id, precedence)?;
        effect
            .shared()
            .precedence
            .store(precedence, Ordering::Relaxed);
        Ok(())
    }

    fn check_precedence(&self, id: &str, precedence: i32) -> Result<()> {
        match self
            .effects
            .iter()
            .find(|e| e.id() != id && e.precedence() == precedence)
        {
            Some(existing) => Err(ScopeError::DuplicatePrecedence {
                id: id.to_string(),
                existing: existing.id().to_string(),
                precedence,
            }),
            None => Ok(()),
        }
    }

    /// Enabled effects in the order they are applied.
    pub fn effective_order(&self) -> Vec<EffectHandle> {
        let mut order: Vec<usize> = Vec::with_capacity(self.effects.len());
        let precedences: Vec<i32> = self.effects.iter().map(Effect::precedence).collect();
        let enabled: Vec<bool> = self
            .effects
            .iter()
            .map(|e| e.shared().enabled.load(Ordering::Relaxed))
            .collect();
        stable_order(&precedences, &enabled, &mut order);
        order.into_iter().map(|i| self.effects[i].handle()).collect()
    }

    /// Every effect in insertion order, enabled or not.
    pub fn handles(&self) -> Vec<EffectHandle> {
        self.effects.iter().map(Effect::handle).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub(crate) fn effects(&self) -> &[Effect] {
        &self.effects
    }
}

/// Indices of enabled entries sorted by ascending precedence, ties kept in
/// index order. Reuses `order`'s storage; insertion sort, no allocation once
/// `order` has capacity for every entry.
fn stable_order(precedences: &[i32], enabled: &[bool], order: &mut Vec<usize>) {
    order.clear();
    for (index, &on) in enabled.iter().enumerate() {
        if !on {
            continue;
        }
        let precedence = precedences[index];
        let mut slot = order.len();
        while slot > 0 && precedences[order[slot - 1]] > precedence {
            slot -= 1;
        }
        order.insert(slot, index);
    }
}

/// Per-voice copy of one effect.
struct EffectSlot {
    shared: Arc<EffectShared>,
    application: Box<dyn EffectApplication>,
    was_enabled: bool,
    params: Vec<ParamSlot>,
    values: Vec<f32>, // effective values for the current sample
}

/// Per-voice view of one parameter: last snapshot plus this voice's LFO.
struct ParamSlot {
    value: f32,
    min: f32,
    max: f32,
    lfo: LfoWaveform,
    lfo_rate: f32,
    phase: LfoPhase,
}

/// A voice's private clone of an [`EffectChain`].
pub struct VoiceEffects {
    slots: Vec<EffectSlot>,
    precedences: Vec<i32>,
    enabled: Vec<bool>,
    order: Vec<usize>,
}

impl VoiceEffects {
    /// Fresh per-voice instances of every effect in `chain`.
    ///
    /// Parameters, enabled flags and precedences are shared with the chain;
    /// DSP state is new.
    pub fn clone_from(chain: &EffectChain) -> Self {
        let slots: Vec<EffectSlot> = chain
            .effects()
            .iter()
            .map(|effect| {
                let shared = effect.shared().clone();
                let params = shared
                    .parameters
                    .iter()
                    .map(|p| {
                        let snapshot = p.snapshot();
                        ParamSlot {
                            value: snapshot.value,
                            min: snapshot.min,
                            max: snapshot.max,
                            lfo: snapshot.lfo,
                            lfo_rate: snapshot.lfo_rate,
                            phase: LfoPhase::new(),
                        }
                    })
                    .collect::<Vec<_>>();
                let values = params.iter().map(|p| p.value).collect();

                EffectSlot {
                    was_enabled: shared.enabled.load(Ordering::Relaxed),
                    application: effect.fresh_application(),
                    shared,
                    params,
                    values,
                }
            })
            .collect();

        let count = slots.len();
        let mut voice = Self {
            slots,
            precedences: vec![0; count],
            enabled: vec![false; count],
            order: Vec::with_capacity(count),
        };
        voice.refresh();
        voice
    }

    /// No effects at all; every point passes through.
    pub fn empty() -> Self {
        Self {
            slots: Vec::new(),
            precedences: Vec::new(),
            enabled: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Read the shared state once for the coming block.
    pub fn refresh(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let enabled = slot.shared.enabled.load(Ordering::Relaxed);
            if enabled && !slot.was_enabled && slot.application.reset_on_enable() {
                slot.application.reset();
            }
            slot.was_enabled = enabled;

            self.enabled[i] = enabled;
            self.precedences[i] = slot.shared.precedence.load(Ordering::Relaxed);

            for (param, handle) in slot.params.iter_mut().zip(&slot.shared.parameters) {
                let snapshot = handle.snapshot();
                param.value = snapshot.value;
                param.lfo = snapshot.lfo;
                param.lfo_rate = snapshot.lfo_rate;
            }
        }

        stable_order(&self.precedences, &self.enabled, &mut self.order);
    }

    /// Run `point` through every enabled effect in precedence order.
    ///
    /// LFO phases advance every sample, including those of disabled effects.
    #[inline]
    pub fn process(&mut self, index: usize, point: Point, sample_rate: f32, frequency: f32) -> Point {
        for slot in &mut self.slots {
            for (value, param) in slot.values.iter_mut().zip(slot.params.iter_mut()) {
                *value = if param.lfo.is_static() {
                    param.value
                } else {
                    let unipolar = param.lfo.evaluate(param.phase.phase());
                    param.phase.advance(param.lfo_rate, sample_rate);
                    param.min + unipolar * (param.max - param.min)
                };
            }
        }

        let mut point = point;
        for &i in &self.order {
            let slot = &mut self.slots[i];
            let output = slot
                .application
                .apply(index, point, &slot.values, sample_rate, frequency);
            point = output.finite_or(point);
        }
        point
    }

    /// Clear all DSP state and LFO phases, as at the start of a note.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.application.reset();
            for param in &mut slot.params {
                param.phase.reset();
            }
        }
    }

    /// Ids of the effects that will run, in order, as of the last refresh.
    pub fn active_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(|&i| self.slots[i].shared.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectParameter;

    /// Appends its tag to the x coordinate: x' = x * 10 + tag.
    struct Tag(f32);

    impl EffectApplication for Tag {
        fn apply(&mut self, _: usize, input: Point, _: &[f32], _: f32, _: f32) -> Point {
            Point::new(input.x * 10.0 + self.0, input.y)
        }

        fn fresh(&self) -> Box<dyn EffectApplication> {
            Box::new(Tag(self.0))
        }
    }

    /// Running sum of inputs; resets on enable.
    struct Accumulate {
        sum: f32,
    }

    impl EffectApplication for Accumulate {
        fn apply(&mut self, _: usize, input: Point, values: &[f32], _: f32, _: f32) -> Point {
            self.sum += input.x * values[0];
            Point::new(self.sum, input.y)
        }

        fn fresh(&self) -> Box<dyn EffectApplication> {
            Box::new(Accumulate { sum: 0.0 })
        }

        fn reset(&mut self) {
            self.sum = 0.0;
        }
    }

    struct Explode;

    impl EffectApplication for Explode {
        fn apply(&mut self, _: usize, _: Point, _: &[f32], _: f32, _: f32) -> Point {
            Point::new(f32::NAN, f32::INFINITY)
        }

        fn fresh(&self) -> Box<dyn EffectApplication> {
            Box::new(Explode)
        }
    }

    fn tag(id: &str, precedence: i32, value: f32) -> Effect {
        Effect::new(id, Vec::new(), Tag(value)).with_precedence(precedence)
    }

    #[test]
    fn applies_in_precedence_order_regardless_of_insertion() {
        let chain = EffectChain::new()
            .with(tag("five", 5, 5.0))
            .unwrap()
            .with(tag("one", 1, 1.0))
            .unwrap()
            .with(tag("three", 3, 3.0))
            .unwrap();

        let order: Vec<i32> = chain.effective_order().iter().map(|h| h.precedence()).collect();
        assert_eq!(order, vec![1, 3, 5]);

        let mut voice = VoiceEffects::clone_from(&chain);
        let out = voice.process(0, Point::ORIGIN, 48_000.0, 440.0);
        // ((0 * 10 + 1) * 10 + 3) * 10 + 5
        assert_eq!(out.x, 135.0);
        assert_eq!(voice.active_ids().collect::<Vec<_>>(), vec!["one", "three", "five"]);
    }

    #[test]
    fn duplicate_precedence_and_id_are_rejected() {
        let mut chain = EffectChain::new();
        chain.add(tag("a", 1, 1.0)).unwrap();

        let err = chain.add(tag("b", 1, 2.0)).unwrap_err();
        assert!(matches!(err, ScopeError::DuplicatePrecedence { precedence: 1, .. }));

        let err = chain.add(tag("a", 2, 2.0)).unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateEffect(_)));

        chain.add(tag("b", 2, 2.0)).unwrap();
        assert!(chain.set_precedence("b", 1).is_err());
        assert!(chain.set_precedence("missing", 9).is_err());
        chain.set_precedence("b", 0).unwrap();
        let ids: Vec<String> = chain
            .effective_order()
            .iter()
            .map(|h| h.id().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn disabled_effect_is_skipped_and_keeps_state() {
        let gain = EffectParameter::new("gain", "Gain", 1.0, 0.0, 2.0).unwrap();
        let mut chain = EffectChain::new();
        let handle = chain
            .add(Effect::new("acc", vec![gain], Accumulate { sum: 0.0 }))
            .unwrap();

        let mut voice = VoiceEffects::clone_from(&chain);
        let input = Point::new(1.0, 0.0);
        voice.process(0, input, 48_000.0, 440.0);
        voice.process(1, input, 48_000.0, 440.0);

        handle.set_enabled(false);
        voice.refresh();
        assert_eq!(voice.process(2, input, 48_000.0, 440.0), input);

        handle.set_enabled(true);
        voice.refresh();
        // Resumes from the running sum of 2
        assert_eq!(voice.process(3, input, 48_000.0, 440.0).x, 3.0);
    }

    #[test]
    fn clones_share_parameters_but_not_state() {
        let gain = EffectParameter::new("gain", "Gain", 1.0, 0.0, 2.0).unwrap();
        let mut chain = EffectChain::new();
        chain
            .add(Effect::new("acc", vec![gain.clone()], Accumulate { sum: 0.0 }))
            .unwrap();

        let mut a = VoiceEffects::clone_from(&chain);
        let mut b = VoiceEffects::clone_from(&chain);
        let input = Point::new(1.0, 0.0);

        a.process(0, input, 48_000.0, 440.0);
        a.process(1, input, 48_000.0, 440.0);
        // b's sum starts at zero: a's state is not shared
        assert_eq!(b.process(0, input, 48_000.0, 440.0).x, 1.0);

        // One automation write reaches both after their next refresh
        gain.set_value(2.0);
        a.refresh();
        b.refresh();
        assert_eq!(a.process(2, input, 48_000.0, 440.0).x, 4.0);
        assert_eq!(b.process(1, input, 48_000.0, 440.0).x, 3.0);
    }

    #[test]
    fn lfo_overrides_parameter_value() {
        let gain = EffectParameter::new("gain", "Gain", 1.0, 0.0, 2.0)
            .unwrap()
            .with_lfo(LfoWaveform::Sawtooth, 1000.0);
        let mut chain = EffectChain::new();
        chain
            .add(Effect::new("acc", vec![gain], Accumulate { sum: 0.0 }))
            .unwrap();

        let mut voice = VoiceEffects::clone_from(&chain);
        let input = Point::new(1.0, 0.0);
        // Sawtooth at 1 kHz on a 4 kHz clock: phases 0, 0.25, 0.5, 0.75
        // → gains 0.0, 0.5, 1.0, 1.5
        let mut last = 0.0;
        for i in 0..4 {
            last = voice.process(i, input, 4_000.0, 440.0).x;
        }
        assert!((last - 3.0).abs() < 1e-5, "sum was {}", last);
    }

    #[test]
    fn lfo_keeps_running_while_effect_is_disabled() {
        let gain = EffectParameter::new("gain", "Gain", 1.0, 0.0, 2.0)
            .unwrap()
            .with_lfo(LfoWaveform::Sawtooth, 1000.0);
        let mut chain = EffectChain::new();
        let handle = chain
            .add(Effect::new("acc", vec![gain], Accumulate { sum: 0.0 }))
            .unwrap();

        let mut voice = VoiceEffects::clone_from(&chain);
        let input = Point::new(1.0, 0.0);
        // Phase 0 → gain 0
        assert_eq!(voice.process(0, input, 4_000.0, 440.0).x, 0.0);

        handle.set_enabled(false);
        voice.refresh();
        assert_eq!(voice.process(1, input, 4_000.0, 440.0), input);

        handle.set_enabled(true);
        voice.refresh();
        // The skipped sample still moved the phase on to 0.5 → gain 1.0
        let out = voice.process(2, input, 4_000.0, 440.0);
        assert!((out.x - 1.0).abs() < 1e-5, "sum was {}", out.x);
    }

    #[test]
    fn non_finite_output_is_contained() {
        let mut chain = EffectChain::new();
        chain.add(Effect::new("boom", Vec::new(), Explode).with_precedence(0)).unwrap();
        chain.add(tag("after", 1, 1.0)).unwrap();

        let mut voice = VoiceEffects::clone_from(&chain);
        let out = voice.process(0, Point::new(0.5, 0.5), 48_000.0, 440.0);
        assert!(out.is_finite());
        assert_eq!(out.x, 6.0);
    }

    #[test]
    fn stable_order_keeps_insertion_order_on_ties() {
        let mut order = Vec::with_capacity(4);
        stable_order(&[2, 1, 2, 1], &[true, true, true, true], &mut order);
        assert_eq!(order, vec![1, 3, 0, 2]);

        stable_order(&[2, 1, 2, 1], &[true, false, true, true], &mut order);
        assert_eq!(order, vec![3, 0, 2]);
    }
}
