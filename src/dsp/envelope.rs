/*
DAHDSR Envelope Implementation
==============================

Every voice is gated by a six-stage envelope: Delay, Attack, Hold, Decay,
Sustain, Release. It is the ADSR workhorse with two extra timed stages: a
silent Delay before the attack and a Hold at full level before the decay.

Vocabulary
----------

  value         The envelope's current output (0.0 to 1.0). Multiplies the
                voice's X/Y/Z signal.

  stage         Which part of the envelope we're in. Delay, Attack, Hold,
                Decay, Sustain, Release, and finally Done.

  elapsed       Seconds spent in the current stage. Advanced by one sample
                period per sample.

  curve         Per-segment shape value `c` for Attack, Decay and Release.
                0.0 is a straight line; other values bend it.

  tail-off      Whether note-off plays the Release stage. Without tail-off
                the voice stops dead.


The Shape
---------

  Value
    1.0 ┐       ┌──┐
        │      ╱    ╲
    S   │     ╱      ╲__________
        │    ╱                  ╲
    0.0 └───╱────────────────────╲──→ Time
        Delay Atk Hold Decay Sustain Release
         (D)  (A)  (H)  (D)    (S)     (R)


Curves
------

Attack, Decay and Release move along a shaped ramp instead of a straight
line. With `pos` the fraction of the stage completed:

    shaped(pos) = (1 - e^(c·pos)) / (1 - e^c)

For any c, shaped(0) = 0 and shaped(1) = 1, so every stage starts and ends
exactly where it should. Negative c rises quickly then flattens
(logarithmic feel); positive c starts slowly then rushes (exponential
feel). When |c| is tiny the formula turns into 0/0, so we fall back to the
straight line `pos`.

    Attack:   baseline + (1 - baseline) × shaped(pos)
    Decay:    1 + (sustain - 1) × shaped(pos)
    Release:  release_start × (1 - shaped(pos))


Sample Accuracy
---------------

Time is tracked in seconds (f64) rather than by incrementing the value. A
stage ends when `elapsed >= duration`, and whatever time overshoots the
boundary carries into the next stage. That keeps stage boundaries on exact
sample times no matter how the durations divide the sample rate:

    attack = 0.1 s at 1000 Hz  →  sample 100 (t = 0.100 s) reads exactly 1.0

Zero-length stages are passed through in the same step, so a 0 s attack
jumps straight to full level with no division by zero.


Retriggering
------------

A note-on while the envelope is still sounding does not reset the value to
zero. The current value becomes the attack baseline and the attack ramps
from there to 1.0. During the Delay stage the envelope holds that baseline
(0.0 for a fresh note), so there is never a jump.

Note-off captures the current value as the release start, from whichever
stage we are in. Release always ends on exactly 0.0 at
release_start_time + release seconds, then the envelope is Done.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this magnitude a curve value is treated as linear.
const LINEAR_CURVE_EPSILON: f32 = 1e-3;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
    Done, // Silent; the voice can be reclaimed
}

/// Durations in seconds, sustain level and per-segment curve values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DahdsrParams {
    pub delay: f32,
    pub attack: f32,
    pub hold: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub attack_curve: f32,
    pub decay_curve: f32,
    pub release_curve: f32,
}

impl Default for DahdsrParams {
    fn default() -> Self {
        Self {
            delay: 0.0,
            attack: 0.005,
            hold: 0.0,
            decay: 0.1,
            sustain: 0.8,
            release: 0.3,
            attack_curve: 0.0,
            decay_curve: 0.0,
            release_curve: 0.0,
        }
    }
}

impl DahdsrParams {
    /// Plain ADSR with linear segments.
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            ..Self::default()
        }
        .sanitized()
    }

    /// Negative or non-finite durations become 0, sustain is clamped to
    /// [0, 1] and non-finite curves become linear.
    pub fn sanitized(self) -> Self {
        fn duration(seconds: f32) -> f32 {
            if seconds.is_finite() {
                seconds.max(0.0)
            } else {
                0.0
            }
        }
        fn curve(c: f32) -> f32 {
            if c.is_finite() {
                c
            } else {
                0.0
            }
        }

        Self {
            delay: duration(self.delay),
            attack: duration(self.attack),
            hold: duration(self.hold),
            decay: duration(self.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                0.0
            },
            release: duration(self.release),
            attack_curve: curve(self.attack_curve),
            decay_curve: curve(self.decay_curve),
            release_curve: curve(self.release_curve),
        }
    }
}

/// Map `pos` (0.0 to 1.0) through the curve family described above.
#[inline]
pub fn shaped(pos: f32, curve: f32) -> f32 {
    let pos = pos.clamp(0.0, 1.0);
    if curve.abs() < LINEAR_CURVE_EPSILON {
        return pos;
    }
    let c = curve as f64;
    let value = (1.0 - (c * pos as f64).exp()) / (1.0 - c.exp());
    if value.is_finite() {
        (value as f32).clamp(0.0, 1.0)
    } else {
        // e^c overflowed: the curve is a step at one end.
        if curve > 0.0 {
            if pos >= 1.0 {
                1.0
            } else {
                0.0
            }
        } else if pos > 0.0 {
            1.0
        } else {
            0.0
        }
    }
}

/// Slack allowed when comparing elapsed time against a stage length.
///
/// Durations arrive as f32; widening 0.1_f32 to f64 gives 0.10000000149, which
/// would otherwise push the boundary one sample late.
#[inline]
fn stage_tolerance(duration: f64) -> f64 {
    duration * 2.0 * f32::EPSILON as f64 + 1e-12
}

pub struct Envelope {
    params: DahdsrParams,

    // Runtime state (changes every sample)
    stage: EnvelopeStage,
    elapsed: f64, // seconds spent in the current stage
    value: f32,

    attack_baseline: f32, // value the attack ramps up from
    release_start: f32,   // value the release ramps down from
}

impl Envelope {
    pub fn new(params: DahdsrParams) -> Self {
        Self {
            params: params.sanitized(),
            stage: EnvelopeStage::Done,
            elapsed: 0.0,
            value: 0.0,
            attack_baseline: 0.0,
            release_start: 0.0,
        }
    }

    pub fn params(&self) -> &DahdsrParams {
        &self.params
    }

    /// Replace the envelope shape. Takes effect from the next sample.
    pub fn set_params(&mut self, params: DahdsrParams) {
        self.params = params.sanitized();
    }

    /// Gate high: start (or restart) from the Delay stage.
    ///
    /// The current value becomes the attack baseline, so retriggering a
    /// sounding voice never clicks.
    pub fn note_on(&mut self) {
        self.attack_baseline = self.value;
        self.stage = EnvelopeStage::Delay;
        self.elapsed = 0.0;
    }

    /// Gate low. With `allow_tail_off` the envelope releases from its
    /// current value; without it the envelope stops immediately.
    pub fn note_off(&mut self, allow_tail_off: bool) {
        if self.stage == EnvelopeStage::Done {
            return;
        }

        if allow_tail_off {
            if self.stage != EnvelopeStage::Release {
                self.release_start = self.value;
                self.stage = EnvelopeStage::Release;
                self.elapsed = 0.0;
            }
        } else {
            self.stop();
        }
    }

    /// Advance one sample and return the value for that sample.
    ///
    /// The first call after `note_on` returns the value at t = 0.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        self.settle_stage();
        self.value = self.stage_value();

        if self.stage != EnvelopeStage::Done && sample_rate > 0.0 {
            self.elapsed += 1.0 / sample_rate as f64;
        }

        debug_assert!((0.0..=1.0).contains(&self.value));
        self.value
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(sample_rate);
        }
    }

    /// Move past every stage whose time is up, carrying the overshoot.
    fn settle_stage(&mut self) {
        loop {
            let duration = match self.stage_duration() {
                Some(d) => d as f64,
                None => return,
            };
            if self.elapsed < duration - stage_tolerance(duration) {
                return;
            }
            self.elapsed = (self.elapsed - duration).max(0.0);
            self.stage = match self.stage {
                EnvelopeStage::Delay => EnvelopeStage::Attack,
                EnvelopeStage::Attack => EnvelopeStage::Hold,
                EnvelopeStage::Hold => EnvelopeStage::Decay,
                EnvelopeStage::Decay => EnvelopeStage::Sustain,
                EnvelopeStage::Release => {
                    self.stop();
                    return;
                }
                EnvelopeStage::Sustain | EnvelopeStage::Done => return,
            };
        }
    }

    /// Length of the current stage, or `None` for stages that wait on a
    /// note event (Sustain, Done).
    fn stage_duration(&self) -> Option<f32> {
        match self.stage {
            EnvelopeStage::Delay => Some(self.params.delay),
            EnvelopeStage::Attack => Some(self.params.attack),
            EnvelopeStage::Hold => Some(self.params.hold),
            EnvelopeStage::Decay => Some(self.params.decay),
            EnvelopeStage::Release => Some(self.params.release),
            EnvelopeStage::Sustain | EnvelopeStage::Done => None,
        }
    }

    /// Progress through a stage that is known to have a positive duration.
    #[inline]
    fn progress(&self, duration: f32) -> f32 {
        (self.elapsed / duration as f64) as f32
    }

    fn stage_value(&self) -> f32 {
        let p = &self.params;
        match self.stage {
            EnvelopeStage::Delay => self.attack_baseline,
            EnvelopeStage::Attack => {
                let pos = shaped(self.progress(p.attack), p.attack_curve);
                self.attack_baseline + (1.0 - self.attack_baseline) * pos
            }
            EnvelopeStage::Hold => 1.0,
            EnvelopeStage::Decay => {
                let pos = shaped(self.progress(p.decay), p.decay_curve);
                1.0 + (p.sustain - 1.0) * pos
            }
            EnvelopeStage::Sustain => p.sustain,
            EnvelopeStage::Release => {
                let pos = shaped(self.progress(p.release), p.release_curve);
                self.release_start * (1.0 - pos)
            }
            EnvelopeStage::Done => 0.0,
        }
        .clamp(0.0, 1.0)
    }

    fn stop(&mut self) {
        self.stage = EnvelopeStage::Done;
        self.elapsed = 0.0;
        self.value = 0.0;
        self.attack_baseline = 0.0;
        self.release_start = 0.0;
    }

    /// Returns true if the envelope is producing output (not Done).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Done
    }

    /// Reset to the silent Done state.
    pub fn reset(&mut self) {
        self.stop();
    }

    /// Value produced by the last `next_sample` call.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
