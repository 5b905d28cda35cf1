//! Stock point effects.
//!
//! Each constructor returns a ready [`Effect`] with its parameters declared.
//! Parameter ids are stable and host-facing.
//!
//! | effect      | parameters                      | state            |
//! |-------------|---------------------------------|------------------|
//! | `scale`     | `scaleX`, `scaleY`              | none             |
//! | `translate` | `translateX`, `translateY`      | none             |
//! | `rotate`    | `rotateAngle`, `rotateSpeed`    | spin phase       |
//! | `delay`     | `delayDecay`, `delayLength`     | [`DelayLine`]    |
//! | `smooth`    | `smoothing`                     | last output      |
//! | `bitcrush`  | `bitCrush`                      | none             |

use std::f32::consts::TAU;

use crate::{
    dsp::delay::DelayLine,
    effect::{Effect, EffectApplication, EffectParameter},
    error::Result,
    shape::Point,
    MAX_DELAY_SAMPLES,
};

/// Per-axis gain.
pub fn scale() -> Result<Effect> {
    Ok(Effect::new(
        "scale",
        vec![
            EffectParameter::new("scaleX", "Scale X", 1.0, -5.0, 5.0)?,
            EffectParameter::new("scaleY", "Scale Y", 1.0, -5.0, 5.0)?,
        ],
        Scale,
    ))
}

/// Per-axis offset.
pub fn translate() -> Result<Effect> {
    Ok(Effect::new(
        "translate",
        vec![
            EffectParameter::new("translateX", "Translate X", 0.0, -1.0, 1.0)?,
            EffectParameter::new("translateY", "Translate Y", 0.0, -1.0, 1.0)?,
        ],
        Translate,
    ))
}

/// Rotation about the origin. `rotateAngle` is a fixed offset in turns,
/// `rotateSpeed` spins the image at that many turns per second.
pub fn rotate() -> Result<Effect> {
    Ok(Effect::new(
        "rotate",
        vec![
            EffectParameter::new("rotateAngle", "Rotate Angle", 0.0, -1.0, 1.0)?,
            EffectParameter::new("rotateSpeed", "Rotate Speed", 0.0, -10.0, 10.0)?,
        ],
        Rotate { phase: 0.0 },
    ))
}

/// Feedback echo. Each voice gets its own delay line.
pub fn delay() -> Result<Effect> {
    Ok(Effect::new(
        "delay",
        vec![
            EffectParameter::new("delayDecay", "Delay Decay", 0.4, 0.0, 1.0)?,
            EffectParameter::new("delayLength", "Delay Length", 0.5, 0.0, 2.0)?,
        ],
        Delay::new(),
    ))
}

/// One-pole low-pass on both axes. Rounds off corners.
pub fn smooth() -> Result<Effect> {
    Ok(Effect::new(
        "smooth",
        vec![EffectParameter::new("smoothing", "Smoothing", 0.75, 0.0, 1.0)?],
        Smooth::default(),
    ))
}

/// Coordinate quantisation.
pub fn bit_crush() -> Result<Effect> {
    Ok(Effect::new(
        "bitcrush",
        vec![EffectParameter::new("bitCrush", "Bit Crush", 0.6, 0.0, 1.0)?],
        BitCrush,
    ))
}

struct Scale;

impl EffectApplication for Scale {
    fn apply(&mut self, _: usize, input: Point, values: &[f32], _: f32, _: f32) -> Point {
        Point {
            x: input.x * values[0],
            y: input.y * values[1],
            z: input.z,
        }
    }

    fn fresh(&self) -> Box<dyn EffectApplication> {
        Box::new(Scale)
    }
}

struct Translate;

impl EffectApplication for Translate {
    fn apply(&mut self, _: usize, input: Point, values: &[f32], _: f32, _: f32) -> Point {
        Point {
            x: input.x + values[0],
            y: input.y + values[1],
            z: input.z,
        }
    }

    fn fresh(&self) -> Box<dyn EffectApplication> {
        Box::new(Translate)
    }
}

struct Rotate {
    phase: f32, // turns, wrapped to [0, 1)
}

impl EffectApplication for Rotate {
    fn apply(
        &mut self,
        _: usize,
        input: Point,
        values: &[f32],
        sample_rate: f32,
        _: f32,
    ) -> Point {
        let turns = values[0] + self.phase;
        if sample_rate > 0.0 {
            self.phase += values[1] / sample_rate;
            self.phase -= self.phase.floor();
        }
        input.rotate(turns * TAU)
    }

    fn fresh(&self) -> Box<dyn EffectApplication> {
        Box::new(Rotate { phase: 0.0 })
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

struct Delay {
    line: DelayLine,
}

impl Delay {
    fn new() -> Self {
        Self {
            line: DelayLine::new(MAX_DELAY_SAMPLES + 1),
        }
    }
}

impl EffectApplication for Delay {
    fn apply(
        &mut self,
        _: usize,
        input: Point,
        values: &[f32],
        sample_rate: f32,
        _: f32,
    ) -> Point {
        let decay = values[0];
        let samples = (values[1] * sample_rate).max(0.0) as usize;
        let samples = samples.min(self.line.capacity() - 1);

        if samples == 0 {
            return input;
        }

        let echo = self.line.read(samples);
        let output = Point {
            x: input.x + echo.x * decay,
            y: input.y + echo.y * decay,
            z: input.z,
        };
        self.line.write(output);
        output
    }

    fn fresh(&self) -> Box<dyn EffectApplication> {
        Box::new(Delay::new())
    }

    fn reset(&mut self) {
        self.line.reset();
    }

    // Re-enabling starts from an empty line.
    fn reset_on_enable(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct Smooth {
    last: Option<Point>,
}

impl EffectApplication for Smooth {
    fn apply(&mut self, _: usize, input: Point, values: &[f32], _: f32, _: f32) -> Point {
        let Some(last) = self.last else {
            self.last = Some(input);
            return input;
        };

        // smoothing 0 → follow input, smoothing 1 → barely move
        let follow = (1.0 - values[0]).powi(2).max(1e-4);
        let output = last.lerp(input, follow);
        let output = Point { z: input.z, ..output };
        self.last = Some(output);
        output
    }

    fn fresh(&self) -> Box<dyn EffectApplication> {
        Box::new(Smooth::default())
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

struct BitCrush;

impl BitCrush {
    /// Quantisation levels per unit for a crush amount in `[0, 1]`.
    #[inline]
    fn steps(amount: f32) -> f32 {
        (2.0 + (1.0 - amount.clamp(0.0, 1.0)) * 10.0).exp2()
    }
}

impl EffectApplication for BitCrush {
    fn apply(&mut self, _: usize, input: Point, values: &[f32], _: f32, _: f32) -> Point {
        let steps = Self::steps(values[0]);
        Point {
            x: (input.x * steps).round() / steps,
            y: (input.y * steps).round() / steps,
            z: input.z,
        }
    }

    fn fresh(&self) -> Box<dyn EffectApplication> {
        Box::new(BitCrush)
    }
}
