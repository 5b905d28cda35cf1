//! Low Frequency Oscillators that drive effect parameters.

/*
Parameter LFOs
==============

Any effect parameter can be handed to an LFO. While the LFO is running it
overrides the host/automation value: each sample the waveform is evaluated
at the current phase and the result is mapped onto the parameter's range.

Vocabulary
----------

  phase       Position within one LFO cycle, 0.0 to 1.0. Advances by
              rate / sample_rate every sample and wraps at 1.0.

  rate        Cycles per second (Hz). Parameter LFOs usually sit between
              0.01 Hz and 20 Hz; nothing stops faster rates.

  unipolar    Output between 0.0 and 1.0. Every waveform here is unipolar so
              it maps directly onto [min, max]:

                  value = min + lfo(phase) × (max - min)

  bipolar     Output between -1.0 and +1.0 (what sin() gives you).
              Convert: unipolar = (bipolar + 1.0) / 2.0


Waveforms
---------

  Static           No LFO. The parameter keeps its automated value.

  Sine             Smooth sweep, starts at the middle of the range.
                   0.5 + 0.5·sin(2π·phase)

  Square           Jumps between max (first half) and min (second half).

  Triangle         Linear up then down. 0 → 1 → 0.

  Sawtooth         Linear rise, snap back.     ╱╱╱╱
  ReverseSawtooth  Snap up, linear fall.       ╲╲╲╲

  Seesaw           A triangle passed through smoothstep. It lingers at the
                   ends of the range and rushes through the middle, like a
                   seesaw resting on the ground between pushes.

                   t = triangle(phase);  t·t·(3 - 2t)


Sync
----

Every voice owns its own phase, and phases restart when a note starts. Two
notes struck together move in lockstep; a note struck later starts its sweep
from the beginning (a "synced" LFO rather than a free-running one).
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoWaveform {
    #[default]
    Static,
    Sine,
    Square,
    Triangle,
    Sawtooth,
    ReverseSawtooth,
    Seesaw,
}

impl LfoWaveform {
    pub const ALL: [LfoWaveform; 7] = [
        LfoWaveform::Static,
        LfoWaveform::Sine,
        LfoWaveform::Square,
        LfoWaveform::Triangle,
        LfoWaveform::Sawtooth,
        LfoWaveform::ReverseSawtooth,
        LfoWaveform::Seesaw,
    ];

    /// Evaluate the waveform at `phase` (0.0 to 1.0), returning 0.0 to 1.0.
    ///
    /// `Static` has no shape of its own and returns 0.0; callers check
    /// [`is_static`](Self::is_static) first.
    #[inline]
    pub fn evaluate(self, phase: f32) -> f32 {
        let phase = phase - phase.floor();
        match self {
            LfoWaveform::Static => 0.0,
            LfoWaveform::Sine => bipolar_to_unipolar((std::f32::consts::TAU * phase).sin()),
            LfoWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            LfoWaveform::Triangle => triangle(phase),
            LfoWaveform::Sawtooth => phase,
            LfoWaveform::ReverseSawtooth => 1.0 - phase,
            LfoWaveform::Seesaw => {
                let t = triangle(phase);
                t * t * (3.0 - 2.0 * t)
            }
        }
    }

    pub fn is_static(self) -> bool {
        matches!(self, LfoWaveform::Static)
    }

    /// Stable index used when the waveform is stored in an atomic.
    pub(crate) fn to_index(self) -> u8 {
        match self {
            LfoWaveform::Static => 0,
            LfoWaveform::Sine => 1,
            LfoWaveform::Square => 2,
            LfoWaveform::Triangle => 3,
            LfoWaveform::Sawtooth => 4,
            LfoWaveform::ReverseSawtooth => 5,
            LfoWaveform::Seesaw => 6,
        }
    }

    pub(crate) fn from_index(index: u8) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(LfoWaveform::Static)
    }
}

#[inline]
fn triangle(phase: f32) -> f32 {
    if phase < 0.5 {
        2.0 * phase
    } else {
        2.0 - 2.0 * phase
    }
}

/// Phase accumulator for one LFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct LfoPhase {
    phase: f32,
}

impl LfoPhase {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Current phase, 0.0 to 1.0.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Step forward one sample at `rate` Hz.
    #[inline]
    pub fn advance(&mut self, rate: f32, sample_rate: f32) {
        if sample_rate <= 0.0 || !rate.is_finite() {
            return;
        }
        self.phase += rate / sample_rate;
        self.phase -= self.phase.floor();
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    (unipolar * 2.0) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bipolar_unipolar_roundtrip() {
        for &val in &[-1.0, -0.5, 0.0, 0.5, 1.0] {
            let roundtrip = unipolar_to_bipolar(bipolar_to_unipolar(val));
            assert!(
                (roundtrip - val).abs() < 1e-6,
                "Roundtrip failed for {}: got {}",
                val,
                roundtrip
            );
        }
    }

    #[test]
    fn test_waveforms_stay_unipolar() {
        for waveform in LfoWaveform::ALL {
            for i in 0..=200 {
                let value = waveform.evaluate(i as f32 / 100.0);
                assert!(
                    (0.0..=1.0).contains(&value),
                    "{:?} gave {} at step {}",
                    waveform,
                    value,
                    i
                );
            }
        }
    }

    #[test]
    fn test_waveform_landmarks() {
        assert!((LfoWaveform::Sine.evaluate(0.25) - 1.0).abs() < 1e-6);
        assert!((LfoWaveform::Sine.evaluate(0.0) - 0.5).abs() < 1e-6);
        assert_eq!(LfoWaveform::Square.evaluate(0.1), 1.0);
        assert_eq!(LfoWaveform::Square.evaluate(0.6), 0.0);
        assert!((LfoWaveform::Triangle.evaluate(0.5) - 1.0).abs() < 1e-6);
        assert!((LfoWaveform::Sawtooth.evaluate(0.3) - 0.3).abs() < 1e-6);
        assert!((LfoWaveform::ReverseSawtooth.evaluate(0.3) - 0.7).abs() < 1e-6);
        assert!((LfoWaveform::Seesaw.evaluate(0.25) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_phase_advances_and_wraps() {
        let mut phase = LfoPhase::new();
        // 5 Hz at 1000 Hz = 200 samples per cycle
        for _ in 0..250 {
            phase.advance(5.0, 1000.0);
        }
        assert!((phase.phase() - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_index_roundtrip() {
        for waveform in LfoWaveform::ALL {
            assert_eq!(LfoWaveform::from_index(waveform.to_index()), waveform);
        }
        assert_eq!(LfoWaveform::from_index(200), LfoWaveform::Static);
    }
}
