use std::sync::{
    atomic::{AtomicU32, AtomicU8, Ordering},
    Arc,
};

use crate::{
    dsp::lfo::LfoWaveform,
    error::{Result, ScopeError},
};

/// Host-automatable effect parameter.
///
/// An `EffectParameter` is a handle: cloning it gives another view onto the
/// same value, so an effect and all of its per-voice clones hear one
/// automation change at the same instant. Values live in atomics and are
/// read without locking from the audio thread; writes may come from any
/// thread.
#[derive(Clone)]
pub struct EffectParameter {
    inner: Arc<ParameterInner>,
}

struct ParameterInner {
    id: String,
    name: String,
    min: f32,
    max: f32,
    default: f32,
    value: AtomicU32,      // f32 bits
    lfo_waveform: AtomicU8, // LfoWaveform index
    lfo_rate: AtomicU32,  // f32 bits, Hz
}

/// Everything the audio thread needs from a parameter, read once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub lfo: LfoWaveform,
    pub lfo_rate: f32,
}

impl ParameterSnapshot {
    /// Map a unipolar LFO output onto the parameter range.
    #[inline]
    pub fn lfo_value(&self, unipolar: f32) -> f32 {
        self.min + unipolar * (self.max - self.min)
    }
}

impl EffectParameter {
    /// Create a parameter. `default` is clamped into `[min, max]`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        default: f32,
        min: f32,
        max: f32,
    ) -> Result<Self> {
        let id = id.into();
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(ScopeError::InvalidRange { id, min, max });
        }

        let default = if default.is_finite() {
            default.clamp(min, max)
        } else {
            min
        };

        Ok(Self {
            inner: Arc::new(ParameterInner {
                id,
                name: name.into(),
                min,
                max,
                default,
                value: AtomicU32::new(default.to_bits()),
                lfo_waveform: AtomicU8::new(LfoWaveform::Static.to_index()),
                lfo_rate: AtomicU32::new(1.0_f32.to_bits()),
            }),
        })
    }

    /// Set the LFO at construction time.
    pub fn with_lfo(self, waveform: LfoWaveform, rate: f32) -> Self {
        self.set_lfo(waveform);
        self.set_lfo_rate(rate);
        self
    }

    /// Stable, host-facing identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn min(&self) -> f32 {
        self.inner.min
    }

    pub fn max(&self) -> f32 {
        self.inner.max
    }

    pub fn default_value(&self) -> f32 {
        self.inner.default
    }

    /// Latest value written by the host or UI.
    #[inline]
    pub fn value(&self) -> f32 {
        f32::from_bits(self.inner.value.load(Ordering::Relaxed))
    }

    /// Set the value from any thread. Clamped to the range; NaN is ignored.
    pub fn set_value(&self, value: f32) {
        if value.is_nan() {
            return;
        }
        let value = value.clamp(self.inner.min, self.inner.max);
        self.inner.value.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.set_value(self.inner.default);
    }

    /// Map a value in `[min, max]` to `[0, 1]`.
    pub fn normalise(&self, value: f32) -> f64 {
        let min = self.inner.min as f64;
        let max = self.inner.max as f64;
        ((value as f64 - min) / (max - min)).clamp(0.0, 1.0)
    }

    /// Map a normalised value in `[0, 1]` back into `[min, max]`.
    pub fn unnormalise(&self, normalised: f64) -> f32 {
        let min = self.inner.min as f64;
        let max = self.inner.max as f64;
        let normalised = if normalised.is_finite() {
            normalised.clamp(0.0, 1.0)
        } else {
            0.0
        };
        ((min + normalised * (max - min)) as f32).clamp(self.inner.min, self.inner.max)
    }

    pub fn normalised_value(&self) -> f64 {
        self.normalise(self.value())
    }

    /// Host automation entry point.
    pub fn set_normalised(&self, normalised: f64) {
        self.set_value(self.unnormalise(normalised));
    }

    pub fn lfo(&self) -> LfoWaveform {
        LfoWaveform::from_index(self.inner.lfo_waveform.load(Ordering::Relaxed))
    }

    pub fn set_lfo(&self, waveform: LfoWaveform) {
        self.inner
            .lfo_waveform
            .store(waveform.to_index(), Ordering::Relaxed);
    }

    pub fn lfo_rate(&self) -> f32 {
        f32::from_bits(self.inner.lfo_rate.load(Ordering::Relaxed))
    }

    /// LFO rate in Hz. Negative or non-finite rates are ignored.
    pub fn set_lfo_rate(&self, rate: f32) {
        if rate.is_finite() && rate >= 0.0 {
            self.inner.lfo_rate.store(rate.to_bits(), Ordering::Relaxed);
        }
    }

    /// Read value, range and LFO settings in one go.
    #[inline]
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            value: self.value(),
            min: self.inner.min,
            max: self.inner.max,
            lfo: self.lfo(),
            lfo_rate: self.lfo_rate(),
        }
    }

    /// True if both handles view the same underlying value.
    pub fn shares_value_with(&self, other: &EffectParameter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for EffectParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectParameter")
            .field("id", &self.inner.id)
            .field("value", &self.value())
            .field("min", &self.inner.min)
            .field("max", &self.inner.max)
            .field("lfo", &self.lfo())
            .finish()
    }
}
