//! Point effects, their parameters, and the per-voice effect chain.
//!
//! An [`Effect`] pairs a set of [`EffectParameter`]s with an
//! [`EffectApplication`] strategy. The strategy is a prototype: every voice
//! gets its own fresh instance (its own delay buffers, smoothers, phases),
//! while the parameters stay shared so automation reaches every voice at
//! once. See [`chain`] for ordering and cloning.

pub mod built_in;
pub mod chain;
pub mod parameter;

use std::sync::{
    atomic::{AtomicBool, AtomicI32, Ordering},
    Arc,
};

pub use chain::{EffectChain, VoiceEffects};
pub use parameter::{EffectParameter, ParameterSnapshot};

use crate::shape::Point;

/// Per-sample point transform with private state.
///
/// `values` holds the effective value of each of the effect's parameters for
/// this sample, in declaration order (LFOs already applied). `index` is the
/// sample's position in the output block. Implementations
/// must not allocate or block, and should return finite points; the chain
/// replaces non-finite output with the input.
pub trait EffectApplication: Send {
    fn apply(
        &mut self,
        index: usize,
        input: Point,
        values: &[f32],
        sample_rate: f32,
        frequency: f32,
    ) -> Point;

    /// New instance in its initial state, for another voice.
    fn fresh(&self) -> Box<dyn EffectApplication>;

    /// Return to the initial state.
    fn reset(&mut self) {}

    /// Whether re-enabling the effect should clear its state rather than
    /// resume from where it left off.
    fn reset_on_enable(&self) -> bool {
        false
    }
}

/// State shared by an effect and all of its per-voice clones.
pub(crate) struct EffectShared {
    pub(crate) id: String,
    pub(crate) parameters: Vec<EffectParameter>,
    pub(crate) enabled: AtomicBool,
    pub(crate) precedence: AtomicI32,
}

/// An effect as registered in an [`EffectChain`].
pub struct Effect {
    shared: Arc<EffectShared>,
    prototype: Box<dyn EffectApplication>,
}

impl Effect {
    /// Enabled effect at precedence 0.
    pub fn new(
        id: impl Into<String>,
        parameters: Vec<EffectParameter>,
        application: impl EffectApplication + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(EffectShared {
                id: id.into(),
                parameters,
                enabled: AtomicBool::new(true),
                precedence: AtomicI32::new(0),
            }),
            prototype: Box::new(application),
        }
    }

    pub fn with_precedence(self, precedence: i32) -> Self {
        self.shared.precedence.store(precedence, Ordering::Relaxed);
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.shared.enabled.store(enabled, Ordering::Relaxed);
        self
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn precedence(&self) -> i32 {
        self.shared.precedence.load(Ordering::Relaxed)
    }

    /// Control handle for UI/host threads.
    pub fn handle(&self) -> EffectHandle {
        EffectHandle {
            shared: self.shared.clone(),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<EffectShared> {
        &self.shared
    }

    pub(crate) fn fresh_application(&self) -> Box<dyn EffectApplication> {
        self.prototype.fresh()
    }
}

/// Cheap, cloneable control handle onto an effect.
///
/// Toggling or automating through a handle is heard by every voice. The
/// precedence can only be changed through [`EffectChain::set_precedence`],
/// which keeps precedences unique.
#[derive(Clone)]
pub struct EffectHandle {
    shared: Arc<EffectShared>,
}

impl EffectHandle {
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn precedence(&self) -> i32 {
        self.shared.precedence.load(Ordering::Relaxed)
    }

    pub fn parameters(&self) -> &[EffectParameter] {
        &self.shared.parameters
    }

    pub fn parameter(&self, id: &str) -> Option<&EffectParameter> {
        self.shared.parameters.iter().find(|p| p.id() == id)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("id", &self.shared.id)
            .field("enabled", &self.is_enabled())
            .field("precedence", &self.precedence())
            .finish()
    }
}
