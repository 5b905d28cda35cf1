use std::fmt::Display;

use tracing::warn;

use crate::shape::Frame;

/// Anything that can hand out frames: a parser, a generator, a live input.
///
/// Sources run on the producer thread and may take as long as they like;
/// the audio thread never calls into them.
pub trait FrameSource: Send {
    /// Produce the next frame. Called repeatedly while the source is active.
    fn next_frame(&mut self) -> Frame;

    fn is_active(&self) -> bool;

    fn enable(&mut self);

    fn disable(&mut self);

    /// Label used in logs.
    fn name(&self) -> &str {
        "frame source"
    }
}

/// Repeats one frame forever.
pub struct StaticSource {
    frame: Frame,
    active: bool,
}

impl StaticSource {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            active: true,
        }
    }
}

impl FrameSource for StaticSource {
    fn next_frame(&mut self) -> Frame {
        self.frame.clone()
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn enable(&mut self) {
        self.active = true;
    }

    fn disable(&mut self) {
        self.active = false;
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Frames computed by a closure, given a running frame counter.
///
/// ```
/// use saavy_scope::{frame::ProceduralSource, Frame};
///
/// // A polygon that spins a little every frame.
/// let spinner = ProceduralSource::new("spinner", |n| Frame::polygon(5, 0.8, n as f32 * 0.01));
/// assert_eq!(spinner.counter(), 0);
/// ```
pub struct ProceduralSource<F>
where
    F: FnMut(u64) -> Frame + Send,
{
    name: String,
    generate: F,
    counter: u64,
    active: bool,
}

impl<F> ProceduralSource<F>
where
    F: FnMut(u64) -> Frame + Send,
{
    pub fn new(name: impl Into<String>, generate: F) -> Self {
        Self {
            name: name.into(),
            generate,
            counter: 0,
            active: true,
        }
    }

    /// Frames produced so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl<F> FrameSource for ProceduralSource<F>
where
    F: FnMut(u64) -> Frame + Send,
{
    fn next_frame(&mut self) -> Frame {
        let frame = (self.generate)(self.counter);
        self.counter = self.counter.wrapping_add(1);
        frame
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn enable(&mut self) {
        self.active = true;
    }

    fn disable(&mut self) {
        self.active = false;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wraps a fallible loader (file parser, network fetch).
///
/// When the loader fails, the unit square is produced instead and the error
/// is logged, so a broken file still draws something recognisable.
pub struct FallibleSource<F, E>
where
    F: FnMut() -> Result<Frame, E> + Send,
    E: Display,
{
    name: String,
    load: F,
    active: bool,
    failures: u64,
}

impl<F, E> FallibleSource<F, E>
where
    F: FnMut() -> Result<Frame, E> + Send,
    E: Display,
{
    pub fn new(name: impl Into<String>, load: F) -> Self {
        Self {
            name: name.into(),
            load,
            active: true,
            failures: 0,
        }
    }

    /// How many times the fallback has been substituted.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl<F, E> FrameSource for FallibleSource<F, E>
where
    F: FnMut() -> Result<Frame, E> + Send,
    E: Display,
{
    fn next_frame(&mut self) -> Frame {
        match (self.load)() {
            Ok(frame) => frame,
            Err(err) => {
                self.failures += 1;
                // Only the first failure in a run is interesting.
                if self.failures == 1 {
                    warn!("{}: {}; drawing fallback square", self.name, err);
                }
                Frame::unit_square()
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn enable(&mut self) {
        self.active = true;
    }

    fn disable(&mut self) {
        self.active = false;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_repeats() {
        let mut source = StaticSource::new(Frame::polygon(3, 1.0, 0.0));
        let a = source.next_frame();
        let b = source.next_frame();
        assert_eq!(a.shape_count(), 3);
        assert_eq!(a.total_length(), b.total_length());

        source.disable();
        assert!(!source.is_active());
        source.enable();
        assert!(source.is_active());
    }

    #[test]
    fn procedural_source_counts_frames() {
        let mut source = ProceduralSource::new("sides", |n| Frame::polygon(3 + n as usize, 1.0, 0.0));
        assert_eq!(source.next_frame().shape_count(), 3);
        assert_eq!(source.next_frame().shape_count(), 4);
        assert_eq!(source.counter(), 2);
        assert_eq!(source.name(), "sides");
    }

    #[test]
    fn fallible_source_falls_back_to_unit_square() {
        let mut calls = 0;
        let mut source = FallibleSource::new("broken.svg", move || {
            calls += 1;
            if calls % 2 == 0 {
                Err("unexpected end of path data")
            } else {
                Ok(Frame::polygon(6, 1.0, 0.0))
            }
        });

        assert_eq!(source.next_frame().shape_count(), 6);
        let fallback = source.next_frame();
        assert_eq!(fallback.shape_count(), 4);
        assert!((fallback.total_length() - 4.0).abs() < 1e-6);
        assert_eq!(source.failures(), 1);
    }
}
