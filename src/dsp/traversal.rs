/*
Path Traversal
==============

A voice plays a frame by walking along it. One full lap of the path takes
exactly one period of the note, so the path *is* the waveform: drawing a
square at 220 Hz means tracing the whole square 220 times a second.

Vocabulary
----------

  total length     Sum of every shape's arc length in the frame.

  increment        Arc length walked per sample.

                       increment = total_length / (sample_rate / frequency)

                   sample_rate / frequency is the number of samples in one
                   period, so after that many samples we have walked
                   total_length: exactly one lap.

  drawn_in_shape   Arc length walked into the current shape.
  drawn_in_frame   Arc length walked into the current lap.


Per Sample
----------

  1. Emit the point at drawn_in_shape / shape_length of the current shape.
  2. Walk `increment` further (both accumulators).
  3. While we've walked past the end of the current shape, carry the excess
     into the next shape (wrapping to the first one after the last).
  4. When drawn_in_frame reaches total_length the lap is over: wrap it,
     restart at shape 0, and, if a fresher frame is waiting, switch to it.

Step 3 can run several times in one sample. At high notes on a short path
the increment may be longer than many small shapes put together; they are
skipped in a single sample and phase stays locked to the note.

Frames only change at a lap boundary (step 4). Swapping mid-lap would cut
the waveform at an arbitrary point and click.


Guards
------

  MIN_LENGTH_INCREMENT   The walk never stands still, even at 0 Hz.

  degenerate frames      No shapes, or nothing but zero-length ones: there
                         is no path, so we sit at the origin.

  lap reduction          If the carried length exceeds a whole lap, whole
                         laps are dropped first. Walking a full lap ends
                         where it started, so phase is unchanged and the
                         skip loop stays short at absurd frequencies.
*/

use std::sync::Arc;

use crate::{
    shape::{Frame, Point},
    MIN_LENGTH_INCREMENT,
};

/// Per-voice cursor along the current frame.
pub struct PathTraversal {
    frame: Arc<Frame>,
    shape_index: usize,
    drawn_in_shape: f32,
    drawn_in_frame: f32,
}

impl PathTraversal {
    pub fn new(frame: Arc<Frame>) -> Self {
        Self {
            frame,
            shape_index: 0,
            drawn_in_shape: 0.0,
            drawn_in_frame: 0.0,
        }
    }

    /// Arc length walked per sample for a note at `frequency`.
    #[inline]
    pub fn length_increment(total_length: f32, frequency: f32, sample_rate: f32) -> f32 {
        let increment = total_length / (sample_rate / frequency);
        if increment.is_finite() {
            increment.max(MIN_LENGTH_INCREMENT)
        } else {
            MIN_LENGTH_INCREMENT
        }
    }

    /// Start over on `frame` from its first shape.
    pub fn reset(&mut self, frame: Arc<Frame>) -> Arc<Frame> {
        self.shape_index = 0;
        self.drawn_in_shape = 0.0;
        self.drawn_in_frame = 0.0;
        std::mem::replace(&mut self.frame, frame)
    }

    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }

    pub fn shape_index(&self) -> usize {
        self.shape_index
    }

    pub fn drawn_in_shape(&self) -> f32 {
        self.drawn_in_shape
    }

    pub fn drawn_in_frame(&self) -> f32 {
        self.drawn_in_frame
    }

    /// Emit the current point and walk one sample further.
    ///
    /// `latest` is the newest frame available this block. It is adopted only
    /// when a lap completes; the frame it replaces is returned so the caller
    /// can dispose of it off the audio thread.
    #[inline]
    pub fn next_point(
        &mut self,
        frequency: f32,
        sample_rate: f32,
        latest: &Arc<Frame>,
    ) -> (Point, Option<Arc<Frame>>) {
        let frame = &*self.frame;

        if frame.is_degenerate() {
            // Nothing to walk; pick up a real frame as soon as one appears.
            let retired = if !Arc::ptr_eq(&self.frame, latest) && !latest.is_degenerate() {
                Some(self.reset(latest.clone()))
            } else {
                None
            };
            return (Point::ORIGIN, retired);
        }

        let total_length = frame.total_length();
        let shapes = frame.shapes();

        // 1. Emit
        let shape_length = frame.shape_length(self.shape_index);
        let point = if shape_length > 0.0 {
            shapes[self.shape_index].position_at(self.drawn_in_shape / shape_length)
        } else {
            shapes[self.shape_index].position_at(0.0)
        };

        // 2. Walk
        let increment = Self::length_increment(total_length, frequency, sample_rate);
        self.drawn_in_shape += increment;
        self.drawn_in_frame += increment;

        // 3. Carry into following shapes
        if self.drawn_in_shape > total_length {
            self.drawn_in_shape %= total_length;
        }
        self.skip_finished_shapes();

        // 4. End of lap
        let mut retired = None;
        if self.drawn_in_frame >= total_length {
            self.drawn_in_frame %= total_length;
            self.shape_index = 0;
            self.drawn_in_shape = self.drawn_in_frame;
            self.skip_finished_shapes();

            if !Arc::ptr_eq(&self.frame, latest) {
                retired = Some(self.reset(latest.clone()));
            }
        }

        (point, retired)
    }

    fn skip_finished_shapes(&mut self) {
        let frame = &*self.frame;
        let count = frame.shape_count();
        let mut shape_length = frame.shape_length(self.shape_index);
        while self.drawn_in_shape > shape_length {
            self.drawn_in_shape -= shape_length;
            self.shape_index = (self.shape_index + 1) % count;
            shape_length = frame.shape_length(self.shape_index);
        }
    }
}
