use crate::shape::Point;

/// Ring buffer of past points.
///
/// The buffer is allocated once at construction; reading and writing never
/// allocate, so a delay line can live inside a voice.
pub struct DelayLine {
    buffer: Vec<Point>,
    write_pos: usize,
}

impl DelayLine {
    /// Delay line able to look back up to `capacity - 1` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![Point::ORIGIN; capacity.max(1)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Point written `delay_samples` samples ago, without writing.
    #[inline]
    pub fn read(&self, delay_samples: usize) -> Point {
        let len = self.buffer.len();
        let delay_samples = delay_samples.clamp(1, len);
        let read_pos = (self.write_pos + len - delay_samples) % len;
        self.buffer[read_pos]
    }

    #[inline]
    pub fn write(&mut self, point: Point) {
        self.buffer[self.write_pos] = point;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(Point::ORIGIN);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_by_requested_samples() {
        let mut line = DelayLine::new(16);
        let mut outputs = Vec::new();
        for i in 0..8 {
            outputs.push(line.read(3));
            line.write(Point::new(i as f32, 0.0));
        }
        // First three reads are the silent buffer, then the input shows up.
        assert_eq!(outputs[2], Point::ORIGIN);
        assert_eq!(outputs[3], Point::new(0.0, 0.0));
        assert_eq!(outputs[4], Point::new(1.0, 0.0));
        assert_eq!(outputs[7], Point::new(4.0, 0.0));
    }

    #[test]
    fn oversized_delay_is_clamped() {
        let mut line = DelayLine::new(4);
        for i in 0..10 {
            line.write(Point::new(i as f32, 0.0));
            // Clamped to the full buffer: the oldest point still held
            assert_eq!(line.read(1000), line.read(4));
        }
    }

    #[test]
    fn reset_clears_history() {
        let mut line = DelayLine::new(8);
        line.write(Point::new(1.0, 1.0));
        line.reset();
        assert_eq!(line.read(1), Point::ORIGIN);
    }
}
