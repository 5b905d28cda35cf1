use crate::{
    error::{Result, ScopeError},
    shape::Point,
};

/// Planar output buffer: X, Y and optionally Z (brightness).
///
/// Voices accumulate into it; the host copies channels out to its own
/// interleaved or planar layout. Storage is allocated once; hosts with
/// varying callback sizes shrink the active length with
/// [`set_num_samples`](Self::set_num_samples).
#[derive(Debug, Clone)]
pub struct ScopeBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl ScopeBuffer {
    /// `num_channels` must be 2 (XY) or 3 (XYZ).
    pub fn new(num_channels: usize, num_samples: usize) -> Result<Self> {
        if !(2..=3).contains(&num_channels) {
            return Err(ScopeError::UnsupportedChannels(num_channels));
        }

        Ok(Self {
            channels: vec![vec![0.0; num_samples]; num_channels],
            num_samples,
        })
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Most samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.channels[0].len()
    }

    /// Change the active length without reallocating. Clamped to
    /// [`capacity`](Self::capacity); returns the length actually set.
    pub fn set_num_samples(&mut self, num_samples: usize) -> usize {
        self.num_samples = num_samples.min(self.capacity());
        self.num_samples
    }

    pub fn has_z(&self) -> bool {
        self.channels.len() == 3
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index][..self.num_samples]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index][..self.num_samples]
    }

    /// Point at `index`. Z reads as 0 on a two-channel buffer.
    pub fn point(&self, index: usize) -> Point {
        Point {
            x: self.channels[0][index],
            y: self.channels[1][index],
            z: self.channels.get(2).map_or(0.0, |z| z[index]),
        }
    }

    /// Add `points` into the buffer starting at `start`.
    ///
    /// Extra points past the end of the buffer are ignored.
    #[inline]
    pub fn accumulate(&mut self, start: usize, points: &[Point]) {
        let end = (start + points.len()).min(self.num_samples);
        if start >= end {
            return;
        }
        let points = &points[..end - start];

        for (out, p) in self.channels[0][start..end].iter_mut().zip(points) {
            *out += p.x;
        }
        for (out, p) in self.channels[1][start..end].iter_mut().zip(points) {
            *out += p.y;
        }
        if let Some(z) = self.channels.get_mut(2) {
            for (out, p) in z[start..end].iter_mut().zip(points) {
                *out += p.z;
            }
        }
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel[..self.num_samples].fill(0.0);
        }
    }

    /// Write interleaved frames (`x y [z] x y [z] ...`) into `out`, filling
    /// any extra device channels with silence.
    pub fn write_interleaved(&self, out: &mut [f32], device_channels: usize) {
        if device_channels == 0 {
            return;
        }
        for (i, frame) in out.chunks_mut(device_channels).take(self.num_samples).enumerate() {
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = self.channels.get(c).map_or(0.0, |channel| channel[i]);
            }
        }
    }
}
