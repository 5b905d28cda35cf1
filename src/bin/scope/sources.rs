//! Built-in frame sources for the demo: what the scope can draw.

use std::f32::consts::TAU;

use saavy_scope::{
    frame::{FrameSource, ProceduralSource, StaticSource},
    Frame, Point, Shape,
};

/// Names shown in the UI, in cycling order.
pub const SOURCE_NAMES: [&str; 5] = ["spinning polygon", "square", "star", "lissajous", "circle"];

/// Build the source at `index` (wraps around).
pub fn make_source(index: usize) -> Box<dyn FrameSource> {
    match index % SOURCE_NAMES.len() {
        0 => Box::new(ProceduralSource::new(SOURCE_NAMES[0], |n| {
            // Slow spin, morphing from 3 to 7 sides every few seconds
            let sides = 3 + ((n / 240) % 5) as usize;
            Frame::polygon(sides, 0.8, n as f32 * 0.004)
        })),
        1 => Box::new(StaticSource::new(Frame::unit_square().normalized())),
        2 => Box::new(StaticSource::new(star(5, 0.9, 0.4))),
        3 => Box::new(ProceduralSource::new(SOURCE_NAMES[3], |n| {
            lissajous(3.0, 2.0, n as f32 * 0.01, 128)
        })),
        _ => Box::new(StaticSource::new(Frame::new(vec![Shape::circle(
            Point::ORIGIN,
            0.8,
        )]))),
    }
}

fn star(points: usize, outer: f32, inner: f32) -> Frame {
    let vertices: Vec<Point> = (0..points * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = TAU * i as f32 / (points * 2) as f32 + TAU / 4.0;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    Frame::polyline(&vertices, true)
}

fn lissajous(a: f32, b: f32, phase: f32, segments: usize) -> Frame {
    let vertices: Vec<Point> = (0..segments)
        .map(|i| {
            let t = TAU * i as f32 / segments as f32;
            Point::new(0.8 * (a * t + phase).sin(), 0.8 * (b * t).sin())
        })
        .collect();
    Frame::polyline(&vertices, true)
}
