//! Side panel: source, notes and effect states

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use saavy_scope::effect::EffectHandle;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[note as usize % 12], octave)
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    source: &str,
    octave: u8,
    held: &[u8],
    effects: &[EffectHandle],
    spinning: bool,
    bend_cents: f32,
) {
    let block = Block::default().title(" Status ").borders(Borders::ALL);
    let label = Style::default().fg(Color::DarkGray);

    let notes = if held.is_empty() {
        "-".to_string()
    } else {
        held.iter().map(|&n| note_name(n)).collect::<Vec<_>>().join(" ")
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Source  ", label), Span::raw(source.to_string())]),
        Line::from(vec![Span::styled("Octave  ", label), Span::raw(octave.to_string())]),
        Line::from(vec![Span::styled("Notes   ", label), Span::raw(notes)]),
        Line::from(vec![
            Span::styled("Spin    ", label),
            Span::raw(if spinning { "on" } else { "off" }),
        ]),
        Line::from(vec![
            Span::styled("Bend    ", label),
            Span::raw(format!("{:+.0} ct", bend_cents)),
        ]),
        Line::from(""),
        Line::from(Span::styled("Effects", label)),
    ];

    for effect in effects {
        let style = if effect.is_enabled() {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>3} ", effect.precedence()), label),
            Span::styled(effect.id().to_string(), style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
