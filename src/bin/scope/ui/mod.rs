//! TUI module for scope
//!
//! XY display of the synth output plus a keyboard for notes, effect toggles
//! and frame source selection. The keyboard plays as a MIDI controller: notes,
//! all-notes-off and pitch bend go through the same decoder as device input.

mod status;
mod xy;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::Duration;
use tracing::{info, warn};

use saavy_scope::{
    effect::{EffectChain, EffectHandle},
    frame::FrameProducer,
    io::{midi::PITCH_BEND_RANGE_CENTS, MidiEvent},
    synth::SynthMessage,
};

use super::{
    app::PRODUCER_STOP_TIMEOUT,
    sources::{make_source, SOURCE_NAMES},
};
use status::render_status;
use xy::render_xy;

/// One drawn sample: (x, y)
pub type ScopePoint = (f32, f32);

/// Points kept on screen
const TRAIL_LENGTH: usize = 2048;

/// Keyboard row → semitone offset from the octave's C
const NOTE_KEYS: [(char, u8); 13] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
];

/// MIDI channel the keyboard plays on
const MIDI_CHANNEL: u8 = 0;
const NOTE_VELOCITY: u8 = 100;
/// Pitch bend per key press: a semitone with the default wheel range
const BEND_STEP: i16 = 4096;

/// Effects toggled by the number keys, by id
const TOGGLE_KEYS: [(char, &str); 3] = [('1', "delay"), ('2', "smooth"), ('3', "bitcrush")];

/// UI application state
pub struct UiApp {
    note_tx: Producer<SynthMessage>,
    point_rx: Consumer<ScopePoint>,
    effects: EffectChain,
    producer: FrameProducer,
    trail: Vec<(f64, f64)>,
    held: [bool; 128],
    octave: u8,
    source: usize,
    spinning: bool,
    bend: i16,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        note_tx: Producer<SynthMessage>,
        point_rx: Consumer<ScopePoint>,
        effects: EffectChain,
        producer: FrameProducer,
    ) -> Self {
        Self {
            note_tx,
            point_rx,
            effects,
            producer,
            trail: Vec::with_capacity(TRAIL_LENGTH * 2),
            held: [false; 128],
            octave: 4,
            source: 0,
            spinning: false,
            bend: 0,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_points();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.send_midi([0xB0 | MIDI_CHANNEL, 123, 0]);
        if !self.producer.stop(PRODUCER_STOP_TIMEOUT) {
            warn!("frame producer still busy at exit");
        }
        Ok(())
    }

    /// Pull new points from the audio thread, keeping the last TRAIL_LENGTH
    fn poll_points(&mut self) {
        while let Ok((x, y)) = self.point_rx.pop() {
            self.trail.push((x as f64, y as f64));
        }
        if self.trail.len() > TRAIL_LENGTH {
            let excess = self.trail.len() - TRAIL_LENGTH;
            self.trail.drain(0..excess);
        }
    }

    fn send(&mut self, msg: SynthMessage) {
        if self.note_tx.push(msg).is_err() {
            warn!("synth message queue full; dropped {:?}", msg);
        }
    }

    /// Decode a raw MIDI message and forward what the synth understands.
    fn send_midi(&mut self, bytes: [u8; 3]) {
        if let Some(msg) = MidiEvent::from_bytes(&bytes).and_then(|event| event.to_synth(MIDI_CHANNEL)) {
            self.send(msg);
        }
    }

    fn set_bend(&mut self, bend: i16) {
        self.bend = bend.clamp(-8192, 8191);
        let raw = (self.bend as i32 + 8192) as u16;
        self.send_midi([0xE0 | MIDI_CHANNEL, (raw & 0x7F) as u8, (raw >> 7) as u8]);
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                self.held = [false; 128];
                self.send_midi([0xB0 | MIDI_CHANNEL, 123, 0]);
            }
            KeyCode::Char('-') => self.set_bend(self.bend.saturating_sub(BEND_STEP)),
            KeyCode::Char('=') => self.set_bend(self.bend.saturating_add(BEND_STEP)),
            KeyCode::Char('0') => self.set_bend(0),
            KeyCode::Char('z') => self.octave = self.octave.saturating_sub(1).max(1),
            KeyCode::Char('x') => self.octave = (self.octave + 1).min(8),
            KeyCode::Tab => {
                self.source = (self.source + 1) % SOURCE_NAMES.len();
                info!("switching source to {}", SOURCE_NAMES[self.source]);
                self.producer.set_source(make_source(self.source));
            }
            KeyCode::Char('r') => {
                self.spinning = !self.spinning;
                if let Some(speed) = self
                    .effects
                    .get("rotate")
                    .and_then(|rotate| rotate.parameter("rotateSpeed").cloned())
                {
                    speed.set_value(if self.spinning { 0.25 } else { 0.0 });
                }
            }
            KeyCode::Char(c) => {
                if let Some(&(_, id)) = TOGGLE_KEYS.iter().find(|(k, _)| *k == c) {
                    if let Some(effect) = self.effects.get(id) {
                        effect.set_enabled(!effect.is_enabled());
                    }
                } else if let Some(&(_, semitone)) = NOTE_KEYS.iter().find(|(k, _)| *k == c) {
                    self.toggle_note(self.octave * 12 + 12 + semitone);
                }
            }
            _ => {}
        }
    }

    /// Terminals report presses but not releases, so keys latch.
    fn toggle_note(&mut self, note: u8) {
        let note = note.min(127);
        let held = &mut self.held[note as usize];
        *held = !*held;
        let status = if *held { 0x90 } else { 0x80 };
        self.send_midi([status | MIDI_CHANNEL, note, NOTE_VELOCITY]);
    }

    fn held_notes(&self) -> Vec<u8> {
        (0u8..128).filter(|&n| self.held[n as usize]).collect()
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(32)])
            .split(rows[0]);

        render_xy(frame, columns[0], &self.trail);

        let effects: Vec<EffectHandle> = self.effects.handles();
        render_status(
            frame,
            columns[1],
            SOURCE_NAMES[self.source],
            self.octave,
            &self.held_notes(),
            &effects,
            self.spinning,
            self.bend as f32 / 8192.0 * PITCH_BEND_RANGE_CENTS,
        );

        let help = Paragraph::new(
            " [A-K] Notes  [Z/X] Octave  [1-3] Effects  [R] Spin  [-/=/0] Bend  [Tab] Source  [Space] Stop  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[1]);
    }
}
