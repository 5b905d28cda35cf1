use crate::dsp::envelope::DahdsrParams;

/// Control messages sent to the synth from UI, MIDI or sequencer threads.
///
/// Applied at the start of the next block.
#[derive(Debug, Copy, Clone)]
pub enum SynthMessage {
    /// `velocity` in 0.0 to 1.0.
    NoteOn { note: u8, velocity: f32 },
    NoteOff { note: u8 },
    PitchBend { cents: f32 },
    AllNotesOff,
    /// Envelope shape for every voice, sounding ones included.
    SetEnvelope(DahdsrParams),
    /// Whether note-off releases through the envelope or cuts.
    SetTailOff(bool),
}
