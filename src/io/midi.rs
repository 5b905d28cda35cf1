use crate::synth::message::SynthMessage;

/// Pitch-bend wheel range in cents, either direction.
pub const PITCH_BEND_RANGE_CENTS: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Centred at 0, -8192..=8191.
    PitchBend { channel: u8, value: i16 },
}

const ALL_NOTES_OFF: u8 = 123;

impl MidiEvent {
    /// Decode one channel voice message. Anything else (system messages,
    /// running status, short reads) yields `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;

        match (status & 0xF0, data) {
            // Note-on with velocity 0 is a note-off by convention
            (0x90, &[key, 0, ..]) => Some(MidiEvent::NoteOff {
                channel,
                key: key & 0x7F,
                velocity: 0,
            }),
            (0x90, &[key, velocity, ..]) => Some(MidiEvent::NoteOn {
                channel,
                key: key & 0x7F,
                velocity: velocity & 0x7F,
            }),
            (0x80, &[key, velocity, ..]) => Some(MidiEvent::NoteOff {
                channel,
                key: key & 0x7F,
                velocity: velocity & 0x7F,
            }),
            (0xB0, &[controller, value, ..]) => Some(MidiEvent::ControlChange {
                channel,
                controller: controller & 0x7F,
                value: value & 0x7F,
            }),
            (0xE0, &[lsb, msb, ..]) => {
                let raw = ((msb as i16 & 0x7F) << 7) | (lsb as i16 & 0x7F);
                Some(MidiEvent::PitchBend {
                    channel,
                    value: raw - 8192,
                })
            }
            _ => None,
        }
    }

    /// The synth message for this event, if it is on `channel_filter` and the
    /// synth cares about it.
    pub fn to_synth(self, channel_filter: u8) -> Option<SynthMessage> {
        match self {
            MidiEvent::NoteOn {
                channel,
                key,
                velocity,
            } if channel == channel_filter => Some(SynthMessage::NoteOn {
                note: key,
                velocity: velocity as f32 / 127.0,
            }),
            MidiEvent::NoteOff { channel, key, .. } if channel == channel_filter => {
                Some(SynthMessage::NoteOff { note: key })
            }
            MidiEvent::ControlChange {
                channel,
                controller: ALL_NOTES_OFF,
                ..
            } if channel == channel_filter => Some(SynthMessage::AllNotesOff),
            MidiEvent::PitchBend { channel, value } if channel == channel_filter => {
                Some(SynthMessage::PitchBend {
                    cents: value as f32 / 8192.0 * PITCH_BEND_RANGE_CENTS,
                })
            }
            _ => None,
        }
    }
}
