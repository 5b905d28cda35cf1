// Purpose: Voice management, polyphony, note handling
// This layer sits above traversal/effects/envelope and manages multiple voices

pub mod context;
pub mod message;
#[cfg(feature = "rtrb")]
pub mod poly;
pub mod voice;

pub use context::{midi_note_to_freq, RenderCtx};
pub use message::SynthMessage;
#[cfg(feature = "rtrb")]
pub use poly::PolySynth;
pub use voice::{Voice, VoiceState};
