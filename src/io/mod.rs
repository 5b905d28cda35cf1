// Purpose - external interfaces: output buffers and MIDI input

pub mod buffer;
pub mod midi;

pub use buffer::ScopeBuffer;
pub use midi::MidiEvent;
