//! Getting frames from wherever they are made to the audio thread.
//!
//! - [`FrameSource`]: produces frames (parsers, generators)
//! - [`FrameProducer`]: background thread driving a source
//! - [`frame_channel`]: lock-free latest-frame handoff to the audio thread

#[cfg(feature = "rtrb")]
pub mod channel;
#[cfg(feature = "rtrb")]
pub mod producer;
pub mod source;

#[cfg(feature = "rtrb")]
pub use channel::{frame_channel, FramePublisher, FrameReceiver, DEFAULT_FRAME_QUEUE_CAPACITY};
#[cfg(feature = "rtrb")]
pub use producer::FrameProducer;
pub use source::{FallibleSource, FrameSource, ProceduralSource, StaticSource};
