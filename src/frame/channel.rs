/*
Frame Channel
=============

Frames are built on a slow thread (parsing, generating) and consumed on the
audio thread. The channel between them has two rules:

  1. The audio thread never waits. `take_latest` is a handful of atomic
     loads and returns immediately, frame or not.
  2. The audio thread never frees a frame. Dropping the last `Arc<Frame>`
     deallocates every shape; that work belongs to the producer.

So there are two rings:

      producer thread                          audio thread
    ┌────────────────┐   frames (capacity N)  ┌──────────────┐
    │ FramePublisher │ ─────────────────────▶ │ FrameReceiver │
    │                │ ◀───────────────────── │              │
    └────────────────┘   retired frames       └──────────────┘

Every frame the audio side is done with (skipped in favour of a newer one,
or replaced in a voice) travels back on the retire ring and is dropped the
next time the publisher runs.

Latest wins
-----------

Only the newest queued frame matters. `take_latest` drains the ring and
retires everything but the last one. If the producer outruns the consumer
the ring fills and `try_publish` hands the frame back as `Full`; the
producer decides whether to wait (`publish_timeout`) or drop it.

Generations
-----------

Each queued frame is stamped with the channel generation at publish time.
Bumping the generation (on a source switch) makes every frame already in
flight stale; the receiver retires stale frames instead of returning them.

Shutdown
--------

`shutdown` from either side marks the channel dead and unparks a producer
waiting for capacity. Dropping the receiver shuts the channel down, so a
producer whose consumer is gone stops instead of waiting forever.
*/

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread::{self, Thread},
    time::{Duration, Instant},
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    error::{PublishError, Result, ScopeError},
    shape::Frame,
};

/// Default number of frames that can be in flight.
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = 4;

/// Room on the retire ring on top of the frame capacity. Voices hand back
/// the frames they replace, so this covers a full voice pool swapping in one
/// block.
const RETIRE_HEADROOM: usize = 64;

const MIN_BACKOFF: Duration = Duration::from_micros(250);
const MAX_BACKOFF: Duration = Duration::from_millis(10);

struct Stamped {
    generation: u64,
    frame: Arc<Frame>,
}

pub(crate) struct ChannelShared {
    alive: AtomicBool,
    generation: AtomicU64,
    // Only ever locked by the publishing side; the receiver uses try_lock.
    waiter: Mutex<Option<Thread>>,
}

impl ChannelShared {
    fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);
        if let Ok(waiter) = self.waiter.try_lock() {
            if let Some(thread) = waiter.as_ref() {
                thread.unpark();
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Make every frame published so far stale.
    pub(crate) fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Producer end of a frame channel.
pub struct FramePublisher {
    frames: Producer<Stamped>,
    retired: Consumer<Arc<Frame>>,
    shared: Arc<ChannelShared>,
    generation: u64,
}

/// Audio-thread end of a frame channel.
pub struct FrameReceiver {
    frames: Consumer<Stamped>,
    retired: Producer<Arc<Frame>>,
    // Frames that did not fit on the retire ring, flushed next call.
    overflow: Vec<Arc<Frame>>,
    shared: Arc<ChannelShared>,
}

/// Create a channel holding up to `capacity` unread frames.
pub fn frame_channel(capacity: usize) -> Result<(FramePublisher, FrameReceiver)> {
    if capacity == 0 {
        return Err(ScopeError::ZeroCapacity);
    }

    let (frame_tx, frame_rx) = RingBuffer::new(capacity);
    let (retire_tx, retire_rx) = RingBuffer::new(capacity + RETIRE_HEADROOM);
    let shared = Arc::new(ChannelShared {
        alive: AtomicBool::new(true),
        generation: AtomicU64::new(0),
        waiter: Mutex::new(None),
    });

    Ok((
        FramePublisher {
            frames: frame_tx,
            retired: retire_rx,
            shared: shared.clone(),
            generation: 0,
        },
        FrameReceiver {
            frames: frame_rx,
            retired: retire_tx,
            overflow: Vec::with_capacity(capacity + RETIRE_HEADROOM),
            shared,
        },
    ))
}

impl FramePublisher {
    /// Queue a frame without waiting.
    pub fn try_publish(&mut self, frame: Arc<Frame>) -> std::result::Result<(), PublishError> {
        self.collect_retired();

        if self.is_closed() {
            return Err(PublishError::Closed(frame));
        }

        let stamped = Stamped {
            generation: self.generation,
            frame,
        };
        match self.frames.push(stamped) {
            Ok(()) => Ok(()),
            Err(PushError::Full(stamped)) => Err(PublishError::Full(stamped.frame)),
        }
    }

    /// Queue a frame, waiting up to `timeout` for a free slot.
    ///
    /// Waits by parking with a growing timeout. `shutdown` wakes the waiting
    /// thread straight away.
    pub fn publish_timeout(
        &mut self,
        frame: Arc<Frame>,
        timeout: Duration,
    ) -> std::result::Result<(), PublishError> {
        let deadline = Instant::now() + timeout;
        let mut backoff = MIN_BACKOFF;
        let mut frame = frame;
        self.register_waiter();

        loop {
            match self.try_publish(frame) {
                Ok(()) => return Ok(()),
                Err(PublishError::Full(rejected)) => frame = rejected,
                Err(closed) => return Err(closed),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PublishError::Full(frame));
            }
            thread::park_timeout(backoff.min(deadline - now));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Drop every frame the receiver has handed back. Returns how many.
    pub fn collect_retired(&mut self) -> usize {
        let mut count = 0;
        while let Ok(frame) = self.retired.pop() {
            drop(frame);
            count += 1;
        }
        count
    }

    /// Register the calling thread to be unparked by `shutdown`.
    pub fn register_waiter(&self) {
        if let Ok(mut waiter) = self.shared.waiter.lock() {
            *waiter = Some(thread::current());
        }
    }

    /// Mark frames published so far stale and stamp new ones afresh.
    pub fn invalidate_queued(&mut self) {
        self.generation = self.shared.advance_generation();
    }

    /// Adopt a generation bumped elsewhere (see [`invalidate_queued`](Self::invalidate_queued)).
    pub(crate) fn sync_generation(&mut self) {
        self.generation = self.shared.generation.load(Ordering::Acquire);
    }

    /// Stamp new frames with `generation`, taken when a source was queued.
    pub(crate) fn adopt_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub(crate) fn shared(&self) -> Arc<ChannelShared> {
        self.shared.clone()
    }

    /// Frames that can be published right now.
    pub fn free_slots(&self) -> usize {
        self.frames.slots()
    }

    pub fn is_closed(&self) -> bool {
        !self.shared.is_alive() || self.frames.is_abandoned()
    }

    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl FrameReceiver {
    /// Newest current frame not yet taken, if any. Never blocks.
    ///
    /// Older queued frames, and frames from a previous generation, are
    /// retired.
    pub fn take_latest(&mut self) -> Option<Arc<Frame>> {
        self.flush_overflow();

        let current = self.shared.generation.load(Ordering::Acquire);
        let mut latest: Option<Arc<Frame>> = None;

        while let Ok(stamped) = self.frames.pop() {
            if stamped.generation < current {
                self.retire(stamped.frame);
                continue;
            }
            if let Some(older) = latest.replace(stamped.frame) {
                self.retire(older);
            }
        }

        latest
    }

    /// Hand a frame back to the producer side to be freed there.
    pub fn retire(&mut self, frame: Arc<Frame>) {
        if let Err(PushError::Full(frame)) = self.retired.push(frame) {
            if self.overflow.len() < self.overflow.capacity() {
                self.overflow.push(frame);
            }
            // Otherwise the frame is dropped here. Only reachable when the
            // producer has stopped collecting for a long time.
        }
    }

    fn flush_overflow(&mut self) {
        while let Some(frame) = self.overflow.pop() {
            if let Err(PushError::Full(frame)) = self.retired.push(frame) {
                self.overflow.push(frame);
                break;
            }
        }
    }

    /// Frames waiting to be taken.
    pub fn pending(&self) -> usize {
        self.frames.slots()
    }

    pub fn is_closed(&self) -> bool {
        !self.shared.is_alive() || self.frames.is_abandoned()
    }

    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sides: usize) -> Arc<Frame> {
        Arc::new(Frame::polygon(sides, 1.0, 0.0))
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(frame_channel(0), Err(ScopeError::ZeroCapacity)));
    }

    #[test]
    fn publishing_without_reader_never_blocks() {
        let (mut publisher, _receiver) = frame_channel(DEFAULT_FRAME_QUEUE_CAPACITY).unwrap();
        let start = Instant::now();
        let mut full = 0;
        for i in 0..1000 {
            if let Err(err) = publisher.try_publish(frame(3 + i % 5)) {
                assert!(!err.is_closed());
                full += 1;
            }
        }
        assert_eq!(full, 1000 - DEFAULT_FRAME_QUEUE_CAPACITY);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn take_latest_returns_newest_and_retires_the_rest() {
        let (mut publisher, mut receiver) = frame_channel(4).unwrap();
        assert!(receiver.take_latest().is_none());

        for sides in [3, 4, 5] {
            publisher.try_publish(frame(sides)).unwrap();
        }
        let latest = receiver.take_latest().unwrap();
        assert_eq!(latest.shape_count(), 5);
        assert!(receiver.take_latest().is_none());

        assert_eq!(publisher.collect_retired(), 2);
    }

    #[test]
    fn retired_frames_are_dropped_by_publisher() {
        let (mut publisher, mut receiver) = frame_channel(2).unwrap();
        let tracked = frame(3);
        let weak = Arc::downgrade(&tracked);

        publisher.try_publish(tracked).unwrap();
        let taken = receiver.take_latest().unwrap();
        receiver.retire(taken);
        assert!(weak.upgrade().is_some());

        publisher.collect_retired();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let (mut publisher, mut receiver) = frame_channel(4).unwrap();
        publisher.try_publish(frame(3)).unwrap();
        publisher.try_publish(frame(4)).unwrap();

        publisher.invalidate_queued();
        assert!(receiver.take_latest().is_none());

        publisher.try_publish(frame(6)).unwrap();
        assert_eq!(receiver.take_latest().unwrap().shape_count(), 6);
    }

    #[test]
    fn shutdown_wakes_waiting_publisher() {
        let (mut publisher, receiver) = frame_channel(1).unwrap();
        publisher.try_publish(frame(3)).unwrap();

        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let result = publisher.publish_timeout(frame(4), Duration::from_secs(10));
            (result.map_err(|e| e.is_closed()), start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        receiver.shutdown();

        let (result, elapsed) = waiter.join().unwrap();
        assert_eq!(result, Err(true));
        assert!(elapsed < Duration::from_secs(5), "waited {:?}", elapsed);
    }

    #[test]
    fn dropping_receiver_closes_channel() {
        let (mut publisher, receiver) = frame_channel(2).unwrap();
        drop(receiver);
        assert!(publisher.is_closed());
        assert!(publisher.try_publish(frame(3)).unwrap_err().is_closed());
    }

    #[test]
    fn publish_timeout_gives_up_when_full() {
        let (mut publisher, _receiver) = frame_channel(1).unwrap();
        publisher.try_publish(frame(3)).unwrap();
        let err = publisher
            .publish_timeout(frame(4), Duration::from_millis(20))
            .unwrap_err();
        assert!(!err.is_closed());
        assert_eq!(err.into_frame().shape_count(), 4);
    }
}
