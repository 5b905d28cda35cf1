use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    error::{PublishError, Result},
    frame::{
        channel::{ChannelShared, FramePublisher},
        source::FrameSource,
    },
};

/// How long `Drop` waits for the thread before detaching it.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(500);

const MIN_BACKOFF: Duration = Duration::from_micros(500);
const MAX_BACKOFF: Duration = Duration::from_millis(20);
const IDLE_WAIT: Duration = Duration::from_millis(20);

struct ProducerControl {
    running: AtomicBool,
    finished: AtomicBool,
    // Next source and the channel generation its frames are stamped with.
    pending_source: Mutex<Option<(u64, Box<dyn FrameSource>)>>,
}

impl ProducerControl {
    /// Queue `source` under a fresh generation. Both change under one lock,
    /// so the thread never pairs a source with another source's generation.
    fn offer(&self, channel: &ChannelShared, source: Box<dyn FrameSource>) {
        if let Ok(mut pending) = self.pending_source.lock() {
            let generation = channel.advance_generation();
            *pending = Some((generation, source));
        }
    }

    fn take_pending(&self) -> Option<(u64, Box<dyn FrameSource>)> {
        self.pending_source.lock().ok()?.take()
    }
}

/// Sets `finished` however the thread exits, panics included.
struct FinishGuard(Arc<ProducerControl>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finished.store(true, Ordering::Release);
    }
}

/// Background thread pulling frames from a [`FrameSource`] into a channel.
pub struct FrameProducer {
    control: Arc<ProducerControl>,
    channel: Arc<ChannelShared>,
    handle: Option<JoinHandle<()>>,
}

impl FrameProducer {
    /// Start a producer thread feeding `publisher` from `source`.
    pub fn spawn(source: Box<dyn FrameSource>, publisher: FramePublisher) -> Result<Self> {
        let control = Arc::new(ProducerControl {
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            pending_source: Mutex::new(None),
        });
        let channel = publisher.shared();

        let thread_control = control.clone();
        let handle = thread::Builder::new()
            .name("frame-producer".into())
            .spawn(move || run(thread_control, source, publisher))?;

        Ok(Self {
            control,
            channel,
            handle: Some(handle),
        })
    }

    /// Switch to a new source. Frames from the old one that have not been
    /// taken yet are discarded.
    pub fn set_source(&self, source: Box<dyn FrameSource>) {
        self.control.offer(&self.channel, source);
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.control.finished.load(Ordering::Acquire)
    }

    /// Ask the thread to stop and wait up to `timeout` for it.
    ///
    /// Returns `false` if the thread did not finish in time. It is then
    /// detached: it exits on its own once the source returns.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.control.running.store(false, Ordering::Release);

        let Some(handle) = self.handle.take() else {
            return true;
        };
        handle.thread().unpark();

        let deadline = Instant::now() + timeout;
        while !self.control.finished.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                warn!(
                    "frame producer did not stop within {:?}; detaching thread",
                    timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }

        if handle.join().is_err() {
            warn!("frame producer thread panicked");
        }
        true
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        self.stop(DEFAULT_STOP_TIMEOUT);
    }
}

fn run(control: Arc<ProducerControl>, mut source: Box<dyn FrameSource>, mut publisher: FramePublisher) {
    let _guard = FinishGuard(control.clone());
    publisher.register_waiter();
    publisher.sync_generation();
    info!("frame producer started with source '{}'", source.name());

    let mut backoff = MIN_BACKOFF;
    let mut published: u64 = 0;

    while control.running.load(Ordering::Acquire) {
        if let Some((generation, next)) = control.take_pending() {
            info!("frame producer switching '{}' -> '{}'", source.name(), next.name());
            source = next;
            publisher.adopt_generation(generation);
            backoff = MIN_BACKOFF;
        }

        if publisher.is_closed() {
            debug!("frame channel closed; producer exiting");
            break;
        }

        if !source.is_active() {
            publisher.collect_retired();
            thread::park_timeout(IDLE_WAIT);
            continue;
        }

        // Wait for room before building, so frames are as fresh as possible.
        if publisher.free_slots() == 0 {
            publisher.collect_retired();
            thread::park_timeout(backoff);
            backoff = (backoff * 2).min(MAX_BACKOFF);
            continue;
        }

        let frame = Arc::new(source.next_frame());
        match publisher.try_publish(frame) {
            Ok(()) => {
                published += 1;
                backoff = MIN_BACKOFF;
            }
            Err(PublishError::Full(_)) => {
                thread::park_timeout(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(PublishError::Closed(_)) => {
                debug!("frame channel closed; producer exiting");
                break;
            }
        }
    }

    publisher.collect_retired();
    info!("frame producer stopped after {} frames", published);
}
