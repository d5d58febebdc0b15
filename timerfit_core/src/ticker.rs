//! Periodic tick sources that drive the timer engine.
//!
//! The engine never sleeps or spawns threads itself. It asks a [`TickSource`]
//! for a repeating callback and keeps the returned [`TickHandle`] to cancel it.
//! Two sources are provided:
//! - [`ThreadTickSource`] fires from a background thread on a monotonic clock
//! - [`ManualTickSource`] fires only when told to, for tests and simulation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Callback invoked once per tick
pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// Something that can run a callback every `interval` until cancelled
pub trait TickSource: Send + Sync {
    fn schedule(&self, interval: Duration, on_tick: TickFn) -> Box<dyn TickHandle>;
}

/// Cancellation handle for one scheduled tick process.
///
/// Once `cancel` returns the source will not start another invocation of the
/// callback. An invocation already in progress on another thread may still
/// finish; callers that share state with the callback must guard against it.
/// `cancel` never waits for the callback, so it is safe to call from inside it.
/// Dropping a handle cancels it.
pub trait TickHandle: Send {
    fn cancel(&mut self);
}

/// Lock a mutex, recovering the data if a panicking holder poisoned it
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Thread-backed source
// ============================================================================

/// Fires callbacks from one background thread per scheduled process.
///
/// Deadlines are computed as `start + n * interval` on [`Instant`], so a slow
/// callback delays the next tick but does not shift the ones after it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadTickSource;

impl ThreadTickSource {
    pub fn new() -> Self {
        Self
    }
}

impl TickSource for ThreadTickSource {
    fn schedule(&self, interval: Duration, mut on_tick: TickFn) -> Box<dyn TickHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("timerfit-tick".into())
            .spawn(move || {
                let started = Instant::now();
                let mut fired: u32 = 0;
                loop {
                    fired = fired.saturating_add(1);
                    let deadline = started + interval * fired;
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // Explicit stop or the handle was dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if stop_rx.try_recv().is_ok() {
                        break;
                    }
                    on_tick();
                }
                tracing::trace!("Tick thread exiting after {} ticks", fired - 1);
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn tick thread: {}", e);
        }

        Box::new(ThreadTickHandle {
            stop: Some(stop_tx),
        })
    }
}

struct ThreadTickHandle {
    stop: Option<Sender<()>>,
}

impl TickHandle for ThreadTickHandle {
    fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The thread may already be gone; nothing to do then
            let _ = stop.send(());
        }
    }
}

impl Drop for ThreadTickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Manual source
// ============================================================================

struct ManualSlot {
    cancelled: AtomicBool,
    on_tick: Mutex<TickFn>,
}

/// Tick source that only fires from [`ManualTickSource::advance`].
///
/// Clones share the same set of scheduled processes, so a test can hand one
/// clone to the engine and keep another to drive time forward.
#[derive(Clone, Default)]
pub struct ManualTickSource {
    slots: Arc<Mutex<Vec<Arc<ManualSlot>>>>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every live process `ticks` times, one tick at a time
    pub fn advance(&self, ticks: usize) {
        for _ in 0..ticks {
            self.fire_once();
        }
    }

    /// Number of scheduled processes that have not been cancelled
    pub fn active(&self) -> usize {
        lock_unpoisoned(&self.slots)
            .iter()
            .filter(|slot| !slot.cancelled.load(Ordering::SeqCst))
            .count()
    }

    fn fire_once(&self) {
        // Snapshot the live slots so callbacks can schedule or cancel freely
        let live: Vec<Arc<ManualSlot>> = {
            let mut slots = lock_unpoisoned(&self.slots);
            slots.retain(|slot| !slot.cancelled.load(Ordering::SeqCst));
            slots.clone()
        };

        for slot in live {
            if slot.cancelled.load(Ordering::SeqCst) {
                continue;
            }
            let mut on_tick = lock_unpoisoned(&slot.on_tick);
            (*on_tick)();
        }
    }
}

impl TickSource for ManualTickSource {
    fn schedule(&self, _interval: Duration, on_tick: TickFn) -> Box<dyn TickHandle> {
        let slot = Arc::new(ManualSlot {
            cancelled: AtomicBool::new(false),
            on_tick: Mutex::new(on_tick),
        });
        lock_unpoisoned(&self.slots).push(Arc::clone(&slot));
        Box::new(ManualTickHandle { slot })
    }
}

struct ManualTickHandle {
    slot: Arc<ManualSlot>,
}

impl TickHandle for ManualTickHandle {
    fn cancel(&mut self) {
        self.slot.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Drop for ManualTickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
