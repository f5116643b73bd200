//! Background polling of the selected backend
//!
//! A single worker thread polls the fetcher and swaps each successful result
//! into a shared slot. Readers load the slot without locking; the worker is
//! the only writer.

use crate::error::{FetchError, SessionError};
use crate::TrackFetcher;
use arc_swap::ArcSwapOption;
use nowtoast_core::{ListenerConfig, TrackSnapshot};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

type Slot = Arc<ArcSwapOption<TrackSnapshot>>;

/// Read-only handle to the latest published snapshot
#[derive(Clone)]
pub struct SnapshotReader {
    slot: Slot,
}

impl SnapshotReader {
    /// Latest snapshot, or `None` until the first successful poll. Never blocks.
    pub fn current_snapshot(&self) -> Option<Arc<TrackSnapshot>> {
        self.slot.load_full()
    }
}

/// Write side of the slot; only ever owned by the running worker
struct SnapshotWriter {
    slot: Slot,
}

impl SnapshotWriter {
    fn publish(&self, snapshot: TrackSnapshot) {
        self.slot.store(Some(Arc::new(snapshot)));
    }
}

struct Worker {
    // dropping the sender wakes the worker and ends its loop
    _stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct WorkerState {
    current: Option<Worker>,
    /// stopped workers that may still be inside a poll
    retired: Vec<JoinHandle<()>>,
}

pub struct MediaListener {
    fetcher: Arc<dyn TrackFetcher>,
    interval: Duration,
    slot: Slot,
    state: Mutex<WorkerState>,
}

impl MediaListener {
    pub fn new(fetcher: Box<dyn TrackFetcher>, interval: Duration) -> Self {
        Self {
            fetcher: Arc::from(fetcher),
            interval,
            slot: Arc::new(ArcSwapOption::empty()),
            state: Mutex::new(WorkerState::default()),
        }
    }

    /// Detect the host, pick its backend and build a listener for it
    pub fn for_current_platform(config: &ListenerConfig) -> Result<Self, SessionError> {
        let fetcher = crate::create_fetcher(config)?;
        Ok(Self::new(fetcher, config.poll_interval()))
    }

    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// See [`SnapshotReader::current_snapshot`]
    pub fn current_snapshot(&self) -> Option<Arc<TrackSnapshot>> {
        self.slot.load_full()
    }

    pub fn is_running(&self) -> bool {
        self.lock_state()
            .current
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Start polling. Does nothing when already running.
    ///
    /// A worker from an earlier `stop` is joined first, which can block for
    /// the rest of its in-flight poll. The state lock is not held meanwhile.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut state = loop {
            let mut state = self.lock_state();
            if let Some(worker) = &state.current {
                if !worker.handle.is_finished() {
                    return Ok(());
                }
            }
            if let Some(dead) = state.current.take() {
                state.retired.push(dead.handle);
            }
            if state.retired.is_empty() {
                break state;
            }

            let retired = std::mem::take(&mut state.retired);
            drop(state);
            join_all(retired);
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let writer = SnapshotWriter {
            slot: Arc::clone(&self.slot),
        };
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("media-listener".to_string())
            .spawn(move || poll_loop(fetcher.as_ref(), &writer, &stop_rx, interval))
            .map_err(SessionError::Spawn)?;

        info!(
            "Media listener started ({}, every {}ms)",
            self.fetcher.name(),
            interval.as_millis()
        );
        state.current = Some(Worker {
            _stop_tx: stop_tx,
            handle,
        });
        Ok(())
    }

    /// Ask the worker to exit after its current poll. Does not wait.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        if let Some(worker) = state.current.take() {
            state.retired.push(worker.handle);
            info!("Media listener stopping");
        }
    }

    /// Stop and wait for the worker to exit
    pub fn shutdown(&self) {
        let retired = {
            let mut state = self.lock_state();
            if let Some(worker) = state.current.take() {
                state.retired.push(worker.handle);
            }
            std::mem::take(&mut state.retired)
        };
        join_all(retired);
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MediaListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            warn!("Media listener thread panicked");
        }
    }
}

fn poll_loop(fetcher: &dyn TrackFetcher, writer: &SnapshotWriter, stop_rx: &mpsc::Receiver<()>, interval: Duration) {
    loop {
        match poll_once(fetcher) {
            Ok(snapshot) => writer.publish(snapshot),
            Err(e) => debug!("Media poll failed ({}): {}", fetcher.name(), e),
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Media listener thread exiting");
}

fn poll_once(fetcher: &dyn TrackFetcher) -> Result<TrackSnapshot, FetchError> {
    panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch_current_track()))
        .unwrap_or_else(|payload| Err(FetchError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
