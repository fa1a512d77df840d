//! Trail playback engine.
//!
//! Replays a path as a moving position feed: after each segment's travel
//! time (`distance / speed`) the engine emits the segment's end point, and
//! after the last point it emits `Completed`.
//!
//! Every run carries a `RunId`. Cancelling or restarting clears the active
//! run under the engine lock, and the timer task re-checks the id under the
//! same lock before emitting, so a timer that fires late is a no-op.

use crate::geo::{distance, GeoPoint};
use crate::playback::types::{PlaybackError, PlaybackEvent, PlaybackState, RunId};
use crossbeam::channel::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Plays one path at a time along simulated time.
pub struct PlaybackEngine {
    shared: Arc<Mutex<Shared>>,
}

struct Shared {
    state: PlaybackState,
    /// Run whose timer may still emit
    active: Option<RunId>,
    /// Last run id handed out
    last_run: RunId,
    /// Index of the last point reached by the current or last run
    index: usize,
    task: Option<JoinHandle<()>>,
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl Shared {
    fn emit(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Stop the active run, if any. Returns the cancelled run.
    fn cancel_active(&mut self) -> Option<RunId> {
        if self.state != PlaybackState::Running {
            return None;
        }
        let run = self.active.take()?;

        self.state = PlaybackState::Cancelled;
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let index = self.index;
        self.emit(PlaybackEvent::Cancelled { run, index });
        tracing::info!("Playback run {} cancelled at point {}", run, index);
        Some(run)
    }
}

impl PlaybackEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: PlaybackState::Idle,
                active: None,
                last_run: 0,
                index: 0,
                task: None,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock_shared(&self.shared)
    }

    /// Get a receiver for playback events.
    ///
    /// Every subscriber sees every event emitted after it subscribed.
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    /// Index of the last path point reached (0 right after `start`).
    pub fn current_index(&self) -> usize {
        self.lock().index
    }

    /// The running run, if any.
    pub fn active_run(&self) -> Option<RunId> {
        self.lock().active
    }

    /// Start playing `path` at `speed_mps` meters per second.
    ///
    /// A running run is cancelled first. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self, path: &[GeoPoint], speed_mps: f64) -> Result<RunId, PlaybackError> {
        if path.len() < 2 {
            return Err(PlaybackError::PathTooShort(path.len()));
        }
        if !speed_mps.is_finite() || speed_mps <= 0.0 {
            return Err(PlaybackError::InvalidSpeed(speed_mps));
        }
        for (index, point) in path.iter().enumerate() {
            point
                .validate()
                .map_err(|reason| PlaybackError::InvalidPoint { index, reason })?;
        }

        let delays = segment_delays(path, speed_mps)?;
        let total = total_delay(&delays, speed_mps)?;
        // The task's last deadline must be representable
        if Instant::now().checked_add(total).is_none() {
            return Err(PlaybackError::InvalidSpeed(speed_mps));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::NoRuntime(e.to_string()))?;

        let mut shared = self.lock();
        shared.cancel_active();

        shared.last_run += 1;
        let run = shared.last_run;
        shared.active = Some(run);
        shared.state = PlaybackState::Running;
        shared.index = 0;
        shared.emit(PlaybackEvent::Started {
            run,
            total_points: path.len(),
            start: path[0],
        });

        tracing::info!(
            "Playback run {} started: {} points at {:.2} m/s, {:.1}s total",
            run,
            path.len(),
            speed_mps,
            total.as_secs_f64()
        );

        let started = Instant::now();
        let points = path.to_vec();
        let task_shared = Arc::clone(&self.shared);
        shared.task = Some(runtime.spawn(async move {
            let mut deadline = started;
            for (segment, delay) in delays.into_iter().enumerate() {
                // Absolute deadlines keep rounding from accumulating
                deadline += delay;
                tokio::time::sleep_until(deadline).await;

                let index = segment + 1;
                if !arrive(&task_shared, run, index, points[index], started.elapsed(), points.len())
                {
                    return;
                }
            }
        }));

        Ok(run)
    }

    /// Cancel the running run. A no-op unless `Running`.
    ///
    /// Returns the cancelled run id. Once this returns, the cancelled run
    /// emits nothing further.
    pub fn cancel(&self) -> Option<RunId> {
        self.lock().cancel_active()
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        let mut shared = self.lock();
        shared.active = None;
        if let Some(task) = shared.task.take() {
            task.abort();
        }
    }
}

fn lock_shared(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // The state stays consistent even if a subscriber panicked mid-emit
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Record arrival of `run` at `path[index]`. Returns whether the run goes on.
///
/// Does nothing when `run` is no longer the active run.
fn arrive(
    shared: &Mutex<Shared>,
    run: RunId,
    index: usize,
    position: GeoPoint,
    elapsed: Duration,
    total_points: usize,
) -> bool {
    let mut shared = lock_shared(shared);
    if shared.active != Some(run) {
        tracing::debug!("Dropping stale tick of run {}", run);
        return false;
    }

    shared.index = index;
    shared.emit(PlaybackEvent::Position {
        run,
        index,
        position,
        elapsed,
    });
    tracing::debug!("Run {} reached point {} at {}", run, index, position);

    if index + 1 < total_points {
        return true;
    }

    shared.state = PlaybackState::Completed;
    shared.active = None;
    shared.task = None;
    shared.emit(PlaybackEvent::Completed { run, elapsed });
    tracing::info!(
        "Playback run {} completed after {:.1}s",
        run,
        elapsed.as_secs_f64()
    );
    false
}

/// Travel time of each segment at `speed_mps`.
pub fn segment_delays(path: &[GeoPoint], speed_mps: f64) -> Result<Vec<Duration>, PlaybackError> {
    path.windows(2)
        .map(|pair| {
            Duration::try_from_secs_f64(distance(pair[0], pair[1]) / speed_mps)
                .map_err(|_| PlaybackError::InvalidSpeed(speed_mps))
        })
        .collect()
}

/// Total travel time of `path` at `speed_mps`.
pub fn expected_duration(path: &[GeoPoint], speed_mps: f64) -> Result<Duration, PlaybackError> {
    total_delay(&segment_delays(path, speed_mps)?, speed_mps)
}

fn total_delay(delays: &[Duration], speed_mps: f64) -> Result<Duration, PlaybackError> {
    delays
        .iter()
        .try_fold(Duration::ZERO, |total, delay| total.checked_add(*delay))
        .ok_or(PlaybackError::InvalidSpeed(speed_mps))
}
