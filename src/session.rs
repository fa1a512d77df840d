//! Start trail, end trail, submit review.
//!
//! A `TrailSession` loads a trail, plays it on a `PlaybackEngine`, and once
//! the run is over lets the caller record the completion and a review.

use crate::playback::{PlaybackEngine, PlaybackError, PlaybackEvent, RunId};
use crate::storage::{Database, StoreError};
use crate::trails::{ReviewId, Trail, TrailId, UserId};
use crossbeam::channel::Receiver;
use thiserror::Error;

/// How a session's run ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    InProgress,
    /// Reached the last point
    Completed,
    /// Cancelled before the last point
    Abandoned,
}

/// Errors related to trail sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Reviews are taken once the run is over
    #[error("Trail run still in progress")]
    StillRunning,
}

/// One user's run of one trail.
pub struct TrailSession<'e> {
    engine: &'e PlaybackEngine,
    events: Receiver<PlaybackEvent>,
    user_id: UserId,
    trail: Trail,
    run: RunId,
    outcome: RunOutcome,
    completion_recorded: bool,
}

impl<'e> TrailSession<'e> {
    /// Load `trail_id` and start playing it at `speed_mps`.
    pub fn start(
        db: &Database,
        engine: &'e PlaybackEngine,
        user_id: UserId,
        trail_id: TrailId,
        speed_mps: f64,
    ) -> Result<Self, SessionError> {
        let trail = db.trails()?.get_trail(trail_id)?;

        let events = engine.subscribe();
        let run = engine.start(trail.path.points(), speed_mps)?;
        tracing::info!("User {} started trail {} ({})", user_id, trail_id, trail.name());

        Ok(Self {
            engine,
            events,
            user_id,
            trail,
            run,
            outcome: RunOutcome::InProgress,
            completion_recorded: false,
        })
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    /// Drain pending events of this run and update the outcome.
    pub fn poll(&mut self) -> Vec<PlaybackEvent> {
        let events: Vec<PlaybackEvent> = self
            .events
            .try_iter()
            .filter(|event| event.run() == self.run)
            .collect();

        for event in &events {
            match event {
                PlaybackEvent::Completed { .. } => self.outcome = RunOutcome::Completed,
                PlaybackEvent::Cancelled { .. } => self.outcome = RunOutcome::Abandoned,
                _ => {}
            }
        }

        events
    }

    /// Outcome as of the last `poll`.
    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// End the trail early. Does nothing if the run already finished.
    pub fn end(&mut self) -> RunOutcome {
        if self.engine.active_run() == Some(self.run) {
            self.engine.cancel();
        }
        self.poll();
        self.outcome
    }

    /// Record the completion if the run reached its last point.
    ///
    /// Returns whether a completion row was written. Calling again after a
    /// successful write writes nothing.
    pub fn record_completion(&mut self, db: &Database) -> Result<bool, SessionError> {
        self.poll();
        if self.outcome != RunOutcome::Completed || self.completion_recorded {
            return Ok(false);
        }

        db.reviews()?.mark_completed(self.user_id, self.trail.id())?;
        self.completion_recorded = true;
        Ok(true)
    }

    /// Store the user's review once the run is over.
    pub fn submit_review(
        &mut self,
        db: &Database,
        rating: i64,
        comment: &str,
    ) -> Result<ReviewId, SessionError> {
        self.poll();
        if self.outcome == RunOutcome::InProgress {
            return Err(SessionError::StillRunning);
        }

        Ok(db
            .reviews()?
            .add_review(self.user_id, self.trail.id(), rating, comment)?)
    }
}
