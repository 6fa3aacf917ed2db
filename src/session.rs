//! Workout session state machine.
//!
//! ```text
//! Idle --start--> Running --begin_review--> AwaitingReview --complete_review--> Reviewing
//!                   ^  ^                          |                                |  |
//!                   |  +-------cancel_review------+                                |  |
//!                   |  +------------------------discard_cycle----------------------+  |
//!                   +-------------------------confirm_cycle (timer reset)-------------+
//! ```
//!
//! Edits to the workout are only accepted in `Idle` and `Running`.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::models::{ExerciseId, Suggestion, Workout};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    /// `ticking` is false after a discarded review until the timer is resumed.
    Running { ticking: bool },
    AwaitingReview { ticket: u64 },
    Reviewing { suggestions: Vec<Suggestion> },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::AwaitingReview { .. } => "awaiting review",
            Self::Reviewing { .. } => "reviewing",
        }
    }
}

/// Handed out by [`Session::begin_review`]; the ticket must be presented back
/// to [`Session::complete_review`].
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub ticket: u64,
    pub workout: Workout,
}

#[derive(Debug, Clone)]
pub struct Session {
    workout: Workout,
    phase: Phase,
    elapsed: u64,
    last_ticket: u64,
}

impl Session {
    pub fn new(workout: Workout) -> Self {
        Self {
            workout,
            phase: Phase::Idle,
            elapsed: 0,
            last_ticket: 0,
        }
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn into_workout(self) -> Workout {
        self.workout
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed
    }

    pub fn is_ticking(&self) -> bool {
        matches!(self.phase, Phase::Running { ticking: true })
    }

    pub fn suggestions(&self) -> Option<&[Suggestion]> {
        match &self.phase {
            Phase::Reviewing { suggestions } => Some(suggestions),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> CoreError {
        CoreError::InvalidStateTransition {
            action,
            phase: self.phase.name(),
        }
    }

    fn ensure_editable(&self, action: &'static str) -> CoreResult<()> {
        match self.phase {
            Phase::Idle | Phase::Running { .. } => Ok(()),
            Phase::AwaitingReview { .. } | Phase::Reviewing { .. } => Err(self.invalid(action)),
        }
    }

    pub fn start(&mut self) -> CoreResult<()> {
        if self.phase != Phase::Idle {
            return Err(self.invalid("start"));
        }
        self.phase = Phase::Running { ticking: true };
        info!(workout = %self.workout.name, "session started");
        Ok(())
    }

    /// Advance the clock by one second. Ticks outside a ticking `Running`
    /// phase are dropped; returns whether the tick counted.
    pub fn tick(&mut self) -> bool {
        if self.is_ticking() {
            self.elapsed += 1;
            true
        } else {
            false
        }
    }

    pub fn resume_timer(&mut self) -> CoreResult<()> {
        match self.phase {
            Phase::Running { .. } => {
                self.phase = Phase::Running { ticking: true };
                Ok(())
            }
            _ => Err(self.invalid("resume timer")),
        }
    }

    pub fn reset_timer(&mut self) -> CoreResult<()> {
        self.ensure_editable("reset timer")?;
        self.elapsed = 0;
        Ok(())
    }

    /// Returns whether the set is now completed.
    pub fn toggle_set(&mut self, exercise_id: ExerciseId, set_index: usize) -> CoreResult<bool> {
        self.ensure_editable("toggle set")?;
        if self.workout.all_finished() {
            return Err(self.invalid("toggle set on a finished workout"));
        }
        self.workout.exercise_mut(exercise_id)?.toggle_set(set_index)
    }

    /// Returns the new finished flag.
    pub fn toggle_exercise_finished(&mut self, exercise_id: ExerciseId) -> CoreResult<bool> {
        self.ensure_editable("toggle exercise finished")?;
        let e = self.workout.exercise_mut(exercise_id)?;
        e.is_finished = !e.is_finished;
        Ok(e.is_finished)
    }

    /// Returns the stored weight after clamping.
    pub fn update_weight(&mut self, exercise_id: ExerciseId, weight: f64) -> CoreResult<f64> {
        self.ensure_editable("update weight")?;
        let e = self.workout.exercise_mut(exercise_id)?;
        e.set_weight(weight);
        Ok(e.current_weight)
    }

    /// Stop the clock and wait for suggestions. The elapsed time is kept.
    pub fn begin_review(&mut self) -> CoreResult<ReviewRequest> {
        if !matches!(self.phase, Phase::Running { .. }) {
            return Err(self.invalid("request review"));
        }
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        self.phase = Phase::AwaitingReview { ticket };
        debug!(ticket, elapsed = self.elapsed, "awaiting review");

        Ok(ReviewRequest {
            ticket,
            workout: self.workout.clone(),
        })
    }

    /// Install suggestions for a pending review. Results for a cancelled or
    /// superseded review are dropped and `Ok(false)` is returned.
    pub fn complete_review(&mut self, ticket: u64, suggestions: Vec<Suggestion>) -> CoreResult<bool> {
        match self.phase {
            Phase::AwaitingReview { ticket: pending } if pending == ticket => {
                self.phase = Phase::Reviewing { suggestions };
                Ok(true)
            }
            Phase::AwaitingReview { .. } | Phase::Running { .. } | Phase::Idle => {
                debug!(ticket, "dropping stale review result");
                Ok(false)
            }
            Phase::Reviewing { .. } => Err(self.invalid("complete review")),
        }
    }

    /// Abandon a pending review; the clock stays frozen.
    pub fn cancel_review(&mut self) -> CoreResult<()> {
        if !matches!(self.phase, Phase::AwaitingReview { .. }) {
            return Err(self.invalid("cancel review"));
        }
        self.phase = Phase::Running { ticking: false };
        info!("review cancelled");
        Ok(())
    }

    pub fn confirm_cycle(&mut self) -> CoreResult<()> {
        self.confirm_cycle_at(Utc::now())
    }

    /// Apply the pending suggestions and start a fresh cycle with the clock at zero.
    pub fn confirm_cycle_at(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        let Phase::Reviewing { suggestions } = &self.phase else {
            return Err(self.invalid("confirm cycle"));
        };
        self.workout.apply_suggestions(suggestions, now);
        self.elapsed = 0;
        self.phase = Phase::Running { ticking: true };
        info!(workout = %self.workout.name, "cycle confirmed");
        Ok(())
    }

    /// Drop the pending suggestions. The clock stays frozen until resumed.
    pub fn discard_cycle(&mut self) -> CoreResult<()> {
        if !matches!(self.phase, Phase::Reviewing { .. }) {
            return Err(self.invalid("discard cycle"));
        }
        self.phase = Phase::Running { ticking: false };
        Ok(())
    }
}
