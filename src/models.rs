use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{ExperienceLevel, Goal};

pub type ExerciseId = u32;

/// One movement within a workout, with its plan, live session state and
/// per-cycle history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub current_weight: f64,
    #[serde(default)]
    pub completed_sets: BTreeSet<usize>,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Snapshot appended once per confirmed cycle, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub reps: u32,
}

impl Exercise {
    pub fn new(id: ExerciseId, name: impl Into<String>, sets: u32, reps: u32, weight: f64) -> Self {
        Self {
            id,
            name: name.into(),
            sets,
            reps,
            current_weight: sanitize_weight(weight),
            completed_sets: BTreeSet::new(),
            is_finished: false,
            history: Vec::new(),
        }
    }

    /// Flip membership of `index` in the completed sets.
    /// Returns whether the set is now completed.
    pub fn toggle_set(&mut self, index: usize) -> CoreResult<bool> {
        if index >= self.sets as usize {
            return Err(CoreError::InvalidIndex {
                exercise_id: self.id,
                index,
                sets: self.sets,
            });
        }

        if self.completed_sets.remove(&index) {
            Ok(false)
        } else {
            self.completed_sets.insert(index);
            Ok(true)
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.current_weight = sanitize_weight(weight);
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_sets.len() as u32
    }

    pub fn all_sets_completed(&self) -> bool {
        self.completed_count() == self.sets
    }

    /// Repair persisted state: at least one set and one rep, and no set
    /// indices outside the plan.
    fn normalize(&mut self) {
        self.sets = self.sets.max(1);
        self.reps = self.reps.max(1);
        let sets = self.sets as usize;
        self.completed_sets.retain(|&i| i < sets);
        self.current_weight = sanitize_weight(self.current_weight);
    }
}

/// Negative and NaN weights collapse to zero.
fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_nan() || weight < 0.0 { 0.0 } else { weight }
}

/// A named, ordered collection of exercises for one training day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn new(name: impl Into<String>, exercises: Vec<Exercise>) -> Self {
        Self {
            name: name.into(),
            exercises,
        }
    }

    /// Checks id uniqueness and that every exercise has a usable plan.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for e in &self.exercises {
            if !seen.insert(e.id) {
                return Err(format!(
                    "duplicate exercise id {} in workout `{}`",
                    e.id, self.name
                ));
            }
            if e.sets == 0 || e.reps == 0 {
                return Err(format!(
                    "exercise `{}` needs at least one set and one rep",
                    e.name
                ));
            }
        }
        Ok(())
    }

    pub fn exercise(&self, id: ExerciseId) -> CoreResult<&Exercise> {
        self.exercises
            .iter()
            .find(|e| e.id == id)
            .ok_or(CoreError::NotFound(id))
    }

    pub fn exercise_mut(&mut self, id: ExerciseId) -> CoreResult<&mut Exercise> {
        self.exercises
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CoreError::NotFound(id))
    }

    pub fn all_finished(&self) -> bool {
        !self.exercises.is_empty() && self.exercises.iter().all(|e| e.is_finished)
    }

    /// Close a cycle: move every exercise to its suggested weight, record the
    /// weight it was trained at and clear the live state.
    ///
    /// Exercises without a matching suggestion keep their weight.
    pub fn apply_suggestions(&mut self, suggestions: &[Suggestion], now: DateTime<Utc>) {
        for e in &mut self.exercises {
            let prior = e.current_weight;
            if let Some(s) = suggestions.iter().find(|s| s.exercise_id == e.id) {
                e.set_weight(s.suggested_weight);
            } else {
                tracing::warn!(exercise_id = e.id, "no suggestion for exercise, keeping weight");
            }
            e.history.push(HistoryEntry {
                date: now,
                weight: prior,
                reps: e.reps,
            });
            e.completed_sets.clear();
            e.is_finished = false;
        }
    }

    pub fn max_exercise_id(&self) -> Option<ExerciseId> {
        self.exercises.iter().map(|e| e.id).max()
    }
}

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    Advisor,
    Fallback,
}

/// Next-session recommendation for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub exercise_id: ExerciseId,
    pub exercise_name: String,
    pub suggested_weight: f64,
    pub message: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub gender: String,
    pub experience_level: ExperienceLevel,
    pub goal: Goal,
}

/// Everything persisted per user: the imported plan, the days a session was
/// finished and which workout is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub completed_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub current_workout_index: usize,
}

impl Progress {
    pub fn current(&self) -> Option<&Workout> {
        self.workouts.get(self.current_workout_index)
    }

    pub fn current_mut(&mut self) -> Option<&mut Workout> {
        self.workouts.get_mut(self.current_workout_index)
    }

    /// Returns `false` and leaves the selection alone when `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.workouts.len() {
            return false;
        }
        self.current_workout_index = index;
        true
    }

    pub fn record_completion(&mut self, date: NaiveDate) {
        self.completed_dates.push(date);
    }

    pub fn replace_workouts(&mut self, workouts: Vec<Workout>) {
        self.workouts = workouts;
        self.current_workout_index = 0;
    }

    pub fn max_exercise_id(&self) -> ExerciseId {
        self.workouts
            .iter()
            .filter_map(Workout::max_exercise_id)
            .max()
            .unwrap_or(0)
    }

    /// Repair state loaded from storage so the in-memory invariants hold.
    pub fn normalize(&mut self) {
        for w in &mut self.workouts {
            for e in &mut w.exercises {
                e.normalize();
            }
        }
        if self.current_workout_index >= self.workouts.len() {
            self.current_workout_index = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OneRMFormula {
    #[default]
    Epley,
    Brzycki,
    Lombardi,
    OConner,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bench() -> Exercise {
        Exercise::new(1, "Bench Press", 3, 10, 40.0)
    }

    #[test]
    fn toggle_set_keeps_sorted_unique_indices() {
        let mut e = bench();
        e.toggle_set(2).unwrap();
        e.toggle_set(0).unwrap();
        e.toggle_set(1).unwrap();
        e.toggle_set(1).unwrap();
        e.toggle_set(1).unwrap();

        let got: Vec<usize> = e.completed_sets.iter().copied().collect();
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[test]
    fn toggle_set_twice_restores_membership() {
        let mut e = bench();
        assert!(e.toggle_set(1).unwrap());
        assert!(!e.toggle_set(1).unwrap());
        assert!(e.completed_sets.is_empty());
    }

    #[test]
    fn toggle_set_out_of_range_is_rejected_without_effect() {
        let mut e = bench();
        e.toggle_set(0).unwrap();
        let before = e.clone();

        let err = e.toggle_set(3).unwrap_err();
        assert!(matches!(err, CoreError::InvalidIndex { index: 3, sets: 3, .. }));
        assert_eq!(e, before);
    }

    #[test]
    fn negative_and_nan_weights_clamp_to_zero() {
        let mut e = bench();
        e.set_weight(-5.0);
        assert_eq!(e.current_weight, 0.0);
        e.set_weight(f64::NAN);
        assert_eq!(e.current_weight, 0.0);
        e.set_weight(37.5);
        assert_eq!(e.current_weight, 37.5);
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let w = Workout::new("Day A", vec![bench(), Exercise::new(1, "Row", 3, 10, 30.0)]);
        assert!(w.validate().is_err());
    }

    #[test]
    fn apply_suggestions_keeps_weight_when_suggestion_missing() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut w = Workout::new(
            "Day A",
            vec![bench(), Exercise::new(2, "Fly", 3, 12, 12.0)],
        );
        w.exercises[0].toggle_set(0).unwrap();
        w.exercises[1].is_finished = true;

        let s = Suggestion {
            exercise_id: 1,
            exercise_name: "Bench Press".into(),
            suggested_weight: 42.5,
            message: "up".into(),
            origin: Origin::Fallback,
        };
        w.apply_suggestions(&[s], now);

        assert_eq!(w.exercises[0].current_weight, 42.5);
        assert_eq!(w.exercises[1].current_weight, 12.0);
        for e in &w.exercises {
            assert!(e.completed_sets.is_empty());
            assert!(!e.is_finished);
            assert_eq!(e.history.len(), 1);
        }
        assert_eq!(w.exercises[0].history[0].weight, 40.0);
        assert_eq!(w.exercises[0].history[0].date, now);
    }

    #[test]
    fn progress_normalize_repairs_loaded_state() {
        let mut e = bench();
        e.completed_sets.insert(7);
        let mut p = Progress {
            workouts: vec![Workout::new("Day A", vec![e])],
            completed_dates: vec![],
            current_workout_index: 4,
        };
        p.normalize();

        assert_eq!(p.current_workout_index, 0);
        assert!(p.workouts[0].exercises[0].completed_sets.is_empty());
    }

    #[test]
    fn zero_set_plan_is_repaired_on_load() {
        let mut e = Exercise::new(1, "Bench Press", 0, 0, 40.0);
        e.completed_sets.insert(0);
        let mut p = Progress {
            workouts: vec![Workout::new("Day A", vec![e])],
            ..Progress::default()
        };
        p.normalize();

        let e = &p.workouts[0].exercises[0];
        assert_eq!((e.sets, e.reps), (1, 1));
        assert_eq!(e.completed_sets.len(), 1);
    }

    #[test]
    fn exercise_json_uses_camel_case() {
        let json = serde_json::to_value(bench()).unwrap();
        assert_eq!(json["currentWeight"], 40.0);
        assert!(json["completedSets"].as_array().unwrap().is_empty());
        assert_eq!(json["isFinished"], false);
    }
}
