//! Progressive-overload policy.
//!
//! The deterministic fallback decides from the number of completed sets:
//! all sets done adds an experience-dependent increment, missing only the
//! last set holds the weight, missing two or more deloads by five percent.
//! [`reconcile`] vets advisor output exercise by exercise and fills every
//! gap with the fallback.

use tracing::debug;

use crate::advisor::SuggestionDraft;
use crate::models::{Exercise, Origin, Suggestion, UserProfile, Workout};
use crate::types::ExperienceLevel;

pub const PROGRESS_MESSAGE: &str = "All sets completed. Add weight next session.";
pub const HOLD_MESSAGE: &str = "Missed the last set. Hold steady at this weight and own every rep.";
pub const DELOAD_MESSAGE: &str =
    "Missed two or more sets. Lighten the load and focus on form and volume.";

/// Smallest load change the policy suggests, in kg.
pub const WEIGHT_STEP: f64 = 0.5;
const DELOAD_PERCENT: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Progress,
    Hold,
    Deload,
}

impl Verdict {
    pub fn message(self) -> &'static str {
        match self {
            Self::Progress => PROGRESS_MESSAGE,
            Self::Hold => HOLD_MESSAGE,
            Self::Deload => DELOAD_MESSAGE,
        }
    }
}

pub fn classify(completed: u32, target: u32) -> Verdict {
    if completed >= target {
        Verdict::Progress
    } else if completed + 1 == target {
        Verdict::Hold
    } else {
        Verdict::Deload
    }
}

/// Load added after a fully completed exercise. No profile means intermediate.
pub fn increment_for(level: Option<ExperienceLevel>) -> f64 {
    match level.unwrap_or_default() {
        ExperienceLevel::Beginner => 2.5,
        ExperienceLevel::Intermediate => 2.0,
        ExperienceLevel::Advanced => 1.0,
    }
}

pub fn round_to_step(weight: f64) -> f64 {
    ((weight / WEIGHT_STEP).round() * WEIGHT_STEP).max(0.0)
}

fn floor_to_step(weight: f64) -> f64 {
    ((weight / WEIGHT_STEP + 1e-9).floor() * WEIGHT_STEP).max(0.0)
}

pub fn next_weight(current: f64, verdict: Verdict, level: Option<ExperienceLevel>) -> f64 {
    match verdict {
        Verdict::Progress => round_to_step(current + increment_for(level)),
        // Returned as stored: an off-grid weight is held exactly, not rounded.
        Verdict::Hold => current,
        Verdict::Deload => floor_to_step(current * DELOAD_PERCENT / 100.0).min(current),
    }
}

pub fn fallback_for(exercise: &Exercise, profile: Option<&UserProfile>) -> Suggestion {
    let verdict = classify(exercise.completed_count(), exercise.sets);
    let level = profile.map(|p| p.experience_level);

    Suggestion {
        exercise_id: exercise.id,
        exercise_name: exercise.name.clone(),
        suggested_weight: next_weight(exercise.current_weight, verdict, level),
        message: verdict.message().to_string(),
        origin: Origin::Fallback,
    }
}

pub fn fallback_all(workout: &Workout, profile: Option<&UserProfile>) -> Vec<Suggestion> {
    workout
        .exercises
        .iter()
        .map(|e| fallback_for(e, profile))
        .collect()
}

/// Accept a draft for `exercise` or say why it was refused.
fn accept(draft: &SuggestionDraft, exercise: &Exercise) -> Result<Suggestion, &'static str> {
    draft.exercise_name.as_deref().ok_or("missing exerciseName")?;

    let weight = draft.suggested_weight.ok_or("missing suggestedWeight")?;
    if !weight.is_finite() || weight <= 0.0 {
        return Err("non-positive suggestedWeight");
    }

    let message = draft
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or("missing message")?;

    Ok(Suggestion {
        exercise_id: exercise.id,
        exercise_name: exercise.name.clone(),
        suggested_weight: weight,
        message: message.to_string(),
        origin: Origin::Advisor,
    })
}

/// Exactly one suggestion per exercise of `workout`, in workout order.
///
/// For each exercise the first draft naming its id is considered; if it is
/// unusable the fallback is used for that exercise only. Drafts for unknown
/// ids are ignored.
pub fn reconcile(
    workout: &Workout,
    profile: Option<&UserProfile>,
    drafts: &[SuggestionDraft],
) -> Vec<Suggestion> {
    workout
        .exercises
        .iter()
        .map(|e| {
            let Some(draft) = drafts.iter().find(|d| d.refers_to(e.id)) else {
                debug!(exercise_id = e.id, "no advisor suggestion, using fallback");
                return fallback_for(e, profile);
            };
            accept(draft, e).unwrap_or_else(|reason| {
                debug!(exercise_id = e.id, reason, "rejected advisor suggestion");
                fallback_for(e, profile)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Goal;

    fn exercise(sets: u32, weight: f64, completed: &[usize]) -> Exercise {
        let mut e = Exercise::new(1, "Bench Press", sets, 10, weight);
        for &i in completed {
            e.toggle_set(i).unwrap();
        }
        e
    }

    fn profile(level: ExperienceLevel) -> UserProfile {
        UserProfile {
            age: 30,
            weight: 80.0,
            height: 180.0,
            gender: "female".into(),
            experience_level: level,
            goal: Goal::Strength,
        }
    }

    fn draft(id: f64, weight: Option<f64>) -> SuggestionDraft {
        SuggestionDraft {
            exercise_id: Some(id),
            exercise_name: Some("Bench".into()),
            suggested_weight: weight,
            message: Some("Keep pushing".into()),
        }
    }

    #[test]
    fn full_completion_beginner_adds_two_and_a_half() {
        let e = exercise(3, 40.0, &[0, 1, 2]);
        let p = profile(ExperienceLevel::Beginner);
        let s = fallback_for(&e, Some(&p));
        assert_eq!(s.suggested_weight, 42.5);
        assert_eq!(s.message, PROGRESS_MESSAGE);
        assert_eq!(fallback_for(&e, Some(&p)), s);
    }

    #[test]
    fn full_completion_increments_by_level() {
        let e = exercise(3, 40.0, &[0, 1, 2]);
        assert_eq!(fallback_for(&e, None).suggested_weight, 42.0);
        let adv = profile(ExperienceLevel::Advanced);
        assert_eq!(fallback_for(&e, Some(&adv)).suggested_weight, 41.0);
    }

    #[test]
    fn one_missed_set_holds() {
        let e = exercise(3, 40.0, &[0, 1]);
        let s = fallback_for(&e, None);
        assert_eq!(s.suggested_weight, 40.0);
        assert!(s.message.contains("Hold"));

        let off_grid = exercise(3, 41.3, &[0, 1]);
        assert_eq!(fallback_for(&off_grid, None).suggested_weight, 41.3);
    }

    #[test]
    fn two_or_more_missed_never_increase() {
        let e = exercise(4, 40.0, &[0]);
        let s = fallback_for(&e, None);
        assert!(s.suggested_weight <= 40.0);
        assert_eq!(s.suggested_weight, 38.0);
        assert_eq!(s.message, DELOAD_MESSAGE);

        let tiny = exercise(3, 0.3, &[]);
        assert!(fallback_for(&tiny, None).suggested_weight <= 0.3);
    }

    #[test]
    fn branch_messages_are_distinct() {
        assert_ne!(PROGRESS_MESSAGE, HOLD_MESSAGE);
        assert_ne!(HOLD_MESSAGE, DELOAD_MESSAGE);
        assert_ne!(PROGRESS_MESSAGE, DELOAD_MESSAGE);
    }

    #[test]
    fn single_set_exercise_with_nothing_done_holds() {
        assert_eq!(classify(0, 1), Verdict::Hold);
        assert_eq!(classify(1, 1), Verdict::Progress);
        assert_eq!(classify(0, 2), Verdict::Deload);
    }

    #[test]
    fn rounding_goes_to_half_kilo() {
        assert_eq!(round_to_step(42.3), 42.5);
        assert_eq!(round_to_step(42.2), 42.0);
        assert_eq!(round_to_step(-1.0), 0.0);
    }

    #[test]
    fn reconcile_substitutes_per_exercise() {
        let w = Workout::new(
            "Day A",
            vec![
                Exercise::new(1, "Bench", 3, 10, 40.0),
                Exercise::new(2, "Fly", 3, 12, 12.0),
                Exercise::new(3, "Pushdown", 4, 12, 25.0),
            ],
        );
        let drafts = vec![
            draft(1.0, Some(42.5)),
            draft(2.0, Some(f64::NAN)),
            draft(99.0, Some(10.0)),
        ];

        let out = reconcile(&w, None, &drafts);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].origin, Origin::Advisor);
        assert_eq!(out[0].suggested_weight, 42.5);
        assert_eq!(out[0].exercise_name, "Bench");
        assert_eq!(out[1].origin, Origin::Fallback);
        assert_eq!(out[2].origin, Origin::Fallback);
        assert!(out.iter().zip(&w.exercises).all(|(s, e)| s.exercise_id == e.id));
    }

    #[test]
    fn reconcile_rejects_incomplete_drafts() {
        let w = Workout::new("Day A", vec![Exercise::new(1, "Bench", 3, 10, 40.0)]);
        let mut no_message = draft(1.0, Some(45.0));
        no_message.message = Some("   ".into());
        let mut no_name = draft(1.0, Some(45.0));
        no_name.exercise_name = None;

        for d in [no_message, no_name, draft(1.0, Some(0.0)), draft(1.0, None)] {
            let out = reconcile(&w, None, &[d]);
            assert_eq!(out[0].origin, Origin::Fallback);
        }
        assert!(reconcile(&w, None, &[]).iter().all(|s| !s.message.is_empty()));
    }

    #[test]
    fn reconcile_uses_first_draft_for_duplicated_ids() {
        let w = Workout::new("Day A", vec![Exercise::new(1, "Bench", 3, 10, 40.0)]);
        let out = reconcile(&w, None, &[draft(1.0, Some(41.0)), draft(1.0, Some(60.0))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggested_weight, 41.0);
    }
}
