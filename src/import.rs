use tracing::{info, instrument, warn};

use crate::advisor::{ExerciseDraft, PlanDraft, PlanParser};
use crate::error::{CoreError, CoreResult};
use crate::models::{Exercise, ExerciseId, Progress, Workout};

/// Round to a whole count of at least one.
fn coerce_count(raw: f64) -> Option<u32> {
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(1.0, f64::from(u32::MAX)) as u32)
}

fn required_name(raw: Option<&str>, what: &str) -> CoreResult<String> {
    raw.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::ImportFailed(format!("{what} without a name")))
}

fn build_exercise(draft: &ExerciseDraft, id: ExerciseId, workout: &str) -> CoreResult<Exercise> {
    let name = required_name(draft.name.as_deref(), "exercise")?;
    let count = |raw: Option<f64>, field: &str| {
        raw.and_then(coerce_count).ok_or_else(|| {
            CoreError::ImportFailed(format!("`{name}` in `{workout}` has no numeric {field}"))
        })
    };
    let sets = count(draft.sets, "sets")?;
    let reps = count(draft.reps, "reps")?;

    Ok(Exercise::new(id, name, sets, reps, 0.0))
}

/// Turn parsed plan drafts into workouts. Exercise ids are handed out from
/// `id_floor + 1` upwards so they never collide with previously loaded ones.
pub fn build_workouts(drafts: &[PlanDraft], id_floor: ExerciseId) -> CoreResult<Vec<Workout>> {
    if drafts.is_empty() {
        return Err(CoreError::ImportFailed("no workouts found in document".into()));
    }

    let mut next_id = id_floor;
    let mut workouts = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let name = required_name(draft.name.as_deref(), "workout")?;
        let exercises = draft
            .exercises
            .as_deref()
            .filter(|ex| !ex.is_empty())
            .ok_or_else(|| CoreError::ImportFailed(format!("workout `{name}` has no exercises")))?;

        let mut built = Vec::with_capacity(exercises.len());
        for ex in exercises {
            next_id = next_id
                .checked_add(1)
                .ok_or_else(|| CoreError::ImportFailed("exercise ids exhausted".into()))?;
            built.push(build_exercise(ex, next_id, &name)?);
        }

        let workout = Workout::new(name, built);
        workout.validate().map_err(CoreError::ImportFailed)?;
        workouts.push(workout);
    }

    Ok(workouts)
}

/// Parse `document` and, only if that fully succeeds, replace the plan in
/// `progress`. Returns the number of imported workouts.
#[instrument(skip_all, fields(bytes = document.len()))]
pub async fn import_plan(
    parser: &dyn PlanParser,
    document: &[u8],
    progress: &mut Progress,
) -> CoreResult<usize> {
    let drafts = parser.parse_plan(document).await.map_err(|e| {
        warn!(error = %e, "plan parser failed");
        CoreError::ImportFailed(format!("{e:#}"))
    })?;

    let workouts = build_workouts(&drafts, progress.max_exercise_id())?;
    let count = workouts.len();
    progress.replace_workouts(workouts);
    info!(workouts = count, "plan imported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    fn ex(name: &str, sets: Option<f64>, reps: Option<f64>) -> ExerciseDraft {
        ExerciseDraft {
            name: Some(name.into()),
            sets,
            reps,
        }
    }

    fn plan(name: &str, exercises: Vec<ExerciseDraft>) -> PlanDraft {
        PlanDraft {
            name: Some(name.into()),
            exercises: Some(exercises),
        }
    }

    #[test]
    fn ids_start_above_the_floor_and_counts_are_coerced() {
        let drafts = vec![
            plan("Push", vec![ex("Bench", Some(3.0), Some(10.0)), ex("Dip", Some(0.0), Some(7.6))]),
            plan("Pull", vec![ex("Row", Some(-2.0), Some(12.0))]),
        ];
        let workouts = build_workouts(&drafts, 40).unwrap();

        let ids: Vec<_> = workouts
            .iter()
            .flat_map(|w| w.exercises.iter().map(|e| e.id))
            .collect();
        assert_eq!(ids, vec![41, 42, 43]);

        let dip = &workouts[0].exercises[1];
        assert_eq!((dip.sets, dip.reps), (1, 8));
        assert_eq!(workouts[1].exercises[0].sets, 1);
        assert!(workouts.iter().flat_map(|w| &w.exercises).all(|e| {
            e.current_weight == 0.0 && e.history.is_empty() && e.completed_sets.is_empty()
        }));
    }

    #[test]
    fn malformed_drafts_fail() {
        assert!(build_workouts(&[], 0).is_err());
        assert!(build_workouts(&[plan("Push", vec![])], 0).is_err());
        assert!(build_workouts(&[plan("Push", vec![ex("Bench", None, Some(10.0))])], 0).is_err());
        assert!(build_workouts(&[plan("Push", vec![ex("  ", Some(3.0), Some(10.0))])], 0).is_err());
        let unnamed = PlanDraft {
            name: None,
            exercises: Some(vec![ex("Bench", Some(3.0), Some(10.0))]),
        };
        assert!(matches!(
            build_workouts(&[unnamed], 0),
            Err(CoreError::ImportFailed(_))
        ));
    }

    struct Failing;

    #[async_trait]
    impl PlanParser for Failing {
        async fn parse_plan(&self, _: &[u8]) -> Result<Vec<PlanDraft>> {
            Err(anyhow!("unsupported document"))
        }
    }

    struct Fixed(Vec<PlanDraft>);

    #[async_trait]
    impl PlanParser for Fixed {
        async fn parse_plan(&self, _: &[u8]) -> Result<Vec<PlanDraft>> {
            Ok(self.0.clone())
        }
    }

    fn loaded() -> Progress {
        Progress {
            workouts: vec![Workout::new("Old", vec![Exercise::new(7, "Squat", 5, 5, 100.0)])],
            completed_dates: vec![],
            current_workout_index: 0,
        }
    }

    #[tokio::test]
    async fn failed_import_leaves_progress_untouched() {
        let mut progress = loaded();
        let before = progress.clone();

        let err = import_plan(&Failing, b"%PDF", &mut progress).await.unwrap_err();
        assert!(matches!(err, CoreError::ImportFailed(_)));
        assert_eq!(progress, before);

        let bad = Fixed(vec![plan("Push", vec![ex("Bench", None, None)])]);
        assert!(import_plan(&bad, b"%PDF", &mut progress).await.is_err());
        assert_eq!(progress, before);
    }

    #[tokio::test]
    async fn successful_import_replaces_plan() {
        let mut progress = loaded();
        progress.current_workout_index = 0;
        let parser = Fixed(vec![
            plan("A", vec![ex("Bench", Some(3.0), Some(10.0))]),
            plan("B", vec![ex("Row", Some(3.0), Some(10.0))]),
        ]);

        assert_eq!(import_plan(&parser, b"%PDF", &mut progress).await.unwrap(), 2);
        assert_eq!(progress.workouts.len(), 2);
        assert_eq!(progress.current_workout_index, 0);
        assert_eq!(progress.workouts[0].exercises[0].id, 8);
    }
}
