//! Contracts for the external AI collaborators and the loosely typed shapes
//! they answer with. Every field is optional so a schema violation in one
//! item does not poison the whole answer.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{ExerciseId, UserProfile, Workout};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDraft {
    pub exercise_id: Option<f64>,
    pub exercise_name: Option<String>,
    pub suggested_weight: Option<f64>,
    pub message: Option<String>,
}

impl SuggestionDraft {
    /// Ids may arrive as JSON floats; only integral values match.
    pub fn refers_to(&self, id: ExerciseId) -> bool {
        self.exercise_id.is_some_and(|raw| raw == f64::from(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlanDraft {
    pub name: Option<String>,
    pub exercises: Option<Vec<ExerciseDraft>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExerciseDraft {
    pub name: Option<String>,
    pub sets: Option<f64>,
    pub reps: Option<f64>,
}

/// Produces next-session suggestions for a finished workout.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn suggest(
        &self,
        workout: &Workout,
        profile: Option<&UserProfile>,
    ) -> Result<Vec<SuggestionDraft>>;
}

/// Turns an uploaded plan document into workout drafts.
#[async_trait]
pub trait PlanParser: Send + Sync {
    async fn parse_plan(&self, document: &[u8]) -> Result<Vec<PlanDraft>>;
}

/// Parse a JSON array leniently: a malformed element becomes an empty draft
/// instead of failing the batch. A non-array document is an error.
pub fn drafts_from_json<T>(text: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let value: Value = serde_json::from_str(text.trim())?;
    let Value::Array(items) = value else {
        bail!("expected a JSON array");
    };

    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_ids_match_integral_exercise_ids() {
        let d = SuggestionDraft {
            exercise_id: Some(3.0),
            ..Default::default()
        };
        assert!(d.refers_to(3));
        assert!(!d.refers_to(4));

        let frac = SuggestionDraft {
            exercise_id: Some(3.5),
            ..Default::default()
        };
        assert!(!frac.refers_to(3));
    }

    #[test]
    fn malformed_items_become_empty_drafts() {
        let text = r#"[
            {"exerciseId": 1, "exerciseName": "Bench", "suggestedWeight": 42.5, "message": "up"},
            {"exerciseId": "two", "suggestedWeight": 10},
            7
        ]"#;
        let drafts: Vec<SuggestionDraft> = drafts_from_json(text).unwrap();

        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].suggested_weight, Some(42.5));
        assert_eq!(drafts[1], SuggestionDraft::default());
        assert_eq!(drafts[2], SuggestionDraft::default());
    }

    #[test]
    fn non_array_documents_are_rejected() {
        assert!(drafts_from_json::<PlanDraft>("{\"name\": \"A\"}").is_err());
        assert!(drafts_from_json::<PlanDraft>("not json").is_err());
    }
}
