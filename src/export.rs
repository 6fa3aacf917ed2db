//! JSON snapshot of everything stored for one user.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{Progress, UserProfile};
use crate::nutrition::NutritionGoals;
use crate::store::{NutritionStore, ProfileStore, ProgressStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub exported_at: DateTime<Utc>,
    pub progress: Progress,
    pub profile: Option<UserProfile>,
    pub nutrition_goals: Option<NutritionGoals>,
}

/// `repcycle-progress-YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("repcycle-progress-{}.json", date.format("%Y-%m-%d"))
}

/// Gather the bundle. A user with nothing saved exports an empty plan.
pub async fn collect<S>(store: &S, user_id: &str, now: DateTime<Utc>) -> Result<ExportBundle>
where
    S: ProgressStore + ProfileStore + NutritionStore,
{
    Ok(ExportBundle {
        exported_at: now,
        progress: store.load_progress(user_id).await?.unwrap_or_default(),
        profile: store.load_profile(user_id).await?,
        nutrition_goals: store.load_goals(user_id).await?,
    })
}

pub fn to_json(bundle: &ExportBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

pub async fn write(bundle: &ExportBundle, path: &Path) -> Result<()> {
    let json = to_json(bundle)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing export to {}", path.display()))?;
    info!(path = %path.display(), "export written");
    Ok(())
}
