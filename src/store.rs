//! Persistence collaborators keyed by user id. Writes are upserts and the
//! last one wins.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::Row;
use tracing::debug;

use crate::db::DB;
use crate::models::{Progress, UserProfile};
use crate::nutrition::{Macros, Meal, NutritionGoals};

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load_progress(&self, user_id: &str) -> Result<Option<Progress>>;
    async fn save_progress(&self, user_id: &str, progress: &Progress) -> Result<()>;
}

/// Account settings. A missing profile is a valid answer.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()>;
}

/// Macro goals and the meal log. Missing goals are a valid answer.
#[async_trait]
pub trait NutritionStore: Send + Sync {
    async fn load_goals(&self, user_id: &str) -> Result<Option<NutritionGoals>>;
    async fn save_goals(&self, user_id: &str, goals: &NutritionGoals) -> Result<()>;
    /// Append a meal and return its row id.
    async fn log_meal(&self, user_id: &str, meal: &Meal) -> Result<i64>;
    /// Meals on `date` in the order they were logged.
    async fn meals_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DB,
}

impl SqliteStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn load_progress(&self, user_id: &str) -> Result<Option<Progress>> {
        let row = sqlx::query(
            r#"
            SELECT workouts, completed_dates, current_workout_index
            FROM   user_progress
            WHERE  user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let workouts: String = row.try_get("workouts")?;
        let dates: String = row.try_get("completed_dates")?;
        let index: i64 = row.try_get("current_workout_index")?;

        let mut progress = Progress {
            workouts: serde_json::from_str(&workouts)
                .with_context(|| format!("corrupt workouts for user `{user_id}`"))?,
            completed_dates: serde_json::from_str(&dates)
                .with_context(|| format!("corrupt completed dates for user `{user_id}`"))?,
            current_workout_index: usize::try_from(index).unwrap_or(0),
        };
        progress.normalize();
        Ok(Some(progress))
    }

    async fn save_progress(&self, user_id: &str, progress: &Progress) -> Result<()> {
        let workouts = serde_json::to_string(&progress.workouts)?;
        let dates = serde_json::to_string(&progress.completed_dates)?;

        sqlx::query(
            r#"
            INSERT INTO user_progress
                (user_id, workouts, completed_dates, current_workout_index, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                workouts              = excluded.workouts,
                completed_dates       = excluded.completed_dates,
                current_workout_index = excluded.current_workout_index,
                updated_at            = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(workouts)
        .bind(dates)
        .bind(progress.current_workout_index as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(user_id, workouts = progress.workouts.len(), "progress saved");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT age, weight, height, gender, experience_level, goal
            FROM   profiles
            WHERE  user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let ctx = || format!("corrupt profile for user `{user_id}`");
        Ok(Some(UserProfile {
            age: u32::try_from(r.try_get::<i64, _>("age").with_context(ctx)?).unwrap_or(0),
            weight: r.try_get("weight").with_context(ctx)?,
            height: r.try_get("height").with_context(ctx)?,
            gender: r.try_get("gender").with_context(ctx)?,
            experience_level: r.try_get("experience_level").with_context(ctx)?,
            goal: r.try_get("goal").with_context(ctx)?,
        }))
    }

    async fn save_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (user_id, age, weight, height, gender, experience_level, goal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id) DO UPDATE SET
                age              = excluded.age,
                weight           = excluded.weight,
                height           = excluded.height,
                gender           = excluded.gender,
                experience_level = excluded.experience_level,
                goal             = excluded.goal
            "#,
        )
        .bind(user_id)
        .bind(i64::from(profile.age))
        .bind(profile.weight)
        .bind(profile.height)
        .bind(&profile.gender)
        .bind(profile.experience_level)
        .bind(profile.goal)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl NutritionStore for SqliteStore {
    async fn load_goals(&self, user_id: &str) -> Result<Option<NutritionGoals>> {
        let row = sqlx::query(
            r#"
            SELECT daily_calories, daily_protein_g, daily_carbs_g, daily_fat_g
            FROM   nutrition_goals
            WHERE  user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let goals = NutritionGoals {
            daily_calories: u32::try_from(r.try_get::<i64, _>("daily_calories")?).unwrap_or(0),
            protein_g: r.try_get("daily_protein_g")?,
            carbs_g: r.try_get("daily_carbs_g")?,
            fat_g: r.try_get("daily_fat_g")?,
        };
        Ok(Some(goals.or_defaults()))
    }

    async fn save_goals(&self, user_id: &str, goals: &NutritionGoals) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO nutrition_goals
                (user_id, daily_calories, daily_protein_g, daily_carbs_g, daily_fat_g, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                daily_calories  = excluded.daily_calories,
                daily_protein_g = excluded.daily_protein_g,
                daily_carbs_g   = excluded.daily_carbs_g,
                daily_fat_g     = excluded.daily_fat_g,
                updated_at      = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(i64::from(goals.daily_calories))
        .bind(goals.protein_g)
        .bind(goals.carbs_g)
        .bind(goals.fat_g)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(user_id, "nutrition goals saved");
        Ok(())
    }

    async fn log_meal(&self, user_id: &str, meal: &Meal) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO daily_meals
                (user_id, date, meal_type, description, calories, protein_g, carbs_g, fat_g, logged_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(user_id)
        .bind(meal.date.to_string())
        .bind(meal.kind)
        .bind(&meal.description)
        .bind(meal.macros.calories)
        .bind(meal.macros.protein_g)
        .bind(meal.macros.carbs_g)
        .bind(meal.macros.fat_g)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(user_id, id, kind = %meal.kind, "meal logged");
        Ok(id)
    }

    async fn meals_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>> {
        let rows = sqlx::query(
            r#"
            SELECT meal_type, description, calories, protein_g, carbs_g, fat_g
            FROM   daily_meals
            WHERE  user_id = ? AND date = ?
            ORDER  BY id
            "#,
        )
        .bind(user_id)
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> Result<Meal> {
                Ok(Meal {
                    date,
                    kind: r
                        .try_get("meal_type")
                        .with_context(|| format!("corrupt meal for user `{user_id}`"))?,
                    description: r.try_get("description")?,
                    macros: Macros {
                        calories: r.try_get("calories")?,
                        protein_g: r.try_get("protein_g")?,
                        carbs_g: r.try_get("carbs_g")?,
                        fat_g: r.try_get("fat_g")?,
                    },
                })
            })
            .collect()
    }
}
