use std::str::FromStr;

use anyhow::Result;
use sqlx::{
    Executor, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_progress (
    user_id               TEXT PRIMARY KEY,
    workouts              TEXT NOT NULL,
    completed_dates       TEXT NOT NULL,
    current_workout_index INTEGER NOT NULL DEFAULT 0,
    updated_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id          TEXT PRIMARY KEY,
    age              INTEGER NOT NULL,
    weight           REAL NOT NULL,
    height           REAL NOT NULL,
    gender           TEXT NOT NULL,
    experience_level TEXT NOT NULL,
    goal             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS nutrition_goals (
    user_id         TEXT PRIMARY KEY,
    daily_calories  INTEGER NOT NULL,
    daily_protein_g REAL NOT NULL,
    daily_carbs_g   REAL NOT NULL,
    daily_fat_g     REAL NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_meals (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL,
    date        TEXT NOT NULL,
    meal_type   TEXT NOT NULL,
    description TEXT NOT NULL,
    calories    REAL NOT NULL,
    protein_g   REAL NOT NULL,
    carbs_g     REAL NOT NULL,
    fat_g       REAL NOT NULL,
    logged_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_daily_meals_user_date ON daily_meals(user_id, date);
"#;

pub async fn open(path: &str) -> Result<DB> {
    let opts = SqliteConnectOptions::from_str(path)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection pool over a private in-memory database.
pub async fn open_in_memory() -> Result<DB> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &DB) -> Result<()> {
    pool.execute(SCHEMA).await?;
    Ok(())
}
