use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use repcycle::export;
use repcycle::store::SqliteStore;
use repcycle::types::{OutputFmt, emit};
use serde::Serialize;

#[derive(Serialize)]
struct Written {
    path: String,
    workouts: usize,
    sessions: usize,
    profile: bool,
}

pub async fn handle(
    path: Option<String>,
    store: &SqliteStore,
    user_id: &str,
    fmt: OutputFmt,
) -> Result<()> {
    let now = Utc::now();
    let path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export::default_file_name(now.date_naive())));

    let bundle = export::collect(store, user_id, now).await?;
    export::write(&bundle, &path).await?;

    let written = Written {
        path: path.display().to_string(),
        workouts: bundle.progress.workouts.len(),
        sessions: bundle.progress.completed_dates.len(),
        profile: bundle.profile.is_some(),
    };
    emit(fmt, &written, || {
        println!(
            "{} exported {} workouts and {} finished sessions to {}",
            "info:".blue().bold(),
            written.workouts,
            written.sessions,
            written.path.bold()
        );
    });
    Ok(())
}
