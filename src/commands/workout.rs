use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use repcycle::config::Config;
use repcycle::import::import_plan;
use repcycle::models::{Progress, Workout};
use repcycle::store::ProgressStore;
use repcycle::types::{OutputFmt, emit};
use repcycle::utils::format_weight;
use serde::Serialize;
use strsim::jaro_winkler;

use super::{gemini, load_progress};
use crate::cli::WorkoutCmd;

const MIN_SCORE: f64 = 0.80;

#[derive(Serialize)]
struct WorkoutJson<'a> {
    idx: usize,
    name: &'a str,
    exercises: usize,
    current: bool,
}

/// Accepts a 1-based index or a case-insensitive workout name.
fn resolve(progress: &Progress, target: &str) -> Option<usize> {
    if let Ok(n) = target.trim().parse::<usize>() {
        return (1..=progress.workouts.len()).contains(&n).then(|| n - 1);
    }
    progress
        .workouts
        .iter()
        .position(|w| w.name.eq_ignore_ascii_case(target.trim()))
}

/// Closest workout name, if any is similar enough to be worth suggesting.
fn closest_name<'a>(progress: &'a Progress, target: &str) -> Option<&'a str> {
    let input = target.to_lowercase();
    progress
        .workouts
        .iter()
        .map(|w| (w.name.as_str(), jaro_winkler(&input, &w.name.to_lowercase())))
        .filter(|(_, score)| *score >= MIN_SCORE)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
}

pub fn print_workout(workout: &Workout) {
    println!("{}", workout.name.cyan().bold());
    for (i, e) in workout.exercises.iter().enumerate() {
        let marker = if e.is_finished { "✓".green() } else { " ".normal() };
        println!(
            "  {} {:>2}. {:<28} {} x {} @ {}  ({}/{} sets)",
            marker,
            i + 1,
            e.name,
            e.sets,
            e.reps,
            format_weight(e.current_weight).yellow(),
            e.completed_count(),
            e.sets
        );
    }
}

pub async fn handle(
    cmd: WorkoutCmd,
    store: &dyn ProgressStore,
    cfg: &Config,
    user_id: &str,
    fmt: OutputFmt,
) -> Result<()> {
    let mut progress = load_progress(store, user_id).await?;

    match cmd {
        WorkoutCmd::Import { file } => {
            let path = Path::new(&file);
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let Some(client) = gemini(cfg) else {
                bail!("importing a plan needs a Gemini API key (set GEMINI_API_KEY or `config set gemini_api_key`)");
            };

            match import_plan(&client, &bytes, &mut progress).await {
                Ok(count) => {
                    store.save_progress(user_id, &progress).await?;
                    println!(
                        "{} imported {} workout(s) from \"{}\"",
                        "info:".blue().bold(),
                        count,
                        file
                    );
                }
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e.to_string().red());
                    println!("Your current plan was left unchanged.");
                }
            }
        }

        WorkoutCmd::List => {
            let rows: Vec<WorkoutJson> = progress
                .workouts
                .iter()
                .enumerate()
                .map(|(i, w)| WorkoutJson {
                    idx: i + 1,
                    name: &w.name,
                    exercises: w.exercises.len(),
                    current: i == progress.current_workout_index,
                })
                .collect();

            emit(fmt, &rows, || {
                if rows.is_empty() {
                    println!("{}", "(no workouts, use `workout import <pdf>`)".dimmed());
                    return;
                }
                for r in &rows {
                    let line = format!("{:>2}. {} ({} exercises)", r.idx, r.name, r.exercises);
                    if r.current {
                        println!("{} {}", "»".green().bold(), line.bold());
                    } else {
                        println!("  {}", line);
                    }
                }
            });
        }

        WorkoutCmd::Show { index } => {
            let workout = match index {
                Some(n) => n.checked_sub(1).and_then(|i| progress.workouts.get(i)),
                None => progress.current(),
            };
            let Some(workout) = workout else {
                println!("{} no such workout", "warning:".yellow().bold());
                return Ok(());
            };
            emit(fmt, workout, || print_workout(workout));
        }

        WorkoutCmd::Select { workout } => match resolve(&progress, &workout) {
            Some(i) => {
                progress.select(i);
                store.save_progress(user_id, &progress).await?;
                println!(
                    "{} current workout is now \"{}\"",
                    "info:".blue().bold(),
                    progress.workouts[i].name.green()
                );
            }
            None => {
                println!("{} workout \"{}\" not found", "warning:".yellow().bold(), workout);
                if let Some(name) = closest_name(&progress, &workout) {
                    println!("  did you mean \"{}\"?", name.green());
                }
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcycle::models::Exercise;

    fn plan() -> Progress {
        Progress {
            workouts: vec![
                Workout::new("Push Day", vec![Exercise::new(1, "Bench", 3, 10, 40.0)]),
                Workout::new("Pull Day", vec![Exercise::new(2, "Row", 3, 10, 30.0)]),
            ],
            ..Progress::default()
        }
    }

    #[test]
    fn resolves_one_based_index_and_name() {
        let p = plan();
        assert_eq!(resolve(&p, "2"), Some(1));
        assert_eq!(resolve(&p, "0"), None);
        assert_eq!(resolve(&p, "3"), None);
        assert_eq!(resolve(&p, "push day"), Some(0));
        assert_eq!(resolve(&p, "Legs"), None);
    }

    #[test]
    fn suggests_close_names_only() {
        let p = plan();
        assert_eq!(closest_name(&p, "pul day"), Some("Pull Day"));
        assert_eq!(closest_name(&p, "xyz"), None);
    }
}
