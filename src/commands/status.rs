use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use repcycle::analytics::{self, EstimatedMax, Insight, InsightKind, Metrics};
use repcycle::models::OneRMFormula;
use repcycle::store::ProgressStore;
use repcycle::types::{OutputFmt, emit};
use repcycle::utils::format_weight;
use serde::Serialize;

use super::load_progress;

#[derive(Serialize)]
struct StatusJson<'a> {
    metrics: &'a Metrics,
    workout: Option<&'a str>,
    volume: f64,
    estimated_maxes: &'a [EstimatedMax],
    insights: &'a [Insight],
}

fn print_insight(i: &Insight) {
    let tag = match i.kind {
        InsightKind::Positive => "+".green().bold(),
        InsightKind::Warning => "!".yellow().bold(),
        InsightKind::Info => "i".blue().bold(),
    };
    println!("  {} {}", tag, i.message);
}

pub async fn handle(store: &dyn ProgressStore, user_id: &str, fmt: OutputFmt) -> Result<()> {
    let progress = load_progress(store, user_id).await?;
    let metrics = analytics::metrics(&progress, Local::now().date_naive());
    let insights = analytics::insights(&progress);
    let current = progress.current();
    let maxes = current
        .map(|w| analytics::estimated_maxes(w, OneRMFormula::default()))
        .unwrap_or_default();
    let volume = current.map(analytics::workout_volume).unwrap_or(0.0);

    let json = StatusJson {
        metrics: &metrics,
        workout: current.map(|w| w.name.as_str()),
        volume,
        estimated_maxes: &maxes,
        insights: &insights,
    };

    emit(fmt, &json, || {
        println!("{}", "Training status".cyan().bold());
        println!("  {:<20} {}", "sessions finished".green(), metrics.total_workouts);
        println!("  {:<20} {}%", "consistency (4 wk)".green(), metrics.consistency_rate);
        println!("  {:<20} {}%", "strength progress".green(), metrics.strength_progress);

        if let Some(w) = current {
            println!();
            println!("{} {}", "Current workout:".cyan().bold(), w.name.bold());
            println!("  {:<20} {}", "volume".green(), format_weight(volume));
            for m in &maxes {
                println!(
                    "  {:<28} {} x {:<3} e1RM {}",
                    m.exercise,
                    format_weight(m.weight),
                    m.reps,
                    format_weight((m.estimated_1rm * 10.0).round() / 10.0).yellow()
                );
            }
        }

        println!();
        println!("{}", "Insights".cyan().bold());
        for i in &insights {
            print_insight(i);
        }
    });

    Ok(())
}
