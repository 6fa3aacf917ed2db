//! Training summaries derived from the stored progress.

use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use serde::Serialize;

use crate::models::{Exercise, OneRMFormula, Progress, Workout};
use crate::utils::calculate_1rm;

/// Window for the consistency rate, and the number of weeks it spans.
const CONSISTENCY_DAYS: i64 = 28;
const CONSISTENCY_WEEKS: f64 = 4.0;
const HIGH_VOLUME_KG: f64 = 10_000.0;
const STAGNATION_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_workouts: usize,
    /// Sessions per week over the last four weeks, as a percentage capped at 100.
    pub consistency_rate: u32,
    /// Mean percent gain from the first recorded weight, never negative.
    pub strength_progress: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatedMax {
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub estimated_1rm: f64,
}

pub fn estimate_1rm(weight: f64, reps: u32) -> f64 {
    calculate_1rm(weight, reps, OneRMFormula::default())
}

pub fn workout_volume(workout: &Workout) -> f64 {
    workout
        .exercises
        .iter()
        .map(|e| e.current_weight * f64::from(e.reps) * f64::from(e.sets))
        .sum()
}

pub fn estimated_maxes(workout: &Workout, formula: OneRMFormula) -> Vec<EstimatedMax> {
    workout
        .exercises
        .iter()
        .map(|e| EstimatedMax {
            exercise: e.name.clone(),
            weight: e.current_weight,
            reps: e.reps,
            estimated_1rm: calculate_1rm(e.current_weight, e.reps, formula),
        })
        .collect()
}

fn consistency_rate(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    if dates.is_empty() {
        return 0;
    }
    let since = today - Duration::days(CONSISTENCY_DAYS);
    let recent = dates.iter().filter(|&&d| d >= since && d <= today).count();
    let pct = (recent as f64 / CONSISTENCY_WEEKS * 100.0).round();
    pct.min(100.0) as u32
}

fn gain_percent(e: &Exercise) -> Option<f64> {
    let first = e.history.first()?.weight;
    (first > 0.0).then(|| (e.current_weight - first) / first * 100.0)
}

fn strength_progress(progress: &Progress) -> u32 {
    let gains: Vec<f64> = progress
        .workouts
        .iter()
        .flat_map(|w| &w.exercises)
        .filter_map(gain_percent)
        .collect();
    if gains.is_empty() {
        return 0;
    }
    let mean = gains.iter().sum::<f64>() / gains.len() as f64;
    mean.round().max(0.0) as u32
}

pub fn metrics(progress: &Progress, today: NaiveDate) -> Metrics {
    Metrics {
        total_workouts: progress.completed_dates.len(),
        consistency_rate: consistency_rate(&progress.completed_dates, today),
        strength_progress: strength_progress(progress),
    }
}

/// Whether the trailing history window shows any increase.
/// `None` when there is not enough history to judge.
fn recently_progressed(e: &Exercise) -> Option<bool> {
    if e.history.len() < STAGNATION_WINDOW {
        return None;
    }
    let tail = &e.history[e.history.len() - STAGNATION_WINDOW..];
    Some(tail.iter().tuple_windows().any(|(a, b)| b.weight > a.weight))
}

pub fn insights(progress: &Progress) -> Vec<Insight> {
    let mut out = Vec::new();

    if progress.completed_dates.len() >= 4 {
        out.push(Insight {
            kind: InsightKind::Positive,
            message: "Great consistency: four or more sessions logged.",
        });
    }

    if let Some(current) = progress.current() {
        let judged: Vec<bool> = current
            .exercises
            .iter()
            .filter_map(recently_progressed)
            .collect();
        if !judged.is_empty() && judged.iter().all(|p| !p) {
            out.push(Insight {
                kind: InsightKind::Warning,
                message: "Progress looks stalled. Consider adding load or varying the exercises.",
            });
        }

        if workout_volume(current) > HIGH_VOLUME_KG {
            out.push(Insight {
                kind: InsightKind::Positive,
                message: "Impressive training volume. Keep it up.",
            });
        }
    }

    if out.is_empty() {
        out.push(Insight {
            kind: InsightKind::Info,
            message: "Keep training. Every session counts.",
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryEntry;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn with_history(weights: &[f64], current: f64) -> Exercise {
        let mut e = Exercise::new(1, "Squat", 5, 5, current);
        for (i, &w) in weights.iter().enumerate() {
            e.history.push(HistoryEntry {
                date: Utc.with_ymd_and_hms(2026, 2, 1 + i as u32, 8, 0, 0).unwrap(),
                weight: w,
                reps: 5,
            });
        }
        e
    }

    fn progress_of(exercises: Vec<Exercise>, dates: Vec<NaiveDate>) -> Progress {
        Progress {
            workouts: vec![Workout::new("Legs", exercises)],
            completed_dates: dates,
            current_workout_index: 0,
        }
    }

    #[test]
    fn consistency_counts_last_four_weeks_and_caps() {
        let today = day(31);
        let m = metrics(&progress_of(vec![], vec![day(5), day(10), day(20)]), today);
        assert_eq!(m.total_workouts, 3);
        assert_eq!(m.consistency_rate, 75);

        let many = (3..=31).map(day).collect();
        assert_eq!(metrics(&progress_of(vec![], many), today).consistency_rate, 100);
        assert_eq!(metrics(&Progress::default(), today).consistency_rate, 0);
    }

    #[test]
    fn strength_progress_averages_gains_and_floors_at_zero() {
        let p = progress_of(
            vec![with_history(&[100.0], 110.0), with_history(&[50.0], 55.0)],
            vec![],
        );
        assert_eq!(metrics(&p, day(1)).strength_progress, 10);

        let down = progress_of(vec![with_history(&[100.0], 80.0)], vec![]);
        assert_eq!(metrics(&down, day(1)).strength_progress, 0);
    }

    #[test]
    fn stalled_history_raises_warning() {
        let p = progress_of(vec![with_history(&[60.0, 60.0, 60.0], 60.0)], vec![]);
        let kinds: Vec<_> = insights(&p).iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InsightKind::Warning]);

        let moving = progress_of(vec![with_history(&[60.0, 60.0, 62.5], 62.5)], vec![]);
        assert_eq!(insights(&moving)[0].kind, InsightKind::Info);
    }

    #[test]
    fn high_volume_and_consistency_are_praised() {
        let heavy = Exercise::new(1, "Squat", 5, 10, 250.0);
        let dates = vec![day(1), day(2), day(3), day(4)];
        let out = insights(&progress_of(vec![heavy], dates));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| i.kind == InsightKind::Positive));
    }

    #[test]
    fn volume_and_maxes() {
        let w = Workout::new("Push", vec![Exercise::new(1, "Bench", 3, 10, 40.0)]);
        assert_eq!(workout_volume(&w), 1_200.0);
        let maxes = estimated_maxes(&w, OneRMFormula::Epley);
        assert!((maxes[0].estimated_1rm - 53.333).abs() < 0.01);
        assert_eq!(estimate_1rm(40.0, 0), 0.0);
    }
}
