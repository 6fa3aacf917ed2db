use crate::models::OneRMFormula;

pub fn calculate_1rm(weight: f64, reps: u32, formula: OneRMFormula) -> f64 {
    if reps == 0 {
        return 0.0;
    }
    let r = f64::from(reps);
    match formula {
        OneRMFormula::Epley => weight * (1.0 + r / 30.0),
        OneRMFormula::Brzycki => weight / (1.0278 - 0.0278 * r),
        OneRMFormula::Lombardi => weight * r.powf(0.10),
        OneRMFormula::OConner => weight * (1.0 + 0.025 * r),
    }
}

pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Weight for display: whole kilos without a fraction.
pub fn format_weight(kg: f64) -> String {
    if kg.fract().abs() > f64::EPSILON {
        format!("{:.1}kg", kg)
    } else {
        format!("{:.0}kg", kg)
    }
}
