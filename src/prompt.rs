use crate::models::{Exercise, UserProfile, Workout};
use crate::utils::format_weight;

pub const PLAN_PROMPT: &str = r#"Analyze the provided workout plan PDF. Identify the different workout days or splits (e.g. Day A, Day B, Push, Pull, Legs).
For each workout day, extract every exercise listed with its number of sets and repetitions.
Return the data as a JSON array where each object is one workout day, adhering to the provided schema.
Respond with the JSON only. If the PDF contains tables, parse them carefully and keep exercise names exactly as written."#;

fn format_exercise(e: &Exercise) -> String {
    format!(
        "- Exercise: {} (ID: {})\n  * Target: {} sets of {} reps\n  * Weight used: {}\n  * Completed sets: {} out of {}\n",
        e.name,
        e.id,
        e.sets,
        e.reps,
        format_weight(e.current_weight),
        e.completed_count(),
        e.sets
    )
}

fn format_profile(profile: Option<&UserProfile>) -> String {
    match profile {
        Some(p) => format!(
            "ATHLETE:\nExperience level: {}\nGoal: {}\nBody weight: {}\n",
            p.experience_level,
            p.goal,
            format_weight(p.weight)
        ),
        None => "ATHLETE:\nNo profile on file. Assume an intermediate lifter.\n".to_owned(),
    }
}

pub fn suggestion_prompt(workout: &Workout, profile: Option<&UserProfile>) -> String {
    let details: String = workout.exercises.iter().map(format_exercise).collect();

    format!(
        r#"You are a strength coach reviewing a finished session and planning the next one.

WORKOUT: {name}

{athlete}
PERFORMANCE:
{details}
For each exercise, choose the weight for the next session with this progressive overload logic:
1. All sets completed: add a small increment (about 2.5kg for compound lifts, 1-2kg for isolation work).
2. All but one set completed: keep the same weight to consolidate form.
3. Two or more sets missed: lower the weight slightly and focus on volume and technique.

Give each exercise a short, motivating message. Answer in the specified JSON format, one object per exercise, reusing the IDs above."#,
        name = workout.name,
        athlete = format_profile(profile),
        details = details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_exercise_with_progress() {
        let mut bench = Exercise::new(7, "Bench Press", 3, 10, 42.5);
        bench.toggle_set(0).unwrap();
        let w = Workout::new("Day A", vec![bench, Exercise::new(8, "Row", 3, 12, 30.0)]);

        let p = suggestion_prompt(&w, None);
        assert!(p.contains("WORKOUT: Day A"));
        assert!(p.contains("Bench Press (ID: 7)"));
        assert!(p.contains("Weight used: 42.5kg"));
        assert!(p.contains("Completed sets: 1 out of 3"));
        assert!(p.contains("Row (ID: 8)"));
        assert!(p.contains("Assume an intermediate lifter"));
    }
}
