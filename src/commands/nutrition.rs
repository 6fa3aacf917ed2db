use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use repcycle::nutrition::{self, DailyNutrition, Macros, Meal, NutritionGoals};
use repcycle::store::NutritionStore;
use repcycle::types::{OutputFmt, emit};

use crate::cli::{MealArgs, NutritionCmd};

/// Overlay the given targets on the current goals.
fn merge_goals(
    current: NutritionGoals,
    calories: Option<u32>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
) -> Result<NutritionGoals> {
    let goals = NutritionGoals {
        daily_calories: calories.unwrap_or(current.daily_calories),
        protein_g: protein.unwrap_or(current.protein_g),
        carbs_g: carbs.unwrap_or(current.carbs_g),
        fat_g: fat.unwrap_or(current.fat_g),
    };
    goals.validate().map_err(|e| anyhow!(e))?;
    Ok(goals)
}

fn meal_from(args: MealArgs, today: NaiveDate) -> Result<Meal> {
    let meal = Meal {
        date: args.date.unwrap_or(today),
        kind: args.kind,
        description: args.description.trim().to_owned(),
        macros: Macros {
            calories: args.calories,
            protein_g: args.protein,
            carbs_g: args.carbs,
            fat_g: args.fat,
        },
    };
    meal.validate().map_err(|e| anyhow!(e))?;
    Ok(meal)
}

fn bar(consumed: f64, goal: f64) -> String {
    const WIDTH: usize = 20;
    let ratio = if goal > 0.0 { (consumed / goal).clamp(0.0, 1.0) } else { 0.0 };
    let filled = (ratio * WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(WIDTH - filled))
}

fn print_line(label: &str, unit: &str, consumed: f64, goal: f64) {
    let bar = bar(consumed, goal);
    let bar = if consumed > goal { bar.red() } else { bar.green() };
    println!(
        "  {:<10} {} {:>6.0}/{:<6.0}{}",
        label.green(),
        bar,
        consumed,
        goal,
        unit
    );
}

fn print_day(d: &DailyNutrition, meals: &[Meal]) {
    let goal = d.goals.as_macros();
    println!("{} {}", "Nutrition".cyan().bold(), d.date.to_string().bold());
    print_line("calories", "kcal", d.consumed.calories, goal.calories);
    print_line("protein", "g", d.consumed.protein_g, goal.protein_g);
    print_line("carbs", "g", d.consumed.carbs_g, goal.carbs_g);
    print_line("fat", "g", d.consumed.fat_g, goal.fat_g);

    println!();
    if meals.is_empty() {
        println!("  {}", "no meals logged".dimmed());
    }
    for m in meals {
        println!(
            "  {:<10} {:>5.0} kcal  {:.0}P {:.0}C {:.0}F  {}",
            m.kind.to_string().blue(),
            m.macros.calories,
            m.macros.protein_g,
            m.macros.carbs_g,
            m.macros.fat_g,
            m.description.dimmed()
        );
    }
    println!("  {} meals left today", d.remaining_meals.to_string().yellow());
}

async fn goals_or_default(store: &dyn NutritionStore, user_id: &str) -> Result<NutritionGoals> {
    Ok(store.load_goals(user_id).await?.unwrap_or_default())
}

async fn show(store: &dyn NutritionStore, user_id: &str, date: NaiveDate, fmt: OutputFmt) -> Result<()> {
    let goals = goals_or_default(store, user_id).await?;
    let meals = store.meals_on(user_id, date).await?;
    let day = nutrition::daily(date, goals, &meals);
    emit(fmt, &day, || print_day(&day, &meals));
    Ok(())
}

pub async fn handle(
    cmd: NutritionCmd,
    store: &dyn NutritionStore,
    user_id: &str,
    fmt: OutputFmt,
) -> Result<()> {
    let today = Local::now().date_naive();
    match cmd {
        NutritionCmd::Show { date } => show(store, user_id, date.unwrap_or(today), fmt).await?,

        NutritionCmd::SetGoals {
            calories,
            protein,
            carbs,
            fat,
        } => {
            let current = goals_or_default(store, user_id).await?;
            let goals = merge_goals(current, calories, protein, carbs, fat)?;
            store.save_goals(user_id, &goals).await?;
            println!("{} nutrition goals saved", "info:".blue().bold());
            emit(fmt, &goals, || {
                println!("  {:<10} {} kcal", "calories".green(), goals.daily_calories);
                println!("  {:<10} {}g", "protein".green(), goals.protein_g);
                println!("  {:<10} {}g", "carbs".green(), goals.carbs_g);
                println!("  {:<10} {}g", "fat".green(), goals.fat_g);
            });
        }

        NutritionCmd::Log(args) => {
            let meal = meal_from(args, today)?;
            store.log_meal(user_id, &meal).await?;
            println!(
                "{} {} logged ({:.0} kcal)",
                "info:".blue().bold(),
                meal.kind,
                meal.macros.calories
            );
            show(store, user_id, meal.date, fmt).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcycle::nutrition::MealKind;

    fn args() -> MealArgs {
        MealArgs {
            kind: MealKind::Lunch,
            calories: 650.0,
            protein: 45.0,
            carbs: 70.0,
            fat: 15.0,
            description: "  rice, beans and chicken ".into(),
            date: None,
        }
    }

    #[test]
    fn goal_update_only_touches_given_targets() {
        let g = merge_goals(NutritionGoals::default(), Some(2200), None, Some(180.0), None).unwrap();
        assert_eq!(g.daily_calories, 2200);
        assert_eq!(g.protein_g, 150.0);
        assert_eq!(g.carbs_g, 180.0);
        assert_eq!(g.fat_g, 70.0);

        assert!(merge_goals(NutritionGoals::default(), None, Some(-1.0), None, None).is_err());
    }

    #[test]
    fn meal_defaults_to_today_and_trims_description() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let m = meal_from(args(), today).unwrap();
        assert_eq!(m.date, today);
        assert_eq!(m.description, "rice, beans and chicken");

        let bad = MealArgs {
            calories: -10.0,
            ..args()
        };
        assert!(meal_from(bad, today).is_err());
    }

    #[test]
    fn progress_bar_is_capped() {
        assert_eq!(bar(0.0, 100.0), ".".repeat(20));
        assert_eq!(bar(50.0, 100.0), format!("{}{}", "#".repeat(10), ".".repeat(10)));
        assert_eq!(bar(300.0, 100.0), "#".repeat(20));
        assert_eq!(bar(10.0, 0.0), ".".repeat(20));
    }
}
