//! Daily nutrition: macro goals, logged meals and the day's intake against
//! the goals.

use std::fmt::Display;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;

pub const DEFAULT_DAILY_CALORIES: u32 = 2500;
pub const DEFAULT_PROTEIN_G: f64 = 150.0;
pub const DEFAULT_CARBS_G: f64 = 200.0;
pub const DEFAULT_FAT_G: f64 = 70.0;

/// Main meals expected per day. Snacks count towards it.
pub const MEALS_PER_DAY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionGoals {
    pub daily_calories: u32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Default for NutritionGoals {
    fn default() -> Self {
        Self {
            daily_calories: DEFAULT_DAILY_CALORIES,
            protein_g: DEFAULT_PROTEIN_G,
            carbs_g: DEFAULT_CARBS_G,
            fat_g: DEFAULT_FAT_G,
        }
    }
}

fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { default }
}

impl NutritionGoals {
    /// Replace every unset (zero or unusable) target with its default.
    pub fn or_defaults(self) -> Self {
        let d = Self::default();
        Self {
            daily_calories: if self.daily_calories == 0 {
                d.daily_calories
            } else {
                self.daily_calories
            },
            protein_g: positive_or(self.protein_g, d.protein_g),
            carbs_g: positive_or(self.carbs_g, d.carbs_g),
            fat_g: positive_or(self.fat_g, d.fat_g),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (what, grams) in [
            ("protein", self.protein_g),
            ("carbs", self.carbs_g),
            ("fat", self.fat_g),
        ] {
            if !grams.is_finite() || grams < 0.0 {
                return Err(format!("{what} goal must be zero or more grams"));
            }
        }
        Ok(())
    }

    pub fn as_macros(&self) -> Macros {
        Macros {
            calories: f64::from(self.daily_calories),
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
    Other,
}

impl MealKind {
    /// Whether the meal counts towards [`MEALS_PER_DAY`].
    pub fn is_main(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl Display for MealKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snack => "snack",
            Self::Dinner => "dinner",
            Self::Other => "other",
        };

        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Macros {
    fn plus(self, other: Macros) -> Macros {
        Macros {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
        }
    }

    /// `self - other`, floored at zero per field.
    pub fn saturating_sub(self, other: Macros) -> Macros {
        Macros {
            calories: (self.calories - other.calories).max(0.0),
            protein_g: (self.protein_g - other.protein_g).max(0.0),
            carbs_g: (self.carbs_g - other.carbs_g).max(0.0),
            fat_g: (self.fat_g - other.fat_g).max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub date: NaiveDate,
    pub kind: MealKind,
    pub description: String,
    #[serde(flatten)]
    pub macros: Macros,
}

impl Meal {
    pub fn validate(&self) -> Result<(), String> {
        let m = &self.macros;
        for (what, value) in [
            ("calories", m.calories),
            ("protein", m.protein_g),
            ("carbs", m.carbs_g),
            ("fat", m.fat_g),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{what} must be zero or more, got {value}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyNutrition {
    pub date: NaiveDate,
    pub consumed: Macros,
    pub goals: NutritionGoals,
    pub remaining: Macros,
    pub meals_logged: usize,
    pub remaining_meals: u32,
}

/// Sum the meals logged on `date` and compare them with `goals`.
pub fn daily(date: NaiveDate, goals: NutritionGoals, meals: &[Meal]) -> DailyNutrition {
    let todays: Vec<&Meal> = meals.iter().filter(|m| m.date == date).collect();
    let consumed = todays
        .iter()
        .fold(Macros::default(), |acc, m| acc.plus(m.macros));
    let main = todays.iter().filter(|m| m.kind.is_main()).count();
    let main = u32::try_from(main).unwrap_or(u32::MAX);

    DailyNutrition {
        date,
        consumed,
        goals,
        remaining: goals.as_macros().saturating_sub(consumed),
        meals_logged: todays.len(),
        remaining_meals: MEALS_PER_DAY.saturating_sub(main),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn meal(kind: MealKind, calories: f64, protein_g: f64) -> Meal {
        Meal {
            date: day(),
            kind,
            description: String::new(),
            macros: Macros {
                calories,
                protein_g,
                carbs_g: 10.0,
                fat_g: 5.0,
            },
        }
    }

    #[test]
    fn defaults_match_the_standard_targets() {
        let g = NutritionGoals::default();
        assert_eq!(g.daily_calories, 2500);
        assert_eq!((g.protein_g, g.carbs_g, g.fat_g), (150.0, 200.0, 70.0));
    }

    #[test]
    fn unset_goals_fall_back_per_field() {
        let stored = NutritionGoals {
            daily_calories: 0,
            protein_g: 180.0,
            carbs_g: 0.0,
            fat_g: f64::NAN,
        };
        let g = stored.or_defaults();
        assert_eq!(g.daily_calories, 2500);
        assert_eq!(g.protein_g, 180.0);
        assert_eq!(g.carbs_g, 200.0);
        assert_eq!(g.fat_g, 70.0);
    }

    #[test]
    fn empty_day_has_all_meals_left() {
        let d = daily(day(), NutritionGoals::default(), &[]);
        assert_eq!(d.consumed, Macros::default());
        assert_eq!(d.remaining_meals, 4);
        assert_eq!(d.remaining.calories, 2500.0);
    }

    #[test]
    fn totals_only_count_the_requested_day() {
        let mut yesterday = meal(MealKind::Dinner, 900.0, 60.0);
        yesterday.date = day().pred_opt().unwrap();
        let meals = vec![
            meal(MealKind::Breakfast, 500.0, 30.0),
            meal(MealKind::Lunch, 700.0, 45.0),
            meal(MealKind::Other, 150.0, 20.0),
            yesterday,
        ];

        let d = daily(day(), NutritionGoals::default(), &meals);
        assert_eq!(d.consumed.calories, 1350.0);
        assert_eq!(d.consumed.protein_g, 95.0);
        assert_eq!(d.consumed.carbs_g, 30.0);
        assert_eq!(d.meals_logged, 3);
        assert_eq!(d.remaining_meals, 2);
        assert_eq!(d.remaining.protein_g, 55.0);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let meals: Vec<_> = (0..6).map(|_| meal(MealKind::Snack, 800.0, 40.0)).collect();
        let d = daily(day(), NutritionGoals::default(), &meals);
        assert_eq!(d.remaining_meals, 0);
        assert_eq!(d.remaining.calories, 0.0);
        assert_eq!(d.remaining.protein_g, 0.0);
    }

    #[test]
    fn negative_macros_are_rejected() {
        assert!(meal(MealKind::Lunch, 500.0, 30.0).validate().is_ok());
        assert!(meal(MealKind::Lunch, -1.0, 30.0).validate().is_err());
        assert!(meal(MealKind::Lunch, 500.0, f64::INFINITY).validate().is_err());

        let bad = NutritionGoals {
            fat_g: -5.0,
            ..NutritionGoals::default()
        };
        assert!(bad.validate().is_err());
    }
}
