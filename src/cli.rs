use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use repcycle::nutrition::MealKind;
use repcycle::types::{ExperienceLevel, Goal};

#[derive(Parser)]
#[command(name = "repcycle", version, about = "Workout cycles with progressive overload")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence).
    #[arg(global = true, short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Training plan management
    #[command(subcommand, visible_alias = "w")]
    Workout(WorkoutCmd),

    /// Run an interactive training session for the current workout
    #[command(visible_alias = "t")]
    Train {
        /// Skip the AI advisor and use the built-in progression rules
        #[arg(long)]
        offline: bool,
    },

    /// Show training metrics, estimated maxes and insights
    Status,

    /// View or edit your athlete profile
    #[command(subcommand)]
    Profile(ProfileCmd),

    /// Daily macro goals and meal log
    #[command(subcommand, visible_alias = "n")]
    Nutrition(NutritionCmd),

    /// Write plan, history, profile and goals to a JSON file
    Export {
        /// Output file (defaults to repcycle-progress-<date>.json)
        path: Option<String>,
    },

    /// View or edit repcycle config
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Debug, Subcommand)]
pub enum WorkoutCmd {
    /// Import a training plan from a PDF, replacing the current plan
    #[command(visible_alias = "i")]
    Import {
        /// Path to the PDF file
        file: String,
    },

    /// List workouts in the plan
    #[command(visible_alias = "l")]
    List,

    /// Show a workout in detail (defaults to the current one)
    #[command(visible_alias = "s")]
    Show {
        /// 1-based workout index (from `w list`)
        index: Option<usize>,
    },

    /// Make a workout the current one
    Select {
        /// 1-based workout index or workout name
        workout: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCmd {
    /// Show the stored profile
    Show,

    /// Create or update the profile
    Set(ProfileArgs),
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub age: Option<u32>,

    /// Body weight in kg
    #[arg(long)]
    pub weight: Option<f64>,

    /// Height in cm
    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long, value_enum)]
    pub level: Option<ExperienceLevel>,

    #[arg(long, value_enum)]
    pub goal: Option<Goal>,
}

#[derive(Debug, Subcommand)]
pub enum NutritionCmd {
    /// Intake against the goals for a day (defaults to today)
    Show {
        /// Day as YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Change daily goals; omitted flags keep their current value
    SetGoals {
        #[arg(long)]
        calories: Option<u32>,

        /// Protein in grams
        #[arg(long)]
        protein: Option<f64>,

        /// Carbohydrates in grams
        #[arg(long)]
        carbs: Option<f64>,

        /// Fat in grams
        #[arg(long)]
        fat: Option<f64>,
    },

    /// Log a meal for today
    #[command(visible_alias = "l")]
    Log(MealArgs),
}

#[derive(Debug, Args)]
pub struct MealArgs {
    #[arg(value_enum)]
    pub kind: MealKind,

    #[arg(long)]
    pub calories: f64,

    #[arg(long, default_value_t = 0.0)]
    pub protein: f64,

    #[arg(long, default_value_t = 0.0)]
    pub carbs: f64,

    #[arg(long, default_value_t = 0.0)]
    pub fat: f64,

    /// What was eaten
    #[arg(long, short, default_value = "")]
    pub description: String,

    /// Log for another day (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
