use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    Hypertrophy,
    FatLoss,
    Strength,
    Endurance,
}

impl Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Hypertrophy => "hypertrophy",
            Self::FatLoss => "fat-loss",
            Self::Strength => "strength",
            Self::Endurance => "endurance",
        };

        write!(f, "{}", s)
    }
}

/// How command output is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Pretty,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Pretty }
    }
}

/// Print `value` as JSON, or call `pretty` for the human rendering.
pub fn emit<T: Serialize>(fmt: OutputFmt, value: &T, pretty: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => tracing::error!(error = %e, "failed to serialise output"),
        },
        OutputFmt::Pretty => pretty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_use_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&Goal::FatLoss).unwrap();
        assert_eq!(json, "\"fat-loss\"");

        let level: ExperienceLevel = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(level, ExperienceLevel::Advanced);
    }

    #[test]
    fn display_matches_serde_names() {
        assert_eq!(Goal::FatLoss.to_string(), "fat-loss");
        assert_eq!(ExperienceLevel::Beginner.to_string(), "beginner");
    }
}
