use anyhow::{Result, bail};
use colored::Colorize;
use repcycle::models::UserProfile;
use repcycle::store::ProfileStore;
use repcycle::types::{OutputFmt, emit};
use repcycle::utils::format_weight;

use crate::cli::{ProfileArgs, ProfileCmd};

/// Overlay the given flags on an existing profile. A new profile needs at
/// least age, weight and height; level and goal have defaults.
fn merge(existing: Option<UserProfile>, args: ProfileArgs) -> Result<UserProfile> {
    let merged = match existing {
        Some(p) => UserProfile {
            age: args.age.unwrap_or(p.age),
            weight: args.weight.unwrap_or(p.weight),
            height: args.height.unwrap_or(p.height),
            gender: args.gender.unwrap_or(p.gender),
            experience_level: args.level.unwrap_or(p.experience_level),
            goal: args.goal.unwrap_or(p.goal),
        },
        None => {
            let (Some(age), Some(weight), Some(height)) = (args.age, args.weight, args.height)
            else {
                bail!("a new profile needs --age, --weight and --height");
            };
            UserProfile {
                age,
                weight,
                height,
                gender: args.gender.unwrap_or_default(),
                experience_level: args.level.unwrap_or_default(),
                goal: args.goal.unwrap_or(repcycle::types::Goal::Hypertrophy),
            }
        }
    };

    if !(merged.weight.is_finite() && merged.weight > 0.0) {
        bail!("weight must be a positive number of kg");
    }
    if !(merged.height.is_finite() && merged.height > 0.0) {
        bail!("height must be a positive number of cm");
    }
    Ok(merged)
}

fn print_profile(p: &UserProfile) {
    println!("{}", "Profile:".cyan().bold());
    println!("  {:<12} {}", "age".green(), p.age);
    println!("  {:<12} {}", "weight".green(), format_weight(p.weight));
    println!("  {:<12} {}cm", "height".green(), p.height);
    if !p.gender.is_empty() {
        println!("  {:<12} {}", "gender".green(), p.gender);
    }
    println!("  {:<12} {}", "level".green(), p.experience_level);
    println!("  {:<12} {}", "goal".green(), p.goal);
}

pub async fn handle(
    cmd: ProfileCmd,
    store: &dyn ProfileStore,
    user_id: &str,
    fmt: OutputFmt,
) -> Result<()> {
    match cmd {
        ProfileCmd::Show => match store.load_profile(user_id).await? {
            Some(p) => emit(fmt, &p, || print_profile(&p)),
            None => println!(
                "{} no profile yet, create one with `profile set`",
                "info:".blue().bold()
            ),
        },

        ProfileCmd::Set(args) => {
            let profile = merge(store.load_profile(user_id).await?, args)?;
            store.save_profile(user_id, &profile).await?;
            println!("{} profile saved", "info:".blue().bold());
            emit(fmt, &profile, || print_profile(&profile));
        }
    }
    Ok(())
}
