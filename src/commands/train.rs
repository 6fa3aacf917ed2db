use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Local;
use colored::Colorize;
use repcycle::advisor::Advisor;
use repcycle::config::Config;
use repcycle::error::CoreError;
use repcycle::models::{ExerciseId, Origin, Progress, UserProfile};
use repcycle::persist::SaveDebouncer;
use repcycle::review::request_review;
use repcycle::session::{Phase, Session};
use repcycle::store::{ProfileStore, ProgressStore, SqliteStore};
use repcycle::timer::Clock;
use repcycle::utils::{format_duration, format_weight};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::workout::print_workout;
use super::{gemini, load_progress};

const HELP: &str = "\
commands:
  show                 workout, timer and phase
  start                start the session timer
  set <ex> <set>       toggle a set (1-based)
  weight <ex> <kg>     change the working weight
  done <ex>            toggle an exercise as finished
  finish               finish the workout and review suggestions
  apply                apply the suggestions and begin the next cycle
  discard              drop the suggestions
  resume               resume a stopped timer
  reset                reset the timer to zero
  help                 this text
  quit                 save and leave";

/// One line typed at the training prompt. Indices are 1-based as typed.
#[derive(Debug, Clone, PartialEq)]
enum TrainCmd {
    Show,
    Start,
    Set { exercise: usize, set: usize },
    Weight { exercise: usize, kg: f64 },
    Done { exercise: usize },
    Finish,
    Apply,
    Discard,
    Resume,
    Reset,
    Help,
    Quit,
}

fn index_arg(raw: Option<&str>, what: &str) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| format!("missing {what}"))?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("{what} must be a number starting at 1, got `{raw}`")),
    }
}

/// `Ok(None)` for a blank line.
fn parse_line(line: &str) -> Result<Option<TrainCmd>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let cmd = match head.to_ascii_lowercase().as_str() {
        "show" | "ls" => TrainCmd::Show,
        "start" => TrainCmd::Start,
        "set" | "s" => TrainCmd::Set {
            exercise: index_arg(words.next(), "exercise")?,
            set: index_arg(words.next(), "set")?,
        },
        "weight" | "w" => {
            let exercise = index_arg(words.next(), "exercise")?;
            let raw = words.next().ok_or("missing weight")?;
            let kg = raw
                .trim_end_matches("kg")
                .parse::<f64>()
                .map_err(|_| format!("weight must be a number, got `{raw}`"))?;
            TrainCmd::Weight { exercise, kg }
        }
        "done" | "d" => TrainCmd::Done {
            exercise: index_arg(words.next(), "exercise")?,
        },
        "finish" => TrainCmd::Finish,
        "apply" | "confirm" => TrainCmd::Apply,
        "discard" => TrainCmd::Discard,
        "resume" => TrainCmd::Resume,
        "reset" => TrainCmd::Reset,
        "help" | "?" => TrainCmd::Help,
        "quit" | "q" | "exit" => TrainCmd::Quit,
        other => return Err(format!("unknown command `{other}`, try `help`")),
    };

    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument `{extra}`"));
    }
    Ok(Some(cmd))
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Trainer<'a> {
    session: Session,
    progress: Progress,
    saver: SaveDebouncer,
    clock: Clock,
    advisor: Option<&'a dyn Advisor>,
    profile: Option<UserProfile>,
    review_timeout: Duration,
}

impl Trainer<'_> {
    /// Map a 1-based position to the exercise id, warning when out of range.
    fn exercise_id(&self, exercise: usize) -> Option<ExerciseId> {
        let id = exercise
            .checked_sub(1)
            .and_then(|i| self.session.workout().exercises.get(i))
            .map(|e| e.id);
        if id.is_none() {
            println!("{} no exercise {} in this workout", "warning:".yellow().bold(), exercise);
        }
        id
    }

    /// Copy the session's workout into the plan and queue a save.
    fn persist(&mut self) {
        if let Some(slot) = self.progress.current_mut() {
            *slot = self.session.workout().clone();
        }
        self.saver.schedule(self.progress.clone());
    }

    fn show(&self) {
        print_workout(self.session.workout());
        let timer = format_duration(self.session.elapsed_secs());
        let clock = if self.session.is_ticking() {
            timer.green().bold()
        } else {
            timer.dimmed()
        };
        println!("  {} {}  {}", "timer".cyan(), clock, self.session.phase().name().dimmed());
    }

    fn show_suggestions(&self) {
        let Some(suggestions) = self.session.suggestions() else {
            return;
        };
        println!("{}", "Next session:".cyan().bold());
        for s in suggestions {
            let tag = match s.origin {
                Origin::Advisor => "ai".magenta(),
                Origin::Fallback => "rule".blue(),
            };
            println!(
                "  {:<28} {} [{}]",
                s.exercise_name,
                format_weight(s.suggested_weight).yellow().bold(),
                tag
            );
            println!("    {}", s.message.dimmed());
        }
        println!("Type `apply` to start the next cycle or `discard` to drop these.");
    }

    async fn finish(&mut self) -> Result<(), CoreError> {
        self.clock.stop();
        println!("{}", "Reviewing your session...".dimmed());

        let outcome = tokio::select! {
            r = request_review(
                &mut self.session,
                self.advisor,
                self.profile.as_ref(),
                self.review_timeout,
            ) => Some(r),
            _ = signal::ctrl_c() => None,
        };

        match outcome {
            Some(r) => {
                r?;
                self.progress.record_completion(Local::now().date_naive());
                self.persist();
                self.show_suggestions();
            }
            None => {
                self.session.cancel_review()?;
                println!("{} review cancelled, timer stopped", "info:".blue().bold());
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, cmd: TrainCmd) -> Result<Flow, CoreError> {
        match cmd {
            TrainCmd::Show => {
                self.show();
                self.show_suggestions();
            }
            TrainCmd::Start => {
                self.session.start()?;
                println!("{} timer started", "info:".blue().bold());
            }
            TrainCmd::Set { exercise, set } => {
                let Some(id) = self.exercise_id(exercise) else {
                    return Ok(Flow::Continue);
                };
                let done = self.session.toggle_set(id, set - 1)?;
                self.persist();
                let mark = if done { "done".green() } else { "undone".yellow() };
                println!("  set {} of exercise {} {}", set, exercise, mark);
            }
            TrainCmd::Weight { exercise, kg } => {
                let Some(id) = self.exercise_id(exercise) else {
                    return Ok(Flow::Continue);
                };
                let stored = self.session.update_weight(id, kg)?;
                self.persist();
                println!("  exercise {} now at {}", exercise, format_weight(stored).yellow());
            }
            TrainCmd::Done { exercise } => {
                let Some(id) = self.exercise_id(exercise) else {
                    return Ok(Flow::Continue);
                };
                let finished = self.session.toggle_exercise_finished(id)?;
                self.persist();
                let mark = if finished { "finished".green() } else { "reopened".yellow() };
                println!("  exercise {} {}", exercise, mark);
                if self.session.workout().all_finished() {
                    println!("All exercises finished. Type `finish` for next-session suggestions.");
                }
            }
            TrainCmd::Finish => self.finish().await?,
            TrainCmd::Apply => {
                self.session.confirm_cycle()?;
                self.persist();
                println!("{} suggestions applied, next cycle started", "info:".blue().bold());
                self.show();
            }
            TrainCmd::Discard => {
                self.session.discard_cycle()?;
                println!("{} suggestions discarded, timer stopped (`resume` to continue)", "info:".blue().bold());
            }
            TrainCmd::Resume => self.session.resume_timer()?,
            TrainCmd::Reset => {
                self.session.reset_timer()?;
                println!("  timer at {}", format_duration(0));
            }
            TrainCmd::Help => println!("{HELP}"),
            TrainCmd::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }
}

fn prompt() {
    use std::io::Write;
    print!("{} ", ">".cyan().bold());
    let _ = std::io::stdout().flush();
}

pub async fn handle(store: SqliteStore, cfg: &Config, user_id: &str, offline: bool) -> Result<()> {
    let progress = load_progress(&store, user_id).await?;
    let Some(workout) = progress.current().cloned() else {
        bail!("no workout plan yet, import one with `workout import <pdf>`");
    };
    let profile = store.load_profile(user_id).await?;

    let client = if offline { None } else { gemini(cfg) };
    if client.is_none() {
        info!("no advisor available, suggestions use the built-in rules");
    }

    let (tick_tx, mut tick_rx) = mpsc::channel(8);
    let store: Arc<dyn ProgressStore> = Arc::new(store);
    let mut trainer = Trainer {
        session: Session::new(workout),
        progress,
        saver: SaveDebouncer::spawn(store, user_id, cfg.save_delay()),
        clock: Clock::new(tick_tx),
        advisor: client.as_ref().map(|c| c as &dyn Advisor),
        profile,
        review_timeout: cfg.review_timeout(),
    };

    trainer.show();
    println!("Type `start` to begin, `help` for commands.");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(cmd)) => match trainer.dispatch(cmd).await {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e @ CoreError::InvalidStateTransition { .. }) => {
                            println!("{} {}", "warning:".yellow().bold(), e)
                        }
                        Err(e) => println!("{} {}", "error:".red().bold(), e),
                    },
                    Err(msg) => println!("{} {}", "warning:".yellow().bold(), msg),
                }
                trainer.clock.sync(trainer.session.is_ticking());
                prompt();
            }
            Some(()) = tick_rx.recv() => {
                if trainer.session.tick() {
                    debug!(elapsed = trainer.session.elapsed_secs(), "tick");
                }
            }
            _ = signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    if matches!(trainer.session.phase(), Phase::AwaitingReview { .. }) {
        trainer.session.cancel_review()?;
    }
    trainer.clock.stop();
    trainer.saver.flush().await;
    println!("{} progress saved", "info:".blue().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_one_based_indices() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(
            parse_line("set 2 3"),
            Ok(Some(TrainCmd::Set { exercise: 2, set: 3 }))
        );
        assert_eq!(
            parse_line("weight 1 42.5kg"),
            Ok(Some(TrainCmd::Weight { exercise: 1, kg: 42.5 }))
        );
        assert_eq!(parse_line("DONE 4"), Ok(Some(TrainCmd::Done { exercise: 4 })));
        assert_eq!(parse_line("q"), Ok(Some(TrainCmd::Quit)));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_line("set 0 1").is_err());
        assert!(parse_line("set 1").is_err());
        assert!(parse_line("weight 1 heavy").is_err());
        assert!(parse_line("start now").is_err());
        assert!(parse_line("dance").is_err());
    }
}
