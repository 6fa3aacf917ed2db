use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use repcycle::config::{Config, GEMINI_API_KEY};
use repcycle::types::{OutputFmt, emit};

use crate::cli::ConfigCmd;

fn shown(key: &str, val: &str) -> String {
    if key == GEMINI_API_KEY {
        "********".to_owned()
    } else {
        val.to_owned()
    }
}

pub fn handle(cmd: ConfigCmd, mut cfg: Config, config_path: &Path, fmt: OutputFmt) -> Result<()> {
    match cmd {
        ConfigCmd::List => {
            let masked: Config = Config {
                map: cfg.map.iter().map(|(k, v)| (k.clone(), shown(k, v))).collect(),
            };
            emit(fmt, &masked.map, || {
                if masked.map.is_empty() {
                    println!("{}", "(no config set)".dimmed());
                } else {
                    println!("{}", "Config:".cyan().bold());
                    for (k, v) in &masked.map {
                        println!("  {} = {}", k.green(), v);
                    }
                }
            });
        }

        ConfigCmd::Get { key } => match cfg.map.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            let display = shown(&key, &val);
            cfg.map.insert(key.clone(), val);
            cfg.save(config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), display);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
