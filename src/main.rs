mod config;
mod engine;
mod launch;
mod models;
mod sched;
mod storage;
mod tui;
mod utils;

use anyhow::{bail, Context, Result};
use chrono::{NaiveTime, Timelike};
use clap::{Parser, Subcommand, ValueEnum};
use fd_lock::RwLock;
use models::{AlarmId, AlarmKind, AlarmList};
use std::fs::OpenOptions;
use storage::Storage;

#[derive(Parser)]
#[command(name = "belfry")]
#[command(about = "An alarm and countdown timer panel for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive timer panel
    Run,
    /// List configured alarms
    List,
    /// Add an alarm
    Add {
        /// Alarm name
        name: String,
        /// Countdown length (e.g. 25m, 1h30m)
        #[arg(short, long, conflicts_with = "at")]
        duration: Option<String>,
        /// Time of day to fire at (HH:MM)
        #[arg(short, long)]
        at: Option<String>,
        /// Shell command to run on expiry
        #[arg(short, long, default_value = "")]
        command: String,
    },
    /// Edit an alarm by its list position
    Edit {
        /// Position as shown by `belfry list` (1-based)
        position: usize,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New countdown length (e.g. 25m, 1h30m)
        #[arg(short, long, conflicts_with = "at")]
        duration: Option<String>,
        /// New time of day to fire at (HH:MM)
        #[arg(short, long)]
        at: Option<String>,
        /// New shell command to run on expiry
        #[arg(short, long)]
        command: Option<String>,
    },
    /// Remove an alarm by its list position
    Remove {
        /// Position as shown by `belfry list` (1-based)
        position: usize,
    },
    /// Move an alarm up or down in the list
    Move {
        /// Position as shown by `belfry list` (1-based)
        position: usize,
        direction: Direction,
    },
    /// Show or change expiry options
    Options {
        /// Skip the popup when the alarm has a command
        #[arg(long)]
        suppress_popup: Option<bool>,
        /// Repeat the command after expiry
        #[arg(long)]
        repeat: Option<bool>,
        /// Total number of launches when repeating
        #[arg(long)]
        repeat_count: Option<u32>,
        /// Seconds between repeated launches
        #[arg(long)]
        repeat_interval: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new()?;

    match cli.command {
        Commands::Run => {
            let base_dir = Storage::get_base_dir()?;
            let lock_path = base_dir.join("belfry.lock");
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(lock_path)?;

            let mut lock = RwLock::new(lock_file);
            let _guard = lock.try_write().map_err(|_| {
                anyhow::anyhow!("Another Belfry panel is already running. Close it before starting a new one.")
            })?;

            let mut list = storage.load()?;
            let options = config::load_options()?;
            tui::run_panel(&mut list, options)?;

            // Persist reordering done inside the panel.
            storage.save(&list)?;
        }
        Commands::List => {
            let list = storage.load()?;
            if list.is_empty() {
                println!("No alarms configured.");
                return Ok(());
            }
            for (i, alarm) in list.iter().enumerate() {
                if alarm.command.is_empty() {
                    println!("{:>3}  {}", i + 1, alarm.info_text());
                } else {
                    println!("{:>3}  {}  $ {}", i + 1, alarm.info_text(), alarm.command);
                }
            }
        }
        Commands::Add {
            name,
            duration,
            at,
            command,
        } => {
            let kind = parse_kind(duration.as_deref(), at.as_deref())?;
            let mut list = storage.load()?;
            list.add(name.clone(), kind, command);
            storage.save(&list)?;
            println!("Added alarm '{}'.", name);
        }
        Commands::Edit {
            position,
            name,
            duration,
            at,
            command,
        } => {
            let mut list = storage.load()?;
            let id = id_at_position(&list, position)?;
            let Some(mut def) = list.get(id).cloned() else {
                bail!("No alarm at position {}", position);
            };
            if let Some(name) = name {
                def.name = name;
            }
            if let Some(command) = command {
                def.command = command;
            }
            if duration.is_some() || at.is_some() {
                def.kind = parse_kind(duration.as_deref(), at.as_deref())?;
            }
            list.update(def);
            storage.save(&list)?;
            println!("Updated alarm {}.", position);
        }
        Commands::Remove { position } => {
            let mut list = storage.load()?;
            let id = id_at_position(&list, position)?;
            list.remove(id);
            storage.save(&list)?;
            println!("Removed alarm {}.", position);
        }
        Commands::Move {
            position,
            direction,
        } => {
            let mut list = storage.load()?;
            let id = id_at_position(&list, position)?;
            let moved = match direction {
                Direction::Up => list.move_up(id),
                Direction::Down => list.move_down(id),
            };
            if moved {
                storage.save(&list)?;
            } else {
                println!("Alarm {} is already at the edge of the list.", position);
            }
        }
        Commands::Options {
            suppress_popup,
            repeat,
            repeat_count,
            repeat_interval,
        } => {
            let mut options = config::load_options()?;
            if let Some(v) = suppress_popup {
                options.suppress_popup_when_command_set = v;
            }
            if let Some(v) = repeat {
                options.repeat_enabled = v;
            }
            if let Some(v) = repeat_count {
                options.repeat_count = v;
            }
            if let Some(v) = repeat_interval {
                options.repeat_interval_secs = v;
            }
            let options = options.sanitized();
            config::save_options(&options)?;
            println!(
                "suppress popup when command set: {}",
                options.suppress_popup_when_command_set
            );
            println!("repeat enabled: {}", options.repeat_enabled);
            println!("repeat count: {}", options.repeat_count);
            println!("repeat interval: {}s", options.repeat_interval_secs);
        }
    }

    Ok(())
}

fn parse_kind(duration: Option<&str>, at: Option<&str>) -> Result<AlarmKind> {
    match (duration, at) {
        (Some(duration), None) => {
            let parsed = humantime::parse_duration(duration)
                .with_context(|| format!("Invalid duration '{}'", duration))?;
            let seconds = u32::try_from(parsed.as_secs())
                .map_err(|_| anyhow::anyhow!("Duration '{}' is too long", duration))?;
            Ok(AlarmKind::Countdown { seconds })
        }
        (None, Some(at)) => {
            let time = NaiveTime::parse_from_str(at, "%H:%M")
                .with_context(|| format!("Invalid time of day '{}', expected HH:MM", at))?;
            Ok(AlarmKind::DailyTime {
                minutes: time.hour() * 60 + time.minute(),
            })
        }
        _ => bail!("Specify exactly one of --duration or --at"),
    }
}

fn id_at_position(list: &AlarmList, position: usize) -> Result<AlarmId> {
    if position == 0 || position > list.len() {
        bail!(
            "No alarm at position {} (the list has {} entries)",
            position,
            list.len()
        );
    }
    list.iter()
        .nth(position - 1)
        .map(|a| a.id)
        .ok_or_else(|| anyhow::anyhow!("No alarm at position {}", position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_duration() {
        assert_eq!(
            parse_kind(Some("25m"), None).unwrap(),
            AlarmKind::Countdown { seconds: 1500 }
        );
        assert_eq!(
            parse_kind(Some("1h 30m"), None).unwrap(),
            AlarmKind::Countdown { seconds: 5400 }
        );
        assert!(parse_kind(Some("soon"), None).is_err());
    }

    #[test]
    fn test_parse_kind_time_of_day() {
        assert_eq!(
            parse_kind(None, Some("07:30")).unwrap(),
            AlarmKind::DailyTime { minutes: 450 }
        );
        assert_eq!(
            parse_kind(None, Some("00:00")).unwrap(),
            AlarmKind::DailyTime { minutes: 0 }
        );
        assert!(parse_kind(None, Some("25:99")).is_err());
    }

    #[test]
    fn test_parse_kind_requires_exactly_one() {
        assert!(parse_kind(None, None).is_err());
        assert!(parse_kind(Some("5m"), Some("07:30")).is_err());
    }

    #[test]
    fn test_id_at_position_bounds() {
        let mut list = AlarmList::default();
        list.add(
            "a".to_string(),
            AlarmKind::Countdown { seconds: 1 },
            String::new(),
        );
        assert!(id_at_position(&list, 0).is_err());
        assert!(id_at_position(&list, 2).is_err());
        assert!(id_at_position(&list, 1).is_ok());
    }
}
