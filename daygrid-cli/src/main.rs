use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use daygrid_core::time::{format_hhmm, parse_hhmm_on};
use daygrid_core::{EditPlan, EditSession, TaskId, Violation, free_slots, validate_day};
use std::path::{Path, PathBuf};

mod config;
mod state;

use state::{DayFile, read_day, write_day};

#[derive(Parser, Debug)]
#[command(
    name = "daygrid",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYGRID_BUILD_SHA"), ")"),
    about = "Resolve conflicts between timed tasks on a single day"
)]
struct Cli {
    /// Engine config (default: ~/.daygrid/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report overlaps, too-short tasks and tasks outside the day
    Check { day: PathBuf },

    /// Drag one edge of a task and resolve the neighbours it hits
    Drag {
        day: PathBuf,

        #[arg(long)]
        task: String,

        #[arg(long, value_enum)]
        edge: Edge,

        /// New edge time, HH:MM
        #[arg(long)]
        to: String,

        /// Push the full chain of neighbours instead of resolving one by one
        #[arg(long)]
        cascade: bool,

        /// Write the result back to the day file
        #[arg(long)]
        write: bool,
    },

    /// Move a whole task; neighbours cascade out of the way
    Move {
        day: PathBuf,

        #[arg(long)]
        task: String,

        /// New start time, HH:MM
        #[arg(long)]
        to: String,

        #[arg(long)]
        write: bool,
    },

    /// Find the nearest free slot for a task of the given length
    Place {
        day: PathBuf,

        /// Minutes
        #[arg(long)]
        duration: i64,

        /// Preferred start, HH:MM
        #[arg(long)]
        prefer: String,

        /// Id to place (an existing task is ignored while searching)
        #[arg(long, default_value = "new")]
        id: String,
    },

    /// List grid-aligned free slots for a task of the given length
    Slots {
        day: PathBuf,

        /// Minutes
        #[arg(long)]
        duration: i64,
    },

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config to --config, or ~/.daygrid/config.toml
    Init,
    /// Print the effective config
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Edge {
    Start,
    End,
}

fn main() -> Result<()> {
    env_logger::init();
    let Cli { config: config_file, command } = Cli::parse();
    let load = || -> Result<config::Config> {
        let cfg = config::load_config(config_file.as_deref())?;
        debug!("engine config: {:?}", cfg.engine);
        Ok(cfg)
    };

    match command {
        Command::Check { day } => {
            let file = read_day(&day)?;
            let session = EditSession::new(file.date, load()?.engine)?;
            let violations = validate_day(&file.tasks, session.bounds(), session.config());
            if violations.is_empty() {
                println!("{}: {} tasks, no conflicts", file.date, file.tasks.len());
                return Ok(());
            }
            for v in &violations {
                println!("- {}", describe(v));
            }
            bail!("{} violation(s) in {}", violations.len(), day.display());
        }

        Command::Drag {
            day,
            task,
            edge,
            to,
            cascade,
            write,
        } => {
            let mut file = read_day(&day)?;
            let mut session = EditSession::new(file.date, load()?.engine)?;
            let id = TaskId::new(task);
            let at = parse_hhmm_on(file.date, &to)?;

            let plan = match (edge, cascade) {
                (Edge::Start, false) => session.drag_start_edge(&file.tasks, &id, at),
                (Edge::End, false) => session.drag_end_edge(&file.tasks, &id, at),
                (Edge::Start, true) => session.cascade_start_edge(&file.tasks, &id, at),
                (Edge::End, true) => session.cascade_end_edge(&file.tasks, &id, at),
            }
            .with_context(|| format!("drag {id} {edge:?} edge to {to}"))?;

            finish(&day, &mut file, &plan, write)?;
        }

        Command::Move { day, task, to, write } => {
            let mut file = read_day(&day)?;
            let session = EditSession::new(file.date, load()?.engine)?;
            let id = TaskId::new(task);
            let at = parse_hhmm_on(file.date, &to)?;

            let plan = session
                .move_task(&file.tasks, &id, at)
                .with_context(|| format!("move {id} to {to}"))?;

            finish(&day, &mut file, &plan, write)?;
        }

        Command::Place {
            day,
            duration,
            prefer,
            id,
        } => {
            let file = read_day(&day)?;
            let mut session = EditSession::new(file.date, load()?.engine)?;
            let preferred = parse_hhmm_on(file.date, &prefer)?;
            let slot = session.place(&file.tasks, &TaskId::new(id), preferred, positive_minutes(duration)?)?;
            println!(
                "{}-{}",
                format_hhmm(file.date, slot.start),
                format_hhmm(file.date, slot.end)
            );
        }

        Command::Slots { day, duration } => {
            let file = read_day(&day)?;
            let session = EditSession::new(file.date, load()?.engine)?;
            let slots = free_slots(
                &file.tasks,
                session.bounds(),
                positive_minutes(duration)?,
                session.config().search_step(),
            );
            if slots.is_empty() {
                println!("No free {duration} min slot on {}", file.date);
            }
            for s in slots {
                println!("{}-{}", format_hhmm(file.date, s.start), format_hhmm(file.date, s.end));
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_file.as_deref())?,
            ConfigCommand::Show => print!("{}", toml::to_string_pretty(&load()?)?),
        },
    }

    Ok(())
}

fn finish(path: &Path, file: &mut DayFile, plan: &EditPlan, write: bool) -> Result<()> {
    for u in plan.updates() {
        println!(
            "{} -> {}-{}",
            u.task_id,
            format_hhmm(file.date, u.new_start),
            format_hhmm(file.date, u.new_end)
        );
    }

    if write {
        let applied = plan.apply(&mut file.tasks);
        debug!("applied {applied} updates");
        write_day(path, file)?;
        println!("\nWrote {}", path.display());
    }
    Ok(())
}

fn positive_minutes(minutes: i64) -> Result<chrono::Duration> {
    if minutes <= 0 {
        bail!("--duration must be a positive number of minutes, got {minutes}");
    }
    Ok(chrono::Duration::minutes(minutes))
}

fn describe(v: &Violation) -> String {
    match v {
        Violation::Overlap(a, b) => format!("{a} overlaps {b}"),
        Violation::TooShort(id) => format!("{id} is shorter than the minimum duration"),
        Violation::OutOfBounds(id) => format!("{id} falls outside the day"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_must_be_positive() {
        assert_eq!(positive_minutes(30).unwrap(), chrono::Duration::minutes(30));
        assert!(positive_minutes(0).is_err());
        assert!(positive_minutes(-30).is_err());
    }
}
