use anyhow::{bail, Context, Result};
use autoplan_core::time::{local_date, parse_timezone};
use autoplan_core::{
    autoplan, conflict_summary, detect_conflicts, suggestions, BusyTimeBlock, DependencyGraph,
    PlanningOptions, Task,
};
use autoplan_ingest::{load_snapshot_json, parse_busy, BusyFormat, TaskSnapshot};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod calendar;
mod config;
mod logging;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("AUTOPLAN_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "autoplan", version = VERSION, about = "Dependency-aware task autoplanner")]
struct Cli {
    /// Log level (overrides AUTOPLAN_LOG and config.toml)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assign planned dates to unplanned tasks within the capacity budget
    Plan {
        /// Task snapshot JSON ({"tasks": [...], "busy": [...]})
        #[arg(long)]
        snapshot: PathBuf,

        /// Extra busy time (.ics or .csv)
        #[arg(long)]
        busy: Option<PathBuf>,

        /// First day of the horizon (default: today in the planning timezone)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Write the planned tasks back to the snapshot file
        #[arg(long)]
        write: bool,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        planning: PlanningArgs,
    },

    /// Report time overlaps and overloaded days
    Conflicts {
        #[arg(long)]
        snapshot: PathBuf,

        /// Print resolution suggestions under each conflict
        #[arg(long)]
        suggest: bool,

        #[command(flatten)]
        planning: PlanningArgs,
    },

    /// Inspect and edit task dependencies
    Deps {
        #[arg(long)]
        snapshot: PathBuf,

        #[command(subcommand)]
        command: DepsCommand,
    },

    /// Export planned tasks as timeblocks in an ICS calendar
    ExportIcs {
        #[arg(long)]
        snapshot: PathBuf,

        /// Local hour at which each day's first block starts
        #[arg(long, default_value_t = 9)]
        day_start_hour: u32,

        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        planning: PlanningArgs,
    },

    /// Manage ~/.autoplan/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DepsCommand {
    /// Whether every prerequisite of a task is done
    CanStart { task: String },

    /// Add "TASK depends on ON", rejecting cycles
    Add {
        task: String,
        on: String,

        /// Persist the new edge to the snapshot file
        #[arg(long)]
        write: bool,
    },

    /// Tasks that become startable once TASK is completed
    Unlocked { task: String },

    /// Print tasks prerequisites-first
    Order,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective config
    Show,
}

/// Per-invocation overrides of the `[planning]` config section.
#[derive(Args, Debug, Default, Clone)]
struct PlanningArgs {
    #[arg(long)]
    weekly_capacity: Option<u32>,

    #[arg(long)]
    daily_capacity: Option<u32>,

    /// Treat Saturday and Sunday as workdays
    #[arg(long)]
    weekends: bool,

    #[arg(long)]
    horizon_days: Option<u32>,

    /// IANA zone name, e.g. America/Chicago
    #[arg(long)]
    timezone: Option<String>,

    /// Leave tasks with unfinished prerequisites unplanned
    #[arg(long)]
    respect_dependencies: bool,
}

impl PlanningArgs {
    fn apply(&self, mut opts: PlanningOptions) -> Result<PlanningOptions> {
        if let Some(w) = self.weekly_capacity {
            opts.weekly_capacity_minutes = w;
        }
        if let Some(d) = self.daily_capacity {
            opts.daily_capacity_minutes = Some(d);
        }
        if self.weekends {
            opts.allow_weekends = true;
        }
        if let Some(h) = self.horizon_days {
            opts.horizon_days = h;
        }
        if let Some(tz) = &self.timezone {
            opts.timezone = parse_timezone(tz)?;
        }
        if self.respect_dependencies {
            opts.respect_dependencies = true;
        }
        opts.validate().context("invalid planning options")?;
        Ok(opts)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands run without loading config.toml so a broken file can be inspected and fixed.
    let command = match cli.command {
        Command::Config { command } => {
            logging::init_logging(cli.log_level, "warn")?;
            return run_config(command);
        }
        other => other,
    };

    let cfg = config::load_config()?;
    logging::init_logging(cli.log_level, &cfg.log.level)?;

    match command {
        Command::Plan {
            snapshot,
            busy,
            today,
            write,
            json,
            planning,
        } => {
            let opts = planning.apply(cfg.planning)?;
            run_plan(&snapshot, busy.as_deref(), today, write, json, &opts).await?;
        }

        Command::Conflicts {
            snapshot,
            suggest,
            planning,
        } => {
            let opts = planning.apply(cfg.planning)?;
            let snap = read_snapshot(&snapshot).await?;
            print_conflicts(&snap.tasks, &opts, suggest);
        }

        Command::Deps { snapshot, command } => {
            run_deps(&snapshot, command).await?;
        }

        Command::ExportIcs {
            snapshot,
            day_start_hour,
            out,
            planning,
        } => {
            let opts = planning.apply(cfg.planning)?;
            let snap = read_snapshot(&snapshot).await?;
            let events = calendar::planned_timeblocks(&snap.tasks, opts.timezone, day_start_hour);
            let ics = calendar::events_to_ics(&events);
            match out {
                Some(path) => {
                    state::write_atomic(&path, &ics).await?;
                    println!("Wrote {} events to {}", events.len(), path.display());
                }
                None => print!("{ics}"),
            }
        }

        Command::Config { .. } => {}
    }

    Ok(())
}

fn run_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => config::init_config(),
        ConfigCommand::Show => {
            let path = config::config_path()?;
            println!("# {}", path.display());
            let raw = if path.exists() {
                std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?
            } else {
                String::new()
            };
            let (text, problem) = config::render_config(&raw);
            print!("{text}");
            if let Some(e) = problem {
                eprintln!("config.toml is invalid: {e:#}");
            }
            Ok(())
        }
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))
}

async fn read_snapshot(path: &Path) -> Result<TaskSnapshot> {
    let text = read_text(path).await?;
    load_snapshot_json(&text).with_context(|| format!("load {}", path.display()))
}

/// Read the snapshot and optional busy file concurrently.
async fn load_inputs(
    snapshot: &Path,
    busy: Option<&Path>,
    opts: &PlanningOptions,
) -> Result<(TaskSnapshot, Vec<BusyTimeBlock>)> {
    let busy_text = async {
        match busy {
            Some(p) => read_text(p).await.map(Some),
            None => Ok(None),
        }
    };
    let (snap, busy_text) = tokio::try_join!(read_snapshot(snapshot), busy_text)?;

    let mut blocks = snap.busy.clone();
    if let (Some(path), Some(text)) = (busy, busy_text) {
        let format = BusyFormat::from_path(path)
            .with_context(|| format!("unknown busy file type (want .ics or .csv): {}", path.display()))?;
        let parsed = parse_busy(&text, format, opts.timezone)
            .with_context(|| format!("parse {}", path.display()))?;
        debug!(path = %path.display(), blocks = parsed.len(), "loaded busy time");
        blocks.extend(parsed);
    }

    Ok((snap, blocks))
}

async fn run_plan(
    snapshot: &Path,
    busy: Option<&Path>,
    today: Option<NaiveDate>,
    write: bool,
    json: bool,
    opts: &PlanningOptions,
) -> Result<()> {
    let (snap, blocks) = load_inputs(snapshot, busy, opts).await?;
    let today = today.unwrap_or_else(|| local_date(Utc::now(), opts.timezone));
    info!(%today, tasks = snap.tasks.len(), busy = blocks.len(), "planning");

    let outcome = autoplan(&snap.tasks, &blocks, opts, today);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("serialize outcome")?
        );
    } else {
        println!("# Plan from {today}\n");
        println!("Scheduled {} task(s)", outcome.scheduled_count);
        for (id, day) in &outcome.placements {
            let title = snap.task(id).map(|t| t.title.as_str()).unwrap_or("");
            println!("- {day} {id} | {title}");
        }
        if !outcome.unscheduled.is_empty() {
            println!("\nUnscheduled:");
            for u in &outcome.unscheduled {
                println!("- {} ({:?})", u.task_id, u.reason);
            }
        }
        println!("\nDay load:");
        for load in &outcome.day_loads {
            println!(
                "- {} {}: {}/{} min",
                load.date,
                load.date.format("%a"),
                load.committed_minutes,
                load.capacity_minutes
            );
        }
    }

    if write {
        let updated = TaskSnapshot {
            tasks: outcome.tasks,
            busy: snap.busy,
        };
        state::write_atomic(snapshot, &updated.to_json_pretty()?).await?;
        eprintln!("Updated {}", snapshot.display());
    }

    Ok(())
}

fn print_conflicts(tasks: &[Task], opts: &PlanningOptions, suggest: bool) {
    let conflicts = detect_conflicts(tasks, opts);
    println!("{}", conflict_summary(&conflicts));
    for c in &conflicts {
        println!("- [{:?}] {}", c.level, c.description);
        if !c.involved_organizations.is_empty() {
            let orgs: Vec<&str> = c.involved_organizations.iter().map(String::as_str).collect();
            println!("  orgs: {}", orgs.join(", "));
        }
        if suggest {
            for s in suggestions(c, tasks) {
                println!("  * {s}");
            }
        }
    }
}

async fn run_deps(snapshot: &Path, command: DepsCommand) -> Result<()> {
    let mut snap = read_snapshot(snapshot).await?;

    match command {
        DepsCommand::CanStart { task } => {
            let graph = DependencyGraph::new(&snap.tasks);
            let Some(t) = graph.get(&task) else {
                bail!("no such task: {task}");
            };
            let ready = graph.can_start(t);
            println!("{}: {}", t.id, if ready { "ready" } else { "blocked" });
            if !ready {
                for dep in graph.dependency_chain(&task).iter().skip(1).filter(|d| !d.is_done) {
                    println!("  waiting on {} | {}", dep.id, dep.title);
                }
            }
        }

        DepsCommand::Add { task, on, write } => {
            if snap.task(&task).is_none() {
                bail!("no such task: {task}");
            }
            let edge = DependencyGraph::new(&snap.tasks).validate_dependency(&task, &on)?;
            if edge.already_present {
                println!("{task} already depends on {on}");
                return Ok(());
            }
            edge.apply(&mut snap.tasks);
            println!("{task} now depends on: {}", edge.depends_on_task_ids.join(", "));
            if write {
                state::write_atomic(snapshot, &snap.to_json_pretty()?).await?;
                eprintln!("Updated {}", snapshot.display());
            }
        }

        DepsCommand::Unlocked { task } => {
            let Some(done) = snap.tasks.iter_mut().find(|t| t.id == task) else {
                bail!("no such task: {task}");
            };
            done.is_done = true;
            let graph = DependencyGraph::new(&snap.tasks);
            let lines = graph.unlock_notifications(&task);
            if lines.is_empty() {
                println!("Completing {task} unlocks nothing");
            }
            for line in lines {
                println!("{line}");
            }
        }

        DepsCommand::Order => {
            let graph = DependencyGraph::new(&snap.tasks);
            let blocked = graph.blocked_task_ids();
            for t in graph.topological_order() {
                let mark = if t.is_done {
                    "done"
                } else if blocked.contains(&t.id) {
                    "blocked"
                } else {
                    "ready"
                };
                println!("{:<8} {} | {}", mark, t.id, t.title);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_plan_with_overrides() {
        let cli = Cli::try_parse_from([
            "autoplan",
            "--log-level",
            "debug",
            "plan",
            "--snapshot",
            "tasks.json",
            "--today",
            "2026-03-02",
            "--weekends",
            "--timezone",
            "America/Chicago",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        let Command::Plan { today, planning, .. } = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(today, NaiveDate::from_ymd_opt(2026, 3, 2));
        let opts = planning.apply(PlanningOptions::default()).unwrap();
        assert!(opts.allow_weekends);
        assert_eq!(opts.timezone, chrono_tz::America::Chicago);
    }

    #[test]
    fn overrides_are_validated() {
        let args = PlanningArgs {
            horizon_days: Some(0),
            ..PlanningArgs::default()
        };
        assert!(args.apply(PlanningOptions::default()).is_err());

        let args = PlanningArgs {
            timezone: Some("Mars/Olympus".into()),
            ..PlanningArgs::default()
        };
        assert!(args.apply(PlanningOptions::default()).is_err());
    }

    #[test]
    fn respect_dependencies_flag_opts_in() {
        let cli = Cli::try_parse_from([
            "autoplan", "plan", "--snapshot", "t.json", "--respect-dependencies",
        ])
        .unwrap();
        let Command::Plan { planning, .. } = cli.command else {
            panic!("expected plan");
        };
        assert!(!PlanningOptions::default().respect_dependencies);
        assert!(planning.apply(PlanningOptions::default()).unwrap().respect_dependencies);
    }

    #[test]
    fn config_commands_parse_without_other_arguments() {
        let cli = Cli::try_parse_from(["autoplan", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                command: ConfigCommand::Show
            }
        ));
    }

    #[test]
    fn cli_parses_deps_add() {
        let cli = Cli::try_parse_from([
            "autoplan", "deps", "--snapshot", "t.json", "add", "slides", "essay", "--write",
        ])
        .unwrap();
        let Command::Deps {
            command: DepsCommand::Add { task, on, write },
            ..
        } = cli.command
        else {
            panic!("expected deps add");
        };
        assert_eq!((task.as_str(), on.as_str(), write), ("slides", "essay", true));
    }
}
