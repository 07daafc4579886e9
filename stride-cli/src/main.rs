use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stride_core::{
    ContentCatalog, Direction, Recurrence, StaticCatalog, Task, TaskKind, User, WeekdaySet,
};

mod state;

use state::UserState;

#[derive(Parser, Debug)]
#[command(
    name = "stride",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STRIDE_BUILD_SHA"), ")"),
    about = "Gamified task scoring engine CLI"
)]
struct Cli {
    /// State file (default: ~/.stride/state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a fresh state file for one user
    Init {
        #[arg(long, default_value = "me")]
        user: String,

        /// IANA timezone, e.g. America/Chicago
        #[arg(long)]
        timezone: Option<String>,

        /// Hour (0-23) the day rolls over
        #[arg(long, default_value_t = 0)]
        day_start: u32,
    },

    /// Add a task
    Add {
        #[arg(long, value_parser = parse_kind)]
        kind: TaskKind,

        title: String,

        /// Task id (default: derived from the title)
        #[arg(long)]
        id: Option<String>,

        /// Dailies: repeat every N days (mutually exclusive with --weekly)
        #[arg(long)]
        every_x: Option<u32>,

        /// Dailies: comma-separated weekdays, e.g. mon,wed,fri
        #[arg(long)]
        weekly: Option<String>,

        /// Rewards: price in gold (default from the catalog)
        #[arg(long)]
        value: Option<f64>,
    },

    /// List tasks due right now
    Due,

    /// Score a task up (or down with --down)
    Score {
        id: String,

        #[arg(long)]
        down: bool,
    },

    /// Run the end-of-day rollover up to now
    Cron,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let path = match cli.state {
        Some(p) => p,
        None => state::default_state_path()?,
    };
    let now = Utc::now();
    let catalog = StaticCatalog;

    match cli.command {
        Command::Init {
            user,
            timezone,
            day_start,
        } => {
            let mut u = User::new(user, now);
            if let Some(tz) = timezone {
                u.preferences.timezone =
                    Some(tz.parse().map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?);
            }
            if day_start > 23 {
                bail!("day-start must be in 0..=23");
            }
            u.preferences.day_start = day_start;

            let st = UserState {
                user: u,
                tasks: Vec::new(),
            };
            state::write_state(&path, &st)?;
            println!("Initialized {}", path.display());
        }

        Command::Add {
            kind,
            title,
            id,
            every_x,
            weekly,
            value,
        } => {
            let mut st = state::read_state(&path)?;
            let id = id.unwrap_or_else(|| slug(&title));
            if st.tasks.iter().any(|t| t.id == id) {
                bail!("task id already exists: {id}");
            }

            let defaults = catalog.task_defaults(kind);
            let mut task = Task::new(id.clone(), title, kind, now)
                .with_value(value.unwrap_or(defaults.value))
                .with_directions(defaults.up, defaults.down);

            if kind == TaskKind::Daily {
                let start = stride_core::time::local_day(now, &st.user.preferences);
                let rec = match (&weekly, every_x) {
                    (Some(days), None) => Recurrence::weekly(start, parse_weekdays(days)?),
                    (None, every) => Recurrence::daily(start, every.unwrap_or(1)),
                    (Some(_), Some(_)) => bail!("--weekly and --every-x are mutually exclusive"),
                };
                task = task.with_recurrence(rec).map_err(|e| anyhow::anyhow!("{e}"))?;
            } else if weekly.is_some() || every_x.is_some() {
                bail!("recurrence options only apply to dailies");
            }

            st.user.tasks_order.push(kind, id.clone());
            st.tasks.push(task);
            state::write_state(&path, &st)?;
            println!("Added {id}");
        }

        Command::Due => {
            let st = state::read_state(&path)?;
            let mut any = false;
            for task in &st.tasks {
                match stride_core::is_due(task, now, &st.user.preferences) {
                    Ok(true) => {
                        any = true;
                        println!(
                            "[{:?}] {} | {} | value={:.2} streak={}",
                            stride_core::tier(task.value),
                            task.id,
                            task.title,
                            task.value,
                            task.streak
                        );
                    }
                    Ok(false) => {}
                    Err(e) => eprintln!("skipping {}: {e}", task.id),
                }
            }
            if !any {
                println!("Nothing due.");
            }
        }

        Command::Score { id, down } => {
            let mut st = state::read_state(&path)?;
            let direction = if down { Direction::Down } else { Direction::Up };

            let mut user = st.user.clone();
            let task = st
                .task_mut(&id)
                .with_context(|| format!("no task with id {id}"))?;
            let out = stride_core::complete(task, direction, &mut user, now, &catalog)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            st.user = user;

            if out.no_op {
                println!("No change (already in that state).");
            } else {
                println!(
                    "exp {:+.2} | gp {:+.2} | hp {:+.2} | mp {:+.2} | value -> {:.2}",
                    out.delta.exp, out.delta.gp, out.delta.hp, out.delta.mp, out.delta.new_task_value
                );
                if out.levels_gained > 0 {
                    println!("Level up! Now level {}", st.user.stats.lvl);
                }
                if out.died {
                    println!("You died. (hp hit the floor)");
                }
            }
            state::write_state(&path, &st)?;
        }

        Command::Cron => {
            let mut st = state::read_state(&path)?;
            let out = stride_core::run_cron(&mut st.user, &mut st.tasks, now, &catalog);

            println!(
                "Processed {} day(s): {} miss(es), damage {:.2}, hp {:.2}",
                out.days_processed, out.misses, out.damage, st.user.stats.hp
            );
            if out.died {
                println!("You died. (hp hit the floor)");
            }
            for d in &out.diagnostics {
                eprintln!("skipped {}: {}", d.task_id, d.error);
            }
            state::write_state(&path, &st)?;
        }
    }

    Ok(())
}

fn parse_kind(s: &str) -> std::result::Result<TaskKind, String> {
    match s {
        "habit" => Ok(TaskKind::Habit),
        "daily" => Ok(TaskKind::Daily),
        "todo" => Ok(TaskKind::Todo),
        "reward" => Ok(TaskKind::Reward),
        other => Err(format!("unknown kind: {other} (habit|daily|todo|reward)")),
    }
}

fn parse_weekdays(s: &str) -> Result<WeekdaySet> {
    use chrono::Weekday;
    let mut set = WeekdaySet::empty();
    for part in s.split(',') {
        let day = match part.trim().to_lowercase().as_str() {
            "mon" => Weekday::Mon,
            "tue" => Weekday::Tue,
            "wed" => Weekday::Wed,
            "thu" => Weekday::Thu,
            "fri" => Weekday::Fri,
            "sat" => Weekday::Sat,
            "sun" => Weekday::Sun,
            other => bail!("unknown weekday: {other}"),
        };
        set = set.with(day);
    }
    if set.is_empty() {
        bail!("--weekly needs at least one weekday");
    }
    Ok(set)
}

fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
