use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use schedule_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "groupsched")]
#[command(about = "University group class schedules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the first day of semester week 1 (YYYY-MM-DD)
    #[arg(long, global = true)]
    semester_start: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the lessons a group has on a date
    Day {
        /// Group number, e.g. 221701
        group: String,

        /// Target date (YYYY-MM-DD)
        date: String,

        /// Read the timetable payload from a file or directory instead of the API
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the weekday label and semester week of a date
    WeekOf {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Manage locally known groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Manage stored schedule entries
    Lesson {
        #[command(subcommand)]
        command: LessonCommands,
    },

    /// Write a configuration file with the current settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List all groups
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one group with its stored schedules
    Show { id: u64 },
    /// Register a group
    Add { number: String },
    /// Change a group's number
    Rename { id: u64, number: String },
    /// Delete a group and its stored schedules
    Remove { id: u64 },
}

#[derive(Subcommand)]
enum LessonCommands {
    /// List stored schedules
    List {
        /// Only schedules of this group
        #[arg(long)]
        group_id: Option<u64>,

        #[arg(long)]
        json: bool,
    },
    /// Show one stored schedule
    Show { id: u64 },
    /// Store a schedule entry
    Add(LessonArgs),
    /// Replace a stored schedule entry
    Update {
        id: u64,
        #[command(flatten)]
        fields: LessonArgs,
    },
    /// Delete a stored schedule entry
    Remove { id: u64 },
}

#[derive(Args)]
struct LessonArgs {
    #[arg(long)]
    group_id: u64,

    #[arg(long)]
    subject: String,

    #[arg(long)]
    lesson_type: String,

    /// Time range, e.g. 09:00-10:20
    #[arg(long)]
    time: String,

    #[arg(long, default_value = "")]
    auditorium: String,
}

impl From<LessonArgs> for ScheduleDraft {
    fn from(args: LessonArgs) -> Self {
        ScheduleDraft {
            subject: args.subject,
            lesson_type: args.lesson_type,
            time: args.time,
            auditorium: args.auditorium,
            group_id: args.group_id,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    schedule_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match (&cli.command, &cli.config) {
        (Commands::InitConfig { .. }, _) => Config::default(),
        (_, Some(path)) => Config::load_from(path)?,
        (_, None) => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    if let Some(start) = cli.semester_start {
        config.semester.start = start;
    }
    tracing::debug!(
        data_dir = ?config.data.data_dir,
        semester_start = %config.semester.start,
        "Resolved configuration"
    );

    let store = RecordStore::new(config.data.records_path());

    match cli.command {
        Commands::Day {
            group,
            date,
            payload,
            json,
        } => cmd_day(&config, store, &group, &date, payload, json),
        Commands::WeekOf { date } => cmd_week_of(&config, &date),
        Commands::Group { command } => cmd_group(&store, command),
        Commands::Lesson { command } => cmd_lesson(&store, command),
        Commands::InitConfig { force } => cmd_init_config(&config, cli.config, force),
    }
}

fn cmd_init_config(config: &Config, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(Config::default_config_path);
    if path.exists() && !force {
        return Err(Error::Conflict(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    config.save_to(&path)?;
    println!("✓ Wrote configuration to {}", path.display());
    Ok(())
}

fn cmd_day(
    config: &Config,
    store: RecordStore,
    group: &str,
    date: &str,
    payload: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let day = match payload {
        Some(path) => {
            let service =
                ScheduleService::new(store, FileScheduleSource::new(path), config.semester.start);
            service.day_schedule(group, date)?
        }
        None => {
            let source = HttpScheduleSource::new(&config.source)?;
            let service = ScheduleService::new(store, source, config.semester.start);
            service.day_schedule(group, date)?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        display_day(&day);
    }
    Ok(())
}

fn cmd_week_of(config: &Config, date: &str) -> Result<()> {
    let date = parse_target_date(date)?;
    println!(
        "{} {} (week {})",
        date,
        localize(date),
        semester_week(config.semester.start, date)
    );
    Ok(())
}

fn cmd_group(store: &RecordStore, command: GroupCommands) -> Result<()> {
    match command {
        GroupCommands::List { json } => {
            let groups = store.find_all_groups()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else if groups.is_empty() {
                println!("No groups.");
            } else {
                for group in &groups {
                    println!(
                        "{:>4}  {}  ({} stored schedules)",
                        group.id,
                        group.group_number,
                        group.schedules.len()
                    );
                }
            }
        }
        GroupCommands::Show { id } => {
            let group = store.find_group(id)?;
            println!("{}", serde_json::to_string_pretty(&group)?);
        }
        GroupCommands::Add { number } => {
            let group = store.create_group(&number)?;
            println!("✓ Added group {} (id {})", group.group_number, group.id);
        }
        GroupCommands::Rename { id, number } => {
            let group = store.update_group(id, &number)?;
            println!("✓ Group {} is now {}", group.id, group.group_number);
        }
        GroupCommands::Remove { id } => {
            store.delete_group(id)?;
            println!("✓ Removed group {}", id);
        }
    }
    Ok(())
}

fn cmd_lesson(store: &RecordStore, command: LessonCommands) -> Result<()> {
    match command {
        LessonCommands::List { group_id, json } => {
            let schedules = match group_id {
                Some(id) => store.find_schedules_by_group(id)?,
                None => store.find_all_schedules()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&schedules)?);
            } else if schedules.is_empty() {
                println!("No stored schedules.");
            } else {
                for s in &schedules {
                    println!(
                        "{:>4}  group {:<4} {}  {} [{}]  {}",
                        s.id, s.group_id, s.time, s.subject, s.lesson_type, s.auditorium
                    );
                }
            }
        }
        LessonCommands::Show { id } => {
            let schedule = store.find_schedule(id)?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        LessonCommands::Add(fields) => {
            let schedule = store.create_schedule(fields.into())?;
            println!("✓ Stored schedule {} (id {})", schedule.subject, schedule.id);
        }
        LessonCommands::Update { id, fields } => {
            let schedule = store.update_schedule(id, fields.into())?;
            println!("✓ Updated schedule {}", schedule.id);
        }
        LessonCommands::Remove { id } => {
            store.delete_schedule(id)?;
            println!("✓ Removed schedule {}", id);
        }
    }
    Ok(())
}

fn display_day(day: &DaySchedule) {
    println!(
        "\n{}  {}, {} (week {})",
        day.group_number, day.weekday, day.date, day.week
    );
    println!("─────────────────────────────────────────");

    if day.lessons.is_empty() {
        println!("  No lessons.");
        return;
    }

    for lesson in &day.lessons {
        print!("  {}  {} [{}]", lesson.time, lesson.subject, lesson.lesson_type);
        if !lesson.auditorium.is_empty() {
            print!("  {}", lesson.auditorium);
        }
        println!();
    }
}
