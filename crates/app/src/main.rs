use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use client::{ClientConfig, HttpPortalApi};
use engine::TrainingSessionLoader;
use portal_core::model::{EmployeeId, Training, TrainingId, UserId};
use portal_core::progression;
use portal_core::Clock;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingEmployeeId,
    MissingUserId,
    MissingTrainingId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingEmployeeId => {
                write!(f, "no employee id (use --emp-id or PORTAL_EMP_ID)")
            }
            ArgsError::MissingUserId => write!(f, "no user id (use --user-id or PORTAL_USER_ID)"),
            ArgsError::MissingTrainingId => write!(f, "detail requires a training id argument"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- list   [--base-url <url>] [--emp-id <id>] [--user-id <id>]");
    eprintln!("  cargo run -p app -- detail <training-id> [--base-url <url>] [--emp-id <id>] [--user-id <id>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORTAL_BASE_URL, PORTAL_API_TOKEN, PORTAL_EMP_ID, PORTAL_USER_ID");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Detail,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "detail" => Some(Self::Detail),
            _ => None,
        }
    }
}

struct Args {
    base_url: Option<String>,
    employee_id: EmployeeId,
    user_id: UserId,
    training_id: Option<TrainingId>,
}

impl Args {
    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut base_url = None;
        let mut employee_id = std::env::var("PORTAL_EMP_ID").ok();
        let mut user_id = std::env::var("PORTAL_USER_ID").ok();
        let mut training_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => base_url = Some(require_value(args, "--base-url")?),
                "--emp-id" => employee_id = Some(require_value(args, "--emp-id")?),
                "--user-id" => user_id = Some(require_value(args, "--user-id")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if !other.starts_with("--") && training_id.is_none() => {
                    training_id = Some(TrainingId::new(other));
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        if cmd == Command::Detail && training_id.is_none() {
            return Err(ArgsError::MissingTrainingId);
        }

        Ok(Self {
            base_url,
            employee_id: EmployeeId::new(employee_id.ok_or(ArgsError::MissingEmployeeId)?),
            user_id: UserId::new(user_id.ok_or(ArgsError::MissingUserId)?),
            training_id,
        })
    }
}

fn print_training_row(training: &Training, today: NaiveDate) {
    let status = if training.completion_percent() >= 100.0 {
        "COMPLETED"
    } else if training.completion_percent() > 0.0 {
        "IN PROGRESS"
    } else {
        "NOT STARTED"
    };
    let overdue = if training.is_overdue(today) {
        "  OVERDUE"
    } else {
        ""
    };
    println!(
        "  {:<26} {:>6.2}%  {:<12} due {}  [{}]{overdue}",
        training.name(),
        training.completion_percent(),
        status,
        training.due_date(),
        training.id()
    );
}

fn print_detail(training: &Training) {
    println!("{} ({})", training.name(), training.kind().label());
    for (index, module) in training.modules().iter().enumerate() {
        let unlocked = progression::can_watch_module(index, training.preceding_module(index));
        let status = if module.completed() {
            "completed"
        } else if unlocked {
            "available"
        } else {
            "locked"
        };
        println!("  {} [{status}]", module.name());
        for video in module.videos() {
            let mark = if video.completed() {
                "x"
            } else if unlocked && progression::can_watch(video.id(), Some(module)) {
                ">"
            } else {
                "-"
            };
            let assessment = if video.has_assessment_hint() {
                "  (assessment)"
            } else {
                ""
            };
            println!("    [{mark}] {}{assessment}", video.title());
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let api = Arc::new(HttpPortalApi::new(config));
    let loader = TrainingSessionLoader::new(api);

    let graph = loader.load(&args.employee_id).await?;

    match cmd {
        Command::List => {
            let today = Clock::default_clock().now().date_naive();
            println!("Overall progress: {:.1}%", graph.overall_completion);
            println!("Assigned trainings ({}):", graph.assigned.len());
            for training in &graph.assigned {
                print_training_row(training, today);
            }
            println!("Mandatory trainings ({}):", graph.mandatory.len());
            for training in &graph.mandatory {
                print_training_row(training, today);
            }
        }
        Command::Detail => {
            let training_id = args.training_id.ok_or(ArgsError::MissingTrainingId)?;
            let summary = graph
                .assigned
                .iter()
                .chain(graph.mandatory.iter())
                .find(|t| t.id() == &training_id)
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("training {training_id} is not in either collection"),
                    )
                })?;
            let detail = loader.open_detail(summary, &args.user_id).await?;
            print_detail(&detail);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
