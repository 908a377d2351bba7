use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::SessionId;
use services::{
    OpenTdbClient, QuizEngine, QuizState, SessionHistoryService, SessionRecorder,
};
use storage::repository::Storage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSessionId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSessionId { raw } => write!(f, "invalid --delete value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  cargo run -p app -- play    [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>] [--delete <id>] [--clear]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dailyquiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DAILYQUIZ_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    delete: Option<SessionId>,
    clear: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("DAILYQUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dailyquiz.sqlite3".into(), normalize_sqlite_url);
        let mut delete = None;
        let mut clear = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--delete" => {
                    let value = require_value(args, "--delete")?;
                    let parsed: i64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSessionId { raw: value.clone() })?;
                    delete = Some(SessionId::new(parsed));
                }
                "--clear" => clear = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            delete,
            clear,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn read_line(prompt: &str) -> Result<String, std::io::Error> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

async fn play(storage: &Storage) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = SessionRecorder::new(Clock::default_clock(), Arc::clone(&storage.sessions));
    let mut engine = QuizEngine::new(Arc::new(OpenTdbClient::new()), recorder);

    loop {
        engine.begin_quiz().await;
        let failed = matches!(engine.state(), QuizState::Error);
        if !failed {
            break;
        }
        let again = read_line("Could not load the quiz. Try again? [y/N] ")?;
        if !again.eq_ignore_ascii_case("y") {
            engine.return_to_beginning().await;
            return Ok(());
        }
    }

    enum Step {
        TimeUp,
        Advance,
        Ask { prompt: String, answers: Vec<String> },
        Finished { title: &'static str, description: &'static str },
        Quit,
    }

    loop {
        engine.poll_timer();
        let step = match engine.state() {
            QuizState::Quiz(active) if active.is_dialog_lose_shown => Step::TimeUp,
            QuizState::Quiz(active) if active.current_question.is_answered() => Step::Advance,
            QuizState::Quiz(active) => Step::Ask {
                prompt: active.current_question.prompt().to_owned(),
                answers: active.current_question.all_answers().to_vec(),
            },
            QuizState::Result(score) => Step::Finished {
                title: score.title(),
                description: score.description(),
            },
            _ => Step::Quit,
        };

        match step {
            Step::TimeUp => {
                println!("Time is up! This attempt does not count.");
                engine.return_to_beginning().await;
                return Ok(());
            }
            Step::Advance => engine.confirm_answer().await,
            Step::Finished { title, description } => {
                println!();
                println!("{title}");
                println!("{description}");
                return Ok(());
            }
            Step::Quit => return Ok(()),
            Step::Ask { prompt, answers } => {
                println!();
                println!("{prompt}");
                for (i, answer) in answers.iter().enumerate() {
                    println!("  {}. {answer}", i + 1);
                }

                let choice = read_line("Answer number: ")?;
                let Some(answer) = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|n| answers.get(n))
                else {
                    println!("Pick a number between 1 and {}.", answers.len());
                    continue;
                };

                engine.choose_answer(answer);
                engine.confirm_answer().await;

                let mut verdict = None;
                if let QuizState::Quiz(active) = engine.state() {
                    verdict = Some((
                        active.current_question.is_correct(),
                        active.current_question.correct_answer().to_owned(),
                    ));
                }
                match verdict {
                    Some((true, _)) => println!("Correct!"),
                    Some((false, correct)) => {
                        println!("Wrong. The right answer was: {correct}");
                    }
                    None => {}
                }
            }
        }
    }
}

async fn history(storage: &Storage, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let history = SessionHistoryService::new(Arc::clone(&storage.sessions));

    if args.clear {
        history.clear_all().await?;
        println!("History cleared.");
        return Ok(());
    }

    if let Some(id) = args.delete {
        history.delete_session(id).await?;
        println!("Deleted session {id}.");
        return Ok(());
    }

    let previews = history.list_previews().await?;
    if previews.is_empty() {
        println!("You have not taken any quizzes yet.");
        return Ok(());
    }

    for item in previews {
        println!(
            "{}  {} {}  {}  {}/5",
            item.session_id, item.date, item.time, item.name, item.count_of_right_answers
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    match cmd {
        Command::Play => play(&storage).await,
        Command::History => history(&storage, &args).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
