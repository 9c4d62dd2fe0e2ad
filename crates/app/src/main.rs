use std::fmt;
use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

use jelajah_core::model::{PlaceId, SubmittedAnswer};
use services::{AdvanceOutcome, AppServices, Feedback, QuizSession, ROUNDS_PER_SESSION};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPlaceId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPlaceId { raw } => write!(f, "invalid --place value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play   [--db <sqlite_url>] [--place <id>]");
    eprintln!("  cargo run -p app -- status [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- logout [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:jelajah.sqlite3");
    eprintln!("  --place the furthest unlocked place");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  JELAJAH_DB_URL, JELAJAH_AI_API_KEY, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Status,
    Logout,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "status" => Some(Self::Status),
            "logout" => Some(Self::Logout),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    place_id: Option<PlaceId>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("JELAJAH_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://jelajah.sqlite3".into(), normalize_sqlite_url);
        let mut place_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--place" => {
                    let value = require_value(args, "--place")?;
                    let parsed: PlaceId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPlaceId { raw: value.clone() })?;
                    place_id = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, place_id })
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn prompt_line(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_owned())
}

/// Read an answer shaped for the current question: a choice, one line, or one
/// line per blank.
fn read_answer(session: &QuizSession) -> io::Result<SubmittedAnswer> {
    let Some(question) = session.current_question() else {
        return Ok(SubmittedAnswer::Text(String::new()));
    };

    let options = question.options();
    if !options.is_empty() {
        for (i, option) in options.iter().enumerate() {
            let letter = char::from(b'A' + u8::try_from(i % 26).unwrap_or(0));
            println!("  {letter}. {option}");
        }
        let raw = prompt_line("Jawaban (huruf atau teks): ")?;
        // A single letter selects the option; anything else is taken verbatim.
        if raw.len() == 1 {
            if let Some(c) = raw.to_uppercase().chars().next() {
                let index = (c as usize).wrapping_sub('A' as usize);
                if let Some(option) = options.get(index) {
                    return Ok(SubmittedAnswer::Text(option.clone()));
                }
            }
        }
        return Ok(SubmittedAnswer::Text(raw));
    }

    let blanks = question.expected_blanks();
    if blanks > 0 {
        let mut filled = Vec::with_capacity(blanks);
        for i in 1..=blanks {
            filled.push(prompt_line(&format!("Jawaban ke-{i}: "))?);
        }
        return Ok(SubmittedAnswer::Blanks(filled));
    }

    Ok(SubmittedAnswer::Text(prompt_line("Jawaban: ")?))
}

async fn ensure_profile(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    if services.ledger().profile().await.is_some() {
        return Ok(());
    }

    println!("Belum ada profil. Ayo kenalan dulu!");
    loop {
        let name = prompt_line("Nama: ")?;
        let class_name = prompt_line("Kelas: ")?;
        match services.ledger().create_profile(&name, &class_name).await {
            Ok(_) => return Ok(()),
            Err(err) => println!("{err}"),
        }
    }
}

async fn run_status(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let Some(profile) = services.ledger().profile().await else {
        println!("Belum ada profil. Jalankan `play` untuk mulai.");
        return Ok(());
    };

    println!("{} ({})", profile.name(), profile.class_name());
    println!(
        "Skor total: {}  ·  Progres: {}/{}",
        profile.total_score(),
        profile.unlock_progress(),
        services.engine().catalog().len()
    );
    for (index, place) in services.engine().catalog().iter().enumerate() {
        let marker = if profile.is_unlocked(index) {
            match profile.place_score(place.id()) {
                Some(score) => format!("{score}/{ROUNDS_PER_SESSION}"),
                None => "terbuka".to_owned(),
            }
        } else {
            "terkunci".to_owned()
        };
        println!("  {:>2}. {:<28} {marker}", index + 1, place.name());
    }
    Ok(())
}

async fn run_play(
    services: &AppServices,
    place_id: Option<PlaceId>,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_profile(services).await?;

    let onboarding = services.onboarding();
    if !onboarding.has_completed().await? {
        println!("Selamat datang di Jelajah Jabar! Jawab 5 soal untuk membuka daerah berikutnya.");
        onboarding.mark_completed().await?;
    }

    let engine = services.engine();
    let place_id = match place_id {
        Some(id) => id,
        None => {
            // Default to the furthest unlocked place.
            let profile = services
                .ledger()
                .profile()
                .await
                .ok_or("no profile loaded")?;
            let index = profile
                .unlock_progress()
                .min(engine.catalog().len().saturating_sub(1));
            engine
                .catalog()
                .get(index)
                .ok_or("empty place catalog")?
                .id()
        }
    };

    let mut session = engine.start(place_id).await?;
    println!("Kuis: {}", session.place().name());

    loop {
        println!();
        println!(
            "Soal {}/{}",
            session.round() + 1,
            session.rounds_total()
        );
        let Some(question) = session.current_question() else {
            return Err("session lost its question".into());
        };
        println!("{}", question.prompt());

        let answer = read_answer(&session)?;
        let feedback = engine.submit(&mut session, &answer)?;
        match feedback {
            Feedback::Answered {
                correct,
                correct_answer,
                explanation,
            } => {
                if correct {
                    println!("Jawaban benar!");
                } else {
                    println!("Jawaban salah. Yang benar: {correct_answer}");
                }
                if !explanation.is_empty() {
                    println!("{explanation}");
                }
                let _ = prompt_line("[Enter] lanjut ")?;
                engine.advance(&mut session).await?;
            }
            Feedback::SessionDone { message } => {
                println!("{message}");
                let outcome = engine.advance(&mut session).await?;
                if let AdvanceOutcome::Finished(profile) = outcome {
                    println!(
                        "Skor kamu: {}/{}  ·  Skor total: {}",
                        session.correct_count(),
                        session.rounds_total(),
                        profile.total_score()
                    );
                }
                return Ok(());
            }
        }
    }
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
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
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

    // Open + migrate SQLite at startup; core/services stay free of file juggling.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url).await?;
    tracing::debug!(db = %args.db_url, "storage ready");

    match cmd {
        Command::Play => run_play(&services, args.place_id).await,
        Command::Status => run_status(&services).await,
        Command::Logout => {
            services.ledger().clear_profile().await?;
            println!("Profil dihapus. Sampai jumpa!");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
