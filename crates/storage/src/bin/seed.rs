use std::fmt;

use chrono::Utc;
use quiz_core::model::{OptionDraft, QuestionDraft, User, UserId};
use storage::repository::{NewQuestionRecord, NewUserRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_email: String,
    user_name: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut user_email =
            std::env::var("QUIZ_SEED_EMAIL").unwrap_or_else(|_| "demo@example.com".into());
        let mut user_name = std::env::var("QUIZ_SEED_NAME").unwrap_or_else(|_| "Demo".into());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user-email" => user_email = require_value(&mut args, "--user-email")?,
                "--user-name" => user_name = require_value(&mut args, "--user-name")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_email,
            user_name,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --user-email <email>      Demo user email (default: demo@example.com)");
    eprintln!("  --user-name <name>        Demo user name (default: Demo)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_EMAIL, QUIZ_SEED_NAME");
}

fn sample_questions() -> Vec<QuestionDraft> {
    let q = |topic: &str, text: &str, options: &[(&str, bool)]| QuestionDraft {
        topic: topic.into(),
        text: text.into(),
        options: options
            .iter()
            .map(|(t, c)| OptionDraft::new(*t, *c))
            .collect(),
    };
    vec![
        q(
            "React",
            "What does JSX compile to?",
            &[("React.createElement calls", true), ("HTML strings", false)],
        ),
        q(
            "React",
            "Which hook manages local state?",
            &[("useState", true), ("useMemo", false), ("useRef", false)],
        ),
        q(
            "CSS",
            "Which property sets the text color?",
            &[("color", true), ("font-color", false)],
        ),
        q(
            "CSS",
            "Which unit is relative to the root font size?",
            &[("em", false), ("rem", true), ("px", false)],
        ),
        q(
            "CSS",
            "Which display value creates a flex container?",
            &[("flex", true), ("block", false)],
        ),
        q(
            "CSS",
            "Which selector has the highest specificity?",
            &[("#id", true), (".class", false), ("div", false)],
        ),
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = Utc::now();

    let user_id = match storage.users.find_user_by_email(&args.user_email).await? {
        Some(user) => user.id(),
        None => {
            let draft = User::new(UserId::new(1), args.user_name.clone(), &args.user_email, now)?;
            storage
                .users
                .insert_new_user(NewUserRecord::from_user(&draft))
                .await?
        }
    };

    let mut inserted = 0_u32;
    for draft in sample_questions() {
        let question = draft.validate()?;
        let (topic, _) = storage.topics.get_or_create_topic(&question.topic).await?;
        let already_there = storage
            .questions
            .questions_for_topic(topic.id())
            .await?
            .iter()
            .any(|q| q.text == question.text);
        if already_there {
            continue;
        }
        storage
            .questions
            .insert_question(NewQuestionRecord::from_validated(topic.id(), &question))
            .await?;
        inserted += 1;
    }

    println!(
        "Seeded user {} and {} new questions into {}",
        user_id, inserted, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
