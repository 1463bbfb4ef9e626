use std::fmt;

use quiz_core::model::{OptionDraft, OptionId, QuestionDraft, QuestionId, TopicId, UserId};

pub const DEFAULT_DB_URL: &str = "sqlite:quiz.sqlite3";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    MissingSubcommand,
    UnknownSubcommand(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingSubcommand => write!(f, "missing subcommand"),
            ArgsError::UnknownSubcommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Register {
        name: String,
        email: String,
    },
    User(UserLookup),
    AddQuestion(QuestionDraft),
    Questions {
        topic: String,
        user: Option<UserId>,
    },
    Answer {
        user: UserId,
        question: QuestionId,
        option: OptionId,
    },
    Progress {
        user: UserId,
    },
    DeleteTopic(TopicId),
    DeleteQuestion(QuestionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(UserId),
    Email(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub db_url: String,
    pub command: Command,
}

impl Cli {
    /// Parses `argv` (without the program name). `--db` is accepted anywhere
    /// and overrides `env_db`.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env_db: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env_db
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());

        let mut rest = Vec::new();
        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--db" {
                let value = require_value(&mut args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                db_url = value;
            } else {
                rest.push(arg);
            }
        }

        let mut rest = rest.into_iter();
        let command = match rest.next().as_deref() {
            None => return Err(ArgsError::MissingSubcommand),
            Some("--help" | "-h" | "help") => Command::Help,
            Some("register") => parse_register(&mut rest)?,
            Some("user") => parse_user(&mut rest)?,
            Some("add-question") => parse_add_question(&mut rest)?,
            Some("questions") => parse_questions(&mut rest)?,
            Some("answer") => parse_answer(&mut rest)?,
            Some("progress") => Command::Progress {
                user: parse_user_only(&mut rest)?,
            },
            Some("delete-topic") => Command::DeleteTopic(parse_single_id(&mut rest, "--id")?),
            Some("delete-question") => {
                Command::DeleteQuestion(parse_single_id(&mut rest, "--id")?)
            }
            Some(other) => return Err(ArgsError::UnknownSubcommand(other.to_string())),
        };

        Ok(Self {
            db_url: with_create_mode(db_url),
            command,
        })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [--db <sqlite_url>] <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  register        --name <name> --email <email>");
    eprintln!("  user            --id <user_id> | --email <email>");
    eprintln!("  add-question    --topic <name> --text <text> (--option <text> | --correct <text>)...");
    eprintln!("  questions       --topic <name> [--user <user_id>]");
    eprintln!("  answer          --user <user_id> --question <question_id> --option <option_id>");
    eprintln!("  progress        --user <user_id>");
    eprintln!("  delete-topic    --id <topic_id>");
    eprintln!("  delete-question --id <question_id>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require<T>(value: Option<T>, flag: &'static str) -> Result<T, ArgsError> {
    value.ok_or(ArgsError::MissingFlag { flag })
}

fn parse_id<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn parse_register(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut name = None;
    let mut email = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--name" => name = Some(require_value(args, "--name")?),
            "--email" => email = Some(require_value(args, "--email")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::Register {
        name: require(name, "--name")?,
        email: require(email, "--email")?,
    })
}

fn parse_user(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut lookup = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--id" => {
                let raw = require_value(args, "--id")?;
                lookup = Some(UserLookup::Id(parse_id(raw, "--id")?));
            }
            "--email" => lookup = Some(UserLookup::Email(require_value(args, "--email")?)),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::User(require(lookup, "--id or --email")?))
}

fn parse_add_question(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut topic = None;
    let mut text = None;
    let mut options = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            "--text" => text = Some(require_value(args, "--text")?),
            "--option" => options.push(OptionDraft::new(require_value(args, "--option")?, false)),
            "--correct" => options.push(OptionDraft::new(require_value(args, "--correct")?, true)),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    // Empty option lists are left for the service to reject.
    Ok(Command::AddQuestion(QuestionDraft {
        topic: require(topic, "--topic")?,
        text: require(text, "--text")?,
        options,
    }))
}

fn parse_questions(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut topic = None;
    let mut user = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--topic" => topic = Some(require_value(args, "--topic")?),
            "--user" => user = Some(parse_id(require_value(args, "--user")?, "--user")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::Questions {
        topic: require(topic, "--topic")?,
        user,
    })
}

fn parse_answer(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut user = None;
    let mut question = None;
    let mut option = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user = Some(parse_id(require_value(args, "--user")?, "--user")?),
            "--question" => {
                question = Some(parse_id(require_value(args, "--question")?, "--question")?);
            }
            "--option" => option = Some(parse_id(require_value(args, "--option")?, "--option")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(Command::Answer {
        user: require(user, "--user")?,
        question: require(question, "--question")?,
        option: require(option, "--option")?,
    })
}

fn parse_user_only(args: &mut impl Iterator<Item = String>) -> Result<UserId, ArgsError> {
    parse_single_id(args, "--user")
}

fn parse_single_id<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let mut id = None;
    while let Some(arg) = args.next() {
        if arg == flag {
            id = Some(parse_id(require_value(args, flag)?, flag)?);
        } else {
            return Err(ArgsError::UnknownArg(arg));
        }
    }
    require(id, flag)
}

/// File-backed URLs get `mode=rwc` so a fresh database file is created.
fn with_create_mode(url: String) -> String {
    if url.contains(":memory:") || url.contains("mode=") {
        return url;
    }
    if url.contains('?') {
        format!("{url}&mode=rwc")
    } else {
        format!("{url}?mode=rwc")
    }
}
