mod cli;

use std::fmt;

use serde::Serialize;
use services::{
    AnswerServiceError, AppServices, AppServicesError, Clock, ErrorKind, ProgressServiceError,
    QuestionServiceError, UserServiceError,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{ArgsError, Cli, Command, UserLookup, print_usage};

/// Everything that can end a run, mapped to the process exit code.
#[derive(Debug)]
enum RunError {
    Usage(ArgsError),
    Service { kind: ErrorKind, message: String },
    Startup(AppServicesError),
    Output(serde_json::Error),
}

impl RunError {
    fn exit_code(&self) -> i32 {
        match self {
            RunError::Usage(_) => 2,
            RunError::Service { kind, .. } => match kind {
                ErrorKind::Validation => 2,
                ErrorKind::NotFound => 3,
                ErrorKind::Internal => 1,
            },
            RunError::Startup(_) | RunError::Output(_) => 1,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Usage(err) => write!(f, "{err}"),
            RunError::Service { message, .. } => f.write_str(message),
            RunError::Startup(err) => write!(f, "cannot open database: {err}"),
            RunError::Output(err) => write!(f, "cannot encode output: {err}"),
        }
    }
}

macro_rules! service_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for RunError {
                fn from(err: $ty) -> Self {
                    RunError::Service {
                        kind: err.kind(),
                        message: err.to_string(),
                    }
                }
            }
        )+
    };
}

service_error!(
    UserServiceError,
    QuestionServiceError,
    AnswerServiceError,
    ProgressServiceError,
);

#[derive(Serialize)]
struct Deleted {
    deleted: &'static str,
    id: u64,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RunError> {
    let json = serde_json::to_string_pretty(value).map_err(RunError::Output)?;
    println!("{json}");
    Ok(())
}

async fn run() -> Result<(), RunError> {
    let cli = Cli::parse(std::env::args().skip(1), std::env::var("QUIZ_DB_URL").ok())
        .map_err(RunError::Usage)?;

    if cli.command == Command::Help {
        print_usage();
        return Ok(());
    }

    tracing::debug!(db_url = %cli.db_url, "opening database");
    let app = AppServices::new_sqlite(&cli.db_url, Clock::default())
        .await
        .map_err(RunError::Startup)?;

    match cli.command {
        Command::Help => Ok(()),
        Command::Register { name, email } => {
            print_json(&app.users().register_user(&name, &email).await?)
        }
        Command::User(UserLookup::Id(id)) => print_json(&app.users().get_user(id).await?),
        Command::User(UserLookup::Email(email)) => {
            print_json(&app.users().find_by_email(&email).await?)
        }
        Command::AddQuestion(draft) => {
            print_json(&app.questions().create_question(draft).await?)
        }
        Command::Questions { topic, user } => {
            print_json(&app.questions().list_questions(&topic, user).await?)
        }
        Command::Answer {
            user,
            question,
            option,
        } => print_json(&app.answers().submit_answer(user, question, option).await?),
        Command::Progress { user } => print_json(&app.progress().get_progress(user).await?),
        Command::DeleteTopic(id) => {
            app.questions().delete_topic(id).await?;
            print_json(&Deleted {
                deleted: "topic",
                id: id.value(),
            })
        }
        Command::DeleteQuestion(id) => {
            app.questions().delete_question(id).await?;
            print_json(&Deleted {
                deleted: "question",
                id: id.value(),
            })
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        if matches!(err, RunError::Usage(_)) {
            print_usage();
        }
        std::process::exit(err.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let not_found: RunError =
            ProgressServiceError::UserNotFound(quiz_core::model::UserId::new(1)).into();
        assert_eq!(not_found.exit_code(), 3);

        let invalid: RunError = UserServiceError::EmailTaken("a@b.io".into()).into();
        assert_eq!(invalid.exit_code(), 2);

        assert_eq!(RunError::Usage(ArgsError::MissingSubcommand).exit_code(), 2);
    }

    #[test]
    fn deleted_payload_shape() {
        let json = serde_json::to_value(Deleted {
            deleted: "topic",
            id: 4,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "deleted": "topic", "id": 4 }));
    }
}
