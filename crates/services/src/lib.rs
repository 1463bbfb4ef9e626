#![forbid(unsafe_code)]

pub mod answer_service;
pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod question_service;
pub mod user_service;

pub use quiz_core::Clock;

pub use answer_service::AnswerService;
pub use app_services::AppServices;
pub use error::{
    AnswerServiceError, AppServicesError, ErrorKind, ProgressServiceError, QuestionServiceError,
    UserServiceError,
};
pub use progress_service::ProgressService;
pub use question_service::{CreatedQuestion, QuestionService};
pub use user_service::UserService;
