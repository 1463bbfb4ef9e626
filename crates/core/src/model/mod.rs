mod answer;
mod ids;
mod progress;
mod question;
mod topic;
mod user;

pub use ids::{OptionId, ParseIdError, QuestionId, TopicId, UserId};

pub use answer::{SubmissionResult, UserAnswer};
pub use progress::{ProgressReport, TopicProgress, TopicTally, completion_percent};
pub use question::{
    OptionDraft, OptionView, Question, QuestionDraft, QuestionError, QuestionOption, QuestionView,
    ValidatedQuestion,
};
pub use topic::{Topic, TopicError, TopicName};
pub use user::{User, UserError, normalize_email};
