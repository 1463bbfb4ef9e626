use quiz_core::model::{
    OptionId, Question, QuestionId, QuestionOption, Topic, TopicId, TopicName, User, UserAnswer,
    UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps constraint violations onto domain-level storage errors.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn count_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    i64::from(v)
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn topic_id_from_i64(v: i64) -> Result<TopicId, StorageError> {
    Ok(TopicId::new(i64_to_u64("topic_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn option_id_from_i64(v: i64) -> Result<OptionId, StorageError> {
    Ok(OptionId::new(i64_to_u64("option_id", v)?))
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    User::new(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        &row.try_get::<String, _>("email").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    let name = TopicName::new(row.try_get::<String, _>("name").map_err(ser)?).map_err(ser)?;
    Ok(Topic::new(
        topic_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        name,
    ))
}

pub(crate) fn map_option_row(row: &SqliteRow) -> Result<QuestionOption, StorageError> {
    Ok(QuestionOption {
        id: option_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        text: row.try_get("text").map_err(ser)?,
        is_correct: row.try_get::<i64, _>("is_correct").map_err(ser)? != 0,
    })
}

pub(crate) fn map_answer_row(row: &SqliteRow) -> Result<UserAnswer, StorageError> {
    Ok(UserAnswer {
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        selected_option_id: option_id_from_i64(
            row.try_get::<i64, _>("selected_option_id").map_err(ser)?,
        )?,
        is_correct: row.try_get::<i64, _>("is_correct").map_err(ser)? != 0,
        answered_at: row.try_get("answered_at").map_err(ser)?,
    })
}

/// Folds `questions LEFT JOIN options` rows (ordered by question id, then
/// option id) into questions with their options attached.
pub(crate) fn assemble_questions(rows: &[SqliteRow]) -> Result<Vec<Question>, StorageError> {
    let mut out: Vec<Question> = Vec::new();
    for row in rows {
        let question_id =
            question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?;

        if out.last().is_none_or(|q| q.id != question_id) {
            out.push(Question {
                id: question_id,
                topic_id: topic_id_from_i64(row.try_get::<i64, _>("topic_id").map_err(ser)?)?,
                text: row.try_get("question_text").map_err(ser)?,
                options: Vec::new(),
            });
        }

        let Some(option_id) = row.try_get::<Option<i64>, _>("option_id").map_err(ser)? else {
            continue;
        };
        let option = QuestionOption {
            id: option_id_from_i64(option_id)?,
            question_id,
            text: row
                .try_get::<Option<String>, _>("option_text")
                .map_err(ser)?
                .unwrap_or_default(),
            is_correct: row
                .try_get::<Option<i64>, _>("option_is_correct")
                .map_err(ser)?
                .unwrap_or(0)
                != 0,
        };
        if let Some(question) = out.last_mut() {
            question.options.push(option);
        }
    }
    Ok(out)
}

pub(crate) const QUESTION_WITH_OPTIONS_SELECT: &str = r"
    SELECT
        q.id AS question_id,
        q.topic_id AS topic_id,
        q.text AS question_text,
        o.id AS option_id,
        o.text AS option_text,
        o.is_correct AS option_is_correct
    FROM questions q
    LEFT JOIN options o ON o.question_id = q.id
";
