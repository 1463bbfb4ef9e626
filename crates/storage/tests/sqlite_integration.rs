use chrono::Duration;
use quiz_core::model::{Question, TopicName, UserAnswer, UserId};
use quiz_core::time::fixed_now;
use storage::repository::{
    AnswerRepository, NewQuestionRecord, NewUserRecord, QuestionRepository, StorageError,
    TopicRepository, UpsertOutcome, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn add_user(repo: &SqliteRepository, email: &str) -> UserId {
    repo.insert_new_user(NewUserRecord {
        name: "Tester".into(),
        email: email.into(),
        created_at: fixed_now(),
    })
    .await
    .expect("insert user")
}

async fn add_question(repo: &SqliteRepository, topic: &str, text: &str) -> Question {
    let (topic, _) = repo
        .get_or_create_topic(&TopicName::new(topic).unwrap())
        .await
        .expect("topic");
    repo.insert_question(NewQuestionRecord {
        topic_id: topic.id(),
        text: text.into(),
        options: vec![("right".into(), true), ("wrong".into(), false)],
    })
    .await
    .expect("insert question")
}

#[tokio::test]
async fn sqlite_users_roundtrip_and_unique_email() {
    let repo = connect("memdb_users").await;

    let id = add_user(&repo, "ada@example.com").await;
    let user = repo.get_user(id).await.unwrap().expect("user exists");
    assert_eq!(user.email(), "ada@example.com");
    assert_eq!(user.created_at(), fixed_now());

    let by_email = repo
        .find_user_by_email("ADA@example.com")
        .await
        .unwrap()
        .expect("case-insensitive lookup");
    assert_eq!(by_email.id(), id);

    let err = repo
        .insert_new_user(NewUserRecord {
            name: "Clone".into(),
            email: "Ada@Example.com".into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    assert!(repo.get_user(UserId::new(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_topics_are_get_or_create() {
    let repo = connect("memdb_topics").await;

    let (react, created) = repo
        .get_or_create_topic(&TopicName::new("React").unwrap())
        .await
        .unwrap();
    assert!(created);
    let (again, created) = repo
        .get_or_create_topic(&TopicName::new("REACT").unwrap())
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(again.id(), react.id());
    assert_eq!(again.name().as_str(), "React");

    repo.get_or_create_topic(&TopicName::new("CSS").unwrap())
        .await
        .unwrap();
    let names: Vec<String> = repo
        .list_topics()
        .await
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(names, ["React", "CSS"]);

    let found = repo.find_topic_by_name(" react ").await.unwrap();
    assert_eq!(found.map(|t| t.id()), Some(react.id()));
}

#[tokio::test]
async fn sqlite_questions_keep_option_order() {
    let repo = connect("memdb_questions").await;
    let first = add_question(&repo, "React", "Q1").await;
    let second = add_question(&repo, "React", "Q2").await;

    let fetched = repo.get_question(first.id).await.unwrap().expect("question");
    assert_eq!(fetched, first);
    assert_eq!(fetched.options.len(), 2);
    assert!(fetched.options[0].is_correct);

    let listed = repo.questions_for_topic(first.topic_id).await.unwrap();
    assert_eq!(listed, vec![first.clone(), second]);

    let option = repo
        .get_option(first.options[1].id)
        .await
        .unwrap()
        .expect("option");
    assert_eq!(option.question_id, first.id);
    assert!(!option.is_correct);
}

#[tokio::test]
async fn sqlite_upsert_overwrites_and_keeps_first_timestamp() {
    let repo = connect("memdb_upsert").await;
    let user = add_user(&repo, "u@example.com").await;
    let question = add_question(&repo, "CSS", "Q").await;

    let first = UserAnswer::grade(user, question.id, &question.options[0], fixed_now());
    assert_eq!(repo.upsert_answer(&first).await.unwrap(), UpsertOutcome::Inserted);

    let later = UserAnswer::grade(
        user,
        question.id,
        &question.options[1],
        fixed_now() + Duration::minutes(3),
    );
    assert_eq!(repo.upsert_answer(&later).await.unwrap(), UpsertOutcome::Updated);

    let stored = repo.get_answer(user, question.id).await.unwrap().unwrap();
    assert_eq!(stored.selected_option_id, question.options[1].id);
    assert!(!stored.is_correct);
    assert_eq!(stored.answered_at, fixed_now());

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_answers WHERE user_id = ?1 AND question_id = ?2",
    )
    .bind(i64::try_from(user.value()).unwrap())
    .bind(i64::try_from(question.id.value()).unwrap())
    .fetch_one(repo.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sqlite_upsert_with_unknown_user_is_not_found() {
    let repo = connect("memdb_fk").await;
    let question = add_question(&repo, "CSS", "Q").await;
    let answer = UserAnswer::grade(UserId::new(42), question.id, &question.options[0], fixed_now());
    let err = repo.upsert_answer(&answer).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_tallies_and_cascades() {
    let repo = connect("memdb_tallies").await;
    let user = add_user(&repo, "t@example.com").await;
    let q1 = add_question(&repo, "CSS", "Q1").await;
    let q2 = add_question(&repo, "CSS", "Q2").await;
    let react = add_question(&repo, "React", "Q3").await;
    repo.get_or_create_topic(&TopicName::new("Empty").unwrap())
        .await
        .unwrap();

    for (question, option) in [(&q1, 0), (&q2, 1)] {
        let answer = UserAnswer::grade(user, question.id, &question.options[option], fixed_now());
        repo.upsert_answer(&answer).await.unwrap();
    }

    let tallies = repo.topic_tallies(user).await.unwrap();
    let summary: Vec<(&str, u32, u32, u32)> = tallies
        .iter()
        .map(|t| (t.name.as_str(), t.total_questions, t.answered, t.correct))
        .collect();
    assert_eq!(
        summary,
        [("CSS", 2, 2, 1), ("React", 1, 0, 0), ("Empty", 0, 0, 0)]
    );

    let answered = repo.answered_question_ids(user, q1.topic_id).await.unwrap();
    assert_eq!(answered, vec![q1.id, q2.id]);
    assert!(
        repo.answered_question_ids(user, react.topic_id)
            .await
            .unwrap()
            .is_empty()
    );

    assert!(repo.delete_question(q2.id).await.unwrap());
    assert!(repo.get_answer(user, q2.id).await.unwrap().is_none());
    assert!(repo.get_option(q2.options[0].id).await.unwrap().is_none());

    assert!(repo.delete_topic(q1.topic_id).await.unwrap());
    assert!(repo.get_question(q1.id).await.unwrap().is_none());
    assert!(repo.get_answer(user, q1.id).await.unwrap().is_none());
    assert!(!repo.delete_topic(q1.topic_id).await.unwrap());
}
