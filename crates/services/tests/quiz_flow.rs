use std::path::{Path, PathBuf};

use quiz_core::model::{OptionDraft, QuestionDraft, QuestionId, UserId};
use quiz_core::time::fixed_clock;
use services::{AppServices, ErrorKind};

async fn app(name: &str) -> AppServices {
    AppServices::new_sqlite(&format!("sqlite:file:{name}?mode=memory&cache=shared"), fixed_clock())
        .await
        .expect("connect sqlite")
}

async fn add(app: &AppServices, topic: &str, text: &str) -> QuestionId {
    app.questions()
        .create_question(QuestionDraft {
            topic: topic.into(),
            text: text.into(),
            options: vec![
                OptionDraft::new("right", true),
                OptionDraft::new("wrong", false),
                OptionDraft::new("also wrong", false),
            ],
        })
        .await
        .expect("create question")
        .question_id
}

async fn register(app: &AppServices, email: &str) -> UserId {
    app.users()
        .register_user("Quiz Taker", email)
        .await
        .expect("register")
        .id()
}

async fn answer(app: &AppServices, user: UserId, topic: &str, index: usize, correct: bool) {
    let views = app
        .questions()
        .list_questions(topic, Some(user))
        .await
        .expect("list");
    let view = &views[index];
    let option = if correct { &view.options[0] } else { &view.options[1] };
    app.answers()
        .submit_answer(user, view.id, option.id)
        .await
        .expect("submit");
}

#[tokio::test]
async fn listing_disables_only_answered_questions() {
    let app = app("memdb_flow_listing").await;
    let user = register(&app, "react@example.com").await;
    add(&app, "React", "What is JSX?").await;
    add(&app, "React", "What does useState return?").await;

    let views = app
        .questions()
        .list_questions("react", Some(user))
        .await
        .expect("list");
    assert_eq!(views.len(), 2);
    assert!(views.iter().flat_map(|v| &v.options).all(|o| !o.disabled));

    answer(&app, user, "React", 0, false).await;

    let views = app
        .questions()
        .list_questions("REACT", Some(user))
        .await
        .expect("list");
    assert!(views[0].answered);
    assert!(views[0].options.iter().all(|o| o.disabled));
    assert!(!views[1].answered);
    assert!(views[1].options.iter().all(|o| !o.disabled));

    let json = serde_json::to_value(&views[0]).expect("json");
    assert!(json["options"][0].get("is_correct").is_none());
}

#[tokio::test]
async fn resubmission_overwrites_and_reports_update() {
    let app = app("memdb_flow_resubmit").await;
    let user = register(&app, "again@example.com").await;
    let question = add(&app, "React", "Pick one").await;
    let views = app
        .questions()
        .list_questions("React", None)
        .await
        .expect("list");
    let right = views[0].options[0].id;
    let wrong = views[0].options[1].id;

    let first = app
        .answers()
        .submit_answer(user, question, wrong)
        .await
        .expect("first");
    assert!(!first.is_correct);
    assert!(!first.updated);

    let second = app
        .answers()
        .submit_answer(user, question, right)
        .await
        .expect("second");
    assert!(second.is_correct);
    assert!(second.updated);

    let report = app.progress().get_progress(user).await.expect("progress");
    assert_eq!(report.progress[0].completed(), 1);
    assert_eq!(report.progress[0].breakdown(), Some((1, 0)));
}

#[tokio::test]
async fn css_example_reports_partial_progress() {
    let app = app("memdb_flow_css").await;
    let user = register(&app, "css@example.com").await;
    for i in 0..4 {
        add(&app, "CSS", &format!("CSS question {i}")).await;
    }
    answer(&app, user, "CSS", 0, true).await;
    answer(&app, user, "CSS", 1, false).await;

    let report = app.progress().get_progress(user).await.expect("progress");
    let json = serde_json::to_value(&report).expect("json");
    let entry = &json["progress"][0];
    assert_eq!(entry["name"], "CSS");
    assert_eq!(entry["total_questions"], 4);
    assert_eq!(entry["completed"], 2);
    assert_eq!(entry["percent"], 50.0);
    assert!(entry.get("correct_count").is_none());
    assert!(entry.get("wrong_count").is_none());
}

#[tokio::test]
async fn complete_topic_and_empty_topic() {
    let app = app("memdb_flow_complete").await;
    let user = register(&app, "done@example.com").await;
    for i in 0..3 {
        add(&app, "React", &format!("React question {i}")).await;
    }
    app.questions().create_topic("Empty").await.expect("topic");
    answer(&app, user, "React", 0, true).await;
    answer(&app, user, "React", 1, true).await;
    answer(&app, user, "React", 2, false).await;

    let report = app.progress().get_progress(user).await.expect("progress");
    assert_eq!(report.progress.len(), 2);

    let react = &report.progress[0];
    assert!(react.is_complete());
    assert!((react.percent() - 100.0).abs() < f64::EPSILON);
    assert_eq!(react.breakdown(), Some((2, 1)));

    let empty = &report.progress[1];
    assert_eq!(empty.total_questions(), 0);
    assert!(empty.percent().abs() < f64::EPSILON);
    assert_eq!(empty.breakdown(), Some((0, 0)));
}

#[tokio::test]
async fn rejects_foreign_option_and_unknown_ids() {
    let app = app("memdb_flow_errors").await;
    let user = register(&app, "err@example.com").await;
    let first = add(&app, "React", "First").await;
    add(&app, "React", "Second").await;
    let views = app
        .questions()
        .list_questions("React", None)
        .await
        .expect("list");
    let foreign = views[1].options[0].id;

    let err = app
        .answers()
        .submit_answer(user, first, foreign)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = app
        .answers()
        .submit_answer(UserId::new(9_999), first, foreign)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = app
        .questions()
        .list_questions("Go", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = app
        .users()
        .register_user("Dup", "ERR@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn deleting_topic_drops_its_progress() {
    let app = app("memdb_flow_delete").await;
    let user = register(&app, "gone@example.com").await;
    add(&app, "React", "Only").await;
    answer(&app, user, "React", 0, true).await;

    let topic = app.questions().create_topic("react").await.expect("topic");
    app.questions()
        .delete_topic(topic.id())
        .await
        .expect("delete");

    let report = app.progress().get_progress(user).await.expect("progress");
    assert!(report.progress.is_empty());
    let err = app
        .questions()
        .list_questions("React", Some(user))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

fn scratch_db(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{name}-{}.sqlite3", std::process::id()));
    remove_db_files(&path);
    path
}

fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_resolve_to_one_answer() {
    let path = scratch_db("quiz_flow_concurrent");
    let app = AppServices::new_sqlite(
        &format!("sqlite:{}?mode=rwc", path.display()),
        fixed_clock(),
    )
    .await
    .expect("open file database");
    let user = register(&app, "race@example.com").await;

    let rounds = 10;
    for round in 0..rounds {
        let question = add(&app, "Races", &format!("Race question {round}")).await;
        let views = app
            .questions()
            .list_questions("Races", None)
            .await
            .expect("list");
        let options: Vec<_> = views
            .iter()
            .find(|v| v.id == question)
            .expect("question listed")
            .options
            .iter()
            .map(|o| o.id)
            .collect();

        let mut handles = Vec::new();
        for i in 0..4 {
            let answers = app.answers();
            let option = options[i % options.len()];
            handles.push(tokio::spawn(async move {
                answers.submit_answer(user, question, option).await
            }));
        }

        let mut inserts = 0;
        for handle in handles {
            let result = handle.await.expect("join").expect("submission succeeds");
            if !result.updated {
                inserts += 1;
            }
        }
        assert_eq!(inserts, 1, "round {round}");
    }

    let report = app.progress().get_progress(user).await.expect("progress");
    assert_eq!(report.progress[0].completed(), rounds);
    assert!(report.progress[0].is_complete());

    drop(app);
    remove_db_files(&path);
}
