use std::time::Duration;

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::db::types::ContentKind;
use crate::repositories;
use crate::services::content_registry::{self, ContentItem, ViewContext};
use crate::services::errors::DomainError;
use crate::services::{authoring, submissions};
use crate::test_support;

fn anonymous_view() -> ViewContext<'static> {
    ViewContext { viewer_id: None, storage: None, url_ttl: Duration::from_secs(60) }
}

fn viewer_view(viewer_id: &str) -> ViewContext<'_> {
    ViewContext { viewer_id: Some(viewer_id), storage: None, url_ttl: Duration::from_secs(60) }
}

/// Every field of `input` appears in `output` with the same value; arrays
/// must match element by element.
fn assert_echoes(input: &Value, output: &Value) {
    match (input, output) {
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, value) in expected {
                let Some(actual_value) = actual.get(key) else {
                    panic!("missing field {key} in {output}");
                };
                assert_echoes(value, actual_value);
            }
        }
        (Value::Array(expected), Value::Array(actual)) => {
            assert_eq!(expected.len(), actual.len(), "array length in {output}");
            for (value, actual_value) in expected.iter().zip(actual) {
                assert_echoes(value, actual_value);
            }
        }
        _ => assert_eq!(input, output),
    }
}

async fn lesson_fixture(pool: &PgPool, slug: &str) -> (String, String) {
    let author = test_support::insert_user(pool, &format!("{slug}-author"), "author-pass").await;
    let course = test_support::insert_course(pool, &author.id, slug, false).await;
    let module = authoring::create_module(pool, &course.id, "M").await.expect("module");
    let (lesson, _) = authoring::create_lesson(pool, &module.id, "L", &[]).await.expect("lesson");
    (author.id, lesson.id)
}

#[tokio::test]
async fn sibling_orders_are_sequential_per_scope() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "seq-author", "author-pass").await;
    let first = test_support::insert_course(ctx.db(), &author.id, "first", false).await;
    let second = test_support::insert_course(ctx.db(), &author.id, "second", false).await;

    for expected in 0..3 {
        let module = authoring::create_module(ctx.db(), &first.id, "M").await.expect("module");
        assert_eq!(module.order_index, expected);
    }
    let other = authoring::create_module(ctx.db(), &second.id, "M").await.expect("module");
    assert_eq!(other.order_index, 0);
}

#[tokio::test]
async fn concurrent_module_creation_gets_distinct_orders() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "race-author", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "race", false).await;

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let pool = ctx.db().clone();
            let course_id = course.id.clone();
            tokio::spawn(async move {
                authoring::create_module(&pool, &course_id, &format!("M{index}")).await
            })
        })
        .collect();

    let mut orders = Vec::new();
    for handle in handles {
        orders.push(handle.await.expect("join").expect("module").order_index);
    }
    orders.sort_unstable();
    assert_eq!(orders, (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn deleting_a_sibling_keeps_other_orders() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "gap-author", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "gaps", false).await;

    let mut modules = Vec::new();
    for title in ["A", "B", "C"] {
        modules.push(authoring::create_module(ctx.db(), &course.id, title).await.expect("module"));
    }
    authoring::delete_module(ctx.db(), &modules[1].id).await.expect("delete");

    let remaining = repositories::modules::list_by_course(ctx.db(), &course.id)
        .await
        .expect("list modules");
    let orders: Vec<i32> = remaining.iter().map(|module| module.order_index).collect();
    assert_eq!(orders, [0, 2]);

    let next = authoring::create_module(ctx.db(), &course.id, "D").await.expect("module");
    assert_eq!(next.order_index, 3);
}

#[tokio::test]
async fn missing_parent_is_an_invalid_scope() {
    let ctx = test_support::setup_test_context().await;

    let error = authoring::create_module(ctx.db(), "no-such-course", "M").await.unwrap_err();
    assert!(matches!(error, DomainError::InvalidScope { parent: "course", .. }));
}

#[tokio::test]
async fn every_kind_resolves_and_renders_its_input() {
    let ctx = test_support::setup_test_context().await;
    let (_, lesson_id) = lesson_fixture(ctx.db(), "kinds").await;

    let question = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "question",
        json!({"title": "Q", "text": "2+2?", "answers": [{"text": "4", "is_true": true}]}),
    )
    .await
    .expect("question");

    let payloads = [
        ("text", json!({"title": "Intro", "content": "Hello"})),
        ("file", json!({"title": "Sheet", "file": "files/sheet.pdf"})),
        ("image", json!({"title": "Staff", "file": "images/staff.png"})),
        ("video", json!({"title": "Demo", "url": "https://video.example.com/demo"})),
        ("answer", json!({"question_id": question.item.id(), "text": "four"})),
        ("task", json!({"title": "Etude", "description": "Record it"})),
    ];

    for (index, (tag, payload)) in payloads.into_iter().enumerate() {
        let payload_copy = payload.clone();
        let created =
            content_registry::create_content(ctx.db(), &lesson_id, tag, payload).await.expect(tag);
        assert_eq!(created.content.kind.as_str(), tag);
        assert_eq!(created.content.order_index, index as i32 + 1);

        let resolved = content_registry::resolve(ctx.db(), &created.content).await.expect(tag);
        assert_eq!(resolved, created.item);

        let view = content_registry::present(ctx.db(), &created.content, anonymous_view())
            .await
            .expect(tag);
        let rendered = serde_json::to_value(view).expect("serialize view");
        if tag == "answer" {
            // the view fills in the defaulted `is_true`
            assert_echoes(&payload_copy, &rendered);
            assert_eq!(rendered["is_true"], false);
        } else {
            assert_eq!(rendered, payload_copy, "{tag} view");
        }
    }

    let view = content_registry::present(ctx.db(), &question.content, anonymous_view())
        .await
        .expect("question");
    let rendered = serde_json::to_value(view).expect("serialize view");
    assert_echoes(
        &json!({
            "title": "Q",
            "text": "2+2?",
            "answers": [{"text": "4", "is_true": true}, {"text": "four", "is_true": false}]
        }),
        &rendered,
    );
    assert_eq!(rendered["id"], question.item.id());

    let resolved = content_registry::resolve(ctx.db(), &question.content).await.expect("question");
    let ContentItem::Question { answers, .. } = resolved else {
        panic!("expected question");
    };
    let texts: Vec<&str> = answers.iter().map(|answer| answer.text.as_str()).collect();
    assert_eq!(texts, ["4", "four"]);
}

#[tokio::test]
async fn answer_must_reference_a_question_in_the_lesson() {
    let ctx = test_support::setup_test_context().await;
    let (_, lesson_id) = lesson_fixture(ctx.db(), "orphans").await;

    let error = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "answer",
        json!({"question_id": "missing", "text": "4"}),
    )
    .await
    .unwrap_err();
    assert!(matches!(error, DomainError::Validation(_)));

    let contents =
        repositories::contents::list_by_lesson(ctx.db(), &lesson_id).await.expect("contents");
    assert!(contents.is_empty());
}

#[tokio::test]
async fn delete_removes_item_and_wrapper_together() {
    let ctx = test_support::setup_test_context().await;
    let (_, lesson_id) = lesson_fixture(ctx.db(), "atomic").await;

    let created = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "text",
        json!({"title": "Intro", "content": "Hello"}),
    )
    .await
    .expect("content");

    content_registry::delete_content(ctx.db(), &created.content.id).await.expect("delete");

    assert!(repositories::contents::find_by_id(ctx.db(), &created.content.id)
        .await
        .expect("find")
        .is_none());
    assert!(repositories::items::find_text(ctx.db(), &created.content.target_id)
        .await
        .expect("find")
        .is_none());

    let error = content_registry::delete_content(ctx.db(), &created.content.id).await.unwrap_err();
    assert!(matches!(error, DomainError::NotFound("content")));
}

#[tokio::test]
async fn deleting_a_question_drops_its_answer_contents() {
    let ctx = test_support::setup_test_context().await;
    let (_, lesson_id) = lesson_fixture(ctx.db(), "cascade").await;

    let question = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "question",
        json!({"title": "Q", "text": "2+2?"}),
    )
    .await
    .expect("question");
    let answer = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "answer",
        json!({"question_id": question.item.id(), "text": "4", "is_true": true}),
    )
    .await
    .expect("answer");

    content_registry::delete_content(ctx.db(), &question.content.id).await.expect("delete");

    assert!(repositories::contents::find_by_id(ctx.db(), &answer.content.id)
        .await
        .expect("find")
        .is_none());
    assert!(repositories::items::find_answer(ctx.db(), &answer.content.target_id)
        .await
        .expect("find")
        .is_none());
}

#[tokio::test]
async fn missing_item_surfaces_as_dangling_reference() {
    let ctx = test_support::setup_test_context().await;
    let (_, lesson_id) = lesson_fixture(ctx.db(), "dangling").await;

    let created = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "video",
        json!({"title": "Demo", "url": "https://video.example.com/demo"}),
    )
    .await
    .expect("content");
    repositories::items::delete(ctx.db(), ContentKind::Video, &created.content.target_id)
        .await
        .expect("delete item");

    let error = content_registry::resolve(ctx.db(), &created.content).await.unwrap_err();
    assert!(matches!(error, DomainError::DanglingReference { kind: ContentKind::Video, .. }));
}

#[tokio::test]
async fn one_submission_per_student_and_one_review_per_submission() {
    let ctx = test_support::setup_test_context().await;
    let (author_id, lesson_id) = lesson_fixture(ctx.db(), "tasks").await;
    let first = test_support::insert_user(ctx.db(), "student-one", "student-pass").await;
    let second = test_support::insert_user(ctx.db(), "student-two", "student-pass").await;

    let task = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "task",
        json!({"title": "Etude", "description": "Record it"}),
    )
    .await
    .expect("task");
    let task_id = task.content.target_id.as_str();

    let mut conn = ctx.db().acquire().await.expect("connection");
    let submission = submissions::record_submission(&mut conn, task_id, &first.id, "a.pdf")
        .await
        .expect("first submission");

    let error = submissions::record_submission(&mut conn, task_id, &first.id, "b.pdf")
        .await
        .unwrap_err();
    assert!(matches!(error, DomainError::DuplicateSubmission));

    submissions::record_submission(&mut conn, task_id, &second.id, "c.pdf")
        .await
        .expect("second student");
    drop(conn);

    let review = submissions::review_submission(ctx.db(), &submission.id, &author_id, true, "Nice")
        .await
        .expect("review");
    assert!(review.is_correct);

    let error = submissions::review_submission(ctx.db(), &submission.id, &author_id, false, "")
        .await
        .unwrap_err();
    assert!(matches!(error, DomainError::DuplicateReview));

    let pending = repositories::task_submissions::list_pending_for_reviewer(ctx.db(), &author_id)
        .await
        .expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].student_username, second.username);
}

#[tokio::test]
async fn task_view_nests_only_the_viewers_progress() {
    let ctx = test_support::setup_test_context().await;
    let (author_id, lesson_id) = lesson_fixture(ctx.db(), "progress").await;
    let student = test_support::insert_user(ctx.db(), "progress-student", "student-pass").await;
    let onlooker = test_support::insert_user(ctx.db(), "progress-onlooker", "student-pass").await;

    let task = content_registry::create_content(
        ctx.db(),
        &lesson_id,
        "task",
        json!({"title": "Etude", "description": "Record it"}),
    )
    .await
    .expect("task");

    let before = content_registry::present(ctx.db(), &task.content, viewer_view(&student.id))
        .await
        .expect("view before submitting");
    assert_eq!(
        serde_json::to_value(before).expect("serialize"),
        json!({"title": "Etude", "description": "Record it"})
    );

    let mut conn = ctx.db().acquire().await.expect("connection");
    let submission = submissions::record_submission(
        &mut conn,
        &task.content.target_id,
        &student.id,
        "submissions/etude.mp3",
    )
    .await
    .expect("submission");
    drop(conn);

    let submitted = content_registry::present(ctx.db(), &task.content, viewer_view(&student.id))
        .await
        .expect("view after submitting");
    let submitted = serde_json::to_value(submitted).expect("serialize");
    assert_eq!(submitted["submission"]["id"], submission.id);
    assert_eq!(submitted["submission"]["file"], "submissions/etude.mp3");
    assert!(submitted.get("review").is_none());

    submissions::review_submission(ctx.db(), &submission.id, &author_id, true, "In tempo")
        .await
        .expect("review");

    let reviewed = content_registry::present(ctx.db(), &task.content, viewer_view(&student.id))
        .await
        .expect("view after review");
    let reviewed = serde_json::to_value(reviewed).expect("serialize");
    assert_eq!(reviewed["submission"]["id"], submission.id);
    assert_eq!(reviewed["review"]["is_correct"], true);
    assert_eq!(reviewed["review"]["comment"], "In tempo");

    let other = content_registry::present(ctx.db(), &task.content, viewer_view(&onlooker.id))
        .await
        .expect("other viewer");
    assert_eq!(
        serde_json::to_value(other).expect("serialize"),
        json!({"title": "Etude", "description": "Record it"})
    );
}
