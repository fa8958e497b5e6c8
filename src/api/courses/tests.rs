use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::repositories;
use crate::test_support::{self, TestContext};

async fn send(ctx: &TestContext, method: Method, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn authoring_flow_orders_and_echoes_contents() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author01", "author-pass").await;
    let token = ctx.token_for(&author);

    let (status, course) = send(
        &ctx,
        Method::POST,
        "/api/v1/courses/free",
        &token,
        Some(json!({"title": "Piano Basics", "description": "Start here"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {course}");
    assert_eq!(course["slug"], "piano-basics");
    assert_eq!(course["approval"], false);
    assert_eq!(course["is_free"], true);

    let base = "/api/v1/courses/piano-basics";
    let (status, m1) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M1"})))
            .await;
    assert_eq!(status, StatusCode::CREATED, "response: {m1}");
    assert_eq!(m1["order"], 0);
    let (_, m2) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M2"})))
            .await;
    assert_eq!(m2["order"], 1);

    let m1_id = m1["id"].as_str().expect("module id");
    let (status, l1) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{m1_id}/lessons"),
        &token,
        Some(json!({"title": "L1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {l1}");
    assert_eq!(l1["order"], 0);
    let l1_id = l1["id"].as_str().expect("lesson id");

    let contents_uri = format!("{base}/modules/{m1_id}/lessons/{l1_id}/contents");
    let (status, created) = send(
        &ctx,
        Method::POST,
        &contents_uri,
        &token,
        Some(json!({"kind": "text", "payload": {"title": "Intro", "content": "Hello"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["order"], 0);

    let (status, listed) = send(&ctx, Method::GET, &contents_uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().expect("contents array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["kind"], "text");
    assert_eq!(listed[0]["order"], 0);
    assert_eq!(listed[0]["item"], json!({"title": "Intro", "content": "Hello"}));
}

#[tokio::test]
async fn lesson_with_inline_contents_lists_summaries() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author02", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "harmony", false).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");

    let (status, lesson) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({
            "title": "Chords",
            "contents": [
                {"kind": "video", "payload": {"title": "Demo", "url": "https://video.example/1"}},
                {"kind": "question", "payload": {
                    "title": "Q1", "text": "2+2?",
                    "answers": [{"text": "4", "is_true": true}, {"text": "five"}]
                }}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {lesson}");
    assert_eq!(lesson["contents"][0]["order"], 0);
    assert_eq!(lesson["contents"][1]["order"], 1);
    assert_eq!(lesson["contents"][1]["item"]["answers"][1]["text"], "five");

    let (status, lessons) =
        send(&ctx, Method::GET, &format!("{base}/modules/{module_id}/lessons"), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        lessons[0]["contents"],
        json!([
            {"id": lesson["contents"][0]["id"], "kind": "video", "order": 0, "title": "Demo"},
            {"id": lesson["contents"][1]["id"], "kind": "question", "order": 1, "title": "Q1"}
        ])
    );
}

#[tokio::test]
async fn invalid_inline_content_rolls_back_lesson() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author03", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "rhythm", false).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");

    let (status, body) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({
            "title": "Broken",
            "contents": [
                {"kind": "text", "payload": {"title": "Ok", "content": "Fine"}},
                {"kind": "task", "payload": {"title": "No description"}}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "contents[1].payload.description");

    let lessons = repositories::lessons::list_by_module(ctx.db(), module_id)
        .await
        .expect("list lessons");
    assert!(lessons.is_empty());
}

#[tokio::test]
async fn unknown_content_type_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author04", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "melody", false).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");
    let (_, lesson) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({"title": "L"})),
    )
    .await;
    let lesson_id = lesson["id"].as_str().expect("lesson id");

    let (status, body) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons/{lesson_id}/contents"),
        &token,
        Some(json!({"kind": "poll", "payload": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "unknown_content_type");
}

#[tokio::test]
async fn only_creator_can_author() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author05", "author-pass").await;
    let stranger = test_support::insert_user(ctx.db(), "stranger05", "stranger-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "counterpoint", true).await;

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/courses/{}/modules", course.slug),
        &ctx.token_for(&stranger),
        Some(json!({"title": "Hijack"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn members_read_only_approved_courses() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author06", "author-pass").await;
    let learner = test_support::insert_user(ctx.db(), "learner06", "learner-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "solfege", false).await;
    repositories::courses::add_member(
        ctx.db(),
        &course.id,
        &learner.id,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("add member");

    let uri = format!("/api/v1/courses/{}/modules", course.slug);
    let token = ctx.token_for(&learner);

    let (status, _) = send(&ctx, Method::GET, &uri, &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, mine) = send(&ctx, Method::GET, "/api/v1/courses/mine", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0], json!({"title": "solfege", "message": "Course is not approved yet"}));

    repositories::courses::set_approval(ctx.db(), &course.id, true).await.expect("approve");
    let (status, modules) = send(&ctx, Method::GET, &uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(modules, json!([]));
}

#[tokio::test]
async fn answering_a_question_grades_exactly() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author07", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "arithmetic", true).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");
    let (_, lesson) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({
            "title": "L",
            "contents": [{"kind": "question", "payload": {
                "title": "Sum", "text": "2+2?",
                "answers": [{"text": "4", "is_true": true}, {"text": "five", "is_true": false}]
            }}]
        })),
    )
    .await;
    let lesson_id = lesson["id"].as_str().expect("lesson id");
    let content_id = lesson["contents"][0]["id"].as_str().expect("content id");
    let answer_uri =
        format!("{base}/modules/{module_id}/lessons/{lesson_id}/contents/{content_id}/answer");

    for (answer, verdict) in [("4", "correct"), ("five", "incorrect"), ("Four", "incorrect")] {
        let (status, body) =
            send(&ctx, Method::POST, &answer_uri, &token, Some(json!({"answer": answer}))).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["verdict"], verdict, "answer {answer}");
    }
}

#[tokio::test]
async fn deleting_content_removes_item_and_keeps_sibling_orders() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author08", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "theory", false).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");
    let (_, lesson) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({
            "title": "L",
            "contents": [
                {"kind": "text", "payload": {"title": "A", "content": "a"}},
                {"kind": "text", "payload": {"title": "B", "content": "b"}},
                {"kind": "text", "payload": {"title": "C", "content": "c"}}
            ]
        })),
    )
    .await;
    let lesson_id = lesson["id"].as_str().expect("lesson id");
    let middle_id = lesson["contents"][1]["id"].as_str().expect("content id");
    let contents_uri = format!("{base}/modules/{module_id}/lessons/{lesson_id}/contents");

    let middle = repositories::contents::find_by_id(ctx.db(), middle_id)
        .await
        .expect("find content")
        .expect("content exists");

    let (status, _) =
        send(&ctx, Method::DELETE, &format!("{contents_uri}/{middle_id}"), &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        send(&ctx, Method::GET, &format!("{contents_uri}/{middle_id}"), &token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(repositories::items::find_text(ctx.db(), &middle.target_id)
        .await
        .expect("find text")
        .is_none());

    let (_, listed) = send(&ctx, Method::GET, &contents_uri, &token, None).await;
    let orders: Vec<i64> =
        listed.as_array().expect("array").iter().filter_map(|c| c["order"].as_i64()).collect();
    assert_eq!(orders, [0, 2]);
}

#[tokio::test]
async fn comments_are_listed_with_content() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author09", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "ear-training", false).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");
    let (_, lesson) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({
            "title": "L",
            "contents": [{"kind": "task", "payload": {"title": "Sing", "description": "Record it"}}]
        })),
    )
    .await;
    let lesson_id = lesson["id"].as_str().expect("lesson id");
    let content_id = lesson["contents"][0]["id"].as_str().expect("content id");
    let content_uri = format!("{base}/modules/{module_id}/lessons/{lesson_id}/contents/{content_id}");

    let (status, comment) = send(
        &ctx,
        Method::POST,
        &format!("{content_uri}/comments"),
        &token,
        Some(json!({"text": "Use a metronome"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {comment}");
    assert_eq!(comment["author"], "author09");

    let (status, content) = send(&ctx, Method::GET, &content_uri, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["item"]["title"], "Sing");
    assert_eq!(content["comments"][0]["text"], "Use a metronome");
}

#[tokio::test]
async fn duplicate_course_slug_conflicts() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author10", "author-pass").await;
    let token = ctx.token_for(&author);
    let body = json!({"title": "Jazz Piano", "description": "Swing", "price": "19.99"});

    let (status, created) =
        send(&ctx, Method::POST, "/api/v1/courses/paid", &token, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["is_free"], false);

    let (status, _) = send(&ctx, Method::POST, "/api/v1/courses/paid", &token, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_course_removes_its_items() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author11", "author-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "composition", false).await;
    let token = ctx.token_for(&author);
    let base = format!("/api/v1/courses/{}", course.slug);

    let (_, module) =
        send(&ctx, Method::POST, &format!("{base}/modules"), &token, Some(json!({"title": "M"})))
            .await;
    let module_id = module["id"].as_str().expect("module id");
    let (_, lesson) = send(
        &ctx,
        Method::POST,
        &format!("{base}/modules/{module_id}/lessons"),
        &token,
        Some(json!({
            "title": "L",
            "contents": [{"kind": "text", "payload": {"title": "A", "content": "a"}}]
        })),
    )
    .await;
    let content_id = lesson["contents"][0]["id"].as_str().expect("content id");
    let content = repositories::contents::find_by_id(ctx.db(), content_id)
        .await
        .expect("find content")
        .expect("content exists");

    let (status, _) = send(&ctx, Method::DELETE, &base, &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(repositories::courses::find_by_id(ctx.db(), &course.id)
        .await
        .expect("find course")
        .is_none());
    assert!(repositories::items::find_text(ctx.db(), &content.target_id)
        .await
        .expect("find text")
        .is_none());
}

#[tokio::test]
async fn moderation_publishes_course_to_catalog() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author12", "author-pass").await;
    let moderator = test_support::insert_moderator(ctx.db(), "moderator12", "moderator-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "orchestration", false).await;
    let author_token = ctx.token_for(&author);
    let moderator_token = ctx.token_for(&moderator);

    let (_, catalog) = send(&ctx, Method::GET, "/api/v1/catalog", &author_token, None).await;
    assert_eq!(catalog, json!([]));

    let (status, _) =
        send(&ctx, Method::GET, "/api/v1/moderation/courses", &author_token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pending) =
        send(&ctx, Method::GET, "/api/v1/moderation/courses", &moderator_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending[0]["slug"], course.slug);

    let (status, approved) = send(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/moderation/courses/{}", course.slug),
        &moderator_token,
        Some(json!({"approval": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {approved}");
    assert_eq!(approved["approval"], true);

    let (_, catalog) = send(&ctx, Method::GET, "/api/v1/catalog", &author_token, None).await;
    assert_eq!(catalog[0]["slug"], course.slug);
    assert_eq!(catalog[0]["creator_username"], "author12");
}

#[tokio::test]
async fn enrolled_members_rate_once() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author13", "author-pass").await;
    let learner = test_support::insert_user(ctx.db(), "learner13", "learner-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "conducting", true).await;
    let token = ctx.token_for(&learner);
    let base = format!("/api/v1/catalog/{}", course.slug);
    let rating = json!({"rating": 4, "review": "Clear"});

    let (status, _) =
        send(&ctx, Method::POST, &format!("{base}/ratings"), &token, Some(rating.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&ctx, Method::POST, &format!("{base}/enroll"), &token, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&ctx, Method::POST, &format!("{base}/enroll"), &token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, created) =
        send(&ctx, Method::POST, &format!("{base}/ratings"), &token, Some(rating.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["author"], "learner13");

    let (status, body) =
        send(&ctx, Method::POST, &format!("{base}/ratings"), &token, Some(rating)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_rating");

    let (status, body) = send(
        &ctx,
        Method::POST,
        &format!("{base}/ratings"),
        &token,
        Some(json!({"rating": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "rating");

    let (_, course_view) = send(&ctx, Method::GET, &base, &token, None).await;
    assert_eq!(course_view["ratings"][0]["rating"], 4);
}

#[tokio::test]
async fn review_queue_lists_only_own_courses() {
    let ctx = test_support::setup_test_context().await;
    let author = test_support::insert_user(ctx.db(), "author14", "author-pass").await;
    let other = test_support::insert_user(ctx.db(), "author15", "author-pass").await;
    let learner = test_support::insert_user(ctx.db(), "learner14", "learner-pass").await;
    let course = test_support::insert_course(ctx.db(), &author.id, "arranging", true).await;

    let module = crate::services::authoring::create_module(ctx.db(), &course.id, "M")
        .await
        .expect("module");
    let tasks = crate::services::authoring::parse_inline_contents(vec![(
        "task".to_string(),
        json!({"title": "Arrange", "description": "Upload a score"}),
    )])
    .expect("payload");
    let (_, created) = crate::services::authoring::create_lesson(ctx.db(), &module.id, "L", &tasks)
        .await
        .expect("lesson");

    let mut conn = ctx.db().acquire().await.expect("connection");
    let submission = crate::services::submissions::record_submission(
        &mut conn,
        &created[0].content.target_id,
        &learner.id,
        "submissions/score.pdf",
    )
    .await
    .expect("submission");
    drop(conn);

    let (status, queue) =
        send(&ctx, Method::GET, "/api/v1/reviews", &ctx.token_for(&author), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue[0]["id"], submission.id);
    assert_eq!(queue[0]["task_title"], "Arrange");

    let (_, queue) = send(&ctx, Method::GET, "/api/v1/reviews", &ctx.token_for(&other), None).await;
    assert_eq!(queue, json!([]));

    let review_uri = format!("/api/v1/reviews/{}", submission.id);
    let (status, _) = send(
        &ctx,
        Method::POST,
        &review_uri,
        &ctx.token_for(&other),
        Some(json!({"is_correct": true})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, review) = send(
        &ctx,
        Method::POST,
        &review_uri,
        &ctx.token_for(&author),
        Some(json!({"is_correct": false, "comment": "Check the bass line"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {review}");

    let (_, queue) = send(&ctx, Method::GET, "/api/v1/reviews", &ctx.token_for(&author), None).await;
    assert_eq!(queue, json!([]));
}
