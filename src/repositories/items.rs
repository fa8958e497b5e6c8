use crate::db::models::{AnswerItem, FileItem, QuestionItem, TaskItem, TextItem, VideoItem};
use crate::db::types::ContentKind;

pub(crate) async fn insert_text(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    title: &str,
    content: &str,
) -> Result<TextItem, sqlx::Error> {
    sqlx::query_as::<_, TextItem>(
        "INSERT INTO content_texts (id, title, content) VALUES ($1,$2,$3)
         RETURNING id, title, content",
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_text(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<TextItem>, sqlx::Error> {
    sqlx::query_as::<_, TextItem>("SELECT id, title, content FROM content_texts WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Files and images share a row shape; `kind` picks the table.
pub(crate) async fn insert_file(
    executor: impl sqlx::PgExecutor<'_>,
    kind: ContentKind,
    id: &str,
    title: &str,
    file: &str,
) -> Result<FileItem, sqlx::Error> {
    sqlx::query_as::<_, FileItem>(&format!(
        "INSERT INTO {} (id, title, file) VALUES ($1,$2,$3) RETURNING id, title, file",
        file_table(kind)
    ))
    .bind(id)
    .bind(title)
    .bind(file)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_file(
    executor: impl sqlx::PgExecutor<'_>,
    kind: ContentKind,
    id: &str,
) -> Result<Option<FileItem>, sqlx::Error> {
    sqlx::query_as::<_, FileItem>(&format!(
        "SELECT id, title, file FROM {} WHERE id = $1",
        file_table(kind)
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

fn file_table(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Image => ContentKind::Image.table(),
        _ => ContentKind::File.table(),
    }
}

pub(crate) async fn insert_video(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    title: &str,
    url: &str,
) -> Result<VideoItem, sqlx::Error> {
    sqlx::query_as::<_, VideoItem>(
        "INSERT INTO content_videos (id, title, url) VALUES ($1,$2,$3) RETURNING id, title, url",
    )
    .bind(id)
    .bind(title)
    .bind(url)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_video(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<VideoItem>, sqlx::Error> {
    sqlx::query_as::<_, VideoItem>("SELECT id, title, url FROM content_videos WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn insert_question(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    title: &str,
    text: &str,
) -> Result<QuestionItem, sqlx::Error> {
    sqlx::query_as::<_, QuestionItem>(
        "INSERT INTO content_questions (id, title, text) VALUES ($1,$2,$3)
         RETURNING id, title, text",
    )
    .bind(id)
    .bind(title)
    .bind(text)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_question(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<QuestionItem>, sqlx::Error> {
    sqlx::query_as::<_, QuestionItem>(
        "SELECT id, title, text FROM content_questions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn insert_answer(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    question_id: &str,
    text: &str,
    is_true: bool,
) -> Result<AnswerItem, sqlx::Error> {
    sqlx::query_as::<_, AnswerItem>(
        "INSERT INTO content_answers (id, question_id, text, is_true) VALUES ($1,$2,$3,$4)
         RETURNING id, question_id, text, is_true",
    )
    .bind(id)
    .bind(question_id)
    .bind(text)
    .bind(is_true)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_answer(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AnswerItem>, sqlx::Error> {
    sqlx::query_as::<_, AnswerItem>(
        "SELECT id, question_id, text, is_true FROM content_answers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Answers in insertion order.
pub(crate) async fn list_answers(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<Vec<AnswerItem>, sqlx::Error> {
    sqlx::query_as::<_, AnswerItem>(
        "SELECT id, question_id, text, is_true FROM content_answers
         WHERE question_id = $1
         ORDER BY seq",
    )
    .bind(question_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn insert_task(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    title: &str,
    description: &str,
) -> Result<TaskItem, sqlx::Error> {
    sqlx::query_as::<_, TaskItem>(
        "INSERT INTO content_tasks (id, title, description) VALUES ($1,$2,$3)
         RETURNING id, title, description",
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_task(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<TaskItem>, sqlx::Error> {
    sqlx::query_as::<_, TaskItem>("SELECT id, title, description FROM content_tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Removes the concrete row behind `(kind, id)`. Returns whether a row existed.
pub(crate) async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    kind: ContentKind,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    kind: ContentKind,
    id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
        kind.table()
    ))
    .bind(id)
    .fetch_one(executor)
    .await
}
