use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Content;
use crate::db::types::ContentKind;

const COLUMNS: &str = "id, lesson_id, kind, target_id, order_index, created_at";

/// Parent whose whole content subtree is about to be removed.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Subtree<'a> {
    Course(&'a str),
    Module(&'a str),
    Lesson(&'a str),
}

impl Subtree<'_> {
    fn id(&self) -> &str {
        match self {
            Self::Course(id) | Self::Module(id) | Self::Lesson(id) => id,
        }
    }

    /// Predicate over `contents c` selecting the rows below this parent; binds `$2`.
    fn filter(&self) -> &'static str {
        match self {
            Self::Course(_) => {
                "c.lesson_id IN (
                    SELECT l.id FROM lessons l
                    JOIN modules m ON m.id = l.module_id
                    WHERE m.course_id = $2
                 )"
            }
            Self::Module(_) => "c.lesson_id IN (SELECT id FROM lessons WHERE module_id = $2)",
            Self::Lesson(_) => "c.lesson_id = $2",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ContentSummaryRow {
    pub(crate) id: String,
    pub(crate) lesson_id: String,
    pub(crate) kind: ContentKind,
    pub(crate) order_index: i32,
    pub(crate) title: Option<String>,
}

pub(crate) struct CreateContent<'a> {
    pub(crate) id: &'a str,
    pub(crate) lesson_id: &'a str,
    pub(crate) kind: ContentKind,
    pub(crate) target_id: &'a str,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateContent<'_>,
) -> Result<Content, sqlx::Error> {
    sqlx::query_as::<_, Content>(&format!(
        "INSERT INTO contents (id, lesson_id, kind, target_id, order_index, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lesson_id)
    .bind(params.kind)
    .bind(params.target_id)
    .bind(params.order_index)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_lesson(
    pool: &PgPool,
    lesson_id: &str,
) -> Result<Vec<Content>, sqlx::Error> {
    sqlx::query_as::<_, Content>(&format!(
        "SELECT {COLUMNS} FROM contents WHERE lesson_id = $1 ORDER BY order_index"
    ))
    .bind(lesson_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    content_id: &str,
) -> Result<Option<Content>, sqlx::Error> {
    sqlx::query_as::<_, Content>(&format!("SELECT {COLUMNS} FROM contents WHERE id = $1"))
        .bind(content_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_in_lesson(
    pool: &PgPool,
    lesson_id: &str,
    content_id: &str,
) -> Result<Option<Content>, sqlx::Error> {
    sqlx::query_as::<_, Content>(&format!(
        "SELECT {COLUMNS} FROM contents WHERE lesson_id = $1 AND id = $2"
    ))
    .bind(lesson_id)
    .bind(content_id)
    .fetch_optional(pool)
    .await
}

/// Row-locks the wrapper so concurrent deletes of the same content serialize.
pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    content_id: &str,
) -> Result<Option<Content>, sqlx::Error> {
    sqlx::query_as::<_, Content>(&format!(
        "SELECT {COLUMNS} FROM contents WHERE id = $1 FOR UPDATE"
    ))
    .bind(content_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    content_id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM contents WHERE id = $1").bind(content_id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn question_in_lesson(
    executor: impl sqlx::PgExecutor<'_>,
    lesson_id: &str,
    question_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM contents
            WHERE lesson_id = $1 AND kind = $2 AND target_id = $3
         )",
    )
    .bind(lesson_id)
    .bind(ContentKind::Question)
    .bind(question_id)
    .fetch_one(executor)
    .await
}

/// Drops answer wrappers pointing at answers of `question_id`, which would
/// dangle once the question (and its answers) are gone.
pub(crate) async fn delete_answer_wrappers(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM contents
         WHERE kind = $1
           AND target_id IN (SELECT id FROM content_answers WHERE question_id = $2)",
    )
    .bind(ContentKind::Answer)
    .bind(question_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes the concrete items referenced from every content under `subtree`.
/// The wrappers themselves go away through the parent's cascading delete.
pub(crate) async fn delete_items_in_subtree(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    subtree: Subtree<'_>,
) -> Result<u64, sqlx::Error> {
    let filter = subtree.filter();

    // Answer wrappers elsewhere may point at answers of questions in this subtree.
    sqlx::query(&format!(
        "DELETE FROM contents
         WHERE kind = 'answer'
           AND target_id IN (
               SELECT a.id FROM content_answers a
               WHERE a.question_id IN (
                   SELECT c.target_id FROM contents c WHERE c.kind = $1 AND {filter}
               )
           )"
    ))
    .bind(ContentKind::Question)
    .bind(subtree.id())
    .execute(&mut **tx)
    .await?;

    let mut removed = 0;
    for kind in ContentKind::ALL {
        let result = sqlx::query(&format!(
            "DELETE FROM {table}
             WHERE id IN (SELECT c.target_id FROM contents c WHERE c.kind = $1 AND {filter})",
            table = kind.table(),
        ))
        .bind(kind)
        .bind(subtree.id())
        .execute(&mut **tx)
        .await?;
        removed += result.rows_affected();
    }

    Ok(removed)
}

/// Ordered content summaries for every lesson of a module, titles resolved
/// from whichever concrete table each row points into.
pub(crate) async fn list_summaries_by_module(
    pool: &PgPool,
    module_id: &str,
) -> Result<Vec<ContentSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ContentSummaryRow>(
        "SELECT c.id, c.lesson_id, c.kind, c.order_index,
                COALESCE(t.title, f.title, i.title, v.title, q.title, a.text, k.title) AS title
         FROM contents c
         JOIN lessons l ON l.id = c.lesson_id
         LEFT JOIN content_texts t ON c.kind = 'text' AND t.id = c.target_id
         LEFT JOIN content_files f ON c.kind = 'file' AND f.id = c.target_id
         LEFT JOIN content_images i ON c.kind = 'image' AND i.id = c.target_id
         LEFT JOIN content_videos v ON c.kind = 'video' AND v.id = c.target_id
         LEFT JOIN content_questions q ON c.kind = 'question' AND q.id = c.target_id
         LEFT JOIN content_answers a ON c.kind = 'answer' AND a.id = c.target_id
         LEFT JOIN content_tasks k ON c.kind = 'task' AND k.id = c.target_id
         WHERE l.module_id = $1
         ORDER BY l.order_index, c.order_index",
    )
    .bind(module_id)
    .fetch_all(pool)
    .await
}
