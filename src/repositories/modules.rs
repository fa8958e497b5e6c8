use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Module;

const COLUMNS: &str = "id, course_id, title, order_index, created_at";

pub(crate) struct CreateModule<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateModule<'_>,
) -> Result<Module, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "INSERT INTO modules (id, course_id, title, order_index, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.order_index)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {COLUMNS} FROM modules WHERE course_id = $1 ORDER BY order_index"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Module lookup scoped to its course, so ids from another course never match.
pub(crate) async fn find_in_course(
    pool: &PgPool,
    course_id: &str,
    module_id: &str,
) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {COLUMNS} FROM modules WHERE course_id = $1 AND id = $2"
    ))
    .bind(course_id)
    .bind(module_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    module_id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM modules WHERE id = $1").bind(module_id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}
