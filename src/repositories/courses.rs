use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Course;

pub(crate) const SLUG_UNIQUE: &str = "courses_slug_key";

const COURSE_COLUMNS: &str = "id, creator_id, title, slug, description, target_description, \
     price, logo, approval, created_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) creator_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) description: &'a str,
    pub(crate) target_description: &'a str,
    pub(crate) price: Decimal,
    pub(crate) logo: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// New courses always start unapproved.
pub(crate) async fn create(pool: &PgPool, params: CreateCourse<'_>) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, creator_id, title, slug, description, target_description,
            price, logo, approval, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,FALSE,$9)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.creator_id)
    .bind(params.title)
    .bind(params.slug)
    .bind(params.description)
    .bind(params.target_description)
    .bind(params.price)
    .bind(params.logo)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_approved(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE approval = TRUE ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_pending(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE approval = FALSE ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_creator(
    pool: &PgPool,
    creator_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE creator_id = $1 ORDER BY created_at DESC"
    ))
    .bind(creator_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_member(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT c.id, c.creator_id, c.title, c.slug, c.description, c.target_description,
                c.price, c.logo, c.approval, c.created_at
         FROM courses c
         JOIN course_members cm ON cm.course_id = c.id
         WHERE cm.user_id = $1
         ORDER BY cm.joined_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_approval(
    pool: &PgPool,
    course_id: &str,
    approval: bool,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET approval = $1 WHERE id = $2 RETURNING {COURSE_COLUMNS}"
    ))
    .bind(approval)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

/// Adds the user to the course access set; repeated calls are no-ops.
pub(crate) async fn add_member(
    pool: &PgPool,
    course_id: &str,
    user_id: &str,
    joined_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO course_members (course_id, user_id, joined_at)
         VALUES ($1,$2,$3)
         ON CONFLICT (course_id, user_id) DO NOTHING",
    )
    .bind(course_id)
    .bind(user_id)
    .bind(joined_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn is_member(
    pool: &PgPool,
    course_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM course_members WHERE course_id = $1 AND user_id = $2
         )",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Usernames of the given creators keyed by user id.
pub(crate) async fn creator_names(
    pool: &PgPool,
    creator_ids: &[String],
) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT id, username FROM users WHERE id = ANY($1)",
    )
    .bind(creator_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
