use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::CourseRating;

pub(crate) const RATING_UNIQUE: &str = "course_ratings_course_user_key";

/// Rating joined with the author's names for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RatingWithAuthor {
    pub(crate) id: String,
    pub(crate) rating: i32,
    pub(crate) review: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
}

pub(crate) struct CreateRating<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) rating: i32,
    pub(crate) review: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateRating<'_>,
) -> Result<CourseRating, sqlx::Error> {
    sqlx::query_as::<_, CourseRating>(
        "INSERT INTO course_ratings (id, course_id, user_id, rating, review, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING id, course_id, user_id, rating, review, created_at",
    )
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.user_id)
    .bind(params.rating)
    .bind(params.review)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<RatingWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, RatingWithAuthor>(
        "SELECT r.id, r.rating, r.review, r.created_at,
                u.username, u.first_name, u.last_name
         FROM course_ratings r
         JOIN users u ON u.id = r.user_id
         WHERE r.course_id = $1
         ORDER BY r.created_at DESC",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Mean rating, `None` when the course has no ratings yet.
pub(crate) async fn average(pool: &PgPool, course_id: &str) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(rating)::DOUBLE PRECISION FROM course_ratings WHERE course_id = $1",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
}
