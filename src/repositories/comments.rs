use sqlx::PgPool;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CommentWithAuthor {
    pub(crate) id: String,
    pub(crate) author_id: String,
    pub(crate) text: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
}

pub(crate) async fn list_by_content(
    pool: &PgPool,
    content_id: &str,
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthor>(
        "SELECT cc.id, cc.author_id, cc.text, cc.created_at,
                u.username, u.first_name, u.last_name
         FROM content_comments cc
         JOIN users u ON u.id = cc.author_id
         WHERE cc.content_id = $1
         ORDER BY cc.created_at, cc.id",
    )
    .bind(content_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    content_id: &str,
    author_id: &str,
    text: &str,
    created_at: PrimitiveDateTime,
) -> Result<CommentWithAuthor, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthor>(
        "WITH inserted AS (
            INSERT INTO content_comments (id, content_id, author_id, text, created_at)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id, author_id, text, created_at
         )
         SELECT i.id, i.author_id, i.text, i.created_at,
                u.username, u.first_name, u.last_name
         FROM inserted i
         JOIN users u ON u.id = i.author_id",
    )
    .bind(id)
    .bind(content_id)
    .bind(author_id)
    .bind(text)
    .bind(created_at)
    .fetch_one(pool)
    .await
}
