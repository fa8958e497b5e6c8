use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Lesson, Module};
use crate::repositories;
use crate::repositories::contents::Subtree;
use crate::services::content_registry::{self, ContentPayload, ResolvedContent};
use crate::services::errors::{DomainError, FieldError};
use crate::services::ordering::{assign_order, OrderScope};

pub(crate) async fn create_module(
    pool: &PgPool,
    course_id: &str,
    title: &str,
) -> Result<Module, DomainError> {
    let mut tx = pool.begin().await?;
    let order_index = assign_order(&mut *tx, OrderScope::Course(course_id)).await?;

    let module = repositories::modules::create(
        &mut *tx,
        repositories::modules::CreateModule {
            id: &Uuid::new_v4().to_string(),
            course_id,
            title,
            order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tx.commit().await?;
    tracing::info!(module_id = %module.id, course_id, order = order_index, "Module created");
    Ok(module)
}

/// Parses inline `(tag, payload)` entries, prefixing field paths with the entry index.
pub(crate) fn parse_inline_contents(
    entries: Vec<(String, Value)>,
) -> Result<Vec<ContentPayload>, DomainError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, (tag, payload))| {
            content_registry::parse_payload(&tag, payload).map_err(|err| match err {
                DomainError::Validation(fields) => DomainError::Validation(
                    fields
                        .into_iter()
                        .map(|field| {
                            FieldError::new(
                                format!("contents[{index}].{}", field.field),
                                field.message,
                            )
                        })
                        .collect(),
                ),
                other => other,
            })
        })
        .collect()
}

/// Creates a lesson and its initial contents in one transaction; contents take
/// orders in the order given.
pub(crate) async fn create_lesson(
    pool: &PgPool,
    module_id: &str,
    title: &str,
    contents: &[ContentPayload],
) -> Result<(Lesson, Vec<ResolvedContent>), DomainError> {
    let mut tx = pool.begin().await?;
    let order_index = assign_order(&mut *tx, OrderScope::Module(module_id)).await?;

    let lesson = repositories::lessons::create(
        &mut *tx,
        repositories::lessons::CreateLesson {
            id: &Uuid::new_v4().to_string(),
            module_id,
            title,
            order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    let mut created = Vec::with_capacity(contents.len());
    for payload in contents {
        created.push(content_registry::create_content_in(&mut *tx, &lesson.id, payload).await?);
    }

    tx.commit().await?;
    tracing::info!(
        lesson_id = %lesson.id,
        module_id,
        order = order_index,
        contents = created.len(),
        "Lesson created"
    );
    Ok((lesson, created))
}

pub(crate) async fn delete_course(pool: &PgPool, course_id: &str) -> Result<(), DomainError> {
    delete_subtree(pool, Subtree::Course(course_id)).await
}

pub(crate) async fn delete_module(pool: &PgPool, module_id: &str) -> Result<(), DomainError> {
    delete_subtree(pool, Subtree::Module(module_id)).await
}

pub(crate) async fn delete_lesson(pool: &PgPool, lesson_id: &str) -> Result<(), DomainError> {
    delete_subtree(pool, Subtree::Lesson(lesson_id)).await
}

/// Drops the concrete items below the parent, then the parent itself; content
/// wrappers follow through the cascade. Survivors keep their orders.
async fn delete_subtree(pool: &PgPool, subtree: Subtree<'_>) -> Result<(), DomainError> {
    let mut tx = pool.begin().await?;
    let items = repositories::contents::delete_items_in_subtree(&mut tx, subtree).await?;

    let deleted = match subtree {
        Subtree::Course(id) => repositories::courses::delete(&mut *tx, id).await?,
        Subtree::Module(id) => repositories::modules::delete(&mut *tx, id).await?,
        Subtree::Lesson(id) => repositories::lessons::delete(&mut *tx, id).await?,
    };

    if !deleted {
        return Err(DomainError::NotFound(match subtree {
            Subtree::Course(_) => "course",
            Subtree::Module(_) => "module",
            Subtree::Lesson(_) => "lesson",
        }));
    }

    tx.commit().await?;
    tracing::info!(?subtree, items, "Subtree deleted");
    Ok(())
}
