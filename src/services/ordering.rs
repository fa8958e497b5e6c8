use sqlx::PgConnection;

use crate::services::errors::DomainError;

/// Parent that defines a sibling set; order values are unique within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderScope<'a> {
    Course(&'a str),
    Module(&'a str),
    Lesson(&'a str),
}

impl<'a> OrderScope<'a> {
    pub(crate) fn parent_id(&self) -> &'a str {
        match *self {
            Self::Course(id) | Self::Module(id) | Self::Lesson(id) => id,
        }
    }

    pub(crate) fn parent_name(&self) -> &'static str {
        match self {
            Self::Course(_) => "course",
            Self::Module(_) => "module",
            Self::Lesson(_) => "lesson",
        }
    }

    fn parent_table(&self) -> &'static str {
        match self {
            Self::Course(_) => "courses",
            Self::Module(_) => "modules",
            Self::Lesson(_) => "lessons",
        }
    }

    fn child_table(&self) -> &'static str {
        match self {
            Self::Course(_) => "modules",
            Self::Module(_) => "lessons",
            Self::Lesson(_) => "contents",
        }
    }

    fn parent_column(&self) -> &'static str {
        match self {
            Self::Course(_) => "course_id",
            Self::Module(_) => "module_id",
            Self::Lesson(_) => "lesson_id",
        }
    }
}

/// First sibling gets 0, later ones go after the current maximum.
pub(crate) fn next_order(current_max: Option<i32>) -> i32 {
    current_max.map_or(0, |max| max + 1)
}

/// Computes the order for a sibling about to be inserted into `scope`.
///
/// Takes a row lock on the parent, so concurrent inserts into the same scope
/// queue behind each other until the holding transaction ends. Inserts into
/// other scopes lock other rows and are not affected. Must run inside the
/// transaction that performs the insert.
pub(crate) async fn assign_order(
    conn: &mut PgConnection,
    scope: OrderScope<'_>,
) -> Result<i32, DomainError> {
    let locked = sqlx::query_scalar::<_, String>(&format!(
        "SELECT id FROM {} WHERE id = $1 FOR UPDATE",
        scope.parent_table()
    ))
    .bind(scope.parent_id())
    .fetch_optional(&mut *conn)
    .await?;

    if locked.is_none() {
        return Err(DomainError::InvalidScope {
            parent: scope.parent_name(),
            id: scope.parent_id().to_string(),
        });
    }

    let current_max = sqlx::query_scalar::<_, Option<i32>>(&format!(
        "SELECT MAX(order_index) FROM {} WHERE {} = $1",
        scope.child_table(),
        scope.parent_column()
    ))
    .bind(scope.parent_id())
    .fetch_one(&mut *conn)
    .await?;

    let order = next_order(current_max);
    tracing::debug!(
        scope = scope.parent_name(),
        parent_id = scope.parent_id(),
        order,
        "Assigned sibling order"
    );
    Ok(order)
}
