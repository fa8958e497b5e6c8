use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db::types::ContentKind;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FieldError {
    pub(crate) field: String,
    pub(crate) message: String,
}

impl FieldError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("{parent} {id} does not exist")]
    InvalidScope { parent: &'static str, id: String },
    #[error("unknown content type '{0}'")]
    UnknownContentType(String),
    #[error("{kind} item {target_id} referenced by content {content_id} is missing")]
    DanglingReference { content_id: String, kind: ContentKind, target_id: String },
    #[error("task already submitted by this student")]
    DuplicateSubmission,
    #[error("submission already reviewed")]
    DuplicateReview,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0} content does not accept answers")]
    NotAnswerable(ContentKind),
    #[error("blob storage failure: {0}")]
    Storage(String),
    #[error("{0}")]
    Internal(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DomainError {
    pub(crate) fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Stable machine-readable code for clients.
    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::InvalidScope { .. } => "invalid_scope",
            Self::UnknownContentType(_) => "unknown_content_type",
            Self::DanglingReference { .. } => "dangling_reference",
            Self::DuplicateSubmission => "duplicate_submission",
            Self::DuplicateReview => "duplicate_review",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_failed",
            Self::NotAnswerable(_) => "not_answerable",
            Self::Storage(_) => "storage_unavailable",
            Self::Internal(_) | Self::Database(_) => "internal_error",
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(field_errors(&errors, ""))
    }
}

/// Flattens nested validator output into dotted field paths.
pub(crate) fn field_errors(errors: &ValidationErrors, prefix: &str) -> Vec<FieldError> {
    let mut collected = Vec::new();
    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    collected.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collected.extend(field_errors(inner, &path));
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collected.extend(field_errors(inner, &format!("{path}[{index}]")));
                }
            }
        }
    }
    collected.sort_by(|left, right| left.field.cmp(&right.field));
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "title must not be empty"))]
        title: String,
        #[validate(range(min = 1, max = 5))]
        rating: i32,
    }

    #[test]
    fn validator_errors_become_field_list() {
        let sample = Sample { title: String::new(), rating: 9 };
        let error = DomainError::from(sample.validate().unwrap_err());

        let DomainError::Validation(fields) = error else {
            panic!("expected validation error");
        };
        assert_eq!(
            fields,
            vec![
                FieldError::new("rating", "range"),
                FieldError::new("title", "title must not be empty"),
            ]
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(DomainError::DuplicateSubmission.code(), "duplicate_submission");
        assert_eq!(DomainError::DuplicateReview.code(), "duplicate_review");
        assert_eq!(DomainError::UnknownContentType("x".into()).code(), "unknown_content_type");
        assert_eq!(
            DomainError::InvalidScope { parent: "lesson", id: "missing".into() }.code(),
            "invalid_scope"
        );
        assert_eq!(DomainError::field("title", "required").code(), "validation_failed");
    }
}
