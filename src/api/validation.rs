use std::path::Path;

use validator::Validate;

use crate::api::errors::ApiError;
use crate::services::errors::DomainError;

/// Runs derived validators and turns failures into the field-level error list.
pub(crate) fn validate_body<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate().map_err(|errors| ApiError::from(DomainError::from(errors)))
}

pub(crate) fn validate_submission_upload(
    filename: &str,
    size: usize,
    allowed_extensions: &[String],
    max_bytes: usize,
) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::field("file", "File must have an extension"))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::field(
            "file",
            &format!("File extension '{extension}' is not allowed"),
        ));
    }

    if size == 0 {
        return Err(ApiError::field("file", "File is empty"));
    }
    if size > max_bytes {
        return Err(ApiError::field("file", "File is too large"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["pdf".to_string(), "mp3".to_string()]
    }

    #[test]
    fn accepts_allowed_extension_case_insensitively() {
        assert!(validate_submission_upload("Etude.MP3", 10, &allowed(), 100).is_ok());
    }

    #[test]
    fn rejects_missing_or_unknown_extension() {
        assert!(validate_submission_upload("README", 10, &allowed(), 100).is_err());
        assert!(validate_submission_upload("run.exe", 10, &allowed(), 100).is_err());
    }

    #[test]
    fn rejects_empty_and_oversized_files() {
        assert!(validate_submission_upload("a.pdf", 0, &allowed(), 100).is_err());
        assert!(validate_submission_upload("a.pdf", 101, &allowed(), 100).is_err());
    }
}
