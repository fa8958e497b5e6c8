use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::{format_primitive, format_short};
use crate::db::models::Course;
use crate::db::models::display_name;
use crate::repositories::ratings::RatingWithAuthor;

pub(crate) const NOT_APPROVED_MESSAGE: &str = "Course is not approved yet";

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PaidCourseCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) target_description: String,
    #[validate(custom(function = "validate_price"))]
    pub(crate) price: Decimal,
    #[serde(default)]
    pub(crate) logo: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct FreeCourseCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) target_description: String,
    #[serde(default)]
    pub(crate) logo: Option<String>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("price").with_message("price must not be negative".into()));
    }
    if price.scale() > 2 {
        return Err(
            ValidationError::new("price").with_message("price allows at most 2 decimals".into())
        );
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalUpdate {
    pub(crate) approval: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RatingCreate {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub(crate) rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub(crate) review: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RatingResponse {
    pub(crate) id: String,
    pub(crate) author: String,
    pub(crate) rating: i32,
    pub(crate) review: String,
    pub(crate) created_at: String,
}

impl RatingResponse {
    pub(crate) fn from_row(row: RatingWithAuthor) -> Self {
        Self {
            author: display_name(&row.username, &row.first_name, &row.last_name),
            id: row.id,
            rating: row.rating,
            review: row.review,
            created_at: format_primitive(row.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) target_description: String,
    pub(crate) logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) logo_url: Option<String>,
    pub(crate) price: Decimal,
    pub(crate) is_free: bool,
    pub(crate) creator_username: String,
    pub(crate) created_at: String,
    pub(crate) created_at_formatted: String,
    pub(crate) approval: bool,
    pub(crate) average_rating: Option<f64>,
    pub(crate) ratings: Vec<RatingResponse>,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course, creator_username: String) -> Self {
        Self {
            is_free: course.is_free(),
            id: course.id,
            title: course.title,
            slug: course.slug,
            description: course.description,
            target_description: course.target_description,
            logo: course.logo,
            logo_url: None,
            price: course.price,
            creator_username,
            created_at: format_primitive(course.created_at),
            created_at_formatted: format_short(course.created_at),
            approval: course.approval,
            average_rating: None,
            ratings: Vec::new(),
        }
    }
}

/// Entry of the learner's course list; unapproved courses are reduced to a notice.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum MyCourseEntry {
    Approved(Box<CourseResponse>),
    Pending { title: String, message: &'static str },
}
