use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::helpers::course_responses;
use crate::api::errors::ApiError;
use crate::api::guards::{load_course, require_author, require_reader, CurrentUser};
use crate::api::validation::validate_body;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::{Course, User};
use crate::repositories;
use crate::schemas::course::{
    CourseResponse, FreeCourseCreate, MyCourseEntry, PaidCourseCreate, NOT_APPROVED_MESSAGE,
};
use crate::services::{authoring, slugs};

struct NewCourse<'a> {
    title: &'a str,
    description: &'a str,
    target_description: &'a str,
    price: Decimal,
    logo: Option<&'a str>,
}

pub(super) async fn create_paid_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<PaidCourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    validate_body(&payload)?;

    let course = insert_course(
        &state,
        &user,
        NewCourse {
            title: payload.title.trim(),
            description: &payload.description,
            target_description: &payload.target_description,
            price: payload.price,
            logo: payload.logo.as_deref(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course, user.username))))
}

pub(super) async fn create_free_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<FreeCourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    validate_body(&payload)?;

    let course = insert_course(
        &state,
        &user,
        NewCourse {
            title: payload.title.trim(),
            description: &payload.description,
            target_description: &payload.target_description,
            price: Decimal::ZERO,
            logo: payload.logo.as_deref(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course, user.username))))
}

async fn insert_course(
    state: &AppState,
    user: &User,
    new: NewCourse<'_>,
) -> Result<Course, ApiError> {
    let slug = slugs::slugify(new.title);
    if slug.is_empty() {
        return Err(ApiError::field("title", "title must contain letters or digits"));
    }

    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            creator_id: &user.id,
            title: new.title,
            slug: &slug,
            description: new.description,
            target_description: new.target_description,
            price: new.price,
            logo: new.logo,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e, repositories::courses::SLUG_UNIQUE) {
            ApiError::conflict(format!("Course with slug '{slug}' already exists"))
        } else {
            ApiError::internal(e, "Failed to create course")
        }
    })?;

    tracing::info!(
        course_id = %course.id,
        slug = %course.slug,
        creator_id = %user.id,
        is_free = course.is_free(),
        "Course created"
    );
    Ok(course)
}

pub(super) async fn my_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MyCourseEntry>>, ApiError> {
    let courses = repositories::courses::list_for_member(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    let (approved, pending): (Vec<Course>, Vec<Course>) =
        courses.into_iter().partition(|course| course.approval);

    let mut entries: Vec<MyCourseEntry> = course_responses(&state, approved, false)
        .await?
        .into_iter()
        .map(|response| MyCourseEntry::Approved(Box::new(response)))
        .collect();
    entries.extend(
        pending
            .into_iter()
            .map(|course| MyCourseEntry::Pending { title: course.title, message: NOT_APPROVED_MESSAGE }),
    );

    Ok(Json(entries))
}

pub(super) async fn my_creations(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_by_creator(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list created courses"))?;

    Ok(Json(course_responses(&state, courses, false).await?))
}

pub(super) async fn get_course(
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = load_course(&state, &slug).await?;
    require_reader(&state, &user, &course).await?;

    let mut responses = course_responses(&state, vec![course], true).await?;
    responses.pop().map(Json).ok_or_else(|| ApiError::not_found("Course not found"))
}

pub(super) async fn delete_course(
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let course = load_course(&state, &slug).await?;
    require_author(&user, &course)?;

    authoring::delete_course(state.db(), &course.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
