use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

mod contents;
mod handlers;
mod helpers;
mod structure;

pub(crate) use helpers::course_responses;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/paid", post(handlers::create_paid_course))
        .route("/free", post(handlers::create_free_course))
        .route("/mine", get(handlers::my_courses))
        .route("/creations", get(handlers::my_creations))
        .route("/:slug", get(handlers::get_course).delete(handlers::delete_course))
        .route("/:slug/modules", get(structure::list_modules).post(structure::create_module))
        .route("/:slug/modules/:module_id", axum::routing::delete(structure::delete_module))
        .route(
            "/:slug/modules/:module_id/lessons",
            get(structure::list_lessons).post(structure::create_lesson),
        )
        .route(
            "/:slug/modules/:module_id/lessons/:lesson_id",
            axum::routing::delete(structure::delete_lesson),
        )
        .route(
            "/:slug/modules/:module_id/lessons/:lesson_id/contents",
            get(contents::list_contents).post(contents::create_content),
        )
        .route(
            "/:slug/modules/:module_id/lessons/:lesson_id/contents/:content_id",
            get(contents::get_content).delete(contents::delete_content),
        )
        .route(
            "/:slug/modules/:module_id/lessons/:lesson_id/contents/:content_id/answer",
            post(contents::answer_question),
        )
        .route(
            "/:slug/modules/:module_id/lessons/:lesson_id/contents/:content_id/submission",
            post(contents::submit_task),
        )
        .route(
            "/:slug/modules/:module_id/lessons/:lesson_id/contents/:content_id/comments",
            get(contents::list_comments).post(contents::create_comment),
        )
}

#[cfg(test)]
mod tests;
