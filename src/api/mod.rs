pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod moderation;
pub(crate) mod reviews;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
