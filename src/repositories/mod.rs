pub(crate) mod comments;
pub(crate) mod contents;
pub(crate) mod courses;
pub(crate) mod items;
pub(crate) mod lessons;
pub(crate) mod modules;
pub(crate) mod password_resets;
pub(crate) mod ratings;
pub(crate) mod task_submissions;
pub(crate) mod users;
