use std::collections::BTreeMap;

use serde::Serialize;

pub(crate) mod auth;
pub(crate) mod content;
pub(crate) mod course;
pub(crate) mod lesson;
pub(crate) mod submission;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: &'static str,
    pub(crate) status: &'static str,
    pub(crate) components: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
    pub(crate) storage_enabled: bool,
}
