pub(crate) mod authoring;
pub(crate) mod content_registry;
pub(crate) mod errors;
pub(crate) mod grading;
pub(crate) mod ordering;
pub(crate) mod password_reset;
pub(crate) mod slugs;
pub(crate) mod storage;
pub(crate) mod submissions;

#[cfg(test)]
mod tests;
