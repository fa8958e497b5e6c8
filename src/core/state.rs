use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::password_reset::{LoggingResetCodeSender, ResetCodeSender};
use crate::services::storage::StorageService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
    reset_sender: Arc<dyn ResetCodeSender>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
    ) -> Self {
        Self::with_reset_sender(settings, db, redis, storage, Arc::new(LoggingResetCodeSender))
    }

    pub(crate) fn with_reset_sender(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
        reset_sender: Arc<dyn ResetCodeSender>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, storage, reset_sender }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.inner.storage.as_ref()
    }

    pub(crate) fn reset_sender(&self) -> &dyn ResetCodeSender {
        self.inner.reset_sender.as_ref()
    }
}
