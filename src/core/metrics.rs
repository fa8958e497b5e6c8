use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::ContentKind;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_content_created(kind: ContentKind) {
    metrics::counter!("content_items_created_total", "kind" => kind.as_str()).increment(1);
}

pub(crate) fn record_content_deleted(kind: ContentKind) {
    metrics::counter!("content_items_deleted_total", "kind" => kind.as_str()).increment(1);
}

pub(crate) fn record_answer_graded(correct: bool) {
    let verdict = if correct { "correct" } else { "incorrect" };
    metrics::counter!("question_answers_total", "verdict" => verdict).increment(1);
}
