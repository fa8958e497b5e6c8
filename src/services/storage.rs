use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::core::config::Settings;

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "trainee-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Some(Self { client, bucket: settings.s3().bucket.clone() }))
    }

    /// HEAD on the configured bucket; succeeds when it exists and the
    /// credentials can reach it.
    pub(crate) async fn check_bucket(&self) -> anyhow::Result<()> {
        self.client.head_bucket().bucket(&self.bucket).send().await?;
        Ok(())
    }

    pub(crate) async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    /// Stores `bytes` under `key`, returning the size and SHA-256 hex digest.
    pub(crate) async fn upload_bytes(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<(i64, String)> {
        let size = bytes.len() as i64;
        let hash_hex = hex::encode(Sha256::digest(&bytes));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        tracing::debug!(key, size, sha256 = %hash_hex, "Uploaded object");
        Ok((size, hash_hex))
    }
}

/// `submissions/<task>/<student>/<uuid>.<ext>`; the extension is lowercased
/// and dropped when the original name has none.
pub(crate) fn submission_key(task_id: &str, student_id: &str, filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let name = match extension {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };

    format!("submissions/{task_id}/{student_id}/{name}")
}

#[cfg(test)]
mod tests {
    use super::{submission_key, StorageService};
    use crate::core::config::Settings;
    use crate::test_support;
    use std::time::Duration;

    #[test]
    fn submission_key_is_scoped_and_keeps_extension() {
        let key = submission_key("task-1", "user-9", "Etude.MP3");
        assert!(key.starts_with("submissions/task-1/user-9/"));
        assert!(key.ends_with(".mp3"));

        let bare = submission_key("task-1", "user-9", "README");
        assert!(!bare.rsplit('/').next().unwrap_or_default().contains('.'));
    }

    #[tokio::test]
    async fn storage_disabled_without_credentials() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings).await.expect("storage");
        assert!(storage.is_none());
    }

    #[tokio::test]
    async fn presign_get_returns_url_for_key() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_storage_env();

        let settings = Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let url = storage
            .presign_get("submissions/t/u/file.pdf", Duration::from_secs(300))
            .await
            .expect("presign get");

        assert!(url.contains("file.pdf"));
        test_support::set_test_env();
    }
}
