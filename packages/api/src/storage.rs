//! Object store over the hosted storage service (`/storage/v1/object`).

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use store::{Error, ObjectStore, Result};

use crate::client::{send, HostedBackend};

/// Characters kept verbatim in object keys; `/` separates folders.
const KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

fn object_path(bucket: &str, key: &str) -> String {
    format!(
        "{}/{}",
        utf8_percent_encode(bucket, KEY),
        utf8_percent_encode(key, KEY)
    )
}

impl ObjectStore for HostedBackend {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        tracing::debug!(bucket, key, size = bytes.len(), "upload");
        let url = self
            .config
            .endpoint(&format!("/storage/v1/object/{}", object_path(bucket, key)));
        let request = self
            .authorize(self.http.post(url))
            .await?
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        send(request, Error::Upload).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.config.endpoint(&format!(
            "/storage/v1/object/public/{}",
            object_path(bucket, key)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    #[test]
    fn test_public_url_encodes_key() {
        let backend = HostedBackend::new(BackendConfig::new("https://demo.supabase.co", "anon"));
        assert_eq!(
            backend.public_url("task-images", "my photo.png-1714557600000"),
            "https://demo.supabase.co/storage/v1/object/public/task-images/my%20photo.png-1714557600000"
        );
    }

    #[test]
    fn test_object_path_keeps_folders() {
        assert_eq!(object_path("task-images", "u1/cat.jpg-1"), "task-images/u1/cat.jpg-1");
    }
}
