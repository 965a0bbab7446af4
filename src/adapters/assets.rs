use crate::domain::ports::AssetStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// PUTs the QR badge to the public asset host; the upload URL doubles as the
/// public URL referenced by the confirmation mail.
pub struct HttpAssetStore {
    client: Client,
    base_url: String,
}

impl HttpAssetStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, blob: &[u8], key: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        tracing::debug!("uploading {} bytes to {url}", blob.len());
        self.client
            .put(&url)
            .header(CONTENT_TYPE, "image/png")
            .body(blob.to_vec())
            .send()
            .await?
            .error_for_status()?;
        Ok(url)
    }
}
