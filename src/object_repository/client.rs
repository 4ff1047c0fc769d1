//! HTTP client for the remote media store.
//!
//! Talks to a Cloudinary-style upload/destroy API: uploads are multipart
//! POSTs that answer with the stored object's public id and retrieval
//! URL, deletions are destroy calls addressed by that public id.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::trait_def::{ObjectRepository, RepositoryError, StoredObject};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Client for the remote media store service.
#[derive(Clone)]
pub struct MediaStoreClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MediaStoreClient {
    /// # Arguments
    /// * `base_url` - Base URL of the media store (e.g., "https://media.example.com")
    /// * `api_key` - Optional bearer token for authenticated stores
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(base_url: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl ObjectRepository for MediaStoreClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        resource_type: &str,
        folder: &str,
    ) -> Result<StoredObject, RepositoryError> {
        let url = format!("{}/upload", self.base_url);
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name("upload"))
            .text("resource_type", resource_type.to_string())
            .text("folder", folder.to_string());

        let response = self.request(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        Ok(StoredObject {
            public_id: body.public_id,
            url: body.secure_url,
        })
    }

    async fn delete(&self, public_id: &str, resource_type: &str) -> Result<(), RepositoryError> {
        let url = format!("{}/destroy", self.base_url);
        let response = self
            .request(&url)
            .form(&[("public_id", public_id), ("resource_type", resource_type)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        // The provider reports "not found" and similar outcomes in the
        // body with a 200; anything but an explicit ok is a failure.
        let body: DestroyResponse = response.json().await?;
        if body.result != "ok" {
            return Err(RepositoryError::Provider {
                status: status.as_u16(),
                message: body.result,
            });
        }

        Ok(())
    }
}
