//! External asset store client. Blobs live outside the relational store;
//! the only contract is upload/delete plus a duration probe for
//! platform-hosted videos. Orphaned blobs from failed cleanups are
//! accepted debt, delete failures never escalate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::model::entity::VideoSource;

pub type AssetResult<T> = std::result::Result<T, AssetError>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("asset store returned status {status}")]
    BadStatus { status: u16 },
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
    Attachment,
}

impl AssetKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Attachment => "attachment",
        }
    }
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, kind: AssetKind) -> AssetResult<UploadedAsset>;
    async fn delete(&self, public_id: &str) -> AssetResult<()>;
    async fn lookup_duration(
        &self,
        source: VideoSource,
        video_id: &str,
    ) -> AssetResult<Option<i32>>;
}

pub struct HttpAssetStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpAssetStore {
    pub fn from_config(assets: &config::Assets) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: assets.base_url().trim_end_matches('/').to_string(),
            api_key: assets.api_key().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DurationResponse {
    duration_seconds: Option<i32>,
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, bytes: Vec<u8>, kind: AssetKind) -> AssetResult<UploadedAsset> {
        let response = self
            .client
            .post(format!("{}/upload/{}", self.base_url, kind.as_str()))
            .bearer_auth(&self.api_key)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssetError::BadStatus {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    async fn delete(&self, public_id: &str) -> AssetResult<()> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, public_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssetError::BadStatus {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    async fn lookup_duration(
        &self,
        source: VideoSource,
        video_id: &str,
    ) -> AssetResult<Option<i32>> {
        let response = self
            .client
            .get(format!(
                "{}/durations/{}/{}",
                self.base_url,
                source.as_db(),
                video_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssetError::BadStatus {
                status: response.status().as_u16(),
            });
        }

        let body: DurationResponse = response.json().await?;
        Ok(body.duration_seconds)
    }
}
