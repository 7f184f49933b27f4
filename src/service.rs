//! Remote media service: the seam the orchestrator transfers files through,
//! plus the HTTP client for the HomeHub backend.

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;
use crate::error::{ServiceError, UploadError};

/// Identifier the backend assigns to a stored media item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub i64);

/// Identifier of a collection (album) media can be assigned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub i64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
enum FileContent {
    Path(PathBuf),
    Memory(Bytes),
}

/// A file handed to the uploader. Path-backed files are read at transfer time.
#[derive(Clone, Debug)]
pub struct UploadFile {
    name: String,
    content: FileContent,
}

impl UploadFile {
    /// Build a handle for a file on disk. The file must exist and be a regular file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                UploadError::NotFound(path.to_path_buf())
            } else {
                UploadError::Metadata {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        if !metadata.is_file() {
            return Err(UploadError::NotAFile(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Ok(Self {
            name,
            content: FileContent::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Memory(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .to_string()
    }

    pub async fn read(&self) -> Result<Bytes, ServiceError> {
        match &self.content {
            FileContent::Memory(bytes) => Ok(bytes.clone()),
            FileContent::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|source| ServiceError::Io {
                    name: self.name.clone(),
                    source,
                }),
        }
    }
}

/// Operations the orchestrator needs from the media library backend.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Transfer one file and return the ids of the media created from it.
    async fn upload(&self, file: &UploadFile) -> Result<Vec<MediaId>, ServiceError>;

    /// Move the given media into a collection.
    async fn assign_collection(
        &self,
        ids: &[MediaId],
        collection: CollectionId,
    ) -> Result<(), ServiceError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    ids: Vec<MediaId>,
}

/// `MediaService` backed by the HomeHub HTTP API.
#[derive(Clone)]
pub struct HttpMediaService {
    client: Client,
    server_url: String,
}

impl HttpMediaService {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ServiceError::from)?;

        Ok(Self {
            client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());
        Err(ServiceError::Status { status, body })
    }
}

#[async_trait]
impl MediaService for HttpMediaService {
    async fn upload(&self, file: &UploadFile) -> Result<Vec<MediaId>, ServiceError> {
        let content = file.read().await?;
        let file_size = content.len();
        let content_type = file.content_type();
        debug!(
            "Detected content type '{}' for file: {} ({} bytes)",
            content_type,
            file.name(),
            file_size
        );

        let part = Part::bytes(content.to_vec())
            .file_name(file.name().to_string())
            .mime_str(&content_type)?;
        let form = Form::new().part("files", part);

        let url = format!("{}/api/media/upload", self.server_url);
        debug!("Uploading {} to {}", file.name(), url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload file '{}' to '{}': {}", file.name(), url, e);
                ServiceError::Request(e)
            })?;
        let response = Self::check_status(response).await?;

        let text = response.text().await?;
        let parsed: UploadResponse = serde_json::from_str(&text)?;

        info!(
            "Successfully uploaded file: {} ({} bytes, {} media ids)",
            file.name(),
            file_size,
            parsed.ids.len()
        );
        Ok(parsed.ids)
    }

    async fn assign_collection(
        &self,
        ids: &[MediaId],
        collection: CollectionId,
    ) -> Result<(), ServiceError> {
        let url = format!("{}/api/media/bulk/album/{}", self.server_url, collection);
        debug!("Assigning {} media to collection {}", ids.len(), collection);

        let response = self.client.put(&url).json(ids).send().await?;
        Self::check_status(response).await?;

        info!("Assigned {} media to collection {}", ids.len(), collection);
        Ok(())
    }
}
