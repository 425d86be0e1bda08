//! HTTP implementation of the remote store operations.

use std::time::Instant;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::config::RemoteConfig;
use super::error::RemoteStoreError;
use super::types::{
    DownloadGrant, ObjectVersion, RemoteObject, RemoteSession, RemoteStore, UploadTarget,
    encode_object_key,
};

/// Largest listing page requested per version lookup. Keys carry at
/// most a handful of versions, so one page is always enough.
const LIST_PAGE_SIZE: u32 = 100;

struct CachedSession {
    session: RemoteSession,
    expires_at: Instant,
}

/// [`RemoteStore`] backed by the store's HTTP API.
///
/// Account sessions are cached for the configured TTL and refreshed
/// once when the store rejects a token, so long-lived workers survive
/// session expiry without surfacing errors.
pub struct HttpRemoteStore {
    http: reqwest::Client,
    config: RemoteConfig,
    session: RwLock<Option<CachedSession>>,
}

impl HttpRemoteStore {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteStoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RemoteStoreError::from)?;
        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
        })
    }

    async fn session(&self) -> Result<RemoteSession, RemoteStoreError> {
        {
            let cached = self.session.read().await;
            if let Some(cached) = cached.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.session.clone());
                }
            }
        }

        let mut slot = self.session.write().await;
        // another task may have refreshed while we waited on the lock
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.session.clone());
            }
        }

        let session = self.fetch_session().await?;
        *slot = Some(CachedSession {
            session: session.clone(),
            expires_at: Instant::now() + self.config.session_ttl,
        });
        Ok(session)
    }

    async fn fetch_session(&self) -> Result<RemoteSession, RemoteStoreError> {
        let url = format!("{}/b2api/v2/b2_authorize_account", self.config.api_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.application_key))
            .send()
            .await?;
        let body: AuthorizeResponse = Self::decode(response).await?;
        debug!(api_url = %body.api_url, "remote session opened");
        Ok(RemoteSession {
            account_token: body.authorization_token,
            api_url: body.api_url,
            download_url: body.download_url,
        })
    }

    async fn invalidate_session(&self) {
        *self.session.write().await = None;
    }

    async fn api_post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, RemoteStoreError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut refreshed = false;
        loop {
            let session = self.session().await?;
            let url = format!("{}/b2api/v2/{endpoint}", session.api_url);
            let response = self
                .http
                .post(&url)
                .header(AUTHORIZATION, &session.account_token)
                .json(body)
                .send()
                .await?;
            if response.status() == StatusCode::UNAUTHORIZED && !refreshed {
                warn!(endpoint, "remote session rejected, refreshing once");
                self.invalidate_session().await;
                refreshed = true;
                continue;
            }
            return Self::decode(response).await;
        }
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
        if matches!(
            body.code.as_deref(),
            Some("no_such_file" | "file_not_present")
        ) {
            return Err(RemoteStoreError::NotFound(
                body.message.unwrap_or_else(|| "file not present".to_string()),
            ));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteStoreError::SessionExpired);
        }
        Err(RemoteStoreError::Api {
            status: status.as_u16(),
            message: body.message.unwrap_or_else(|| status.to_string()),
        })
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn authorize(&self) -> Result<RemoteSession, RemoteStoreError> {
        self.session().await
    }

    async fn upload_target(&self, bucket_id: &str) -> Result<UploadTarget, RemoteStoreError> {
        let body: UploadUrlResponse = self
            .api_post("b2_get_upload_url", &json!({ "bucketId": bucket_id }))
            .await?;
        Ok(UploadTarget {
            upload_url: body.upload_url,
            auth_token: body.authorization_token,
        })
    }

    async fn upload(
        &self,
        target: &UploadTarget,
        object_key: &str,
        content_type: &str,
        payload: Bytes,
    ) -> Result<RemoteObject, RemoteStoreError> {
        let response = self
            .http
            .post(&target.upload_url)
            .header(AUTHORIZATION, &target.auth_token)
            .header("X-Bz-File-Name", encode_object_key(object_key))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, payload.len())
            .header("X-Bz-Content-Sha1", "do_not_verify")
            .body(payload)
            .send()
            .await?;
        let body: StoredFileResponse = Self::decode(response).await?;
        Ok(RemoteObject {
            object_id: body.file_id,
            object_key: body.file_name,
        })
    }

    async fn list_versions(
        &self,
        bucket_id: &str,
        object_key: &str,
    ) -> Result<Vec<ObjectVersion>, RemoteStoreError> {
        let body: ListVersionsResponse = self
            .api_post(
                "b2_list_file_versions",
                &json!({
                    "bucketId": bucket_id,
                    "startFileName": object_key,
                    "prefix": object_key,
                    "maxFileCount": LIST_PAGE_SIZE,
                }),
            )
            .await?;
        Ok(body
            .files
            .into_iter()
            .filter(|file| file.file_name == object_key)
            .map(|file| ObjectVersion {
                object_id: file.file_id,
                object_key: file.file_name,
            })
            .collect())
    }

    async fn delete_version(
        &self,
        object_key: &str,
        object_id: &str,
    ) -> Result<(), RemoteStoreError> {
        let _: serde_json::Value = self
            .api_post(
                "b2_delete_file_version",
                &json!({ "fileName": object_key, "fileId": object_id }),
            )
            .await?;
        Ok(())
    }

    async fn download_authorization(
        &self,
        bucket_id: &str,
        key_prefix: &str,
        ttl_secs: i64,
    ) -> Result<DownloadGrant, RemoteStoreError> {
        let body: DownloadAuthResponse = self
            .api_post(
                "b2_get_download_authorization",
                &json!({
                    "bucketId": bucket_id,
                    "fileNamePrefix": key_prefix,
                    "validDurationInSeconds": ttl_secs,
                }),
            )
            .await?;
        Ok(DownloadGrant {
            token: body.authorization_token,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeResponse {
    authorization_token: String,
    api_url: String,
    download_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: String,
    authorization_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFileResponse {
    file_id: String,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct ListVersionsResponse {
    files: Vec<StoredFileResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadAuthResponse {
    authorization_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
