use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::interface::{ApiKey, DocumentHandle, DocumentTranslator, JobState, SourceDocument, Tier, Usage};
use crate::config::DeepLConfig;
use crate::error::AppError;
use crate::utils::filename::{content_type_for, split_extension};

#[derive(Debug, Deserialize)]
struct UsageResponse {
    character_count: u64,
    character_limit: u64,
}

/// DeepL document API over HTTP.
#[derive(Debug, Clone)]
pub struct DeepLClient {
    client: Client,
    free_api_url: String,
    pro_api_url: String,
}

impl DeepLClient {
    pub fn new(config: &DeepLConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        info!(
            "Initialized DeepL client: free={}, pro={}",
            config.free_api_url, config.pro_api_url
        );

        Ok(Self {
            client,
            free_api_url: config.free_api_url.trim_end_matches('/').to_string(),
            pro_api_url: config.pro_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Host for the key's tier.
    pub fn base_url(&self, api_key: &ApiKey) -> &str {
        match api_key.tier() {
            Tier::Free => &self.free_api_url,
            Tier::Pro => &self.pro_api_url,
        }
    }

    fn auth_header(api_key: &ApiKey) -> String {
        format!("DeepL-Auth-Key {}", api_key.expose())
    }

    /// Body of a failed response, or a placeholder if it cannot be read.
    async fn error_text(response: Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(text) if !text.trim().is_empty() => text,
            _ => status.to_string(),
        }
    }
}

#[async_trait]
impl DocumentTranslator for DeepLClient {
    async fn check_usage(&self, api_key: &ApiKey) -> Result<Usage, AppError> {
        let url = format!("{}/v2/usage", self.base_url(api_key));

        let response = self
            .client
            .get(&url)
            .header("Authorization", Self::auth_header(api_key))
            .send()
            .await
            .map_err(AppError::Connectivity)?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "DeepL rejected API key");
            return Err(AppError::CredentialRejected);
        }

        // an unreadable usage body counts as a failed round trip, not a bad key
        let usage: UsageResponse = response.json().await.map_err(AppError::Connectivity)?;

        Ok(Usage {
            used: usage.character_count,
            limit: usage.character_limit,
        })
    }

    async fn submit(
        &self,
        api_key: &ApiKey,
        document: &SourceDocument,
        target_lang: &str,
    ) -> Result<DocumentHandle, AppError> {
        let url = format!("{}/v2/document", self.base_url(api_key));
        let (_, extension) = split_extension(&document.filename);

        let part = multipart::Part::bytes(document.data.to_vec())
            .file_name(document.filename.clone())
            .mime_str(content_type_for(extension))
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("target_lang", target_lang.to_string());

        let response = self
            .client
            .post(&url)
            .header("Authorization", Self::auth_header(api_key))
            .multipart(form)
            .send()
            .await
            .map_err(AppError::Connectivity)?;

        if !response.status().is_success() {
            let status = response.status();
            let err = Self::error_text(response).await;
            warn!(status = %status, "Upload error: {}", err);
            return Err(AppError::UploadRejected(err));
        }

        let handle: DocumentHandle = response
            .json()
            .await
            .map_err(|e| AppError::UnexpectedResponse(e.to_string()))?;

        debug!(document_id = %handle.document_id, "Document uploaded");
        Ok(handle)
    }

    async fn query(&self, api_key: &ApiKey, handle: &DocumentHandle) -> Result<JobState, AppError> {
        let url = format!("{}/v2/document/{}", self.base_url(api_key), handle.document_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", Self::auth_header(api_key))
            .json(&json!({ "document_key": handle.document_key }))
            .send()
            .await
            .map_err(AppError::Connectivity)?;

        if !response.status().is_success() {
            let status = response.status();
            let err = Self::error_text(response).await;
            warn!(status = %status, "Status check error: {}", err);
            return Err(AppError::RemoteJobError(err));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UnexpectedResponse(e.to_string()))
    }

    async fn fetch(&self, api_key: &ApiKey, handle: &DocumentHandle) -> Result<Bytes, AppError> {
        let url = format!(
            "{}/v2/document/{}/result",
            self.base_url(api_key),
            handle.document_id
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", Self::auth_header(api_key))
            .json(&json!({ "document_key": handle.document_key }))
            .send()
            .await
            .map_err(AppError::Connectivity)?;

        if !response.status().is_success() {
            let status = response.status();
            let err = Self::error_text(response).await;
            warn!(status = %status, "Download error: {}", err);
            return Err(AppError::DownloadRejected(err));
        }

        debug!(
            content_type = ?response.headers().get(reqwest::header::CONTENT_TYPE),
            "DeepL result received"
        );

        response.bytes().await.map_err(AppError::Connectivity)
    }
}
