use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Suffix marking a DeepL API Free key.
pub const FREE_KEY_SUFFIX: &str = ":fx";

/// Account tier, derived from the key suffix. Only decides which host to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Pro,
}

/// A DeepL authentication key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn tier(&self) -> Tier {
        if self.0.ends_with(FREE_KEY_SUFFIX) {
            Tier::Free
        } else {
            Tier::Pro
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&"<redacted>").finish()
    }
}

/// A document as received from the caller.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub filename: String,
    pub data: Bytes,
}

/// Identifier/secret pair issued by DeepL for an uploaded document.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentHandle {
    pub document_id: String,
    pub document_key: String,
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("document_id", &self.document_id)
            .field("document_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Translating,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Whether a job may move from `self` to `next`.
    /// Terminal statuses are final; a translating job may be re-queued.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Done | JobStatus::Error, _) => false,
            (JobStatus::Queued | JobStatus::Translating, _) => true,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Translating => "translating",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Status reply for a document job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    /// Provider's explanation when `status` is `error`.
    #[serde(default, alias = "error_message")]
    pub message: Option<String>,
    #[serde(default)]
    pub seconds_remaining: Option<u64>,
    #[serde(default)]
    pub billed_characters: Option<u64>,
}

impl JobState {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            message: None,
            seconds_remaining: None,
            billed_characters: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(JobStatus::Error)
        }
    }
}

/// Character usage for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub used: u64,
    pub limit: u64,
}

/// The remote operations a document translation run needs.
///
/// Implemented over HTTP by [`super::deepl_client::DeepLClient`] and by
/// the scripted `MockTranslator` in unit tests.
#[async_trait]
pub trait DocumentTranslator: Send + Sync {
    /// Check the key and report its character usage.
    async fn check_usage(&self, api_key: &ApiKey) -> Result<Usage, AppError>;

    /// Upload a document for translation into `target_lang`.
    async fn submit(
        &self,
        api_key: &ApiKey,
        document: &SourceDocument,
        target_lang: &str,
    ) -> Result<DocumentHandle, AppError>;

    /// Ask for the current status of an uploaded document.
    async fn query(&self, api_key: &ApiKey, handle: &DocumentHandle) -> Result<JobState, AppError>;

    /// Download the translated document. Only valid once the job is `done`.
    async fn fetch(&self, api_key: &ApiKey, handle: &DocumentHandle) -> Result<Bytes, AppError>;
}
