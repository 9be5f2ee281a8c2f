//! Scripted in-memory translator for tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::interface::{
    ApiKey, DocumentHandle, DocumentTranslator, JobState, JobStatus, SourceDocument, Usage,
};
use crate::error::AppError;

/// Hand-rolled [`DocumentTranslator`] with a scripted poll sequence.
///
/// - `submit` succeeds with a fixed handle unless an upload error is set.
/// - `query` pops the next scripted state, repeating the last one.
/// - `fetch` returns the configured bytes unless a download error is set.
/// - Every operation is counted.
pub struct MockTranslator {
    usage: Option<Usage>,
    upload_error: Option<String>,
    download_error: Option<String>,
    /// Reversed so the next state is `pop()`.
    states: Mutex<Vec<JobState>>,
    last_state: JobState,
    result: Bytes,
    /// `(filename, target_lang)` of every upload.
    submissions: Mutex<Vec<(String, String)>>,
    usage_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    query_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockTranslator {
    /// A translator whose jobs finish on the first poll.
    pub fn new() -> Self {
        Self::with_states(vec![JobState::new(JobStatus::Done)])
    }

    /// A translator that answers polls with `states` in order.
    pub fn with_states(mut states: Vec<JobState>) -> Self {
        assert!(!states.is_empty(), "sequence must have at least one state");
        let last = states[states.len() - 1].clone();
        states.reverse();
        Self {
            usage: Some(Usage { used: 0, limit: 500_000 }),
            upload_error: None,
            download_error: None,
            states: Mutex::new(states),
            last_state: last,
            result: Bytes::from_static(b"translated document"),
            submissions: Mutex::new(Vec::new()),
            usage_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Answer every poll with the same status.
    pub fn stuck(status: JobStatus) -> Self {
        Self::with_states(vec![JobState::new(status)])
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Reject every key on `check_usage`.
    pub fn rejecting_keys(mut self) -> Self {
        self.usage = None;
        self
    }

    pub fn with_upload_error(mut self, message: impl Into<String>) -> Self {
        self.upload_error = Some(message.into());
        self
    }

    pub fn with_download_error(mut self, message: impl Into<String>) -> Self {
        self.download_error = Some(message.into());
        self
    }

    pub fn with_result(mut self, data: impl Into<Bytes>) -> Self {
        self.result = data.into();
        self
    }

    pub fn usage_calls(&self) -> usize {
        self.usage_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(String, String)> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.usage_calls() + self.submit_calls() + self.query_calls() + self.fetch_calls()
    }

    fn next_state(&self) -> JobState {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.pop().unwrap_or_else(|| self.last_state.clone())
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentTranslator for MockTranslator {
    async fn check_usage(&self, _api_key: &ApiKey) -> Result<Usage, AppError> {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        self.usage.ok_or(AppError::CredentialRejected)
    }

    async fn submit(
        &self,
        _api_key: &ApiKey,
        document: &SourceDocument,
        target_lang: &str,
    ) -> Result<DocumentHandle, AppError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((document.filename.clone(), target_lang.to_string()));
        if let Some(err) = &self.upload_error {
            return Err(AppError::UploadRejected(err.clone()));
        }
        Ok(DocumentHandle {
            document_id: "MOCK-DOC".to_string(),
            document_key: "MOCK-KEY".to_string(),
        })
    }

    async fn query(&self, _api_key: &ApiKey, _handle: &DocumentHandle) -> Result<JobState, AppError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_state())
    }

    async fn fetch(&self, _api_key: &ApiKey, _handle: &DocumentHandle) -> Result<Bytes, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.download_error {
            return Err(AppError::DownloadRejected(err.clone()));
        }
        Ok(self.result.clone())
    }
}
