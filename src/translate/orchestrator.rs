use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::interface::{ApiKey, DocumentHandle, DocumentTranslator, JobState, JobStatus, SourceDocument};
use crate::config::DeepLConfig;
use crate::error::AppError;
use crate::utils::filename::{content_type_for, split_extension, translated_filename};

/// Payload returned instead of a translation when running dry.
pub const DRY_RUN_CONTENT: &[u8] = b"Test document content";

/// How often, and for how long, a job's status is polled.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the first status check.
    pub interval: Duration,
    /// Growth of the delay after every non-terminal status. `1.0` is a fixed interval.
    pub backoff_factor: f64,
    pub max_interval: Duration,
    /// Total polling budget. `None` polls until the provider reports a terminal status.
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff_factor: 1.0,
            max_interval: interval,
            max_wait: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Saturates at `max_interval` instead of overflowing.
    pub fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
            .max(self.interval)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        DeepLConfig::default().poll_policy()
    }
}

/// A remote job between upload and download.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub handle: DocumentHandle,
    pub target_lang: String,
    pub status: JobStatus,
}

impl UploadJob {
    pub fn new(handle: DocumentHandle, target_lang: impl Into<String>) -> Self {
        Self {
            handle,
            target_lang: target_lang.into(),
            status: JobStatus::Queued,
        }
    }

    /// Record a status reply.
    pub fn apply(&mut self, state: &JobState) -> Result<(), AppError> {
        if !self.status.can_transition_to(state.status) {
            return Err(AppError::UnexpectedResponse(format!(
                "job {} reported {} after {}",
                self.handle.document_id, state.status, self.status
            )));
        }
        self.status = state.status;
        Ok(())
    }
}

/// A finished translation, ready to hand back to the caller.
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub data: Bytes,
}

impl TranslatedDocument {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Drives upload, poll and download for one document.
pub struct TranslationOrchestrator {
    translator: Arc<dyn DocumentTranslator>,
    target_lang: String,
    poll_policy: PollPolicy,
    dry_run: bool,
}

impl TranslationOrchestrator {
    pub fn new(translator: Arc<dyn DocumentTranslator>, target_lang: impl Into<String>) -> Self {
        Self {
            translator,
            target_lang: target_lang.into(),
            poll_policy: PollPolicy::default(),
            dry_run: false,
        }
    }

    pub fn from_config(translator: Arc<dyn DocumentTranslator>, config: &DeepLConfig) -> Self {
        Self::new(translator, config.target_lang.clone())
            .with_poll_policy(config.poll_policy())
            .with_dry_run(config.dry_run)
    }

    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Translate `file` with `api_key`.
    ///
    /// Fails with [`AppError::MissingInput`] before touching the network if
    /// either is absent.
    pub async fn translate(
        &self,
        file: Option<SourceDocument>,
        api_key: Option<ApiKey>,
    ) -> Result<TranslatedDocument, AppError> {
        let (document, api_key) = match (file, api_key) {
            (Some(document), Some(api_key)) => (document, api_key),
            _ => return Err(AppError::MissingInput),
        };

        let span = info_span!("translate", job_id = %Uuid::new_v4(), tier = ?api_key.tier());
        self.run(document, api_key).instrument(span).await
    }

    async fn run(
        &self,
        document: SourceDocument,
        api_key: ApiKey,
    ) -> Result<TranslatedDocument, AppError> {
        let (_, extension) = split_extension(&document.filename);
        let content_type = content_type_for(extension);
        let filename = translated_filename(&document.filename);

        info!(
            filename = %filename,
            bytes = document.data.len(),
            target_lang = %self.target_lang,
            "Starting document translation"
        );

        if self.dry_run {
            info!("Dry run, skipping DeepL");
            return Ok(TranslatedDocument {
                filename,
                content_type,
                data: Bytes::from_static(DRY_RUN_CONTENT),
            });
        }

        let handle = self
            .translator
            .submit(&api_key, &document, &self.target_lang)
            .await?;
        let mut job = UploadJob::new(handle, self.target_lang.clone());

        self.wait_for_completion(&api_key, &mut job).await?;

        let data = self.translator.fetch(&api_key, &job.handle).await?;
        info!(bytes = data.len(), "Translated document downloaded");

        Ok(TranslatedDocument {
            filename,
            content_type,
            data,
        })
    }

    async fn wait_for_completion(&self, api_key: &ApiKey, job: &mut UploadJob) -> Result<(), AppError> {
        let started = Instant::now();
        let mut delay = self.poll_policy.interval;
        let mut attempts: u32 = 0;

        loop {
            sleep(delay).await;
            attempts += 1;

            let state = self.translator.query(api_key, &job.handle).await?;
            debug!(
                attempt = attempts,
                status = %state.status,
                seconds_remaining = ?state.seconds_remaining,
                "Status check"
            );
            job.apply(&state)?;

            match state.status {
                JobStatus::Done => {
                    info!(
                        attempts,
                        billed_characters = ?state.billed_characters,
                        "Translation finished"
                    );
                    return Ok(());
                }
                JobStatus::Error => {
                    let message = state.message.unwrap_or_else(|| "unknown".to_string());
                    return Err(AppError::RemoteJobError(message));
                }
                JobStatus::Queued | JobStatus::Translating => {}
            }

            if let Some(max_wait) = self.poll_policy.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    warn!(attempts, waited_secs = waited.as_secs(), "Giving up on translation job");
                    return Err(AppError::Timeout { waited });
                }
            }

            delay = self.poll_policy.next_delay(delay);
        }
    }
}
