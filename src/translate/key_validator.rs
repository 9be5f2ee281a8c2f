use std::sync::Arc;
use tracing::info;

use super::interface::{ApiKey, DocumentTranslator, Usage};
use crate::error::AppError;

/// Confirms an API key with DeepL and reports its character quota.
pub struct KeyValidator {
    translator: Arc<dyn DocumentTranslator>,
}

impl KeyValidator {
    pub fn new(translator: Arc<dyn DocumentTranslator>) -> Self {
        Self { translator }
    }

    /// One usage request, no retry. A blank key fails before any call.
    pub async fn validate(&self, api_key: Option<ApiKey>) -> Result<Usage, AppError> {
        let api_key = api_key.ok_or(AppError::MissingInput)?;
        let usage = self.translator.check_usage(&api_key).await?;

        info!(
            tier = ?api_key.tier(),
            used = usage.used,
            limit = usage.limit,
            "API key accepted"
        );
        Ok(usage)
    }
}
