use std::sync::Arc;

use crate::config::Config;
use crate::translate::{DeepLClient, DocumentTranslator, KeyValidator, TranslationOrchestrator};

/// Shared, read-only state. Nothing here changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Arc<dyn DocumentTranslator>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = DeepLClient::new(&config.deepl_config)?;
        Ok(Self::with_translator(config, Arc::new(client)))
    }

    pub fn with_translator(config: Config, translator: Arc<dyn DocumentTranslator>) -> Self {
        Self {
            config: Arc::new(config),
            translator,
        }
    }

    pub fn key_validator(&self) -> KeyValidator {
        KeyValidator::new(self.translator.clone())
    }

    /// A fresh orchestrator for one request.
    pub fn orchestrator(&self) -> TranslationOrchestrator {
        TranslationOrchestrator::from_config(self.translator.clone(), &self.config.deepl_config)
    }
}
