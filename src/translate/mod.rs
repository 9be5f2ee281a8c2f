pub mod deepl_client;
pub mod interface;
pub mod key_validator;
#[cfg(test)]
pub mod mock;
pub mod orchestrator;

pub use deepl_client::DeepLClient;
pub use interface::{ApiKey, DocumentTranslator, JobStatus, SourceDocument, Tier, Usage};
pub use key_validator::KeyValidator;
pub use orchestrator::{PollPolicy, TranslatedDocument, TranslationOrchestrator};
