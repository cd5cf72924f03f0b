pub mod orchestrator;
pub mod session;

pub use orchestrator::{BatchOrchestrator, BatchReport, FailedDocument};
pub use session::TranslationSession;
