pub mod client;
pub mod dispatcher;
pub mod languages;
pub mod protocol;
pub mod result;

pub use client::{AudioPayload, PipelineClient, SpeechBackend, Transcription, TranslationBackend};
pub use dispatcher::TranslationDispatcher;
pub use languages::{ensure_supported, is_supported, SUPPORTED_LANGUAGES};
pub use result::{TranslationResult, STATUS_OK};
