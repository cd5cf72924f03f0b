use crate::document::collection::DocumentKind;
use crate::utils::{PipelineError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Turns a binary document into its raw text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, kind: DocumentKind, filename: &str, bytes: &[u8]) -> Result<String>;
}

/// PDF text through `pdf-extract`, plain text as strict UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

impl TextExtractor for DefaultExtractor {
    fn extract(&self, kind: DocumentKind, filename: &str, bytes: &[u8]) -> Result<String> {
        match kind {
            DocumentKind::Txt => String::from_utf8(bytes.to_vec()).map_err(|e| {
                PipelineError::ExtractionFailed {
                    filename: filename.to_string(),
                    reason: format!("not valid UTF-8: {}", e),
                }
            }),
            DocumentKind::Pdf => extract_pdf(filename, bytes),
        }
    }
}

fn extract_pdf(filename: &str, bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let outcome = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(PipelineError::ExtractionFailed {
            filename: filename.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(PipelineError::ExtractionFailed {
            filename: filename.to_string(),
            reason: "PDF parser aborted on malformed input".to_string(),
        }),
    }
}
