use crate::document::collection::DocumentKind;
use crate::utils::{has_extension, PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";

/// What the caller asked to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// `.pdf` or a `.zip` of PDFs.
    Document,
    /// `.txt` or a `.zip` of text files.
    Text,
    Audio,
    /// `.zip` of `.flac` clips, each translated on its own.
    AudioArchive,
    Video,
}

impl UploadKind {
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Document => &["pdf", "zip"],
            UploadKind::Text => &["txt", "zip"],
            UploadKind::Audio => &["flac"],
            UploadKind::AudioArchive => &["zip"],
            UploadKind::Video => &["mp4"],
        }
    }

    /// Kind of member document expected inside an archive of this upload.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        match self {
            UploadKind::Document => Some(DocumentKind::Pdf),
            UploadKind::Text => Some(DocumentKind::Txt),
            UploadKind::Audio | UploadKind::AudioArchive | UploadKind::Video => None,
        }
    }

    /// Accepts only a bare file name with one of the accepted extensions.
    pub fn validate_filename(&self, filename: &str) -> Result<()> {
        if Path::new(filename).file_name().and_then(|name| name.to_str()) != Some(filename) {
            return Err(PipelineError::InvalidInput(format!(
                "{}: upload name must be a plain file name",
                filename
            )));
        }
        if self
            .accepted_extensions()
            .iter()
            .any(|ext| has_extension(filename, ext))
        {
            Ok(())
        } else {
            Err(PipelineError::InvalidInput(format!(
                "{}: only {} files are supported",
                filename,
                self.accepted_extensions()
                    .iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}

pub fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_LOCAL_HEADER) || bytes.starts_with(ZIP_EMPTY_ARCHIVE)
}

/// Archive check by content: the magic must match and the central
/// directory must parse.
pub fn is_zip_archive(bytes: &[u8]) -> bool {
    looks_like_zip(bytes) && zip::ZipArchive::new(Cursor::new(bytes)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn tiny_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("a.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extension_rules() {
        assert!(UploadKind::Document.validate_filename("scan.pdf").is_ok());
        assert!(UploadKind::Document.validate_filename("batch.ZIP").is_ok());
        assert!(UploadKind::Document.validate_filename("notes.txt").is_err());
        assert!(UploadKind::Text.validate_filename("notes.txt").is_ok());
        assert!(UploadKind::Text.validate_filename("scan.pdf").is_err());
        assert!(UploadKind::Audio.validate_filename("clip.flac").is_ok());
        assert!(UploadKind::Audio.validate_filename("clip.mp3").is_err());
        assert!(UploadKind::Video.validate_filename("talk.mp4").is_ok());
        assert!(UploadKind::AudioArchive.validate_filename("clips.zip").is_ok());
        assert!(UploadKind::AudioArchive.validate_filename("clip.flac").is_err());
    }

    #[test]
    fn test_names_with_directories_rejected() {
        assert!(UploadKind::Text.validate_filename("/tmp/notes.txt").is_err());
        assert!(UploadKind::Text.validate_filename("../notes.txt").is_err());
        assert!(UploadKind::Text.validate_filename("sub/notes.txt").is_err());
        assert!(UploadKind::Text.validate_filename("..").is_err());
        assert!(UploadKind::Text.validate_filename("notes.txt").is_ok());
    }

    #[test]
    fn test_sniffs_archive_by_content() {
        assert!(is_zip_archive(&tiny_zip()));
        assert!(!is_zip_archive(b"plain text that is not an archive"));
        // Right magic, truncated body.
        assert!(!is_zip_archive(b"PK\x03\x04garbage"));
    }
}
