use crate::document::ingestor::SkippedFile;
use crate::utils::{base_filename, has_extension, PipelineError, Result};
use std::io::{Cursor, Read};
use tracing::warn;

pub(crate) struct ArchiveMember {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Reads matching members into memory. A corrupt archive is an input error;
/// a corrupt member is only skipped.
pub(crate) fn read_members(
    bytes: Vec<u8>,
    extension: &str,
) -> Result<(Vec<ArchiveMember>, Vec<SkippedFile>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::InvalidInput(format!("corrupt archive: {}", e)))?;

    let mut members = Vec::new();
    let mut skipped = Vec::new();

    for index in 0..archive.len() {
        let mut file = match archive.by_index(index) {
            Ok(file) => file,
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable archive entry");
                skipped.push(SkippedFile {
                    filename: format!("entry #{}", index),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if file.is_dir() {
            continue;
        }

        let Some(path) = file.enclosed_name() else {
            warn!(name = %file.name(), "Skipping archive entry with unsafe path");
            skipped.push(SkippedFile {
                filename: file.name().to_string(),
                reason: "unsafe path in archive".to_string(),
            });
            continue;
        };
        let filename = base_filename(&path.to_string_lossy());

        if !has_extension(&filename, extension) {
            continue;
        }

        let mut data = Vec::new();
        if let Err(e) = file.read_to_end(&mut data) {
            warn!(filename = %filename, error = %e, "Skipping corrupt archive member");
            skipped.push(SkippedFile {
                filename,
                reason: e.to_string(),
            });
            continue;
        }

        members.push(ArchiveMember { filename, data });
    }

    Ok((members, skipped))
}
