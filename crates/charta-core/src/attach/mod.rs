//! Attachment validation: extension whitelist and duplicate-filename
//! detection.
//!
//! Duplicate detection compares the trimmed filename string exactly (case
//! sensitive) -- the backend keys persisted attachments by that label, so
//! the comparison must stay string-based. The extension whitelist check is
//! case insensitive.

use thiserror::Error;

use crate::model::Attachment;

/// Extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "pdf", "png", "docx", "xlsx", "xls", "doc"];

/// Errors raised while validating a candidate attachment batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("file {name:?} has an unsupported extension (allowed: jpg, jpeg, pdf, png, docx, xlsx, xls, doc)")]
    InvalidAttachment { name: String },

    #[error("file {name:?} is already attached to this visit")]
    DuplicateAttachment { name: String },
}

fn extension_allowed(file: &Attachment) -> bool {
    match file.extension() {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Validate a candidate batch against the filenames already attached to the
/// visit.
///
/// Every file must carry a whitelisted extension, and no trimmed filename
/// may repeat -- neither against `existing_names` nor within the batch
/// itself. The first violation aborts the whole batch.
pub fn validate_batch(
    new_files: &[Attachment],
    existing_names: &[String],
) -> Result<(), AttachmentError> {
    let existing: Vec<&str> = existing_names.iter().map(|n| n.trim()).collect();

    let mut accepted: Vec<&str> = Vec::new();
    for file in new_files {
        let name = file.file_name.trim();

        if !extension_allowed(file) {
            return Err(AttachmentError::InvalidAttachment {
                name: name.to_owned(),
            });
        }

        if existing.contains(&name) || accepted.contains(&name) {
            return Err(AttachmentError::DuplicateAttachment {
                name: name.to_owned(),
            });
        }

        accepted.push(name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttachmentOrigin;

    fn file(name: &str) -> Attachment {
        Attachment::new(name, AttachmentOrigin::New)
    }

    #[test]
    fn accepts_whitelisted_extensions() {
        let batch: Vec<Attachment> = ALLOWED_EXTENSIONS
            .iter()
            .map(|ext| file(&format!("report.{ext}")))
            .collect();
        assert!(validate_batch(&batch, &[]).is_ok());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_batch(&[file("xray.PDF")], &[]).is_ok());
        assert!(validate_batch(&[file("xray.Jpeg")], &[]).is_ok());
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = validate_batch(&[file("malware.exe")], &[]).unwrap_err();
        assert_eq!(
            err,
            AttachmentError::InvalidAttachment {
                name: "malware.exe".to_owned()
            }
        );
    }

    #[test]
    fn rejects_missing_extension() {
        assert!(matches!(
            validate_batch(&[file("noext")], &[]).unwrap_err(),
            AttachmentError::InvalidAttachment { .. }
        ));
    }

    #[test]
    fn rejects_duplicate_against_existing_trimmed() {
        let existing = vec!["xray.pdf".to_owned()];
        let err = validate_batch(&[file("  xray.pdf  ")], &existing).unwrap_err();
        assert_eq!(
            err,
            AttachmentError::DuplicateAttachment {
                name: "xray.pdf".to_owned()
            }
        );
    }

    #[test]
    fn rejects_duplicate_within_batch() {
        let batch = vec![file("a.png"), file("b.png"), file("a.png")];
        assert_eq!(
            validate_batch(&batch, &[]).unwrap_err(),
            AttachmentError::DuplicateAttachment {
                name: "a.png".to_owned()
            }
        );
    }

    #[test]
    fn name_comparison_is_case_sensitive() {
        // A different case means a different label, so no duplicate.
        let existing = vec!["xray.pdf".to_owned()];
        assert!(validate_batch(&[file("Xray.pdf")], &existing).is_ok());
        // An identical label is rejected even when its extension is not in
        // whitelist case.
        let upper = vec!["xray.PDF".to_owned()];
        assert!(validate_batch(&[file("xray.PDF")], &upper).is_err());
    }
}
