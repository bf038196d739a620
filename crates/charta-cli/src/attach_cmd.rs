//! Handler for `charta attach check`: offline attachment-batch validation.

use anyhow::Result;

use charta_core::attach;
use charta_core::model::{Attachment, AttachmentOrigin};

/// Validate a candidate attachment batch against a list of already
/// persisted filenames.
pub fn run_attach_check(files: &[String], existing: &[String]) -> Result<()> {
    let candidates: Vec<Attachment> = files
        .iter()
        .map(|name| Attachment::new(name.clone(), AttachmentOrigin::New))
        .collect();

    attach::validate_batch(&candidates, existing)?;

    println!("Attachment batch OK ({} file(s)).", candidates.len());
    Ok(())
}
