//! All-or-nothing file writes.
//!
//! A stage output is written to a temporary file next to its destination and
//! moved into place only after the writer closure succeeds, so the next stage
//! never observes a truncated file.

use crate::Result;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `path` through `write`, replacing it only if `write` succeeds.
pub fn write_atomic<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".fido-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    // Dropping `temp` on an early return above deletes it.
    temp.persist(path).map_err(|e| e.error)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
