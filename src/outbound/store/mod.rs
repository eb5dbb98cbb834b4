//! JSON-file persistence adapters.
//!
//! Both stores follow the same discipline: reads never fail (absence and
//! corruption degrade to safe defaults with a warning), writes re-validate
//! and replace the target file atomically via a sibling temp file and
//! rename. Read-modify-write sequences are last-write-wins; the service
//! targets a small internal user base.

mod catalogue;
mod preferences;

pub use catalogue::JsonCatalogueStore;
pub use preferences::JsonPreferenceStore;

use std::path::Path;

use crate::domain::ports::StoreError;

/// Write `bytes` to `path` by way of a sibling temp file and an atomic
/// rename, so readers never observe a torn document.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_error = |source: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = match parent {
        Some(dir) => dir.join(format!(".{}.tmp", file_stem(path))),
        None => std::path::PathBuf::from(format!(".{}.tmp", file_stem(path))),
    };
    std::fs::write(&tmp, bytes).map_err(io_error)?;
    std::fs::rename(&tmp, path).map_err(io_error)
}

fn file_stem(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned())
}
