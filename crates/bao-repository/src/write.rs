//! Replace-in-place file writes through a scoped temporary file.

use std::io::Write;
use std::path::Path;

use crate::error::{RepositoryError, Result};

/// Write `contents` to `path` by way of a temporary file in the same
/// directory, renamed into place once fully written.
///
/// Readers never observe a half-written file. If anything fails the
/// temporary file is removed when it goes out of scope.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source| RepositoryError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".bao-")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    // Temporary files are created owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    Ok(())
}
