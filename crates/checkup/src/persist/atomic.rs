use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::PersistError;

/// Replace `path` with `contents` so readers see either the old or the new
/// file, never a partial one.
pub fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistError> {
    let failed = |source| PersistError::Write { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(failed)?;
    file.write_all(contents).map_err(failed)?;
    file.as_file().sync_all().map_err(failed)?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(Permissions::from_mode(0o644)).map_err(failed)?;
    }

    file.persist(path).map_err(|e| failed(e.error))?;
    Ok(())
}
