use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::Builder;
use tracing::debug;

use crate::error::{MigrateError, MigrateResult};

/// Atomically replace `path` with `content`. Readers never observe a partial
/// file: the content goes to a temporary file in the same directory which is
/// then renamed over the target. With `backup`, the previous content is kept
/// next to it with a `.bak` extension.
pub fn write_atomic(path: &Path, content: &str, backup: bool) -> MigrateResult<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = Builder::new()
        .prefix(".docs-template-update")
        .tempfile_in(parent)
        .map_err(|err| MigrateError::io(parent, err))?;

    let written = {
        let file = tmp.as_file_mut();
        file.write_all(content.as_bytes()).and_then(|()| file.sync_all())
    };
    written.map_err(|err| MigrateError::io(tmp.path(), err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    if backup && path.exists() {
        let backup_path = path.with_extension("bak");
        fs::copy(path, &backup_path).map_err(|err| MigrateError::io(&backup_path, err))?;
    }

    tmp.persist(path)
        .map(|_| ())
        .map_err(|err| MigrateError::io(path, err.error))
}

/// Make sure `target` exists, copying it from `source` when it does not.
///
/// Returns `true` when the target was seeded. The containing directory is
/// created before the source is checked and is not removed if the copy fails.
pub fn seed_document(target: &Path, source: &Path) -> MigrateResult<bool> {
    if target.exists() {
        return Ok(false);
    }

    if let Some(dir) = target.parent() {
        debug!(path = %dir.display(), "creating target directory");
        fs::create_dir_all(dir).map_err(|err| MigrateError::io(dir, err))?;
    }

    if !source.exists() {
        return Err(MigrateError::NotFound {
            path: source.to_path_buf(),
        });
    }

    debug!(from = %source.display(), to = %target.display(), "seeding target document");
    fs::copy(source, target).map_err(|err| MigrateError::io(target, err))?;
    Ok(true)
}
