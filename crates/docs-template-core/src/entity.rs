use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{MigrateError, MigrateResult};

/// Name of a package sub-unit (a data stream) that receives its own placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName(String);

impl EntityName {
    /// Returns `None` for names that cannot appear inside a placeholder:
    /// empty, or containing a double quote or control character.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(|ch| ch == '"' || ch.is_control()) {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// List the entity directories directly under `package_dir/entities_dir`.
///
/// A missing entities directory is normal (not every package has data
/// streams) and yields an empty list. Any other failure to stat the
/// directory, or a path that is not a directory, is an `Io` error. Plain files
/// and symlinks inside it are skipped.
/// Entries are listed by file name so repeated runs bind entities in the same
/// order on every platform.
pub fn discover(package_dir: &Path, entities_dir: &Path) -> MigrateResult<Vec<EntityName>> {
    let root = package_dir.join(entities_dir);

    match fs::metadata(&root) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(MigrateError::io(
                &root,
                io::Error::new(io::ErrorKind::Other, "entities path is not a directory"),
            ))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %root.display(), "no entities directory found");
            return Ok(Vec::new());
        }
        Err(err) => return Err(MigrateError::io(&root, err)),
    }

    let mut entities = Vec::new();
    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(&root).to_path_buf();
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory loop"));
            MigrateError::io(path, source)
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let Some(raw) = entry.file_name().to_str() else {
            warn!(
                name = %entry.file_name().to_string_lossy(),
                "skipping entity directory with non UTF-8 name"
            );
            continue;
        };
        match EntityName::new(raw) {
            Some(name) => entities.push(name),
            None => warn!(name = %raw, "skipping entity directory with unusable name"),
        }
    }

    debug!(
        entities = ?entities.iter().map(EntityName::as_str).collect::<Vec<_>>(),
        "discovered entities"
    );

    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_names() {
        assert!(EntityName::new("").is_none());
        assert!(EntityName::new("a\"b").is_none());
        assert!(EntityName::new("a\nb").is_none());
        assert_eq!(EntityName::new("logs").unwrap().to_string(), "logs");
    }
}
