use std::path::Path;

use similar::TextDiff;

use crate::error::{MigrateError, MigrateResult};

pub const CONTEXT_LINES: usize = 3;

/// Unified diff between `original` and `updated`, labelled `a/<name>` and
/// `b/<name>` after the file name of `path`. Empty when nothing changed.
pub fn build_unified_diff(path: &Path, original: &str, updated: &str) -> MigrateResult<String> {
    if original == updated {
        return Ok(String::new());
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let header_old = format!("a/{name}");
    let header_new = format!("b/{name}");

    let diff = TextDiff::from_lines(original, updated);
    let mut output = Vec::new();
    diff.unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&header_old, &header_new)
        .to_writer(&mut output)
        .map_err(|err| MigrateError::Diff(err.to_string()))?;

    String::from_utf8(output).map_err(|err| MigrateError::Diff(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_empty_for_identical_content() {
        let diff = build_unified_diff(Path::new("readme.md"), "abc\n", "abc\n").unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn labels_use_the_file_name_only() {
        let diff =
            build_unified_diff(Path::new("pkg/_dev/build/docs/readme.md"), "a\n", "b\n").unwrap();
        assert!(diff.starts_with("--- a/readme.md\n+++ b/readme.md\n"));
        assert!(diff.contains("-a\n"));
        assert!(diff.contains("+b\n"));
    }

    #[test]
    fn context_is_limited_to_three_lines() {
        let original = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let updated = "1\n2\n3\n4\nfive\n6\n7\n8\n9\n";
        let diff = build_unified_diff(Path::new("f.md"), original, updated).unwrap();
        assert!(diff.contains("@@ -2,7 +2,7 @@"));
        assert!(!diff.contains(" 1\n"));
        assert!(!diff.contains(" 9\n"));
    }

    #[test]
    fn marks_missing_trailing_newline() {
        let diff = build_unified_diff(Path::new("f.md"), "a\nb", "a\nc").unwrap();
        assert!(diff.contains("\\ No newline at end of file"));
    }
}
