//! Shared test harness utilities for docs-template crates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use docs_template_core::{DocumentRewriter, FetchError, GenerationError, TemplateSource};
use tempfile::TempDir;

pub const SOURCE_README: &str = "docs/README.md";
pub const TARGET_README: &str = "_dev/build/docs/readme.md";
pub const ENTITIES_DIR: &str = "data_stream";

/// Temporary package directory laid out like an integration package.
pub struct PackageFixture {
    dir: TempDir,
}

impl PackageFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create package tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn with_file(self, relative: impl AsRef<Path>, contents: &str) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directories");
        }
        fs::write(&path, contents).expect("write fixture file");
        self
    }

    pub fn with_source_readme(self, contents: &str) -> Self {
        self.with_file(SOURCE_README, contents)
    }

    pub fn with_target_readme(self, contents: &str) -> Self {
        self.with_file(TARGET_README, contents)
    }

    pub fn with_data_streams(self, names: &[&str]) -> Self {
        for name in names {
            let dir = self.dir.path().join(ENTITIES_DIR).join(name);
            fs::create_dir_all(&dir).expect("create data stream directory");
        }
        self
    }

    pub fn target_path(&self) -> PathBuf {
        self.dir.path().join(TARGET_README)
    }

    pub fn read_target(&self) -> Option<String> {
        fs::read_to_string(self.target_path()).ok()
    }
}

impl Default for PackageFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Template source returning a fixed document.
pub struct StaticTemplate(pub String);

impl StaticTemplate {
    pub fn new(template: &str) -> Self {
        Self(template.to_owned())
    }
}

#[async_trait]
impl TemplateSource for StaticTemplate {
    async fn fetch(&self) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

/// Template source that always answers with an HTTP status failure.
pub struct FailingTemplate {
    pub status: u16,
}

#[async_trait]
impl TemplateSource for FailingTemplate {
    async fn fetch(&self) -> Result<String, FetchError> {
        Err(FetchError::Status {
            status: self.status,
        })
    }
}

/// Rewriter that answers with the template verbatim.
pub struct EchoTemplate;

#[async_trait]
impl DocumentRewriter for EchoTemplate {
    async fn rewrite(&self, _original: &str, template: &str) -> Result<String, GenerationError> {
        Ok(template.to_owned())
    }
}

/// Rewriter that answers with a fixed document and records its inputs.
pub struct FixedRewrite {
    output: String,
    calls: Mutex<Vec<(String, String)>>,
}

impl FixedRewrite {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_owned(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(original, template)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl DocumentRewriter for FixedRewrite {
    async fn rewrite(&self, original: &str, template: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((original.to_owned(), template.to_owned()));
        Ok(self.output.clone())
    }
}

/// Rewriter reporting that the service produced no candidates.
pub struct EmptyRewrite;

#[async_trait]
impl DocumentRewriter for EmptyRewrite {
    async fn rewrite(&self, _original: &str, _template: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Empty)
    }
}

/// Rewriter that sleeps before echoing the template.
pub struct SlowRewrite {
    pub delay: Duration,
}

#[async_trait]
impl DocumentRewriter for SlowRewrite {
    async fn rewrite(&self, _original: &str, template: &str) -> Result<String, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(template.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchSide {
    Original,
    Updated,
}

/// Reassemble one side of a single-hunk patch: context plus removed lines
/// for `Original`, context plus added lines for `Updated`.
pub fn patch_side(patch: &str, side: PatchSide) -> String {
    let lines: Vec<&str> = patch.split_inclusive('\n').collect();
    let mut output = String::new();
    let Some(first_hunk) = lines.iter().position(|line| line.starts_with("@@")) else {
        return output;
    };

    for (idx, line) in lines.iter().enumerate().skip(first_hunk + 1) {
        let keep = match (line.as_bytes().first(), side) {
            (Some(b' '), _) => true,
            (Some(b'-'), PatchSide::Original) => true,
            (Some(b'+'), PatchSide::Updated) => true,
            _ => false,
        };
        if keep {
            output.push_str(body_of(&lines, idx));
        }
    }
    output
}

/// Apply a unified diff to `original`, checking every context and removed
/// line against the source.
pub fn apply_patch(original: &str, patch: &str) -> Result<String, String> {
    if patch.is_empty() {
        return Ok(original.to_owned());
    }

    let source: Vec<&str> = original.split_inclusive('\n').collect();
    let lines: Vec<&str> = patch.split_inclusive('\n').collect();
    let mut idx = lines
        .iter()
        .position(|line| line.starts_with("@@"))
        .ok_or_else(|| "patch has no hunks".to_string())?;

    let mut output = String::with_capacity(original.len());
    let mut cursor = 0usize;

    while idx < lines.len() {
        let (start, len) = parse_old_range(lines[idx])?;
        let hunk_start = if len == 0 { start } else { start.saturating_sub(1) };
        if hunk_start < cursor || hunk_start > source.len() {
            return Err(format!("hunk starts at line {start} out of order"));
        }
        for line in &source[cursor..hunk_start] {
            output.push_str(line);
        }
        cursor = hunk_start;
        idx += 1;

        while idx < lines.len() && !lines[idx].starts_with("@@") {
            let body = body_of(&lines, idx);
            match lines[idx].as_bytes().first() {
                Some(b' ') | Some(b'-') => {
                    let expected = source
                        .get(cursor)
                        .ok_or_else(|| format!("patch runs past end of source at {body:?}"))?;
                    if *expected != body {
                        return Err(format!("expected {expected:?}, patch has {body:?}"));
                    }
                    if lines[idx].starts_with(' ') {
                        output.push_str(body);
                    }
                    cursor += 1;
                }
                Some(b'+') => output.push_str(body),
                Some(b'\\') => {}
                _ => return Err(format!("malformed patch line {:?}", lines[idx])),
            }
            idx += 1;
        }
    }

    for line in &source[cursor..] {
        output.push_str(line);
    }
    Ok(output)
}

/// Line content without its sign, dropping the newline when the next patch
/// line carries the "No newline at end of file" marker.
fn body_of<'a>(lines: &[&'a str], idx: usize) -> &'a str {
    let body = &lines[idx][1..];
    let no_newline = lines
        .get(idx + 1)
        .is_some_and(|next| next.starts_with('\\'));
    if no_newline {
        body.strip_suffix('\n').unwrap_or(body)
    } else {
        body
    }
}

fn parse_old_range(header: &str) -> Result<(usize, usize), String> {
    let range = header
        .strip_prefix("@@ -")
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or_else(|| format!("malformed hunk header {header:?}"))?;
    let (start, len) = match range.split_once(',') {
        Some((start, len)) => (start, len),
        None => (range, "1"),
    };
    let parse = |value: &str| {
        value
            .parse::<usize>()
            .map_err(|err| format!("bad hunk range {range:?}: {err}"))
    };
    Ok((parse(start)?, parse(len)?))
}
