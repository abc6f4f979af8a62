use std::path::{Path, PathBuf};
use std::time::Duration;

use docs_template_config::{Config, LayoutSettings, DEFAULT_REWRITE_TIMEOUT_SECS};
use tracing::{debug, info};

use crate::collaborator::{DocumentRewriter, TemplateSource};
use crate::diff::build_unified_diff;
use crate::entity::{discover, EntityName};
use crate::error::{ExitCode, GenerationError, MigrateError, MigrateResult};
use crate::fs::{seed_document, write_atomic};
use crate::placeholder::rewrite_placeholders;

#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Compute the patch without writing the rewritten document.
    pub dry_run: bool,
    /// Keep the previous target content as `<target>.bak`.
    pub backup: bool,
    /// Wall-clock ceiling for the rewrite collaborator.
    pub rewrite_timeout: Duration,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup: false,
            rewrite_timeout: Duration::from_secs(DEFAULT_REWRITE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub package_dir: PathBuf,
    pub layout: LayoutSettings,
    pub options: MigrationOptions,
}

impl MigrationRequest {
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
            layout: LayoutSettings::default(),
            options: MigrationOptions::default(),
        }
    }

    /// Request for `package_dir` using the layout and timeout from `config`.
    pub fn from_config(package_dir: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            package_dir: package_dir.into(),
            layout: config.layout.clone(),
            options: MigrationOptions {
                rewrite_timeout: config.rewrite.timeout,
                ..MigrationOptions::default()
            },
        }
    }

    pub fn target_path(&self) -> PathBuf {
        self.package_dir.join(&self.layout.target)
    }

    pub fn source_path(&self) -> PathBuf {
        self.package_dir.join(&self.layout.source)
    }
}

#[derive(Debug)]
pub struct MigrationOutcome {
    pub exit_code: ExitCode,
    pub target: PathBuf,
    /// Target content before the migration.
    pub original: String,
    /// Rewritten document with placeholders bound.
    pub document: String,
    /// Unified diff from `original` to `document`; empty when unchanged.
    pub patch: String,
    pub entities: Vec<EntityName>,
    pub seeded: bool,
    pub persisted: bool,
}

impl MigrationOutcome {
    pub fn changed(&self) -> bool {
        self.original != self.document
    }
}

/// Runs a single migration against a package directory.
///
/// Steps execute in order and the first failure ends the run. Nothing done
/// before the failure is rolled back.
pub struct Migrator<T, R> {
    template: T,
    rewriter: R,
}

impl<T, R> Migrator<T, R>
where
    T: TemplateSource,
    R: DocumentRewriter,
{
    pub fn new(template: T, rewriter: R) -> Self {
        Self { template, rewriter }
    }

    pub async fn run(&self, request: &MigrationRequest) -> MigrateResult<MigrationOutcome> {
        let target = request.target_path();
        let seeded = seed_document(&target, &request.source_path())?;
        if seeded {
            info!(path = %target.display(), "seeded target document from source");
        }

        debug!("fetching template");
        let template = self.template.fetch().await?;

        let original = read_document(&target)?;

        info!("requesting rewrite");
        let rewritten = self
            .rewrite_with_deadline(&original, &template, request.options.rewrite_timeout)
            .await?;

        let entities = discover(&request.package_dir, &request.layout.entities_dir)?;
        let document = rewrite_placeholders(&rewritten, &entities);
        let patch = build_unified_diff(&target, &original, &document)?;

        let persisted = !request.options.dry_run;
        if persisted {
            write_atomic(&target, &document, request.options.backup)?;
            info!(path = %target.display(), "updated document written");
        } else {
            debug!("dry run, leaving target untouched");
        }

        Ok(MigrationOutcome {
            exit_code: ExitCode::Success,
            target,
            original,
            document,
            patch,
            entities,
            seeded,
            persisted,
        })
    }

    async fn rewrite_with_deadline(
        &self,
        original: &str,
        template: &str,
        deadline: Duration,
    ) -> MigrateResult<String> {
        match tokio::time::timeout(deadline, self.rewriter.rewrite(original, template)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GenerationError::Timeout(deadline).into()),
        }
    }
}

fn read_document(path: &Path) -> MigrateResult<String> {
    std::fs::read_to_string(path).map_err(|err| MigrateError::io(path, err))
}
