use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use docs_template_config::{Config, ConfigError, LoadOptions};
use docs_template_core::{ExitCode, MigrateError, MigrationRequest, Migrator};
use docs_template_remote::{GeminiConfig, GeminiRewriter, HttpTemplateSource};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const CRATE_TARGETS: [&str; 3] = [
    "docs_template_cli",
    "docs_template_core",
    "docs_template_remote",
];

#[derive(Parser, Debug)]
#[command(
    name = "docs-template-update",
    author,
    version,
    about = "Restructure a package README onto the documentation template",
    long_about = None
)]
pub struct Cli {
    /// Google API key for the rewrite service
    #[arg(long = "api-key", env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Package directory to migrate
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    /// Log each step and the models available to the key
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the patch without writing the rewritten document
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Keep the previous document as a .bak file
    #[arg(long)]
    pub backup: bool,

    /// Configuration file layered over the package configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rewrite model, overriding the configured one
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the verbose flag.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = String::from("warn");
        for target in CRATE_TARGETS {
            directives.push_str(&format!(",{target}={level}"));
        }
        EnvFilter::new(directives)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Trimmed, non-empty API key or an error naming both ways to supply one.
pub fn resolve_api_key(flag: Option<&str>) -> Result<String> {
    match flag.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_owned()),
        _ => Err(anyhow!(
            "API key is required: pass --api-key or set GOOGLE_API_KEY"
        )),
    }
}

/// Runs one migration and prints the patch. Returns the desired exit code.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let api_key = resolve_api_key(cli.api_key.as_deref())?;

    let mut options = LoadOptions::default().with_package_dir(&cli.path);
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    let mut config = Config::load(options)?;
    if let Some(model) = cli.model {
        config.rewrite.model = model;
    }
    for layer in &config.sources.layers {
        debug!(source = %layer, "configuration layer");
    }

    let template = HttpTemplateSource::from_settings(&config.template)
        .context("failed to build template client")?;
    let rewriter = GeminiRewriter::new(GeminiConfig::from_settings(api_key, &config.rewrite))
        .context("failed to build rewrite client")?;

    if cli.verbose {
        log_available_models(&rewriter).await;
    }

    let mut request = MigrationRequest::from_config(&config.sources.package_directory, &config);
    request.options.dry_run = cli.dry_run;
    request.options.backup = cli.backup;

    let outcome = Migrator::new(template, rewriter).run(&request).await?;

    if outcome.patch.is_empty() {
        info!(path = %outcome.target.display(), "document already matches the template");
    } else {
        emit(&outcome.patch);
    }
    Ok(outcome.exit_code)
}

/// Exit code for a failed run, picked from the innermost typed error.
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(err) = err.downcast_ref::<MigrateError>() {
        return err.exit_code();
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return ExitCode::Config;
    }
    for cause in err.chain() {
        if cause.downcast_ref::<docs_template_core::FetchError>().is_some() {
            return ExitCode::Fetch;
        }
        if cause
            .downcast_ref::<docs_template_core::GenerationError>()
            .is_some()
        {
            return ExitCode::Generation;
        }
    }
    ExitCode::InvalidArguments
}

async fn log_available_models(rewriter: &GeminiRewriter) {
    match rewriter.list_models().await {
        Ok(models) => {
            info!(count = models.len(), "available models");
            for model in models {
                info!(%model, "model");
            }
        }
        Err(err) => warn!(error = %err, "could not list models"),
    }
}

fn emit(content: &str) {
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
}
