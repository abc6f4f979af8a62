//! Configuration primitives and loader for docs-template-update.
//!
//! Settings resolve from three layers, lowest precedence first:
//! built-in defaults → `.docs-template-update.toml` in the package directory →
//! an explicit override file. Each layer only replaces the keys it sets.
//! Credentials and the verbose flag are never read from files; the CLI passes
//! them through explicit structs instead.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".docs-template-update.toml";

pub const DEFAULT_TEMPLATE_URL: &str = "https://raw.githubusercontent.com/elastic/elastic-package/89b34ec09f562b2c1c921ba4b465b6ef96ea47de/internal/packages/archetype/_static/package-docs-readme.md.tmpl";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_REWRITE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_TARGET: &str = "_dev/build/docs/readme.md";
pub const DEFAULT_SOURCE: &str = "docs/README.md";
pub const DEFAULT_ENTITIES_DIR: &str = "data_stream";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub template: TemplateSettings,
    pub rewrite: RewriteSettings,
    pub layout: LayoutSettings,
    pub sources: ConfigSources,
}

/// Where the canonical template is fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateSettings {
    pub url: String,
    /// Transport deadline for the fetch. `None` leaves the request unbounded.
    pub timeout: Option<Duration>,
}

/// Settings for the generative rewrite service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteSettings {
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

/// Package-relative locations of the documents and entity listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutSettings {
    pub target: PathBuf,
    pub source: PathBuf,
    pub entities_dir: PathBuf,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            target: PathBuf::from(DEFAULT_TARGET),
            source: PathBuf::from(DEFAULT_SOURCE),
            entities_dir: PathBuf::from(DEFAULT_ENTITIES_DIR),
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub package_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/package/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn default() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => f.write_str("built-in defaults"),
            (kind, Some(path)) => write!(f, "{} at {}", kind, path.display()),
            (kind, None) => write!(f, "{kind}"),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Package,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::Package => "package config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub package_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_package_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.package_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve package directory {attempted}: {source}")]
    PackageDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let package_dir = resolve_package_dir(options.package_dir)?;

        if let Some(path) = &options.override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default();
        let mut merged = defaults_layer(&default_source);
        let mut layers = vec![default_source];

        let package_config_path = package_dir.join(CONFIG_FILE_NAME);
        if package_config_path.exists()
            && Some(&package_config_path) != options.override_path.as_ref()
        {
            let source =
                ConfigSource::for_file(ConfigSourceKind::Package, package_config_path.clone());
            merged.merge(load_layer(&package_config_path, &source)?);
            layers.push(source);
        }

        if let Some(path) = options.override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, &source)?);
            layers.push(source);
        }

        let (template, rewrite, layout) = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            template,
            rewrite,
            layout,
            sources: ConfigSources {
                package_directory: package_dir,
                layers,
            },
        })
    }
}

impl Default for Config {
    /// Built-in defaults without touching the filesystem.
    fn default() -> Self {
        Config {
            template: TemplateSettings {
                url: DEFAULT_TEMPLATE_URL.to_owned(),
                timeout: None,
            },
            rewrite: RewriteSettings {
                model: DEFAULT_MODEL.to_owned(),
                endpoint: DEFAULT_ENDPOINT.to_owned(),
                timeout: Duration::from_secs(DEFAULT_REWRITE_TIMEOUT_SECS),
            },
            layout: LayoutSettings::default(),
            sources: ConfigSources {
                package_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default()],
            },
        }
    }
}

fn resolve_package_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::PackageDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::PackageDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn load_layer(path: &Path, source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.into(),
        source: err,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: &ConfigSource) -> PartialConfig {
    PartialConfig {
        template_url: Some(Located::new(DEFAULT_TEMPLATE_URL.into(), source.clone())),
        template_timeout_secs: None,
        rewrite_model: Some(Located::new(DEFAULT_MODEL.into(), source.clone())),
        rewrite_endpoint: Some(Located::new(DEFAULT_ENDPOINT.into(), source.clone())),
        rewrite_timeout_secs: Some(Located::new(DEFAULT_REWRITE_TIMEOUT_SECS, source.clone())),
        layout_target: Some(Located::new(DEFAULT_TARGET.into(), source.clone())),
        layout_source: Some(Located::new(DEFAULT_SOURCE.into(), source.clone())),
        layout_entities_dir: Some(Located::new(DEFAULT_ENTITIES_DIR.into(), source.clone())),
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    template_url: Option<Located<String>>,
    template_timeout_secs: Option<Located<u64>>,
    rewrite_model: Option<Located<String>>,
    rewrite_endpoint: Option<Located<String>>,
    rewrite_timeout_secs: Option<Located<u64>>,
    layout_target: Option<Located<PathBuf>>,
    layout_source: Option<Located<PathBuf>>,
    layout_entities_dir: Option<Located<PathBuf>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        fn take<T>(slot: &mut Option<T>, incoming: Option<T>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }

        take(&mut self.template_url, other.template_url);
        take(&mut self.template_timeout_secs, other.template_timeout_secs);
        take(&mut self.rewrite_model, other.rewrite_model);
        take(&mut self.rewrite_endpoint, other.rewrite_endpoint);
        take(&mut self.rewrite_timeout_secs, other.rewrite_timeout_secs);
        take(&mut self.layout_target, other.layout_target);
        take(&mut self.layout_source, other.layout_source);
        take(&mut self.layout_entities_dir, other.layout_entities_dir);
    }

    fn finalize(
        self,
    ) -> Result<(TemplateSettings, RewriteSettings, LayoutSettings), ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = ConfigSource::default();

        let template_url = self
            .template_url
            .unwrap_or_else(|| Located::new(DEFAULT_TEMPLATE_URL.into(), fallback.clone()));
        check_url(&template_url, "template.url", &mut errors);

        let template_timeout = self.template_timeout_secs.and_then(|located| {
            check_timeout(&located, "template.timeout_secs", &mut errors)
        });

        let rewrite_model = self
            .rewrite_model
            .unwrap_or_else(|| Located::new(DEFAULT_MODEL.into(), fallback.clone()));
        if rewrite_model.value.trim().is_empty() {
            errors.push(ConfigValidationError::new(
                Some(rewrite_model.source.clone()),
                "rewrite.model must not be empty".to_owned(),
            ));
        }

        let rewrite_endpoint = self
            .rewrite_endpoint
            .unwrap_or_else(|| Located::new(DEFAULT_ENDPOINT.into(), fallback.clone()));
        check_url(&rewrite_endpoint, "rewrite.endpoint", &mut errors);

        let rewrite_timeout = self
            .rewrite_timeout_secs
            .unwrap_or_else(|| Located::new(DEFAULT_REWRITE_TIMEOUT_SECS, fallback.clone()));
        let rewrite_timeout = check_timeout(&rewrite_timeout, "rewrite.timeout_secs", &mut errors)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_REWRITE_TIMEOUT_SECS));

        let defaults = LayoutSettings::default();
        let target = check_relative(self.layout_target, "layout.target", &mut errors)
            .unwrap_or(defaults.target);
        let source = check_relative(self.layout_source, "layout.source", &mut errors)
            .unwrap_or(defaults.source);
        let entities_dir =
            check_relative(self.layout_entities_dir, "layout.entities_dir", &mut errors)
                .unwrap_or(defaults.entities_dir);

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok((
            TemplateSettings {
                url: template_url.value,
                timeout: template_timeout,
            },
            RewriteSettings {
                model: rewrite_model.value,
                endpoint: rewrite_endpoint.value.trim_end_matches('/').to_owned(),
                timeout: rewrite_timeout,
            },
            LayoutSettings {
                target,
                source,
                entities_dir,
            },
        ))
    }
}

fn check_url(located: &Located<String>, key: &str, errors: &mut Vec<ConfigValidationError>) {
    let lower = located.value.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        errors.push(
            ConfigValidationError::new(
                Some(located.source.clone()),
                format!("expected an http(s) URL, found '{}'", located.value),
            )
            .with_context(key),
        );
    }
}

fn check_timeout(
    located: &Located<u64>,
    key: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<Duration> {
    if located.value == 0 {
        errors.push(
            ConfigValidationError::new(
                Some(located.source.clone()),
                "timeout must be greater than 0 seconds".to_owned(),
            )
            .with_context(key),
        );
        return None;
    }
    Some(Duration::from_secs(located.value))
}

fn check_relative(
    located: Option<Located<PathBuf>>,
    key: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<PathBuf> {
    let located = located?;
    if located.value.as_os_str().is_empty() || located.value.is_absolute() {
        errors.push(
            ConfigValidationError::new(
                Some(located.source.clone()),
                format!(
                    "expected a non-empty package-relative path, found '{}'",
                    located.value.display()
                ),
            )
            .with_context(key),
        );
        return None;
    }
    Some(located.value)
}

/// Aggregated validation failures, reported together.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

#[derive(Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_owned());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    template: Option<RawTemplate>,
    #[serde(default)]
    rewrite: Option<RawRewrite>,
    #[serde(default)]
    layout: Option<RawLayout>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRewrite {
    model: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayout {
    target: Option<PathBuf>,
    source: Option<PathBuf>,
    entities_dir: Option<PathBuf>,
}

impl RawConfig {
    fn into_partial(self, source: &ConfigSource) -> PartialConfig {
        let at = |value| Located::new(value, source.clone());
        let mut partial = PartialConfig::default();

        if let Some(template) = self.template {
            partial.template_url = template.url.map(at);
            partial.template_timeout_secs = template
                .timeout_secs
                .map(|secs| Located::new(secs, source.clone()));
        }

        if let Some(rewrite) = self.rewrite {
            partial.rewrite_model = rewrite.model.map(at);
            partial.rewrite_endpoint = rewrite.endpoint.map(at);
            partial.rewrite_timeout_secs = rewrite
                .timeout_secs
                .map(|secs| Located::new(secs, source.clone()));
        }

        if let Some(layout) = self.layout {
            let at_path = |value| Located::new(value, source.clone());
            partial.layout_target = layout.target.map(at_path);
            partial.layout_source = layout.source.map(at_path);
            partial.layout_entities_dir = layout.entities_dir.map(at_path);
        }

        partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_replace_only_the_keys_they_set() {
        let defaults = ConfigSource::default();
        let mut merged = defaults_layer(&defaults);

        let raw: RawConfig = toml::from_str("[rewrite]\nmodel = \"gemini-2.0-flash\"\n").unwrap();
        let package = ConfigSource::for_file(ConfigSourceKind::Package, PathBuf::from("x.toml"));
        merged.merge(raw.into_partial(&package));

        let (template, rewrite, layout) = merged.finalize().unwrap();
        assert_eq!(template.url, DEFAULT_TEMPLATE_URL);
        assert_eq!(rewrite.model, "gemini-2.0-flash");
        assert_eq!(rewrite.timeout, Duration::from_secs(300));
        assert_eq!(layout, LayoutSettings::default());
    }

    #[test]
    fn validation_reports_every_problem_with_its_key() {
        let raw: RawConfig = toml::from_str(
            "[template]\nurl = \"ftp://example.com\"\ntimeout_secs = 0\n[layout]\ntarget = \"/abs/readme.md\"\n",
        )
        .unwrap();
        let source = ConfigSource::for_file(ConfigSourceKind::Override, PathBuf::from("o.toml"));
        let mut merged = defaults_layer(&ConfigSource::default());
        merged.merge(raw.into_partial(&source));

        let errors = merged.finalize().unwrap_err();
        let rendered = errors.to_string();
        assert_eq!(errors.iter().count(), 3);
        assert!(rendered.contains("template.url"));
        assert!(rendered.contains("template.timeout_secs"));
        assert!(rendered.contains("layout.target"));
        assert!(rendered.contains("override config at o.toml"));
    }
}
