pub mod collaborator;
pub mod diff;
pub mod entity;
pub mod error;
pub mod fs;
pub mod pipeline;
pub mod placeholder;
pub mod prompt;

pub use collaborator::{DocumentRewriter, TemplateSource};
pub use diff::build_unified_diff;
pub use entity::{discover, EntityName};
pub use error::{BoxError, ExitCode, FetchError, GenerationError, MigrateError, MigrateResult};
pub use pipeline::{MigrationOptions, MigrationOutcome, MigrationRequest, Migrator};
pub use placeholder::{
    find_placeholders, rewrite_placeholders, Placeholder, PlaceholderKind, GENERIC_ENTITY,
};
pub use prompt::build_prompt;
