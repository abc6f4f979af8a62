//! Seams to the external services a migration depends on.

use async_trait::async_trait;

use crate::error::{FetchError, GenerationError};

/// Supplies the canonical documentation template.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Restructures a document to follow a template.
///
/// Implementations return the complete rewritten document. The result is
/// treated as opaque text and only post-processed structurally.
#[async_trait]
pub trait DocumentRewriter: Send + Sync {
    async fn rewrite(&self, original: &str, template: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<T: TemplateSource + ?Sized> TemplateSource for Box<T> {
    async fn fetch(&self) -> Result<String, FetchError> {
        (**self).fetch().await
    }
}

#[async_trait]
impl<T: DocumentRewriter + ?Sized> DocumentRewriter for Box<T> {
    async fn rewrite(&self, original: &str, template: &str) -> Result<String, GenerationError> {
        (**self).rewrite(original, template).await
    }
}

#[async_trait]
impl<'a, T: TemplateSource + ?Sized> TemplateSource for &'a T {
    async fn fetch(&self) -> Result<String, FetchError> {
        (**self).fetch().await
    }
}

#[async_trait]
impl<'a, T: DocumentRewriter + ?Sized> DocumentRewriter for &'a T {
    async fn rewrite(&self, original: &str, template: &str) -> Result<String, GenerationError> {
        (**self).rewrite(original, template).await
    }
}
