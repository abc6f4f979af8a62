//! Network-backed collaborators: the template download and the Gemini
//! `generateContent` rewrite.

pub mod gemini;
pub mod template;

pub use gemini::{GeminiConfig, GeminiRewriter};
pub use template::HttpTemplateSource;
