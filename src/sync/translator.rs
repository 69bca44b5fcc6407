//! Translation provider trait
//!
//! The engine never talks to a translation backend directly. It hands a
//! [`PromptSpec`] to a `TranslationProvider` and parses the raw text that
//! comes back, so any chat model, HTTP service or test double can sit behind
//! this seam.
//!
//! # Cancellation
//!
//! Calls are cancelled by dropping the returned future. The scheduler runs each
//! call inside its own task and aborts that task when a newer request
//! supersedes it, which drops the in-flight HTTP request with it.
//!
//! # Example
//!
//! ```ignore
//! use mirror_translate::sync::{Formality, LanguageTag, OpenAiProvider, PromptSpec, TranslationProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAiProvider::from_env()?;
//!     let prompt = PromptSpec::full_text(
//!         "Bonjour.",
//!         LanguageTag::new("fr")?,
//!         LanguageTag::new("en")?,
//!         Formality::Informal,
//!     );
//!     let raw = provider.complete(&prompt).await?;
//!     println!("{}", raw);
//!     Ok(())
//! }
//! ```

use crate::sync::error::SyncResult;
use crate::sync::prompt::PromptSpec;
use async_trait::async_trait;

/// Backend that answers translation prompts with raw text
///
/// Full-text prompts are expected to be answered in the two-section format
/// read by [`crate::sync::parser::parse_response`]; single-word prompts with
/// the bare word.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Run one prompt and return the provider's raw reply
    ///
    /// # Arguments
    ///
    /// * `prompt` - The full-text or single-word request to answer
    ///
    /// # Returns
    ///
    /// The reply text untouched, or a `SyncError` the engine reports as a
    /// notice. The call may be aborted at any await point when superseded.
    async fn complete(&self, prompt: &PromptSpec) -> SyncResult<String>;

    /// Name used in logs
    fn provider_name(&self) -> &str;
}
