//! Bidirectional translation sync
//!
//! Keeps two editable text buffers in different languages mirrored through an
//! asynchronous, cancelable translation provider, together with a word-level
//! mapping between them and a selection highlight.
//!
//! # Overview
//!
//! 1. **Buffers** - content, language, version and caret of each side
//! 2. **Word banks** - closed-class word lists that flag text typed in the wrong language
//! 3. **Scheduler** - one debounced, cancelable request per direction
//! 4. **Parser** - splits a provider reply into a translation and a word mapping
//! 5. **Alignment** - maps a selection in one buffer onto the other
//! 6. **Engine** - applies edits and results to the session in order
//!
//! # Example
//!
//! ```ignore
//! use mirror_translate::sync::{BufferId, OpenAiProvider, SessionConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(OpenAiProvider::from_env()?);
//!     let mut engine = SyncEngine::new(SessionConfig::default(), provider);
//!
//!     engine.on_text_changed(BufferId::A, "Bonjour tout le monde.");
//!     while let Some(event) = engine.next_event().await {
//!         println!("{:?}", event);
//!     }
//!     println!("{}", engine.buffer(BufferId::B).content());
//!     Ok(())
//! }
//! ```
pub mod align;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod scheduler;
pub mod translator;
pub mod word_bank;


// Re-export main types for convenient access
pub use align::{
    CaretPosition, Lookup, align_selection, caret_offset, highlight_segments, locate_caret,
    restore_caret,
};
pub use buffer::{BufferId, Direction, LanguageTag, SelectionRange, TextBuffer};
pub use config::{DEFAULT_DEBOUNCE, SessionConfig};
pub use engine::{EditOutcome, Highlight, SessionSnapshot, SyncEngine, SyncEvent};
pub use error::{SyncError, SyncResult};
pub use mapping::{MappingEntry, MappingTable};
pub use mock::{MockMode, MockProvider};
pub use openai::OpenAiProvider;
pub use parser::{ParsedResponse, parse_response};
pub use prompt::{Formality, PromptSpec};
pub use scheduler::{RequestScheduler, RequestState, Trigger};
pub use translator::TranslationProvider;
pub use word_bank::{WordBank, WordBanks};
