//! Two-pane translation editor core
//!
//! Type in either buffer and the other one follows as its translation. See
//! [`sync`] for the engine and its collaborators.

pub mod sync;

pub use sync::{
    BufferId, Direction, EditOutcome, SessionConfig, SyncEngine, SyncError, SyncEvent,
    SyncResult, TranslationProvider,
};
