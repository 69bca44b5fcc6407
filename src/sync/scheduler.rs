//! Debounced, cancelable dispatch of provider calls
//!
//! Each direction has one slot. Dispatching into a slot aborts whatever the
//! slot held, whether that was a debounce timer still waiting or a provider
//! call in flight, so at most one request per direction is ever live.
//!
//! Requests run as tokio tasks and report back over a channel as
//! [`Completion`]s. The scheduler never touches buffers: the owner of the
//! receiving end decides what a completion means, using
//! [`RequestScheduler::is_current`] to drop superseded results.

use crate::sync::buffer::Direction;
use crate::sync::error::SyncResult;
use crate::sync::prompt::PromptSpec;
use crate::sync::translator::TranslationProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Characters that make a full-text request fire without waiting
const BOUNDARY_PUNCTUATION: [char; 4] = ['.', ',', '!', '?'];

/// How a request is released to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Sent right away
    Immediate,
    /// Sent once edits in the same direction pause for the debounce period
    Debounced,
}

impl Trigger {
    /// Trigger for an edit leaving `content` in the buffer, `None` when blank
    pub fn for_content(content: &str) -> Option<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.ends_with(BOUNDARY_PUNCTUATION) {
            Some(Trigger::Immediate)
        } else {
            Some(Trigger::Debounced)
        }
    }
}

/// What the engine asked for, echoed back on completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Translate the whole source buffer into the other buffer
    FullText,
    /// Translate `word`, the last token of the source buffer, into the source language
    WordCorrection { word: String },
}

/// Whether a direction has a live request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Pending,
}

/// Result of one provider call
#[derive(Debug)]
pub struct Completion {
    pub direction: Direction,
    pub request_id: u64,
    /// Version of the source buffer when the request was dispatched
    pub source_version: u64,
    pub kind: RequestKind,
    pub result: SyncResult<String>,
}

/// The live request of one direction
#[derive(Debug)]
pub struct PendingRequest {
    pub direction: Direction,
    pub request_id: u64,
    pub trigger: Trigger,
    handle: JoinHandle<()>,
}

impl PendingRequest {
    /// Stop the debounce timer or the provider call, whichever is running
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Id of the most recent dispatch; 0 before the first one
    latest_id: u64,
    pending: Option<PendingRequest>,
}

pub struct RequestScheduler {
    provider: Arc<dyn TranslationProvider>,
    debounce: Duration,
    slots: [Slot; 2],
    completions: mpsc::UnboundedSender<Completion>,
}

impl RequestScheduler {
    /// Create a scheduler and the receiver its completions arrive on
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            provider,
            debounce,
            slots: [Slot::default(), Slot::default()],
            completions: tx,
        };
        (scheduler, rx)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Start a request, superseding any live request in the same direction
    ///
    /// The request waits out the debounce first when `trigger` is
    /// [`Trigger::Debounced`], then calls the provider; its completion is
    /// sent on the scheduler's channel tagged with the returned id.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `direction` - Which way the request translates; one live request per direction
    /// * `trigger` - Whether to wait for the debounce period
    /// * `kind` - Echoed back on completion so the engine knows how to apply it
    /// * `prompt` - What to send to the provider
    /// * `source_version` - Version of the source buffer the prompt was built from
    ///
    /// # Returns
    ///
    /// The new request id, which [`is_current`](Self::is_current) accepts
    /// until the next dispatch or cancel in `direction`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let id = scheduler.dispatch(Direction::AtoB, Trigger::Debounced, kind, prompt, 3);
    /// assert!(scheduler.is_current(Direction::AtoB, id));
    /// ```
    pub fn dispatch(
        &mut self,
        direction: Direction,
        trigger: Trigger,
        kind: RequestKind,
        prompt: PromptSpec,
        source_version: u64,
    ) -> u64 {
        self.cancel(direction);

        let slot = &mut self.slots[direction.index()];
        slot.latest_id += 1;
        let request_id = slot.latest_id;

        let delay = match trigger {
            Trigger::Immediate => None,
            Trigger::Debounced => Some(self.debounce),
        };
        let provider = Arc::clone(&self.provider);
        let completions = self.completions.clone();

        debug!(%direction, request_id, ?trigger, source_version, "dispatching request");

        let handle = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            trace!(%direction, request_id, "calling provider");
            let result = provider.complete(&prompt).await;
            // The receiver is gone only when the engine was dropped
            let _ = completions.send(Completion {
                direction,
                request_id,
                source_version,
                kind,
                result,
            });
        });

        slot.pending = Some(PendingRequest {
            direction,
            request_id,
            trigger,
            handle,
        });
        request_id
    }

    /// Abort the live request of `direction`, if any
    ///
    /// The request id is also retired, so a completion that was already
    /// queued when the abort happened is no longer current.
    pub fn cancel(&mut self, direction: Direction) {
        let slot = &mut self.slots[direction.index()];
        if let Some(pending) = slot.pending.take() {
            debug!(%direction, request_id = pending.request_id, "cancelling request");
            pending.cancel();
            slot.latest_id += 1;
        }
    }

    pub fn cancel_all(&mut self) {
        self.cancel(Direction::AtoB);
        self.cancel(Direction::BtoA);
    }

    /// True when `request_id` is the latest dispatch of `direction`
    pub fn is_current(&self, direction: Direction, request_id: u64) -> bool {
        let slot = &self.slots[direction.index()];
        slot.latest_id == request_id && slot.pending.is_some()
    }

    /// Release the slot held by `request_id`; ignored for superseded ids
    pub fn finish(&mut self, direction: Direction, request_id: u64) {
        let slot = &mut self.slots[direction.index()];
        if slot
            .pending
            .as_ref()
            .is_some_and(|p| p.request_id == request_id)
        {
            slot.pending = None;
        }
    }

    pub fn state(&self, direction: Direction) -> RequestState {
        match self.slots[direction.index()].pending {
            Some(_) => RequestState::Pending,
            None => RequestState::Idle,
        }
    }

    pub fn pending(&self, direction: Direction) -> Option<&PendingRequest> {
        self.slots[direction.index()].pending.as_ref()
    }
}

impl Drop for RequestScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
