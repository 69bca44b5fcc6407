//! The synchronization engine
//!
//! `SyncEngine` owns the session: both buffers, the word mapping, the current
//! highlight and the request scheduler. UI callbacks go in through
//! [`SyncEngine::on_text_changed`] and [`SyncEngine::select`]; provider
//! results come back through [`SyncEngine::next_event`], which applies them one
//! at a time. Every mutation happens inside one of those calls, so readers
//! never see a half-applied result.
//!
//! # Per-direction state
//!
//! Each direction is either idle or has exactly one pending request. An edit
//! to buffer X arms X→Other (debounced, or immediate after `. , ! ?`). A
//! result is applied only if its request is still the latest for that
//! direction and buffer X has not changed since dispatch; otherwise it is
//! dropped. Failures leave both buffers untouched and set a notice.
//!
//! # Language guard
//!
//! With the guard on, an edit whose last word belongs to the other buffer's
//! word bank first asks the provider for that word in X's language, splices
//! the answer over the word, then re-translates the corrected buffer. The
//! word request waits for the debounce like any other typing, so a prefix of
//! a longer word (`i` on the way to `il`) is never corrected; further typing
//! cancels the correction before it lands.
//!
//! # Example
//!
//! ```ignore
//! let provider = Arc::new(MockProvider::new(MockMode::Suffix));
//! let mut engine = SyncEngine::new(SessionConfig::default(), provider);
//!
//! engine.on_text_changed(BufferId::A, "Bonjour.");
//! while let Some(event) = engine.next_event().await {
//!     println!("{:?}", event);
//! }
//! println!("{}", engine.buffer(BufferId::B).content());
//! ```

use crate::sync::align::{Lookup, align_selection};
use crate::sync::buffer::{BufferId, Direction, LanguageTag, SelectionRange, TextBuffer, utf16_len};
use crate::sync::config::SessionConfig;
use crate::sync::error::SyncError;
use crate::sync::mapping::{MappingEntry, MappingTable};
use crate::sync::parser::parse_response;
use crate::sync::prompt::{Formality, PromptSpec};
use crate::sync::scheduler::{Completion, RequestKind, RequestScheduler, RequestState, Trigger};
use crate::sync::translator::TranslationProvider;
use crate::sync::word_bank::WordBanks;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Tokens before the last word sent along with a word correction
const CONTEXT_WINDOW: usize = 7;

/// What an edit set in motion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Buffer is blank; nothing was dispatched
    Idle,
    /// A full-text translation was scheduled
    Dispatched { request_id: u64, trigger: Trigger },
    /// The last word looked foreign and a word correction was requested
    GuardTriggered { request_id: u64, word: String },
}

/// What applying one provider result did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The target buffer and the mapping were replaced
    Translated { direction: Direction, request_id: u64 },
    /// `word` was replaced in `buffer`; `request_id` is the follow-up translation
    WordCorrected {
        buffer: BufferId,
        word: String,
        replacement: String,
        request_id: u64,
    },
    /// The result was superseded or its source buffer changed
    Discarded { direction: Direction, request_id: u64 },
    /// The provider call failed; buffers are unchanged
    Failed {
        direction: Direction,
        request_id: u64,
        error: SyncError,
    },
}

/// Highlighted span in one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub buffer: BufferId,
    pub range: SelectionRange,
}

/// Mutable state of one interactive session
#[derive(Debug, Clone)]
struct Session {
    buffers: [TextBuffer; 2],
    mapping: MappingTable,
    highlight: Option<Highlight>,
    notice: Option<String>,
}

impl Session {
    fn new(config: &SessionConfig) -> Self {
        Self {
            buffers: [
                TextBuffer::new(config.language_a.clone()),
                TextBuffer::new(config.language_b.clone()),
            ],
            mapping: MappingTable::new(),
            highlight: None,
            notice: None,
        }
    }

    fn buffer(&self, id: BufferId) -> &TextBuffer {
        &self.buffers[slot(id)]
    }

    fn buffer_mut(&mut self, id: BufferId) -> &mut TextBuffer {
        &mut self.buffers[slot(id)]
    }

    fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

fn slot(id: BufferId) -> usize {
    match id {
        BufferId::A => 0,
        BufferId::B => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferSnapshot {
    pub content: String,
    pub language: LanguageTag,
    pub version: u64,
    pub caret: usize,
}

impl From<&TextBuffer> for BufferSnapshot {
    fn from(buffer: &TextBuffer) -> Self {
        Self {
            content: buffer.content().to_string(),
            language: buffer.language().clone(),
            version: buffer.version(),
            caret: buffer.caret(),
        }
    }
}

/// Everything a UI needs to render the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub a: BufferSnapshot,
    pub b: BufferSnapshot,
    pub mapping: Vec<MappingEntry>,
    pub mapping_direction: Option<Direction>,
    pub highlight: Option<Highlight>,
    pub notice: Option<String>,
    pub formality: Formality,
    pub language_guard: bool,
}

pub struct SyncEngine {
    config: SessionConfig,
    session: Session,
    word_banks: WordBanks,
    scheduler: RequestScheduler,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl SyncEngine {
    pub fn new(config: SessionConfig, provider: Arc<dyn TranslationProvider>) -> Self {
        let (scheduler, completions) = RequestScheduler::new(provider, config.debounce);
        info!(
            provider = scheduler.provider_name(),
            a = %config.language_a,
            b = %config.language_b,
            "starting translation session"
        );
        Self {
            session: Session::new(&config),
            config,
            word_banks: WordBanks::new(),
            scheduler,
            completions,
        }
    }

    // ---- UI input ----

    /// Handle the user replacing the content of `buffer`
    ///
    /// Bumps the buffer's version, cancels any translation still heading into
    /// `buffer`, then schedules work for the `buffer`→other direction,
    /// superseding whatever was pending there.
    ///
    /// # Arguments
    ///
    /// * `buffer` - The buffer the user edited
    /// * `content` - Its full new content
    ///
    /// # Returns
    ///
    /// * `EditOutcome::Idle` when the trimmed content is empty
    /// * `EditOutcome::GuardTriggered` when the language guard asked for a word correction
    /// * `EditOutcome::Dispatched` otherwise, with the trigger that was chosen
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_text_changed(&mut self, buffer: BufferId, content: impl Into<String>) -> EditOutcome {
        let direction = Direction::from_source(buffer);
        let version = self.session.buffer_mut(buffer).replace(content);
        self.session.highlight = None;

        // A translation still heading into this buffer would overwrite the new text
        self.scheduler.cancel(direction.reverse());

        let content = self.session.buffer(buffer).content().to_string();
        let Some(trigger) = Trigger::for_content(&content) else {
            self.scheduler.cancel(direction);
            return EditOutcome::Idle;
        };

        if self.config.language_guard {
            if let Some((word, context)) = last_word_with_context(&content) {
                let foreign = self.session.buffer(buffer.other()).language().clone();
                if self.word_banks.contains(&foreign, word) {
                    let own = self.session.buffer(buffer).language().clone();
                    info!(%direction, word, language = %foreign, "word typed in the other language");
                    let prompt =
                        PromptSpec::single_word(word, context, foreign, own, self.config.formality);
                    let request_id = self.scheduler.dispatch(
                        direction,
                        Trigger::Debounced,
                        RequestKind::WordCorrection {
                            word: word.to_string(),
                        },
                        prompt,
                        version,
                    );
                    return EditOutcome::GuardTriggered {
                        request_id,
                        word: word.to_string(),
                    };
                }
            }
        }

        let request_id = self.dispatch_full_text(direction, trigger, content, version);
        EditOutcome::Dispatched {
            request_id,
            trigger,
        }
    }

    /// Record the caret of `buffer`, in UTF-16 code units
    pub fn set_caret(&mut self, buffer: BufferId, offset: usize) {
        self.session.buffer_mut(buffer).set_caret(offset);
    }

    /// Highlight in the other buffer the span aligned with `selection`
    ///
    /// Returns the highlighted range, or `None` (and clears the highlight)
    /// when the selection cannot be aligned.
    pub fn select(&mut self, buffer: BufferId, selection: SelectionRange) -> Option<SelectionRange> {
        let source = self.session.buffer(buffer).content();
        let target = self.session.buffer(buffer.other()).content();
        let selection = SelectionRange::clamped(selection.start, selection.end, source);

        let lookup = match self.session.mapping.direction() {
            Some(direction) if direction.source() == buffer => Lookup::Forward,
            Some(_) => Lookup::Backward,
            None => {
                self.session.highlight = None;
                return None;
            }
        };

        let aligned = align_selection(source, selection, target, &self.session.mapping, lookup);
        if aligned.is_none() {
            debug!(%buffer, ?selection, "selection has no aligned span");
        }
        self.session.highlight = aligned.map(|range| Highlight {
            buffer: buffer.other(),
            range,
        });
        aligned
    }

    pub fn clear_selection(&mut self) {
        self.session.highlight = None;
    }

    // ---- Runtime settings ----

    pub fn set_formality(&mut self, formality: Formality) {
        self.config.formality = formality;
    }

    pub fn set_language_guard(&mut self, enabled: bool) {
        self.config.language_guard = enabled;
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.config.debounce = debounce;
        self.scheduler.set_debounce(debounce);
    }

    /// Change the language of one buffer
    ///
    /// Pending requests were built for the old language pair and are cancelled.
    pub fn set_language(&mut self, buffer: BufferId, language: LanguageTag) {
        info!(%buffer, %language, "changing buffer language");
        match buffer {
            BufferId::A => self.config.language_a = language.clone(),
            BufferId::B => self.config.language_b = language.clone(),
        }
        self.session.buffer_mut(buffer).set_language(language);
        self.scheduler.cancel_all();
    }

    pub fn word_banks_mut(&mut self) -> &mut WordBanks {
        &mut self.word_banks
    }

    // ---- Provider results ----

    /// Apply the next provider result
    ///
    /// Waits while a request is pending. Returns `None` once both directions
    /// are idle and no result is queued.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        if let Some(event) = self.try_next_event() {
            return Some(event);
        }
        if self.is_idle() {
            return None;
        }
        let completion = self.completions.recv().await?;
        Some(self.apply(completion))
    }

    /// Apply a provider result if one is already queued
    pub fn try_next_event(&mut self) -> Option<SyncEvent> {
        let completion = self.completions.try_recv().ok()?;
        Some(self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> SyncEvent {
        let Completion {
            direction,
            request_id,
            source_version,
            kind,
            result,
        } = completion;

        if !self.scheduler.is_current(direction, request_id) {
            debug!(%direction, request_id, "dropping superseded result");
            return SyncEvent::Discarded {
                direction,
                request_id,
            };
        }
        self.scheduler.finish(direction, request_id);

        let current_version = self.session.buffer(direction.source()).version();
        if current_version != source_version {
            debug!(
                %direction,
                request_id,
                source_version,
                current_version,
                "dropping stale result"
            );
            return SyncEvent::Discarded {
                direction,
                request_id,
            };
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(error) => {
                error!(%direction, request_id, %error, "translation request failed");
                self.session.notice = Some(error.notice());
                return SyncEvent::Failed {
                    direction,
                    request_id,
                    error,
                };
            }
        };

        match kind {
            RequestKind::FullText => self.apply_translation(direction, request_id, &raw),
            RequestKind::WordCorrection { word } => self.apply_word_correction(direction, word, &raw),
        }
    }

    fn apply_translation(&mut self, direction: Direction, request_id: u64, raw: &str) -> SyncEvent {
        let parsed = parse_response(raw);
        if parsed.degraded {
            warn!(%direction, request_id, "provider reply did not have both sections");
        }

        let target = self.session.buffer_mut(direction.target());
        target.replace(parsed.translation);
        let version = target.version();
        self.session.mapping.rebuild(parsed.mapping, direction);
        self.session.highlight = None;
        self.session.notice = None;

        info!(
            %direction,
            request_id,
            version,
            mappings = self.session.mapping.len(),
            "applied translation"
        );
        SyncEvent::Translated {
            direction,
            request_id,
        }
    }

    fn apply_word_correction(&mut self, direction: Direction, word: String, raw: &str) -> SyncEvent {
        let source = direction.source();
        let replacement = clean_word(raw).to_string();
        let buffer = self.session.buffer_mut(source);

        if replacement.is_empty() {
            warn!(%direction, %word, "empty word correction; re-translating as typed");
        } else if let Some(corrected) = replace_last_word(buffer.content(), &word, &replacement) {
            let caret_at_end = buffer.caret() == utf16_len(buffer.content());
            buffer.replace(corrected);
            if caret_at_end {
                buffer.set_caret(utf16_len(buffer.content()));
            }
            info!(%direction, %word, %replacement, "corrected word");
        } else {
            warn!(%direction, %word, "word no longer ends the buffer; skipping correction");
        }

        let version = buffer.version();
        let content = buffer.content().to_string();
        let request_id = self.dispatch_full_text(direction, Trigger::Immediate, content, version);
        self.session.notice = None;

        SyncEvent::WordCorrected {
            buffer: source,
            word,
            replacement,
            request_id,
        }
    }

    fn dispatch_full_text(
        &mut self,
        direction: Direction,
        trigger: Trigger,
        content: String,
        version: u64,
    ) -> u64 {
        let source = self.session.buffer(direction.source()).language().clone();
        let target = self.session.buffer(direction.target()).language().clone();
        let prompt = PromptSpec::full_text(content, source, target, self.config.formality);
        self.scheduler
            .dispatch(direction, trigger, RequestKind::FullText, prompt, version)
    }

    // ---- Read access ----

    pub fn buffer(&self, id: BufferId) -> &TextBuffer {
        self.session.buffer(id)
    }

    pub fn mapping(&self) -> &MappingTable {
        self.session.mapping()
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.session.highlight()
    }

    /// Transient message about the last failure, cleared by the next success
    pub fn notice(&self) -> Option<&str> {
        self.session.notice()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self, direction: Direction) -> RequestState {
        self.scheduler.state(direction)
    }

    pub fn is_idle(&self) -> bool {
        self.state(Direction::AtoB) == RequestState::Idle
            && self.state(Direction::BtoA) == RequestState::Idle
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            a: self.session.buffer(BufferId::A).into(),
            b: self.session.buffer(BufferId::B).into(),
            mapping: self.session.mapping.entries().to_vec(),
            mapping_direction: self.session.mapping.direction(),
            highlight: self.session.highlight,
            notice: self.session.notice.clone(),
            formality: self.config.formality,
            language_guard: self.config.language_guard,
        }
    }
}

/// Last whitespace-separated token and up to seven tokens before it
fn last_word_with_context(content: &str) -> Option<(&str, String)> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    let (last, before) = tokens.split_last()?;
    let start = before.len().saturating_sub(CONTEXT_WINDOW);
    Some((last, before[start..].join(" ")))
}

/// Replace `word` when it is the last token of `content`
///
/// Trailing whitespace is kept. Earlier occurrences of the word are never
/// touched.
fn replace_last_word(content: &str, word: &str, replacement: &str) -> Option<String> {
    let pattern = format!(r"(?:^|\s)({})\s*$", regex::escape(word));
    let re = Regex::new(&pattern).ok()?;
    let found = re.captures(content)?.get(1)?;

    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..found.start()]);
    out.push_str(replacement);
    out.push_str(&content[found.end()..]);
    Some(out)
}

/// Strip whitespace and quoting a model may wrap a one-word answer in
fn clean_word(raw: &str) -> &str {
    raw.trim()
        .trim_matches(['"', '`', '[', ']', '«', '»'])
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::mock::{MockMode, MockProvider};

    fn engine_with(mock: &Arc<MockProvider>, config: SessionConfig) -> SyncEngine {
        let provider: Arc<dyn TranslationProvider> = mock.clone();
        SyncEngine::new(config, provider)
    }

    // ========== Helpers ==========

    #[test]
    fn test_last_word_with_context_window() {
        let (word, context) = last_word_with_context("a b c d e f g h i the ").unwrap();
        assert_eq!(word, "the");
        assert_eq!(context, "c d e f g h i");

        let (word, context) = last_word_with_context("the").unwrap();
        assert_eq!(word, "the");
        assert_eq!(context, "");

        assert!(last_word_with_context("   ").is_none());
    }

    #[test]
    fn test_replace_last_word_only_at_end() {
        assert_eq!(
            replace_last_word("the chat the ", "the", "le").as_deref(),
            Some("the chat le ")
        );
        assert_eq!(replace_last_word("the chat", "the", "le"), None);
        assert_eq!(replace_last_word("bathe", "the", "le"), None);
        assert_eq!(replace_last_word("the", "the", "le").as_deref(), Some("le"));
    }

    #[test]
    fn test_replace_last_word_escapes_metacharacters() {
        assert_eq!(
            replace_last_word("prix a+b", "a+b", "x").as_deref(),
            Some("prix x")
        );
        assert_eq!(replace_last_word("prix aab", "a+b", "x"), None);
        assert_eq!(
            replace_last_word("coût (1)", "(1)", "$1").as_deref(),
            Some("coût $1")
        );
    }

    #[test]
    fn test_clean_word() {
        assert_eq!(clean_word("  \"le\"\n"), "le");
        assert_eq!(clean_word("[la]"), "la");
        assert_eq!(clean_word("« l' »"), "l'");
    }

    // ========== Edits ==========

    #[tokio::test(start_paused = true)]
    async fn test_blank_edit_dispatches_nothing() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());

        assert_eq!(engine.on_text_changed(BufferId::A, "   "), EditOutcome::Idle);
        assert!(engine.is_idle());
        assert_eq!(engine.next_event().await, None);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_edit_cancels_pending_translation() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.on_text_changed(BufferId::A, "Bonjour");
        engine.on_text_changed(BufferId::A, "");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(engine.is_idle());
        assert_eq!(mock.call_count(), 0);
        assert_eq!(engine.buffer(BufferId::B).content(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_cancels_translation_into_same_buffer() {
        let mock = Arc::new(MockProvider::with_delay(MockMode::Suffix, 1_000));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.on_text_changed(BufferId::B, "Hello.");
        assert_eq!(engine.state(Direction::BtoA), RequestState::Pending);
        engine.on_text_changed(BufferId::A, "Salut");
        assert_eq!(engine.state(Direction::BtoA), RequestState::Idle);

        let event = engine.next_event().await.unwrap();
        assert!(matches!(
            event,
            SyncEvent::Translated {
                direction: Direction::AtoB,
                ..
            }
        ));
        assert_eq!(engine.buffer(BufferId::A).content(), "Salut");
        assert_eq!(engine.buffer(BufferId::B).content(), "Salut_en");
    }

    // ========== Results ==========

    #[tokio::test(start_paused = true)]
    async fn test_stale_version_is_discarded() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());

        let outcome = engine.on_text_changed(BufferId::A, "Bonjour.");
        let EditOutcome::Dispatched { request_id, .. } = outcome else {
            panic!("expected a dispatch, got {:?}", outcome);
        };
        // Bypass on_text_changed so the request stays current
        engine.session.buffer_mut(BufferId::A).replace("Bonsoir");

        let event = engine.next_event().await.unwrap();
        assert_eq!(
            event,
            SyncEvent::Discarded {
                direction: Direction::AtoB,
                request_id
            }
        );
        assert_eq!(engine.buffer(BufferId::B).content(), "");
        assert_eq!(engine.buffer(BufferId::B).version(), 0);
        assert!(engine.mapping().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_notice_and_keeps_buffers() {
        let mock = Arc::new(MockProvider::new(MockMode::Error(SyncError::NetworkError(
            "connection reset".to_string(),
        ))));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.on_text_changed(BufferId::A, "Bonjour.");
        let event = engine.next_event().await.unwrap();

        assert!(matches!(event, SyncEvent::Failed { .. }));
        assert_eq!(engine.buffer(BufferId::A).content(), "Bonjour.");
        assert_eq!(engine.buffer(BufferId::B).content(), "");
        assert!(engine.notice().unwrap().contains("network"));
        assert!(engine.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_notice() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());
        engine.session.notice = Some("Translation failed".to_string());

        engine.on_text_changed(BufferId::A, "Oui.");
        engine.next_event().await.unwrap();
        assert_eq!(engine.notice(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_reply_still_applies_translation() {
        let mock = Arc::new(MockProvider::new(MockMode::Raw("Hello there".to_string())));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.on_text_changed(BufferId::A, "Salut toi.");
        engine.next_event().await.unwrap();
        assert_eq!(engine.buffer(BufferId::B).content(), "Hello there");
        assert!(engine.mapping().is_empty());
        assert_eq!(engine.mapping().direction(), Some(Direction::AtoB));
    }

    // ========== Language Guard ==========

    #[tokio::test(start_paused = true)]
    async fn test_guard_disabled_translates_normally() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());

        let outcome = engine.on_text_changed(BufferId::A, "le chat the ");
        assert!(matches!(outcome, EditOutcome::Dispatched { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_keeps_caret_at_end() {
        let mock = Arc::new(MockProvider::scripted([("the", "le")]));
        let config = SessionConfig::default().with_language_guard(true);
        let mut engine = engine_with(&mock, config);

        engine.on_text_changed(BufferId::A, "voici the");
        engine.set_caret(BufferId::A, 9);
        engine.next_event().await.unwrap();
        assert_eq!(engine.buffer(BufferId::A).content(), "voici le");
        assert_eq!(engine.buffer(BufferId::A).caret(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_in_buffer_b_uses_french_bank() {
        let mock = Arc::new(MockProvider::scripted([("et", "and")]));
        let config = SessionConfig::default().with_language_guard(true);
        let mut engine = engine_with(&mock, config);

        let outcome = engine.on_text_changed(BufferId::B, "cats et");
        assert_eq!(
            outcome,
            EditOutcome::GuardTriggered {
                request_id: 1,
                word: "et".to_string()
            }
        );
        engine.next_event().await.unwrap();
        let call = &mock.calls()[0];
        assert_eq!(call.source.as_str(), "fr");
        assert_eq!(call.target.as_str(), "en");
    }

    // ========== Selection ==========

    #[tokio::test(start_paused = true)]
    async fn test_select_uses_mapping_direction() {
        let reply = "Full Translation:\nthe cat\nWord Mapping:\nle -> the\nchat -> cat";
        let mock = Arc::new(MockProvider::new(MockMode::Raw(reply.to_string())));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.on_text_changed(BufferId::A, "le chat.");
        engine.next_event().await.unwrap();

        let forward = engine.select(BufferId::A, SelectionRange { start: 3, end: 7 });
        assert_eq!(forward, Some(SelectionRange { start: 4, end: 7 }));
        assert_eq!(
            engine.highlight(),
            Some(Highlight {
                buffer: BufferId::B,
                range: SelectionRange { start: 4, end: 7 }
            })
        );

        let backward = engine.select(BufferId::B, SelectionRange { start: 0, end: 3 });
        assert_eq!(backward, Some(SelectionRange { start: 0, end: 2 }));

        assert_eq!(engine.select(BufferId::B, SelectionRange { start: 0, end: 0 }), None);
        assert_eq!(engine.highlight(), None);
    }

    #[test]
    fn test_select_without_mapping() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());
        assert_eq!(engine.select(BufferId::A, SelectionRange { start: 0, end: 3 }), None);
    }

    // ========== Settings ==========

    #[tokio::test(start_paused = true)]
    async fn test_formality_applies_to_next_request() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.set_formality(Formality::Formal);
        engine.on_text_changed(BufferId::A, "Salut.");
        engine.next_event().await.unwrap();
        assert_eq!(mock.calls()[0].formality, Formality::Formal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_language_cancels_and_updates_buffer() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());

        engine.on_text_changed(BufferId::A, "Hola");
        engine.set_language(BufferId::B, LanguageTag::new("de").unwrap());
        assert!(engine.is_idle());
        assert_eq!(engine.buffer(BufferId::B).language().as_str(), "de");

        engine.on_text_changed(BufferId::A, "Hola.");
        engine.next_event().await.unwrap();
        assert_eq!(engine.buffer(BufferId::B).content(), "Hola._de");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_debounce_changes_quiet_period() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());
        engine.set_debounce(Duration::from_millis(50));

        let start = tokio::time::Instant::now();
        engine.on_text_changed(BufferId::A, "Bonjour");
        engine.next_event().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_serializes() {
        let mock = Arc::new(MockProvider::new(MockMode::Suffix));
        let mut engine = engine_with(&mock, SessionConfig::default());
        engine.on_text_changed(BufferId::A, "Oui.");
        engine.next_event().await.unwrap();

        let json = serde_json::to_value(engine.snapshot()).unwrap();
        assert_eq!(json["a"]["content"], "Oui.");
        assert_eq!(json["b"]["content"], "Oui._en");
        assert_eq!(json["b"]["language"], "en");
        assert_eq!(json["mapping"][0]["source"], "Oui.");
        assert_eq!(json["mapping_direction"], "AtoB");
        assert_eq!(json["formality"], "informal");
    }
}
