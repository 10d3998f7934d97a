//! Per-document conversation state
//!
//! [`ConversationStore`] owns the unbounded in-memory message log for every
//! document, the Gemini cache handle attached to it, and the set of
//! documents with a request in flight. The store is created by the
//! orchestrator and handed to whichever component needs it; nothing else
//! keeps conversation state.
//!
//! Only [`ConversationStore::persist`] and [`ConversationStore::clear`]
//! commit to the configuration store, and persistence keeps the most recent
//! [`PERSISTED_HISTORY_LIMIT`] messages per document.

use crate::config::ConfigStore;
use crate::config::constants::{defaults::PERSISTED_HISTORY_LIMIT, sentinels};
use crate::error::AssistantError;
use crate::llm::provider::Message;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of a document: its storage path or a reserved sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Documents without a storage path
    pub fn untitled() -> Self {
        Self::new(sentinels::UNTITLED)
    }

    /// The console scratch document
    pub fn console() -> Self {
        Self::new(sentinels::CONSOLE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-issued handle for a cached conversation prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHandle {
    pub name: String,
    /// Number of leading history messages the cache contains
    pub covered_messages: usize,
}

#[derive(Default)]
struct StoreState {
    histories: HashMap<DocumentId, Vec<Message>>,
    caches: HashMap<DocumentId, CacheHandle>,
    in_flight: HashSet<DocumentId>,
}

/// Explicit owner of conversation logs, cache handles and in-flight markers
pub struct ConversationStore {
    state: Mutex<StoreState>,
    config_store: Arc<dyn ConfigStore>,
}

impl ConversationStore {
    pub fn new(config_store: Arc<dyn ConfigStore>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            config_store,
        }
    }

    /// Full history for `document`, hydrated from persisted storage on first access
    pub fn get(&self, document: &DocumentId) -> Vec<Message> {
        let mut state = self.state.lock();
        self.hydrate(&mut state, document).clone()
    }

    /// Number of messages held for `document`
    pub fn len(&self, document: &DocumentId) -> usize {
        let mut state = self.state.lock();
        self.hydrate(&mut state, document).len()
    }

    /// Append a message; past messages are never removed from memory
    pub fn append(&self, document: &DocumentId, message: Message) {
        let mut state = self.state.lock();
        self.hydrate(&mut state, document).push(message);
    }

    /// The most recent `max_items` messages in order, or everything when
    /// `max_items <= 0`
    pub fn windowed(&self, document: &DocumentId, max_items: i64) -> Vec<Message> {
        let mut state = self.state.lock();
        let history = self.hydrate(&mut state, document);
        if max_items <= 0 {
            return history.clone();
        }
        let keep = usize::try_from(max_items).unwrap_or(usize::MAX);
        let start = history.len().saturating_sub(keep);
        history[start..].to_vec()
    }

    /// Messages from `start` to the end, used when a cache covers the prefix
    pub fn since(&self, document: &DocumentId, start: usize) -> Vec<Message> {
        let mut state = self.state.lock();
        let history = self.hydrate(&mut state, document);
        let start = start.min(history.len().saturating_sub(1));
        history[start..].to_vec()
    }

    /// Empty the log and drop the cache handle, then persist
    pub fn clear(&self, document: &DocumentId) -> bool {
        {
            let mut state = self.state.lock();
            state.histories.insert(document.clone(), Vec::new());
            state.caches.remove(document);
        }
        debug!(document = %document, "conversation cleared");
        self.persist()
    }

    /// Write the most recent messages of every known document to the store
    pub fn persist(&self) -> bool {
        let snapshot: Vec<(DocumentId, Vec<Message>)> = {
            let state = self.state.lock();
            state
                .histories
                .iter()
                .map(|(document, history)| {
                    let start = history.len().saturating_sub(PERSISTED_HISTORY_LIMIT);
                    (document.clone(), history[start..].to_vec())
                })
                .collect()
        };

        let mut config = self.config_store.load();
        for (document, tail) in snapshot {
            config.histories.insert(document.0, tail);
        }
        let saved = self.config_store.save(&config);
        if !saved {
            warn!("conversation history was not persisted");
        }
        saved
    }

    pub fn cache_handle(&self, document: &DocumentId) -> Option<CacheHandle> {
        self.state.lock().caches.get(document).cloned()
    }

    pub fn set_cache_handle(&self, document: &DocumentId, handle: CacheHandle) {
        self.state.lock().caches.insert(document.clone(), handle);
    }

    /// Forget the cache handle; returns whether one existed
    pub fn drop_cache_handle(&self, document: &DocumentId) -> bool {
        self.state.lock().caches.remove(document).is_some()
    }

    /// Mark `document` as having a request in flight.
    ///
    /// Fails with [`AssistantError::Busy`] when one is already running. The
    /// marker is released when the returned guard is dropped.
    pub fn begin_turn(&self, document: &DocumentId) -> Result<TurnGuard<'_>, AssistantError> {
        let mut state = self.state.lock();
        if !state.in_flight.insert(document.clone()) {
            return Err(AssistantError::Busy(document.clone()));
        }
        Ok(TurnGuard {
            store: self,
            document: document.clone(),
        })
    }

    pub fn is_in_flight(&self, document: &DocumentId) -> bool {
        self.state.lock().in_flight.contains(document)
    }

    fn hydrate<'a>(&self, state: &'a mut StoreState, document: &DocumentId) -> &'a mut Vec<Message> {
        state.histories.entry(document.clone()).or_insert_with(|| {
            self.config_store
                .load()
                .histories
                .remove(document.as_str())
                .unwrap_or_default()
        })
    }
}

/// In-flight marker for one document
pub struct TurnGuard<'a> {
    store: &'a ConversationStore,
    document: DocumentId,
}

impl TurnGuard<'_> {
    pub fn document(&self) -> &DocumentId {
        &self.document
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.store.state.lock().in_flight.remove(&self.document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssistantConfig, MemoryConfigStore};

    fn store_with(config: AssistantConfig) -> (Arc<MemoryConfigStore>, ConversationStore) {
        let backing = Arc::new(MemoryConfigStore::new(config));
        let store = ConversationStore::new(backing.clone());
        (backing, store)
    }

    fn numbered(count: usize) -> Vec<Message> {
        (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("m{i}"))
                } else {
                    Message::assistant(format!("m{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn get_hydrates_from_persisted_history() {
        let mut config = AssistantConfig::default();
        config
            .histories
            .insert("/a.rs".to_string(), vec![Message::user("persisted")]);
        let (_, store) = store_with(config);

        let doc = DocumentId::new("/a.rs");
        assert_eq!(store.get(&doc), vec![Message::user("persisted")]);
        assert!(store.get(&DocumentId::new("/b.rs")).is_empty());
    }

    #[test]
    fn windowed_returns_most_recent_in_order() {
        let (_, store) = store_with(AssistantConfig::default());
        let doc = DocumentId::untitled();
        for message in numbered(7) {
            store.append(&doc, message);
        }

        let window = store.windowed(&doc, 3);
        let contents: Vec<_> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m4", "m5", "m6"]);

        assert_eq!(store.windowed(&doc, 0).len(), 7);
        assert_eq!(store.windowed(&doc, -1).len(), 7);
        assert_eq!(store.windowed(&doc, 50).len(), 7);
    }

    #[test]
    fn windowed_length_is_min_of_limit_and_history() {
        let (_, store) = store_with(AssistantConfig::default());
        let doc = DocumentId::new("/w.rs");
        for len in 0..6usize {
            for limit in 1..8i64 {
                let expected = len.min(limit as usize);
                assert_eq!(store.windowed(&doc, limit).len(), expected);
            }
            store.append(&doc, Message::user(format!("m{len}")));
        }
    }

    #[test]
    fn clear_empties_history_and_drops_cache_handle() {
        let (backing, store) = store_with(AssistantConfig::default());
        let doc = DocumentId::new("/c.rs");
        store.append(&doc, Message::user("hello"));
        store.set_cache_handle(
            &doc,
            CacheHandle {
                name: "cachedContents/abc".to_string(),
                covered_messages: 1,
            },
        );

        assert!(store.clear(&doc));
        assert!(store.get(&doc).is_empty());
        assert_eq!(store.cache_handle(&doc), None);
        assert_eq!(backing.snapshot().histories["/c.rs"], Vec::<Message>::new());
    }

    #[test]
    fn persist_keeps_at_most_fifty_messages() {
        let (backing, store) = store_with(AssistantConfig::default());
        let doc = DocumentId::new("/long.rs");
        for message in numbered(120) {
            store.append(&doc, message);
        }

        assert!(store.persist());
        let persisted = &backing.snapshot().histories["/long.rs"];
        assert_eq!(persisted.len(), PERSISTED_HISTORY_LIMIT);
        assert_eq!(persisted.first().unwrap().content, "m70");
        assert_eq!(persisted.last().unwrap().content, "m119");
        // Memory keeps everything
        assert_eq!(store.len(&doc), 120);
    }

    #[test]
    fn persist_preserves_other_configuration() {
        let config = AssistantConfig {
            active_agent: "architect".to_string(),
            ..AssistantConfig::default()
        };
        let (backing, store) = store_with(config);
        store.append(&DocumentId::untitled(), Message::user("x"));
        store.persist();
        assert_eq!(backing.snapshot().active_agent, "architect");
    }

    #[test]
    fn since_keeps_at_least_the_newest_message() {
        let (_, store) = store_with(AssistantConfig::default());
        let doc = DocumentId::untitled();
        for message in numbered(5) {
            store.append(&doc, message);
        }
        assert_eq!(store.since(&doc, 3).len(), 2);
        assert_eq!(store.since(&doc, 9).len(), 1);
    }

    #[test]
    fn second_turn_on_same_document_is_rejected_until_guard_drops() {
        let (_, store) = store_with(AssistantConfig::default());
        let doc = DocumentId::new("/busy.rs");

        let guard = store.begin_turn(&doc).unwrap();
        assert!(store.is_in_flight(&doc));
        assert!(matches!(
            store.begin_turn(&doc),
            Err(AssistantError::Busy(_))
        ));
        assert!(store.begin_turn(&DocumentId::new("/other.rs")).is_ok());

        drop(guard);
        assert!(!store.is_in_flight(&doc));
        assert!(store.begin_turn(&doc).is_ok());
    }
}
