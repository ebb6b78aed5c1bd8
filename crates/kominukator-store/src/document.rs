//! The shared store document and its change notifications.
//!
//! A [`StorageScope`] pairs a backend with a broadcast channel. Every
//! [`LocalStore`] opened from the same scope reads and writes the same slot
//! and hears every other store's saves, including its own. Stores opened
//! from different scopes (e.g. two processes sharing a directory) see each
//! other's writes only when they next load; the client's polling fallback
//! covers that case.
//!
//! There is no version counter and no lock. A load/mutate/save sequence in
//! one context can be overwritten by a concurrent sequence in another; the
//! last save wins.

use kominukator_shared::StoreDocument;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::backend::KvBackend;
use crate::error::Result;

const NOTIFY_CAPACITY: usize = 64;

/// Fired after every successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// Slot that was written.
    pub key: String,
}

/// Port used by the synchronization loop and the domain operations.
pub trait DocumentStore: Send + Sync {
    /// Read the current document. Absent or unparseable data yields an
    /// empty document; this never fails.
    fn load(&self) -> StoreDocument;

    /// Replace the persisted document wholesale and notify subscribers.
    fn save(&self, doc: &StoreDocument) -> Result<()>;

    /// Receive a [`StoreChange`] for every subsequent save in this scope.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// A backend plus the notification channel shared by all stores opened
/// from it.
#[derive(Debug, Clone)]
pub struct StorageScope<B> {
    backend: B,
    notifier: broadcast::Sender<StoreChange>,
}

impl<B: KvBackend + Clone> StorageScope<B> {
    pub fn new(backend: B) -> Self {
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self { backend, notifier }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open the document stored under `key`.
    pub fn document_store(&self, key: impl Into<String>) -> LocalStore<B> {
        LocalStore {
            backend: self.backend.clone(),
            key: key.into(),
            notifier: self.notifier.clone(),
        }
    }
}

/// JSON document in a single backend slot.
#[derive(Debug, Clone)]
pub struct LocalStore<B> {
    backend: B,
    key: String,
    notifier: broadcast::Sender<StoreChange>,
}

impl<B: KvBackend> LocalStore<B> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and parse the slot, surfacing failures. `Ok(None)` means the
    /// slot has never been written.
    pub fn try_load(&self) -> Result<Option<StoreDocument>> {
        let Some(raw) = self.backend.get_item(&self.key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

impl<B: KvBackend> DocumentStore for LocalStore<B> {
    fn load(&self) -> StoreDocument {
        match self.try_load() {
            Ok(Some(doc)) => doc,
            Ok(None) => StoreDocument::default(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "unreadable store document, treating as empty");
                StoreDocument::default()
            }
        }
    }

    fn save(&self, doc: &StoreDocument) -> Result<()> {
        let raw = serde_json::to_string(doc)?;
        self.backend.set_item(&self.key, &raw)?;

        debug!(
            key = %self.key,
            users = doc.users.len(),
            messages = doc.messages.len(),
            "saved store document"
        );

        // No subscribers is fine.
        let _ = self.notifier.send(StoreChange {
            key: self.key.clone(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::file::FileBackend;
    use chrono::{DateTime, Utc};
    use kominukator_shared::{demo_users, Channel, Message, UserId};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_doc() -> StoreDocument {
        let users = demo_users(now());
        let messages = vec![Message::compose(
            UserId::from("u1"),
            &Channel::Global,
            Some("hello".into()),
            None,
            None,
            now(),
        )];
        StoreDocument { users, messages }
    }

    #[test]
    fn save_then_load_round_trips() {
        let scope = StorageScope::new(MemoryBackend::new());
        let store = scope.document_store("kominukator_db");
        let doc = sample_doc();

        store.save(&doc).unwrap();
        assert_eq!(store.load(), doc);
    }

    #[test]
    fn absent_slot_loads_empty() {
        let scope = StorageScope::new(MemoryBackend::new());
        let store = scope.document_store("kominukator_db");
        assert_eq!(store.load(), StoreDocument::default());
        assert!(store.try_load().unwrap().is_none());
    }

    #[test]
    fn garbage_loads_empty() {
        let backend = MemoryBackend::new();
        backend.set_item("kominukator_db", "{not json").unwrap();
        let store = StorageScope::new(backend).document_store("kominukator_db");

        assert_eq!(store.load(), StoreDocument::default());
        assert!(store.try_load().is_err());
    }

    #[test]
    fn wrong_shape_loads_empty() {
        let backend = MemoryBackend::new();
        backend
            .set_item("kominukator_db", r#"{"users": 5, "messages": []}"#)
            .unwrap();
        let store = StorageScope::new(backend).document_store("kominukator_db");
        assert_eq!(store.load(), StoreDocument::default());
    }

    #[test]
    fn foreign_message_status_keeps_document() {
        let backend = MemoryBackend::new();
        backend
            .set_item(
                "kominukator_db",
                r##"{"users":[{"id":"u9","nickname":"Zed","avatar":{"emoji":"🐯","color":"#FFA726"},"lastActive":null}],
                    "messages":[{"id":"m1","senderId":"u9","recipientId":null,"text":"hey",
                                 "replyToId":null,"attachment":null,
                                 "timestamp":"2025-03-01T12:00:00Z","status":"delivered"}]}"##,
            )
            .unwrap();
        let store = StorageScope::new(backend).document_store("kominukator_db");

        let doc = store.load();
        assert_eq!(doc.users.len(), 1);
        assert_eq!(doc.messages.len(), 1);
        assert_eq!(doc.messages[0].text(), "hey");
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let backend = MemoryBackend::new();
        backend.set_item("kominukator_db", "{}").unwrap();
        let store = StorageScope::new(backend).document_store("kominukator_db");
        assert_eq!(store.load(), StoreDocument::default());
    }

    #[tokio::test]
    async fn save_notifies_every_store_in_scope() {
        let scope = StorageScope::new(MemoryBackend::new());
        let writer = scope.document_store("kominukator_db");
        let reader = scope.document_store("kominukator_db");
        let mut own_rx = writer.subscribe();
        let mut other_rx = reader.subscribe();

        writer.save(&sample_doc()).unwrap();

        assert_eq!(own_rx.recv().await.unwrap().key, "kominukator_db");
        assert_eq!(other_rx.recv().await.unwrap().key, "kominukator_db");
        assert_eq!(reader.load(), sample_doc());
    }

    #[tokio::test]
    async fn separate_scopes_do_not_share_notifications() {
        let backend = MemoryBackend::new();
        let a = StorageScope::new(backend.clone()).document_store("kominukator_db");
        let b = StorageScope::new(backend).document_store("kominukator_db");
        let mut rx = b.subscribe();

        a.save(&sample_doc()).unwrap();

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        // The data is still visible on the next load.
        assert_eq!(b.load(), sample_doc());
    }

    #[test]
    fn concurrent_read_modify_write_keeps_last_save() {
        let scope = StorageScope::new(MemoryBackend::new());
        let tab_a = scope.document_store("kominukator_db");
        let tab_b = scope.document_store("kominukator_db");
        tab_a.save(&StoreDocument::default()).unwrap();

        let mut doc_a = tab_a.load();
        let mut doc_b = tab_b.load();
        doc_a.messages.push(Message::compose(
            UserId::from("u1"),
            &Channel::Global,
            Some("from a".into()),
            None,
            None,
            now(),
        ));
        doc_b.messages.push(Message::compose(
            UserId::from("u2"),
            &Channel::Global,
            Some("from b".into()),
            None,
            None,
            now(),
        ));
        tab_a.save(&doc_a).unwrap();
        tab_b.save(&doc_b).unwrap();

        let stored = tab_a.load();
        assert_eq!(stored.messages.len(), 1);
        assert_eq!(stored.messages[0].text(), "from b");
    }

    #[test]
    fn file_backed_store_round_trips() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        let store = StorageScope::new(backend).document_store("kominukator_db");
        let doc = sample_doc();

        store.save(&doc).unwrap();

        let reopened = StorageScope::new(FileBackend::open(dir.path()).unwrap())
            .document_store("kominukator_db");
        assert_eq!(reopened.load(), doc);
    }
}
