//! The chat client of one context (one tab).
//!
//! [`ChatClient`] owns the in-memory state, the session slot and the two
//! background tasks (sync loop and presence heartbeat), and exposes the
//! domain operations the view calls. Every operation is a read-modify-write
//! against the shared store document: `load()`, mutate, `save()`. Nothing
//! coordinates concurrent writers in other contexts; the last save wins.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use kominukator_shared::{Attachment, Avatar, Channel, Message, MessageId, User};
use kominukator_store::{DocumentStore, FileBackend, SessionSlot, SessionStore, StorageScope};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::events::{emit_event, ClientEvent};
use crate::heartbeat::spawn_heartbeat;
use crate::state::{lock_state, ChatSnapshot, ClientState};
use crate::sync::{bootstrap, reconcile, spawn_sync_loop, TaskHandle};

const EVENT_CAPACITY: usize = 64;

pub struct ChatClient {
    store: Arc<dyn DocumentStore>,
    session: Box<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    config: ClientConfig,
    state: Arc<Mutex<ClientState>>,
    events: broadcast::Sender<ClientEvent>,
    sync_task: Option<TaskHandle>,
    heartbeat_task: Option<TaskHandle>,
}

impl ChatClient {
    /// Bootstrap the store, load it into memory and restore a saved session.
    ///
    /// Background tasks are not started until [`start`](Self::start).
    pub fn new(
        store: Arc<dyn DocumentStore>,
        session: Box<dyn SessionStore>,
        config: ClientConfig,
    ) -> Result<Self> {
        Self::with_clock(store, session, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn DocumentStore>,
        session: Box<dyn SessionStore>,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        bootstrap(store.as_ref(), clock.now())?;

        let document = store.load();
        let user = session.load();
        if let Some(user) = &user {
            info!(user = %user.id.short(), nickname = %user.nickname, "Session restored");
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            store,
            session,
            clock,
            config,
            state: Arc::new(Mutex::new(ClientState::new(document, user))),
            events,
            sync_task: None,
            heartbeat_task: None,
        })
    }

    /// Open a client whose store lives in `config.data_dir` and whose session
    /// lives in the directory of `tab`.
    ///
    /// Separate processes do not share change notifications, so on-disk
    /// clients observe each other through the polling interval.
    pub fn open_on_disk(config: ClientConfig, tab: &str) -> Result<Self> {
        let scope = StorageScope::new(FileBackend::open(config.store_dir())?);
        let store = scope.document_store(config.store_key.clone());
        let session = SessionSlot::new(
            FileBackend::open(config.tab_dir(tab)?)?,
            config.session_key.clone(),
        );

        debug!(tab, data_dir = %config.data_dir.display(), "Opening on-disk client");
        Self::new(Arc::new(store), Box::new(session), config)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Spawn the sync loop, and the heartbeat if a user is logged in.
    ///
    /// Must be called from within a Tokio runtime. Calling it twice is a no-op.
    pub fn start(&mut self) {
        if self.sync_task.is_some() {
            return;
        }

        self.sync_task = Some(spawn_sync_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.state),
            self.events.clone(),
            self.config.poll_interval,
        ));
        self.restart_heartbeat();
    }

    /// Abort both background tasks. Also done on drop.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
        if let Some(task) = self.sync_task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.sync_task.is_some()
    }

    fn restart_heartbeat(&mut self) {
        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
        if !self.is_running() {
            return;
        }
        let Some(user_id) = self.current_user().map(|u| u.id) else {
            return;
        };
        self.heartbeat_task = Some(spawn_heartbeat(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            user_id,
            self.config.heartbeat_interval,
        ));
    }

    // -----------------------------------------------------------------------
    // Domain operations
    // -----------------------------------------------------------------------

    /// Log in as `nickname`, registering it on first use.
    ///
    /// An existing nickname is a login, not a conflict: the user keeps its id
    /// and gets the new avatar. Input validation is the caller's job.
    pub fn login(&mut self, nickname: &str, avatar: Avatar) -> Result<User> {
        let now = self.clock.now();
        let mut doc = self.store.load();

        let user = match doc.users.iter_mut().find(|u| u.nickname == nickname) {
            Some(existing) => {
                existing.avatar = avatar;
                existing.last_active = Some(now);
                existing.clone()
            }
            None => {
                let user = User::register(nickname, avatar, now);
                doc.users.push(user.clone());
                info!(user = %user.id.short(), nickname, "Registered new user");
                user
            }
        };

        self.store.save(&doc)?;
        lock_state(&self.state).apply(doc);

        if let Err(e) = self.session.save(&user) {
            warn!(user = %user.id.short(), error = %e, "Session write failed, login not completed");
            return Err(e.into());
        }
        lock_state(&self.state).user = Some(user.clone());

        info!(user = %user.id.short(), nickname, "Logged in");
        emit_event(
            &self.events,
            ClientEvent::LoggedIn {
                user_id: user.id.clone(),
            },
        );
        self.restart_heartbeat();

        Ok(user)
    }

    /// Forget the current user in this context. The store is untouched.
    pub fn logout(&mut self) -> Result<()> {
        let previous = {
            let mut state = lock_state(&self.state);
            state.active_chat = Channel::Global;
            state.user.take()
        };

        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
        self.session.clear()?;

        if let Some(user) = previous {
            info!(user = %user.id.short(), "Logged out");
        }
        emit_event(&self.events, ClientEvent::LoggedOut);
        Ok(())
    }

    /// Switch the visible conversation. In-memory only.
    pub fn select_chat(&self, channel: Channel) {
        lock_state(&self.state).active_chat = channel.clone();
        emit_event(&self.events, ClientEvent::ChatSelected(channel));
    }

    /// Post a message into the active chat.
    ///
    /// Returns `None` without writing when nobody is logged in or there is
    /// neither text nor an attachment.
    pub fn send_message(
        &self,
        text: Option<String>,
        reply_to: Option<MessageId>,
        attachment: Option<Attachment>,
    ) -> Result<Option<Message>> {
        let (sender, channel) = {
            let state = lock_state(&self.state);
            match &state.user {
                Some(user) => (user.id.clone(), state.active_chat.clone()),
                None => return Ok(None),
            }
        };

        let text = text.filter(|t| !t.is_empty());
        if text.is_none() && attachment.is_none() {
            return Ok(None);
        }

        let message = Message::compose(
            sender,
            &channel,
            text,
            reply_to,
            attachment,
            self.clock.now(),
        );

        let mut doc = self.store.load();
        doc.messages.push(message.clone());
        self.store.save(&doc)?;
        lock_state(&self.state).apply(doc);

        debug!(id = %message.id, channel = %channel, "Message sent");
        Ok(Some(message))
    }

    /// Delete a message sent by the current user.
    ///
    /// Returns `false` without writing if the message is unknown or belongs to
    /// someone else. The check runs only in this client.
    pub fn delete_message(&self, id: &MessageId) -> Result<bool> {
        let Some(me) = self.current_user().map(|u| u.id) else {
            return Ok(false);
        };

        let mut doc = self.store.load();
        let Some(pos) = doc
            .messages
            .iter()
            .position(|m| &m.id == id && m.sender_id == me)
        else {
            debug!(id = %id, "Delete ignored, not found or not owned");
            return Ok(false);
        };

        doc.messages.remove(pos);
        self.store.save(&doc)?;
        lock_state(&self.state).apply(doc);

        debug!(id = %id, "Message deleted");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> ChatSnapshot {
        lock_state(&self.state).snapshot()
    }

    pub fn current_user(&self) -> Option<User> {
        lock_state(&self.state).user.clone()
    }

    pub fn active_chat(&self) -> Channel {
        lock_state(&self.state).active_chat.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Reload the store document now instead of waiting for the sync loop.
    pub fn reconcile_now(&self) {
        reconcile(self.store.as_ref(), &self.state, &self.events);
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::filter::reply_target;
    use chrono::{DateTime, TimeZone, Utc};
    use kominukator_shared::constants::{SESSION_KEY, STORE_KEY};
    use kominukator_shared::{AttachmentKind, UserId};
    use kominukator_store::MemoryBackend;
    use std::time::Duration;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    /// A tab: its own session slot, the scope's shared store.
    fn tab(scope: &StorageScope<MemoryBackend>, clock: &ManualClock) -> ChatClient {
        ChatClient::with_clock(
            Arc::new(scope.document_store(STORE_KEY)),
            Box::new(SessionSlot::ephemeral(SESSION_KEY)),
            ClientConfig::default(),
            Arc::new(clock.clone()),
        )
        .unwrap()
    }

    fn text(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn empty_store_is_seeded_with_alice_and_bob() {
        let scope = StorageScope::new(MemoryBackend::new());
        let client = tab(&scope, &ManualClock::new(t0()));

        let snapshot = client.snapshot();
        let names: Vec<_> = snapshot.users.iter().map(|u| u.nickname.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.user, None);
        assert_eq!(snapshot.active_chat, Channel::Global);
    }

    #[test]
    fn second_login_reuses_id_and_overwrites_avatar() {
        let scope = StorageScope::new(MemoryBackend::new());
        let clock = ManualClock::new(t0());
        let mut client = tab(&scope, &clock);

        let first = client.login("Carol", Avatar::new("🦊", "#FF7043")).unwrap();
        assert_eq!(client.snapshot().users.len(), 3);

        clock.advance(chrono::Duration::minutes(5));
        let second = client.login("Carol", Avatar::new("🐼", "#26A69A")).unwrap();

        assert_eq!(first.id, second.id);
        let stored = scope.document_store(STORE_KEY).load();
        assert_eq!(stored.users.len(), 3);
        let carol = stored.user(&first.id).unwrap();
        assert_eq!(carol.avatar, Avatar::new("🐼", "#26A69A"));
        assert_eq!(carol.last_active, Some(clock.now()));
    }

    struct ReadOnlySession;

    impl SessionStore for ReadOnlySession {
        fn load(&self) -> Option<User> {
            None
        }
        fn save(&self, _user: &User) -> kominukator_store::Result<()> {
            Err(kominukator_store::StoreError::Backend("read-only".into()))
        }
        fn clear(&self) -> kominukator_store::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_session_write_still_reflects_store() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut client = ChatClient::with_clock(
            Arc::new(scope.document_store(STORE_KEY)),
            Box::new(ReadOnlySession),
            ClientConfig::default(),
            Arc::new(ManualClock::new(t0())),
        )
        .unwrap();

        assert!(client.login("Carol", Avatar::default()).is_err());

        let snapshot = client.snapshot();
        assert_eq!(snapshot.user, None);
        assert!(snapshot.users.iter().any(|u| u.nickname == "Carol"));
        assert_eq!(snapshot.users, scope.document_store(STORE_KEY).load().users);
    }

    #[test]
    fn logging_in_as_demo_user_keeps_fixed_id() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut client = tab(&scope, &ManualClock::new(t0()));
        let bob = client.login("Bob", Avatar::default()).unwrap();
        assert_eq!(bob.id, UserId::from("u2"));
    }

    #[test]
    fn global_message_is_visible_to_every_user() {
        let scope = StorageScope::new(MemoryBackend::new());
        let clock = ManualClock::new(t0());
        let mut alice = tab(&scope, &clock);
        let mut bob = tab(&scope, &clock);
        alice.login("Alice", Avatar::default()).unwrap();
        bob.login("Bob", Avatar::default()).unwrap();

        let sent = alice.send_message(text("hi all"), None, None).unwrap().unwrap();
        assert_eq!(sent.recipient_id, None);

        bob.reconcile_now();
        let snapshot = bob.snapshot();
        let thread = snapshot.thread();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, sent.id);
    }

    #[test]
    fn direct_message_is_visible_only_to_the_pair() {
        let scope = StorageScope::new(MemoryBackend::new());
        let clock = ManualClock::new(t0());
        let mut alice = tab(&scope, &clock);
        let mut bob = tab(&scope, &clock);
        let mut carol = tab(&scope, &clock);
        let a = alice.login("Alice", Avatar::default()).unwrap();
        let b = bob.login("Bob", Avatar::default()).unwrap();
        carol.login("Carol", Avatar::default()).unwrap();

        alice.select_chat(Channel::Direct(b.id.clone()));
        let dm = alice.send_message(text("psst"), None, None).unwrap().unwrap();
        assert_eq!(dm.recipient_id, Some(b.id.clone()));
        assert_eq!(alice.snapshot().thread().len(), 1);

        bob.reconcile_now();
        bob.select_chat(Channel::Direct(a.id.clone()));
        assert_eq!(bob.snapshot().thread().len(), 1);
        bob.select_chat(Channel::Global);
        assert!(bob.snapshot().thread().is_empty());

        carol.reconcile_now();
        carol.select_chat(Channel::Direct(a.id.clone()));
        assert!(carol.snapshot().thread().is_empty());
        carol.select_chat(Channel::Direct(b.id));
        assert!(carol.snapshot().thread().is_empty());
    }

    #[test]
    fn delete_only_removes_own_messages() {
        let scope = StorageScope::new(MemoryBackend::new());
        let clock = ManualClock::new(t0());
        let mut alice = tab(&scope, &clock);
        let mut bob = tab(&scope, &clock);
        alice.login("Alice", Avatar::default()).unwrap();
        bob.login("Bob", Avatar::default()).unwrap();

        let msg = alice.send_message(text("mine"), None, None).unwrap().unwrap();
        let store = scope.document_store(STORE_KEY);

        let before = store.load();
        assert!(!bob.delete_message(&msg.id).unwrap());
        assert!(!bob.delete_message(&MessageId::from("missing")).unwrap());
        assert_eq!(store.load(), before);

        assert!(alice.delete_message(&msg.id).unwrap());
        assert!(store.load().messages.is_empty());
        assert!(!alice.delete_message(&msg.id).unwrap());
    }

    #[test]
    fn send_then_delete_leaves_global_channel_empty() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut alice = tab(&scope, &ManualClock::new(t0()));
        alice.login("Alice", Avatar::default()).unwrap();

        let msg = alice.send_message(text("hi"), None, None).unwrap().unwrap();
        assert_eq!(alice.snapshot().thread().len(), 1);
        alice.delete_message(&msg.id).unwrap();
        assert!(alice.snapshot().thread().is_empty());
    }

    #[test]
    fn reply_to_deleted_message_still_sends() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut alice = tab(&scope, &ManualClock::new(t0()));
        alice.login("Alice", Avatar::default()).unwrap();

        let original = alice.send_message(text("first"), None, None).unwrap().unwrap();
        alice.delete_message(&original.id).unwrap();

        let reply = alice
            .send_message(text("re: first"), Some(original.id.clone()), None)
            .unwrap()
            .unwrap();
        let again = alice
            .send_message(text("still replying"), Some(original.id.clone()), None)
            .unwrap()
            .unwrap();

        let snapshot = alice.snapshot();
        assert_eq!(snapshot.thread().len(), 2);
        assert_eq!(reply_target(&snapshot.messages, &reply), None);
        assert_eq!(snapshot.reply_preview(&again), None);
    }

    #[test]
    fn reply_preview_resolves_existing_target() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut alice = tab(&scope, &ManualClock::new(t0()));
        alice.login("Alice", Avatar::default()).unwrap();

        let original = alice
            .send_message(text("a fairly long message that will be cut off"), None, None)
            .unwrap()
            .unwrap();
        let reply = alice
            .send_message(text("agreed"), Some(original.id), None)
            .unwrap()
            .unwrap();

        let preview = alice.snapshot().reply_preview(&reply).unwrap();
        assert_eq!(preview.sender_name.as_deref(), Some("Alice"));
        assert_eq!(preview.excerpt, "a fairly long message that wil");
    }

    #[test]
    fn send_is_a_no_op_without_user_or_content() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut client = tab(&scope, &ManualClock::new(t0()));

        assert!(client.send_message(text("hi"), None, None).unwrap().is_none());

        client.login("Alice", Avatar::default()).unwrap();
        assert!(client.send_message(None, None, None).unwrap().is_none());
        assert!(client.send_message(text(""), None, None).unwrap().is_none());
        assert!(scope.document_store(STORE_KEY).load().messages.is_empty());

        let attachment = Attachment {
            kind: AttachmentKind::Image,
            name: "dot.png".into(),
            url: "data:image/png;base64,AA==".into(),
        };
        let sent = client
            .send_message(None, None, Some(attachment))
            .unwrap()
            .unwrap();
        assert!(sent.text.is_none());
        assert_eq!(client.snapshot().thread().len(), 1);
    }

    #[test]
    fn logout_resets_chat_and_clears_session() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let mut client = ChatClient::open_on_disk(config.clone(), "main").unwrap();
        let alice = client.login("Alice", Avatar::default()).unwrap();
        client.select_chat(Channel::Direct(UserId::from("u2")));
        drop(client);

        let mut restored = ChatClient::open_on_disk(config.clone(), "main").unwrap();
        assert_eq!(restored.current_user().map(|u| u.id), Some(alice.id));
        assert_eq!(restored.active_chat(), Channel::Global);

        let other_tab = ChatClient::open_on_disk(config.clone(), "other").unwrap();
        assert_eq!(other_tab.current_user(), None);

        restored.select_chat(Channel::Direct(UserId::from("u2")));
        restored.logout().unwrap();
        assert_eq!(restored.current_user(), None);
        assert_eq!(restored.active_chat(), Channel::Global);
        assert_eq!(restored.snapshot().users.len(), 2);
        drop(restored);

        let fresh = ChatClient::open_on_disk(config, "main").unwrap();
        assert_eq!(fresh.current_user(), None);
    }

    #[test]
    fn open_on_disk_rejects_bad_tab_names() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(ChatClient::open_on_disk(config, "../escape").is_err());
    }

    #[test]
    fn login_and_select_emit_events() {
        let scope = StorageScope::new(MemoryBackend::new());
        let mut client = tab(&scope, &ManualClock::new(t0()));
        let mut events = client.events();

        let user = client.login("Dave", Avatar::default()).unwrap();
        client.select_chat(Channel::Direct(UserId::from("u1")));
        client.logout().unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            ClientEvent::LoggedIn { user_id: user.id }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ClientEvent::ChatSelected(Channel::Direct(UserId::from("u1")))
        );
        assert_eq!(events.try_recv().unwrap(), ClientEvent::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn running_tab_sees_other_tab_through_sync_loop() {
        let scope = StorageScope::new(MemoryBackend::new());
        let clock = ManualClock::new(t0());
        let mut alice = tab(&scope, &clock);
        let mut bob = tab(&scope, &clock);
        alice.login("Alice", Avatar::default()).unwrap();
        bob.login("Bob", Avatar::default()).unwrap();
        bob.start();
        settle().await;

        alice.send_message(text("hello bob"), None, None).unwrap();
        settle().await;

        assert_eq!(bob.snapshot().thread().len(), 1);
        bob.shutdown();
        assert!(!bob.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_runs_while_logged_in() {
        let scope = StorageScope::new(MemoryBackend::new());
        let clock = ManualClock::new(t0());
        let mut alice = tab(&scope, &clock);
        let me = alice.login("Alice", Avatar::default()).unwrap();
        alice.start();
        settle().await;

        let store = scope.document_store(STORE_KEY);
        clock.advance(chrono::Duration::minutes(1));
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(
            store.load().user(&me.id).unwrap().last_active,
            Some(clock.now())
        );

        alice.logout().unwrap();
        let stamped = store.load().user(&me.id).unwrap().last_active;
        clock.advance(chrono::Duration::minutes(1));
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(store.load().user(&me.id).unwrap().last_active, stamped);
    }
}
