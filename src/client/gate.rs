use tokio::sync::broadcast;

use crate::client::api::DirectoryApi;
use crate::client::session::{KeyValueStorage, SessionRecord, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedOut,
}

/// Broadcast channel for session lifecycle notifications. The shell emits
/// `SignedOut` on explicit logout or when the remote layer reports expiry;
/// every mounted gate watch picks it up.
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit_signed_out(&self) {
        // No receivers is fine; nothing is mounted.
        let _ = self.tx.send(SessionEvent::SignedOut);
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

/// Strictness of an authorization gate. One implementation, two policies,
/// instead of two diverging guard components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolicy {
    /// Local record only, checked synchronously; never touches the remote
    /// layer. The admin surface accepts this gap.
    LocalOnly { redirect: &'static str },
    /// Local record, role match, and a live remote session. A desync (local
    /// flag set, remote session gone) clears the store and redirects
    /// silently; expiry is expected, not an error.
    Corroborated {
        required_role: &'static str,
        redirect: &'static str,
    },
}

impl GatePolicy {
    fn redirect(&self) -> &'static str {
        match self {
            GatePolicy::LocalOnly { redirect } => redirect,
            GatePolicy::Corroborated { redirect, .. } => redirect,
        }
    }
}

/// `Checking -> {Authenticated, Unauthenticated}`; an `Authenticated` gate
/// drops to `Unauthenticated` on a sign-out event at any time and never
/// transitions back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Authenticated(SessionRecord),
    Unauthenticated { redirect: &'static str },
}

pub struct AuthGate<A, S> {
    policy: GatePolicy,
    api: A,
    store: SessionStore<S>,
    events: SessionEvents,
}

impl<A, S> AuthGate<A, S>
where
    A: DirectoryApi,
    S: KeyValueStorage + Clone,
{
    pub fn new(policy: GatePolicy, api: A, store: SessionStore<S>, events: SessionEvents) -> Self {
        Self {
            policy,
            api,
            store,
            events,
        }
    }

    fn denied(&self) -> GateState {
        GateState::Unauthenticated {
            redirect: self.policy.redirect(),
        }
    }

    /// Resolve the gate once. For `LocalOnly` this never touches the
    /// network; for `Corroborated` it suspends on the remote session fetch.
    pub async fn resolve(&self) -> GateState {
        let Some(record) = self.store.load() else {
            return self.denied();
        };
        if !record.authenticated {
            return self.denied();
        }

        match self.policy {
            GatePolicy::LocalOnly { .. } => GateState::Authenticated(record),
            GatePolicy::Corroborated { required_role, .. } => {
                if record.role != required_role {
                    return self.denied();
                }
                let alive = match self.api.fetch_session(&record.token).await {
                    Ok(info) => info.authenticated,
                    Err(e) => {
                        tracing::warn!(error = %e, "session corroboration failed");
                        false
                    }
                };
                if !alive {
                    // Session desync: remote says no while the local flag is
                    // still set. Expected on expiry; clear and redirect.
                    self.store.clear();
                    return self.denied();
                }
                GateState::Authenticated(record)
            }
        }
    }

    /// Subscribe for the lifetime of the mounted gate. Dropping the watch
    /// releases the subscription.
    pub fn watch(&self) -> GateWatch<S> {
        GateWatch {
            rx: self.events.subscribe(),
            store: self.store.clone(),
            redirect: self.policy.redirect(),
            redirected: false,
        }
    }
}

pub struct GateWatch<S> {
    rx: broadcast::Receiver<SessionEvent>,
    store: SessionStore<S>,
    redirect: &'static str,
    redirected: bool,
}

impl<S: KeyValueStorage> GateWatch<S> {
    /// Wait for a sign-out event. The first one clears the local session and
    /// yields the redirect target; later events yield nothing, so a redirect
    /// happens exactly once per mounted watch.
    pub async fn redirect_on_sign_out(&mut self) -> Option<&'static str> {
        if self.redirected {
            return None;
        }
        loop {
            match self.rx.recv().await {
                Ok(SessionEvent::SignedOut) => {
                    self.store.clear();
                    self.redirected = true;
                    return Some(self.redirect);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::coordinator::mock::MockDirectory;
    use crate::client::session::{MemoryStorage, SESSION_KEY};
    use crate::models::SessionInfo;

    const USER_GATE: GatePolicy = GatePolicy::Corroborated {
        required_role: "user",
        redirect: "/user/login",
    };
    const ADMIN_GATE: GatePolicy = GatePolicy::LocalOnly { redirect: "/login" };

    fn user_record() -> SessionRecord {
        SessionRecord::new("13800000000".into(), "user".into(), "u-1".into(), "t-1".into())
    }

    fn live_session() -> SessionInfo {
        SessionInfo {
            authenticated: true,
            user_id: Some("u-1".into()),
            phone: Some("13800000000".into()),
            role: Some("user".into()),
        }
    }

    fn dead_session() -> SessionInfo {
        SessionInfo {
            authenticated: false,
            user_id: None,
            phone: None,
            role: None,
        }
    }

    #[tokio::test]
    async fn local_only_gate_ignores_the_remote_layer() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&SessionRecord::new(String::new(), "admin".into(), String::new(), String::new()));

        // No queued session responses: any remote call would fail the test
        // with a NOT_IMPLEMENTED error. LocalOnly must not make one.
        let gate = AuthGate::new(ADMIN_GATE, MockDirectory::default(), store, SessionEvents::new());
        assert!(matches!(gate.resolve().await, GateState::Authenticated(_)));
        assert!(gate.api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shell_holds_checking_until_resolution() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&user_record());

        let api = MockDirectory::default();
        *api.session_responses.lock().unwrap() = vec![Ok(live_session())];
        let gate = AuthGate::new(USER_GATE, api, store, SessionEvents::new());

        // The page renders a loading state in Checking and swaps it for the
        // resolved state; Checking is never re-entered.
        let mut state = GateState::Checking;
        assert_eq!(state, GateState::Checking);
        state = gate.resolve().await;
        assert!(matches!(state, GateState::Authenticated(_)));
    }

    #[tokio::test]
    async fn local_only_gate_redirects_without_a_record() {
        let store = SessionStore::new(MemoryStorage::new());
        let gate = AuthGate::new(ADMIN_GATE, MockDirectory::default(), store, SessionEvents::new());
        assert_eq!(
            gate.resolve().await,
            GateState::Unauthenticated { redirect: "/login" }
        );
    }

    #[tokio::test]
    async fn corroborated_gate_accepts_a_live_session() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&user_record());

        let api = MockDirectory::default();
        *api.session_responses.lock().unwrap() = vec![Ok(live_session())];
        let gate = AuthGate::new(USER_GATE, api, store, SessionEvents::new());

        assert!(matches!(gate.resolve().await, GateState::Authenticated(_)));
        assert_eq!(
            gate.api.calls.lock().unwrap().as_slice(),
            &["session:t-1".to_string()]
        );
    }

    #[tokio::test]
    async fn session_desync_clears_the_store_and_redirects() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&user_record());

        let api = MockDirectory::default();
        *api.session_responses.lock().unwrap() = vec![Ok(dead_session())];
        let gate = AuthGate::new(USER_GATE, api, store.clone(), SessionEvents::new());

        assert_eq!(
            gate.resolve().await,
            GateState::Unauthenticated { redirect: "/user/login" }
        );
        assert!(store.load().is_none());
        assert_eq!(storage.get(SESSION_KEY), None);
    }

    #[tokio::test]
    async fn wrong_role_is_denied_before_any_remote_call() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&SessionRecord::new("p".into(), "admin".into(), "a-1".into(), "t-2".into()));

        let gate = AuthGate::new(USER_GATE, MockDirectory::default(), store, SessionEvents::new());
        assert_eq!(
            gate.resolve().await,
            GateState::Unauthenticated { redirect: "/user/login" }
        );
        assert!(gate.api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_out_event_redirects_exactly_once() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&user_record());

        let events = SessionEvents::new();
        let gate = AuthGate::new(USER_GATE, MockDirectory::default(), store.clone(), events.clone());
        let mut watch = gate.watch();

        events.emit_signed_out();
        assert_eq!(watch.redirect_on_sign_out().await, Some("/user/login"));
        assert!(store.load().is_none());

        events.emit_signed_out();
        assert_eq!(watch.redirect_on_sign_out().await, None);
    }

    #[tokio::test]
    async fn a_fresh_watch_arms_again_after_remount() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        let events = SessionEvents::new();
        let gate = AuthGate::new(USER_GATE, MockDirectory::default(), store, events.clone());

        let mut first = gate.watch();
        events.emit_signed_out();
        assert!(first.redirect_on_sign_out().await.is_some());
        drop(first);

        let mut second = gate.watch();
        events.emit_signed_out();
        assert_eq!(second.redirect_on_sign_out().await, Some("/user/login"));
    }
}
