//! Session Manager
//!
//! Tracks the identity reported by an [`IdentityProvider`] and the profile resolved for it.
//! The manager is the only writer of [`SessionState`]; readers take snapshots or subscribe.
//!
//! Every provider event gets a generation number. A profile resolution only publishes
//! while its generation is still current, and `sign_out` advances the generation itself,
//! so a slow lookup can never resurrect a session that has since changed.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::identity::{Identity, IdentityProvider};
use super::policy::Capabilities;
use super::profile::{ProfileDirectory, UserProfile};
use super::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Initializing,
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub loading: bool,
    pub user: Option<Identity>,
    pub profile: Option<UserProfile>,
    /// A profile lookup for `user` is in flight.
    #[serde(skip)]
    pub resolving: bool,
}

impl SessionState {
    fn initializing() -> Self {
        Self {
            loading: true,
            user: None,
            profile: None,
            resolving: false,
        }
    }

    fn anonymous() -> Self {
        Self {
            loading: false,
            user: None,
            profile: None,
            resolving: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.user, self.loading) {
            (_, true) => SessionPhase::Initializing,
            (None, false) => SessionPhase::Anonymous,
            (Some(_), false) => SessionPhase::Authenticated,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_profile(self.profile.as_ref())
    }

    /// Past initialization with no profile lookup outstanding.
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.resolving
    }
}

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Subscribes to `provider` and starts resolving profiles. Must be called inside a
    /// tokio runtime.
    pub fn start(provider: Arc<dyn IdentityProvider>, profiles: ProfileDirectory) -> Self {
        let (state, _) = watch::channel(SessionState::initializing());
        let state = Arc::new(state);
        let generation = Arc::new(AtomicU64::new(0));

        let listener = tokio::spawn(listen(
            provider.subscribe(),
            state.clone(),
            generation.clone(),
            profiles,
        ));

        Self {
            provider,
            state,
            generation,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Provider sign-in. Profile resolution follows asynchronously.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        match self.provider.sign_in(email, password).await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "signed in");
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!("sign-in failed: {}", e);
                Err(e)
            }
        }
    }

    /// Clears the local profile at once, then ends the provider session.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.profile = None;
            s.resolving = false;
        });
        self.provider.sign_out().await
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Waits until the state is settled, or `timeout` passes. Returns the state either way.
    pub async fn wait_until_resolved(&self, timeout: Duration) -> SessionState {
        self.wait_until(timeout, SessionState::is_settled).await
    }

    /// Waits until `uid` is the current user and its profile lookup has finished.
    pub async fn wait_for_user(&self, uid: &str, timeout: Duration) -> SessionState {
        self.wait_until(timeout, |s| {
            s.is_settled() && s.user.as_ref().is_some_and(|u| u.uid == uid)
        })
        .await
    }

    async fn wait_until(
        &self,
        timeout: Duration,
        ready: impl FnMut(&SessionState) -> bool,
    ) -> SessionState {
        let mut rx = self.state.subscribe();
        let state = match tokio::time::timeout(timeout, rx.wait_for(ready)).await {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) | Err(_) => {
                tracing::debug!("session did not settle within {:?}", timeout);
                self.snapshot()
            }
        };
        state
    }

    /// Detaches from the provider. Pending resolutions are invalidated.
    pub fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let handle = match self.listener.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn listen(
    mut events: watch::Receiver<Option<Identity>>,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    profiles: ProfileDirectory,
) {
    loop {
        let identity = events.borrow_and_update().clone();
        let seq = generation.fetch_add(1, Ordering::SeqCst) + 1;

        match identity {
            None => {
                publish_if_current(&state, &generation, seq, |s| *s = SessionState::anonymous());
            }
            Some(identity) => {
                let entered = publish_if_current(&state, &generation, seq, |s| {
                    *s = SessionState {
                        loading: false,
                        user: Some(identity.clone()),
                        profile: None,
                        resolving: true,
                    };
                });
                if entered {
                    tokio::spawn(resolve_profile(
                        identity,
                        seq,
                        state.clone(),
                        generation.clone(),
                        profiles.clone(),
                    ));
                }
            }
        }

        if events.changed().await.is_err() {
            tracing::debug!("identity provider closed; session listener exiting");
            break;
        }
    }
}

async fn resolve_profile(
    identity: Identity,
    seq: u64,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    profiles: ProfileDirectory,
) {
    let profile = match profiles.resolve(&identity).await {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::error!(uid = %identity.uid, "failed to resolve user profile: {}", e);
            None
        }
    };

    let applied = publish_if_current(&state, &generation, seq, |s| {
        s.profile = profile;
        s.resolving = false;
    });
    if !applied {
        tracing::debug!(uid = %identity.uid, "discarding stale profile resolution");
    }
}

/// Applies `update` only while `seq` is the newest generation. The check runs under the
/// channel's write lock, so it is ordered against every other state write.
fn publish_if_current(
    state: &watch::Sender<SessionState>,
    generation: &AtomicU64,
    seq: u64,
    update: impl FnOnce(&mut SessionState),
) -> bool {
    let mut update = Some(update);
    state.send_if_modified(|s| {
        if generation.load(Ordering::SeqCst) != seq {
            return false;
        }
        if let Some(update) = update.take() {
            update(s);
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{AccountDirectory, PasswordIdentityProvider};
    use crate::auth::policy::Role;
    use crate::store::testing::GatedStore;
    use crate::store::{DocumentStore, MemoryDocumentStore};

    const WAIT: Duration = Duration::from_secs(2);

    async fn provider() -> Arc<PasswordIdentityProvider> {
        let accounts = Arc::new(AccountDirectory::new());
        accounts
            .add_password("editor@example.com", "s3cret", 4)
            .await
            .unwrap();
        Arc::new(PasswordIdentityProvider::new(accounts))
    }

    #[tokio::test]
    async fn test_initializing_then_anonymous() {
        let store = Arc::new(MemoryDocumentStore::new());
        let manager = SessionManager::start(provider().await, ProfileDirectory::new(store));

        assert_eq!(manager.snapshot().phase(), SessionPhase::Initializing);

        let state = manager.wait_until_resolved(WAIT).await;
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(state.profile.is_none());
        assert_eq!(state.capabilities(), Capabilities::default());
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_read_profile() {
        let store = Arc::new(MemoryDocumentStore::new());
        let manager =
            SessionManager::start(provider().await, ProfileDirectory::new(store.clone()));

        let identity = manager.sign_in("editor@example.com", "s3cret").await.unwrap();
        let state = manager.wait_for_user(&identity.uid, WAIT).await;

        assert_eq!(state.phase(), SessionPhase::Authenticated);
        let profile = state.profile.clone().unwrap();
        assert_eq!(profile.uid, identity.uid);
        assert_eq!(profile.email, "editor@example.com");
        assert_eq!(profile.role, Role::Read);
        assert!(!state.capabilities().can_write);
        assert_eq!(store.len("users").await, 1);
    }

    #[tokio::test]
    async fn test_failed_sign_in_returns_message() {
        let store = Arc::new(MemoryDocumentStore::new());
        let manager = SessionManager::start(provider().await, ProfileDirectory::new(store));

        let err = manager
            .sign_in("editor@example.com", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_sign_out_clears_profile_immediately() {
        let store = Arc::new(MemoryDocumentStore::new());
        let manager = SessionManager::start(provider().await, ProfileDirectory::new(store));

        let identity = manager.sign_in("editor@example.com", "s3cret").await.unwrap();
        let state = manager.wait_for_user(&identity.uid, WAIT).await;
        assert!(state.profile.is_some());

        manager.sign_out().await.unwrap();
        assert!(manager.snapshot().profile.is_none());

        let state = manager.wait_until(WAIT, |s| s.user.is_none()).await;
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_stale_resolution_does_not_overwrite_sign_out() {
        let memory = Arc::new(MemoryDocumentStore::new());
        let gated = Arc::new(GatedStore::new(memory.clone(), "users"));
        let manager =
            SessionManager::start(provider().await, ProfileDirectory::new(gated.clone()));

        manager.sign_in("editor@example.com", "s3cret").await.unwrap();
        let state = manager
            .wait_until(WAIT, |s| s.user.is_some() && s.resolving)
            .await;
        assert!(state.user.is_some());

        manager.sign_out().await.unwrap();
        manager.wait_until(WAIT, |s| s.user.is_none()).await;

        // let the held lookup finish
        gated.release(1);
        let mut rx = manager.subscribe();
        let late = tokio::time::timeout(
            Duration::from_millis(200),
            rx.wait_for(|s| s.profile.is_some()),
        )
        .await;
        assert!(late.is_err());

        assert_eq!(memory.len("users").await, 1);
        let state = manager.snapshot();
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn test_resolution_failure_leaves_no_profile() {
        let memory = Arc::new(MemoryDocumentStore::new());
        let accounts = Arc::new(AccountDirectory::new());
        let uid = accounts.add_password("bad@example.com", "pw", 4).await.unwrap();
        memory
            .set(
                "users",
                &uid,
                serde_json::json!({ "uid": uid, "email": "bad@example.com", "role": "owner" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        let provider = Arc::new(PasswordIdentityProvider::new(accounts));
        let manager = SessionManager::start(provider, ProfileDirectory::new(memory));

        manager.sign_in("bad@example.com", "pw").await.unwrap();
        let state = manager.wait_for_user(&uid, WAIT).await;
        assert_eq!(state.phase(), SessionPhase::Authenticated);
        assert!(state.profile.is_none());
        assert!(!state.capabilities().can_write);
    }

    #[tokio::test]
    async fn test_shutdown_detaches_listener() {
        let store = Arc::new(MemoryDocumentStore::new());
        let provider = provider().await;
        let manager = SessionManager::start(provider.clone(), ProfileDirectory::new(store));
        manager.wait_until_resolved(WAIT).await;

        manager.shutdown();
        provider.sign_in("editor@example.com", "s3cret").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(manager.snapshot().phase(), SessionPhase::Anonymous);
    }
}
