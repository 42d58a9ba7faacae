//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::{LoginRateLimiter, SessionRegistry};
use crate::compose::{AdminConsole, ContentCatalog, PublicComposer};
use crate::files::FileStore;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// "postgres" or "memory", reported by the health endpoints.
    pub store_backend: &'static str,
    pub public: PublicComposer,
    pub admin: AdminConsole,
    pub sessions: Arc<SessionRegistry>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        store_backend: &'static str,
        files: Arc<dyn FileStore>,
        sessions: Arc<SessionRegistry>,
        login_limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        Self {
            public: PublicComposer::new(ContentCatalog::new(store.clone())),
            admin: AdminConsole::new(store.clone(), files),
            store,
            store_backend,
            sessions,
            login_limiter,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::auth::{AccountDirectory, ProfileDirectory, Role, UserProfile};
    use crate::files::LocalFileStore;
    use crate::store::MemoryDocumentStore;

    pub const WRITER: (&str, &str) = ("writer@example.com", "writer-pw");
    pub const READER: (&str, &str) = ("reader@example.com", "reader-pw");

    /// State over a memory store with a `write` account and a `read` account.
    pub async fn state() -> (AppState, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        let accounts = Arc::new(AccountDirectory::new());
        let profiles = ProfileDirectory::new(store.clone());

        let writer_uid = accounts.add_password(WRITER.0, WRITER.1, 4).await.unwrap();
        accounts.add_password(READER.0, READER.1, 4).await.unwrap();
        profiles
            .seed(&UserProfile {
                uid: writer_uid,
                email: WRITER.0.to_string(),
                role: Role::Write,
                display_name: None,
            })
            .await
            .unwrap();

        let sessions = Arc::new(SessionRegistry::new(
            accounts,
            profiles,
            "test-secret",
            chrono::Duration::hours(1),
        ));
        let root = std::env::temp_dir().join(format!("portfolio-cms-routes-{}", uuid::Uuid::new_v4()));
        let files = Arc::new(LocalFileStore::new(root, "http://localhost:3001"));

        let state = AppState::new(
            store.clone(),
            "memory",
            files,
            sessions,
            Arc::new(LoginRateLimiter::new(100)),
        );
        (state, store)
    }
}
