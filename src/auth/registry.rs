/**
 * Session Registry
 * One SessionManager per API login, addressed by a signed JWT naming the session.
 */
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::identity::{AccountDirectory, Identity, PasswordIdentityProvider};
use super::profile::ProfileDirectory;
use super::session::SessionManager;
use super::AuthError;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // Identity uid
    pub sid: String,   // Session id
    pub email: String, // Identity email
    pub exp: i64,      // Expiry timestamp
    pub iat: i64,      // Issued at timestamp
}

struct SessionEntry {
    manager: Arc<SessionManager>,
    expires_at: i64,
}

/// A freshly created login session.
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
    pub identity: Identity,
    pub manager: Arc<SessionManager>,
}

pub struct SessionRegistry {
    accounts: Arc<AccountDirectory>,
    profiles: ProfileDirectory,
    secret: String,
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

fn generate_session_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// Sessions are stored under the SHA-256 of their id, never the id itself.
fn hash_session_id(sid: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sid.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl SessionRegistry {
    pub fn new(
        accounts: Arc<AccountDirectory>,
        profiles: ProfileDirectory,
        secret: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            profiles,
            secret: secret.into(),
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn accounts(&self) -> &Arc<AccountDirectory> {
        &self.accounts
    }

    /// Signs in through a new provider session and registers it.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let provider = Arc::new(PasswordIdentityProvider::new(self.accounts.clone()));
        let manager = Arc::new(SessionManager::start(provider, self.profiles.clone()));
        let identity = manager.sign_in(email, password).await?;

        let now = Utc::now();
        let expires_at = (now + self.ttl).timestamp();
        let sid = generate_session_id();
        let claims = Claims {
            sub: identity.uid.clone(),
            sid: sid.clone(),
            email: identity.email.clone().unwrap_or_default(),
            exp: expires_at,
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Token(e.to_string()))?;

        self.prune_expired().await;
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            hash_session_id(&sid),
            SessionEntry {
                manager: manager.clone(),
                expires_at,
            },
        );
        tracing::info!(uid = %identity.uid, active = sessions.len(), "session created");

        Ok(IssuedSession {
            token,
            expires_at,
            identity,
            manager,
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("rejected session token: {}", e);
            AuthError::InvalidSession
        })
    }

    /// The live session a bearer token names.
    pub async fn resolve(&self, token: &str) -> Result<Arc<SessionManager>, AuthError> {
        let claims = self.verify(token)?;
        let key = hash_session_id(&claims.sid);
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                Some(entry) if entry.expires_at > Utc::now().timestamp() => {
                    return Ok(entry.manager.clone())
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.prune_expired().await;
        }
        Err(AuthError::InvalidSession)
    }

    /// Drops every session past its expiry and stops its manager.
    /// Returns how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let live = entry.expires_at > now;
            if !live {
                entry.manager.shutdown();
            }
            live
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, active = sessions.len(), "expired sessions pruned");
        }
        removed
    }

    /// Signs the session out and forgets it.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.verify(token)?;
        let entry = self
            .sessions
            .write()
            .await
            .remove(&hash_session_id(&claims.sid))
            .ok_or(AuthError::InvalidSession)?;

        let result = entry.manager.sign_out().await;
        entry.manager.shutdown();
        tracing::info!(uid = %claims.sub, "session ended");
        result
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}
