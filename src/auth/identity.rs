//! Identity provider: email + password sign-in and a stream of identity changes.

use async_trait::async_trait;
use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use super::AuthError;

/// A signed-in identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Current identity plus every later change. The value present at subscription
    /// time counts as the provider's first report.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Stable uid for an account: hex SHA-256 of the lowercased email, truncated.
pub fn uid_for_email(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..28].to_string()
}

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
}

/// Known accounts and their bcrypt hashes, keyed by lowercased email.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account from an existing bcrypt hash. Returns its uid.
    pub async fn add_hashed(&self, email: &str, password_hash: &str) -> String {
        let key = email.trim().to_lowercase();
        let uid = uid_for_email(&key);
        self.accounts.write().await.insert(
            key.clone(),
            Account {
                uid: uid.clone(),
                email: key,
                password_hash: password_hash.to_string(),
            },
        );
        uid
    }

    /// Hashes `password` with `cost` off the async executor, then registers it.
    pub async fn add_password(
        &self,
        email: &str,
        password: &str,
        cost: u32,
    ) -> Result<String, AuthError> {
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| AuthError::Provider(format!("hashing task failed: {}", e)))?
            .map_err(|e| AuthError::Provider(format!("failed to hash password: {}", e)))?;
        Ok(self.add_hashed(email, &password_hash).await)
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Checks credentials; bcrypt runs on the blocking pool.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .accounts
            .read()
            .await
            .get(&email.trim().to_lowercase())
            .cloned();

        let Some(account) = account else {
            tracing::warn!("Login attempt for unknown user: {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = account.password_hash.clone();
        let password_ok = tokio::task::spawn_blocking(move || verify(&password, &hash).unwrap_or(false))
            .await
            .unwrap_or(false);

        if !password_ok {
            tracing::warn!("Failed login attempt for: {}", account.email);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity {
            uid: account.uid,
            email: Some(account.email),
        })
    }
}

/// One provider session over a shared [`AccountDirectory`], comparable to one
/// client SDK instance: it holds at most one signed-in identity.
pub struct PasswordIdentityProvider {
    accounts: Arc<AccountDirectory>,
    current: watch::Sender<Option<Identity>>,
}

impl PasswordIdentityProvider {
    pub fn new(accounts: Arc<AccountDirectory>) -> Self {
        let (current, _) = watch::channel(None);
        Self { accounts, current }
    }
}

fn check_credentials_shape(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if !email.contains('@') {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

#[async_trait]
impl IdentityProvider for PasswordIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        check_credentials_shape(email, password)?;
        let identity = self.accounts.authenticate(email, password).await?;
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    async fn directory() -> Arc<AccountDirectory> {
        let accounts = Arc::new(AccountDirectory::new());
        accounts
            .add_password("Admin@Example.com", "correct horse", TEST_COST)
            .await
            .unwrap();
        accounts
    }

    #[test]
    fn test_uid_for_email_is_stable_and_case_insensitive() {
        let a = uid_for_email("Admin@Example.com");
        let b = uid_for_email(" admin@example.com ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 28);
        assert_ne!(a, uid_for_email("other@example.com"));
    }

    #[tokio::test]
    async fn test_sign_in_publishes_identity() {
        let provider = PasswordIdentityProvider::new(directory().await);
        let mut rx = provider.subscribe();
        assert_eq!(*rx.borrow_and_update(), None);

        let identity = provider
            .sign_in("admin@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(identity.uid, uid_for_email("admin@example.com"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&identity));

        provider.sign_out().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected_without_event() {
        let provider = PasswordIdentityProvider::new(directory().await);
        let mut rx = provider.subscribe();
        rx.borrow_and_update();

        let err = provider
            .sign_in("admin@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_credential_shape_errors() {
        let provider = PasswordIdentityProvider::new(directory().await);
        assert_eq!(
            provider.sign_in("", "pw").await.unwrap_err(),
            AuthError::MissingCredentials
        );
        assert_eq!(
            provider.sign_in("no-at-sign", "pw").await.unwrap_err(),
            AuthError::InvalidEmail
        );
    }

    #[tokio::test]
    async fn test_unknown_account_is_invalid_credentials() {
        let provider = PasswordIdentityProvider::new(directory().await);
        assert_eq!(
            provider
                .sign_in("nobody@example.com", "pw")
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        );
    }
}
