//! User profiles in the `users` collection, keyed by identity uid.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::identity::Identity;
use super::policy::Role;
use crate::content::Collection;
use crate::store::{DocumentStore, StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserProfile {
    /// The profile given to an identity seen for the first time.
    pub fn default_for(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone().unwrap_or_default(),
            role: Role::Read,
            display_name: None,
        }
    }
}

#[derive(Clone)]
pub struct ProfileDirectory {
    store: Arc<dyn DocumentStore>,
}

impl ProfileDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection() -> &'static str {
        Collection::Users.name()
    }

    pub async fn find(&self, uid: &str) -> StoreResult<Option<UserProfile>> {
        let Some(doc) = self.store.get(Self::collection(), uid).await? else {
            return Ok(None);
        };
        serde_json::from_value(Value::Object(doc.fields))
            .map(Some)
            .map_err(|source| StoreError::Decode {
                collection: Self::collection().to_string(),
                id: uid.to_string(),
                source,
            })
    }

    async fn write(&self, profile: &UserProfile) -> StoreResult<()> {
        let fields = match serde_json::to_value(profile) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(StoreError::NotAnObject(Self::collection().to_string())),
            Err(source) => {
                return Err(StoreError::Encode {
                    collection: Self::collection().to_string(),
                    source,
                })
            }
        };
        self.store.set(Self::collection(), &profile.uid, fields).await
    }

    /// Existing profile for `identity`, or a newly persisted read-only one.
    pub async fn resolve(&self, identity: &Identity) -> StoreResult<UserProfile> {
        if let Some(profile) = self.find(&identity.uid).await? {
            return Ok(profile);
        }

        let profile = UserProfile::default_for(identity);
        self.write(&profile).await?;
        tracing::info!(uid = %profile.uid, role = %profile.role, "created default user profile");
        Ok(profile)
    }

    /// Writes `profile` only if none exists yet for its uid. Returns whether it was written.
    pub async fn seed(&self, profile: &UserProfile) -> StoreResult<bool> {
        if self.find(&profile.uid).await?.is_some() {
            return Ok(false);
        }
        self.write(profile).await?;
        Ok(true)
    }
}
