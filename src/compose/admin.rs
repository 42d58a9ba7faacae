//! Admin Console
//!
//! Every mutation runs the same pipeline: capability gate, then form validation, then
//! the store. A rejected gate or form never reaches the store.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::ContentCatalog;
use crate::auth::Capabilities;
use crate::content::ordering::next_order;
use crate::content::{
    ContentKind, ContentRepository, Entry, ListItem, Project, Singleton, ValidationError,
};
use crate::files::{FileError, FileStore, UploadTarget};
use crate::store::{DocumentStore, Fields, StoreError};

const RESERVED_KEYS: &[&str] = &["id", "createdAt", "updatedAt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("You do not have permission to {0}.")]
    Forbidden(Action),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{label} {id} not found")]
    NotFound { label: &'static str, id: String },

    #[error("{notice}: {source}")]
    Store {
        notice: String,
        #[source]
        source: StoreError,
    },

    #[error("{notice}: {source}")]
    File {
        notice: String,
        #[source]
        source: FileError,
    },
}

impl AdminError {
    fn store(notice: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            notice: notice.into(),
            source,
        }
    }

    /// The notice shown to the editor. Store and file details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AdminError::Forbidden(_) | AdminError::Validation(_) => self.to_string(),
            AdminError::NotFound { label, .. } => format!("{label} not found."),
            AdminError::Store { notice, .. } => notice.clone(),
            AdminError::File { notice, source } => match source {
                FileError::TooLarge { .. } | FileError::UnsupportedType(_) | FileError::Empty => {
                    format!("{notice} {}", capitalize(&source.to_string()))
                }
                _ => notice.clone(),
            },
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

fn lower(label: &str) -> String {
    label.to_lowercase()
}

/// A toast-style confirmation for a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: &'static str,
    pub description: String,
}

impl Notice {
    fn new(title: &'static str, description: impl Into<String>) -> Self {
        Self {
            title,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub path: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub projects: usize,
    pub experiences: usize,
    pub education: usize,
    pub skills: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_projects: Vec<Entry<Project>>,
}

fn gate(caps: Capabilities, action: Action) -> Result<(), AdminError> {
    if caps.can_write {
        return Ok(());
    }
    tracing::warn!(action = %action, "mutation rejected: missing write capability");
    Err(AdminError::Forbidden(action))
}

/// Drops keys the repository owns from an incoming form.
fn strip_reserved(mut fields: Fields) -> Fields {
    for key in RESERVED_KEYS {
        fields.remove(*key);
    }
    fields
}

fn to_fields<K: ContentKind>(data: &K) -> Result<Fields, AdminError> {
    match serde_json::to_value(data) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AdminError::store(
            format!("Failed to save {}.", lower(K::LABEL)),
            StoreError::NotAnObject(K::COLLECTION.name().to_string()),
        )),
        Err(source) => Err(AdminError::store(
            format!("Failed to save {}.", lower(K::LABEL)),
            StoreError::Encode {
                collection: K::COLLECTION.name().to_string(),
                source,
            },
        )),
    }
}

/// Decodes a form into `K`, fills derived fields, validates and sanitizes it.
fn prepare<K: ContentKind>(fields: Fields) -> Result<K, AdminError> {
    let mut data: K = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        tracing::debug!(collection = %K::COLLECTION, "rejected form: {}", e);
        ValidationError::new(format!("Invalid {} data.", lower(K::LABEL)))
    })?;
    data.derive_defaults();
    data.validate()?;
    data.sanitize();
    Ok(data)
}

#[derive(Clone)]
pub struct AdminConsole {
    store: Arc<dyn DocumentStore>,
    catalog: ContentCatalog,
    files: Arc<dyn FileStore>,
}

impl AdminConsole {
    pub fn new(store: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self {
            catalog: ContentCatalog::new(store.clone()),
            store,
            files,
        }
    }

    fn repo<K: ContentKind>(&self) -> ContentRepository<K> {
        ContentRepository::new(self.store.clone())
    }

    /// Every item of a list kind, published or not.
    pub async fn list<K: ListItem>(&self) -> Result<Vec<Entry<K>>, AdminError> {
        self.repo::<K>().list_all().await.map_err(|e| {
            tracing::error!(collection = %K::COLLECTION, "failed to list content: {}", e);
            AdminError::store(format!("Failed to load {}.", lower(K::LABEL)), e)
        })
    }

    /// Creates an item from a form. Missing `order` becomes count + 1 and missing
    /// `published` becomes true.
    pub async fn create<K: ListItem>(
        &self,
        caps: Capabilities,
        form: Fields,
    ) -> Result<(String, Notice), AdminError> {
        gate(caps, Action::Edit)?;
        let repo = self.repo::<K>();
        let failed = || format!("Failed to save {}.", lower(K::LABEL));

        let mut fields = to_fields(&K::draft())?;
        if !form.contains_key("order") {
            let count = repo.count().await.map_err(|e| {
                tracing::error!(collection = %K::COLLECTION, "failed to count content: {}", e);
                AdminError::store(failed(), e)
            })?;
            fields.insert("order".to_string(), Value::from(next_order(count)));
        }
        fields.extend(strip_reserved(form));
        let data = prepare::<K>(fields)?;

        let id = repo.create(&data).await.map_err(|e| {
            tracing::error!(collection = %K::COLLECTION, "failed to create content: {}", e);
            AdminError::store(failed(), e)
        })?;
        Ok((
            id,
            Notice::new("Created!", format!("{} created successfully.", K::LABEL)),
        ))
    }

    /// Applies a partial form onto an existing item, revalidating the result.
    /// A field set to `null` is cleared.
    pub async fn update<K: ListItem>(
        &self,
        caps: Capabilities,
        id: &str,
        patch: Fields,
    ) -> Result<Notice, AdminError> {
        gate(caps, Action::Edit)?;
        let repo = self.repo::<K>();
        let failed = || format!("Failed to save {}.", lower(K::LABEL));

        let existing = repo
            .get(id)
            .await
            .map_err(|e| AdminError::store(failed(), e))?
            .ok_or_else(|| AdminError::NotFound {
                label: K::LABEL,
                id: id.to_string(),
            })?;

        let mut fields = to_fields(&existing.data)?;
        fields.extend(strip_reserved(patch));
        let data = prepare::<K>(fields)?;

        repo.replace(id, &data, existing.created_at).await.map_err(|e| {
            tracing::error!(collection = %K::COLLECTION, id = %id, "failed to update content: {}", e);
            if e.is_not_found() {
                AdminError::NotFound {
                    label: K::LABEL,
                    id: id.to_string(),
                }
            } else {
                AdminError::store(failed(), e)
            }
        })?;
        Ok(Notice::new(
            "Updated!",
            format!("{} updated successfully.", K::LABEL),
        ))
    }

    pub async fn delete<K: ListItem>(
        &self,
        caps: Capabilities,
        id: &str,
    ) -> Result<Notice, AdminError> {
        gate(caps, Action::Delete)?;
        self.repo::<K>().remove(id).await.map_err(|e| {
            tracing::error!(collection = %K::COLLECTION, id = %id, "failed to delete content: {}", e);
            AdminError::store(format!("Failed to delete {}.", lower(K::LABEL)), e)
        })?;
        Ok(Notice::new(
            "Deleted!",
            format!("{} deleted successfully.", K::LABEL),
        ))
    }

    /// The singleton document, published or not.
    pub async fn singleton<K: Singleton>(&self) -> Result<Option<Entry<K>>, AdminError> {
        self.repo::<K>().singleton().await.map_err(|e| {
            tracing::error!(collection = %K::COLLECTION, "failed to load singleton: {}", e);
            AdminError::store(format!("Failed to load {}.", lower(K::LABEL)), e)
        })
    }

    /// Updates the first document of a singleton kind, or creates it if there is none.
    pub async fn save_singleton<K: Singleton>(
        &self,
        caps: Capabilities,
        form: Fields,
    ) -> Result<(String, Notice), AdminError> {
        gate(caps, Action::Edit)?;
        let repo = self.repo::<K>();
        let failed = || "Failed to save changes.".to_string();

        let existing = repo.singleton().await.map_err(|e| AdminError::store(failed(), e))?;
        let (id, created_at, base) = match existing {
            Some(entry) => (Some(entry.id), entry.created_at, entry.data),
            None => (None, None, K::draft()),
        };

        let mut fields = to_fields(&base)?;
        fields.extend(strip_reserved(form));
        let data = prepare::<K>(fields)?;

        let save_failed = |e: StoreError| {
            tracing::error!(collection = %K::COLLECTION, "failed to save singleton: {}", e);
            AdminError::store(failed(), e)
        };
        let id = match id {
            Some(id) => {
                repo.replace(&id, &data, created_at).await.map_err(save_failed)?;
                id
            }
            None => repo.create(&data).await.map_err(save_failed)?,
        };

        Ok((
            id,
            Notice::new("Saved!", format!("{} updated successfully.", K::LABEL)),
        ))
    }

    /// Checks the file's content, stores it under the target's path and returns its URL.
    pub async fn upload(
        &self,
        caps: Capabilities,
        target: UploadTarget,
        slug: Option<&str>,
        bytes: &[u8],
    ) -> Result<(UploadedFile, Notice), AdminError> {
        gate(caps, Action::Edit)?;
        let (failed, done) = match target {
            UploadTarget::HeroCv => ("Failed to upload CV.", "CV uploaded successfully."),
            UploadTarget::HeroProfile => (
                "Failed to upload image.",
                "Profile image uploaded successfully.",
            ),
            UploadTarget::Certificate => (
                "Failed to upload image.",
                "Certificate image uploaded successfully.",
            ),
            UploadTarget::Project => ("Failed to upload image.", "Image uploaded successfully."),
        };
        let file_error = |source: FileError| AdminError::File {
            notice: failed.to_string(),
            source,
        };

        let content_type = target.inspect(bytes).map_err(file_error)?;
        let path = target.current_path(slug, content_type);
        let url = self
            .files
            .upload(&path, bytes, content_type)
            .await
            .map_err(|e| {
                tracing::error!(path = %path, "upload failed: {}", e);
                file_error(e)
            })?;

        Ok((
            UploadedFile {
                url,
                path,
                content_type: content_type.to_string(),
            },
            Notice::new("Uploaded!", done),
        ))
    }

    pub async fn delete_file(&self, caps: Capabilities, path: &str) -> Result<Notice, AdminError> {
        gate(caps, Action::Delete)?;
        self.files.delete(path).await.map_err(|e| {
            tracing::error!(path = %path, "file delete failed: {}", e);
            AdminError::File {
                notice: "Failed to delete file.".to_string(),
                source: e,
            }
        })?;
        Ok(Notice::new("Deleted!", "File deleted successfully."))
    }

    /// Item counts and the first five projects in display order.
    pub async fn dashboard(&self) -> Result<Dashboard, AdminError> {
        let c = &self.catalog;
        let (projects, experiences, education, skills) = tokio::join!(
            c.projects.list_all(),
            c.experiences.count(),
            c.education.count(),
            c.skills.count(),
        );
        let failed = |e: StoreError| {
            tracing::error!("failed to load dashboard data: {}", e);
            AdminError::store("Failed to load dashboard.", e)
        };

        let projects = projects.map_err(failed)?;
        let stats = DashboardStats {
            projects: projects.len(),
            experiences: experiences.map_err(failed)?,
            education: education.map_err(failed)?,
            skills: skills.map_err(failed)?,
        };
        Ok(Dashboard {
            stats,
            recent_projects: projects.into_iter().take(5).collect(),
        })
    }
}
