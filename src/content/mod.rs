//! Content
//! Typed portfolio content over the document store.
//!
//! Each content kind is a serde struct that names its collection through [`ContentKind`].
//! [`ContentRepository`] is instantiated once per kind, so collection names and sort fields
//! never appear as loose strings at call sites.

pub mod kinds;
pub mod ordering;
pub mod repository;
pub mod slug;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use kinds::{
    AboutData, Certificate, ContactInfo, Education, Experience, FooterData, HeroData, Project,
    SkillCategory, SocialLink,
};
pub use repository::ContentRepository;

/// Every named collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Hero,
    About,
    Projects,
    Experiences,
    Education,
    Certificates,
    Skills,
    Contact,
    Footer,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 10] = [
        Collection::Hero,
        Collection::About,
        Collection::Projects,
        Collection::Experiences,
        Collection::Education,
        Collection::Certificates,
        Collection::Skills,
        Collection::Contact,
        Collection::Footer,
        Collection::Users,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Collection::Hero => "hero",
            Collection::About => "about",
            Collection::Projects => "projects",
            Collection::Experiences => "experiences",
            Collection::Education => "education",
            Collection::Certificates => "certificates",
            Collection::Skills => "skills",
            Collection::Contact => "contact",
            Collection::Footer => "footer",
            Collection::Users => "users",
        }
    }

    /// Singleton kinds hold one canonical document rather than an ordered list.
    pub const fn is_singleton(self) -> bool {
        matches!(
            self,
            Collection::Hero | Collection::About | Collection::Contact | Collection::Footer
        )
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

/// A missing required field, caught before any store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Descriptor for one kind of content: where it lives and how it is checked.
pub trait ContentKind:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    const COLLECTION: Collection;

    /// Field used by `list_all` / `list_published` for ascending order.
    const ORDER_FIELD: &'static str = "order";

    /// Human label used in admin notices, e.g. "Project".
    const LABEL: &'static str;

    /// The empty admin form for this kind.
    fn draft() -> Self;

    fn published(&self) -> bool;

    /// Fills fields derived from others when the caller left them blank.
    fn derive_defaults(&mut self) {}

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Cleans user-supplied markup before it is stored.
    fn sanitize(&mut self) {}
}

/// Multi-item kinds that carry an `order` spine.
pub trait ListItem: ContentKind {
    fn order(&self) -> f64;
}

/// Kinds expected to hold exactly one document. Not enforced by the store.
pub trait Singleton: ContentKind {}

/// A decoded document: store id, timestamps and the kind's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub data: T,
}
