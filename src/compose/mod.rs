//! View composers: what the public site and the admin console read and write.

pub mod admin;
pub mod public;

use std::sync::Arc;

use crate::content::{
    AboutData, Certificate, ContactInfo, ContentRepository, Education, Experience, FooterData,
    HeroData, Project, SkillCategory,
};
use crate::store::DocumentStore;

pub use admin::{AdminConsole, AdminError, Dashboard, Notice, UploadedFile};
pub use public::{PublicComposer, SiteContent};

/// One repository per content kind over a shared store.
#[derive(Clone)]
pub struct ContentCatalog {
    pub hero: ContentRepository<HeroData>,
    pub about: ContentRepository<AboutData>,
    pub contact: ContentRepository<ContactInfo>,
    pub footer: ContentRepository<FooterData>,
    pub projects: ContentRepository<Project>,
    pub experiences: ContentRepository<Experience>,
    pub education: ContentRepository<Education>,
    pub certificates: ContentRepository<Certificate>,
    pub skills: ContentRepository<SkillCategory>,
}

impl ContentCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            hero: ContentRepository::new(store.clone()),
            about: ContentRepository::new(store.clone()),
            contact: ContentRepository::new(store.clone()),
            footer: ContentRepository::new(store.clone()),
            projects: ContentRepository::new(store.clone()),
            experiences: ContentRepository::new(store.clone()),
            education: ContentRepository::new(store.clone()),
            certificates: ContentRepository::new(store.clone()),
            skills: ContentRepository::new(store),
        }
    }
}
