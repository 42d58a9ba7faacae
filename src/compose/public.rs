//! Public site content: every section fetched concurrently, each failing on its own.

use serde::Serialize;

use super::ContentCatalog;
use crate::content::{
    AboutData, Certificate, Collection, ContactInfo, ContentKind, Education, Entry, Experience,
    FooterData, HeroData, Project, SkillCategory,
};
use crate::store::StoreResult;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub hero: Option<Entry<HeroData>>,
    pub about: Option<Entry<AboutData>>,
    pub contact: Option<Entry<ContactInfo>>,
    pub footer: Option<Entry<FooterData>>,
    pub projects: Vec<Entry<Project>>,
    pub experiences: Vec<Entry<Experience>>,
    pub education: Vec<Entry<Education>>,
    pub certificates: Vec<Entry<Certificate>>,
    pub skills: Vec<Entry<SkillCategory>>,
    /// Sections whose fetch failed and are shown empty.
    pub degraded: Vec<Collection>,
}

#[derive(Clone)]
pub struct PublicComposer {
    catalog: ContentCatalog,
}

impl PublicComposer {
    pub fn new(catalog: ContentCatalog) -> Self {
        Self { catalog }
    }

    pub async fn site(&self) -> SiteContent {
        let c = &self.catalog;
        let (hero, about, contact, footer, projects, experiences, education, certificates, skills) = tokio::join!(
            c.hero.singleton(),
            c.about.singleton(),
            c.contact.singleton(),
            c.footer.singleton(),
            c.projects.list_published(),
            c.experiences.list_published(),
            c.education.list_published(),
            c.certificates.list_published(),
            c.skills.list_published(),
        );

        let mut degraded = Vec::new();
        SiteContent {
            hero: singleton_section(hero, &mut degraded),
            about: singleton_section(about, &mut degraded),
            contact: singleton_section(contact, &mut degraded),
            footer: singleton_section(footer, &mut degraded),
            projects: list_section(projects, &mut degraded),
            experiences: list_section(experiences, &mut degraded),
            education: list_section(education, &mut degraded),
            certificates: list_section(certificates, &mut degraded),
            skills: list_section(skills, &mut degraded),
            degraded,
        }
    }

    /// Published projects, optionally only the featured ones.
    pub async fn projects(&self, featured_only: bool) -> StoreResult<Vec<Entry<Project>>> {
        let mut projects = self.catalog.projects.list_published().await?;
        if featured_only {
            projects.retain(|p| p.data.featured);
        }
        Ok(projects)
    }

    /// A published project by slug. Unpublished projects are not found.
    pub async fn project(&self, slug: &str) -> StoreResult<Option<Entry<Project>>> {
        self.catalog.projects.find_published_by_slug(slug).await
    }
}

fn list_section<K: ContentKind>(
    result: StoreResult<Vec<Entry<K>>>,
    degraded: &mut Vec<Collection>,
) -> Vec<Entry<K>> {
    result.unwrap_or_else(|e| {
        tracing::error!(collection = %K::COLLECTION, "failed to load section: {}", e);
        degraded.push(K::COLLECTION);
        Vec::new()
    })
}

/// An unpublished singleton is treated as absent.
fn singleton_section<K: ContentKind>(
    result: StoreResult<Option<Entry<K>>>,
    degraded: &mut Vec<Collection>,
) -> Option<Entry<K>> {
    match result {
        Ok(entry) => entry.filter(|e| e.data.published()),
        Err(e) => {
            tracing::error!(collection = %K::COLLECTION, "failed to load section: {}", e);
            degraded.push(K::COLLECTION);
            None
        }
    }
}
