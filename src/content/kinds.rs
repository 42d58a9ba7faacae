//! Portfolio content kinds as stored in the document store (camelCase JSON).

use serde::{Deserialize, Serialize};

use super::slug::{generate_slug, is_valid_slug};
use super::{Collection, ContentKind, ListItem, Singleton, ValidationError};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

// ============================================================================
// Singletons
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroData {
    pub name: String,
    pub title: String,
    pub tagline: String,
    pub profile_image: String,
    pub cv_url: String,
    pub published: bool,
}

impl ContentKind for HeroData {
    const COLLECTION: Collection = Collection::Hero;
    const LABEL: &'static str = "Hero section";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }
}

impl Singleton for HeroData {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AboutData {
    pub content: String,
    pub published: bool,
}

impl ContentKind for AboutData {
    const COLLECTION: Collection = Collection::About;
    const LABEL: &'static str = "About section";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }

    fn sanitize(&mut self) {
        self.content = ammonia::clean(&self.content);
    }
}

impl Singleton for AboutData {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub social_links: Vec<SocialLink>,
    pub published: bool,
}

impl ContentKind for ContactInfo {
    const COLLECTION: Collection = Collection::Contact;
    const LABEL: &'static str = "Contact information";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }
}

impl Singleton for ContactInfo {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterData {
    pub copyright: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub published: bool,
}

impl ContentKind for FooterData {
    const COLLECTION: Collection = Collection::Footer;
    const LABEL: &'static str = "Footer";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }
}

impl Singleton for FooterData {}

// ============================================================================
// Ordered lists
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub tech_stack: Vec<String>,
    pub iot_platform: Vec<String>,
    pub hardware: Vec<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    pub featured: bool,
    pub published: bool,
    pub order: f64,
}

impl ContentKind for Project {
    const COLLECTION: Collection = Collection::Projects;
    const LABEL: &'static str = "Project";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }

    fn derive_defaults(&mut self) {
        if is_blank(&self.slug) {
            self.slug = generate_slug(&self.title);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.title) || is_blank(&self.slug) {
            return Err(ValidationError::new("Title and slug are required."));
        }
        if !is_valid_slug(&self.slug) {
            return Err(ValidationError::new(
                "Slug must contain only lowercase letters, numbers, and hyphens.",
            ));
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.description = ammonia::clean(&self.description);
    }
}

impl ListItem for Project {
    fn order(&self) -> f64 {
        self.order
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub description: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
    pub published: bool,
    pub order: f64,
}

impl ContentKind for Experience {
    const COLLECTION: Collection = Collection::Experiences;
    const LABEL: &'static str = "Experience";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.company) || is_blank(&self.position) {
            return Err(ValidationError::new("Company and position are required."));
        }
        Ok(())
    }
}

impl ListItem for Experience {
    fn order(&self) -> f64 {
        self.order
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub published: bool,
    pub order: f64,
}

impl ContentKind for Education {
    const COLLECTION: Collection = Collection::Education;
    const LABEL: &'static str = "Education";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.institution) || is_blank(&self.degree) {
            return Err(ValidationError::new("Institution and degree are required."));
        }
        Ok(())
    }
}

impl ListItem for Education {
    fn order(&self) -> f64 {
        self.order
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certificate {
    pub name: String,
    pub issuer: String,
    pub year: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,
    pub published: bool,
    pub order: f64,
}

impl ContentKind for Certificate {
    const COLLECTION: Collection = Collection::Certificates;
    const LABEL: &'static str = "Certificate";

    fn draft() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) || is_blank(&self.issuer) {
            return Err(ValidationError::new("Name and issuer are required."));
        }
        Ok(())
    }
}

impl ListItem for Certificate {
    fn order(&self) -> f64 {
        self.order
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<String>,
    pub icon: String,
    pub published: bool,
    pub order: f64,
}

impl ContentKind for SkillCategory {
    const COLLECTION: Collection = Collection::Skills;
    const LABEL: &'static str = "Skill category";

    fn draft() -> Self {
        Self {
            icon: "Cpu".to_string(),
            published: true,
            ..Self::default()
        }
    }

    fn published(&self) -> bool {
        self.published
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::new("Category name is required."));
        }
        Ok(())
    }
}

impl ListItem for SkillCategory {
    fn order(&self) -> f64 {
        self.order
    }
}
