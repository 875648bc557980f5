//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    /// Name of the blog, appended to every post title in the page head
    pub blog_title: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub blog_dir: String,

    // Writing
    pub render_drafts: bool,
    pub words_per_minute: usize,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Feed
    pub feed_limit: usize,

    // Home page
    #[serde(default)]
    pub portfolio: PortfolioConfig,

    // Blog index
    #[serde(default)]
    pub blog: BlogConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            blog_title: "Blog".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),
            blog_dir: "blog".to_string(),

            render_drafts: false,
            words_per_minute: 200,
            highlight: HighlightConfig::default(),

            feed_limit: 20,

            portfolio: PortfolioConfig::default(),
            blog: BlogConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// URL path of the blog index, e.g. `/blog/`
    pub fn blog_path(&self) -> String {
        format!("/{}/", self.blog_dir.trim_matches('/'))
    }

    /// URL path of a single post, e.g. `/blog/my-post/`
    pub fn post_path(&self, id: &str) -> String {
        format!("{}{}/", self.blog_path(), id)
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Home page content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub headline: String,
    pub intro: String,
    pub projects: Vec<ProjectConfig>,
    pub expertise: Vec<ExpertiseConfig>,
    pub contact: Vec<LinkConfig>,
}

/// A project shown under "Selected Works"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub title: String,
    pub description: String,
    pub year: String,
    pub tech: Vec<String>,
    pub link: Option<String>,
}

/// A group of skills shown under "Core Expertise"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpertiseConfig {
    pub name: String,
    pub skills: Vec<String>,
}

/// A contact or social link
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub name: String,
    pub url: String,
}

/// Blog index header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub heading: String,
    pub intro: String,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            heading: "Blog".to_string(),
            intro: String::new(),
        }
    }
}
