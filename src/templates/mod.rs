//! Built-in portfolio theme using the Tera template engine
//!
//! Templates are embedded in the binary; post content and metadata are
//! passed in through the serializable data types below.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{ExpertiseConfig, SiteConfig};
use crate::content::{MetadataView, Post};
use crate::helpers::{self, is_external, url_for};

/// Stylesheet written to `css/style.css`
pub const STYLESHEET: &str = include_str!("folio/style.css");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Tera's default escaper turns `/` into `&#x2F;`, which mangles URLs
        tera.set_escape_fn(helpers::escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("folio/layout.html")),
            ("home.html", include_str!("folio/home.html")),
            ("blog.html", include_str!("folio/blog.html")),
            ("post.html", include_str!("folio/post.html")),
            ("not_found.html", include_str!("folio/not_found.html")),
            ("partials/head.html", include_str!("folio/partials/head.html")),
            ("partials/tags.html", include_str!("folio/partials/tags.html")),
            ("partials/footer.html", include_str!("folio/partials/footer.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        return Ok(tera::Value::String(s));
    }
    let truncated: String = s.chars().take(length).collect();
    Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub blog_title: String,
    pub home_path: String,
    pub blog_path: String,
    pub feed_path: String,
    pub current_year: String,
}

impl ConfigData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            blog_title: config.blog_title.clone(),
            home_path: url_for(config, "/"),
            blog_path: url_for(config, &config.blog_path()),
            feed_path: url_for(config, "/atom.xml"),
            current_year: chrono::Local::now().format("%Y").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: String,
    pub title: String,
    pub path: String,
    pub date: String,
    pub date_long: String,
    pub date_short: String,
    pub read_time: String,
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    pub content: String,
}

impl PostData {
    pub fn from_post(post: &Post, config: &SiteConfig) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            path: url_for(config, &config.post_path(&post.id)),
            date: helpers::iso_date(&post.date),
            date_long: helpers::long_date(&post.date),
            date_short: helpers::short_date(&post.date),
            read_time: post.read_time.clone(),
            tags: post.tags.clone(),
            excerpt: post.excerpt.clone(),
            content: post.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioData {
    pub headline: String,
    pub intro: String,
    pub projects: Vec<ProjectData>,
    pub expertise: Vec<ExpertiseConfig>,
    pub contact: Vec<LinkData>,
}

impl PortfolioData {
    pub fn from_config(config: &SiteConfig) -> Self {
        let portfolio = &config.portfolio;
        Self {
            headline: portfolio.headline.clone(),
            intro: portfolio.intro.clone(),
            projects: portfolio
                .projects
                .iter()
                .map(|p| ProjectData {
                    title: p.title.clone(),
                    description: p.description.clone(),
                    year: p.year.clone(),
                    tech: p.tech.join(" • "),
                    link: LinkData::new(&p.title, p.link.as_deref().unwrap_or("#")),
                })
                .collect(),
            expertise: portfolio.expertise.clone(),
            contact: portfolio
                .contact
                .iter()
                .map(|l| LinkData::new(&l.name, &l.url))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectData {
    pub title: String,
    pub description: String,
    pub year: String,
    pub tech: String,
    pub link: LinkData,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub name: String,
    pub url: String,
    pub external: bool,
}

impl LinkData {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            external: is_external(url),
        }
    }
}

/// Base context shared by every page
pub fn base_context(config: &ConfigData, meta: &MetadataView, current_path: &str) -> Context {
    let mut context = Context::new();
    context.insert("config", config);
    context.insert("meta", meta);
    context.insert("current_path", current_path);
    context
}
