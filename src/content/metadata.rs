//! Page head metadata derived from a post

use serde::Serialize;

use super::Post;
use crate::config::SiteConfig;

/// Metadata rendered into `<head>`: title, description, keywords and
/// the Open Graph / Twitter card fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataView {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub authors: Vec<String>,
    pub open_graph: Option<OpenGraph>,
    pub twitter: Option<TwitterCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub published_time: String,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwitterCard {
    pub card: String,
    pub title: String,
    pub description: String,
}

impl MetadataView {
    /// Head for a post page
    pub fn derive(post: &Post, site: &SiteConfig) -> Self {
        let tags = post.tag_list();
        let social_description = format!("{} | {}", post.read_time, tags);
        let authors = vec![site.author.clone()];

        Self {
            title: format!("{} | {}", post.title, site.blog_title),
            description: format!("{} - {}. {}", post.title, post.read_time, tags),
            keywords: tags,
            authors: authors.clone(),
            open_graph: Some(OpenGraph {
                title: post.title.clone(),
                description: social_description.clone(),
                kind: "article".to_string(),
                published_time: post.date.format("%Y-%m-%d").to_string(),
                authors,
                tags: post.tags.clone(),
            }),
            twitter: Some(TwitterCard {
                card: "summary_large_image".to_string(),
                title: post.title.clone(),
                description: social_description,
            }),
        }
    }

    /// Head for a slug that resolves to nothing
    pub fn not_found() -> Self {
        Self {
            title: "Post Not Found".to_string(),
            description: String::new(),
            keywords: String::new(),
            authors: Vec::new(),
            open_graph: None,
            twitter: None,
        }
    }

    /// Head for the non-post pages
    pub fn for_site(title: &str, site: &SiteConfig) -> Self {
        Self {
            title: title.to_string(),
            description: site.description.clone(),
            keywords: String::new(),
            authors: vec![site.author.clone()],
            open_graph: None,
            twitter: None,
        }
    }
}

/// Project a post into its page head
pub fn derive_metadata(post: &Post, site: &SiteConfig) -> MetadataView {
    MetadataView::derive(post, site)
}
