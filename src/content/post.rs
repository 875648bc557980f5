//! Post model

use chrono::NaiveDate;
use std::path::PathBuf;

/// A blog post
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Slug, unique across the content table
    pub id: String,

    /// Post title
    pub title: String,

    /// Publication date
    pub date: NaiveDate,

    /// Display string such as "15 min read"
    pub read_time: String,

    /// Tags in authored order
    pub tags: Vec<String>,

    /// Short summary for the blog index
    pub excerpt: Option<String>,

    /// Listed in the "Featured" section of the blog index
    pub featured: bool,

    /// Whether the post is published
    pub published: bool,

    /// Raw markdown body
    pub body: String,

    /// Rendered HTML body
    pub content: String,

    /// Source file path
    pub source: PathBuf,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date,
            read_time: String::new(),
            tags: Vec::new(),
            excerpt: None,
            featured: false,
            published: true,
            body: String::new(),
            content: String::new(),
            source: PathBuf::new(),
        }
    }

    /// Tags joined for display, e.g. "FastAPI, Docker"
    pub fn tag_list(&self) -> String {
        self.tags.join(", ")
    }
}
