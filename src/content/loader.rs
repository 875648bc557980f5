//! Content loader - builds the content table from `source/_posts`

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{check_id, ContentTable, FrontMatter, MarkdownRenderer, Post};
use crate::helpers::estimate_read_time;
use crate::Folio;

/// Loads posts from the source directory
pub struct ContentLoader<'a> {
    folio: &'a Folio,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    pub fn new(folio: &'a Folio) -> Self {
        let highlight = &folio.config.highlight;
        let renderer = MarkdownRenderer::with_options(&highlight.theme, highlight.line_number);
        Self { folio, renderer }
    }

    /// Load every post and build the table.
    ///
    /// Files are visited in file-name order, which is the table's
    /// definition order.
    pub fn load_table(&self) -> Result<ContentTable> {
        let posts = self.load_posts()?;
        let table = ContentTable::from_posts(posts)?;
        tracing::debug!("Content table holds {} posts", table.len());
        Ok(table)
    }

    /// Load all publishable posts from source/_posts
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = self.folio.posts_dir();
        if !posts_dir.exists() {
            tracing::warn!("No posts directory at {:?}", posts_dir);
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();

        for entry in WalkDir::new(&posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            match self.load_post(path) {
                Ok(post) if post.published || self.folio.config.render_drafts => posts.push(post),
                Ok(post) => tracing::debug!("Skipping unpublished post {}", post.id),
                Err(e) => tracing::warn!("Failed to load post {:?}: {:#}", path, e),
            }
        }

        Ok(posts)
    }

    /// Load a single post from a file
    pub fn load_post(&self, path: &Path) -> Result<Post> {
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&raw)?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let id = fm.id.clone().unwrap_or_else(|| stem.clone());
        check_id(&id).with_context(|| format!("Unusable id in {:?}", path))?;
        if id != slug::slugify(&id) {
            tracing::warn!("Post id {:?} in {:?} is not URL-safe", id, path);
        }

        let date = match fm.parse_date() {
            Some(date) => date,
            None => modified_date(path)?,
        };

        let content = self.renderer.render(body)?;

        let read_time = fm
            .read_time
            .unwrap_or_else(|| estimate_read_time(&content, self.folio.config.words_per_minute));

        let mut post = Post::new(id, fm.title.unwrap_or(stem), date);
        post.read_time = read_time;
        post.tags = fm.tags;
        post.excerpt = fm.excerpt;
        post.featured = fm.featured;
        post.published = fm.published;
        post.body = body.to_string();
        post.content = content;
        post.source = path.to_path_buf();

        Ok(post)
    }
}

/// Date of the file's last modification, local time
fn modified_date(path: &Path) -> Result<NaiveDate> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(chrono::DateTime::<Local>::from(modified).date_naive())
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}
