//! Generator module - renders the content table into HTML pages

use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::{check_id, ContentTable, MetadataView, NotFound};
use crate::helpers::{self, escape_xml, full_url_for, strip_invalid_xml_chars};
use crate::templates::{
    base_context, ConfigData, PortfolioData, PostData, TemplateRenderer, STYLESHEET,
};
use crate::Folio;

/// Number of posts listed under "Latest Writing" on the home page
const RECENT_POSTS: usize = 3;

/// Outcome of rendering a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Found,
    NotFound,
}

/// A rendered page and whether its content existed
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: PageStatus,
    pub html: String,
}

/// Static site generator using Tera templates
pub struct Generator {
    folio: Folio,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(folio: &Folio) -> Result<Self> {
        Ok(Self {
            folio: folio.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    pub fn folio(&self) -> &Folio {
        &self.folio
    }

    /// Generate the entire site
    pub fn generate(&self, table: &ContentTable) -> Result<()> {
        // ids become directory names under the blog dir
        for id in table.list_all_ids() {
            check_id(id)?;
        }

        let public_dir = &self.folio.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        self.copy_source_assets()?;
        write_file(&public_dir.join("css/style.css"), STYLESHEET)?;

        write_file(&public_dir.join("index.html"), &self.render_home(table)?)?;

        let blog_dir = public_dir.join(self.folio.config.blog_dir.trim_matches('/'));
        write_file(&blog_dir.join("index.html"), &self.render_blog_index(table)?)?;

        for id in table.list_all_ids() {
            let page = self.render_post(table, id)?;
            if page.status == PageStatus::NotFound {
                // list_all_ids only yields keys of the table
                return Err(NotFound(id.to_string()).into());
            }
            write_file(&blog_dir.join(id).join("index.html"), &page.html)?;
            tracing::debug!("Generated post: {}", id);
        }

        write_file(&public_dir.join("404.html"), &self.render_not_found()?)?;

        write_file(&public_dir.join("atom.xml"), &self.atom_feed(table))?;
        tracing::info!("Generated {} posts into {:?}", table.len(), public_dir);

        Ok(())
    }

    /// Portfolio home page
    pub fn render_home(&self, table: &ContentTable) -> Result<String> {
        let config = &self.folio.config;
        let recent: Vec<PostData> = table
            .newest_first()
            .into_iter()
            .take(RECENT_POSTS)
            .map(|p| PostData::from_post(p, config))
            .collect();

        let meta = MetadataView::for_site(&config.title, config);
        let mut context = base_context(&ConfigData::from_config(config), &meta, "/");
        context.insert("portfolio", &PortfolioData::from_config(config));
        context.insert("recent_posts", &recent);

        self.renderer.render("home.html", &context)
    }

    /// Blog index with featured and regular sections, in table order
    pub fn render_blog_index(&self, table: &ContentTable) -> Result<String> {
        let config = &self.folio.config;
        let featured: Vec<PostData> = table
            .featured()
            .map(|p| PostData::from_post(p, config))
            .collect();
        let regular: Vec<PostData> = table
            .regular()
            .map(|p| PostData::from_post(p, config))
            .collect();

        let meta = MetadataView::for_site(&format!("{} | {}", config.blog.heading, config.title), config);
        let mut context = base_context(&ConfigData::from_config(config), &meta, &config.blog_path());
        context.insert("blog", &config.blog);
        context.insert("featured_posts", &featured);
        context.insert("regular_posts", &regular);

        self.renderer.render("blog.html", &context)
    }

    /// Render the page for `id`, or the not-found page when it is unknown
    pub fn render_post(&self, table: &ContentTable, id: &str) -> Result<RenderedPage> {
        let config = &self.folio.config;
        let post = match table.resolve(id) {
            Ok(post) => post,
            Err(NotFound(missing)) => {
                tracing::debug!("No post for {:?}", missing);
                return Ok(RenderedPage {
                    status: PageStatus::NotFound,
                    html: self.render_not_found()?,
                });
            }
        };

        let meta = MetadataView::derive(post, config);
        let mut context = base_context(&ConfigData::from_config(config), &meta, &config.post_path(id));
        context.insert("post", &PostData::from_post(post, config));

        Ok(RenderedPage {
            status: PageStatus::Found,
            html: self.renderer.render("post.html", &context)?,
        })
    }

    /// Generic not-found page
    pub fn render_not_found(&self) -> Result<String> {
        let config = &self.folio.config;
        let context = base_context(
            &ConfigData::from_config(config),
            &MetadataView::not_found(),
            "/404.html",
        );
        self.renderer.render("not_found.html", &context)
    }

    /// Atom feed, newest first
    pub fn atom_feed(&self, table: &ContentTable) -> String {
        let config = &self.folio.config;
        let posts = table.newest_first();
        let home = full_url_for(config, "/");

        let mut feed = String::new();
        feed.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.blog_title)));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            full_url_for(config, "/atom.xml")
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", home));
        let updated = posts
            .first()
            .map(|p| helpers::date_rfc3339(&p.date))
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}</id>\n", home));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for post in posts.iter().take(config.feed_limit) {
            let link = full_url_for(config, &config.post_path(&post.id));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!(
                "    <published>{}</published>\n",
                helpers::date_rfc3339(&post.date)
            ));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                helpers::date_rfc3339(&post.date)
            ));
            for tag in &post.tags {
                feed.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
            }
            if let Some(excerpt) = &post.excerpt {
                feed.push_str(&format!("    <summary>{}</summary>\n", escape_xml(excerpt)));
            }
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&post.content).replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");
        feed
    }

    /// Copy non-markdown files (images, etc.) to the public directory
    fn copy_source_assets(&self) -> Result<()> {
        let source_dir = &self.folio.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let hidden = relative.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .map(|s| s.starts_with('_') || s.starts_with('.'))
                    .unwrap_or(false)
            });
            let markdown = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("markdown")
            );
            if hidden || markdown {
                continue;
            }

            let dest = self.folio.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest).with_context(|| format!("Failed to copy {:?}", path))?;
        }

        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Post;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
title: Shahryar
author: Shahryar
blog_title: Shahryar's Blog
url: https://example.com
portfolio:
  headline: Backend engineer building intelligent systems at scale.
  projects:
    - title: High-Performance REST API
      year: "2024"
      tech: [FastAPI, PostgreSQL]
  expertise:
    - name: Backend Development
      skills: [FastAPI, Python]
  contact:
    - name: Email
      url: mailto:hello@example.com
"#;

    fn post(id: &str, title: &str, day: u32, featured: bool) -> Post {
        let mut p = Post::new(id, title, NaiveDate::from_ymd_opt(2024, 12, day).unwrap());
        p.read_time = "8 min read".to_string();
        p.tags = vec!["FastAPI".into(), "AI & Agents".into()];
        p.excerpt = Some(format!("About {}", title));
        p.featured = featured;
        p.content = format!("<h2>{}</h2><p>Body of {}</p>", title, id);
        p
    }

    fn setup() -> (TempDir, Generator, ContentTable) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), CONFIG).unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        let generator = Generator::new(&folio).unwrap();
        let table = ContentTable::from_posts(vec![
            post("fastapi-cicd-pipeline", "CI/CD for FastAPI", 20, true),
            post("langgraph-multi-agent", "Multi-Agent Orchestration", 15, false),
        ])
        .unwrap();
        (dir, generator, table)
    }

    #[test]
    fn test_render_known_post() {
        let (_dir, generator, table) = setup();
        let page = generator.render_post(&table, "fastapi-cicd-pipeline").unwrap();
        assert_eq!(page.status, PageStatus::Found);
        assert!(page.html.contains("<title>CI/CD for FastAPI | Shahryar&#39;s Blog</title>"));
        assert!(page.html.contains(r#"<meta name="keywords" content="FastAPI, AI &amp; Agents">"#));
        assert!(page.html.contains(r#"<meta property="og:type" content="article">"#));
        assert!(page.html.contains("December 20, 2024"));
        // body is handed over unmodified
        assert!(page.html.contains("<h2>CI/CD for FastAPI</h2><p>Body of fastapi-cicd-pipeline</p>"));
    }

    #[test]
    fn test_render_unknown_post_is_not_found_page() {
        let (_dir, generator, table) = setup();
        let page = generator.render_post(&table, "does-not-exist").unwrap();
        assert_eq!(page.status, PageStatus::NotFound);
        assert!(page.html.contains("<title>Post Not Found</title>"));
        assert!(page.html.contains("This page could not be found."));
    }

    #[test]
    fn test_blog_index_sections() {
        let (_dir, generator, table) = setup();
        let html = generator.render_blog_index(&table).unwrap();
        let featured = html.find("Featured").unwrap();
        let all = html.find("All Articles").unwrap();
        let cicd = html.find("/blog/fastapi-cicd-pipeline/").unwrap();
        let langgraph = html.find("/blog/langgraph-multi-agent/").unwrap();
        assert!(featured < cicd && cicd < all && all < langgraph);
        assert!(html.contains("Dec 20, 2024"));
    }

    #[test]
    fn test_home_page() {
        let (_dir, generator, table) = setup();
        let html = generator.render_home(&table).unwrap();
        assert!(html.contains("High-Performance REST API"));
        assert!(html.contains("FastAPI • PostgreSQL"));
        assert!(html.contains("mailto:hello@example.com"));
        assert!(html.contains("Latest Writing"));
    }

    #[test]
    fn test_generate_writes_every_listed_post() {
        let (dir, generator, table) = setup();
        generator.generate(&table).unwrap();

        let public = dir.path().join("public");
        assert!(public.join("index.html").exists());
        assert!(public.join("blog/index.html").exists());
        assert!(public.join("404.html").exists());
        assert!(public.join("atom.xml").exists());
        assert!(public.join("css/style.css").exists());
        for id in table.list_all_ids() {
            assert!(public.join("blog").join(id).join("index.html").exists(), "{}", id);
        }
        assert!(!public.join("blog/does-not-exist").exists());
    }

    #[test]
    fn test_generate_copies_assets_but_not_posts() {
        let (dir, generator, table) = setup();
        let source = dir.path().join("source");
        fs::create_dir_all(source.join("images")).unwrap();
        fs::create_dir_all(source.join("_posts")).unwrap();
        fs::write(source.join("images/arch.png"), b"png").unwrap();
        fs::write(source.join("_posts/a.md"), "# a").unwrap();

        generator.generate(&table).unwrap();
        let public = dir.path().join("public");
        assert!(public.join("images/arch.png").exists());
        assert!(!public.join("_posts").exists());
    }

    #[test]
    fn test_atom_feed() {
        let (_dir, generator, table) = setup();
        let feed = generator.atom_feed(&table);
        assert!(feed.contains("<title>Shahryar&apos;s Blog</title>"));
        assert!(feed.contains("<link href=\"https://example.com/blog/fastapi-cicd-pipeline/\"/>"));
        assert!(feed.contains("<updated>2024-12-20T00:00:00Z</updated>"));
        assert!(feed.contains("<category term=\"AI &amp; Agents\"/>"));
        let first = feed.find("fastapi-cicd-pipeline").unwrap();
        let second = feed.find("langgraph-multi-agent").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_generate_refuses_unsafe_ids() {
        let (dir, generator, _table) = setup();
        for id in ["", "../../escaped"] {
            let table = ContentTable::from_posts(vec![
                post("fastapi-cicd-pipeline", "CI/CD for FastAPI", 20, true),
                post(id, "Unsafe", 1, false),
            ])
            .unwrap();
            assert!(generator.generate(&table).is_err(), "{:?}", id);
        }
        assert!(!dir.path().join("public/blog/index.html").exists());
        assert!(!dir.path().join("escaped").exists());
    }
}
