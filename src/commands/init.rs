//! Initialize a new site

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG: &str = include_str!("scaffold/config.yml");
const POST_SCAFFOLD: &str = include_str!("scaffold/post.md");

/// Sample posts, file names fix their order in the content table
const SAMPLE_POSTS: &[(&str, &str)] = &[
    (
        "01-fastapi-cicd-pipeline.md",
        include_str!("scaffold/posts/01-fastapi-cicd-pipeline.md"),
    ),
    (
        "02-building-ai-software-agency.md",
        include_str!("scaffold/posts/02-building-ai-software-agency.md"),
    ),
    (
        "03-researchy-ai-research-assistant.md",
        include_str!("scaffold/posts/03-researchy-ai-research-assistant.md"),
    ),
    (
        "04-langgraph-multi-agent.md",
        include_str!("scaffold/posts/04-langgraph-multi-agent.md"),
    ),
];

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists, refusing to overwrite", config_path);
    }

    let posts_dir = target_dir.join("source/_posts");
    fs::create_dir_all(&posts_dir)?;
    fs::create_dir_all(target_dir.join("source/images"))?;
    fs::create_dir_all(target_dir.join("scaffolds"))?;

    fs::write(&config_path, CONFIG)?;
    fs::write(target_dir.join("scaffolds/post.md"), POST_SCAFFOLD)?;

    for (name, content) in SAMPLE_POSTS {
        let path = posts_dir.join(name);
        if path.exists() {
            tracing::debug!("Keeping existing {:?}", path);
            continue;
        }
        fs::write(&path, content)?;
    }

    tracing::info!("Created {} sample posts", SAMPLE_POSTS.len());
    Ok(())
}
