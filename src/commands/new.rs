//! Create a new post

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::check_id;
use crate::Folio;

/// Used when the site has no `scaffolds/post.md`
const DEFAULT_SCAFFOLD: &str = "---\nid: {{ id }}\ntitle: {{ title }}\ndate: {{ date }}\ntags:\n---\n";

/// Create `source/_posts/<id>.md` from the post scaffold
pub fn create_post(folio: &Folio, title: &str, id: Option<&str>) -> Result<PathBuf> {
    let id = match id {
        Some(id) => id.to_string(),
        None => slug::slugify(title),
    };
    if id.is_empty() {
        bail!("Cannot derive a post id from {:?}, pass one with --id", title);
    }
    check_id(&id)?;

    if let Ok(table) = folio.load_table() {
        if table.resolve(&id).is_ok() {
            bail!("A post with id `{}` already exists", id);
        }
    }

    let posts_dir = folio.posts_dir();
    fs::create_dir_all(&posts_dir)?;

    let file_path = posts_dir.join(format!("{}.md", id));
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let scaffold_path = folio.base_dir.join("scaffolds/post.md");
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    // A JSON string is a valid double-quoted YAML scalar
    let quoted_title = serde_json::to_string(title)?;
    let content = scaffold
        .replace("{{ id }}", &id)
        .replace("{{ title }}", &quoted_title)
        .replace(
            "{{ date }}",
            &chrono::Local::now().format("%Y-%m-%d").to_string(),
        );

    fs::write(&file_path, content)?;
    tracing::info!("Created post {} at {:?}", id, file_path);

    Ok(file_path)
}
