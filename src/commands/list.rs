//! List site content

use anyhow::{bail, Result};

use crate::content::ContentTable;
use crate::Folio;

/// Print posts, ids or tags
pub fn run(folio: &Folio, content_type: &str) -> Result<()> {
    let table = folio.load_table()?;
    for line in render(&table, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

/// The lines printed by `list`
pub fn render(table: &ContentTable, content_type: &str) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    match content_type {
        "post" | "posts" => {
            lines.push(format!("Posts ({}):", table.len()));
            for post in table.iter() {
                lines.push(format!(
                    "  {} - {} [{}] ({})",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.id,
                    post.read_time
                ));
            }
        }
        "id" | "ids" => {
            lines.extend(table.list_all_ids().into_iter().map(String::from));
        }
        "tag" | "tags" => {
            let tags = table.tag_counts();
            lines.push(format!("Tags ({}):", tags.len()));
            for (tag, count) in tags {
                lines.push(format!("  {} ({})", tag, count));
            }
        }
        _ => {
            bail!("Unknown type: {}. Available: post, id, tag", content_type);
        }
    }

    Ok(lines)
}
