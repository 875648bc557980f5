//! Content module - posts, the content table, and head metadata

mod frontmatter;
pub mod loader;
mod markdown;
mod metadata;
mod post;
mod table;

pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use metadata::{derive_metadata, MetadataView, OpenGraph, TwitterCard};
pub use post::Post;
pub use table::{check_id, ContentTable, DuplicateId, InvalidId, NotFound};
