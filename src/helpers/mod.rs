//! Helper functions shared by the loader, templates and feed

mod date;
mod html;
mod text;
mod url;

pub use date::*;
pub use html::*;
pub use text::*;
pub use url::*;
