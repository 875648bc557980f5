//! The content table: an ordered, immutable id -> post mapping

use indexmap::IndexMap;
use std::path::PathBuf;
use thiserror::Error;

use super::Post;

/// No post is registered under the requested id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no post with id `{0}`")]
pub struct NotFound(pub String);

/// Two posts were authored with the same id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate post id `{id}` in {first:?} and {second:?}")]
pub struct DuplicateId {
    pub id: String,
    pub first: PathBuf,
    pub second: PathBuf,
}

/// An id that cannot serve as a single URL segment and output directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid post id {0:?}: ids must be non-empty and free of path separators and dot segments")]
pub struct InvalidId(pub String);

/// Reject ids that are empty, contain `/` or `\`, or are `.`/`..`
pub fn check_id(id: &str) -> Result<(), InvalidId> {
    let unsafe_id = id.trim().is_empty()
        || id.contains(['/', '\\'])
        || id == "."
        || id == "..";
    if unsafe_id {
        return Err(InvalidId(id.to_string()));
    }
    Ok(())
}

/// All posts of the site, keyed by id in definition order.
///
/// Built once and never mutated afterwards; the preview server replaces the
/// whole table when sources change.
#[derive(Debug, Clone, Default)]
pub struct ContentTable {
    posts: IndexMap<String, Post>,
}

impl ContentTable {
    /// Build a table, keeping the order of `posts`
    pub fn from_posts(posts: Vec<Post>) -> Result<Self, DuplicateId> {
        let mut table: IndexMap<String, Post> = IndexMap::with_capacity(posts.len());
        for post in posts {
            if let Some(existing) = table.get(&post.id) {
                return Err(DuplicateId {
                    id: post.id.clone(),
                    first: existing.source.clone(),
                    second: post.source.clone(),
                });
            }
            table.insert(post.id.clone(), post);
        }
        Ok(Self { posts: table })
    }

    /// Every known id, in definition order
    pub fn list_all_ids(&self) -> Vec<&str> {
        self.posts.keys().map(String::as_str).collect()
    }

    /// Exact, case-sensitive lookup
    pub fn resolve(&self, id: &str) -> Result<&Post, NotFound> {
        self.posts.get(id).ok_or_else(|| NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn featured(&self) -> impl Iterator<Item = &Post> {
        self.iter().filter(|p| p.featured)
    }

    pub fn regular(&self) -> impl Iterator<Item = &Post> {
        self.iter().filter(|p| !p.featured)
    }

    /// Posts sorted by date, newest first; ties keep definition order
    pub fn newest_first(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.iter().collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        posts
    }

    /// Tag usage counts, most used first, then by name
    pub fn tag_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for tag in self.iter().flat_map(|p| p.tags.iter()) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post(id: &str, day: u32) -> Post {
        let mut p = Post::new(id, id.to_uppercase(), NaiveDate::from_ymd_opt(2024, 12, day).unwrap());
        p.source = PathBuf::from(format!("{}.md", id));
        p
    }

    fn cicd() -> Post {
        let mut p = Post::new(
            "fastapi-cicd-pipeline",
            "Building a Complete CI/CD Pipeline for FastAPI on AWS",
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        );
        p.read_time = "15 min read".to_string();
        p.tags = ["FastAPI", "Jenkins", "Docker", "AWS", "DevOps"]
            .into_iter()
            .map(String::from)
            .collect();
        p
    }

    #[test]
    fn test_two_records_listed_in_definition_order() {
        let table = ContentTable::from_posts(vec![post("zeta", 1), post("alpha", 2)]).unwrap();
        assert_eq!(table.list_all_ids(), vec!["zeta", "alpha"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_every_listed_id_resolves_to_itself() {
        let table =
            ContentTable::from_posts(vec![cicd(), post("a", 1), post("b", 2), post("c", 3)])
                .unwrap();
        for id in table.list_all_ids() {
            assert_eq!(table.resolve(id).unwrap().id, id);
        }
    }

    #[test]
    fn test_resolve_known_post() {
        let table = ContentTable::from_posts(vec![cicd()]).unwrap();
        let found = table.resolve("fastapi-cicd-pipeline").unwrap();
        assert_eq!(found, &cicd());
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let table = ContentTable::from_posts(vec![cicd()]).unwrap();
        for id in [
            "",
            "does-not-exist",
            "fastapi-cicd-pipelin",
            "fastapi-cicd-pipeline-",
            "FastAPI-CICD-Pipeline",
            " fastapi-cicd-pipeline",
            "fastapi-cicd-pipeline/",
        ] {
            assert_eq!(table.resolve(id), Err(NotFound(id.to_string())));
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = ContentTable::default().resolve("does-not-exist").unwrap_err();
        assert_eq!(err.to_string(), "no post with id `does-not-exist`");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut second = post("a", 2);
        second.source = PathBuf::from("other.md");
        let err = ContentTable::from_posts(vec![post("a", 1), second]).unwrap_err();
        assert_eq!(err.id, "a");
        assert_eq!(err.first, PathBuf::from("a.md"));
        assert_eq!(err.second, PathBuf::from("other.md"));
    }

    #[test]
    fn test_featured_split() {
        let mut a = post("a", 1);
        a.featured = true;
        let table = ContentTable::from_posts(vec![a, post("b", 2), post("c", 3)]).unwrap();
        let featured: Vec<_> = table.featured().map(|p| p.id.as_str()).collect();
        let regular: Vec<_> = table.regular().map(|p| p.id.as_str()).collect();
        assert_eq!(featured, vec!["a"]);
        assert_eq!(regular, vec!["b", "c"]);
    }

    #[test]
    fn test_newest_first() {
        let table =
            ContentTable::from_posts(vec![post("old", 1), post("new", 9), post("mid", 5)]).unwrap();
        let ids: Vec<_> = table.newest_first().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_tag_counts() {
        let mut a = post("a", 1);
        a.tags = vec!["FastAPI".into(), "AI".into()];
        let mut b = post("b", 2);
        b.tags = vec!["FastAPI".into(), "LangGraph".into()];
        let table = ContentTable::from_posts(vec![a, b]).unwrap();
        assert_eq!(
            table.tag_counts(),
            vec![("FastAPI", 2), ("AI", 1), ("LangGraph", 1)]
        );
    }

    #[test]
    fn test_check_id() {
        assert!(check_id("fastapi-cicd-pipeline").is_ok());
        assert!(check_id("v1.2-release").is_ok());
        for bad in ["", "  ", ".", "..", "../x", "../../escaped", "a/b", "a\\b"] {
            assert_eq!(check_id(bad), Err(InvalidId(bad.to_string())), "{:?}", bad);
        }
    }
}
