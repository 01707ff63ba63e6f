//! Active tag state

use std::collections::BTreeSet;

/// Set of tags currently enabled in the session.
///
/// Initialized from the runtime config at scene load, mutated by user actions,
/// and consumed whenever material bindings are re-resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveTagSet {
    tags: BTreeSet<String>,
}

impl ActiveTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a tag. Returns true if it was not already active.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Disable a tag. Returns true if it was active.
    pub fn remove(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// True if any of `tags` is active
    pub fn any_of<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.contains(tag.as_ref()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveTagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
