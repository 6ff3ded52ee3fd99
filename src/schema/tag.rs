use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A set of unique, case-sensitive tags.
///
/// Tags carry no meaning to the engine beyond equality; they are matched
/// against the required/banned sets produced by classifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: FxHashSet<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace-separated tag string, e.g. `"1h melee sneak"`.
    pub fn split(input: &str) -> Self {
        input.split_whitespace().collect()
    }

    /// Render the tags sorted and separated by single spaces.
    pub fn join(&self) -> String {
        self.sorted().join(" ")
    }

    /// Tags in lexicographic order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Add every tag of `other` to this set.
    pub fn merge(&mut self, other: &TagSet) {
        self.tags.extend(other.tags.iter().cloned());
    }

    /// Returns true if every tag in this set is also in `other`.
    pub fn is_subset(&self, other: &TagSet) -> bool {
        self.tags.is_subset(&other.tags)
    }

    /// Returns true if the two sets share no tag.
    pub fn is_disjoint(&self, other: &TagSet) -> bool {
        self.tags.is_disjoint(&other.tags)
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for TagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.tags.extend(iter.into_iter().map(Into::into));
    }
}

// Serialized sorted so saved files are stable across runs.
impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;
        Ok(tags.into_iter().collect())
    }
}
