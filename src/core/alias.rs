/// Tag aliases — one-level expansion of a tag into extra tags.

use serde::{Deserialize, Serialize};

use crate::schema::tag::TagSet;

/// Expands `from` into the additional tags in `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAlias {
    pub from: String,
    pub to: TagSet,
}

/// Alias table keyed by `from`, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: Vec<TagAlias>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the expansion for `from`. A replaced entry keeps
    /// its position.
    pub fn set(&mut self, from: impl Into<String>, to: TagSet) {
        let from = from.into();
        match self.aliases.iter_mut().find(|a| a.from == from) {
            Some(existing) => existing.to = to,
            None => self.aliases.push(TagAlias { from, to }),
        }
    }

    pub fn get(&self, from: &str) -> Option<&TagSet> {
        self.aliases.iter().find(|a| a.from == from).map(|a| &a.to)
    }

    pub fn get_mut(&mut self, from: &str) -> Option<&mut TagSet> {
        self.aliases
            .iter_mut()
            .find(|a| a.from == from)
            .map(|a| &mut a.to)
    }

    pub fn remove(&mut self, from: &str) -> Option<TagSet> {
        let index = self.aliases.iter().position(|a| a.from == from)?;
        Some(self.aliases.remove(index).to)
    }

    /// Change the key of an alias in place. Refuses when `from` is absent or
    /// `to` is already a key.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.contains(from);
        }
        if self.contains(to) {
            return false;
        }
        match self.aliases.iter_mut().find(|a| a.from == from) {
            Some(alias) => {
                alias.from = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, from: &str) -> bool {
        self.aliases.iter().any(|a| a.from == from)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagAlias> {
        self.aliases.iter()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn clear(&mut self) {
        self.aliases.clear();
    }

    /// Base tags plus the expansion of every base tag that has an alias.
    ///
    /// Single pass: tags added by an alias are not expanded again.
    pub fn expand(&self, base: &TagSet) -> TagSet {
        let mut expanded = base.clone();
        for alias in &self.aliases {
            if base.contains(&alias.from) {
                expanded.merge(&alias.to);
            }
        }
        expanded
    }
}
