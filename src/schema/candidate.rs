use serde::{Deserialize, Serialize};
use std::path::Path;

use super::tag::TagSet;

/// Something the pipeline can pick: an ID and its base tags.
///
/// The catalog owns candidates; the pipeline only reads them.
pub trait Candidate {
    fn id(&self) -> &str;
    fn tags(&self) -> &TagSet;
}

/// A plain catalog entry, e.g. one paired idle and its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub id: String,
    #[serde(default)]
    pub tags: TagSet,
}

impl CandidateEntry {
    pub fn new(id: impl Into<String>, tags: TagSet) -> Self {
        Self { id: id.into(), tags }
    }
}

impl Candidate for CandidateEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }
}

/// Load a list of entries from a RON file.
pub fn load_catalog(path: &Path) -> Result<Vec<CandidateEntry>, CatalogError> {
    let contents = std::fs::read_to_string(path)?;
    parse_catalog(&contents)
}

/// Parse a list of entries from a RON string.
pub fn parse_catalog(input: &str) -> Result<Vec<CandidateEntry>, CatalogError> {
    Ok(ron::from_str(input)?)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
