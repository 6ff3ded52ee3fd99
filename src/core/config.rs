/// Filter files — RON load and save for a [`FilterPipeline`].
///
/// A filter file holds two sections:
///
/// ```ron
/// (
///     taggers: [
///         (
///             rule: "Bleedout",
///             params: {"check_attacker": false},
///             comment: "downed victims get bleedout animations",
///             enable_true: true,
///             enable_false: true,
///             true_tags: (req_tags: ["bleedout"], ban_tags: []),
///             false_tags: (req_tags: [], ban_tags: ["bleedout"]),
///         ),
///     ],
///     tagexps: {
///         "1hm": ["1h", "melee"],
///     },
/// )
/// ```
///
/// Loading is tolerant per entry: a bad tagger or tag expansion is reported
/// and skipped while the rest of the file still loads.

use ron::ser::PrettyConfig;
use ron::Value;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::core::alias::AliasTable;
use crate::core::classifier::{Classifier, ClassifierEntry, EntryError};
use crate::core::pipeline::FilterPipeline;
use crate::schema::tag::TagSet;

const TAGGERS_KEY: &str = "taggers";
const TAG_EXPANSIONS_KEY: &str = "tagexps";

/// Failures that abort a whole load or save.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("filter file must be a struct or map with \"taggers\" and \"tagexps\"")]
    NotADocument,
    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// How a load treats what the pipeline already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Clear classifiers and aliases before loading.
    #[default]
    Replace,
    /// Append classifiers; insert or overwrite aliases by key.
    Append,
}

/// Where in the file a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A whole section is missing or has the wrong shape.
    Section(&'static str),
    /// The tagger at this index of the `taggers` list.
    Tagger(usize),
    /// The tag expansion with this key.
    TagExpansion(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section(name) => write!(f, "section \"{}\"", name),
            Self::Tagger(index) => write!(f, "tagger #{}", index),
            Self::TagExpansion(from) => write!(f, "tag expansion \"{}\"", from),
        }
    }
}

/// Why an entry or section was skipped.
#[derive(Debug, Error)]
pub enum Problem {
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error("required field missing, skipped")]
    MissingSection,
    #[error("wrong data type, expected {0}")]
    WrongType(&'static str),
}

/// One skipped entry or section.
#[derive(Debug)]
pub struct Diagnostic {
    pub location: Location,
    pub problem: Problem,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.problem)
    }
}

/// Result of a load that got past parsing.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub classifiers_loaded: usize,
    pub aliases_loaded: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    /// True when nothing was skipped.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn skip(&mut self, location: Location, problem: impl Into<Problem>) {
        let diagnostic = Diagnostic {
            location,
            problem: problem.into(),
        };
        tracing::warn!("Failed to parse {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// On-disk shape of the whole file, for saving.
#[derive(Serialize)]
struct FilterDocument<'a> {
    taggers: Vec<ClassifierEntry>,
    tagexps: TagExpansions<'a>,
}

struct TagExpansions<'a>(&'a AliasTable);

impl Serialize for TagExpansions<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|alias| (&alias.from, &alias.to)))
    }
}

impl FilterPipeline {
    /// Load a filter file. Fails without touching the pipeline when the file
    /// cannot be read or parsed; otherwise returns what was skipped.
    pub fn load_file(&mut self, path: &Path, mode: LoadMode) -> Result<LoadReport, FilterError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!("Failed to read filter file {}: {}", path.display(), e);
            e
        })?;
        tracing::info!("Parsing filter file {}", path.display());
        self.load_str(&contents, mode)
    }

    /// Load filter RON from a string. See [`load_file`](Self::load_file).
    pub fn load_str(&mut self, input: &str, mode: LoadMode) -> Result<LoadReport, FilterError> {
        let document: Value = ron::from_str(input).map_err(|e| {
            tracing::warn!("Failed to parse filter file: {}", e);
            e
        })?;
        let Value::Map(sections) = document else {
            tracing::warn!("Failed to parse filter file: top level is not a struct");
            return Err(FilterError::NotADocument);
        };

        let mut taggers = None;
        let mut tag_expansions = None;
        for (key, value) in sections.iter() {
            match key {
                Value::String(k) if k == TAGGERS_KEY => taggers = Some(value.clone()),
                Value::String(k) if k == TAG_EXPANSIONS_KEY => tag_expansions = Some(value.clone()),
                _ => tracing::debug!("Ignoring unknown filter file key {:?}", key),
            }
        }

        if mode == LoadMode::Replace {
            self.clear();
        }

        let mut report = LoadReport::default();
        self.load_taggers(taggers, &mut report);
        self.load_tag_expansions(tag_expansions, &mut report);

        if report.is_ok() {
            tracing::info!(
                "Loaded {} taggers and {} tag expansions",
                report.classifiers_loaded,
                report.aliases_loaded
            );
        } else {
            tracing::warn!(
                "Loaded {} taggers and {} tag expansions, {} entries skipped",
                report.classifiers_loaded,
                report.aliases_loaded,
                report.diagnostics.len()
            );
        }
        Ok(report)
    }

    fn load_taggers(&mut self, section: Option<Value>, report: &mut LoadReport) {
        let entries = match section {
            Some(Value::Seq(entries)) => entries,
            Some(_) => {
                report.skip(Location::Section(TAGGERS_KEY), Problem::WrongType("a list"));
                return;
            }
            None => {
                tracing::warn!("Required \"{}\" field unfulfilled. Skipped.", TAGGERS_KEY);
                return;
            }
        };

        for (index, value) in entries.into_iter().enumerate() {
            let parsed = value
                .into_rust::<ClassifierEntry>()
                .map_err(EntryError::from)
                .and_then(|entry| Classifier::from_entry(&self.registry, entry));
            match parsed {
                Ok(classifier) => {
                    self.classifiers.push(classifier);
                    report.classifiers_loaded += 1;
                }
                Err(e) => report.skip(Location::Tagger(index), e),
            }
        }
    }

    fn load_tag_expansions(&mut self, section: Option<Value>, report: &mut LoadReport) {
        let entries = match section {
            Some(Value::Map(entries)) => entries,
            Some(_) => {
                report.skip(Location::Section(TAG_EXPANSIONS_KEY), Problem::WrongType("a map"));
                return;
            }
            None => {
                report.skip(Location::Section(TAG_EXPANSIONS_KEY), Problem::MissingSection);
                return;
            }
        };

        for (key, value) in entries.iter() {
            let Value::String(from) = key else {
                report.skip(
                    Location::TagExpansion(format!("{:?}", key)),
                    Problem::WrongType("a string key"),
                );
                continue;
            };
            match value.clone().into_rust::<TagSet>() {
                Ok(to) => {
                    self.aliases.set(from.clone(), to);
                    report.aliases_loaded += 1;
                }
                Err(e) => report.skip(Location::TagExpansion(from.clone()), EntryError::from(e)),
            }
        }
    }

    /// Serialize every classifier and tag expansion as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, FilterError> {
        let document = FilterDocument {
            taggers: self.classifiers.iter().map(Classifier::to_entry).collect(),
            tagexps: TagExpansions(&self.aliases),
        };
        let pretty = PrettyConfig::new().struct_names(false);
        Ok(ron::ser::to_string_pretty(&document, pretty)?)
    }

    /// Write the filter file in one go. The file is left untouched when
    /// serialization fails.
    pub fn save_file(&self, path: &Path) -> Result<(), FilterError> {
        tracing::info!("Saving filter file {}", path.display());
        let contents = self.to_ron_string()?;
        std::fs::write(path, contents).map_err(|e| {
            tracing::error!("Failed to write at {}: {}", path.display(), e);
            FilterError::Io(e)
        })
    }
}
