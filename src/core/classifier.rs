/// Classifiers — a configured condition plus the tags it contributes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::core::condition::{Condition, ConditionRegistry};
use crate::core::params::{Mismatch, Params};
use crate::schema::subject::Encounter;
use crate::schema::tag::TagSet;

/// Why a single classifier or tag expansion entry was rejected.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("unknown rule '{0}'")]
    UnknownCondition(String),
    #[error("wrong parameters for rule '{rule}': {mismatch}")]
    InvalidParams { rule: String, mismatch: Mismatch },
    #[error("malformed entry: {0}")]
    Malformed(#[from] ron::Error),
}

/// Tags demanded and forbidden by one classifier branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierOutcome {
    #[serde(rename = "req_tags")]
    pub required: TagSet,
    #[serde(rename = "ban_tags")]
    pub banned: TagSet,
}

impl ClassifierOutcome {
    pub fn new(required: TagSet, banned: TagSet) -> Self {
        Self { required, banned }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.banned.is_empty()
    }

    pub fn merge(&mut self, other: &ClassifierOutcome) {
        self.required.merge(&other.required);
        self.banned.merge(&other.banned);
    }
}

/// A condition instance with its parameters and per-branch outcomes.
///
/// `params` always fits the condition's schema: construction and every
/// mutator that touches either one validate first.
#[derive(Clone)]
pub struct Classifier {
    condition: Arc<dyn Condition>,
    params: Params,
    pub comment: String,
    pub enable_on_true: bool,
    pub enable_on_false: bool,
    pub outcome_on_true: ClassifierOutcome,
    pub outcome_on_false: ClassifierOutcome,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("condition", &self.condition.name())
            .field("params", &self.params)
            .field("comment", &self.comment)
            .field("enable_on_true", &self.enable_on_true)
            .field("enable_on_false", &self.enable_on_false)
            .field("outcome_on_true", &self.outcome_on_true)
            .field("outcome_on_false", &self.outcome_on_false)
            .finish()
    }
}

impl PartialEq for Classifier {
    fn eq(&self, other: &Self) -> bool {
        self.condition.name() == other.condition.name()
            && self.params == other.params
            && self.comment == other.comment
            && self.enable_on_true == other.enable_on_true
            && self.enable_on_false == other.enable_on_false
            && self.outcome_on_true == other.outcome_on_true
            && self.outcome_on_false == other.outcome_on_false
    }
}

impl Classifier {
    /// A classifier for the named condition with its default parameters,
    /// the true branch enabled and empty outcomes.
    pub fn new(registry: &ConditionRegistry, rule: &str) -> Result<Self, EntryError> {
        let condition = registry
            .lookup(rule)
            .ok_or_else(|| EntryError::UnknownCondition(rule.to_string()))?;
        Ok(Self {
            params: condition.default_params(),
            condition,
            comment: String::new(),
            enable_on_true: true,
            enable_on_false: false,
            outcome_on_true: ClassifierOutcome::default(),
            outcome_on_false: ClassifierOutcome::default(),
        })
    }

    /// A classifier for the named condition with explicit parameters.
    pub fn with_params(registry: &ConditionRegistry, rule: &str, params: Params) -> Result<Self, EntryError> {
        let mut classifier = Self::new(registry, rule)?;
        classifier.set_params(params)?;
        Ok(classifier)
    }

    pub fn on_true(mut self, outcome: ClassifierOutcome) -> Self {
        self.enable_on_true = true;
        self.outcome_on_true = outcome;
        self
    }

    pub fn on_false(mut self, outcome: ClassifierOutcome) -> Self {
        self.enable_on_false = true;
        self.outcome_on_false = outcome;
        self
    }

    pub fn condition_name(&self) -> &'static str {
        self.condition.name()
    }

    pub fn hint(&self) -> &'static str {
        self.condition.hint()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replace the parameters. Rejected values leave the classifier unchanged.
    pub fn set_params(&mut self, params: Params) -> Result<(), EntryError> {
        self.condition
            .check_params(&params)
            .map_err(|mismatch| EntryError::InvalidParams {
                rule: self.condition.name().to_string(),
                mismatch,
            })?;
        self.params = params;
        Ok(())
    }

    /// Switch to another condition. Parameters reset to its defaults.
    pub fn set_condition(&mut self, registry: &ConditionRegistry, rule: &str) -> Result<(), EntryError> {
        let condition = registry
            .lookup(rule)
            .ok_or_else(|| EntryError::UnknownCondition(rule.to_string()))?;
        self.params = condition.default_params();
        self.condition = condition;
        Ok(())
    }

    /// Raw condition result, without branch gating.
    pub fn test(&self, encounter: &Encounter<'_>) -> bool {
        self.condition.evaluate(&self.params, encounter)
    }

    /// The outcome of the branch taken, or an empty outcome when that
    /// branch is disabled.
    pub fn evaluate(&self, encounter: &Encounter<'_>) -> ClassifierOutcome {
        match self.test(encounter) {
            true if self.enable_on_true => self.outcome_on_true.clone(),
            false if self.enable_on_false => self.outcome_on_false.clone(),
            _ => ClassifierOutcome::default(),
        }
    }

    pub(crate) fn from_entry(registry: &ConditionRegistry, entry: ClassifierEntry) -> Result<Self, EntryError> {
        let mut classifier = Self::with_params(registry, &entry.rule, entry.params)?;
        classifier.comment = entry.comment;
        classifier.enable_on_true = entry.enable_true;
        classifier.enable_on_false = entry.enable_false;
        classifier.outcome_on_true = entry.true_tags;
        classifier.outcome_on_false = entry.false_tags;
        Ok(classifier)
    }

    pub(crate) fn to_entry(&self) -> ClassifierEntry {
        ClassifierEntry {
            rule: self.condition.name().to_string(),
            params: self.params.clone(),
            comment: self.comment.clone(),
            enable_true: self.enable_on_true,
            enable_false: self.enable_on_false,
            true_tags: self.outcome_on_true.clone(),
            false_tags: self.outcome_on_false.clone(),
        }
    }
}

/// On-disk shape of a classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ClassifierEntry {
    pub rule: String,
    pub params: Params,
    pub comment: String,
    pub enable_true: bool,
    pub enable_false: bool,
    pub true_tags: ClassifierOutcome,
    pub false_tags: ClassifierOutcome,
}
