/// The filter pipeline: classifiers → tag constraints → candidate choice.
///
/// Evaluates every classifier against an encounter, unions the required and
/// banned tags they contribute, expands each candidate's tags through the
/// alias table, and picks uniformly among the candidates that satisfy the
/// constraints.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};

use crate::core::alias::AliasTable;
use crate::core::classifier::{Classifier, ClassifierOutcome};
use crate::core::condition::{builtin_registry, ConditionRegistry};
use crate::schema::candidate::Candidate;
use crate::schema::subject::Encounter;
use crate::schema::tag::TagSet;

// Seeded from OS entropy on first use, then shared by every selection.
static SHARED_RNG: Lazy<Mutex<StdRng>> = Lazy::new(|| Mutex::new(StdRng::from_entropy()));

/// Ordered classifiers plus the tag alias table.
///
/// No internal locking: callers serialize edits and loads against
/// concurrent `select` calls, e.g. by keeping the pipeline in a `RwLock`.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    pub(crate) registry: Arc<ConditionRegistry>,
    pub(crate) classifiers: Vec<Classifier>,
    pub(crate) aliases: AliasTable,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPipeline {
    /// An empty pipeline resolving conditions against the built-in registry.
    pub fn new() -> Self {
        Self::with_registry(builtin_registry())
    }

    pub fn with_registry(registry: Arc<ConditionRegistry>) -> Self {
        Self {
            registry,
            classifiers: Vec::new(),
            aliases: AliasTable::new(),
        }
    }

    pub fn registry(&self) -> &ConditionRegistry {
        &self.registry
    }

    // --- Editing ----------------------------------------------------------

    pub fn classifiers(&self) -> &[Classifier] {
        &self.classifiers
    }

    pub fn classifier(&self, index: usize) -> Option<&Classifier> {
        self.classifiers.get(index)
    }

    pub fn classifier_mut(&mut self, index: usize) -> Option<&mut Classifier> {
        self.classifiers.get_mut(index)
    }

    pub fn push_classifier(&mut self, classifier: Classifier) {
        self.classifiers.push(classifier);
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn insert_classifier(&mut self, index: usize, classifier: Classifier) {
        let index = index.min(self.classifiers.len());
        self.classifiers.insert(index, classifier);
    }

    pub fn remove_classifier(&mut self, index: usize) -> Option<Classifier> {
        (index < self.classifiers.len()).then(|| self.classifiers.remove(index))
    }

    /// Move the classifier at `from` so that it ends up at `to`.
    pub fn move_classifier(&mut self, from: usize, to: usize) -> bool {
        let len = self.classifiers.len();
        if from >= len || to >= len {
            return false;
        }
        let classifier = self.classifiers.remove(from);
        self.classifiers.insert(to, classifier);
        true
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasTable {
        &mut self.aliases
    }

    pub fn alias(&self, from: &str) -> Option<&TagSet> {
        self.aliases.get(from)
    }

    pub fn set_alias(&mut self, from: impl Into<String>, to: TagSet) {
        self.aliases.set(from, to);
    }

    pub fn remove_alias(&mut self, from: &str) -> Option<TagSet> {
        self.aliases.remove(from)
    }

    pub fn rename_alias(&mut self, from: &str, to: &str) -> bool {
        self.aliases.rename(from, to)
    }

    pub fn clear(&mut self) {
        self.classifiers.clear();
        self.aliases.clear();
    }

    // --- Evaluation -------------------------------------------------------

    /// Union of the outcomes of every classifier, evaluated in list order.
    pub fn aggregate(&self, encounter: &Encounter<'_>) -> ClassifierOutcome {
        let mut combined = ClassifierOutcome::default();
        for classifier in &self.classifiers {
            combined.merge(&classifier.evaluate(encounter));
        }
        combined
    }

    /// Candidate tags after one pass of alias expansion.
    pub fn expand(&self, base: &TagSet) -> TagSet {
        self.aliases.expand(base)
    }

    /// Whether tags satisfy an aggregated outcome once expanded.
    pub fn qualifies(&self, constraints: &ClassifierOutcome, base: &TagSet) -> bool {
        let expanded = self.expand(base);
        constraints.required.is_subset(&expanded) && constraints.banned.is_disjoint(&expanded)
    }

    /// Every qualifying candidate, in catalog order.
    pub fn filter<'c, C, I>(&self, encounter: &Encounter<'_>, candidates: I) -> Vec<&'c C>
    where
        C: Candidate + 'c,
        I: IntoIterator<Item = &'c C>,
    {
        let constraints = self.aggregate(encounter);
        let mut total = 0usize;
        let qualifying: Vec<&C> = candidates
            .into_iter()
            .inspect(|_| total += 1)
            .filter(|c| self.qualifies(&constraints, c.tags()))
            .collect();
        tracing::debug!(
            required = %constraints.required.join(),
            banned = %constraints.banned.join(),
            total,
            qualifying = qualifying.len(),
            "filtered candidates"
        );
        qualifying
    }

    /// Pick one qualifying candidate uniformly at random using the shared,
    /// once-seeded generator. `None` when nothing qualifies.
    pub fn select<'c, C, I>(&self, encounter: &Encounter<'_>, candidates: I) -> Option<&'c C>
    where
        C: Candidate + 'c,
        I: IntoIterator<Item = &'c C>,
    {
        let qualifying = self.filter(encounter, candidates);
        if qualifying.is_empty() {
            return None;
        }
        let mut rng = SHARED_RNG.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        qualifying.choose(&mut *rng).copied()
    }

    /// Like [`select`](Self::select) with a caller-provided generator.
    pub fn select_with_rng<'c, C, I, R>(&self, encounter: &Encounter<'_>, candidates: I, rng: &mut R) -> Option<&'c C>
    where
        C: Candidate + 'c,
        I: IntoIterator<Item = &'c C>,
        R: Rng + ?Sized,
    {
        self.filter(encounter, candidates).choose(rng).copied()
    }
}
