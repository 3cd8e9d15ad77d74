//! Candidate store: discovery-ordered registry of candidates for one run.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::{Candidate, ScoreCard};

/// Registry of every candidate in a run, keyed by id.
///
/// Enumeration is always in insertion (discovery) order. Serializes as a plain
/// sequence of candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Candidate>", try_from = "Vec<Candidate>")]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate. Ids must be unique within the store.
    pub fn insert(&mut self, candidate: Candidate) -> Result<(), StoreError> {
        if candidate.id().is_empty() {
            return Err(StoreError::EmptyId);
        }
        if self.index.contains_key(candidate.id()) {
            return Err(StoreError::DuplicateId(candidate.id().to_string()));
        }

        self.index
            .insert(candidate.id().to_string(), self.candidates.len());
        self.candidates.push(candidate);
        Ok(())
    }

    /// Get a candidate by id.
    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.index.get(id).map(|&i| &self.candidates[i])
    }

    /// Whether a candidate with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Replace the candidate's unscored state with an evaluation.
    ///
    /// Returns `false` if the id is unknown.
    pub fn apply_score(&mut self, id: &str, card: ScoreCard) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let candidate = self.candidates[i].clone();
        self.candidates[i] = candidate.scored(card);
        true
    }

    /// All candidates in discovery order.
    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    /// All candidates in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Fully scored candidates by fitness (descending), ties in discovery order.
    pub fn ranked(&self) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> =
            self.candidates.iter().filter(|c| c.is_rankable()).collect();
        // Stable sort keeps discovery order among equal fitness.
        ranked.sort_by(|a, b| compare_fitness(b, a));
        ranked
    }

    /// Top `n` ranked candidates.
    pub fn top_n(&self, n: usize) -> Vec<&Candidate> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Order by fitness with NaN and missing fitness sorting lowest.
fn compare_fitness(a: &Candidate, b: &Candidate) -> Ordering {
    let key = |c: &Candidate| c.fitness().filter(|f| !f.is_nan());
    match (key(a), key(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

impl From<CandidateStore> for Vec<Candidate> {
    fn from(store: CandidateStore) -> Self {
        store.candidates
    }
}

impl TryFrom<Vec<Candidate>> for CandidateStore {
    type Error = StoreError;

    fn try_from(candidates: Vec<Candidate>) -> Result<Self, Self::Error> {
        let mut store = Self::new();
        for candidate in candidates {
            store.insert(candidate)?;
        }
        Ok(store)
    }
}

/// Candidate store invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Candidate id {0:?} is already registered")]
    DuplicateId(String),
    #[error("Candidate id must not be empty")]
    EmptyId,
}
