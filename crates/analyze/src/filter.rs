//! Persistent problem filters.
//!
//! A filter suppresses one problem on one resource. The store is a JSON
//! array of filters, sorted so that saved files diff cleanly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::error::FilterStoreError;
use crate::problem::Problem;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProblemFilter {
    pub resource: String,
    pub id: u32,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProblemFilter {
    pub fn for_problem(problem: &Problem) -> Self {
        ProblemFilter {
            resource: problem.resource.clone(),
            id: problem.id,
            args: problem.args.clone(),
        }
    }

    pub fn matches(&self, problem: &Problem) -> bool {
        self.resource == problem.resource
            && self.id == problem.id
            && self.args == problem.args
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStore {
    filters: BTreeSet<ProblemFilter>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter for `problem`. Returns false if it was already filtered.
    pub fn add(&mut self, problem: &Problem) -> bool {
        self.filters.insert(ProblemFilter::for_problem(problem))
    }

    pub fn insert(&mut self, filter: ProblemFilter) -> bool {
        self.filters.insert(filter)
    }

    pub fn remove(&mut self, filter: &ProblemFilter) -> bool {
        self.filters.remove(filter)
    }

    pub fn is_filtered(&self, problem: &Problem) -> bool {
        self.filters.iter().any(|f| f.matches(problem))
    }

    pub fn filters(&self) -> impl Iterator<Item = &ProblemFilter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn from_json(input: &str) -> Result<Self, FilterStoreError> {
        let filters: Vec<ProblemFilter> = serde_json::from_str(input)?;
        Ok(FilterStore {
            filters: filters.into_iter().collect(),
        })
    }

    pub fn to_json(&self) -> Result<String, FilterStoreError> {
        let filters: Vec<&ProblemFilter> = self.filters.iter().collect();
        Ok(serde_json::to_string_pretty(&filters)?)
    }

    /// Load a store; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, FilterStoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "no filter store, starting empty");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| FilterStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), FilterStoreError> {
        let text = self.to_json()?;
        std::fs::write(path, text + "\n").map_err(|source| FilterStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), count = self.len(), "saved filter store");
        Ok(())
    }
}
