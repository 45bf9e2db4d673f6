use tracing::debug;

use crate::arg::ArgumentSet;
use crate::errors::Result;

/// The argument sets collected for one parse: the parser's own set first,
/// then every discovered module and plugin set, each at most once.
#[derive(Debug, Clone)]
pub struct Grammar {
    sets: Vec<ArgumentSet>,
}

impl Grammar {
    pub fn new(top: ArgumentSet) -> Self {
        Self { sets: vec![top] }
    }

    pub fn contains(&self, description: &str) -> bool {
        self.sets.iter().any(|s| s.description() == description)
    }

    /// Add `set` unless one with the same description is already present.
    pub fn add(&mut self, set: ArgumentSet) -> bool {
        if self.contains(set.description()) {
            debug!(set = set.description(), "argument set already merged");
            return false;
        }
        debug!(set = set.description(), options = set.options().len(), "merging argument set");
        self.sets.push(set);
        true
    }

    pub fn sets(&self) -> &[ArgumentSet] {
        &self.sets
    }

    /// One set holding every option; identical duplicates collapse, other
    /// clashes are [`crate::errors::Error::OptionConflict`].
    pub fn merged(&self) -> Result<ArgumentSet> {
        let mut iter = self.sets.iter();
        let mut merged = iter.next().cloned().unwrap_or_default();
        for set in iter {
            for spec in set.options() {
                merged.add_argument(spec.clone())?;
            }
        }
        Ok(merged)
    }
}
