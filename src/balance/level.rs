//! Class levels and per-level count mappings
//!
//! Class values are compared by their text rendering, so a level is either
//! a string or the distinguished null level. All mappings are ordered,
//! which keeps plans and rendered statements deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// A distinct value of the class column
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Missing class value
    Null,
    /// Text rendering of a class value
    Value(String),
}

impl Level {
    pub fn value(v: impl Into<String>) -> Self {
        Level::Value(v.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Level::Null)
    }

    /// Text used for this level inside generated statements.
    ///
    /// The null level maps to the reserved sentinel.
    pub fn key_text<'a>(&'a self, null_sentinel: &'a str) -> &'a str {
        match self {
            Level::Null => null_sentinel,
            Level::Value(v) => v,
        }
    }
}

impl From<Option<String>> for Level {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => Level::Value(v),
            None => Level::Null,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Null => write!(f, "NULL"),
            Level::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Level::Null => serializer.serialize_none(),
            Level::Value(v) => serializer.serialize_str(v),
        }
    }
}

/// Observed row count per level.
///
/// Built once per invocation and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrequencyMapping {
    counts: BTreeMap<Level, u64>,
}

impl FrequencyMapping {
    /// Builds a mapping, dropping zero counts
    pub fn new(counts: impl IntoIterator<Item = (Level, u64)>) -> Self {
        Self {
            counts: counts.into_iter().filter(|(_, n)| *n > 0).collect(),
        }
    }

    pub fn get(&self, level: &Level) -> Option<u64> {
        self.counts.get(level).copied()
    }

    pub fn contains(&self, level: &Level) -> bool {
        self.counts.contains_key(level)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.counts.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Level, u64)> {
        self.counts.iter().map(|(l, n)| (l, *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    pub fn min_count(&self) -> Option<u64> {
        self.counts.values().copied().min()
    }

    pub fn max_count(&self) -> Option<u64> {
        self.counts.values().copied().max()
    }

    pub fn as_map(&self) -> &BTreeMap<Level, u64> {
        &self.counts
    }
}

impl Serialize for FrequencyMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        #[derive(Serialize)]
        struct Entry<'a> {
            level: &'a Level,
            count: u64,
        }

        let mut seq = serializer.serialize_seq(Some(self.counts.len()))?;
        for (level, count) in &self.counts {
            seq.serialize_element(&Entry {
                level,
                count: *count,
            })?;
        }
        seq.end()
    }
}

/// User-requested row count per level; may cover a subset of levels
pub type DesiredSizeMapping = BTreeMap<Level, u64>;
