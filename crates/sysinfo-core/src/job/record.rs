//! The ordered key/value record a job run produces.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::step::KeyValueSample;

/// Ordered mapping from metric key to value.
///
/// Iteration follows first-insertion order. Inserting an existing key
/// overwrites its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateRecord {
    entries: Vec<(String, String)>,
}

impl AggregateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sample, overwriting the value of an existing key.
    pub fn insert(&mut self, sample: KeyValueSample) {
        match self.entries.iter_mut().find(|(k, _)| *k == sample.key) {
            Some((_, value)) => *value = sample.value,
            None => self.entries.push((sample.key, sample.value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for AggregateRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
