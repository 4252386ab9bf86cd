/// Shared utility types for the ZEV structure engine
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;

/// Insertion-ordered label → value map.
///
/// Column labels and month names must keep sheet order when serialized, so
/// this serializes as a JSON object whose keys appear in insertion order.
/// Inserting an existing label replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for LabelledMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> LabelledMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: V) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for LabelledMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = LabelledMap::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for LabelledMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(l, v)| (l, v)))
    }
}

/// Make labels unique the way spreadsheet readers do: a repeated label gets
/// `.1`, `.2`, ... appended, skipping suffixes that are already taken.
pub fn dedupe_labels(labels: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<String> = Vec::new();

    for label in labels {
        let mut candidate = label.clone();
        while out.contains(&candidate) {
            let n = seen.entry(label.clone()).or_insert(0);
            *n += 1;
            candidate = format!("{label}.{n}");
        }
        out.push(candidate);
    }

    out
}

/// Render a number the way it reads in the sheet: integral values without
/// a fractional part ("120"), everything else with Rust's shortest form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
