/// Table store — the nested list data templates select from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the loaded table data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableValue {
    /// A leaf list of raw (possibly weight-annotated) strings.
    List(Vec<String>),
    Map(BTreeMap<String, TableValue>),
    Scalar(String),
}

impl TableValue {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TableValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, TableValue>> {
        match self {
            TableValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Merge `other` into `self`: lists concatenate, maps merge
    /// recursively, anything else is replaced by `other`.
    pub fn merge(&mut self, other: TableValue) {
        match (self, other) {
            (TableValue::List(mine), TableValue::List(theirs)) => mine.extend(theirs),
            (TableValue::Map(mine), TableValue::Map(theirs)) => {
                for (key, value) in theirs {
                    match mine.get_mut(&key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            mine.insert(key, value);
                        }
                    }
                }
            }
            (slot, other) => *slot = other,
        }
    }
}

/// Read-only root of the table data. Built once by the loader and
/// handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStore {
    root: BTreeMap<String, TableValue>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: BTreeMap<String, TableValue>) -> Self {
        Self { root }
    }

    /// Insert a top-level table, merging with any existing table of
    /// the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: TableValue) {
        let name = name.into();
        match self.root.get_mut(&name) {
            Some(existing) => existing.merge(value),
            None => {
                self.root.insert(name, value);
            }
        }
    }

    /// Merge another store into this one. Later values win scalar ties.
    pub fn merge(&mut self, other: TableStore) {
        for (name, value) in other.root {
            self.insert(name, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn root(&self) -> &BTreeMap<String, TableValue> {
        &self.root
    }

    /// Walk a dotted path. Missing segments and non-map intermediates
    /// yield `None`.
    pub fn resolve_raw(&self, path: &str) -> Option<&TableValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Resolve a dotted path to a leaf list. Anything else is "not found".
    pub fn resolve(&self, path: &str) -> Option<&[String]> {
        self.resolve_raw(path)?.as_list()
    }

    /// Visit every leaf list with its dotted path.
    pub fn for_each_list<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &[String]),
    {
        fn walk<F: FnMut(&str, &[String])>(prefix: &str, value: &TableValue, visit: &mut F) {
            match value {
                TableValue::List(items) => visit(prefix, items),
                TableValue::Map(map) => {
                    for (key, child) in map {
                        walk(&format!("{}.{}", prefix, key), child, visit);
                    }
                }
                TableValue::Scalar(_) => {}
            }
        }

        for (name, value) in &self.root {
            walk(name, value, &mut visit);
        }
    }
}
