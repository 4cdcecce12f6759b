/// Table loading — YAML documents merged into a single `TableStore`.

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::schema::table::{TableStore, TableValue};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML deserialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("document {index} is not a mapping at the top level")]
    InvalidRoot { index: usize },
}

/// Parse every YAML document in `input` and merge them in order.
pub fn load_tables_str(input: &str) -> Result<TableStore, LoadError> {
    let mut store = TableStore::new();
    for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let value = Value::deserialize(document)?;
        match value {
            Value::Null => continue,
            Value::Mapping(_) => {}
            _ => return Err(LoadError::InvalidRoot { index }),
        }
        if let TableValue::Map(root) = convert(&value) {
            store.merge(TableStore::from_map(root));
        }
    }
    Ok(store)
}

/// Load a single YAML file.
pub fn load_tables_file(path: &Path) -> Result<TableStore, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_tables_str(&contents)
}

/// Load every `.yaml`/`.yml` file under `dir`, recursively, merged in
/// file-name order.
pub fn load_tables_dir(dir: &Path) -> Result<TableStore, LoadError> {
    let mut files = Vec::new();
    collect_yaml_files(dir, &mut files)?;
    files.sort();

    let mut store = TableStore::new();
    for path in files {
        tracing::debug!(path = %path.display(), "loading tables");
        store.merge(load_tables_file(&path)?);
    }
    Ok(store)
}

/// Load a file or a directory, whichever `path` is.
pub fn load_tables_path(path: &Path) -> Result<TableStore, LoadError> {
    if path.is_dir() {
        load_tables_dir(path)
    } else {
        load_tables_file(path)
    }
}

fn collect_yaml_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<(), LoadError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_yaml_files(&path, out)?;
        } else if matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        ) {
            out.push(path);
        }
    }
    Ok(())
}

fn convert(value: &Value) -> TableValue {
    match value {
        Value::Mapping(mapping) => {
            let mut map = BTreeMap::new();
            for (key, child) in mapping {
                let Some(key) = scalar_text(key) else {
                    tracing::warn!(?key, "skipping non-scalar table key");
                    continue;
                };
                map.insert(key, convert(child));
            }
            TableValue::Map(map)
        }
        Value::Sequence(items) => TableValue::List(
            items
                .iter()
                .filter_map(|item| {
                    let text = scalar_text(item);
                    if text.is_none() {
                        tracing::warn!(?item, "skipping non-scalar list item");
                    }
                    text
                })
                .collect(),
        ),
        Value::Tagged(tagged) => convert(&tagged.value),
        other => TableValue::Scalar(scalar_text(other).unwrap_or_default()),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
