//! The resolved configuration tree.
//!
//! Nested objects form dotted key paths (`rpc.listen`). A source key that
//! already contains dots (`{"rpc.listen": ...}`) is split into the same
//! nested form when the tree is built. Keys are case-insensitive: they are
//! lowercased when the tree is built and on every lookup and write.

use serde_json::{Map, Value};

const SEPARATOR: char = '.';

/// Mapping from dotted key paths to untyped values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Build a tree from a parsed source. Non-object roots yield an empty tree.
    ///
    /// Dotted keys are split into nested objects and merged with any object
    /// already at that path.
    pub fn from_value(value: Value) -> Self {
        match normalize(value) {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    /// Value at `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.to_lowercase();
        let mut segments = key.split(SEPARATOR);
        let first = segments.next()?;
        segments.try_fold(self.root.get(first)?, |node, segment| {
            node.as_object()?.get(segment)
        })
    }

    /// Whether `key` addresses a node.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` at `key`, creating or replacing intermediate objects.
    ///
    /// Returns `false`, leaving the tree untouched, when `key` has an empty
    /// segment.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        if !is_valid_key(key) {
            return false;
        }

        let key = key.to_lowercase();
        let mut segments: Vec<&str> = key.split(SEPARATOR).collect();
        let Some(last) = segments.pop() else {
            return false;
        };

        let mut node = &mut self.root;
        for segment in segments {
            let entry = node
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return false;
            };
            node = map;
        }

        node.insert(last.to_string(), normalize(value));
        true
    }

    /// Dotted paths of every leaf, in key order.
    ///
    /// Objects are descended into; everything else, sequences and empty
    /// objects included, is a leaf.
    pub fn leaf_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_leaves(&self.root, "", &mut keys);
        keys
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaf_keys().len()
    }

    /// Whether the tree has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The tree as a single object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

/// Whether `key` has no empty segments.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.split(SEPARATOR).all(|segment| !segment.is_empty())
}

fn collect_leaves(map: &Map<String, Value>, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{SEPARATOR}{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => collect_leaves(inner, &path, keys),
            _ => keys.push(path),
        }
    }
}

/// Lowercase every key and expand dotted keys into nested objects.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                insert_path(&mut out, &key.to_lowercase(), normalize(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Merge `value` into `map` at dotted `key`. Keys with empty segments are
/// kept as written.
fn insert_path(map: &mut Map<String, Value>, key: &str, value: Value) {
    let segments: Vec<&str> = if is_valid_key(key) {
        key.split(SEPARATOR).collect()
    } else {
        vec![key]
    };
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = map;
    for segment in parents {
        let entry = node
            .entry(*segment)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(inner) = entry else {
            return;
        };
        node = inner;
    }

    match node.get_mut(*last) {
        Some(existing) => merge(existing, value),
        None => {
            node.insert((*last).to_string(), value);
        }
    }
}

/// Objects merge key by key; anything else replaces the target.
fn merge(target: &mut Value, value: Value) {
    match (target, value) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, value) => *target = value,
    }
}
