// crates/warden-store-yaml/src/tree.rs
// ============================================================================
// Module: YAML Config Tree
// Description: Mapping tree addressed by dotted key paths.
// Purpose: Give the YAML backend `"<id>.<column>"` style leaf access.
// Dependencies: serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! A [`ConfigTree`] is a YAML mapping whose keys are normalized to strings
//! on load, so `1:` and `'1':` address the same row. Paths are split on `.`.
//! Writes create intermediate mappings; removing a leaf never removes its
//! parent, so a row with every leaf cleared still exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_yaml::Mapping;
use serde_yaml::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a YAML document cannot become a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The document is not valid YAML.
    #[error("invalid yaml: {0}")]
    Syntax(String),
    /// The document root is not a mapping.
    #[error("yaml root must be a mapping")]
    RootNotMapping,
    /// A mapping key is a sequence or mapping.
    #[error("yaml keys must be scalars")]
    ComplexKey,
}

// ============================================================================
// SECTION: Tree
// ============================================================================

/// String-keyed YAML mapping with dotted path access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    /// Root mapping.
    root: Mapping,
}

impl ConfigTree {
    /// Parses a YAML document. An empty or null document is an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when the document is not a mapping of scalar keys.
    pub fn parse(bytes: &[u8]) -> Result<Self, TreeError> {
        let value: Value =
            serde_yaml::from_slice(bytes).map_err(|err| TreeError::Syntax(err.to_string()))?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(mapping) => Ok(Self {
                root: normalize(mapping)?,
            }),
            _ => Err(TreeError::RootNotMapping),
        }
    }

    /// Renders the tree as YAML text.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when a value cannot be emitted.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.root)
    }

    /// Returns the value at a dotted path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns true when a value exists at the path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Writes or removes the value at a dotted path and reports whether the tree changed.
    ///
    /// Writing creates missing intermediate mappings and replaces scalars in
    /// the way. Removing a path whose parent is absent is a no-op.
    pub fn set(&mut self, path: &str, value: Option<Value>) -> bool {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return false;
        };
        match value {
            Some(value) => {
                let mut current = &mut self.root;
                for segment in parents {
                    let slot = current
                        .entry(Value::String((*segment).to_string()))
                        .or_insert_with(|| Value::Mapping(Mapping::new()));
                    if !slot.is_mapping() {
                        *slot = Value::Mapping(Mapping::new());
                    }
                    let Value::Mapping(next) = slot else {
                        return false;
                    };
                    current = next;
                }
                let previous = current.insert(Value::String((*leaf).to_string()), value.clone());
                previous.as_ref() != Some(&value)
            }
            None => {
                let mut current = &mut self.root;
                for segment in parents {
                    let Some(Value::Mapping(next)) = current.get_mut(*segment) else {
                        return false;
                    };
                    current = next;
                }
                current.remove(*leaf).is_some()
            }
        }
    }

    /// Returns the top-level keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().filter_map(Value::as_str)
    }

    /// Removes a top-level key and reports whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.root.remove(key).is_some()
    }

    /// Returns the number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns true when the tree has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts every mapping key to a string, recursively.
fn normalize(mapping: Mapping) -> Result<Mapping, TreeError> {
    let mut normalized = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => return Err(TreeError::ComplexKey),
        };
        let value = match value {
            Value::Mapping(inner) => Value::Mapping(normalize(inner)?),
            other => other,
        };
        normalized.insert(Value::String(key), value);
    }
    Ok(normalized)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for brevity.")]

    use super::*;

    #[test]
    fn numeric_keys_are_addressable_as_strings() {
        let tree = ConfigTree::parse(b"1:\n  player-name: Bob\n'2':\n  player-name: Amy\n").unwrap();
        assert_eq!(tree.get("1.player-name"), Some(&Value::String("Bob".to_string())));
        assert_eq!(tree.get("2.player-name"), Some(&Value::String("Amy".to_string())));
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn set_creates_parents_and_remove_keeps_row() {
        let mut tree = ConfigTree::default();
        assert!(tree.set("7.reason", Some(Value::String("spam".to_string()))));
        assert!(!tree.set("7.reason", Some(Value::String("spam".to_string()))));
        assert!(tree.set("7.reason", None));
        assert!(tree.contains("7"));
        assert!(!tree.set("8.reason", None));
    }

    #[test]
    fn rejects_non_mapping_roots() {
        assert_eq!(ConfigTree::parse(b"- 1\n- 2\n"), Err(TreeError::RootNotMapping));
        assert!(ConfigTree::parse(b"~\n").unwrap().is_empty());
        assert!(matches!(ConfigTree::parse(b"a: [1"), Err(TreeError::Syntax(_))));
    }
}
