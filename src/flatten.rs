//! Result tree and flattener.
//!
//! Query results arrive as arbitrary JSON. They are converted into a closed
//! `ResultTree` and walked pre-order into `(path, value)` entries: object
//! keys append `/key`, array elements append `/[]` (the index itself is not
//! recorded), and every scalar leaf emits exactly one entry.

use serde_json::Value;

use crate::types::FlatEntry;

/// Scalar leaf of a result tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
}

impl Scalar {
    /// Text form used in flattened output. Strings are unquoted.
    pub fn render(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Null => "null".to_string(),
        }
    }
}

/// Dynamically-typed result structure
#[derive(Debug, Clone, PartialEq)]
pub enum ResultTree {
    /// Properties in encounter order
    Object(Vec<(String, ResultTree)>),
    Array(Vec<ResultTree>),
    Scalar(Scalar),
}

impl ResultTree {
    /// Parse a JSON document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Value>(bytes).map(Self::from)
    }

    /// Look up a property of an object node.
    pub fn get(&self, key: &str) -> Option<&ResultTree> {
        match self {
            ResultTree::Object(props) => props.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Elements of a top-level array property, e.g. the `value` rows of a
    /// query result. `None` if this is not an object or the field is not an
    /// array.
    pub fn rows(&self, field: &str) -> Option<&[ResultTree]> {
        match self.get(field) {
            Some(ResultTree::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Number of scalar leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            ResultTree::Object(props) => props.iter().map(|(_, v)| v.leaf_count()).sum(),
            ResultTree::Array(items) => items.iter().map(ResultTree::leaf_count).sum(),
            ResultTree::Scalar(_) => 1,
        }
    }
}

impl From<Value> for ResultTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                ResultTree::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Array(items) => ResultTree::Array(items.into_iter().map(Into::into).collect()),
            Value::String(s) => ResultTree::Scalar(Scalar::String(s)),
            Value::Number(n) => ResultTree::Scalar(Scalar::Number(n)),
            Value::Bool(b) => ResultTree::Scalar(Scalar::Bool(b)),
            Value::Null => ResultTree::Scalar(Scalar::Null),
        }
    }
}

/// Flatten a tree from the root.
pub fn flatten(tree: &ResultTree) -> Vec<FlatEntry> {
    flatten_with_prefix(tree, "")
}

/// Flatten a tree whose root sits at `prefix`.
pub fn flatten_with_prefix(tree: &ResultTree, prefix: &str) -> Vec<FlatEntry> {
    let mut entries = Vec::with_capacity(tree.leaf_count());
    walk(tree, prefix.to_string(), &mut entries);
    entries
}

fn walk(node: &ResultTree, path: String, out: &mut Vec<FlatEntry>) {
    match node {
        ResultTree::Object(props) => {
            for (key, child) in props {
                walk(child, format!("{}/{}", path, key), out);
            }
        }
        ResultTree::Array(items) => {
            for child in items {
                walk(child, format!("{}/[]", path), out);
            }
        }
        ResultTree::Scalar(scalar) => out.push(FlatEntry::new(path, scalar.render())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ResultTree {
        ResultTree::from(value)
    }

    #[test]
    fn test_flatten_object_and_array() {
        let entries = flatten(&tree(json!({"a": 1, "b": [2, 3]})));
        assert_eq!(
            entries,
            vec![
                FlatEntry::new("/a", "1"),
                FlatEntry::new("/b/[]", "2"),
                FlatEntry::new("/b/[]", "3"),
            ]
        );
    }

    #[test]
    fn test_flatten_empty_containers() {
        assert!(flatten(&tree(json!({}))).is_empty());
        assert!(flatten(&tree(json!([]))).is_empty());
        assert_eq!(
            flatten(&tree(json!({"x": {}, "y": [], "z": true}))),
            vec![FlatEntry::new("/z", "true")]
        );
    }

    #[test]
    fn test_flatten_keeps_encounter_order() {
        let parsed = ResultTree::from_slice(br#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let paths: Vec<_> = flatten(&parsed).into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/zeta", "/alpha", "/mid"]);
    }

    #[test]
    fn test_flatten_renders_scalars() {
        let entries = flatten(&tree(json!({"s": "text", "n": 1.5, "f": false, "z": null})));
        let values: Vec<_> = entries.into_iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["text", "1.5", "false", "null"]);
    }

    #[test]
    fn test_flatten_nested_arrays_of_objects() {
        let entries = flatten(&tree(json!({"rows": [{"id": 1}, [[{"id": 2}]]]})));
        assert_eq!(
            entries,
            vec![
                FlatEntry::new("/rows/[]/id", "1"),
                FlatEntry::new("/rows/[]/[]/[]/id", "2"),
            ]
        );
    }

    #[test]
    fn test_flatten_scalar_root_and_prefix() {
        assert_eq!(flatten(&tree(json!(42))), vec![FlatEntry::new("", "42")]);
        assert_eq!(
            flatten_with_prefix(&tree(json!({"k": "v"})), "/value/[]"),
            vec![FlatEntry::new("/value/[]/k", "v")]
        );
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let t = tree(json!({"a": [1, {"b": null}], "c": "x"}));
        assert_eq!(flatten(&t), flatten(&t));
        assert_eq!(flatten(&t).len(), t.leaf_count());
    }

    #[test]
    fn test_rows_lookup() {
        let t = tree(json!({"value": [{"CardCode": "C1"}], "odata.metadata": "x"}));
        assert_eq!(t.rows("value").map(|r| r.len()), Some(1));
        assert!(t.rows("odata.metadata").is_none());
        assert!(t.rows("missing").is_none());
    }
}
