//! The path-addressable context store.

use serde_json::{Map, Value};

use crate::error::{ContextError, ContextResult};
use crate::path::ContextPath;
use crate::render::{render_canonical, value_type_name};

/// Default reserved root segment for writable paths.
pub const DEFAULT_ROOT_PREFIX: &str = "variables";

/// Nested key/value tree addressed by dotted paths.
///
/// Reads resolve strictly: every intermediate segment must exist and be a
/// mapping. Writes create missing intermediate mappings but refuse to
/// replace an existing scalar or list on the way down. Writes and deletes
/// must stay under the reserved root prefix; other top-level keys are
/// readable metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextStore {
    tree: Map<String, Value>,
    root_prefix: String,
}

impl ContextStore {
    /// Create a store over an existing tree.
    pub fn new(tree: Map<String, Value>) -> Self {
        Self {
            tree,
            root_prefix: DEFAULT_ROOT_PREFIX.to_owned(),
        }
    }

    /// Replace the reserved root prefix.
    pub fn with_root_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.root_prefix = prefix.into();
        self
    }

    /// The reserved root prefix writes must start with.
    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Resolve a path to the stored value without rendering.
    pub fn resolve(&self, path: &str) -> ContextResult<&Value> {
        let path = ContextPath::parse(path)?;
        let (parents, last) = path.split_last();
        let parent = descend(&self.tree, &path, parents)?;
        parent.get(last).ok_or_else(|| key_not_found(&path, last))
    }

    /// Read a path.
    ///
    /// Mappings are returned as their canonical rendered text (sorted keys,
    /// four-space indent); every other value is returned as stored.
    pub fn get(&self, path: &str) -> ContextResult<Value> {
        let value = self.resolve(path)?;
        Ok(match value {
            Value::Object(_) => Value::String(render_canonical(value)),
            other => other.clone(),
        })
    }

    /// Whether a path currently resolves.
    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    /// Write `value` at `path`, creating missing intermediate mappings.
    ///
    /// Any prior value at the final segment is replaced, including a whole
    /// subtree.
    pub fn set(&mut self, path: &str, value: Value) -> ContextResult<()> {
        let path = self.writable(path)?;
        let (parents, last) = path.split_last();

        // A conflict can only sit below segments that already exist, so a
        // failing write never leaves freshly created mappings behind.
        let mut current = &mut self.tree;
        for segment in parents {
            let slot = current
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match slot {
                Value::Object(child) => child,
                other => {
                    return Err(ContextError::StructureConflict {
                        path: path.to_string(),
                        segment: (*segment).to_owned(),
                        found: value_type_name(other),
                    });
                }
            };
        }

        tracing::trace!(path = %path, "context write");
        current.insert(last.to_owned(), value);
        Ok(())
    }

    /// Remove the value at `path`.
    ///
    /// The parent must resolve like a read; a missing final key is not an
    /// error. Returns the removed value, if any.
    pub fn delete(&mut self, path: &str) -> ContextResult<Option<Value>> {
        let path = self.writable(path)?;
        let (parents, last) = path.split_last();
        let parent = descend_mut(&mut self.tree, &path, parents)?;

        tracing::trace!(path = %path, "context delete");
        Ok(parent.shift_remove(last))
    }

    /// The full tree, reflecting every completed write.
    pub fn snapshot(&self) -> &Map<String, Value> {
        &self.tree
    }

    /// Consume the store and return its tree.
    pub fn into_tree(self) -> Map<String, Value> {
        self.tree
    }

    fn writable<'p>(&self, raw: &'p str) -> ContextResult<ContextPath<'p>> {
        let path = ContextPath::parse(raw)?;
        if path.len() < 2 {
            return Err(ContextError::PathTooShort {
                path: raw.to_owned(),
            });
        }
        if path.first() != self.root_prefix {
            return Err(ContextError::InvalidRoot {
                path: raw.to_owned(),
                expected: self.root_prefix.clone(),
            });
        }
        Ok(path)
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl From<Map<String, Value>> for ContextStore {
    fn from(tree: Map<String, Value>) -> Self {
        Self::new(tree)
    }
}

fn descend<'t>(
    root: &'t Map<String, Value>,
    path: &ContextPath<'_>,
    segments: &[&str],
) -> ContextResult<&'t Map<String, Value>> {
    let mut current = root;
    for segment in segments {
        current = match current.get(*segment) {
            Some(Value::Object(child)) => child,
            Some(other) => return Err(type_mismatch(path, segment, other)),
            None => return Err(key_not_found(path, segment)),
        };
    }
    Ok(current)
}

fn descend_mut<'t>(
    root: &'t mut Map<String, Value>,
    path: &ContextPath<'_>,
    segments: &[&str],
) -> ContextResult<&'t mut Map<String, Value>> {
    let mut current = root;
    for segment in segments {
        current = match current.get_mut(*segment) {
            Some(Value::Object(child)) => child,
            Some(other) => return Err(type_mismatch(path, segment, other)),
            None => return Err(key_not_found(path, segment)),
        };
    }
    Ok(current)
}

fn key_not_found(path: &ContextPath<'_>, segment: &str) -> ContextError {
    ContextError::KeyNotFound {
        path: path.to_string(),
        segment: segment.to_owned(),
    }
}

fn type_mismatch(path: &ContextPath<'_>, segment: &str, found: &Value) -> ContextError {
    ContextError::TypeMismatch {
        path: path.to_string(),
        segment: segment.to_owned(),
        found: value_type_name(found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn store(value: Value) -> ContextStore {
        match value {
            Value::Object(map) => ContextStore::new(map),
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn get_returns_scalars_as_stored() {
        let ctx = store(json!({"variables": {"count": 3, "name": "x", "tags": [1, 2]}}));
        assert_eq!(ctx.get("variables.count").unwrap(), json!(3));
        assert_eq!(ctx.get("variables.name").unwrap(), json!("x"));
        assert_eq!(ctx.get("variables.tags").unwrap(), json!([1, 2]));
    }

    #[test]
    fn get_renders_mappings_as_canonical_text() {
        let ctx = store(json!({"variables": {"user": {"b": 2, "a": 1}}}));
        let rendered = ctx.get("variables.user").unwrap();
        assert_eq!(rendered, json!("{\n    \"a\": 1,\n    \"b\": 2\n}"));

        let text = rendered.as_str().unwrap();
        let reparsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(reparsed, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn resolve_returns_raw_mappings() {
        let ctx = store(json!({"variables": {"user": {"a": 1}}}));
        assert_eq!(ctx.resolve("variables.user").unwrap(), &json!({"a": 1}));
    }

    #[test]
    fn metadata_outside_the_root_is_readable() {
        let ctx = store(json!({"meta": {"run": 7}, "variables": {}}));
        assert_eq!(ctx.get("meta.run").unwrap(), json!(7));
        assert_eq!(ctx.get("meta").unwrap(), json!("{\n    \"run\": 7\n}"));
    }

    #[test]
    fn missing_segment_is_key_not_found() {
        let ctx = store(json!({"variables": {}}));
        let err = ctx.get("variables.a.b").unwrap_err();
        assert_eq!(
            err,
            ContextError::KeyNotFound {
                path: "variables.a.b".into(),
                segment: "a".into(),
            }
        );
    }

    #[test]
    fn scalar_intermediate_is_type_mismatch() {
        let ctx = store(json!({"variables": {"a": [1]}}));
        let err = ctx.get("variables.a.b").unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
        assert!(err.to_string().contains("found array"));
    }

    #[test]
    fn set_auto_creates_intermediate_mappings() {
        let mut ctx = ContextStore::default();
        ctx.set("variables.a.b.c", json!(1)).unwrap();

        assert_eq!(ctx.snapshot(), store(json!({"variables": {"a": {"b": {"c": 1}}}})).snapshot());
        assert!(ctx.get("variables.a.b").is_ok());
    }

    #[test]
    fn set_replaces_existing_subtree() {
        let mut ctx = store(json!({"variables": {"a": {"deep": {"x": 1}}}}));
        ctx.set("variables.a", json!("flat")).unwrap();
        assert_eq!(ctx.get("variables.a").unwrap(), json!("flat"));
    }

    #[rstest]
    #[case(json!({"variables": {"a": 5}}), "number")]
    #[case(json!({"variables": {"a": "text"}}), "string")]
    #[case(json!({"variables": {"a": [1, 2]}}), "array")]
    #[case(json!({"variables": {"a": null}}), "null")]
    fn set_rejects_non_mapping_intermediates(#[case] tree: Value, #[case] found: &str) {
        let mut ctx = store(tree.clone());
        let err = ctx.set("variables.a.b", json!(1)).unwrap_err();

        assert_eq!(err.kind(), "StructureConflict");
        assert!(err.to_string().ends_with(found));
        assert_eq!(ctx, store(tree));
    }

    #[test]
    fn conflict_deep_in_the_chain_leaves_tree_untouched() {
        let tree = json!({"variables": {"a": {"b": 1}}});
        let mut ctx = store(tree.clone());

        let err = ctx.set("variables.a.b.c.d", json!(true)).unwrap_err();

        assert_eq!(err.code(), "CONTEXT:STRUCTURE_CONFLICT");
        assert_eq!(ctx, store(tree));
    }

    #[rstest]
    #[case("x")]
    #[case("variables")]
    fn single_segment_writes_fail(#[case] path: &str) {
        let mut ctx = store(json!({"variables": {}}));
        let err = ctx.set(path, json!(1)).unwrap_err();
        assert_eq!(err.kind(), "InvalidRootError");
        assert_eq!(err.code(), "CONTEXT:PATH_TOO_SHORT");
    }

    #[test]
    fn writes_outside_the_root_are_rejected_before_mutation() {
        let mut ctx = store(json!({"meta": {"id": 1}}));
        let err = ctx.set("meta.id", json!(2)).unwrap_err();

        assert_eq!(
            err,
            ContextError::InvalidRoot {
                path: "meta.id".into(),
                expected: "variables".into(),
            }
        );
        assert_eq!(ctx.get("meta.id").unwrap(), json!(1));
    }

    #[test]
    fn custom_root_prefix_is_enforced() {
        let mut ctx = ContextStore::default().with_root_prefix("vars");
        ctx.set("vars.x", json!(1)).unwrap();
        assert_eq!(ctx.root_prefix(), "vars");
        assert_eq!(ctx.set("variables.x", json!(1)).unwrap_err().kind(), "InvalidRootError");
    }

    #[test]
    fn delete_removes_and_returns_value() {
        let mut ctx = store(json!({"variables": {"a": 1, "b": 2}}));
        assert_eq!(ctx.delete("variables.a").unwrap(), Some(json!(1)));
        assert!(!ctx.contains("variables.a"));
        assert!(ctx.contains("variables.b"));
    }

    #[test]
    fn delete_of_absent_key_is_a_noop() {
        let mut ctx = store(json!({"variables": {"a": 1}}));
        assert_eq!(ctx.delete("variables.missing").unwrap(), None);
        assert_eq!(ctx.delete("variables.missing").unwrap(), None);
        assert_eq!(ctx, store(json!({"variables": {"a": 1}})));
    }

    #[test]
    fn delete_requires_an_existing_parent() {
        let mut ctx = store(json!({"variables": {"a": 1}}));
        assert_eq!(ctx.delete("variables.x.y").unwrap_err().kind(), "KeyNotFound");
        assert_eq!(ctx.delete("variables.a.y").unwrap_err().kind(), "TypeMismatch");
    }

    #[test]
    fn delete_validates_root_prefix() {
        let mut ctx = store(json!({"meta": {"a": 1}}));
        assert_eq!(ctx.delete("meta.a").unwrap_err().kind(), "InvalidRootError");
        assert!(ctx.contains("meta.a"));
    }

    #[test]
    fn delete_keeps_sibling_order() {
        let mut ctx = store(json!({"variables": {"a": 1, "b": 2, "c": 3}}));
        ctx.delete("variables.a").unwrap();
        let variables = ctx.resolve("variables").unwrap().as_object().unwrap();
        let keys: Vec<&str> = variables.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn invalid_path_is_rejected_everywhere() {
        let mut ctx = ContextStore::default();
        assert_eq!(ctx.get("variables..x").unwrap_err().code(), "CONTEXT:INVALID_PATH");
        assert_eq!(ctx.set("", json!(1)).unwrap_err().code(), "CONTEXT:INVALID_PATH");
        assert_eq!(ctx.delete("variables.").unwrap_err().code(), "CONTEXT:INVALID_PATH");
    }
}
