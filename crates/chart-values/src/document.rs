//! The path-addressed values editor.
//!
//! A [`ValuesDocument`] is an immutable snapshot of the YAML text a user sees
//! in the raw editor, together with its parsed tree. Every mutation produces
//! a new snapshot, which keeps the diff/replay invariants checkable by plain
//! equality.

use serde_yaml::{Mapping, Value};
use snafu::{ResultExt, Snafu};

use crate::path::ValuesPath;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse values document"))]
    ParseDocument { source: serde_yaml::Error },

    #[snafu(display("failed to serialize values document"))]
    SerializeDocument { source: serde_yaml::Error },
}

/// An immutable snapshot of a YAML values document.
///
/// Mapping order is preserved by [`serde_yaml::Mapping`], so re-serializing
/// an unchanged document is stable. Comments are not preserved.
#[derive(Clone, Debug, PartialEq)]
pub struct ValuesDocument {
    text: String,
    tree: Value,
}

impl ValuesDocument {
    /// Parses the given YAML text.
    ///
    /// Empty input and explicit `null` documents are treated as an empty
    /// mapping so that they stay addressable.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();

        let tree = if text.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            match serde_yaml::from_str(&text).context(ParseDocumentSnafu)? {
                Value::Null => Value::Mapping(Mapping::new()),
                tree => tree,
            }
        };

        Ok(Self { text, tree })
    }

    /// The exact serialized text of this snapshot.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Reads the value at `path`. Absent paths yield [`None`], never an
    /// error. The root path yields the whole tree.
    pub fn get(&self, path: &ValuesPath) -> Option<&Value> {
        let mut current = &self.tree;
        for segment in path.segments() {
            current = current.as_mapping()?.get(segment.as_str())?;
        }
        Some(current)
    }

    /// Returns a new snapshot with `value` written at `path`, creating any
    /// missing intermediate mappings. Intermediate values of a different
    /// shape are overwritten with mappings, so the write always succeeds.
    pub fn set(&self, path: &ValuesPath, value: Value) -> Result<Self> {
        let mut tree = self.tree.clone();

        match path.segments().split_last() {
            None => tree = value,
            Some((leaf, parents)) => {
                let mut current = &mut tree;
                for segment in parents {
                    current = as_mapping_coerced(current)
                        .entry(Value::from(segment.as_str()))
                        .or_insert(Value::Null);
                }
                as_mapping_coerced(current).insert(Value::from(leaf.as_str()), value);
            }
        }

        Self::from_tree(tree)
    }

    /// Returns a new snapshot with the entry at `path` removed.
    ///
    /// Deleting an absent path is a no-op, as is deleting the root. Parent
    /// mappings left empty by the removal are kept in place; pruning them is
    /// a trade-off this editor deliberately does not make.
    pub fn delete(&self, path: &ValuesPath) -> Result<Self> {
        let Some((leaf, parents)) = path.segments().split_last() else {
            return Ok(self.clone());
        };

        let mut tree = self.tree.clone();
        let mut current = &mut tree;
        for segment in parents {
            let next = current
                .as_mapping_mut()
                .and_then(|mapping| mapping.get_mut(segment.as_str()));
            match next {
                Some(next) => current = next,
                None => return Ok(self.clone()),
            }
        }

        let removed = current
            .as_mapping_mut()
            .is_some_and(|mapping| mapping.remove(leaf.as_str()).is_some());
        if removed {
            Self::from_tree(tree)
        } else {
            Ok(self.clone())
        }
    }

    fn from_tree(tree: Value) -> Result<Self> {
        let text = serde_yaml::to_string(&tree).context(SerializeDocumentSnafu)?;
        Ok(Self { text, tree })
    }
}

/// Returns the value as a mutable mapping, replacing it with an empty mapping
/// first if it currently has a different shape.
fn as_mapping_coerced(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(mapping) => mapping,
        _ => unreachable!("value was coerced into a mapping above"),
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    fn doc(text: &str) -> ValuesDocument {
        ValuesDocument::parse(text).expect("test YAML is valid")
    }

    fn path(input: &str) -> ValuesPath {
        input.parse().expect("test path is valid")
    }

    #[rstest]
    #[case("replicas", Some(Value::from(3)))]
    #[case("mariadb.auth.password", Some(Value::from("secret")))]
    #[case("mariadb.auth.missing", None)]
    #[case("not.there", None)]
    // The intermediate step is a scalar, not a mapping
    #[case("replicas.nested", None)]
    fn get(#[case] input: &str, #[case] expected: Option<Value>) {
        let doc = doc(indoc! {"
            replicas: 3
            mariadb:
              auth:
                password: secret
        "});
        assert_eq!(doc.get(&path(input)), expected.as_ref());
    }

    #[rstest]
    #[case("replicas", Value::from(5))]
    #[case("mariadb.auth.username", Value::from("admin"))]
    #[case("brand.new.nested.key", Value::from(true))]
    fn set_then_get_round_trips(#[case] input: &str, #[case] value: Value) {
        let doc = doc(indoc! {"
            replicas: 3
            mariadb:
              auth:
                password: secret
        "});
        let edited = path(input);
        let updated = doc.set(&edited, value.clone()).expect("set must succeed");
        assert_eq!(updated.get(&edited), Some(&value));
        // The input snapshot is untouched
        assert_eq!(doc.get(&path("replicas")), Some(&Value::from(3)));
    }

    #[test]
    fn set_creates_intermediate_mappings() {
        let updated = doc("")
            .set(&path("a.b.c"), Value::from(1))
            .expect("set must succeed");
        assert_eq!(updated.text(), "a:\n  b:\n    c: 1\n");
    }

    #[test]
    fn set_overwrites_scalar_intermediates() {
        let updated = doc("a: 1\n")
            .set(&path("a.b"), Value::from(2))
            .expect("set must succeed");
        assert_eq!(updated.get(&path("a.b")), Some(&Value::from(2)));
    }

    #[test]
    fn delete_removes_leaf_but_keeps_empty_parents() {
        let updated = doc(indoc! {"
            mariadb:
              auth:
                password: secret
        "})
        .delete(&path("mariadb.auth.password"))
        .expect("delete must succeed");

        assert_eq!(updated.get(&path("mariadb.auth.password")), None);
        // The now-empty parent mapping stays in place
        assert_eq!(
            updated.get(&path("mariadb.auth")),
            Some(&Value::Mapping(Mapping::new()))
        );
    }

    #[rstest]
    #[case("missing")]
    #[case("mariadb.missing.deep")]
    #[case("mariadb.auth.password.nested")]
    fn delete_absent_path_is_a_no_op(#[case] input: &str) {
        let original = doc(indoc! {"
            mariadb:
              auth:
                password: secret
        "});
        let updated = original
            .delete(&path(input))
            .expect("delete must succeed");
        assert_eq!(updated, original);
    }

    #[test]
    fn delete_is_idempotent() {
        let original = doc("a: 1\nb: 2\n");
        let once = original.delete(&path("a")).expect("delete must succeed");
        let twice = once.delete(&path("a")).expect("delete must succeed");
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let result = ValuesDocument::parse("a: [unclosed");
        assert!(matches!(result, Err(Error::ParseDocument { .. })));
    }

    #[test]
    fn empty_and_null_documents_are_addressable() {
        for text in ["", "null\n"] {
            let updated = doc(text)
                .set(&path("a"), Value::from(1))
                .expect("set must succeed");
            assert_eq!(updated.get(&path("a")), Some(&Value::from(1)));
        }
    }
}
