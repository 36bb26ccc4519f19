//! Structural diffing and replay of values documents.
//!
//! A [`Modification`] captures how a deployed release's values differ from
//! the chart defaults they were derived from. Replaying it onto a *newer*
//! version's defaults carries the user's customizations forward — the
//! three-way-merge step at the heart of the upgrade flow.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::{
    document::{self, ValuesDocument},
    path::ValuesPath,
};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Add,
    Replace,
    Remove,
}

/// A single structural edit, addressed by a JSON-pointer-like path.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Operation {
    pub op: OperationKind,

    /// JSON pointer into the document, e.g. `/mariadb/auth/password`. Empty
    /// only for a wholesale replacement of a non-mapping document.
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// An ordered, immutable patch transforming one values document into another.
///
/// Operations follow a stable pre-order traversal of the target document,
/// with base-only removals appended at the end, so the same input pair always
/// produces the same sequence.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Modification {
    operations: Vec<Operation>,
}

impl Modification {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Computes the minimal set of add/replace/remove operations that transforms
/// `base` into `target`.
///
/// Sequences, and mappings with non-string keys, are treated as atomic and
/// replaced wholesale; element-wise sequence edits would produce indexed
/// paths the values editor cannot address.
///
/// This function has no memory of prior calls. The once-per-session rule
/// is enforced by the reconciliation session, not here.
pub fn diff(base: &ValuesDocument, target: &ValuesDocument) -> Modification {
    let mut operations = Vec::new();
    let mut removals = Vec::new();
    diff_value(
        &ValuesPath::root(),
        base.tree(),
        target.tree(),
        &mut operations,
        &mut removals,
    );
    operations.append(&mut removals);
    Modification { operations }
}

fn diff_value(
    path: &ValuesPath,
    base: &Value,
    target: &Value,
    operations: &mut Vec<Operation>,
    removals: &mut Vec<Operation>,
) {
    if base == target {
        return;
    }

    match (string_keyed(base), string_keyed(target)) {
        (Some(base_mapping), Some(target_mapping)) => {
            for (key, target_value) in target_mapping {
                let Some(key) = key.as_str() else { continue };
                let child = path.join(key);
                match base_mapping.get(key) {
                    Some(base_value) => {
                        diff_value(&child, base_value, target_value, operations, removals);
                    }
                    None => operations.push(Operation {
                        op: OperationKind::Add,
                        path: child.to_json_pointer(),
                        value: Some(target_value.clone()),
                    }),
                }
            }
            for key in base_mapping.keys() {
                let Some(key) = key.as_str() else { continue };
                if !target_mapping.contains_key(key) {
                    removals.push(Operation {
                        op: OperationKind::Remove,
                        path: path.join(key).to_json_pointer(),
                        value: None,
                    });
                }
            }
        }
        _ => operations.push(Operation {
            op: OperationKind::Replace,
            path: path.to_json_pointer(),
            value: Some(target.clone()),
        }),
    }
}

/// Returns the mapping behind `value` if all of its keys are strings.
fn string_keyed(value: &Value) -> Option<&Mapping> {
    let mapping = value.as_mapping()?;
    mapping.keys().all(Value::is_string).then_some(mapping)
}

/// Applies `modification` onto `new_base`, returning the projected document.
///
/// Adds and replaces are applied literally even if the destination's shape
/// changed between versions; the result may be schema-invalid, which is the
/// concern of a later validation step. Removing an already-absent path is a
/// no-op. Replaying the same modification onto the same base twice produces
/// identical text.
pub fn replay(
    modification: &Modification,
    new_base: &ValuesDocument,
) -> Result<ValuesDocument, document::Error> {
    let mut doc = new_base.clone();
    for operation in &modification.operations {
        let path = ValuesPath::from_json_pointer(&operation.path);
        doc = match operation.op {
            OperationKind::Add | OperationKind::Replace => {
                doc.set(&path, operation.value.clone().unwrap_or(Value::Null))?
            }
            OperationKind::Remove => doc.delete(&path)?,
        };
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn doc(text: &str) -> ValuesDocument {
        ValuesDocument::parse(text).expect("test YAML is valid")
    }

    fn op(kind: OperationKind, path: &str, value: Option<Value>) -> Operation {
        Operation {
            op: kind,
            path: path.to_owned(),
            value,
        }
    }

    #[test]
    fn equal_documents_yield_an_empty_modification() {
        let a = doc("a: 1\nb:\n  c: 2\n");
        assert!(diff(&a, &a).is_empty());
    }

    #[test]
    fn scalar_change_is_a_single_replace() {
        let base = doc("replicas: 1\ndb:\n  host: a\n");
        let target = doc("replicas: 3\ndb:\n  host: a\n");
        assert_eq!(
            diff(&base, &target).operations(),
            [op(OperationKind::Replace, "/replicas", Some(Value::from(3)))]
        );
    }

    #[test]
    fn operations_follow_target_order_with_removals_last() {
        let base = doc(indoc! {"
            keep: 1
            gone: true
            nested:
              alsoGone: x
              stays: y
        "});
        let target = doc(indoc! {"
            added: new
            keep: 2
            nested:
              stays: y
              deep:
                leaf: 1
        "});

        assert_eq!(
            diff(&base, &target).operations(),
            [
                op(OperationKind::Add, "/added", Some(Value::from("new"))),
                op(OperationKind::Replace, "/keep", Some(Value::from(2))),
                op(
                    OperationKind::Add,
                    "/nested/deep",
                    Some(serde_yaml::from_str("leaf: 1").expect("test YAML is valid")),
                ),
                // Removals surface in traversal order, after all other ops
                op(OperationKind::Remove, "/nested/alsoGone", None),
                op(OperationKind::Remove, "/gone", None),
            ]
        );
    }

    #[test]
    fn sequences_are_replaced_wholesale() {
        let base = doc("items:\n- a\n- b\n");
        let target = doc("items:\n- a\n- c\n");
        assert_eq!(
            diff(&base, &target).operations(),
            [op(
                OperationKind::Replace,
                "/items",
                Some(serde_yaml::from_str("- a\n- c\n").expect("test YAML is valid")),
            )]
        );
    }

    #[test]
    fn type_change_between_mapping_and_scalar_is_a_replace() {
        let base = doc("config:\n  verbose: true\n");
        let target = doc("config: off\n");
        let modification = diff(&base, &target);
        assert_eq!(modification.operations().len(), 1);
        assert_eq!(modification.operations()[0].op, OperationKind::Replace);
        assert_eq!(modification.operations()[0].path, "/config");
    }

    #[test]
    fn diff_replay_round_trips() {
        let base = doc(indoc! {"
            replicas: 1
            db:
              host: a
              port: 3306
            extras:
              debug: true
        "});
        let target = doc(indoc! {"
            replicas: 3
            db:
              host: b
            newTop:
              key: value
        "});

        let replayed = replay(&diff(&base, &target), &base).expect("replay must succeed");
        assert_eq!(replayed.tree(), target.tree());
    }

    /// Customizations replayed onto a structurally different newer default
    /// document must leave everything they don't mention alone.
    #[test]
    fn replay_onto_a_new_base_preserves_untouched_values() {
        let old_defaults = doc("replicas: 1\ndb:\n  host: a\n");
        let deployed = doc("replicas: 3\ndb:\n  host: a\n");
        let modification = diff(&old_defaults, &deployed);
        assert_eq!(
            modification.operations(),
            [op(OperationKind::Replace, "/replicas", Some(Value::from(3)))]
        );

        let new_defaults = doc("replicas: 1\ndb:\n  host: b\nversion: \"2\"\n");
        let replayed = replay(&modification, &new_defaults).expect("replay must succeed");
        assert_eq!(
            replayed.tree(),
            doc("replicas: 3\ndb:\n  host: b\nversion: \"2\"\n").tree()
        );
    }

    #[test]
    fn replayed_removals_of_absent_paths_are_no_ops() {
        let modification = Modification {
            operations: vec![op(OperationKind::Remove, "/no/such/path", None)],
        };
        let base = doc("a: 1\n");
        let replayed = replay(&modification, &base).expect("replay must succeed");
        assert_eq!(replayed, base);
    }

    #[test]
    fn replay_applies_adds_literally_over_changed_shapes() {
        // The destination used to be a mapping, now holds a scalar
        let modification = Modification {
            operations: vec![op(
                OperationKind::Replace,
                "/config/verbose",
                Some(Value::Bool(true)),
            )],
        };
        let base = doc("config: compact\n");
        let replayed = replay(&modification, &base).expect("replay must succeed");
        assert_eq!(
            replayed.get(&"config.verbose".parse().expect("static path is valid")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn replay_is_deterministic_and_idempotent_per_base() {
        let base = doc("a: 1\nb: 2\n");
        let target = doc("a: 2\nc: 3\n");
        let modification = diff(&base, &target);

        let first = replay(&modification, &base).expect("replay must succeed");
        let second = replay(&modification, &base).expect("replay must succeed");
        assert_eq!(first.text(), second.text());
    }
}
