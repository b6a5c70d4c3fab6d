// crates/metacheck-core/src/compare.rs
// ============================================================================
// Module: Structural Comparison
// Description: Key-order-independent JSON comparison with path reporting.
// Purpose: Turn expected/actual divergence into named field mismatches.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Comparison recurses through objects and arrays and reports every
//! divergence as a [`Mismatch`] tagged with a JSON-pointer-style path
//! (`$.args.name`). Object key order never affects the outcome. Numbers
//! compare by numeric value, so `1.0` equals `1`. A `null` value and a
//! missing key are distinct mismatches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Value;

// ============================================================================
// SECTION: Mismatch Model
// ============================================================================

/// One divergence between expected and actual JSON.
///
/// # Invariants
/// - `path` names a real location in the expected or actual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// JSON-pointer-style location, rooted at `$`.
    pub path: String,
    /// Divergence classification.
    pub kind: MismatchKind,
}

/// Divergence classification for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchKind {
    /// The key exists in expected but not in actual.
    MissingKey,
    /// The key exists in actual but not in expected.
    UnexpectedKey,
    /// Both sides hold the same type but different values.
    ValueMismatch {
        /// Expected leaf value.
        expected: Value,
        /// Actual leaf value.
        actual: Value,
    },
    /// The two sides hold different JSON types.
    TypeMismatch {
        /// Expected JSON type name.
        expected: &'static str,
        /// Actual JSON type name.
        actual: &'static str,
    },
    /// Arrays differ in length; elements are not compared further.
    LengthMismatch {
        /// Expected array length.
        expected: usize,
        /// Actual array length.
        actual: usize,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::MissingKey => {
                write!(f, "{}: missing in actual body", self.path)
            }
            MismatchKind::UnexpectedKey => {
                write!(f, "{}: unexpected key in actual body", self.path)
            }
            MismatchKind::ValueMismatch {
                expected,
                actual,
            } => {
                write!(f, "{}: expected {expected}, actual {actual}", self.path)
            }
            MismatchKind::TypeMismatch {
                expected,
                actual,
            } => {
                write!(f, "{}: expected {expected}, actual {actual}", self.path)
            }
            MismatchKind::LengthMismatch {
                expected,
                actual,
            } => {
                write!(f, "{}: expected {expected} element(s), actual {actual}", self.path)
            }
        }
    }
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Compares expected and actual JSON structurally.
///
/// Returns every divergence; an empty result means the documents are
/// structurally equal.
#[must_use]
pub fn compare_json(expected: &Value, actual: &Value) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    compare_at("$", expected, actual, &mut mismatches);
    mismatches
}

/// Renders mismatches as a human-readable diff, one per line.
#[must_use]
pub fn render_mismatches(mismatches: &[Mismatch]) -> String {
    let lines: Vec<String> = mismatches.iter().map(ToString::to_string).collect();
    lines.join("\n")
}

/// Recursive comparison worker accumulating mismatches at `path`.
fn compare_at(path: &str, expected: &Value, actual: &Value, out: &mut Vec<Mismatch>) {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            for (key, expected_value) in expected_map {
                let child = format!("{path}.{key}");
                match actual_map.get(key) {
                    Some(actual_value) => compare_at(&child, expected_value, actual_value, out),
                    None => out.push(Mismatch {
                        path: child,
                        kind: MismatchKind::MissingKey,
                    }),
                }
            }
            for key in actual_map.keys() {
                if !expected_map.contains_key(key) {
                    out.push(Mismatch {
                        path: format!("{path}.{key}"),
                        kind: MismatchKind::UnexpectedKey,
                    });
                }
            }
        }
        (Value::Array(expected_items), Value::Array(actual_items)) => {
            if expected_items.len() == actual_items.len() {
                for (index, (expected_item, actual_item)) in
                    expected_items.iter().zip(actual_items.iter()).enumerate()
                {
                    let child = format!("{path}[{index}]");
                    compare_at(&child, expected_item, actual_item, out);
                }
            } else {
                out.push(Mismatch {
                    path: path.to_string(),
                    kind: MismatchKind::LengthMismatch {
                        expected: expected_items.len(),
                        actual: actual_items.len(),
                    },
                });
            }
        }
        (Value::Number(expected_number), Value::Number(actual_number)) => {
            if !numbers_equal(expected_number, actual_number) {
                out.push(Mismatch {
                    path: path.to_string(),
                    kind: MismatchKind::ValueMismatch {
                        expected: expected.clone(),
                        actual: actual.clone(),
                    },
                });
            }
        }
        _ => {
            let expected_type = json_type_name(expected);
            let actual_type = json_type_name(actual);
            if expected_type == actual_type {
                if expected != actual {
                    out.push(Mismatch {
                        path: path.to_string(),
                        kind: MismatchKind::ValueMismatch {
                            expected: expected.clone(),
                            actual: actual.clone(),
                        },
                    });
                }
            } else {
                out.push(Mismatch {
                    path: path.to_string(),
                    kind: MismatchKind::TypeMismatch {
                        expected: expected_type,
                        actual: actual_type,
                    },
                });
            }
        }
    }
}

/// Compares JSON numbers by numeric value rather than lexical form.
fn numbers_equal(left: &serde_json::Number, right: &serde_json::Number) -> bool {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return left == right;
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return left == right;
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Returns a stable JSON type name for mismatch messages.
const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
