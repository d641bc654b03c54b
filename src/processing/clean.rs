//! Replacement of non-JSON-compliant values.

use crate::types::{Row, Value};

/// Replace every NaN/±Infinity float inside `value` (at any depth) with [`Value::Null`].
///
/// All other values are returned unchanged.
pub fn clean_value(mut value: Value) -> Value {
    clean_in_place(&mut value);
    value
}

/// In-place variant of [`clean_value`].
///
/// Walks the tree with an explicit stack so deeply nested input cannot exhaust the call stack.
pub fn clean_in_place(value: &mut Value) {
    let mut stack: Vec<&mut Value> = vec![value];
    while let Some(current) = stack.pop() {
        if matches!(current, Value::Float(f) if !f.is_finite()) {
            *current = Value::Null;
            continue;
        }
        match current {
            Value::Array(items) => stack.extend(items.iter_mut()),
            Value::Object(entries) => stack.extend(entries.iter_mut().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// Clean every value of a row.
pub fn clean_row(row: &mut Row) {
    for value in row.values_mut() {
        clean_in_place(value);
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_row, clean_value};
    use crate::types::{Row, Value};

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(clean_value(Value::Float(f64::NAN)), Value::Null);
        assert_eq!(clean_value(Value::Float(f64::INFINITY)), Value::Null);
        assert_eq!(clean_value(Value::Float(f64::NEG_INFINITY)), Value::Null);
    }

    #[test]
    fn finite_and_non_numeric_values_pass_through() {
        for v in [
            Value::Float(1.25),
            Value::Int(-3),
            Value::Bool(false),
            Value::Str("NaN".to_string()),
            Value::Null,
        ] {
            assert_eq!(clean_value(v.clone()), v);
        }
    }

    #[test]
    fn nested_structures_are_cleaned_at_every_depth() {
        let input = Value::Object(vec![
            ("ok".to_string(), Value::Float(2.0)),
            (
                "list".to_string(),
                Value::Array(vec![
                    Value::Float(f64::NAN),
                    Value::Object(vec![("deep".to_string(), Value::Float(f64::INFINITY))]),
                ]),
            ),
        ]);
        let expected = Value::Object(vec![
            ("ok".to_string(), Value::Float(2.0)),
            (
                "list".to_string(),
                Value::Array(vec![
                    Value::Null,
                    Value::Object(vec![("deep".to_string(), Value::Null)]),
                ]),
            ),
        ]);
        assert_eq!(clean_value(input), expected);
    }

    #[test]
    fn very_deep_nesting_does_not_overflow() {
        let mut v = Value::Float(f64::NAN);
        for _ in 0..100_000 {
            v = Value::Array(vec![v]);
        }
        let mut cleaned = clean_value(v);
        let mut depth = 0;
        while let Value::Array(mut items) = cleaned {
            cleaned = items.pop().unwrap();
            depth += 1;
        }
        assert_eq!(depth, 100_000);
        assert_eq!(cleaned, Value::Null);
    }

    #[test]
    fn clean_row_touches_every_column() {
        let mut row = Row::from_pairs([
            ("a", Value::Float(f64::NAN)),
            ("b", Value::Int(1)),
        ]);
        clean_row(&mut row);
        assert_eq!(row.get("a"), Some(&Value::Null));
        assert_eq!(row.get("b"), Some(&Value::Int(1)));
    }
}
