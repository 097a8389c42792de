//! Value utility functions shared across modules
//!
//! Equality, ordering and text coercion over `serde_json::Value`, defined per
//! variant. Cross-variant comparisons are never silently coerced.

use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Short name of a value's variant, used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn integer_of(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Exact comparison of an integer with a float; no cast of the integer to f64
fn compare_int_float(int: i128, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    // Every JSON integer lies in [-2^63, 2^64)
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 18_446_744_073_709_551_616.0;
    let whole = float.trunc();
    if whole >= UPPER {
        return Some(Ordering::Less);
    }
    if whole < LOWER {
        return Some(Ordering::Greater);
    }

    match int.cmp(&(whole as i128)) {
        Ordering::Equal => {
            let fraction = float - whole;
            if fraction > 0.0 {
                Some(Ordering::Less)
            } else if fraction < 0.0 {
                Some(Ordering::Greater)
            } else {
                Some(Ordering::Equal)
            }
        }
        other => Some(other),
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (integer_of(a), integer_of(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        (Some(x), None) => compare_int_float(x, b.as_f64()?),
        (None, Some(y)) => compare_int_float(y, a.as_f64()?).map(Ordering::reverse),
        (None, None) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Type-sensitive deep equality
///
/// Numbers compare by numeric value (`5 == 5.0`), but never equal a string or
/// a bool. Arrays compare element-wise, objects key-wise (order-insensitive).
///
/// ```
/// use serde_json::json;
/// use amazedb_core::value_utils::values_equal;
///
/// assert!(values_equal(&json!(5), &json!(5.0)));
/// assert!(!values_equal(&json!(5), &json!("5")));
/// ```
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).map(|y| values_equal(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}

/// Compare two values for the ordering operators
///
/// Returns `Some(Ordering)` for number/number, string/string (lexical by code
/// point) and bool/bool (false < true); `None` for any other pairing.
///
/// ```
/// use serde_json::json;
/// use std::cmp::Ordering;
/// use amazedb_core::value_utils::compare_values;
///
/// assert_eq!(compare_values(&json!(10), &json!(5)), Some(Ordering::Greater));
/// assert_eq!(compare_values(&json!("a"), &json!("b")), Some(Ordering::Less));
/// assert_eq!(compare_values(&json!("a"), &json!(1)), None);
/// ```
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => compare_numbers(n1, n2),
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}

fn sort_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Total order used by sorted scans
///
/// missing < null < bool < number < string < array < object. Within a variant
/// the natural order applies; arrays compare lexicographically and objects by
/// their serialized text, so the order stays total on heterogeneous groups.
pub fn sort_compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = sort_rank(a).cmp(&sort_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Array(xs)), Some(Value::Array(ys))) => {
            for (x, y) in xs.iter().zip(ys) {
                let ord = sort_compare(Some(x), Some(y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Text form of a value for regex matching: strings verbatim, anything else
/// as compact JSON
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_equal_type_sensitive() {
        assert!(values_equal(&json!("5"), &json!("5")));
        assert!(!values_equal(&json!(5), &json!("5")));
        assert!(!values_equal(&json!(1), &json!(true)));
        assert!(!values_equal(&json!(null), &json!(0)));
        assert!(values_equal(&json!(2), &json!(2.0)));
    }

    #[test]
    fn test_values_equal_nested() {
        assert!(values_equal(
            &json!({"a": [1, 2], "b": {"c": 3}}),
            &json!({"b": {"c": 3.0}, "a": [1, 2]})
        ));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(1), &json!(1.5)), Some(Ordering::Less));
        assert_eq!(
            compare_values(&json!(u64::MAX), &json!(-1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&json!(false), &json!(true)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&json!(null), &json!(null)), None);
        assert_eq!(compare_values(&json!([1]), &json!([1])), None);
    }

    #[test]
    fn test_int_float_exact_above_2_pow_53() {
        let big = json!(9_007_199_254_740_993i64);
        let float = json!(9_007_199_254_740_992.0);
        assert_eq!(compare_values(&big, &float), Some(Ordering::Greater));
        assert_eq!(compare_values(&float, &big), Some(Ordering::Less));
        assert!(!values_equal(&big, &float));
        assert!(values_equal(&json!(9_007_199_254_740_992i64), &float));

        assert_eq!(
            compare_values(&json!(u64::MAX), &json!(18_446_744_073_709_551_616.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&json!(i64::MIN), &json!(-1.0e19)),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&json!(-5), &json!(-5.5)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(-5), &json!(-4.5)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(7), &json!(7.0)), Some(Ordering::Equal));
    }

    #[test]
    fn test_sort_compare_missing_is_lowest() {
        assert_eq!(sort_compare(None, Some(&json!(null))), Ordering::Less);
        assert_eq!(sort_compare(None, None), Ordering::Equal);
        assert_eq!(
            sort_compare(Some(&json!(-1000)), None),
            Ordering::Greater
        );
    }

    #[test]
    fn test_sort_compare_across_variants() {
        assert_eq!(
            sort_compare(Some(&json!(99)), Some(&json!("1"))),
            Ordering::Less
        );
        assert_eq!(
            sort_compare(Some(&json!([1, 2])), Some(&json!([1, 3]))),
            Ordering::Less
        );
        assert_eq!(
            sort_compare(Some(&json!([1])), Some(&json!([1, 0]))),
            Ordering::Less
        );
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("Jalaj Kumar")), "Jalaj Kumar");
        assert_eq!(value_to_text(&json!(42)), "42");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&json!(["a"])), "[\"a\"]");
    }
}
