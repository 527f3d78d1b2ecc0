//! Small helpers shared by the reporting code.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt::{Debug, Write};
use strum::IntoEnumIterator;

/// Value listing for fieldless enums.
///
/// ```
/// use speaker_test_bench::{dac::OutputMode, util::EnumValues};
///
/// assert_eq!(OutputMode::list(), vec![0, 1, 2, 3]);
/// assert_eq!(OutputMode::print(), "(0, 1, 2, 3)");
/// ```
pub trait EnumValues: IntoEnumIterator {
    /// The value each variant stands for.
    type Value: Debug;

    /// The value of this variant.
    fn value(&self) -> Self::Value;

    /// All values, in declaration order.
    fn list() -> Vec<Self::Value> {
        Self::iter().map(|v| v.value()).collect()
    }

    /// All values as a fixed-length, immutable sequence.
    fn tuple() -> Box<[Self::Value]> {
        Self::list().into_boxed_slice()
    }

    /// All values rendered as a tuple literal, e.g. `(0, 1, 2)`.
    /// Values use their `Debug` form, so strings come out double-quoted
    /// (`("a", "b")`). A single value keeps the trailing comma: `(0,)`.
    fn print() -> String {
        let values = Self::list();
        let mut out = String::from("(");
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{:?}", v);
        }
        if values.len() == 1 {
            out.push(',');
        }
        out.push(')');
        out
    }
}

/// Flattens arbitrarily nested arrays into one list.
///
/// Strings and objects are kept as single elements.
pub fn flatten(values: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(values.len());
    flatten_into(values, &mut out);
    out
}

fn flatten_into(values: &[Value], out: &mut Vec<Value>) {
    for value in values {
        match value {
            Value::Array(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}

/// Copies `src[key]` into `target[key]`.
///
/// When both sides hold an object the source entries are merged into the
/// target object (source wins on conflicts); otherwise the target entry is
/// replaced. Fails with [`Error::KeyNotFound`] if `key` is absent or null in
/// `src`, leaving `target` untouched.
pub fn copy_key_content(src: &Map<String, Value>, target: &mut Map<String, Value>, key: &str) -> Result<()> {
    let content = match src.get(key) {
        Some(v) if !v.is_null() => v,
        _ => return Err(Error::KeyNotFound(key.to_string())),
    };

    match (target.get_mut(key), content) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                existing.insert(k.clone(), v.clone());
            }
        }
        _ => {
            target.insert(key.to_string(), content.clone());
        }
    }
    Ok(())
}

/// [`copy_key_content`] on an owned target, returning the updated map.
pub fn with_key_content(
    src: &Map<String, Value>,
    mut target: Map<String, Value>,
    key: &str,
) -> Result<Map<String, Value>> {
    copy_key_content(src, &mut target, key)?;
    Ok(target)
}

/// Returns `true` if `date` is an ISO 8601 date or date-time.
///
/// Accepts `YYYY-MM-DD`, and date-times with `T` or a space as separator,
/// hour-only or with minutes, optional seconds, optional fraction and an
/// optional `Z` / `±HH:MM` offset. Surrounding whitespace is rejected.
pub fn check_timestamp_iso(date: &str) -> bool {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    const OFFSET_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%d %H:%M%:z",
    ];

    if date.trim() != date {
        return false;
    }
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
        return true;
    }
    if let Some(utc) = date.strip_suffix('Z') {
        let utc = with_minutes(utc);
        return NAIVE_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(&utc, f).is_ok());
    }
    let date = with_minutes(date);
    let date = &*date;
    NAIVE_FORMATS
        .iter()
        .any(|f| NaiveDateTime::parse_from_str(date, f).is_ok())
        || OFFSET_FORMATS
            .iter()
            .any(|f| DateTime::parse_from_str(date, f).is_ok())
}

// chrono cannot parse a time without minutes; `YYYY-MM-DDTHH` becomes `THH:00`
fn with_minutes(date: &str) -> Cow<'_, str> {
    let bytes = date.as_bytes();
    if bytes.len() == 13 && matches!(bytes[10], b'T' | b' ') {
        Cow::Owned(format!("{}:00", date))
    } else {
        Cow::Borrowed(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::EnumIter;

    #[derive(Debug, Clone, Copy, EnumIter)]
    enum Single {
        Only,
    }

    impl EnumValues for Single {
        type Value = &'static str;

        fn value(&self) -> &'static str {
            match self {
                Single::Only => "only",
            }
        }
    }

    #[test]
    fn test_single_value_print_keeps_trailing_comma() {
        assert_eq!(Single::print(), r#"("only",)"#);
        assert_eq!(&*Single::tuple(), &["only"]);
    }

    #[test]
    fn test_flatten_keeps_strings_and_objects() {
        let input = [json!({"test_key": 3}), json!([3, 4]), json!("test")];
        assert_eq!(flatten(&input), vec![json!({"test_key": 3}), json!(3), json!(4), json!("test")]);
        assert!(flatten(&[json!([[], [[]]])]).is_empty());
    }

    #[test]
    fn test_copy_key_content_replaces_non_objects() {
        let src = json!({"gain": 2}).as_object().cloned().unwrap();
        let mut target = json!({"gain": {"old": true}}).as_object().cloned().unwrap();
        copy_key_content(&src, &mut target, "gain").unwrap();
        assert_eq!(Value::Object(target), json!({"gain": 2}));
    }

    #[test]
    fn test_copy_key_content_null_counts_as_missing() {
        let src = json!({"metadata": null}).as_object().cloned().unwrap();
        let mut target = Map::new();
        assert!(matches!(
            copy_key_content(&src, &mut target, "metadata"),
            Err(Error::KeyNotFound(k)) if k == "metadata"
        ));
        assert!(target.is_empty());
    }

    #[test]
    fn test_check_timestamp_iso() {
        for ok in [
            "2023-03-10",
            "2023-03-10T11:19:52",
            "2023-03-10 11:19:52",
            "2023-03-10T11:19:52.560",
            "2023-03-10T11:19:52.560000+00:00",
            "2023-03-10T11:19:52+02:00",
            "2023-03-10T11:19:52Z",
            "2023-03-10T11:19",
            "2023-03-10T11",
            "2023-03-10 11",
            "2023-03-10T11Z",
        ] {
            assert!(check_timestamp_iso(ok), "{ok} should be accepted");
        }
        for bad in [
            "",
            "tagada",
            "2023-13-10",
            "2023-03-10T25:00:00",
            "2023-03-10T25",
            "10/03/2023",
            " 2023-03-10 ",
            "2023-03-10T11:19:52\n",
        ] {
            assert!(!check_timestamp_iso(bad), "{bad} should be rejected");
        }
    }
}
