//! JSON encoding for measurement reports.
//!
//! [`ToJson`] is the conversion hook: anything that is not natively a JSON
//! value (timestamps, byte strings, non-finite floats, nested sequences)
//! says how it should look. Implement it for your own report types.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use speaker_test_bench::json::to_json_string;
//!
//! let row = (Utc.with_ymd_and_hms(2023, 3, 10, 11, 19, 52).unwrap(), f64::NAN, vec![1.5, 2.0]);
//! assert_eq!(
//!     to_json_string(&row).unwrap(),
//!     r#"["2023-03-10T11:19:52+00:00",null,[1.5,2.0]]"#
//! );
//! ```

use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

/// Conversion of a value into its JSON form.
///
/// Implementors provide [`ToJson::to_json_with`] and pass `encoder` on to
/// nested values so encoder settings reach every leaf.
pub trait ToJson {
    /// Returns the JSON representation of `self` under `encoder`'s settings.
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value;

    /// Returns the JSON representation of `self` with default settings.
    fn to_json(&self) -> Value {
        self.to_json_with(&JsonEncoder::default())
    }
}

/// Formats a timestamp like `2023-03-10T11:19:52+00:00`, adding
/// microseconds (`.560000`) only when the sub-second part is non-zero.
pub fn iso_format<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // Sub-microsecond precision is dropped
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
    }
}

impl ToJson for Value {
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        self.clone()
    }
}

impl ToJson for f64 {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        // NaN and +/-inf have no JSON representation
        Number::from_f64(*self).map_or_else(|| encoder.non_finite.clone(), Value::Number)
    }
}

impl ToJson for f32 {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        (*self as f64).to_json_with(encoder)
    }
}

macro_rules! impl_to_json_for_int {
    ($($t:ty),*) => {
        $(
            impl ToJson for $t {
                fn to_json_with(&self, _: &JsonEncoder) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_to_json_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToJson for bool {
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        Value::Bool(*self)
    }
}

impl ToJson for str {
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        Value::String(self.to_string())
    }
}

impl ToJson for String {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        self.as_str().to_json_with(encoder)
    }
}

/// Raw bytes, decoded as (lossy) UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bytes<'a>(pub &'a [u8]);

impl ToJson for Bytes<'_> {
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        Value::String(String::from_utf8_lossy(self.0).into_owned())
    }
}

impl<T: ToJson> ToJson for Option<T> {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        self.as_ref()
            .map_or(Value::Null, |v| v.to_json_with(encoder))
    }
}

impl<T: ToJson + ?Sized> ToJson for &T {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        (**self).to_json_with(encoder)
    }
}

impl<T: ToJson + ?Sized> ToJson for Box<T> {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        (**self).to_json_with(encoder)
    }
}

impl<T: ToJson> ToJson for [T] {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        Value::Array(self.iter().map(|v| v.to_json_with(encoder)).collect())
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        self.as_slice().to_json_with(encoder)
    }
}

impl<T: ToJson, const N: usize> ToJson for [T; N] {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        self.as_slice().to_json_with(encoder)
    }
}

macro_rules! impl_to_json_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: ToJson),+> ToJson for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
                let ($($name,)+) = self;
                Value::Array(vec![$($name.to_json_with(encoder)),+])
            }
        }
    };
}

impl_to_json_for_tuple!(A);
impl_to_json_for_tuple!(A, B);
impl_to_json_for_tuple!(A, B, C);
impl_to_json_for_tuple!(A, B, C, D);
impl_to_json_for_tuple!(A, B, C, D, E);
impl_to_json_for_tuple!(A, B, C, D, E, F);

impl<K: Display, V: ToJson> ToJson for BTreeMap<K, V> {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_json_with(encoder)))
                .collect(),
        )
    }
}

impl<K: Display, V: ToJson, S> ToJson for HashMap<K, V, S> {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_json_with(encoder)))
                .collect(),
        )
    }
}

impl ToJson for Map<String, Value> {
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        Value::Object(self.clone())
    }
}

impl<Tz> ToJson for DateTime<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        Value::String(iso_format(self))
    }
}

/// Naive timestamps are taken to be UTC.
impl ToJson for NaiveDateTime {
    fn to_json_with(&self, encoder: &JsonEncoder) -> Value {
        self.and_utc().to_json_with(encoder)
    }
}

impl ToJson for NaiveDate {
    fn to_json_with(&self, _: &JsonEncoder) -> Value {
        Value::String(self.format("%Y-%m-%d").to_string())
    }
}

/// Encodes [`ToJson`] values to text.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonEncoder {
    /// Indented output instead of compact.
    pub pretty: bool,
    /// Written in place of NaN and +/-inf.
    pub non_finite: Value,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        JsonEncoder {
            pretty: false,
            non_finite: Value::Null,
        }
    }
}

impl JsonEncoder {
    /// Indented output.
    pub fn pretty() -> Self {
        JsonEncoder {
            pretty: true,
            ..Default::default()
        }
    }

    /// Replaces non-finite floats with `value` instead of `null`.
    pub fn with_non_finite(mut self, value: impl Into<Value>) -> Self {
        self.non_finite = value.into();
        self
    }

    /// Serializes `value` to a string.
    pub fn encode<T: ToJson + ?Sized>(&self, value: &T) -> Result<String> {
        let tree = value.to_json_with(self);
        let text = if self.pretty {
            serde_json::to_string_pretty(&tree)?
        } else {
            serde_json::to_string(&tree)?
        };
        Ok(text)
    }
}

/// Compact encoding with non-finite floats as `null`.
pub fn to_json_string<T: ToJson + ?Sized>(value: &T) -> Result<String> {
    JsonEncoder::default().encode(value)
}
