//! JSON-side infrastructure for the conversion engine.
//!
//! The engine consumes a [`serde_json::Value`] DOM on the way in (the
//! `preserve_order` feature keeps object members in document order,
//! which the strict struct mode depends on) and emits through the
//! streaming [`writer::JsonWriter`] on the way out. This module holds
//! the typed accessors over the DOM; the writer lives in [`writer`].

pub mod writer;

use serde_json::Value;

use crate::error::{ErrorKind, Result};

/// Parses JSON text into a DOM, classifying syntax failures as *parse*.
pub fn parse_text(text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| ErrorKind::Parse(format!("invalid JSON: {}", e)).into_error())
}

/// Closed set of integer widths [`integer`] can produce.
pub(crate) trait JsonInt: Sized + Copy {
    const WHAT: &'static str;
    fn from_i128(val: i128) -> Option<Self>;
    fn from_u128(val: u128) -> Option<Self>;
}

macro_rules! impl_json_int {
    ( $( $t:ty ),* ) => {
        $(
            impl JsonInt for $t {
                const WHAT: &'static str = stringify!($t);

                fn from_i128(val: i128) -> Option<Self> {
                    <$t>::try_from(val).ok()
                }

                fn from_u128(val: u128) -> Option<Self> {
                    <$t>::try_from(val).ok()
                }
            }
        )*
    };
}

impl_json_int!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

/// Extracts an integer from a JSON number or a decimal string.
///
/// Quoted decimal is accepted for every width (the wire tooling quotes
/// 64-bit and wider values to survive IEEE-754 readers); fractional
/// numbers are rejected as *parse*, out-of-width values as *range*.
pub(crate) fn integer<T: JsonInt>(v: &Value, what: &str) -> Result<T> {
    let out_of_range =
        |txt: &str| ErrorKind::Range(format!("{} out of range for {}", txt, what)).into_error();
    match v {
        Value::Number(n) => {
            if let Some(val) = n.as_i64() {
                T::from_i128(i128::from(val)).ok_or_else(|| out_of_range(&val.to_string()))
            } else if let Some(val) = n.as_u64() {
                T::from_u128(u128::from(val)).ok_or_else(|| out_of_range(&val.to_string()))
            } else {
                Err(ErrorKind::Parse(format!(
                    "expected integer for {}, found non-integral number {}",
                    what, n
                ))
                .into_error())
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Some(rest) = s.strip_prefix('-') {
                if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed_int(s, what));
                }
                let val: i128 = s
                    .parse()
                    .map_err(|_| out_of_range(s))?;
                T::from_i128(val).ok_or_else(|| out_of_range(s))
            } else {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed_int(s, what));
                }
                let val: u128 = s
                    .parse()
                    .map_err(|_| out_of_range(s))?;
                T::from_u128(val).ok_or_else(|| out_of_range(s))
            }
        }
        other => Err(ErrorKind::Parse(format!(
            "expected integer for {}, found {}",
            what,
            kind_of(other)
        ))
        .into_error()),
    }
}

fn malformed_int(s: &str, what: &str) -> crate::error::CodecError {
    ErrorKind::Parse(format!("expected decimal integer for {}, found '{}'", what, s)).into_error()
}

/// Extracts a string, failing with *parse* otherwise.
pub(crate) fn string<'v>(v: &'v Value, what: &str) -> Result<&'v str> {
    v.as_str().ok_or_else(|| {
        ErrorKind::Parse(format!("expected string for {}, found {}", what, kind_of(v)))
            .into_error()
    })
}

/// Extracts a boolean, failing with *parse* otherwise.
pub(crate) fn boolean(v: &Value, what: &str) -> Result<bool> {
    v.as_bool().ok_or_else(|| {
        ErrorKind::Parse(format!("expected boolean for {}, found {}", what, kind_of(v)))
            .into_error()
    })
}

/// One-word description of a DOM node, for error messages.
pub(crate) fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
