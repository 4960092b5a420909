//! Floating-point leaf codecs.
//!
//! float32/float64 travel as their IEEE-754 bit patterns, little-endian.
//! The JSON face is a fixed-form decimal that round-trips exactly; the
//! non-finite values are emitted as the quoted literals `"NaN"`,
//! `"Infinity"` and `"-Infinity"`, and the same spellings are accepted
//! on input. float128 is opaque to the codec: sixteen raw bytes with a
//! `"0x"`-prefixed 32-digit lowercase hex JSON form.

use std::fmt::Write as _;

use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;

fn special_of_str(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn f64_from_value(v: &Value, what: &str) -> Result<f64> {
    match v {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            ErrorKind::Parse(format!("unrepresentable number for {}", what)).into_error()
        }),
        Value::String(s) => {
            if let Some(special) = special_of_str(s) {
                return Ok(special);
            }
            s.trim().parse::<f64>().map_err(|_| {
                ErrorKind::Parse(format!("expected number for {}, found '{}'", what, s))
                    .into_error()
            })
        }
        other => Err(ErrorKind::Parse(format!(
            "expected number for {}, found {}",
            what,
            json::kind_of(other)
        ))
        .into_error()),
    }
}

fn write_f64_json(w: &mut JsonWriter, val: f64) {
    if val.is_nan() {
        w.string("NaN");
    } else if val == f64::INFINITY {
        w.string("Infinity");
    } else if val == f64::NEG_INFINITY {
        w.string("-Infinity");
    } else {
        w.number(val);
    }
}

pub(crate) fn float32_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let val = f64_from_value(v, "float32")? as f32;
    out.push_many(val.to_bits().to_le_bytes());
    Ok(())
}

pub(crate) fn float32_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let val = f32::from_bits(u32::from_le_bytes(r.read_arr()?));
    if val.is_nan() {
        w.string("NaN");
    } else if val == f32::INFINITY {
        w.string("Infinity");
    } else if val == f32::NEG_INFINITY {
        w.string("-Infinity");
    } else {
        w.number(val);
    }
    Ok(())
}

pub(crate) fn float64_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let val = f64_from_value(v, "float64")?;
    out.push_many(val.to_bits().to_le_bytes());
    Ok(())
}

pub(crate) fn float64_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let val = f64::from_bits(u64::from_le_bytes(r.read_arr()?));
    write_f64_json(w, val);
    Ok(())
}

pub(crate) fn float128_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let s = json::string(v, "float128")?;
    let digits = s.strip_prefix("0x").ok_or_else(|| {
        ErrorKind::Parse(format!("expected 0x-prefixed hex for float128, found '{}'", s))
            .into_error()
    })?;
    let bytes = crate::util::bytes_of_hex(digits)?;
    if bytes.len() != 16 {
        return Err(ErrorKind::Range(format!(
            "float128 needs 32 hex digits, found {}",
            digits.len()
        ))
        .into_error());
    }
    out.push_all(&bytes);
    Ok(())
}

pub(crate) fn float128_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let raw: [u8; 16] = r.read_arr()?;
    let mut text = String::with_capacity(34);
    text.push_str("0x");
    for byte in raw {
        let _ = write!(text, "{:02x}", byte);
    }
    w.string(&text);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::{bytes_of_hex, hex_of_bytes};
    use serde_json::json;

    fn f64_bin(v: Value) -> String {
        let mut out = Vec::new();
        float64_from_json(&v, &mut out).unwrap();
        hex_of_bytes(&out)
    }

    fn f64_txt(hex: &str) -> String {
        let bytes = bytes_of_hex(hex).unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        float64_to_json(&mut r, &mut w).unwrap();
        w.finish()
    }

    #[test]
    fn f64_bit_patterns() {
        assert_eq!(f64_bin(json!(1.0)), "000000000000F03F");
        assert_eq!(f64_txt("000000000000F03F"), "1");
        assert_eq!(f64_bin(json!(-0.5)), "000000000000E0BF");
        assert_eq!(f64_txt("000000000000E0BF"), "-0.5");
    }

    #[test]
    fn f64_specials_quoted() {
        assert_eq!(f64_bin(json!("Infinity")), "000000000000F07F");
        assert_eq!(f64_txt("000000000000F07F"), r#""Infinity""#);
        assert_eq!(f64_bin(json!("-Infinity")), "000000000000F0FF");
        assert_eq!(f64_txt("000000000000F0FF"), r#""-Infinity""#);
        assert_eq!(f64_txt("010000000000F07F"), r#""NaN""#);
    }

    #[test]
    fn f32_roundtrip() {
        let mut out = Vec::new();
        float32_from_json(&json!(0.125), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "0000003E");
        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        float32_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), "0.125");
    }

    #[test]
    fn float128_hex_form() {
        let text = json!("0x0102030405060708090a0b0c0d0e0f10");
        let mut out = Vec::new();
        float128_from_json(&text, &mut out).unwrap();
        assert_eq!(out.len(), 16);
        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        float128_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""0x0102030405060708090a0b0c0d0e0f10""#);

        assert!(float128_from_json(&json!("0102"), &mut Vec::new()).is_err());
        assert!(float128_from_json(&json!("0x0102"), &mut Vec::new()).is_err());
    }
}
