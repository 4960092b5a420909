//! Fixed-width integer leaf codecs.
//!
//! Binary is little-endian two's complement at every width. The JSON
//! face splits on width: 8/16/32-bit values are plain JSON numbers,
//! while 64- and 128-bit values are quoted decimal strings so they
//! survive IEEE-754 JSON readers; quoted decimal is accepted on input
//! for every width.

use serde_json::Value;

use crate::error::Result;
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;

macro_rules! impl_int_codec {
    ( $( ($t:ty, $from_json:ident, $to_json:ident, $what:literal, $wide:literal) ),* $(,)? ) => {
        $(
            pub(crate) fn $from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
                let val: $t = json::integer(v, $what)?;
                out.push_many(val.to_le_bytes());
                Ok(())
            }

            pub(crate) fn $to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
                let val = <$t>::from_le_bytes(r.read_arr()?);
                if $wide {
                    w.string(&val.to_string());
                } else {
                    w.number(val);
                }
                Ok(())
            }
        )*
    };
}

impl_int_codec!(
    (u8, uint8_from_json, uint8_to_json, "uint8", false),
    (u16, uint16_from_json, uint16_to_json, "uint16", false),
    (u32, uint32_from_json, uint32_to_json, "uint32", false),
    (u64, uint64_from_json, uint64_to_json, "uint64", true),
    (u128, uint128_from_json, uint128_to_json, "uint128", true),
    (i8, int8_from_json, int8_to_json, "int8", false),
    (i16, int16_from_json, int16_to_json, "int16", false),
    (i32, int32_from_json, int32_to_json, "int32", false),
    (i64, int64_from_json, int64_to_json, "int64", true),
    (i128, int128_from_json, int128_to_json, "int128", true),
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::{bytes_of_hex, hex_of_bytes};
    use serde_json::json;

    fn bin<F: Fn(&Value, &mut Vec<u8>) -> Result<()>>(f: F, v: Value) -> String {
        let mut out = Vec::new();
        f(&v, &mut out).unwrap();
        hex_of_bytes(&out)
    }

    fn txt<F: Fn(&mut ByteReader<'_>, &mut JsonWriter) -> Result<()>>(f: F, hex: &str) -> String {
        let bytes = bytes_of_hex(hex).unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        f(&mut r, &mut w).unwrap();
        assert!(r.is_exhausted());
        w.finish()
    }

    #[test]
    fn narrow_widths_are_numbers() {
        assert_eq!(bin(uint16_from_json, json!(65535)), "FFFF");
        assert_eq!(txt(uint16_to_json, "FFFF"), "65535");
        assert_eq!(bin(int8_from_json, json!(-1)), "FF");
        assert_eq!(txt(int8_to_json, "FF"), "-1");
        assert_eq!(bin(int32_from_json, json!(-2)), "FEFFFFFF");
        assert_eq!(txt(int32_to_json, "FEFFFFFF"), "-2");
    }

    #[test]
    fn wide_widths_are_strings() {
        assert_eq!(
            bin(uint64_from_json, json!("18446744073709551615")),
            "FFFFFFFFFFFFFFFF"
        );
        assert_eq!(
            txt(uint64_to_json, "FFFFFFFFFFFFFFFF"),
            r#""18446744073709551615""#
        );
        assert_eq!(
            bin(int128_from_json, json!("-1")),
            "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"
        );
        assert_eq!(
            txt(int128_to_json, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"),
            r#""-1""#
        );
        // unquoted numbers still accepted for wide widths
        assert_eq!(bin(uint64_from_json, json!(5)), "0500000000000000");
    }

    #[test]
    fn decode_rejects_short_input() {
        let bytes = bytes_of_hex("FF").unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        assert!(uint32_to_json(&mut r, &mut w).is_err());
    }
}
