//! Variable-length integer leaf codec.
//!
//! `varuint32` is little-endian base-128 (LEB128) with the continuation
//! bit in each byte's MSB; `varint32` is the zig-zag transform of a
//! signed 32-bit value over the same carrier. Emission is always the
//! minimal form; decoding tolerates non-minimal encodings up to the
//! five-byte limit (see [`crate::parse::ByteReader::read_varuint32`]).

use serde_json::Value;

use crate::error::Result;
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;

/// Appends the minimal LEB128 form of `val`.
pub fn write_varuint32(out: &mut impl Target, val: u32) {
    let mut val = val;
    loop {
        let byte = (val & 0x7f) as u8;
        val >>= 7;
        if val == 0 {
            out.push_one(byte);
            return;
        }
        out.push_one(byte | 0x80);
    }
}

/// Appends the zig-zag LEB128 form of `val`.
pub fn write_varint32(out: &mut impl Target, val: i32) {
    write_varuint32(out, ((val << 1) ^ (val >> 31)) as u32);
}

pub fn read_varint32(r: &mut ByteReader<'_>) -> Result<i32> {
    let zigzag = r.read_varuint32()?;
    Ok((zigzag >> 1) as i32 ^ -((zigzag & 1) as i32))
}

pub(crate) fn varuint32_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let val: u32 = json::integer(v, "varuint32")?;
    write_varuint32(out, val);
    Ok(())
}

pub(crate) fn varuint32_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let val = r.read_varuint32()?;
    w.number(val);
    Ok(())
}

pub(crate) fn varint32_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let val: i32 = json::integer(v, "varint32")?;
    write_varint32(out, val);
    Ok(())
}

pub(crate) fn varint32_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let val = read_varint32(r)?;
    w.number(val);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::hex_of_bytes;

    fn enc_u(val: u32) -> String {
        let mut out: Vec<u8> = Vec::new();
        write_varuint32(&mut out, val);
        hex_of_bytes(&out)
    }

    fn enc_i(val: i32) -> String {
        let mut out: Vec<u8> = Vec::new();
        write_varint32(&mut out, val);
        hex_of_bytes(&out)
    }

    #[test]
    fn varuint32_minimal_forms() {
        const CASES: [(u32, &str); 6] = [
            (0, "00"),
            (1, "01"),
            (127, "7F"),
            (128, "8001"),
            (300, "AC02"),
            (u32::MAX, "FFFFFFFF0F"),
        ];
        for (val, hex) in CASES {
            assert_eq!(enc_u(val), hex);
            let bytes = crate::util::bytes_of_hex(hex).unwrap();
            let mut r = ByteReader::new(&bytes);
            assert_eq!(r.read_varuint32().unwrap(), val);
            assert!(r.is_exhausted());
        }
    }

    #[test]
    fn varint32_zigzag() {
        const CASES: [(i32, &str); 5] = [
            (0, "00"),
            (-1, "01"),
            (1, "02"),
            (-2147483648, "FFFFFFFF0F"),
            (2147483647, "FEFFFFFF0F"),
        ];
        for (val, hex) in CASES {
            assert_eq!(enc_i(val), hex);
            let bytes = crate::util::bytes_of_hex(hex).unwrap();
            let mut r = ByteReader::new(&bytes);
            assert_eq!(read_varint32(&mut r).unwrap(), val);
        }
    }
}
