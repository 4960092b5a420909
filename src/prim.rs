//! Boolean, byte-blob and string leaf codecs.

use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;
use crate::varint::write_varuint32;

pub(crate) fn bool_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let val = json::boolean(v, "bool")?;
    out.push_one(u8::from(val));
    Ok(())
}

pub(crate) fn bool_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    match r.read_byte()? {
        0 => w.boolean(false),
        1 => w.boolean(true),
        byte => {
            return Err(
                ErrorKind::Range(format!("invalid boolean byte 0x{:02X}", byte)).into_error()
            )
        }
    }
    Ok(())
}

/// Reads a varuint32 length prefix and that many payload bytes.
pub(crate) fn read_sized<'a>(r: &mut ByteReader<'a>) -> Result<&'a [u8]> {
    let len = r.read_varuint32()? as usize;
    Ok(r.read(len)?)
}

/// Writes a varuint32 length prefix followed by the payload.
pub(crate) fn write_sized(out: &mut impl Target, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        ErrorKind::Overflow(format!("payload of {} bytes exceeds u32 length", payload.len()))
            .into_error()
    })?;
    write_varuint32(out, len);
    out.push_all(payload);
    Ok(())
}

pub(crate) fn bytes_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let hex = json::string(v, "bytes")?;
    let payload = crate::util::bytes_of_hex(hex)?;
    write_sized(out, &payload)
}

pub(crate) fn bytes_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let payload = read_sized(r)?;
    w.string(&crate::util::hex_of_bytes(payload));
    Ok(())
}

pub(crate) fn string_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let s = json::string(v, "string")?;
    write_sized(out, s.as_bytes())
}

pub(crate) fn string_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let payload = read_sized(r)?;
    w.string_bytes(payload);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::{bytes_of_hex, hex_of_bytes};
    use serde_json::json;

    #[test]
    fn bool_bytes() {
        let mut out = Vec::new();
        bool_from_json(&json!(true), &mut out).unwrap();
        bool_from_json(&json!(false), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "0100");

        let bytes = bytes_of_hex("02").unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        assert!(matches!(
            bool_to_json(&mut r, &mut w).unwrap_err().kind(),
            ErrorKind::Range(_)
        ));
    }

    #[test]
    fn bytes_hex_face() {
        let mut out = Vec::new();
        bytes_from_json(&json!("00FF7e"), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "0300FF7E");

        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        bytes_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""00FF7E""#);
    }

    #[test]
    fn string_length_prefix() {
        let mut out = Vec::new();
        string_from_json(&json!("hi"), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "026869");

        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        string_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""hi""#);
    }

    #[test]
    fn string_invalid_utf8_replaced() {
        let bytes = bytes_of_hex("03FF6869").unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        string_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""?hi""#);
        assert!(r.is_exhausted());
    }
}
