//! Bit-array leaf codec.
//!
//! Binary is a varuint32 bit count followed by `ceil(n/8)` bytes, least
//! significant bit of the first byte holding bit zero; unused high bits
//! are zero. The JSON face is a string of `0`/`1` characters in
//! decreasing bit-index order, so the first character is the highest
//! bit. ABI 1.3 introduced a mandatory `0b` prefix on that string;
//! earlier schema versions neither emit nor accept it.

use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;
use crate::varint::write_varuint32;

pub(crate) fn bitset_from_json(v: &Value, out: &mut Vec<u8>, prefixed: bool) -> Result<()> {
    let text = json::string(v, "bitset")?;
    let digits = if prefixed {
        text.strip_prefix("0b").ok_or_else(|| {
            ErrorKind::Parse(format!("bitset '{}' is missing its 0b prefix", text)).into_error()
        })?
    } else {
        if text.starts_with("0b") {
            return Err(ErrorKind::Parse(format!(
                "bitset '{}' carries a 0b prefix, which this schema version does not accept",
                text
            ))
            .into_error());
        }
        text
    };

    let num_bits = u32::try_from(digits.len())
        .map_err(|_| ErrorKind::Overflow("bitset bit count exceeds u32".to_owned()).into_error())?;
    let mut blocks = vec![0u8; digits.len().div_ceil(8)];
    for (i, c) in digits.bytes().enumerate() {
        // high bitset indexes come first in the text representation
        let pos = digits.len() - 1 - i;
        match c {
            b'0' => {}
            b'1' => blocks[pos / 8] |= 1 << (pos % 8),
            other => {
                return Err(ErrorKind::Parse(format!(
                    "unexpected character '{}' in bitset",
                    other as char
                ))
                .into_error())
            }
        }
    }

    write_varuint32(out, num_bits);
    out.push_all(&blocks);
    Ok(())
}

pub(crate) fn bitset_to_json(
    r: &mut ByteReader<'_>,
    w: &mut JsonWriter,
    prefixed: bool,
) -> Result<()> {
    let num_bits = r.read_varuint32()? as usize;
    let blocks = r.read(num_bits.div_ceil(8))?;

    let mut text = String::with_capacity(num_bits + 2);
    if prefixed {
        text.push_str("0b");
    }
    for i in (0..num_bits).rev() {
        // bits past the declared count are masked off, never surfaced
        let bit = blocks[i / 8] >> (i % 8) & 1;
        text.push(if bit == 1 { '1' } else { '0' });
    }
    w.string(&text);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::{bytes_of_hex, hex_of_bytes};
    use serde_json::json;

    fn enc(text: &str, prefixed: bool) -> String {
        let mut out = Vec::new();
        bitset_from_json(&json!(text), &mut out, prefixed).unwrap();
        hex_of_bytes(&out)
    }

    fn dec(hex: &str, prefixed: bool) -> String {
        let bytes = bytes_of_hex(hex).unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        bitset_to_json(&mut r, &mut w, prefixed).unwrap();
        assert!(r.is_exhausted());
        w.finish()
    }

    #[test]
    fn wire_layout() {
        assert_eq!(enc("110001011", false), "098B01");
        assert_eq!(dec("098B01", false), r#""110001011""#);
        assert_eq!(enc("", false), "00");
        assert_eq!(dec("00", false), r#""""#);
        assert_eq!(enc("1", false), "0101");
        assert_eq!(enc("10000000", false), "0180");
    }

    #[test]
    fn prefix_is_version_gated() {
        assert_eq!(enc("0b110001011", true), "098B01");
        assert_eq!(dec("098B01", true), r#""0b110001011""#);
        assert!(bitset_from_json(&json!("110001011"), &mut Vec::new(), true).is_err());
        assert!(bitset_from_json(&json!("0b110001011"), &mut Vec::new(), false).is_err());
    }

    #[test]
    fn rejects_other_characters() {
        assert!(bitset_from_json(&json!("102"), &mut Vec::new(), false).is_err());
    }

    #[test]
    fn unused_high_bits_zero() {
        let text = "1".repeat(9);
        let mut out = Vec::new();
        bitset_from_json(&json!(text.as_str()), &mut out, false).unwrap();
        // 9 bits -> 2 blocks, second block has only bit 0 set
        assert_eq!(out, vec![0x09, 0xFF, 0x01]);
    }
}
