//! Account/identifier name codec.
//!
//! A name packs up to thirteen characters of the 32-symbol alphabet
//! `.12345abcdefghijklmnopqrstuvwxyz` into a 64-bit word: twelve
//! five-bit symbols from the top of the word down, plus a four-bit
//! thirteenth symbol (restricted to the first sixteen alphabet entries)
//! in the low nibble. The period encodes zero and trailing periods are
//! not representable, which is why the strict parser demands round-trip
//! stability. Binary is the 64-bit word, little-endian.

use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

fn char_to_symbol(c: u8) -> Option<u8> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some(c - b'1' + 1),
        b'a'..=b'z' => Some(c - b'a' + 6),
        _ => None,
    }
}

/// Permissive text→name mapping: invalid characters contribute zero
/// bits and characters past the thirteenth are ignored.
///
/// This is the historical tooling behavior kept for the façade; the
/// conversion engine itself uses [`string_to_name_strict`].
#[must_use]
pub fn string_to_name(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut name: u64 = 0;
    for (i, &c) in bytes.iter().take(12).enumerate() {
        let sym = u64::from(char_to_symbol(c).unwrap_or(0) & 0x1f);
        name |= sym << (64 - 5 * (i + 1));
    }
    if let Some(&c) = bytes.get(12) {
        name |= u64::from(char_to_symbol(c).unwrap_or(0) & 0x0f);
    }
    name
}

/// Strict text→name parse used by the conversion engine.
///
/// Rejects invalid characters, names longer than thirteen characters, a
/// thirteenth character outside the first sixteen alphabet symbols, and
/// any spelling that does not survive a round-trip (such as trailing
/// periods).
pub fn string_to_name_strict(s: &str) -> Result<u64> {
    let bytes = s.as_bytes();
    if bytes.len() > 13 {
        return Err(ErrorKind::InvalidName(format!(
            "'{}' is longer than 13 characters",
            s
        ))
        .into_error());
    }
    let mut name: u64 = 0;
    for (i, &c) in bytes.iter().enumerate() {
        let sym = char_to_symbol(c).ok_or_else(|| {
            ErrorKind::InvalidName(format!("'{}' contains invalid character '{}'", s, c as char))
                .into_error()
        })?;
        if i == 12 {
            if sym >= 16 {
                return Err(ErrorKind::InvalidName(format!(
                    "thirteenth character of '{}' must be one of '.12345a-j'",
                    s
                ))
                .into_error());
            }
            name |= u64::from(sym);
        } else {
            name |= u64::from(sym) << (64 - 5 * (i + 1));
        }
    }
    if name_to_string(name) != s {
        return Err(ErrorKind::InvalidName(format!(
            "'{}' does not round-trip (trailing periods are not representable)",
            s
        ))
        .into_error());
    }
    Ok(name)
}

/// Renders a name word as its textual form; the zero name is `""`.
#[must_use]
pub fn name_to_string(value: u64) -> String {
    let mut chars = [b'.'; 13];
    let mut tmp = value;
    for i in 0..13 {
        let c = if i == 0 {
            let c = CHARMAP[(tmp & 0x0f) as usize];
            tmp >>= 4;
            c
        } else {
            let c = CHARMAP[(tmp & 0x1f) as usize];
            tmp >>= 5;
            c
        };
        chars[12 - i] = c;
    }
    let trimmed = match chars.iter().rposition(|&c| c != b'.') {
        Some(last) => &chars[..=last],
        None => &chars[..0],
    };
    // CHARMAP is pure ASCII
    String::from_utf8(trimmed.to_vec()).unwrap_or_default()
}

pub(crate) fn name_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let s = json::string(v, "name")?;
    let name = string_to_name_strict(s)?;
    out.push_many(name.to_le_bytes());
    Ok(())
}

pub(crate) fn name_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let value = u64::from_le_bytes(r.read_arr()?);
    w.string(&name_to_string(value));
    Ok(())
}
