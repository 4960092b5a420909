//! Base-58 textual codec for checksum-tagged key material.
//!
//! The Bitcoin alphabet (no `0`, `O`, `I`, `l`); leading zero bytes map
//! to leading `1` characters and back.

use crate::error::ErrorKind;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const fn build_reverse_map() -> [i8; 128] {
    let mut map = [-1i8; 128];
    let mut i = 0;
    while i < 58 {
        map[ALPHABET[i] as usize] = i as i8;
        i += 1;
    }
    map
}

const REVERSE: [i8; 128] = build_reverse_map();

/// Encodes bytes into base-58 text.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // big-number division by repeated carry, most significant digit last
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        out.push('1');
    }
    for &digit in digits.iter().rev() {
        out.push(ALPHABET[digit as usize] as char);
    }
    out
}

/// Decodes base-58 text into bytes.
pub fn decode(s: &str) -> Result<Vec<u8>, ErrorKind> {
    let bytes = s.as_bytes();
    let zeros = bytes.iter().take_while(|&&b| b == b'1').count();

    let mut out: Vec<u8> = Vec::with_capacity(s.len() * 733 / 1000 + 1);
    for &c in &bytes[zeros..] {
        let digit = if c < 128 { REVERSE[c as usize] } else { -1 };
        if digit < 0 {
            return Err(ErrorKind::Parse(format!(
                "invalid base-58 character '{}'",
                c as char
            )));
        }
        let mut carry = digit as u32;
        for byte in out.iter_mut() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            out.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut result = vec![0u8; zeros];
    result.extend(out.iter().rev());
    Ok(result)
}
