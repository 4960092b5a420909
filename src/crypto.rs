//! Checksum, key and signature leaf codecs.
//!
//! Key material travels in binary as a curve tag byte (`0` = K1,
//! `1` = R1, `2` = WebAuthn) followed by the raw payload; WebAuthn
//! payloads additionally carry length-prefixed metadata which is
//! validated structurally but re-emitted verbatim. The JSON face is a
//! typed prefix (`PUB_K1_`, `SIG_R1_`, `PVT_K1_`, …) followed by
//! base-58 over payload plus a four-byte RIPEMD-160 checksum; the
//! checksum input mixes in the curve suffix for the modern prefixes and
//! nothing for the legacy `EOS` form, which is accepted on input only.

use ripemd::{Digest, Ripemd160};
use serde_json::Value;

use crate::base58;
use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;

const TAG_K1: u8 = 0;
const TAG_R1: u8 = 1;
const TAG_WA: u8 = 2;

fn checksum4(payload: &[u8], suffix: &str) -> [u8; 4] {
    let mut hasher = Ripemd160::new();
    hasher.update(payload);
    hasher.update(suffix.as_bytes());
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}

fn encode_checked(payload: &[u8], suffix: &str) -> String {
    let mut buf = Vec::with_capacity(payload.len() + 4);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum4(payload, suffix));
    base58::encode(&buf)
}

fn decode_checked(text: &str, suffix: &str) -> Result<Vec<u8>> {
    let raw = base58::decode(text)?;
    if raw.len() < 5 {
        return Err(
            ErrorKind::InvalidChecksum(format!("'{}' is too short to carry a checksum", text))
                .into_error(),
        );
    }
    let (payload, check) = raw.split_at(raw.len() - 4);
    if checksum4(payload, suffix) != check {
        return Err(
            ErrorKind::InvalidChecksum(format!("checksum mismatch in '{}'", text)).into_error(),
        );
    }
    Ok(payload.to_vec())
}

fn expect_len(payload: &[u8], expected: usize, what: &str) -> Result<()> {
    if payload.len() != expected {
        return Err(ErrorKind::Range(format!(
            "{} payload must be {} bytes, found {}",
            what,
            expected,
            payload.len()
        ))
        .into_error());
    }
    Ok(())
}

/// Walks a WebAuthn public-key payload: compressed key, user-presence
/// byte, length-prefixed relying-party id.
fn validate_wa_key(payload: &[u8]) -> Result<()> {
    let mut r = ByteReader::new(payload);
    r.read(33)?;
    r.read_byte()?;
    let len = r.read_varuint32()? as usize;
    r.read(len)?;
    if !r.is_exhausted() {
        return Err(ErrorKind::InvalidKey(format!(
            "{} trailing byte(s) after WebAuthn key metadata",
            r.remainder()
        ))
        .into_error());
    }
    Ok(())
}

/// Walks a WebAuthn signature payload: compact signature, then
/// length-prefixed authenticator data and client JSON.
fn validate_wa_signature(payload: &[u8]) -> Result<()> {
    let mut r = ByteReader::new(payload);
    r.read(65)?;
    for _ in 0..2 {
        let len = r.read_varuint32()? as usize;
        r.read(len)?;
    }
    if !r.is_exhausted() {
        return Err(ErrorKind::InvalidSignature(format!(
            "{} trailing byte(s) after WebAuthn signature metadata",
            r.remainder()
        ))
        .into_error());
    }
    Ok(())
}

pub(crate) fn public_key_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let text = json::string(v, "public_key")?;
    let (tag, payload) = if let Some(rest) = text.strip_prefix("PUB_K1_") {
        (TAG_K1, decode_checked(rest, "K1")?)
    } else if let Some(rest) = text.strip_prefix("PUB_R1_") {
        (TAG_R1, decode_checked(rest, "R1")?)
    } else if let Some(rest) = text.strip_prefix("PUB_WA_") {
        (TAG_WA, decode_checked(rest, "WA")?)
    } else if let Some(rest) = text.strip_prefix("EOS") {
        // legacy form: K1 with an unsuffixed checksum
        (TAG_K1, decode_checked(rest, "")?)
    } else {
        return Err(
            ErrorKind::InvalidKey(format!("unrecognized public key prefix in '{}'", text))
                .into_error(),
        );
    };
    match tag {
        TAG_WA => validate_wa_key(&payload)?,
        _ => expect_len(&payload, 33, "public key")?,
    }
    out.push_one(tag);
    out.push_all(&payload);
    Ok(())
}

pub(crate) fn public_key_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let tag = r.read_byte()?;
    let (prefix, suffix, payload) = match tag {
        TAG_K1 => ("PUB_K1_", "K1", r.read(33)?),
        TAG_R1 => ("PUB_R1_", "R1", r.read(33)?),
        TAG_WA => {
            let start = r.offset();
            r.read(33)?;
            r.read_byte()?;
            let len = r.read_varuint32()? as usize;
            r.read(len)?;
            ("PUB_WA_", "WA", r.span_since(start))
        }
        other => {
            return Err(
                ErrorKind::InvalidKey(format!("unknown public key tag {}", other)).into_error(),
            )
        }
    };
    w.string(&format!("{}{}", prefix, encode_checked(payload, suffix)));
    Ok(())
}

pub(crate) fn private_key_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let text = json::string(v, "private_key")?;
    let (tag, payload) = if let Some(rest) = text.strip_prefix("PVT_K1_") {
        (TAG_K1, decode_checked(rest, "K1")?)
    } else if let Some(rest) = text.strip_prefix("PVT_R1_") {
        (TAG_R1, decode_checked(rest, "R1")?)
    } else {
        return Err(
            ErrorKind::InvalidKey(format!("unrecognized private key prefix in '{}'", text))
                .into_error(),
        );
    };
    expect_len(&payload, 32, "private key")?;
    out.push_one(tag);
    out.push_all(&payload);
    Ok(())
}

pub(crate) fn private_key_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let tag = r.read_byte()?;
    let (prefix, suffix) = match tag {
        TAG_K1 => ("PVT_K1_", "K1"),
        TAG_R1 => ("PVT_R1_", "R1"),
        other => {
            return Err(
                ErrorKind::InvalidKey(format!("unknown private key tag {}", other)).into_error(),
            )
        }
    };
    let payload = r.read(32)?;
    w.string(&format!("{}{}", prefix, encode_checked(payload, suffix)));
    Ok(())
}

pub(crate) fn signature_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let text = json::string(v, "signature")?;
    let (tag, payload) = if let Some(rest) = text.strip_prefix("SIG_K1_") {
        (TAG_K1, decode_checked(rest, "K1")?)
    } else if let Some(rest) = text.strip_prefix("SIG_R1_") {
        (TAG_R1, decode_checked(rest, "R1")?)
    } else if let Some(rest) = text.strip_prefix("SIG_WA_") {
        (TAG_WA, decode_checked(rest, "WA")?)
    } else {
        return Err(ErrorKind::InvalidSignature(format!(
            "unrecognized signature prefix in '{}'",
            text
        ))
        .into_error());
    };
    match tag {
        TAG_WA => validate_wa_signature(&payload)?,
        _ => expect_len(&payload, 65, "signature")?,
    }
    out.push_one(tag);
    out.push_all(&payload);
    Ok(())
}

pub(crate) fn signature_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let tag = r.read_byte()?;
    let (prefix, suffix, payload) = match tag {
        TAG_K1 => ("SIG_K1_", "K1", r.read(65)?),
        TAG_R1 => ("SIG_R1_", "R1", r.read(65)?),
        TAG_WA => {
            let start = r.offset();
            r.read(65)?;
            for _ in 0..2 {
                let len = r.read_varuint32()? as usize;
                r.read(len)?;
            }
            ("SIG_WA_", "WA", r.span_since(start))
        }
        other => {
            return Err(
                ErrorKind::InvalidSignature(format!("unknown signature tag {}", other))
                    .into_error(),
            )
        }
    };
    w.string(&format!("{}{}", prefix, encode_checked(payload, suffix)));
    Ok(())
}

macro_rules! impl_checksum_codec {
    ( $( ($bytes:literal, $from_json:ident, $to_json:ident, $what:literal) ),* $(,)? ) => {
        $(
            pub(crate) fn $from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
                let hex = json::string(v, $what)?;
                let payload = crate::util::bytes_of_hex(hex).map_err(|_| {
                    ErrorKind::InvalidChecksum(format!(
                        concat!("invalid hex in ", $what, " '{}'"),
                        hex
                    ))
                    .into_error()
                })?;
                if payload.len() != $bytes {
                    return Err(ErrorKind::InvalidChecksum(format!(
                        concat!($what, " must be {} hex digits, found {}"),
                        $bytes * 2,
                        hex.len()
                    ))
                    .into_error());
                }
                out.push_all(&payload);
                Ok(())
            }

            pub(crate) fn $to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
                let payload = r.read($bytes)?;
                w.string(&crate::util::hex_of_bytes(payload));
                Ok(())
            }
        )*
    };
}

impl_checksum_codec!(
    (20, checksum160_from_json, checksum160_to_json, "checksum160"),
    (32, checksum256_from_json, checksum256_to_json, "checksum256"),
    (64, checksum512_from_json, checksum512_to_json, "checksum512"),
);
