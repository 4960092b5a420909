//! Time leaf codecs.
//!
//! `time_point` is signed microseconds since the Unix epoch (64-bit),
//! `time_point_sec` unsigned whole seconds (32-bit), and
//! `block_timestamp_type` a 32-bit count of half-second slots since
//! 2000-01-01T00:00:00Z. All three read and write ISO-8601 text with
//! no timezone designator.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::target::Target;

/// Milliseconds between the Unix epoch and 2000-01-01T00:00:00Z.
const BLOCK_EPOCH_MS: i64 = 946_684_800_000;
/// Milliseconds per block slot.
const SLOT_MS: i64 = 500;

fn parse_iso(s: &str, what: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.f").map_err(|_| {
        ErrorKind::Parse(format!("expected ISO-8601 time for {}, found '{}'", what, s))
            .into_error()
    })
}

fn micros_of_text(s: &str, what: &str) -> Result<i64> {
    let naive = parse_iso(s, what)?;
    Ok(naive.and_utc().timestamp_micros())
}

/// Formats microseconds since epoch, emitting the shortest fraction
/// that preserves the value (none, milliseconds, or microseconds).
fn text_of_micros(micros: i64, what: &str) -> Result<String> {
    let secs = micros.div_euclid(1_000_000);
    let sub_micros = micros.rem_euclid(1_000_000) as u32;
    let dt = DateTime::from_timestamp(secs, sub_micros * 1_000)
        .ok_or_else(|| ErrorKind::Range(format!("{} out of calendar range", what)).into_error())?;
    let base = dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string();
    if sub_micros == 0 {
        Ok(base)
    } else if sub_micros % 1_000 == 0 {
        Ok(format!("{}.{:03}", base, sub_micros / 1_000))
    } else {
        Ok(format!("{}.{:06}", base, sub_micros))
    }
}

pub(crate) fn time_point_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let micros = micros_of_text(json::string(v, "time_point")?, "time_point")?;
    out.push_many(micros.to_le_bytes());
    Ok(())
}

pub(crate) fn time_point_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let micros = i64::from_le_bytes(r.read_arr()?);
    w.string(&text_of_micros(micros, "time_point")?);
    Ok(())
}

pub(crate) fn time_point_sec_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let micros = micros_of_text(json::string(v, "time_point_sec")?, "time_point_sec")?;
    let secs = u32::try_from(micros.div_euclid(1_000_000)).map_err(|_| {
        ErrorKind::Range("time_point_sec outside the unsigned 32-bit second range".to_owned())
            .into_error()
    })?;
    out.push_many(secs.to_le_bytes());
    Ok(())
}

pub(crate) fn time_point_sec_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let secs = u32::from_le_bytes(r.read_arr()?);
    w.string(&text_of_micros(i64::from(secs) * 1_000_000, "time_point_sec")?);
    Ok(())
}

pub(crate) fn block_timestamp_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let micros = micros_of_text(
        json::string(v, "block_timestamp_type")?,
        "block_timestamp_type",
    )?;
    let ms = micros.div_euclid(1_000);
    let slot = u32::try_from((ms - BLOCK_EPOCH_MS).div_euclid(SLOT_MS)).map_err(|_| {
        ErrorKind::Range("block timestamp outside the slot range".to_owned()).into_error()
    })?;
    out.push_many(slot.to_le_bytes());
    Ok(())
}

pub(crate) fn block_timestamp_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let slot = u32::from_le_bytes(r.read_arr()?);
    let ms = i64::from(slot) * SLOT_MS + BLOCK_EPOCH_MS;
    let secs = ms.div_euclid(1_000);
    let sub_ms = ms.rem_euclid(1_000) as u32;
    let dt = DateTime::from_timestamp(secs, sub_ms * 1_000_000).ok_or_else(|| {
        ErrorKind::Range("block timestamp out of calendar range".to_owned()).into_error()
    })?;
    // always millisecond precision, matching half-second slots
    let text = format!(
        "{}.{:03}",
        dt.naive_utc().format("%Y-%m-%dT%H:%M:%S"),
        sub_ms
    );
    w.string(&text);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::{bytes_of_hex, hex_of_bytes};
    use serde_json::json;

    fn tp_bin(text: &str) -> String {
        let mut out = Vec::new();
        time_point_from_json(&json!(text), &mut out).unwrap();
        hex_of_bytes(&out)
    }

    fn tp_txt(hex: &str) -> String {
        let bytes = bytes_of_hex(hex).unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        time_point_to_json(&mut r, &mut w).unwrap();
        w.finish()
    }

    #[test]
    fn time_point_fractions() {
        // epoch itself
        assert_eq!(tp_bin("1970-01-01T00:00:00"), "0000000000000000");
        assert_eq!(tp_txt("0000000000000000"), r#""1970-01-01T00:00:00""#);
        // one millisecond
        assert_eq!(tp_bin("1970-01-01T00:00:00.001"), "E803000000000000");
        assert_eq!(tp_txt("E803000000000000"), r#""1970-01-01T00:00:00.001""#);
        // one microsecond
        assert_eq!(tp_bin("1970-01-01T00:00:00.000001"), "0100000000000000");
        assert_eq!(tp_txt("0100000000000000"), r#""1970-01-01T00:00:00.000001""#);
    }

    #[test]
    fn time_point_known_instant() {
        // 2018-06-01T12:00:00 = 1527854400 s
        let micros: i64 = 1_527_854_400_000_000;
        let hex = hex_of_bytes(&micros.to_le_bytes());
        assert_eq!(tp_bin("2018-06-01T12:00:00"), hex);
        assert_eq!(tp_txt(&hex), r#""2018-06-01T12:00:00""#);
    }

    #[test]
    fn time_point_sec_wire() {
        let mut out = Vec::new();
        time_point_sec_from_json(&json!("2018-06-01T12:00:00"), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "40E4105B");

        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        time_point_sec_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""2018-06-01T12:00:00""#);

        assert!(time_point_sec_from_json(&json!("1969-12-31T23:59:59"), &mut Vec::new()).is_err());
    }

    #[test]
    fn block_timestamp_slots() {
        // slot 0 is the 2000-01-01 epoch
        let mut out = Vec::new();
        block_timestamp_from_json(&json!("2000-01-01T00:00:00.000"), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "00000000");

        // slot 1 is half a second later
        let mut out = Vec::new();
        block_timestamp_from_json(&json!("2000-01-01T00:00:00.500"), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "01000000");

        let bytes = bytes_of_hex("01000000").unwrap();
        let mut r = ByteReader::new(&bytes);
        let mut w = JsonWriter::compact();
        block_timestamp_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""2000-01-01T00:00:00.500""#);

        assert!(block_timestamp_from_json(&json!("1999-12-31T23:59:59"), &mut Vec::new()).is_err());
    }
}
