//! Currency symbol and asset leaf codecs.
//!
//! A symbol code packs up to seven `A`–`Z` characters into the low
//! bytes of a 64-bit word, one byte per character, zero-padded. The
//! full symbol shifts the code up one byte and stores the decimal
//! precision in the low byte. An asset is a signed 64-bit amount
//! scaled by the symbol's precision, followed by the symbol itself;
//! its JSON face is the familiar `"1.2345 SYS"` form.

use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::name;
use crate::parse::ByteReader;
use crate::target::Target;

fn pack_code(s: &str) -> Result<u64> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 7 {
        return Err(ErrorKind::Range(format!(
            "symbol code '{}' must be 1-7 characters",
            s
        ))
        .into_error());
    }
    let mut raw: u64 = 0;
    for (i, &c) in bytes.iter().enumerate() {
        if !c.is_ascii_uppercase() {
            return Err(ErrorKind::Range(format!(
                "symbol code '{}' contains invalid character '{}'",
                s, c as char
            ))
            .into_error());
        }
        raw |= u64::from(c) << (8 * i);
    }
    Ok(raw)
}

fn unpack_code(mut raw: u64) -> String {
    let mut code = String::with_capacity(7);
    while raw > 0 {
        code.push((raw & 0xff) as u8 as char);
        raw >>= 8;
    }
    code
}

/// Parses `"N,SYM"` into the packed symbol word.
fn parse_symbol(s: &str) -> Result<u64> {
    let (precision_txt, code_txt) = s.split_once(',').ok_or_else(|| {
        ErrorKind::Parse(format!("expected 'precision,CODE' symbol, found '{}'", s)).into_error()
    })?;
    let precision: u8 = precision_txt.parse().map_err(|_| {
        ErrorKind::Range(format!("invalid symbol precision '{}'", precision_txt)).into_error()
    })?;
    Ok(pack_code(code_txt)? << 8 | u64::from(precision))
}

fn format_symbol(raw: u64) -> String {
    format!("{},{}", raw & 0xff, unpack_code(raw >> 8))
}

pub(crate) fn symbol_code_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let raw = pack_code(json::string(v, "symbol_code")?)?;
    out.push_many(raw.to_le_bytes());
    Ok(())
}

pub(crate) fn symbol_code_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let raw = u64::from_le_bytes(r.read_arr()?);
    w.string(&unpack_code(raw));
    Ok(())
}

pub(crate) fn symbol_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let raw = parse_symbol(json::string(v, "symbol")?)?;
    out.push_many(raw.to_le_bytes());
    Ok(())
}

pub(crate) fn symbol_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let raw = u64::from_le_bytes(r.read_arr()?);
    w.string(&format_symbol(raw));
    Ok(())
}

/// Parses `"-1.2345 SYS"` into `(amount, packed_symbol)`.
fn parse_asset(s: &str) -> Result<(i64, u64)> {
    let bad = || ErrorKind::Parse(format!("invalid asset '{}'", s)).into_error();
    let s = s.trim();
    let (number_txt, code_txt) = s.split_once(' ').ok_or_else(bad)?;

    let (negative, digits_txt) = match number_txt.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, number_txt),
    };
    let (whole_txt, frac_txt) = match digits_txt.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (digits_txt, ""),
    };
    if whole_txt.is_empty()
        || !whole_txt.bytes().all(|b| b.is_ascii_digit())
        || !frac_txt.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(bad());
    }
    let precision = u8::try_from(frac_txt.len())
        .map_err(|_| ErrorKind::Range(format!("asset '{}' has too many decimals", s)).into_error())?;

    let mut amount: i128 = 0;
    for b in whole_txt.bytes().chain(frac_txt.bytes()) {
        amount = amount * 10 + i128::from(b - b'0');
        if amount > i128::from(u64::MAX) {
            return Err(
                ErrorKind::Overflow(format!("asset amount in '{}' overflows", s)).into_error()
            );
        }
    }
    if negative {
        amount = -amount;
    }
    let amount = i64::try_from(amount)
        .map_err(|_| ErrorKind::Overflow(format!("asset amount in '{}' overflows", s)).into_error())?;

    let symbol = pack_code(code_txt)? << 8 | u64::from(precision);
    Ok((amount, symbol))
}

fn format_asset(amount: i64, symbol: u64) -> String {
    let precision = (symbol & 0xff) as u32;
    let code = unpack_code(symbol >> 8);
    let magnitude = i128::from(amount).unsigned_abs();
    let scale = 10u128.pow(precision);
    let sign = if amount < 0 { "-" } else { "" };
    if precision == 0 {
        format!("{}{} {}", sign, magnitude, code)
    } else {
        format!(
            "{}{}.{:0width$} {}",
            sign,
            magnitude / scale,
            magnitude % scale,
            code,
            width = precision as usize
        )
    }
}

pub(crate) fn asset_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let (amount, symbol) = parse_asset(json::string(v, "asset")?)?;
    out.push_many(amount.to_le_bytes());
    out.push_many(symbol.to_le_bytes());
    Ok(())
}

pub(crate) fn asset_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    let amount = i64::from_le_bytes(r.read_arr()?);
    let symbol = u64::from_le_bytes(r.read_arr()?);
    w.string(&format_asset(amount, symbol));
    Ok(())
}

pub(crate) fn extended_asset_from_json(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    let obj = v.as_object().ok_or_else(|| {
        ErrorKind::Parse(format!(
            "expected object for extended_asset, found {}",
            json::kind_of(v)
        ))
        .into_error()
    })?;
    let quantity = obj
        .get("quantity")
        .ok_or_else(|| ErrorKind::MissingField("quantity".to_owned()).into_error())?;
    let contract = obj
        .get("contract")
        .ok_or_else(|| ErrorKind::MissingField("contract".to_owned()).into_error())?;
    asset_from_json(quantity, out)?;
    name::name_from_json(contract, out)
}

pub(crate) fn extended_asset_to_json(r: &mut ByteReader<'_>, w: &mut JsonWriter) -> Result<()> {
    w.begin_object();
    w.key("quantity");
    asset_to_json(r, w)?;
    w.key("contract");
    name::name_to_json(r, w)?;
    w.end();
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::hex_of_bytes;
    use serde_json::json;

    #[test]
    fn symbol_packing() {
        assert_eq!(parse_symbol("4,SYS").unwrap(), 0x0053_5953_04u64);
        assert_eq!(format_symbol(0x0053_5953_04u64), "4,SYS");
        assert!(parse_symbol("SYS").is_err());
        assert!(parse_symbol("4,sys").is_err());
        assert!(parse_symbol("4,TOOLONGX").is_err());
    }

    #[test]
    fn asset_wire_form() {
        let mut out = Vec::new();
        asset_from_json(&json!("1.2345 SYS"), &mut out).unwrap();
        assert_eq!(hex_of_bytes(&out), "39300000000000000453595300000000");

        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        asset_to_json(&mut r, &mut w).unwrap();
        assert_eq!(w.finish(), r#""1.2345 SYS""#);
    }

    #[test]
    fn asset_text_edge_cases() {
        assert_eq!(parse_asset("0.0000 SYS").unwrap().0, 0);
        assert_eq!(parse_asset("-0.0010 SYS").unwrap().0, -10);
        assert_eq!(parse_asset("7 BTC").unwrap(), (7, pack_code("BTC").unwrap() << 8));
        assert_eq!(format_asset(-10, parse_symbol("4,SYS").unwrap()), "-0.0010 SYS");
        assert_eq!(format_asset(7, parse_symbol("0,BTC").unwrap()), "7 BTC");
        assert!(parse_asset("1..2 SYS").is_err());
        assert!(parse_asset("1.2SYS").is_err());
        assert!(parse_asset("99999999999999999999 SYS").is_err());
    }

    #[test]
    fn extended_asset_object() {
        let mut out = Vec::new();
        extended_asset_from_json(
            &json!({"quantity": "1.2345 SYS", "contract": "eosio.token"}),
            &mut out,
        )
        .unwrap();
        assert_eq!(
            hex_of_bytes(&out),
            "3930000000000000045359530000000000A6823403EA3055"
        );

        let mut r = ByteReader::new(&out);
        let mut w = JsonWriter::compact();
        extended_asset_to_json(&mut r, &mut w).unwrap();
        assert_eq!(
            w.finish(),
            r#"{"quantity":"1.2345 SYS","contract":"eosio.token"}"#
        );
    }
}
