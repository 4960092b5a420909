//! The two symmetric conversion walkers.
//!
//! Both directions are a single case analysis over the resolved
//! [`TypeView`] at each step, recursing through wrappers and struct or
//! variant members until a leaf codec takes over. JSON input is walked
//! as a DOM; JSON output streams through [`JsonWriter`]. The walkers
//! keep a path stack so the first failure can name exactly where in
//! the value it happened, and the binary direction additionally pins
//! the byte offset.

use serde_json::Value;

use crate::abi::table::{Builtin, Field, TypeTable, TypeView, VariantEntry};
use crate::error::{CodecError, ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::parse::ByteReader;
use crate::varint::write_varuint32;
use crate::{bitset, crypto, float, int, name, prim, symbol, time, varint};

/// Nested type wrappers beyond this depth abort with *recursion_limit*.
pub const MAX_RECURSION_DEPTH: usize = 32;

/// Converts a DOM value of type `type_name` into wire bytes.
pub fn json_to_bin(
    table: &TypeTable,
    type_name: &str,
    value: &Value,
    out: &mut Vec<u8>,
    reorderable: bool,
) -> Result<()> {
    let mut engine = Engine::new(table, type_name);
    engine.encode(type_name, value, out, 0, reorderable)
}

/// Converts wire bytes of type `type_name` into JSON text through `w`.
pub fn bin_to_json(
    table: &TypeTable,
    type_name: &str,
    bytes: &[u8],
    w: &mut JsonWriter,
) -> Result<()> {
    let mut engine = Engine::new(table, type_name);
    let mut reader = ByteReader::new(bytes);
    engine.decode(type_name, &mut reader, w, 0)
}

enum PathSeg {
    Field(String),
    Index(usize),
}

struct Engine<'t> {
    table: &'t TypeTable,
    root: String,
    path: Vec<PathSeg>,
}

impl<'t> Engine<'t> {
    fn new(table: &'t TypeTable, root: &str) -> Self {
        Self {
            table,
            root: root.to_owned(),
            path: Vec::new(),
        }
    }

    fn render_path(&self) -> String {
        use std::fmt::Write as _;
        let mut out = self.root.clone();
        for seg in &self.path {
            match seg {
                PathSeg::Field(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                PathSeg::Index(i) => {
                    let _ = write!(out, "[{}]", i);
                }
            }
        }
        out
    }

    fn located(&self, e: CodecError) -> CodecError {
        e.with_path(self.render_path())
    }

    fn located_at(&self, e: CodecError, offset: usize) -> CodecError {
        e.with_path(self.render_path()).with_offset(offset)
    }

    fn missing_field(&self, field: &Field) -> CodecError {
        ErrorKind::MissingField(field.name.clone())
            .into_error()
            .with_path(format!("{}.{}", self.render_path(), field.name))
    }

    fn field_gap(&self, field: &Field) -> CodecError {
        ErrorKind::ExtensionGap(field.name.clone())
            .into_error()
            .with_path(format!("{}.{}", self.render_path(), field.name))
    }

    // ---- JSON -> binary -------------------------------------------------

    fn encode(
        &mut self,
        ty: &str,
        v: &Value,
        out: &mut Vec<u8>,
        depth: usize,
        reorderable: bool,
    ) -> Result<()> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(self.located(ErrorKind::RecursionLimit.into_error()));
        }
        let view = self.table.view(ty).map_err(|e| self.located(e))?;
        match view {
            TypeView::Builtin(builtin) => {
                let prefixed_bitset = self.table.version().bitset_prefix();
                encode_builtin(builtin, v, out, prefixed_bitset).map_err(|e| self.located(e))
            }
            TypeView::Optional(inner) => {
                if v.is_null() {
                    out.push(0x00);
                    Ok(())
                } else {
                    out.push(0x01);
                    self.encode(inner, v, out, depth + 1, reorderable)
                }
            }
            // presence is decided by the enclosing struct walk
            TypeView::Extension(inner) => self.encode(inner, v, out, depth + 1, reorderable),
            TypeView::Array(inner) => {
                let items = self.expect_array(v, ty)?;
                let count = u32::try_from(items.len()).map_err(|_| {
                    self.located(
                        ErrorKind::Overflow("array length exceeds u32".to_owned()).into_error(),
                    )
                })?;
                write_varuint32(out, count);
                self.encode_items(inner, items, out, depth, reorderable)
            }
            TypeView::SizedArray(inner, expected) => {
                let items = self.expect_array(v, ty)?;
                if items.len() != expected {
                    return Err(self.located(
                        ErrorKind::LengthMismatch {
                            expected,
                            actual: items.len(),
                        }
                        .into_error(),
                    ));
                }
                self.encode_items(inner, items, out, depth, reorderable)
            }
            TypeView::Struct(name, _) => self.encode_struct(name, v, out, depth, reorderable),
            TypeView::Variant(name, entry) => {
                self.encode_variant(name, entry, v, out, depth, reorderable)
            }
        }
    }

    fn expect_array<'v>(&self, v: &'v Value, ty: &str) -> Result<&'v Vec<Value>> {
        v.as_array().ok_or_else(|| {
            self.located(
                ErrorKind::Parse(format!(
                    "expected array for {}, found {}",
                    ty,
                    json::kind_of(v)
                ))
                .into_error(),
            )
        })
    }

    fn encode_items(
        &mut self,
        inner: &str,
        items: &[Value],
        out: &mut Vec<u8>,
        depth: usize,
        reorderable: bool,
    ) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            self.path.push(PathSeg::Index(i));
            let result = self.encode(inner, item, out, depth + 1, reorderable);
            self.path.pop();
            result?;
        }
        Ok(())
    }

    fn encode_struct(
        &mut self,
        struct_name: &str,
        v: &Value,
        out: &mut Vec<u8>,
        depth: usize,
        reorderable: bool,
    ) -> Result<()> {
        let fields = self
            .table
            .flattened_fields(struct_name)
            .map_err(|e| self.located(e))?;
        match v {
            Value::Object(map) => {
                if reorderable {
                    self.encode_struct_reorderable(&fields, map, out, depth)
                } else {
                    self.encode_struct_strict(&fields, map, out, depth)
                }
            }
            Value::Array(items) => {
                self.encode_struct_positional(&fields, items, out, depth, reorderable)
            }
            other => Err(self.located(
                ErrorKind::Parse(format!(
                    "expected object or array for struct {}, found {}",
                    struct_name,
                    json::kind_of(other)
                ))
                .into_error(),
            )),
        }
    }

    fn encode_field(
        &mut self,
        field: &Field,
        value: &Value,
        out: &mut Vec<u8>,
        depth: usize,
        reorderable: bool,
    ) -> Result<()> {
        self.path.push(PathSeg::Field(field.name.clone()));
        let result = self.encode(&field.type_name, value, out, depth + 1, reorderable);
        self.path.pop();
        result
    }

    /// Declared order, no unknown members, extensions omissible only at
    /// the tail.
    fn encode_struct_strict(
        &mut self,
        fields: &[&Field],
        map: &serde_json::Map<String, Value>,
        out: &mut Vec<u8>,
        depth: usize,
    ) -> Result<()> {
        let mut entries = map.iter().peekable();
        let mut absent_extension = false;
        for field in fields {
            let next_matches = entries
                .peek()
                .is_some_and(|(key, _)| key.as_str() == field.name);
            if next_matches {
                if absent_extension {
                    return Err(self.field_gap(field));
                }
                if let Some((_, value)) = entries.next() {
                    self.encode_field(field, value, out, depth, false)?;
                }
            } else if field.is_extension() {
                absent_extension = true;
            } else {
                return Err(self.missing_field(field));
            }
        }
        if let Some((key, _)) = entries.next() {
            return Err(self.located(
                ErrorKind::Parse(format!("unexpected field '{}'", key)).into_error(),
            ));
        }
        Ok(())
    }

    /// Members located by name; unknown members ignored; a present
    /// extension after an absent one is still a gap.
    fn encode_struct_reorderable(
        &mut self,
        fields: &[&Field],
        map: &serde_json::Map<String, Value>,
        out: &mut Vec<u8>,
        depth: usize,
    ) -> Result<()> {
        let mut absent_extension = false;
        for field in fields {
            match map.get(&field.name) {
                Some(value) => {
                    if absent_extension {
                        return Err(self.field_gap(field));
                    }
                    self.encode_field(field, value, out, depth, true)?;
                }
                None => {
                    if field.is_extension() {
                        absent_extension = true;
                    } else {
                        return Err(self.missing_field(field));
                    }
                }
            }
        }
        Ok(())
    }

    /// Array-form struct: values in declared order.
    fn encode_struct_positional(
        &mut self,
        fields: &[&Field],
        items: &[Value],
        out: &mut Vec<u8>,
        depth: usize,
        reorderable: bool,
    ) -> Result<()> {
        for (i, field) in fields.iter().enumerate() {
            match items.get(i) {
                Some(value) => self.encode_field(field, value, out, depth, reorderable)?,
                None => {
                    if !field.is_extension() {
                        return Err(self.missing_field(field));
                    }
                }
            }
        }
        if items.len() > fields.len() {
            return Err(self.located(
                ErrorKind::LengthMismatch {
                    expected: fields.len(),
                    actual: items.len(),
                }
                .into_error(),
            ));
        }
        Ok(())
    }

    fn encode_variant(
        &mut self,
        variant_name: &str,
        entry: &VariantEntry,
        v: &Value,
        out: &mut Vec<u8>,
        depth: usize,
        reorderable: bool,
    ) -> Result<()> {
        let pair = v.as_array().filter(|items| items.len() == 2).ok_or_else(|| {
            self.located(
                ErrorKind::Parse(format!(
                    "expected [\"type\", value] pair for variant {}",
                    variant_name
                ))
                .into_error(),
            )
        })?;
        let tag = json::string(&pair[0], "variant tag").map_err(|e| self.located(e))?;
        let index = entry
            .types
            .iter()
            .position(|t| t == tag)
            .ok_or_else(|| self.located(ErrorKind::UnknownVariant(tag.to_owned()).into_error()))?;
        // index always fits: variants are bounded by the document size
        write_varuint32(out, index as u32);
        self.path.push(PathSeg::Field(tag.to_owned()));
        let result = self.encode(&entry.types[index], &pair[1], out, depth + 1, reorderable);
        self.path.pop();
        result
    }

    // ---- binary -> JSON -------------------------------------------------

    fn decode(
        &mut self,
        ty: &str,
        r: &mut ByteReader<'_>,
        w: &mut JsonWriter,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(self.located_at(ErrorKind::RecursionLimit.into_error(), r.offset()));
        }
        let view = self
            .table
            .view(ty)
            .map_err(|e| self.located_at(e, r.offset()))?;
        match view {
            TypeView::Builtin(builtin) => {
                let prefixed_bitset = self.table.version().bitset_prefix();
                decode_builtin(builtin, r, w, prefixed_bitset)
                    .map_err(|e| self.located_at(e, r.offset()))
            }
            TypeView::Optional(inner) => match r.read_byte().map_err(|e| {
                self.located_at(e.into_error(), r.offset())
            })? {
                0x00 => {
                    w.null();
                    Ok(())
                }
                0x01 => self.decode(inner, r, w, depth + 1),
                byte => Err(self.located_at(
                    ErrorKind::Range(format!("invalid optional presence byte 0x{:02X}", byte))
                        .into_error(),
                    r.offset(),
                )),
            },
            TypeView::Extension(inner) => self.decode(inner, r, w, depth + 1),
            TypeView::Array(inner) => {
                let count = r
                    .read_varuint32()
                    .map_err(|e| self.located_at(e.into_error(), r.offset()))?;
                w.begin_array();
                for i in 0..count as usize {
                    self.path.push(PathSeg::Index(i));
                    let result = self.decode(inner, r, w, depth + 1);
                    self.path.pop();
                    result?;
                }
                w.end();
                Ok(())
            }
            TypeView::SizedArray(inner, count) => {
                w.begin_array();
                for i in 0..count {
                    self.path.push(PathSeg::Index(i));
                    let result = self.decode(inner, r, w, depth + 1);
                    self.path.pop();
                    result?;
                }
                w.end();
                Ok(())
            }
            TypeView::Struct(name, _) => self.decode_struct(name, r, w, depth),
            TypeView::Variant(name, entry) => self.decode_variant(name, entry, r, w, depth),
        }
    }

    fn decode_struct(
        &mut self,
        struct_name: &str,
        r: &mut ByteReader<'_>,
        w: &mut JsonWriter,
        depth: usize,
    ) -> Result<()> {
        let fields = self
            .table
            .flattened_fields(struct_name)
            .map_err(|e| self.located_at(e, r.offset()))?;
        w.begin_object();
        for field in fields {
            // extension fields exist on the wire only while bytes remain
            if field.is_extension() && r.is_exhausted() {
                break;
            }
            w.key(&field.name);
            self.path.push(PathSeg::Field(field.name.clone()));
            let result = self.decode(&field.type_name, r, w, depth + 1);
            self.path.pop();
            result?;
        }
        w.end();
        Ok(())
    }

    fn decode_variant(
        &mut self,
        variant_name: &str,
        entry: &VariantEntry,
        r: &mut ByteReader<'_>,
        w: &mut JsonWriter,
        depth: usize,
    ) -> Result<()> {
        let index = r
            .read_varuint32()
            .map_err(|e| self.located_at(e.into_error(), r.offset()))?
            as usize;
        let tag = entry.types.get(index).ok_or_else(|| {
            self.located_at(
                ErrorKind::UnknownVariant(format!(
                    "index {} of {} (has {} alternatives)",
                    index,
                    variant_name,
                    entry.types.len()
                ))
                .into_error(),
                r.offset(),
            )
        })?;
        w.begin_array();
        w.string(tag);
        self.path.push(PathSeg::Field(tag.clone()));
        let result = self.decode(tag, r, w, depth + 1);
        self.path.pop();
        result?;
        w.end();
        Ok(())
    }
}

fn encode_builtin(
    builtin: Builtin,
    v: &Value,
    out: &mut Vec<u8>,
    prefixed_bitset: bool,
) -> Result<()> {
    match builtin {
        Builtin::Bool => prim::bool_from_json(v, out),
        Builtin::Int8 => int::int8_from_json(v, out),
        Builtin::Uint8 => int::uint8_from_json(v, out),
        Builtin::Int16 => int::int16_from_json(v, out),
        Builtin::Uint16 => int::uint16_from_json(v, out),
        Builtin::Int32 => int::int32_from_json(v, out),
        Builtin::Uint32 => int::uint32_from_json(v, out),
        Builtin::Int64 => int::int64_from_json(v, out),
        Builtin::Uint64 => int::uint64_from_json(v, out),
        Builtin::Int128 => int::int128_from_json(v, out),
        Builtin::Uint128 => int::uint128_from_json(v, out),
        Builtin::Varint32 => varint::varint32_from_json(v, out),
        Builtin::Varuint32 => varint::varuint32_from_json(v, out),
        Builtin::Float32 => float::float32_from_json(v, out),
        Builtin::Float64 => float::float64_from_json(v, out),
        Builtin::Float128 => float::float128_from_json(v, out),
        Builtin::TimePoint => time::time_point_from_json(v, out),
        Builtin::TimePointSec => time::time_point_sec_from_json(v, out),
        Builtin::BlockTimestamp => time::block_timestamp_from_json(v, out),
        Builtin::Name => name::name_from_json(v, out),
        Builtin::Bytes => prim::bytes_from_json(v, out),
        Builtin::String => prim::string_from_json(v, out),
        Builtin::Checksum160 => crypto::checksum160_from_json(v, out),
        Builtin::Checksum256 => crypto::checksum256_from_json(v, out),
        Builtin::Checksum512 => crypto::checksum512_from_json(v, out),
        Builtin::PublicKey => crypto::public_key_from_json(v, out),
        Builtin::PrivateKey => crypto::private_key_from_json(v, out),
        Builtin::Signature => crypto::signature_from_json(v, out),
        Builtin::Symbol => symbol::symbol_from_json(v, out),
        Builtin::SymbolCode => symbol::symbol_code_from_json(v, out),
        Builtin::Asset => symbol::asset_from_json(v, out),
        Builtin::ExtendedAsset => symbol::extended_asset_from_json(v, out),
        Builtin::Bitset => bitset::bitset_from_json(v, out, prefixed_bitset),
    }
}

fn decode_builtin(
    builtin: Builtin,
    r: &mut ByteReader<'_>,
    w: &mut JsonWriter,
    prefixed_bitset: bool,
) -> Result<()> {
    match builtin {
        Builtin::Bool => prim::bool_to_json(r, w),
        Builtin::Int8 => int::int8_to_json(r, w),
        Builtin::Uint8 => int::uint8_to_json(r, w),
        Builtin::Int16 => int::int16_to_json(r, w),
        Builtin::Uint16 => int::uint16_to_json(r, w),
        Builtin::Int32 => int::int32_to_json(r, w),
        Builtin::Uint32 => int::uint32_to_json(r, w),
        Builtin::Int64 => int::int64_to_json(r, w),
        Builtin::Uint64 => int::uint64_to_json(r, w),
        Builtin::Int128 => int::int128_to_json(r, w),
        Builtin::Uint128 => int::uint128_to_json(r, w),
        Builtin::Varint32 => varint::varint32_to_json(r, w),
        Builtin::Varuint32 => varint::varuint32_to_json(r, w),
        Builtin::Float32 => float::float32_to_json(r, w),
        Builtin::Float64 => float::float64_to_json(r, w),
        Builtin::Float128 => float::float128_to_json(r, w),
        Builtin::TimePoint => time::time_point_to_json(r, w),
        Builtin::TimePointSec => time::time_point_sec_to_json(r, w),
        Builtin::BlockTimestamp => time::block_timestamp_to_json(r, w),
        Builtin::Name => name::name_to_json(r, w),
        Builtin::Bytes => prim::bytes_to_json(r, w),
        Builtin::String => prim::string_to_json(r, w),
        Builtin::Checksum160 => crypto::checksum160_to_json(r, w),
        Builtin::Checksum256 => crypto::checksum256_to_json(r, w),
        Builtin::Checksum512 => crypto::checksum512_to_json(r, w),
        Builtin::PublicKey => crypto::public_key_to_json(r, w),
        Builtin::PrivateKey => crypto::private_key_to_json(r, w),
        Builtin::Signature => crypto::signature_to_json(r, w),
        Builtin::Symbol => symbol::symbol_to_json(r, w),
        Builtin::SymbolCode => symbol::symbol_code_to_json(r, w),
        Builtin::Asset => symbol::asset_to_json(r, w),
        Builtin::ExtendedAsset => symbol::extended_asset_to_json(r, w),
        Builtin::Bitset => bitset::bitset_to_json(r, w, prefixed_bitset),
    }
}
