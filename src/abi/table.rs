//! Compiled type table and name resolution.
//!
//! The table is a flat, insertion-ordered mapping from type name to
//! descriptor; struct bases, field types and variant alternatives are
//! stored as name keys into the same mapping, never as inline owning
//! references. Resolution strips wrapper suffixes from the outside in
//! (`[N]`, `[]`, `$`, `?`), then looks the head name up in builtins
//! first, declared entries second, action results last.

use indexmap::IndexMap;

use super::AbiVersion;
use crate::error::{ErrorKind, Result};

/// Closed set of leaf wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Int128,
    Uint128,
    Varint32,
    Varuint32,
    Float32,
    Float64,
    Float128,
    TimePoint,
    TimePointSec,
    BlockTimestamp,
    Name,
    Bytes,
    String,
    Checksum160,
    Checksum256,
    Checksum512,
    PublicKey,
    PrivateKey,
    Signature,
    Symbol,
    SymbolCode,
    Asset,
    ExtendedAsset,
    Bitset,
}

impl Builtin {
    /// Resolves a head name against the builtin set.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "uint8" => Self::Uint8,
            "int16" => Self::Int16,
            "uint16" => Self::Uint16,
            "int32" => Self::Int32,
            "uint32" => Self::Uint32,
            "int64" => Self::Int64,
            "uint64" => Self::Uint64,
            "int128" => Self::Int128,
            "uint128" => Self::Uint128,
            "varint32" => Self::Varint32,
            "varuint32" => Self::Varuint32,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "float128" => Self::Float128,
            "time_point" => Self::TimePoint,
            "time_point_sec" => Self::TimePointSec,
            "block_timestamp_type" => Self::BlockTimestamp,
            "name" => Self::Name,
            "bytes" => Self::Bytes,
            "string" => Self::String,
            "checksum160" => Self::Checksum160,
            "checksum256" => Self::Checksum256,
            "checksum512" => Self::Checksum512,
            "public_key" => Self::PublicKey,
            "private_key" => Self::PrivateKey,
            "signature" => Self::Signature,
            "symbol" => Self::Symbol,
            "symbol_code" => Self::SymbolCode,
            "asset" => Self::Asset,
            "extended_asset" => Self::ExtendedAsset,
            "bitset" => Self::Bitset,
            _ => return None,
        })
    }
}

/// One struct member: a name and the name of its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_name: String,
}

impl Field {
    /// Whether the member is a binary extension (`$`-suffixed type).
    #[must_use]
    pub fn is_extension(&self) -> bool {
        self.type_name.ends_with('$')
    }
}

/// Struct descriptor; `base` names the parent struct, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructEntry {
    pub base: Option<String>,
    pub fields: Vec<Field>,
}

/// Variant descriptor; each alternative's JSON tag is its type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantEntry {
    pub types: Vec<String>,
}

/// Named table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Alias(String),
    Struct(StructEntry),
    Variant(VariantEntry),
}

/// Resolved, borrowed view of a type name, one wrapper at a time.
#[derive(Debug, Clone, Copy)]
pub enum TypeView<'a> {
    Builtin(Builtin),
    Optional(&'a str),
    Extension(&'a str),
    Array(&'a str),
    SizedArray(&'a str, usize),
    Struct(&'a str, &'a StructEntry),
    Variant(&'a str, &'a VariantEntry),
}

/// Immutable compiled schema for one contract.
#[derive(Debug, Clone)]
pub struct TypeTable {
    version: AbiVersion,
    defs: IndexMap<String, TypeDef>,
    actions: IndexMap<String, String>,
    tables: IndexMap<String, String>,
    action_results: IndexMap<String, String>,
}

impl TypeTable {
    pub(crate) fn new(version: AbiVersion) -> Self {
        Self {
            version,
            defs: IndexMap::new(),
            actions: IndexMap::new(),
            tables: IndexMap::new(),
            action_results: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn version(&self) -> AbiVersion {
        self.version
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: String, def: TypeDef) {
        self.defs.insert(name, def);
    }

    pub(crate) fn insert_action(&mut self, name: String, type_name: String) {
        self.actions.insert(name, type_name);
    }

    pub(crate) fn insert_table(&mut self, name: String, type_name: String) {
        self.tables.insert(name, type_name);
    }

    pub(crate) fn insert_action_result(&mut self, name: String, result_type: String) {
        self.action_results.insert(name, result_type);
    }

    pub(crate) fn defs(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.defs.iter()
    }

    pub(crate) fn action_types(&self) -> impl Iterator<Item = &String> {
        self.actions.values()
    }

    pub(crate) fn table_types(&self) -> impl Iterator<Item = &String> {
        self.tables.values()
    }

    pub(crate) fn action_result_types(&self) -> impl Iterator<Item = &String> {
        self.action_results.values()
    }

    /// Type carried by a declared action, if the ABI names one.
    #[must_use]
    pub fn type_for_action(&self, action: &str) -> Option<&str> {
        self.actions.get(action).map(String::as_str)
    }

    /// Row type of a declared table, if the ABI names one.
    #[must_use]
    pub fn type_for_table(&self, table: &str) -> Option<&str> {
        self.tables.get(table).map(String::as_str)
    }

    /// Result type of a declared action, if the ABI names one (1.1+).
    #[must_use]
    pub fn type_for_action_result(&self, action: &str) -> Option<&str> {
        self.action_results.get(action).map(String::as_str)
    }

    /// Resolves one level of a type name.
    ///
    /// Wrapper suffixes are peeled outermost-first; aliases are
    /// followed through to their targets; adjacent `?`/`$` in either
    /// order is rejected. Unresolvable names fail with *unknown_type*.
    pub fn view<'a>(&'a self, name: &'a str) -> Result<TypeView<'a>> {
        self.view_bounded(name, MAX_ALIAS_HOPS)
    }

    fn view_bounded<'a>(&'a self, name: &'a str, hops: usize) -> Result<TypeView<'a>> {
        if let Some(inner) = name.strip_suffix("[]") {
            return Ok(TypeView::Array(inner));
        }
        if name.ends_with(']') {
            return self.view_sized_array(name);
        }
        if let Some(inner) = name.strip_suffix('$') {
            if inner.ends_with('?') {
                return Err(unknown(name));
            }
            return Ok(TypeView::Extension(inner));
        }
        if let Some(inner) = name.strip_suffix('?') {
            if inner.ends_with('$') {
                return Err(unknown(name));
            }
            return Ok(TypeView::Optional(inner));
        }

        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(TypeView::Builtin(builtin));
        }
        let follow = |target: &'a String| {
            if hops == 0 {
                Err(ErrorKind::CircularReference(name.to_owned()).into_error())
            } else {
                self.view_bounded(target, hops - 1)
            }
        };
        match self.defs.get_key_value(name) {
            Some((_, TypeDef::Alias(target))) => follow(target),
            Some((key, TypeDef::Struct(entry))) => Ok(TypeView::Struct(key, entry)),
            Some((key, TypeDef::Variant(entry))) => Ok(TypeView::Variant(key, entry)),
            None => match self.action_results.get(name) {
                Some(result_type) => follow(result_type),
                None => Err(unknown(name)),
            },
        }
    }

    fn view_sized_array<'a>(&'a self, name: &'a str) -> Result<TypeView<'a>> {
        let open = name.rfind('[').ok_or_else(|| unknown(name))?;
        if open == 0 {
            return Err(unknown(name));
        }
        let digits = &name[open + 1..name.len() - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unknown(name));
        }
        let count: usize = digits.parse().map_err(|_| unknown(name))?;
        Ok(TypeView::SizedArray(&name[..open], count))
    }

    /// Full field list of a struct: base fields first, own fields
    /// after, walking the inheritance chain.
    ///
    /// The loader has already verified the chain is a forest with
    /// unique member names, so failures here indicate either a name
    /// that is not a struct or a table assembled by hand.
    pub fn flattened_fields<'a>(&'a self, struct_name: &'a str) -> Result<Vec<&'a Field>> {
        let mut chain: Vec<&'a StructEntry> = Vec::new();
        let mut current: &'a str = struct_name;
        for _ in 0..=MAX_BASE_DEPTH {
            match self.view(current)? {
                TypeView::Struct(_, entry) => {
                    chain.push(entry);
                    match &entry.base {
                        Some(base) => current = base,
                        None => {
                            let mut fields = Vec::new();
                            for entry in chain.iter().rev() {
                                fields.extend(entry.fields.iter());
                            }
                            return Ok(fields);
                        }
                    }
                }
                _ => {
                    return Err(ErrorKind::UnknownType(format!(
                        "'{}' is not a struct",
                        current
                    ))
                    .into_error())
                }
            }
        }
        Err(ErrorKind::CircularReference(struct_name.to_owned()).into_error())
    }
}

/// Inheritance chains deeper than this are treated as cyclic.
const MAX_BASE_DEPTH: usize = 64;

/// Alias chains longer than this are treated as cyclic.
const MAX_ALIAS_HOPS: usize = 32;

fn unknown(name: &str) -> crate::error::CodecError {
    ErrorKind::UnknownType(name.to_owned()).into_error()
}

#[cfg(test)]
mod test {
    use super::*;

    fn empty_table() -> TypeTable {
        TypeTable::new(AbiVersion::parse("eosio::abi/1.2").unwrap())
    }

    #[test]
    fn suffixes_peel_outermost_first() {
        let table = empty_table();
        assert!(matches!(table.view("uint32[]").unwrap(), TypeView::Array("uint32")));
        assert!(matches!(
            table.view("uint32[3]").unwrap(),
            TypeView::SizedArray("uint32", 3)
        ));
        assert!(matches!(
            table.view("uint32[]?").unwrap(),
            TypeView::Optional("uint32[]")
        ));
        assert!(matches!(
            table.view("uint32?$").unwrap(),
            TypeView::Extension("uint32?")
        ));
        assert!(matches!(table.view("uint32[0]").unwrap(), TypeView::SizedArray("uint32", 0)));
    }

    #[test]
    fn adjacent_optional_extension_rejected() {
        let table = empty_table();
        assert!(table.view("uint32?$").is_ok());
        // the extension is under the optional here, which is malformed
        assert!(matches!(
            table.view("uint32$?").unwrap_err().kind(),
            ErrorKind::UnknownType(_)
        ));
    }

    #[test]
    fn builtins_shadow_user_entries() {
        let mut table = empty_table();
        table.insert(
            "name".to_owned(),
            TypeDef::Alias("uint64".to_owned()),
        );
        assert!(matches!(
            table.view("name").unwrap(),
            TypeView::Builtin(Builtin::Name)
        ));
    }

    #[test]
    fn aliases_follow_to_target() {
        let mut table = empty_table();
        table.insert(
            "account_name".to_owned(),
            TypeDef::Alias("name".to_owned()),
        );
        assert!(matches!(
            table.view("account_name").unwrap(),
            TypeView::Builtin(Builtin::Name)
        ));
        assert!(matches!(
            table.view("missing").unwrap_err().kind(),
            ErrorKind::UnknownType(_)
        ));
    }

    #[test]
    fn malformed_sized_array_is_unknown() {
        let table = empty_table();
        assert!(table.view("uint32[x]").is_err());
        assert!(table.view("uint32[").is_err());
        assert!(table.view("[3]").is_err());
    }

    #[test]
    fn flattening_concatenates_base_first() {
        let mut table = empty_table();
        table.insert(
            "base".to_owned(),
            TypeDef::Struct(StructEntry {
                base: None,
                fields: vec![Field {
                    name: "a".to_owned(),
                    type_name: "uint8".to_owned(),
                }],
            }),
        );
        table.insert(
            "derived".to_owned(),
            TypeDef::Struct(StructEntry {
                base: Some("base".to_owned()),
                fields: vec![Field {
                    name: "b".to_owned(),
                    type_name: "uint8".to_owned(),
                }],
            }),
        );
        let fields = table.flattened_fields("derived").unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
