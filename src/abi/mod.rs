//! ABI schema documents.
//!
//! An ABI is a JSON document describing the named types a contract
//! speaks: aliases, structs with single inheritance, variants, and (for
//! newer schema revisions) action-result types. This module holds the
//! serde model of the document and the version tag with its feature
//! gates; [`loader`] compiles a document into the immutable
//! [`table::TypeTable`] the conversion engine runs against.

pub mod loader;
pub mod table;

use serde::Deserialize;

use crate::error::{ErrorKind, Result};

/// Highest `eosio::abi/1.x` minor revision this codec accepts.
pub const MAX_SUPPORTED_MINOR: u32 = 3;

const VERSION_PREFIX: &str = "eosio::abi/1.";

/// Parsed and validated ABI version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiVersion {
    minor: u32,
}

impl AbiVersion {
    /// Parses a version tag, accepting `eosio::abi/1.0` through
    /// `eosio::abi/1.3`.
    pub fn parse(tag: &str) -> Result<Self> {
        let unsupported = || ErrorKind::UnsupportedAbiVersion(tag.to_owned()).into_error();
        let minor_txt = tag.strip_prefix(VERSION_PREFIX).ok_or_else(unsupported)?;
        let minor: u32 = minor_txt.parse().map_err(|_| unsupported())?;
        if minor > MAX_SUPPORTED_MINOR {
            return Err(unsupported());
        }
        Ok(Self { minor })
    }

    #[must_use]
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// `action_results` appeared in 1.1.
    #[must_use]
    pub fn supports_action_results(&self) -> bool {
        self.minor >= 1
    }

    /// Trailing `$` extension fields appeared in 1.2.
    #[must_use]
    pub fn supports_extensions(&self) -> bool {
        self.minor >= 2
    }

    /// The bitset JSON `0b` prefix appeared in 1.3.
    #[must_use]
    pub fn bitset_prefix(&self) -> bool {
        self.minor >= 3
    }
}

/// `{new_type_name, type}` alias entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeAlias {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub target: String,
}

/// `{name, type}` struct member.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// `{name, base, fields}` struct entry; `base` is empty or the name of
/// the parent struct.
#[derive(Debug, Clone, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// `{name, types}` variant entry; the JSON tag of each alternative is
/// its type name.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// `{name, type}` action entry (ricardian text is dropped).
#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// `{name, type, ...}` table entry (index descriptions are dropped).
#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// `{name, result_type}` action-result entry (ABI 1.1+).
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResultDef {
    pub name: String,
    pub result_type: String,
}

/// The raw document, as deserialized.
///
/// Members this codec has no use for (`ricardian_clauses`,
/// `error_messages`, `abi_extensions`, …) are ignored by
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbiDefinition {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeAlias>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub variants: Vec<VariantDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub action_results: Vec<ActionResultDef>,
}

impl AbiDefinition {
    /// Parses the document text without compiling it.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ErrorKind::Parse(format!("invalid ABI document: {}", e)).into_error())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_gates() {
        let v0 = AbiVersion::parse("eosio::abi/1.0").unwrap();
        assert!(!v0.supports_action_results());
        assert!(!v0.supports_extensions());
        assert!(!v0.bitset_prefix());

        let v3 = AbiVersion::parse("eosio::abi/1.3").unwrap();
        assert!(v3.supports_action_results());
        assert!(v3.supports_extensions());
        assert!(v3.bitset_prefix());
    }

    #[test]
    fn version_rejections() {
        for tag in ["eosio::abi/1.4", "eosio::abi/2.0", "eosio::abi/1.x", "", "1.1"] {
            let err = AbiVersion::parse(tag).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::UnsupportedAbiVersion(_)), "{}", tag);
        }
    }

    #[test]
    fn document_parses_and_ignores_extras() {
        let doc = AbiDefinition::from_json(
            r#"{
                "version": "eosio::abi/1.1",
                "types": [{"new_type_name": "account_name", "type": "name"}],
                "structs": [{"name": "transfer", "base": "", "fields": [
                    {"name": "from", "type": "account_name"}
                ]}],
                "ricardian_clauses": [],
                "abi_extensions": []
            }"#,
        )
        .unwrap();
        assert_eq!(doc.types.len(), 1);
        assert_eq!(doc.structs[0].fields[0].type_name, "account_name");
        assert!(doc.actions.is_empty());
    }
}
