//! Public façade owning installed ABIs and scratch state.
//!
//! A [`Context`] maps 64-bit contract ids to compiled type tables and
//! owns the scratch binary buffer that successful [`Context::json_to_bin`]
//! calls overwrite. Every fallible operation reports through `Result`
//! and mirrors the failure into a retrievable last-error string, so
//! both surfacing styles are available; a failed call never touches an
//! installed table, only the scratch state.
//!
//! A context is single-threaded; distinct contexts share nothing and
//! may run in parallel.

use std::collections::HashMap;

use tracing::debug;

use crate::abi::loader;
use crate::abi::table::TypeTable;
use crate::engine;
use crate::error::{ErrorKind, Result};
use crate::json::{self, writer::JsonWriter};
use crate::name;
use crate::util::hex_of_bytes;

#[derive(Debug, Default)]
pub struct Context {
    abis: HashMap<u64, TypeTable>,
    bin: Vec<u8>,
    last_error: String,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors the outcome into the last-error slot and hands the
    /// result back.
    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error.clear(),
            Err(e) => self.last_error = e.to_string(),
        }
        result
    }

    /// Compiles and installs an ABI document under `contract`.
    ///
    /// Replaces any previously installed table for the same contract;
    /// on failure the previous table is left untouched.
    pub fn set_abi(&mut self, contract: u64, abi_json: &str) -> Result<()> {
        let result = loader::load_abi(abi_json).map(|table| {
            debug!(contract = %name::name_to_string(contract), "installed ABI");
            self.abis.insert(contract, table);
        });
        self.record(result)
    }

    fn table(&self, contract: u64) -> Result<&TypeTable> {
        self.abis.get(&contract).ok_or_else(|| {
            ErrorKind::UnknownType(format!(
                "no ABI installed for contract '{}'",
                name::name_to_string(contract)
            ))
            .into_error()
        })
    }

    /// Converts JSON text to binary under the named type, requiring
    /// struct fields in declared order. The result lands in the
    /// scratch buffer (see [`Context::bin_hex`]).
    pub fn json_to_bin(&mut self, contract: u64, type_name: &str, json_text: &str) -> Result<()> {
        self.convert_json(contract, type_name, json_text, false)
    }

    /// Like [`Context::json_to_bin`], but accepts struct object members
    /// in any order and ignores unknown members.
    pub fn json_to_bin_reorderable(
        &mut self,
        contract: u64,
        type_name: &str,
        json_text: &str,
    ) -> Result<()> {
        self.convert_json(contract, type_name, json_text, true)
    }

    fn convert_json(
        &mut self,
        contract: u64,
        type_name: &str,
        json_text: &str,
        reorderable: bool,
    ) -> Result<()> {
        let result = (|| {
            let table = self.table(contract)?;
            let value = json::parse_text(json_text)?;
            let mut out = Vec::new();
            engine::json_to_bin(table, type_name, &value, &mut out, reorderable)?;
            Ok(out)
        })();
        let result = result.map(|out| self.bin = out);
        self.record(result)
    }

    /// Converts binary to compact JSON text under the named type.
    ///
    /// The returned text is copied out; it does not borrow the context.
    pub fn bin_to_json(&mut self, contract: u64, type_name: &str, bytes: &[u8]) -> Result<String> {
        let result = (|| {
            let table = self.table(contract)?;
            let mut writer = JsonWriter::compact();
            engine::bin_to_json(table, type_name, bytes, &mut writer)?;
            Ok(writer.finish())
        })();
        self.record(result)
    }

    /// Type carried by a declared action of the contract.
    pub fn get_type_for_action(&mut self, contract: u64, action: &str) -> Result<String> {
        let result = (|| {
            let table = self.table(contract)?;
            table
                .type_for_action(action)
                .map(str::to_owned)
                .ok_or_else(|| {
                    ErrorKind::UnknownType(format!("no action '{}' in ABI", action)).into_error()
                })
        })();
        self.record(result)
    }

    /// Row type of a declared table of the contract.
    pub fn get_type_for_table(&mut self, contract: u64, table_name: &str) -> Result<String> {
        let result = (|| {
            let table = self.table(contract)?;
            table
                .type_for_table(table_name)
                .map(str::to_owned)
                .ok_or_else(|| {
                    ErrorKind::UnknownType(format!("no table '{}' in ABI", table_name)).into_error()
                })
        })();
        self.record(result)
    }

    /// Result type of a declared action of the contract (ABI 1.1+).
    pub fn get_type_for_action_result(&mut self, contract: u64, action: &str) -> Result<String> {
        let result = (|| {
            let table = self.table(contract)?;
            table
                .type_for_action_result(action)
                .map(str::to_owned)
                .ok_or_else(|| {
                    ErrorKind::UnknownType(format!("no action result '{}' in ABI", action))
                        .into_error()
                })
        })();
        self.record(result)
    }

    /// Permissive text→name mapping (see [`name::string_to_name`]).
    #[must_use]
    pub fn string_to_name(&self, text: &str) -> u64 {
        name::string_to_name(text)
    }

    /// Renders a name word as text; zero renders as the empty string.
    #[must_use]
    pub fn name_to_string(&self, value: u64) -> String {
        name::name_to_string(value)
    }

    /// Uppercase hex of the scratch buffer left by the last successful
    /// [`Context::json_to_bin`].
    #[must_use]
    pub fn bin_hex(&self) -> String {
        hex_of_bytes(&self.bin)
    }

    /// Raw bytes of the scratch buffer.
    #[must_use]
    pub fn bin(&self) -> &[u8] {
        &self.bin
    }

    /// Message of the most recent failure; empty after a success.
    #[must_use]
    pub fn last_error(&self) -> &str {
        &self.last_error
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOKEN_ABI: &str = r#"{
        "version": "eosio::abi/1.1",
        "types": [{"new_type_name": "account_name", "type": "name"}],
        "structs": [{
            "name": "transfer",
            "base": "",
            "fields": [
                {"name": "from", "type": "account_name"},
                {"name": "to", "type": "account_name"},
                {"name": "quantity", "type": "asset"},
                {"name": "memo", "type": "string"}
            ]
        }, {
            "name": "account",
            "base": "",
            "fields": [{"name": "balance", "type": "asset"}]
        }],
        "actions": [{"name": "transfer", "type": "transfer"}],
        "tables": [{"name": "accounts", "type": "account"}],
        "action_results": [{"name": "transfer", "result_type": "bool"}]
    }"#;

    const TOKEN: u64 = 0x5530_EA03_3482_A600; // eosio.token

    // the table row type is never defined
    const BROKEN_TABLE_ABI: &str = r#"{
        "version": "eosio::abi/1.0",
        "tables": [{"name": "accounts", "type": "account"}]
    }"#;

    #[test]
    fn transfer_roundtrip_through_facade() {
        let mut ctx = Context::new();
        ctx.set_abi(TOKEN, TOKEN_ABI).unwrap();

        ctx.json_to_bin(
            TOKEN,
            "transfer",
            r#"{"from":"alice","to":"bob","quantity":"1.0000 EOS","memo":"hi"}"#,
        )
        .unwrap();
        assert!(ctx.last_error().is_empty());
        let hex = ctx.bin_hex();
        assert!(!hex.is_empty());

        let bin = ctx.bin().to_vec();
        let json = ctx.bin_to_json(TOKEN, "transfer", &bin).unwrap();
        assert_eq!(
            json,
            r#"{"from":"alice","to":"bob","quantity":"1.0000 EOS","memo":"hi"}"#
        );
    }

    #[test]
    fn failures_are_mirrored_to_last_error() {
        let mut ctx = Context::new();
        ctx.set_abi(TOKEN, TOKEN_ABI).unwrap();

        let err = ctx
            .json_to_bin(TOKEN, "transfer", r#"{"from":"alice"}"#)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingField(_)));
        assert_eq!(ctx.last_error(), err.to_string());

        // a success clears it again
        ctx.json_to_bin(
            TOKEN,
            "transfer",
            r#"{"from":"a","to":"b","quantity":"0.0000 EOS","memo":""}"#,
        )
        .unwrap();
        assert!(ctx.last_error().is_empty());
    }

    #[test]
    fn missing_contract_reported() {
        let mut ctx = Context::new();
        let err = ctx.bin_to_json(42, "transfer", &[]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownType(_)));
    }

    #[test]
    fn declared_member_lookups() {
        let mut ctx = Context::new();
        ctx.set_abi(TOKEN, TOKEN_ABI).unwrap();
        assert_eq!(ctx.get_type_for_action(TOKEN, "transfer").unwrap(), "transfer");
        assert_eq!(
            ctx.get_type_for_action_result(TOKEN, "transfer").unwrap(),
            "bool"
        );
        assert!(ctx.get_type_for_action(TOKEN, "missing").is_err());
    }

    #[test]
    fn dangling_table_type_caught_at_install() {
        let mut ctx = Context::new();
        let err = ctx.set_abi(TOKEN, BROKEN_TABLE_ABI).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownType(_)));
        assert_eq!(err.path(), Some("tables[0].type"));
    }

    #[test]
    fn name_helpers_are_permissive() {
        let ctx = Context::new();
        assert_eq!(ctx.string_to_name("eosio.token"), TOKEN);
        assert_eq!(ctx.name_to_string(TOKEN), "eosio.token");
        assert_eq!(ctx.name_to_string(0), "");
    }
}
