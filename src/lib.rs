//! ABI-driven bidirectional codec between the Antelope compact binary
//! wire format and JSON.
//!
//! An ABI document names the types a contract speaks; this crate
//! compiles it into an immutable type table and converts arbitrary
//! values between their binary and JSON faces by walking that table at
//! runtime. The [`Context`] façade owns installed ABIs keyed by
//! contract id and exposes the conversion operations; the leaf codec
//! modules ([`name`], [`symbol`], [`base58`], …) are usable directly.

pub mod abi;
pub mod base58;
pub mod context;
pub mod error;
pub mod json;
pub mod name;
pub mod parse;
pub mod target;
pub mod util;

mod bitset;
mod crypto;
mod engine;
mod float;
mod int;
mod prim;
mod symbol;
mod time;
mod varint;

pub use crate::abi::loader::load_abi;
pub use crate::abi::table::TypeTable;
pub use crate::abi::{AbiDefinition, AbiVersion};
pub use crate::context::Context;
pub use crate::engine::{bin_to_json, json_to_bin, MAX_RECURSION_DEPTH};
pub use crate::error::{CodecError, ErrorKind, Result};
pub use crate::json::writer::JsonWriter;
pub use crate::name::{name_to_string, string_to_name};
pub use crate::parse::ByteReader;
pub use crate::util::{bytes_of_hex, hex_of_bytes};
pub use crate::varint::{write_varint32, write_varuint32};
