//! Compilation of an ABI document into a [`TypeTable`].
//!
//! The loader reads the document once, installs every named entry, and
//! then eagerly resolves every referenced type so that conversion-time
//! lookups cannot fail on schema-level problems. Loader errors carry
//! the path into the document (`structs[3].fields[1].type`).

use std::collections::HashSet;

use tracing::debug;

use super::table::{Field, StructEntry, TypeDef, TypeTable, TypeView, VariantEntry};
use super::{AbiDefinition, AbiVersion};
use crate::error::{CodecError, ErrorKind, Result};

/// Parses ABI document text and compiles it.
pub fn load_abi(text: &str) -> Result<TypeTable> {
    build_table(&AbiDefinition::from_json(text)?)
}

/// Compiles an already-parsed document.
pub fn build_table(doc: &AbiDefinition) -> Result<TypeTable> {
    let version = AbiVersion::parse(&doc.version)?;
    if !doc.action_results.is_empty() && !version.supports_action_results() {
        return Err(ErrorKind::UnsupportedAbiVersion(format!(
            "'{}' predates action_results",
            doc.version
        ))
        .into_error()
        .with_path("action_results"));
    }

    let mut table = TypeTable::new(version);
    install_entries(&mut table, doc)?;
    resolve_references(&table, doc)?;

    debug!(
        version = version.minor(),
        aliases = doc.types.len(),
        structs = doc.structs.len(),
        variants = doc.variants.len(),
        actions = doc.actions.len(),
        "compiled ABI"
    );
    Ok(table)
}

fn duplicate(path: String, name: &str) -> CodecError {
    ErrorKind::Parse(format!("duplicate definition of '{}'", name))
        .into_error()
        .with_path(path)
}

fn install_entries(table: &mut TypeTable, doc: &AbiDefinition) -> Result<()> {
    for (i, alias) in doc.types.iter().enumerate() {
        if table.contains(&alias.new_type_name) {
            return Err(duplicate(
                format!("types[{}].new_type_name", i),
                &alias.new_type_name,
            ));
        }
        table.insert(
            alias.new_type_name.clone(),
            TypeDef::Alias(alias.target.clone()),
        );
    }

    for (i, def) in doc.structs.iter().enumerate() {
        if table.contains(&def.name) {
            return Err(duplicate(format!("structs[{}].name", i), &def.name));
        }
        let base = if def.base.is_empty() {
            None
        } else {
            Some(def.base.clone())
        };
        let fields = def
            .fields
            .iter()
            .map(|f| Field {
                name: f.name.clone(),
                type_name: f.type_name.clone(),
            })
            .collect();
        table.insert(def.name.clone(), TypeDef::Struct(StructEntry { base, fields }));
    }

    for (i, def) in doc.variants.iter().enumerate() {
        if table.contains(&def.name) {
            return Err(duplicate(format!("variants[{}].name", i), &def.name));
        }
        table.insert(
            def.name.clone(),
            TypeDef::Variant(VariantEntry {
                types: def.types.clone(),
            }),
        );
    }

    for (i, action) in doc.actions.iter().enumerate() {
        if table.type_for_action(&action.name).is_some() {
            return Err(duplicate(format!("actions[{}].name", i), &action.name));
        }
        table.insert_action(action.name.clone(), action.type_name.clone());
    }

    for (i, tab) in doc.tables.iter().enumerate() {
        if table.type_for_table(&tab.name).is_some() {
            return Err(duplicate(format!("tables[{}].name", i), &tab.name));
        }
        table.insert_table(tab.name.clone(), tab.type_name.clone());
    }

    for (i, result) in doc.action_results.iter().enumerate() {
        if table.type_for_action_result(&result.name).is_some() {
            return Err(duplicate(format!("action_results[{}].name", i), &result.name));
        }
        table.insert_action_result(result.name.clone(), result.result_type.clone());
    }

    Ok(())
}

fn resolve_references(table: &TypeTable, doc: &AbiDefinition) -> Result<()> {
    let gates = Gates {
        extensions: table.version().supports_extensions(),
    };

    for (i, alias) in doc.types.iter().enumerate() {
        check_type(table, &alias.target, &gates)
            .map_err(|e| e.with_path(format!("types[{}].type", i)))?;
    }

    for (i, def) in doc.structs.iter().enumerate() {
        if !def.base.is_empty() {
            check_struct_base(table, &def.base)
                .map_err(|e| e.with_path(format!("structs[{}].base", i)))?;
        }
        for (j, field) in def.fields.iter().enumerate() {
            check_type(table, &field.type_name, &gates)
                .map_err(|e| e.with_path(format!("structs[{}].fields[{}].type", i, j)))?;
        }
        check_flattened_layout(table, &def.name)
            .map_err(|e| e.with_path(format!("structs[{}]", i)))?;
    }

    for (i, def) in doc.variants.iter().enumerate() {
        for (j, alt) in def.types.iter().enumerate() {
            check_type(table, alt, &gates)
                .map_err(|e| e.with_path(format!("variants[{}].types[{}]", i, j)))?;
        }
    }

    for (i, action) in doc.actions.iter().enumerate() {
        check_type(table, &action.type_name, &gates)
            .map_err(|e| e.with_path(format!("actions[{}].type", i)))?;
    }

    for (i, tab) in doc.tables.iter().enumerate() {
        check_type(table, &tab.type_name, &gates)
            .map_err(|e| e.with_path(format!("tables[{}].type", i)))?;
    }

    for (i, result) in doc.action_results.iter().enumerate() {
        check_type(table, &result.result_type, &gates)
            .map_err(|e| e.with_path(format!("action_results[{}].result_type", i)))?;
    }

    Ok(())
}

struct Gates {
    extensions: bool,
}

/// Verifies a referenced type name resolves, tracking alias names in
/// flight so cycles surface as *circular_reference* instead of
/// recursing forever.
fn check_type(table: &TypeTable, name: &str, gates: &Gates) -> Result<()> {
    let mut in_flight: HashSet<String> = HashSet::new();
    check_type_inner(table, name, gates, &mut in_flight)
}

fn check_type_inner(
    table: &TypeTable,
    name: &str,
    gates: &Gates,
    in_flight: &mut HashSet<String>,
) -> Result<()> {
    if name.ends_with('$') && !gates.extensions {
        return Err(ErrorKind::UnsupportedAbiVersion(format!(
            "extension type '{}' predates ABI 1.2",
            name
        ))
        .into_error());
    }
    if !in_flight.insert(name.to_owned()) {
        return Err(ErrorKind::CircularReference(name.to_owned()).into_error());
    }
    let result = match table.view(name)? {
        TypeView::Builtin(_) | TypeView::Struct(..) | TypeView::Variant(..) => Ok(()),
        TypeView::Optional(inner)
        | TypeView::Extension(inner)
        | TypeView::Array(inner)
        | TypeView::SizedArray(inner, _) => check_type_inner(table, inner, gates, in_flight),
    };
    in_flight.remove(name);
    result
}

/// A struct base must itself resolve to a struct.
fn check_struct_base(table: &TypeTable, base: &str) -> Result<()> {
    match table.view(base)? {
        TypeView::Struct(..) => Ok(()),
        _ => Err(ErrorKind::UnknownType(format!("base '{}' is not a struct", base)).into_error()),
    }
}

/// Validates the flattened field list: acyclic base chain, unique
/// member names, and extensions only in the trailing run.
fn check_flattened_layout(table: &TypeTable, name: &str) -> Result<()> {
    let fields = table.flattened_fields(name)?;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut extensions_started = false;
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(
                ErrorKind::Parse(format!("duplicate field '{}'", field.name)).into_error()
            );
        }
        if field.is_extension() {
            extensions_started = true;
        } else if extensions_started {
            return Err(ErrorKind::ExtensionGap(field.name.clone()).into_error());
        }
    }
    Ok(())
}
