// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Field and storage names for generated access code.
//!
//! A field keeps its declared name for diagnostics and binding lookups, but the generated code
//! may need a different identifier: compiler-generated backing fields (`<Name>k__BackingField`)
//! are not valid identifiers, and some names collide with shader keywords.

/// Prefix applied to storage names that cannot use the field name directly.
pub const RESERVED_PREFIX: &str = "__reserved__";

const SHADER_KEYWORDS: &[&str] = &[
    "break", "buffer", "case", "cbuffer", "centroid", "class", "column_major", "const",
    "continue", "default", "discard", "do", "else", "export", "extern", "for", "groupshared",
    "if", "in", "inline", "inout", "interface", "line", "linear", "matrix", "namespace",
    "nointerpolation", "out", "packoffset", "point", "precise", "register", "return",
    "row_major", "sample", "sampler", "shared", "snorm", "static", "struct", "switch",
    "tbuffer", "texture", "triangle", "typedef", "uniform", "unorm", "vector", "volatile",
    "while",
];

/// The names a resource is known by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessorNames {
    /// Stable name, as declared.
    pub field_name: String,
    /// Identifier used by generated access code.
    pub storage_name: String,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Derives the names for a declared field, or `None` when no usable identifier exists.
pub fn field_accessor_names(declared_name: &str) -> Option<AccessorNames> {
    //compiler-generated backing fields look like <Name>k__BackingField or <Name>P
    if let Some(rest) = declared_name.strip_prefix('<') {
        let (inner, _) = rest.split_once('>')?;
        if !is_identifier(inner) {
            return None;
        }
        return Some(AccessorNames {
            field_name: inner.to_string(),
            storage_name: format!("{RESERVED_PREFIX}{inner}"),
        });
    }
    if !is_identifier(declared_name) {
        return None;
    }
    let storage_name = if SHADER_KEYWORDS.contains(&declared_name) {
        format!("{RESERVED_PREFIX}{declared_name}")
    } else {
        declared_name.to_string()
    };
    Some(AccessorNames {
        field_name: declared_name.to_string(),
        storage_name,
    })
}
