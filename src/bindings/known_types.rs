// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Resource type names recognized by the analysis layer.
//!
//! Names may be written either as generic instantiations (`ReadOnlyBuffer<float>`) or in
//! metadata form (`ReadOnlyBuffer`1`), and may carry a namespace prefix.

use crate::bindings::declaration::{ResourceKind, TextureDimension};

/// Strips generic arguments, arity suffix, and namespace from a type name.
fn base_name(type_name: &str) -> &str {
    let without_arguments = match type_name.find(['<', '`']) {
        Some(index) => &type_name[..index],
        None => type_name,
    };
    match without_arguments.rfind(['.', ':']) {
        Some(index) => &without_arguments[index + 1..],
        None => without_arguments,
    }
}

fn dimension(suffix: &str) -> Option<TextureDimension> {
    match suffix {
        "1D" => Some(TextureDimension::One),
        "2D" => Some(TextureDimension::Two),
        "3D" => Some(TextureDimension::Three),
        _ => None,
    }
}

/// Classifies a type name, or `None` if it is not a typed resource.
pub fn resource_kind(type_name: &str) -> Option<ResourceKind> {
    let name = base_name(type_name.trim());
    match name {
        "ConstantBuffer" => return Some(ResourceKind::ConstantBuffer),
        "ReadOnlyBuffer" => return Some(ResourceKind::ReadOnlyBuffer),
        "ReadWriteBuffer" => return Some(ResourceKind::ReadWriteBuffer),
        _ => {}
    }
    for prefix in ["ReadOnlyTexture", "IReadOnlyNormalizedTexture", "IReadOnlyTexture"] {
        if let Some(dim) = name.strip_prefix(prefix).and_then(dimension) {
            return Some(ResourceKind::ReadOnlyTexture(dim));
        }
    }
    for prefix in ["ReadWriteTexture", "IReadWriteNormalizedTexture", "IReadWriteTexture"] {
        if let Some(dim) = name.strip_prefix(prefix).and_then(dimension) {
            return Some(ResourceKind::ReadWriteTexture(dim));
        }
    }
    None
}

pub fn is_typed_resource_type(type_name: &str) -> bool {
    resource_kind(type_name).is_some()
}

pub fn is_constant_buffer_type(type_name: &str) -> bool {
    resource_kind(type_name) == Some(ResourceKind::ConstantBuffer)
}

pub fn is_read_only_typed_resource_type(type_name: &str) -> bool {
    matches!(
        resource_kind(type_name),
        Some(ResourceKind::ReadOnlyBuffer | ResourceKind::ReadOnlyTexture(_))
    )
}
