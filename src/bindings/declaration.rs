// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! What a kernel declares.
//!
//! These types are the input handed over by the analysis layer: the kernel's declaring type,
//! its fields in declaration order with their resolved types, and whether the kernel also binds
//! an implicit writable surface.  Nothing here knows about slots or budgets; see
//! [crate::bindings::allocator] for that.

use crate::bindings::constant_payload;
use crate::bindings::descriptor::ResourceCategory;
use crate::bindings::known_types;

/// Dimensionality of a texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    One,
    Two,
    Three,
}

/// A typed resource a kernel can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ConstantBuffer,
    ReadOnlyBuffer,
    ReadWriteBuffer,
    ReadOnlyTexture(TextureDimension),
    ReadWriteTexture(TextureDimension),
}

impl ResourceKind {
    /// The binding category this kind of resource consumes.
    pub const fn category(self) -> ResourceCategory {
        match self {
            ResourceKind::ConstantBuffer => ResourceCategory::Constant,
            ResourceKind::ReadOnlyBuffer | ResourceKind::ReadOnlyTexture(_) => {
                ResourceCategory::ReadOnly
            }
            ResourceKind::ReadWriteBuffer | ResourceKind::ReadWriteTexture(_) => {
                ResourceCategory::ReadWrite
            }
        }
    }
}

/// Size and alignment of a value captured by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueLayout {
    pub size: usize,
    pub alignment: usize,
}

impl ValueLayout {
    pub const fn new(size: usize, alignment: usize) -> Self {
        Self { size, alignment }
    }

    /// A scalar, aligned to its own size.
    pub const fn scalar(size: usize) -> Self {
        Self {
            size,
            alignment: size,
        }
    }

    /// The layout of a host type.
    pub const fn of<T>() -> Self {
        Self {
            size: std::mem::size_of::<T>(),
            alignment: std::mem::align_of::<T>(),
        }
    }
}

/// The resolved type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A typed resource.  These are the only fields that get descriptors.
    Resource(ResourceKind),
    /// Plain data copied into the kernel's constant payload.
    Value(ValueLayout),
    /// Anything else.  Never classified, never contributes constant bytes.
    Other,
}

impl FieldType {
    /// Resolves a type by name.  Known resource type names become [FieldType::Resource],
    /// everything else is [FieldType::Other].
    pub fn from_type_name(type_name: &str) -> Self {
        match known_types::resource_kind(type_name) {
            Some(kind) => FieldType::Resource(kind),
            None => FieldType::Other,
        }
    }
}

/// Modifiers that exclude a field from binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldModifiers {
    pub is_static: bool,
    pub is_const: bool,
    /// Generated by the compiler rather than written by the user.
    pub is_implicitly_declared: bool,
    pub is_fixed_size_buffer: bool,
    /// The field's type itself is static (cannot be instantiated).
    pub is_static_type: bool,
}

impl FieldModifiers {
    pub fn is_instance_field(&self) -> bool {
        !(self.is_static
            || self.is_const
            || self.is_implicitly_declared
            || self.is_fixed_size_buffer
            || self.is_static_type)
    }
}

/// One field declared on a kernel type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredField {
    pub name: String,
    pub field_type: FieldType,
    pub modifiers: FieldModifiers,
    /// Whether the field's type is visible to the code being generated.
    pub accessible: bool,
}

impl DeclaredField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            modifiers: FieldModifiers::default(),
            accessible: true,
        }
    }

    pub fn resource(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self::new(name, FieldType::Resource(kind))
    }

    pub fn value(name: impl Into<String>, layout: ValueLayout) -> Self {
        Self::new(name, FieldType::Value(layout))
    }

    pub fn with_modifiers(mut self, modifiers: FieldModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }

    /// Whether the allocator should consider this field at all.
    pub fn is_bindable(&self) -> bool {
        self.accessible && self.modifiers.is_instance_field()
    }
}

/// A kernel type and everything it declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelDeclaration {
    /// Identity of the declaring type; diagnostics are attributed to it.
    pub type_name: String,
    /// Fields, in declaration order.
    pub fields: Vec<DeclaredField>,
    pub uses_implicit_surface: bool,
    constant_buffer_size_in_bytes: Option<usize>,
}

impl KernelDeclaration {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            uses_implicit_surface: false,
            constant_buffer_size_in_bytes: None,
        }
    }

    pub fn field(mut self, field: DeclaredField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = DeclaredField>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_implicit_surface(mut self) -> Self {
        self.uses_implicit_surface = true;
        self
    }

    /// Overrides the constant payload size instead of deriving it from the value fields.
    pub fn with_constant_buffer_size(mut self, bytes: usize) -> Self {
        self.constant_buffer_size_in_bytes = Some(bytes);
        self
    }

    /// Size of the scalar constant data, in bytes.
    ///
    /// Unless overridden, this is the packed size of the bindable value fields.
    pub fn constant_buffer_size_in_bytes(&self) -> usize {
        match self.constant_buffer_size_in_bytes {
            Some(bytes) => bytes,
            None => constant_payload::packed_size(self.fields.iter().filter_map(|field| {
                match field.field_type {
                    FieldType::Value(layout) if field.is_bindable() => Some(layout),
                    _ => None,
                }
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn kinds_map_to_categories() {
        assert_eq!(
            ResourceKind::ConstantBuffer.category(),
            ResourceCategory::Constant
        );
        assert_eq!(
            ResourceKind::ReadOnlyTexture(TextureDimension::Two).category(),
            ResourceCategory::ReadOnly
        );
        assert_eq!(
            ResourceKind::ReadWriteTexture(TextureDimension::Three).category(),
            ResourceCategory::ReadWrite
        );
        assert_eq!(
            ResourceKind::ReadWriteBuffer.category(),
            ResourceCategory::ReadWrite
        );
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn excluded_fields_are_not_bindable() {
        let plain = DeclaredField::resource("a", ResourceKind::ReadOnlyBuffer);
        assert!(plain.is_bindable());
        assert!(!plain.clone().inaccessible().is_bindable());
        let statics = plain.clone().with_modifiers(FieldModifiers {
            is_static: true,
            ..Default::default()
        });
        assert!(!statics.is_bindable());
        let generated = plain.with_modifiers(FieldModifiers {
            is_implicitly_declared: true,
            ..Default::default()
        });
        assert!(!generated.is_bindable());
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn constant_size_derives_from_value_fields() {
        let kernel = KernelDeclaration::new("Blur")
            .field(DeclaredField::value("width", ValueLayout::of::<i32>()))
            .field(DeclaredField::value("height", ValueLayout::of::<i32>()))
            .field(DeclaredField::resource(
                "source",
                ResourceKind::ReadOnlyBuffer,
            ))
            .field(
                DeclaredField::value("ignored", ValueLayout::of::<f32>()).with_modifiers(
                    FieldModifiers {
                        is_const: true,
                        ..Default::default()
                    },
                ),
            );
        assert_eq!(kernel.constant_buffer_size_in_bytes(), 8);
        assert_eq!(
            kernel.with_constant_buffer_size(100).constant_buffer_size_in_bytes(),
            100
        );
    }
}
