// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Resource categories and descriptors.
//!
//! Every resource a kernel binds lands in exactly one of three categories.  Each category has
//! its own run of offsets, so a descriptor is just a category tag carrying an offset.
//!
//! ```
//! use kernel_bindings::bindings::descriptor::{ResourceCategory, ResourceDescriptor};
//! let descriptor = ResourceDescriptor::new(ResourceCategory::ReadWrite, 3);
//! assert_eq!(descriptor, ResourceDescriptor::ReadWrite(3));
//! assert_eq!(descriptor.category().code(), 1);
//! assert_eq!(descriptor.offset(), 3);
//! ```

use std::fmt::{Display, Formatter};

/// The binding category of a resource.
///
/// The numeric codes are part of the contract with the dispatch layer and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    /// Buffers and textures opened for reading only.
    ReadOnly,
    /// Buffers and textures the kernel may write.
    ReadWrite,
    /// Constant buffers.
    Constant,
}

impl ResourceCategory {
    /// All categories, in code order.
    pub const ALL: [ResourceCategory; 3] = [
        ResourceCategory::ReadOnly,
        ResourceCategory::ReadWrite,
        ResourceCategory::Constant,
    ];

    /// The category code consumed by the dispatch layer.
    pub const fn code(self) -> u8 {
        match self {
            ResourceCategory::ReadOnly => 0,
            ResourceCategory::ReadWrite => 1,
            ResourceCategory::Constant => 2,
        }
    }

    /// Inverse of [ResourceCategory::code].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ResourceCategory::ReadOnly),
            1 => Some(ResourceCategory::ReadWrite),
            2 => Some(ResourceCategory::Constant),
            _ => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self.code() as usize
    }
}

impl Display for ResourceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceCategory::ReadOnly => write!(f, "read-only"),
            ResourceCategory::ReadWrite => write!(f, "read-write"),
            ResourceCategory::Constant => write!(f, "constant"),
        }
    }
}

/// Where a resource is bound: its category, and its zero-based position within that category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDescriptor {
    ReadOnly(u32),
    ReadWrite(u32),
    Constant(u32),
}

impl ResourceDescriptor {
    pub const fn new(category: ResourceCategory, offset: u32) -> Self {
        match category {
            ResourceCategory::ReadOnly => ResourceDescriptor::ReadOnly(offset),
            ResourceCategory::ReadWrite => ResourceDescriptor::ReadWrite(offset),
            ResourceCategory::Constant => ResourceDescriptor::Constant(offset),
        }
    }

    pub const fn category(self) -> ResourceCategory {
        match self {
            ResourceDescriptor::ReadOnly(_) => ResourceCategory::ReadOnly,
            ResourceDescriptor::ReadWrite(_) => ResourceCategory::ReadWrite,
            ResourceDescriptor::Constant(_) => ResourceCategory::Constant,
        }
    }

    pub const fn offset(self) -> u32 {
        match self {
            ResourceDescriptor::ReadOnly(offset)
            | ResourceDescriptor::ReadWrite(offset)
            | ResourceDescriptor::Constant(offset) => offset,
        }
    }

    /// The `(category code, offset)` pair handed to the dispatch layer.
    pub const fn as_pair(self) -> (u8, u32) {
        (self.category().code(), self.offset())
    }
}

impl Display for ResourceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.category(), self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn codes_are_stable() {
        assert_eq!(ResourceCategory::ReadOnly.code(), 0);
        assert_eq!(ResourceCategory::ReadWrite.code(), 1);
        assert_eq!(ResourceCategory::Constant.code(), 2);
        for category in ResourceCategory::ALL {
            assert_eq!(ResourceCategory::from_code(category.code()), Some(category));
        }
        assert_eq!(ResourceCategory::from_code(3), None);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn descriptor_carries_category_and_offset() {
        let d = ResourceDescriptor::new(ResourceCategory::Constant, 7);
        assert_eq!(d, ResourceDescriptor::Constant(7));
        assert_eq!(d.as_pair(), (2, 7));
        assert_eq!(d.to_string(), "constant#7");
    }
}
