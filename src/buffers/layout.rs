// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Per-element device layout.

use crate::bindings::descriptor::ResourceCategory;

/// Constant buffer elements are laid out on this stride.
pub const CONSTANT_BUFFER_ALIGNMENT: usize = 16;

/**
How one element sits in device memory.

The layout is computed once when a buffer is created.  Transfers only branch on
[ElementLayout::has_padding].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementLayout {
    element_size: usize,
    padded_element_size: usize,
    has_padding: bool,
}

impl ElementLayout {
    /// Constant buffer layout: the stride is `element_size` rounded up to 16.
    pub const fn padded(element_size: usize) -> Self {
        let padded_element_size =
            (element_size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1);
        Self {
            element_size,
            padded_element_size,
            has_padding: padded_element_size != element_size,
        }
    }

    /// Dense layout: the stride is the element size.
    pub const fn dense(element_size: usize) -> Self {
        Self {
            element_size,
            padded_element_size: element_size,
            has_padding: false,
        }
    }

    pub const fn for_category(category: ResourceCategory, element_size: usize) -> Self {
        match category {
            ResourceCategory::Constant => Self::padded(element_size),
            ResourceCategory::ReadOnly | ResourceCategory::ReadWrite => Self::dense(element_size),
        }
    }

    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Device stride between consecutive elements.
    pub const fn padded_element_size(&self) -> usize {
        self.padded_element_size
    }

    pub const fn has_padding(&self) -> bool {
        self.has_padding
    }

    /// Device byte offset of element `index`.
    pub const fn byte_offset(&self, index: usize) -> usize {
        index * self.padded_element_size
    }

    /// Device bytes occupied by `count` elements.
    pub const fn byte_len(&self, count: usize) -> usize {
        count * self.padded_element_size
    }
}
