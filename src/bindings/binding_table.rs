// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The binding table produced by allocation.
//!
//! A [BindingTable] is the only artifact the dispatch layer needs to wire resources to hardware
//! slots.  Tables can only be obtained from a successful allocation, so holding one implies the
//! layout fits the slot budget.

use crate::bindings::descriptor::{ResourceCategory, ResourceDescriptor};

/// Identifies one declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceInfo {
    /// The field's stable name.
    pub field_name: String,
    /// Identifier used by generated access code.
    pub storage_name: String,
}

/// What a binding entry binds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoundResource {
    /// The implicit writable surface.  It has no declared field.
    ImplicitSurface,
    Field(ResourceInfo),
}

impl BoundResource {
    pub fn info(&self) -> Option<&ResourceInfo> {
        match self {
            BoundResource::ImplicitSurface => None,
            BoundResource::Field(info) => Some(info),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingEntry {
    pub resource: BoundResource,
    pub descriptor: ResourceDescriptor,
}

/// Ordered binding entries plus their slot cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingTable {
    entries: Vec<BindingEntry>,
    total_cost_in_slots: usize,
}

impl BindingTable {
    pub(crate) fn new(entries: Vec<BindingEntry>, total_cost_in_slots: usize) -> Self {
        Self {
            entries,
            total_cost_in_slots,
        }
    }

    /// Entries in allocation order: the implicit surface first, if any, then declared fields.
    pub fn entries(&self) -> &[BindingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Constant slots plus one slot per entry.
    pub fn total_cost_in_slots(&self) -> usize {
        self.total_cost_in_slots
    }

    /// Declared resources, without the implicit surface.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceInfo> {
        self.entries.iter().filter_map(|entry| entry.resource.info())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = ResourceDescriptor> + '_ {
        self.entries.iter().map(|entry| entry.descriptor)
    }

    /// The descriptor bound to a declared field.
    pub fn descriptor_for(&self, field_name: &str) -> Option<ResourceDescriptor> {
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .resource
                    .info()
                    .is_some_and(|info| info.field_name == field_name)
            })
            .map(|entry| entry.descriptor)
    }

    pub fn implicit_surface(&self) -> Option<ResourceDescriptor> {
        self.entries
            .iter()
            .find(|entry| entry.resource == BoundResource::ImplicitSurface)
            .map(|entry| entry.descriptor)
    }

    /// Number of entries in a category.
    pub fn count(&self, category: ResourceCategory) -> usize {
        self.descriptors()
            .filter(|descriptor| descriptor.category() == category)
            .count()
    }
}
