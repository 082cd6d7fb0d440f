// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Resource descriptor allocation.
//!
//! Allocation walks a kernel's declared fields, classifies each bindable resource into a
//! [ResourceCategory], and hands out offsets from one counter per category in declaration order.
//! The implicit writable surface, when the kernel uses one, is allocated before any field and
//! therefore always holds read-write offset 0.
//!
//! The resulting table must fit the root signature, which holds [MAX_ROOT_SIGNATURE_SLOTS]
//! 4-byte slots.  Constant data costs one slot per 4 bytes (rounded up) and every descriptor
//! costs one slot for its descriptor table, whatever its category.  A layout over budget is an
//! analysis-time failure: no table is returned for it.
//!
//! ```
//! use kernel_bindings::bindings::allocator::allocate;
//! use kernel_bindings::bindings::declaration::{DeclaredField, KernelDeclaration, ResourceKind};
//! use kernel_bindings::bindings::descriptor::ResourceDescriptor;
//!
//! let kernel = KernelDeclaration::new("Invert")
//!     .with_implicit_surface()
//!     .field(DeclaredField::resource("source", ResourceKind::ReadOnlyBuffer))
//!     .field(DeclaredField::resource("target", ResourceKind::ReadWriteBuffer))
//!     .with_constant_buffer_size(8);
//! let table = allocate(&kernel).expect("fits");
//! assert_eq!(table.implicit_surface(), Some(ResourceDescriptor::ReadWrite(0)));
//! assert_eq!(table.descriptor_for("target"), Some(ResourceDescriptor::ReadWrite(1)));
//! assert_eq!(table.total_cost_in_slots(), 2 + 3);
//! ```

use crate::bindings::accessor;
use crate::bindings::binding_table::{BindingEntry, BindingTable, BoundResource, ResourceInfo};
use crate::bindings::declaration::{FieldType, KernelDeclaration};
use crate::bindings::descriptor::{ResourceCategory, ResourceDescriptor};

/// Size of the root signature, in slots.
pub const MAX_ROOT_SIGNATURE_SLOTS: usize = 64;

/// Size of one slot, in bytes.
pub const BYTES_PER_SLOT: usize = 4;

/// A kernel's binding layout does not fit the root signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error(
    "kernel {kernel} needs {total_cost_in_slots} binding slots but the root signature holds {limit}"
)]
pub struct BudgetExceeded {
    /// The declaring type the failure is attributed to.
    pub kernel: String,
    pub total_cost_in_slots: usize,
    pub limit: usize,
}

/// Slots consumed by `bytes` of constant data.
pub const fn constant_slots(bytes: usize) -> usize {
    bytes.div_ceil(BYTES_PER_SLOT)
}

pub const fn total_cost_in_slots(
    constant_buffer_size_in_bytes: usize,
    descriptors: usize,
) -> usize {
    constant_slots(constant_buffer_size_in_bytes).saturating_add(descriptors)
}

/// Per-category running offsets for a single allocation.
#[derive(Debug, Default)]
struct Counters([u32; 3]);

impl Counters {
    fn next(&mut self, category: ResourceCategory) -> ResourceDescriptor {
        let counter = &mut self.0[category.index()];
        let descriptor = ResourceDescriptor::new(category, *counter);
        *counter += 1;
        descriptor
    }
}

/// Allocates descriptors for every bindable resource of `kernel`.
pub fn allocate(kernel: &KernelDeclaration) -> Result<BindingTable, BudgetExceeded> {
    logwise::trace_sync!("allocate {kernel}", kernel = kernel.type_name.clone());
    let mut counters = Counters::default();
    let mut entries = Vec::new();

    if kernel.uses_implicit_surface {
        entries.push(BindingEntry {
            resource: BoundResource::ImplicitSurface,
            descriptor: counters.next(ResourceCategory::ReadWrite),
        });
    }

    for field in &kernel.fields {
        if !field.is_bindable() {
            continue;
        }
        let FieldType::Resource(kind) = field.field_type else {
            continue;
        };
        let Some(names) = accessor::field_accessor_names(&field.name) else {
            logwise::trace_sync!(
                "skipping field {field} with no usable accessor name",
                field = field.name.clone()
            );
            continue;
        };
        let descriptor = counters.next(kind.category());
        logwise::trace_sync!(
            "field {field} -> {descriptor}",
            field = names.field_name.clone(),
            descriptor = logwise::privacy::LogIt(descriptor)
        );
        entries.push(BindingEntry {
            resource: BoundResource::Field(ResourceInfo {
                field_name: names.field_name,
                storage_name: names.storage_name,
            }),
            descriptor,
        });
    }

    let total = total_cost_in_slots(kernel.constant_buffer_size_in_bytes(), entries.len());
    if total > MAX_ROOT_SIGNATURE_SLOTS {
        logwise::warn_sync!(
            "kernel {kernel} exceeds the root signature: {total} of {limit} slots",
            kernel = kernel.type_name.clone(),
            total = total,
            limit = MAX_ROOT_SIGNATURE_SLOTS
        );
        return Err(BudgetExceeded {
            kernel: kernel.type_name.clone(),
            total_cost_in_slots: total,
            limit: MAX_ROOT_SIGNATURE_SLOTS,
        });
    }
    Ok(BindingTable::new(entries, total))
}

/// The outcome of allocating one kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelOutcome {
    pub kernel: String,
    pub result: Result<BindingTable, BudgetExceeded>,
}

/// Outcomes for a batch of kernels, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisReport {
    outcomes: Vec<KernelOutcome>,
}

impl AnalysisReport {
    pub fn outcomes(&self) -> &[KernelOutcome] {
        &self.outcomes
    }

    /// Tables of the kernels that fit.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &BindingTable)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .ok()
                .map(|table| (outcome.kernel.as_str(), table))
        })
    }

    /// Diagnostics of the kernels that did not.
    pub fn diagnostics(&self) -> impl Iterator<Item = &BudgetExceeded> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn table_for(&self, kernel: &str) -> Option<&BindingTable> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.kernel == kernel)
            .and_then(|outcome| outcome.result.as_ref().ok())
    }
}

/// Allocates every kernel independently.  A kernel over budget is reported and does not stop
/// the others.
pub fn analyze<'a>(kernels: impl IntoIterator<Item = &'a KernelDeclaration>) -> AnalysisReport {
    let outcomes: Vec<KernelOutcome> = kernels
        .into_iter()
        .map(|kernel| KernelOutcome {
            kernel: kernel.type_name.clone(),
            result: allocate(kernel),
        })
        .collect();
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    logwise::info_sync!(
        "analyzed {count} kernels, {failed} over budget",
        count = outcomes.len(),
        failed = failed
    );
    AnalysisReport { outcomes }
}
