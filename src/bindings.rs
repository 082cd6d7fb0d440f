// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines binding types, and the allocation of kernel resources into a binding table. */

pub mod accessor;
pub mod allocator;
pub mod binding_table;
pub mod constant_payload;
pub mod declaration;
pub mod descriptor;
pub mod known_types;

pub use allocator::{AnalysisReport, BudgetExceeded, allocate, analyze};
pub use binding_table::BindingTable;
pub use descriptor::{ResourceCategory, ResourceDescriptor};
