// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Defines the direction of a mapping.
*/

/// How a region is mapped into host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapType {
    /// The host reads the region.  The device refreshes the view before handing it out.
    Read,
    /// The host writes the region.  The device picks up the view on unmap.
    Write,
}

impl MapType {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            MapType::Read => "read",
            MapType::Write => "write",
        }
    }
}
