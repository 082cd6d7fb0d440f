// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Typed device buffers and host transfers.

A [Buffer] holds `count` elements of a plain-old-data type in a device region.  Constant
buffers stride their elements on 16 bytes, so a host array and a constant buffer of the same
elements generally differ in layout.  The transfer methods translate between the two.

```
use kernel_bindings::bindings::ResourceCategory;
use kernel_bindings::buffers::Buffer;
use kernel_bindings::imp::HostDevice;
use std::sync::Arc;

let device = Arc::new(HostDevice::new());
// 12-byte elements are padded to 16 in a constant buffer
let buffer = Buffer::<[f32; 3]>::new(device, ResourceCategory::Constant, 4, "positions").unwrap();
buffer.write(1, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
let mut out = [[0.0; 3]; 2];
buffer.read(1, &mut out).unwrap();
assert_eq!(out, [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
```
*/

pub mod buffer;
pub mod buffer_access;
pub mod layout;
pub mod mapped;

pub use buffer::Buffer;
pub use buffer_access::MapType;
pub use layout::{CONSTANT_BUFFER_ALIGNMENT, ElementLayout};
pub use mapped::MappedRegion;

/// Half-precision float, a common element type for constant data.  `[f16; 3]` pads to 16 bytes.
pub use half::f16;

use crate::imp::DeviceStatus;

/// Errors from moving data in or out of a [Buffer].
///
/// After an error, the destination's contents are unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum TransferError {
    #[error("elements {offset}..+{count} are out of range for a buffer of {len} elements")]
    OutOfRange {
        offset: usize,
        count: usize,
        len: usize,
    },
    #[error("device access failed: {0}")]
    DeviceAccessFailure(#[from] DeviceStatus),
    #[error("buffer is already mapped")]
    AlreadyMapped,
    #[error("expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors from creating a [Buffer].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CreateError {
    #[error("zero-sized element types are not supported")]
    UnsupportedElement,
    #[error("buffers must hold at least one element")]
    Empty,
    #[error("device access failed: {0}")]
    DeviceAccessFailure(#[from] DeviceStatus),
}
