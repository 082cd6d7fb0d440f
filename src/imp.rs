// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The device layer, as seen from the core.

Everything the buffers need from a device goes through [DeviceMemory]: allocate and release a
region, map it into host memory, unmap it, and copy bytes between regions without a host
round-trip.  Failures come back as an opaque [DeviceStatus].

[HostDevice] keeps regions in ordinary host memory and is always available.  With the
`backend_wgpu` feature, `WgpuDevice` backs regions with wgpu buffers.
*/

mod host;
#[cfg(feature = "backend_wgpu")]
mod wgpu;

pub use host::HostDevice;
#[cfg(feature = "backend_wgpu")]
pub use self::wgpu::WgpuDevice;

use crate::bindings::descriptor::ResourceCategory;
use crate::buffers::buffer_access::MapType;
use std::fmt::{Debug, Display, Formatter};
use std::ptr::NonNull;

/// An opaque status code reported by the device.  Negative codes are failures.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceStatus(i32);

impl DeviceStatus {
    pub const OK: DeviceStatus = DeviceStatus(0);
    pub const GENERIC_FAILURE: DeviceStatus = DeviceStatus(0x8000_4005_u32 as i32);
    pub const OUT_OF_MEMORY: DeviceStatus = DeviceStatus(0x8007_000E_u32 as i32);
    pub const INVALID_ARGUMENT: DeviceStatus = DeviceStatus(0x8007_0057_u32 as i32);
    pub const DEVICE_REMOVED: DeviceStatus = DeviceStatus(0x887A_0005_u32 as i32);

    pub const fn from_raw(code: i32) -> Self {
        DeviceStatus(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Converts a raw status code into a result.
    pub const fn check(code: i32) -> Result<(), DeviceStatus> {
        if code < 0 {
            Err(DeviceStatus(code))
        } else {
            Ok(())
        }
    }
}

impl Debug for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceStatus({:#010X})", self.0 as u32)
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "device status {:#010X}", self.0 as u32)
    }
}

impl std::error::Error for DeviceStatus {}

/// Names a region of device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub(crate) u64);

/// A mapped view: base address and length in bytes.
#[derive(Debug, Clone, Copy)]
pub struct RawRegion {
    pub address: NonNull<u8>,
    pub len: usize,
}

/**
Memory primitives supplied by a device.

# Safety

Implementations promise that a [RawRegion] returned by [DeviceMemory::map_region] points to
`len` initialized bytes that stay valid, and are not accessed by the device or any other
mapping, until the matching [DeviceMemory::unmap_region].  The core holds at most one mapping
per region at a time.
*/
pub unsafe trait DeviceMemory: Debug + Send + Sync {
    /// Allocates a zero-filled region of at least `byte_len` bytes.
    fn allocate(
        &self,
        byte_len: usize,
        category: ResourceCategory,
        debug_name: &str,
    ) -> Result<RegionId, DeviceStatus>;

    /// Releases a region.  The region must not be mapped.
    fn release(&self, region: RegionId);

    fn map_region(&self, region: RegionId, map_type: MapType) -> Result<RawRegion, DeviceStatus>;

    fn unmap_region(&self, region: RegionId, map_type: MapType);

    /// Copies `len` bytes between two regions on the device.
    fn copy_bytes(
        &self,
        source: RegionId,
        source_offset: usize,
        destination: RegionId,
        destination_offset: usize,
        len: usize,
    ) -> Result<(), DeviceStatus>;
}
