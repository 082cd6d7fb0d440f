// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device memory kept on the host.

use crate::bindings::descriptor::ResourceCategory;
use crate::buffers::buffer_access::MapType;
use crate::imp::{DeviceMemory, DeviceStatus, RawRegion, RegionId};
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/**
A device whose regions live in host memory.

Regions are boxed, so their bytes never move while the region exists, even as other regions
are allocated and released.
*/
#[derive(Debug, Default)]
pub struct HostDevice {
    regions: Mutex<HashMap<u64, Box<[u8]>>>,
    next_region: AtomicU64,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn regions(&self) -> MutexGuard<'_, HashMap<u64, Box<[u8]>>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live regions.
    pub fn region_count(&self) -> usize {
        self.regions().len()
    }
}

fn checked_range(
    offset: usize,
    len: usize,
    region_len: usize,
) -> Result<std::ops::Range<usize>, DeviceStatus> {
    match offset.checked_add(len) {
        Some(end) if end <= region_len => Ok(offset..end),
        _ => Err(DeviceStatus::INVALID_ARGUMENT),
    }
}

//safety: region bytes are boxed and only released through `release`, which the core never
//calls while a mapping is live
unsafe impl DeviceMemory for HostDevice {
    fn allocate(
        &self,
        byte_len: usize,
        _category: ResourceCategory,
        debug_name: &str,
    ) -> Result<RegionId, DeviceStatus> {
        let id = self.next_region.fetch_add(1, Ordering::Relaxed);
        logwise::trace_sync!(
            "HostDevice::allocate {name} ({len} bytes)",
            name = debug_name.to_string(),
            len = byte_len
        );
        self.regions()
            .insert(id, vec![0u8; byte_len].into_boxed_slice());
        Ok(RegionId(id))
    }

    fn release(&self, region: RegionId) {
        self.regions().remove(&region.0);
    }

    fn map_region(&self, region: RegionId, _map_type: MapType) -> Result<RawRegion, DeviceStatus> {
        let mut regions = self.regions();
        let bytes = regions
            .get_mut(&region.0)
            .ok_or(DeviceStatus::INVALID_ARGUMENT)?;
        Ok(RawRegion {
            address: NonNull::from(&mut bytes[..]).cast(),
            len: bytes.len(),
        })
    }

    fn unmap_region(&self, _region: RegionId, _map_type: MapType) {
        //host memory is always coherent
    }

    fn copy_bytes(
        &self,
        source: RegionId,
        source_offset: usize,
        destination: RegionId,
        destination_offset: usize,
        len: usize,
    ) -> Result<(), DeviceStatus> {
        let mut regions = self.regions();
        if source == destination {
            let bytes = regions
                .get_mut(&source.0)
                .ok_or(DeviceStatus::INVALID_ARGUMENT)?;
            let from = checked_range(source_offset, len, bytes.len())?;
            checked_range(destination_offset, len, bytes.len())?;
            bytes.copy_within(from, destination_offset);
            return Ok(());
        }
        let staged = {
            let bytes = regions.get(&source.0).ok_or(DeviceStatus::INVALID_ARGUMENT)?;
            bytes[checked_range(source_offset, len, bytes.len())?].to_vec()
        };
        let bytes = regions
            .get_mut(&destination.0)
            .ok_or(DeviceStatus::INVALID_ARGUMENT)?;
        let to = checked_range(destination_offset, len, bytes.len())?;
        bytes[to].copy_from_slice(&staged);
        Ok(())
    }
}
