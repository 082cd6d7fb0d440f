// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Scoped, exclusive access to a buffer's device region.
//!
//! Each buffer carries one exclusivity flag.  Holding a [MappedRegion] holds the flag, so at
//! most one mapping of a buffer exists at a time.  A second attempt is refused with
//! [TransferError::AlreadyMapped] rather than waiting.
//!
//! Release happens in `Drop`, so it runs exactly once on every exit path.  When the device
//! refuses the mapping, the flag is released and nothing is unmapped.

use crate::buffers::TransferError;
use crate::buffers::buffer_access::MapType;
use crate::imp::{DeviceMemory, RawRegion, RegionId};
use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a buffer's exclusivity flag until dropped.
#[derive(Debug)]
pub(crate) struct Claim<'a> {
    flag: &'a AtomicBool,
}

impl<'a> Claim<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, TransferError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| Claim { flag })
            .map_err(|_| TransferError::AlreadyMapped)
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/**
A mapped view of a buffer's device region.

The view covers the whole region, padding included.  Dropping it unmaps the region and
releases the buffer's exclusivity flag, in that order.

Writes through a [MapType::Read] mapping are not guaranteed to reach the device.
*/
#[derive(Debug)]
pub struct MappedRegion<'a> {
    device: &'a dyn DeviceMemory,
    region: RegionId,
    map_type: MapType,
    raw: RawRegion,
    //dropped after `unmap_region` runs
    _claim: Claim<'a>,
}

impl<'a> MappedRegion<'a> {
    pub(crate) fn acquire(
        device: &'a dyn DeviceMemory,
        region: RegionId,
        map_type: MapType,
        flag: &'a AtomicBool,
    ) -> Result<Self, TransferError> {
        let claim = Claim::acquire(flag)?;
        let raw = match device.map_region(region, map_type) {
            Ok(raw) => raw,
            Err(status) => {
                logwise::error_sync!(
                    "MappedRegion: device refused {map_type} mapping: {status}",
                    map_type = map_type.label().to_string(),
                    status = logwise::privacy::LogIt(&status)
                );
                //the claim drops here; no unmap for a mapping that never happened
                return Err(TransferError::DeviceAccessFailure(status));
            }
        };
        logwise::trace_sync!(
            "MappedRegion: mapped {len} bytes for {map_type}",
            len = raw.len,
            map_type = map_type.label().to_string()
        );
        Ok(MappedRegion {
            device,
            region,
            map_type,
            raw,
            _claim: claim,
        })
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn len(&self) -> usize {
        self.raw.len
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    pub fn bytes(&self) -> &[u8] {
        //safety: the device guarantees `len` valid bytes until unmap, and the claim keeps
        //every other mapping of this region out
        unsafe { std::slice::from_raw_parts(self.raw.address.as_ptr(), self.raw.len) }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        //safety: as in `bytes`; `&mut self` makes this the only live view
        unsafe { std::slice::from_raw_parts_mut(self.raw.address.as_ptr(), self.raw.len) }
    }
}

impl Drop for MappedRegion<'_> {
    fn drop(&mut self) {
        self.device.unmap_region(self.region, self.map_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::descriptor::ResourceCategory;
    use crate::imp::HostDevice;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn claim_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = Claim::acquire(&flag).unwrap();
        assert_eq!(
            Claim::acquire(&flag).unwrap_err(),
            TransferError::AlreadyMapped
        );
        drop(first);
        assert!(Claim::acquire(&flag).is_ok());
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn mapping_releases_flag() {
        let device = HostDevice::new();
        let region = device
            .allocate(16, ResourceCategory::Constant, "mapped")
            .unwrap();
        let flag = AtomicBool::new(false);
        {
            let mut mapped =
                MappedRegion::acquire(&device, region, MapType::Write, &flag).unwrap();
            assert_eq!(mapped.len(), 16);
            mapped.bytes_mut()[3] = 7;
            assert!(flag.load(Ordering::Relaxed));
        }
        assert!(!flag.load(Ordering::Relaxed));
        let mapped = MappedRegion::acquire(&device, region, MapType::Read, &flag).unwrap();
        assert_eq!(mapped.bytes()[3], 7);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn failed_mapping_releases_flag() {
        let device = HostDevice::new();
        let region = device
            .allocate(16, ResourceCategory::ReadOnly, "gone")
            .unwrap();
        device.release(region);
        let flag = AtomicBool::new(false);
        let err = MappedRegion::acquire(&device, region, MapType::Read, &flag).unwrap_err();
        assert!(matches!(err, TransferError::DeviceAccessFailure(_)));
        assert!(!flag.load(Ordering::Relaxed));
    }
}
