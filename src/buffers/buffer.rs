// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The typed buffer.

use crate::bindings::descriptor::ResourceCategory;
use crate::buffers::buffer_access::MapType;
use crate::buffers::layout::ElementLayout;
use crate::buffers::mapped::{Claim, MappedRegion};
use crate::buffers::{CreateError, TransferError};
use crate::imp::{DeviceMemory, DeviceStatus, RegionId};
use bytemuck::Pod;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/**
`count` elements of `Element` in a device region.

The region is released when the buffer drops.  All transfers take `&self`: exclusivity is
enforced per call by the buffer's mapping flag, so concurrent transfers on one buffer fail with
[TransferError::AlreadyMapped] instead of racing.
*/
pub struct Buffer<Element> {
    device: Arc<dyn DeviceMemory>,
    region: RegionId,
    category: ResourceCategory,
    layout: ElementLayout,
    count: usize,
    mapped: AtomicBool,
    debug_name: String,
    element: PhantomData<fn() -> Element>,
}

impl<Element> Debug for Buffer<Element> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("debug_name", &self.debug_name)
            .field("category", &self.category)
            .field("layout", &self.layout)
            .field("count", &self.count)
            .finish()
    }
}

impl<Element: Pod> Buffer<Element> {
    /// Allocates a zero-filled buffer of `count` elements.
    pub fn new(
        device: Arc<dyn DeviceMemory>,
        category: ResourceCategory,
        count: usize,
        debug_name: &str,
    ) -> Result<Self, CreateError> {
        let element_size = std::mem::size_of::<Element>();
        if element_size == 0 {
            return Err(CreateError::UnsupportedElement);
        }
        if count == 0 {
            return Err(CreateError::Empty);
        }
        let layout = ElementLayout::for_category(category, element_size);
        let byte_len = count
            .checked_mul(layout.padded_element_size())
            .ok_or(CreateError::DeviceAccessFailure(DeviceStatus::OUT_OF_MEMORY))?;
        let region = device.allocate(byte_len, category, debug_name)?;
        logwise::trace_sync!(
            "Buffer::new {name}: {count} x {stride} bytes ({category})",
            name = debug_name.to_string(),
            count = count,
            stride = layout.padded_element_size(),
            category = category.to_string()
        );
        Ok(Buffer {
            device,
            region,
            category,
            layout,
            count,
            mapped: AtomicBool::new(false),
            debug_name: debug_name.to_string(),
            element: PhantomData,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn category(&self) -> ResourceCategory {
        self.category
    }

    pub fn layout(&self) -> ElementLayout {
        self.layout
    }

    /// Device bytes occupied by the buffer, padding included.
    pub fn byte_len(&self) -> usize {
        self.layout.byte_len(self.count)
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Maps the whole region for direct byte access.
    pub fn map(&self, map_type: MapType) -> Result<MappedRegion<'_>, TransferError> {
        MappedRegion::acquire(&*self.device, self.region, map_type, &self.mapped)
    }

    fn check_range(&self, offset: usize, count: usize) -> Result<(), TransferError> {
        match offset.checked_add(count) {
            Some(end) if end <= self.count => Ok(()),
            _ => Err(TransferError::OutOfRange {
                offset,
                count,
                len: self.count,
            }),
        }
    }

    /// Refuses a view shorter than the region the buffer allocated.
    fn check_view(&self, mapped: &MappedRegion<'_>) -> Result<(), TransferError> {
        if mapped.len() < self.byte_len() {
            logwise::error_sync!(
                "Buffer {name}: device mapped {len} of {expected} bytes",
                name = self.debug_name.clone(),
                len = mapped.len(),
                expected = self.byte_len()
            );
            return Err(TransferError::DeviceAccessFailure(
                DeviceStatus::INVALID_ARGUMENT,
            ));
        }
        Ok(())
    }

    /// Reads `destination.len()` elements starting at element `offset`.
    pub fn read(&self, offset: usize, destination: &mut [Element]) -> Result<(), TransferError> {
        self.check_range(offset, destination.len())?;
        if destination.is_empty() {
            return Ok(());
        }
        let mapped = self.map(MapType::Read)?;
        self.check_view(&mapped)?;
        let bytes = mapped.bytes();
        let element_size = self.layout.element_size();
        if self.layout.has_padding() {
            for (i, element) in destination.iter_mut().enumerate() {
                let start = self.layout.byte_offset(offset + i);
                *element = bytemuck::pod_read_unaligned(&bytes[start..start + element_size]);
            }
        } else {
            let start = offset * element_size;
            let host: &mut [u8] = bytemuck::cast_slice_mut(destination);
            let len = host.len();
            host.copy_from_slice(&bytes[start..start + len]);
        }
        logwise::trace_sync!(
            "Buffer::read {name}: {count} elements at {offset}",
            name = self.debug_name.clone(),
            count = destination.len(),
            offset = offset
        );
        Ok(())
    }

    /// Writes `source` starting at element `offset`.  Padding bytes are left as they were.
    pub fn write(&self, offset: usize, source: &[Element]) -> Result<(), TransferError> {
        self.check_range(offset, source.len())?;
        if source.is_empty() {
            return Ok(());
        }
        let mut mapped = self.map(MapType::Write)?;
        self.check_view(&mapped)?;
        let bytes = mapped.bytes_mut();
        let element_size = self.layout.element_size();
        if self.layout.has_padding() {
            for (i, element) in source.iter().enumerate() {
                let start = self.layout.byte_offset(offset + i);
                bytes[start..start + element_size].copy_from_slice(bytemuck::bytes_of(element));
            }
        } else {
            let start = offset * element_size;
            let host: &[u8] = bytemuck::cast_slice(source);
            bytes[start..start + host.len()].copy_from_slice(host);
        }
        logwise::trace_sync!(
            "Buffer::write {name}: {count} elements at {offset}",
            name = self.debug_name.clone(),
            count = source.len(),
            offset = offset
        );
        Ok(())
    }

    /// Reads the whole buffer.
    pub fn read_to_vec(&self) -> Result<Vec<Element>, TransferError> {
        let mut host = vec![Element::zeroed(); self.count];
        self.read(0, &mut host)?;
        Ok(host)
    }

    /// Overwrites the whole buffer.  `source` must hold exactly `count` elements.
    pub fn fill_from(&self, source: &[Element]) -> Result<(), TransferError> {
        if source.len() != self.count {
            return Err(TransferError::LengthMismatch {
                expected: self.count,
                actual: source.len(),
            });
        }
        self.write(0, source)
    }

    /**
    Copies every element of `source` into this buffer.

    Between two constant buffers on the same device, this is a single device-side copy of the
    padded region.  Otherwise the elements take a round trip through host memory.
    Both buffers must hold the same number of elements.
    */
    pub fn copy_from(&self, source: &Buffer<Element>) -> Result<(), TransferError> {
        if source.count != self.count {
            return Err(TransferError::LengthMismatch {
                expected: self.count,
                actual: source.count,
            });
        }
        if std::ptr::eq(self, source) {
            return Ok(());
        }
        let same_device = std::ptr::addr_eq(Arc::as_ptr(&self.device), Arc::as_ptr(&source.device));
        if same_device
            && self.category == ResourceCategory::Constant
            && source.category == ResourceCategory::Constant
        {
            let _destination = Claim::acquire(&self.mapped)?;
            let _source = Claim::acquire(&source.mapped)?;
            self.device
                .copy_bytes(source.region, 0, self.region, 0, self.byte_len())?;
            logwise::trace_sync!(
                "Buffer::copy_from {name}: device copy of {len} bytes",
                name = self.debug_name.clone(),
                len = self.byte_len()
            );
            return Ok(());
        }
        let _perf = logwise::perfwarn_begin!("Buffer::copy_from host round trip");
        let staged = source.read_to_vec()?;
        self.write(0, &staged)
    }
}

impl<Element> Drop for Buffer<Element> {
    fn drop(&mut self) {
        self.device.release(self.region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::HostDevice;
    use bytemuck::Zeroable;

    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Twenty {
        tag: u32,
        values: [f32; 4],
    }

    fn twenty(tag: u32) -> Twenty {
        Twenty {
            tag,
            values: [tag as f32; 4],
        }
    }

    fn host() -> Arc<dyn DeviceMemory> {
        Arc::new(HostDevice::new())
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn strided_read_uses_padded_offsets() {
        let buffer =
            Buffer::<Twenty>::new(host(), ResourceCategory::Constant, 5, "strided").unwrap();
        assert_eq!(buffer.layout().padded_element_size(), 32);
        {
            let mut mapped = buffer.map(MapType::Write).unwrap();
            let bytes = mapped.bytes_mut();
            for (tag, start) in [(10u32, 64usize), (11, 96), (12, 128)] {
                bytes[start..start + 20].copy_from_slice(bytemuck::bytes_of(&twenty(tag)));
                //padding that must not leak into the element
                bytes[start + 20..start + 32].fill(0xAB);
            }
        }
        let mut out = [Twenty::zeroed(); 3];
        buffer.read(2, &mut out).unwrap();
        assert_eq!(out, [twenty(10), twenty(11), twenty(12)]);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn dense_write_is_contiguous() {
        let buffer = Buffer::<u32>::new(host(), ResourceCategory::ReadWrite, 4, "dense").unwrap();
        assert!(!buffer.layout().has_padding());
        buffer.write(1, &[7, 8]).unwrap();
        let mapped = buffer.map(MapType::Read).unwrap();
        assert_eq!(mapped.len(), 16);
        assert_eq!(&mapped.bytes()[4..12], bytemuck::cast_slice::<u32, u8>(&[7, 8]));
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn rejects_unsupported_shapes() {
        assert_eq!(
            Buffer::<()>::new(host(), ResourceCategory::Constant, 1, "unit").unwrap_err(),
            CreateError::UnsupportedElement
        );
        assert_eq!(
            Buffer::<u32>::new(host(), ResourceCategory::Constant, 0, "empty").unwrap_err(),
            CreateError::Empty
        );
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn range_is_checked_first() {
        let buffer = Buffer::<u32>::new(host(), ResourceCategory::Constant, 4, "range").unwrap();
        let err = buffer.write(3, &[1, 2]).unwrap_err();
        assert_eq!(
            err,
            TransferError::OutOfRange {
                offset: 3,
                count: 2,
                len: 4
            }
        );
        assert_eq!(buffer.read_to_vec().unwrap(), vec![0; 4]);
        assert!(matches!(
            buffer.read(usize::MAX, &mut [0u32; 2]),
            Err(TransferError::OutOfRange { .. })
        ));
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn mapped_buffer_refuses_transfers() {
        let buffer = Buffer::<u32>::new(host(), ResourceCategory::ReadOnly, 2, "busy").unwrap();
        let mapped = buffer.map(MapType::Read).unwrap();
        assert_eq!(
            buffer.write(0, &[1]).unwrap_err(),
            TransferError::AlreadyMapped
        );
        drop(mapped);
        buffer.write(0, &[1]).unwrap();
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn drop_releases_region() {
        let device = Arc::new(HostDevice::new());
        let buffer =
            Buffer::<u32>::new(device.clone(), ResourceCategory::Constant, 2, "released").unwrap();
        assert_eq!(device.region_count(), 1);
        drop(buffer);
        assert_eq!(device.region_count(), 0);
    }
}
