// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

//! Device memory backed by wgpu buffers.
//!
//! wgpu does not let uniform or storage buffers be mapped directly, so every region keeps a
//! host shadow:
//!
//! 1. Mapping for read copies the GPU buffer into a staging buffer, waits for it, and refreshes
//!    the shadow.
//! 2. Mapping for write hands out the shadow, refreshing it first for read-write buffers, which
//!    kernels may have written.
//! 3. Unmapping a write mapping uploads the whole shadow with `Queue::write_buffer`.
//! 4. `copy_bytes` records a buffer-to-buffer copy and mirrors it in the shadows.

use crate::bindings::descriptor::ResourceCategory;
use crate::buffers::buffer_access::MapType;
use crate::imp::{DeviceMemory, DeviceStatus, RawRegion, RegionId};
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use wgpu::{BufferDescriptor, BufferUsages, CommandEncoderDescriptor, Label, PollType};

#[derive(Debug)]
struct WgpuRegion {
    shadow: Box<[u8]>,
    buffer: wgpu::Buffer,
    byte_len: usize,
    category: ResourceCategory,
}

/**
A device wrapping an existing wgpu device and queue.

Creating the device is the caller's business.
*/
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    regions: Mutex<HashMap<u64, WgpuRegion>>,
    next_region: AtomicU64,
}

//wgpu requires copies to be multiples of COPY_BUFFER_ALIGNMENT
fn allocated_size(byte_len: usize) -> u64 {
    (byte_len as u64 + wgpu::COPY_BUFFER_ALIGNMENT - 1) & !(wgpu::COPY_BUFFER_ALIGNMENT - 1)
}

fn is_copy_aligned(value: usize) -> bool {
    value as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            regions: Mutex::new(HashMap::new()),
            next_region: AtomicU64::new(0),
        }
    }

    fn regions(&self) -> MutexGuard<'_, HashMap<u64, WgpuRegion>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies the GPU buffer's contents back to the host.  Called without the region lock held.
    fn read_back(&self, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>, DeviceStatus> {
        let _perf = logwise::perfwarn_begin!("WgpuDevice::read_back");
        let staging = self.device.create_buffer(&BufferDescriptor {
            label: Label::from("kernel_bindings::read_back"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Label::from("kernel_bindings::read_back"),
        });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
        if let Err(e) = self.device.poll(PollType::Wait) {
            logwise::error_sync!(
                "WgpuDevice::read_back poll failed: {err}",
                err = logwise::privacy::LogIt(&e)
            );
            return Err(DeviceStatus::DEVICE_REMOVED);
        }
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                logwise::error_sync!(
                    "WgpuDevice::read_back map failed: {err}",
                    err = logwise::privacy::LogIt(&e)
                );
                return Err(DeviceStatus::GENERIC_FAILURE);
            }
            Err(_) => return Err(DeviceStatus::GENERIC_FAILURE),
        }
        let contents = staging.slice(..).get_mapped_range().to_vec();
        staging.unmap();
        Ok(contents)
    }
}

//safety: shadows are boxed and outlive every mapping; the GPU never touches a shadow
unsafe impl DeviceMemory for WgpuDevice {
    fn allocate(
        &self,
        byte_len: usize,
        category: ResourceCategory,
        debug_name: &str,
    ) -> Result<RegionId, DeviceStatus> {
        let usage = match category {
            ResourceCategory::Constant => BufferUsages::UNIFORM,
            ResourceCategory::ReadOnly | ResourceCategory::ReadWrite => BufferUsages::STORAGE,
        } | BufferUsages::COPY_DST
            | BufferUsages::COPY_SRC;
        let size = allocated_size(byte_len);
        let buffer = self.device.create_buffer(&BufferDescriptor {
            label: Some(debug_name),
            size,
            usage,
            mapped_at_creation: false,
        });
        let id = self.next_region.fetch_add(1, Ordering::Relaxed);
        self.regions().insert(
            id,
            WgpuRegion {
                shadow: vec![0u8; size as usize].into_boxed_slice(),
                buffer,
                byte_len,
                category,
            },
        );
        Ok(RegionId(id))
    }

    fn release(&self, region: RegionId) {
        if let Some(region) = self.regions().remove(&region.0) {
            region.buffer.destroy();
        }
    }

    fn map_region(&self, region: RegionId, map_type: MapType) -> Result<RawRegion, DeviceStatus> {
        let pending = {
            let regions = self.regions();
            let entry = regions
                .get(&region.0)
                .ok_or(DeviceStatus::INVALID_ARGUMENT)?;
            //kernels only write read-write buffers; other shadows are current for writing
            let stale = match map_type {
                MapType::Read => true,
                MapType::Write => entry.category == ResourceCategory::ReadWrite,
            };
            stale.then(|| (entry.buffer.clone(), entry.shadow.len() as u64))
        };
        //the lock is not held while waiting on the GPU
        let contents = match pending {
            Some((buffer, size)) => Some(self.read_back(&buffer, size)?),
            None => None,
        };
        let mut regions = self.regions();
        let region = regions
            .get_mut(&region.0)
            .ok_or(DeviceStatus::INVALID_ARGUMENT)?;
        if let Some(contents) = contents {
            region.shadow.copy_from_slice(&contents);
        }
        Ok(RawRegion {
            address: NonNull::from(&mut region.shadow[..]).cast(),
            len: region.byte_len,
        })
    }

    fn unmap_region(&self, region: RegionId, map_type: MapType) {
        if let MapType::Write = map_type {
            if let Some(region) = self.regions().get(&region.0) {
                self.queue.write_buffer(&region.buffer, 0, &region.shadow);
            }
        }
    }

    fn copy_bytes(
        &self,
        source: RegionId,
        source_offset: usize,
        destination: RegionId,
        destination_offset: usize,
        len: usize,
    ) -> Result<(), DeviceStatus> {
        if !(is_copy_aligned(source_offset)
            && is_copy_aligned(destination_offset)
            && is_copy_aligned(len))
        {
            return Err(DeviceStatus::INVALID_ARGUMENT);
        }
        let mut regions = self.regions();
        let in_bounds = |id: RegionId, offset: usize| {
            regions
                .get(&id.0)
                .is_some_and(|r| offset.checked_add(len).is_some_and(|end| end <= r.byte_len))
        };
        if !(in_bounds(source, source_offset) && in_bounds(destination, destination_offset)) {
            return Err(DeviceStatus::INVALID_ARGUMENT);
        }
        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Label::from("kernel_bindings::copy_bytes"),
        });
        let staged = {
            let (Some(from), Some(to)) = (regions.get(&source.0), regions.get(&destination.0))
            else {
                return Err(DeviceStatus::INVALID_ARGUMENT);
            };
            encoder.copy_buffer_to_buffer(
                &from.buffer,
                source_offset as u64,
                &to.buffer,
                destination_offset as u64,
                len as u64,
            );
            from.shadow[source_offset..source_offset + len].to_vec()
        };
        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(to) = regions.get_mut(&destination.0) {
            to.shadow[destination_offset..destination_offset + len].copy_from_slice(&staged);
        }
        Ok(())
    }
}
