// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Transfers through real wgpu buffers.  Skipped on machines without an adapter.
#![cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]

use kernel_bindings::bindings::ResourceCategory;
use kernel_bindings::buffers::{Buffer, MapType};
use kernel_bindings::imp::{DeviceMemory, WgpuDevice};
use std::sync::Arc;

fn wgpu_device() -> Option<Arc<dyn DeviceMemory>> {
    let instance = wgpu::Instance::default();
    let adapter = match futures::executor::block_on(
        instance.request_adapter(&wgpu::RequestAdapterOptions::default()),
    ) {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("skipping: no wgpu adapter ({e})");
            return None;
        }
    };
    let descriptor = wgpu::DeviceDescriptor::default();
    let (device, queue) = match futures::executor::block_on(adapter.request_device(&descriptor)) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("skipping: adapter refused a device ({e})");
            return None;
        }
    };
    Some(Arc::new(WgpuDevice::new(device, queue)))
}

fn row(i: u32) -> [f32; 5] {
    let base = i as f32;
    [base, base + 0.5, -base, base * 2.0, 1.0 / (base + 1.0)]
}

#[test]
fn padded_round_trip() {
    let Some(shared) = wgpu_device() else { return };
    let buffer = Buffer::<[f32; 5]>::new(shared, ResourceCategory::Constant, 4, "rows").unwrap();
    assert_eq!(buffer.layout().padded_element_size(), 32);
    let host: Vec<[f32; 5]> = (0..4).map(row).collect();
    buffer.fill_from(&host).unwrap();
    assert_eq!(buffer.read_to_vec().unwrap(), host);

    let mut middle = [[0.0; 5]; 2];
    buffer.read(1, &mut middle).unwrap();
    assert_eq!(middle, [row(1), row(2)]);
}

#[test]
fn padding_survives_the_gpu() {
    let Some(shared) = wgpu_device() else { return };
    let buffer = Buffer::<[f32; 5]>::new(shared, ResourceCategory::Constant, 3, "padding").unwrap();
    {
        let mut mapped = buffer.map(MapType::Write).unwrap();
        mapped.bytes_mut().fill(0xCD);
    }
    buffer.write(0, &[row(1), row(2), row(3)]).unwrap();
    let mapped = buffer.map(MapType::Read).unwrap();
    assert_eq!(mapped.len(), 96);
    for chunk in mapped.bytes().chunks(32) {
        assert!(chunk[20..].iter().all(|b| *b == 0xCD));
    }
}

#[test]
fn constant_to_constant_copy() {
    let Some(shared) = wgpu_device() else { return };
    let source =
        Buffer::<[f32; 5]>::new(shared.clone(), ResourceCategory::Constant, 2, "source").unwrap();
    let destination =
        Buffer::<[f32; 5]>::new(shared, ResourceCategory::Constant, 2, "destination").unwrap();
    {
        let mut mapped = source.map(MapType::Write).unwrap();
        mapped.bytes_mut().fill(0x11);
    }
    source.fill_from(&[row(5), row(6)]).unwrap();
    destination.copy_from(&source).unwrap();

    assert_eq!(destination.read_to_vec().unwrap(), [row(5), row(6)]);
    let source_bytes = source.map(MapType::Read).unwrap().bytes().to_vec();
    let destination_bytes = destination.map(MapType::Read).unwrap().bytes().to_vec();
    assert_eq!(source_bytes, destination_bytes);
}

#[test]
fn read_write_buffers_refresh_before_writing() {
    let Some(shared) = wgpu_device() else { return };
    let buffer = Buffer::<u32>::new(shared, ResourceCategory::ReadWrite, 6, "storage").unwrap();
    buffer.fill_from(&[1, 2, 3, 4, 5, 6]).unwrap();
    buffer.write(2, &[30, 40]).unwrap();
    assert_eq!(buffer.read_to_vec().unwrap(), [1, 2, 30, 40, 5, 6]);
}

#[test]
fn buffers_read_back_concurrently() {
    let Some(shared) = wgpu_device() else { return };
    let buffers: Vec<Buffer<u32>> = (0..4)
        .map(|i| {
            Buffer::new(shared.clone(), ResourceCategory::ReadOnly, 16, &format!("b{i}")).unwrap()
        })
        .collect();
    std::thread::scope(|scope| {
        for (i, buffer) in buffers.iter().enumerate() {
            scope.spawn(move || {
                for round in 0..8u32 {
                    let values: Vec<u32> = (0..16).map(|j| j * round + i as u32).collect();
                    buffer.fill_from(&values).unwrap();
                    assert_eq!(buffer.read_to_vec().unwrap(), values);
                }
            });
        }
    });
}
