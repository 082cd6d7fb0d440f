// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! kernel_bindings binds the resources of compute kernels and moves data in and out of them.

It covers two jobs:

1. At analysis time, [bindings::allocate] walks the fields a kernel declares, gives every
   resource a descriptor (a category plus an offset within that category), and checks that the
   resulting [bindings::BindingTable] fits the 64-slot root signature.  [bindings::analyze] does
   the same for many kernels at once, so one kernel over budget does not hide the others.
2. At run time, [buffers::Buffer] holds typed elements in device memory.  Constant buffers lay
   their elements out on a 16-byte stride; the buffer translates between that layout and a
   densely packed host array on every transfer.

# Backends

Device memory is reached through [imp::DeviceMemory].  [imp::HostDevice] keeps regions in host
memory and is always available.  The `backend_wgpu` feature adds `imp::WgpuDevice`, which
wraps a [wgpu](https://wgpu.rs) device and queue that you create yourself.

# Categories

| Category   | Code | Declared as                                   | Buffer layout       |
|------------|------|-----------------------------------------------|---------------------|
| Read-only  | 0    | `ReadOnlyBuffer<T>`, `ReadOnlyTexture2D<T>`…  | dense               |
| Read-write | 1    | `ReadWriteBuffer<T>`, `ReadWriteTexture2D<T>`… | dense               |
| Constant   | 2    | `ConstantBuffer<T>`                           | 16-byte stride      |
*/

pub mod bindings;
pub mod buffers;
pub mod imp;
