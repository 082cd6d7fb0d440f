// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Packing of a kernel's captured values into its constant payload.

Values are laid out in declaration order.  Each value is aligned to its own alignment, and a value
that would straddle a 16-byte row is pushed to the start of the next row.  Values larger than a row
always start on a row boundary.
*/

use crate::bindings::declaration::ValueLayout;

/// Size of one constant row, in bytes.
pub const ROW_SIZE: usize = 16;

fn align_up(value: usize, alignment: usize) -> usize {
    let alignment = alignment.max(1);
    value.div_ceil(alignment).saturating_mul(alignment)
}

/// Byte offset of each value, followed by the total payload size.
///
/// Sizes saturate at `usize::MAX` rather than overflowing.
pub fn packed_offsets(values: impl IntoIterator<Item = ValueLayout>) -> (Vec<usize>, usize) {
    let mut offsets = Vec::new();
    let mut end = 0;
    for value in values {
        let mut offset = align_up(end, value.alignment.min(ROW_SIZE));
        let fits_in_row = (offset % ROW_SIZE).saturating_add(value.size) <= ROW_SIZE;
        if !fits_in_row {
            offset = align_up(offset, ROW_SIZE);
        }
        offsets.push(offset);
        end = offset.saturating_add(value.size);
    }
    (offsets, end)
}

/// Total size of the packed payload, in bytes.
pub fn packed_size(values: impl IntoIterator<Item = ValueLayout>) -> usize {
    packed_offsets(values).1
}
