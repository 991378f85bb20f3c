// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Calculate the number of bytes required for a given number of coils.
#[must_use]
pub const fn packed_coils_len(bitcount: usize) -> usize {
    bitcount.div_ceil(8)
}

/// Set or clear the coil at `idx` of a packed bitfield (LSB first).
///
/// # Panics
///
/// Panics if `idx / 8` is out of bounds of `bytes`.
pub fn put_coil(bytes: &mut [u8], idx: usize, coil: Coil) {
    let mask = 1 << (idx % 8);
    if coil {
        bytes[idx / 8] |= mask;
    } else {
        bytes[idx / 8] &= !mask;
    }
}

/// Get the coil at `idx` of a packed bitfield (LSB first).
#[must_use]
pub fn get_coil(bytes: &[u8], idx: usize) -> Option<Coil> {
    bytes.get(idx / 8).map(|b| (b >> (idx % 8)) & 0b1 > 0)
}
