// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// modbus-tiny Error
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The transport failed to deliver or accept the requested bytes
    Transport,
    /// Invalid buffer size
    BufferSize,
    /// Invalid trailing byte count
    ByteCount(u8),
    /// Invalid function code
    FnCode(u8),
    /// Invalid CRC
    Crc(u16, u16),
    /// Frame addressed to another station
    SlaveId(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            Transport => write!(f, "Transport failure"),
            BufferSize => write!(f, "Invalid buffer size"),
            ByteCount(cnt) => write!(f, "Invalid byte count: {cnt}"),
            FnCode(fn_code) => write!(f, "Invalid function code: 0x{fn_code:0>2X}"),
            Crc(expected, actual) => write!(
                f,
                "Invalid CRC: expected = 0x{expected:0>4X}, actual = 0x{actual:0>4X}"
            ),
            SlaveId(id) => write!(f, "Frame addressed to slave {id}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
