// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU

pub mod server;

pub use self::server::RtuAdapter;
pub use crate::frame::MAX_FRAME_LEN;

/// Size of the trailing CRC.
pub const CRC_LEN: usize = 2;

/// Station address, function code and the two 16 bit arguments.
pub const HEADER_LEN: usize = 6;

/// Calculate the CRC (Cyclic Redundancy Check) sum.
///
/// The checksum is transmitted low byte first. Running the calculation over
/// a frame including its own trailing checksum yields `0`.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            // if we followed clippy's suggestion to move out the crc >>= 1, the condition may not be met any more
            // the recommended action therefore makes no sense and it is better to allow this lint
            #[allow(clippy::branches_sharing_code)]
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Inter-frame silence for a given character time.
///
/// The bus needs 3.5 character times of silence; 3.6 leaves some margin.
#[must_use]
pub const fn silence_interval_us(char_time_us: u16) -> u32 {
    char_time_us as u32 * 36 / 10
}

/// Parity bit setting of a serial line.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    None,
    #[default]
    Even,
    Odd,
}

/// Serial line parameters.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl SerialConfig {
    /// The Modbus default character format (8E1) at `baud_rate`.
    #[must_use]
    pub const fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: 8,
            parity: Parity::Even,
            stop_bits: 1,
        }
    }

    /// Bits per character including start, parity and stop bits.
    #[must_use]
    pub const fn char_bits(&self) -> u32 {
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        1 + self.data_bits as u32 + parity + self.stop_bits as u32
    }

    /// Microseconds to transmit one character, rounded up.
    ///
    /// Saturates at [`u16::MAX`] for very slow (or zero) baud rates.
    #[must_use]
    pub const fn char_time_us(&self) -> u16 {
        if self.baud_rate == 0 {
            return u16::MAX;
        }
        let bits = self.char_bits() as u64 * 1_000_000;
        let us = bits.div_ceil(self.baud_rate as u64);
        if us > u16::MAX as u64 {
            u16::MAX
        } else {
            us as u16
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(19_200)
    }
}
