// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Table driven devices.
//!
//! Instead of hand written `match index { .. }` blocks a device can
//! describe its points as static tables of `(address, handler)` pairs:
//!
//! ```
//! use modbus_tiny::{Address, Coil, Direction, Exception, Map, MappedDevice};
//!
//! #[derive(Default)]
//! struct Board {
//!     led: bool,
//! }
//!
//! fn led(board: &mut Board, _: Address, dir: Direction, value: &mut Coil) -> Result<(), Exception> {
//!     match dir {
//!         Direction::Read => *value = board.led,
//!         Direction::Write => board.led = *value,
//!     }
//!     Ok(())
//! }
//!
//! static MAP: Map<'static, Board> = Map {
//!     coils: &[(0x0000, led)],
//!     ..Map::EMPTY
//! };
//!
//! let device = MappedDevice::new(Board::default(), &MAP);
//! ```

use super::DataModel;
use crate::frame::{Address, Coil, Direction, Exception, Word};

pub type InputFn<D> = fn(&mut D, Address) -> Result<Coil, Exception>;
pub type CoilFn<D> = fn(&mut D, Address, Direction, &mut Coil) -> Result<(), Exception>;
pub type RegisterFn<D> = fn(&mut D, Address) -> Result<Word, Exception>;
pub type HoldingRegisterFn<D> = fn(&mut D, Address, Direction, &mut Word) -> Result<(), Exception>;

/// How to answer indices that have no entry in a [`Map`].
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unmapped {
    /// Zero values, writes are ignored.
    #[default]
    Default,
    /// Reply with [`Exception::IllegalDataAddress`].
    Reject,
}

/// Address to handler tables, one per data kind.
pub struct Map<'m, D> {
    pub discrete_inputs: &'m [(Address, InputFn<D>)],
    pub coils: &'m [(Address, CoilFn<D>)],
    pub input_registers: &'m [(Address, RegisterFn<D>)],
    pub holding_registers: &'m [(Address, HoldingRegisterFn<D>)],
    pub unmapped: Unmapped,
}

impl<D> Map<'_, D> {
    /// A map without any points.
    pub const EMPTY: Self = Self {
        discrete_inputs: &[],
        coils: &[],
        input_registers: &[],
        holding_registers: &[],
        unmapped: Unmapped::Default,
    };
}

fn lookup<F: Copy>(table: &[(Address, F)], index: Address) -> Option<F> {
    table
        .iter()
        .find(|(address, _)| *address == index)
        .map(|(_, handler)| *handler)
}

/// A [`DataModel`] that dispatches every access through a [`Map`].
pub struct MappedDevice<'m, D> {
    device: D,
    map: &'m Map<'m, D>,
}

impl<'m, D> MappedDevice<'m, D> {
    pub const fn new(device: D, map: &'m Map<'m, D>) -> Self {
        Self { device, map }
    }

    pub const fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    fn unmapped<T>(&self, fallback: T) -> Result<T, Exception> {
        match self.map.unmapped {
            Unmapped::Default => Ok(fallback),
            Unmapped::Reject => Err(Exception::IllegalDataAddress),
        }
    }
}

impl<D> DataModel for MappedDevice<'_, D> {
    fn read_discrete_input(&mut self, index: Address) -> Result<Coil, Exception> {
        match lookup(self.map.discrete_inputs, index) {
            Some(handler) => handler(&mut self.device, index),
            None => self.unmapped(false),
        }
    }

    fn access_coil(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Coil,
    ) -> Result<(), Exception> {
        match lookup(self.map.coils, index) {
            Some(handler) => handler(&mut self.device, index, direction, value),
            None => self.unmapped(()),
        }
    }

    fn read_input_register(&mut self, index: Address) -> Result<Word, Exception> {
        match lookup(self.map.input_registers, index) {
            Some(handler) => handler(&mut self.device, index),
            None => self.unmapped(0),
        }
    }

    fn access_holding_register(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Word,
    ) -> Result<(), Exception> {
        match lookup(self.map.holding_registers, index) {
            Some(handler) => handler(&mut self.device, index, direction, value),
            None => self.unmapped(()),
        }
    }
}
