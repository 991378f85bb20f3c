// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::frame::{Address, Coil, Direction, Exception, Word};

/// The device side of a Modbus slave.
///
/// Every method is keyed by a zero based item index. Implementations are
/// responsible for range checks and should answer indices they do not have
/// with [`Exception::IllegalDataAddress`].
///
/// All methods have defaults that succeed with zero values and ignore
/// writes, so `impl DataModel for MyDevice {}` is already a protocol
/// conformant (if boring) device.
pub trait DataModel {
    /// Read a single discrete input.
    fn read_discrete_input(&mut self, index: Address) -> Result<Coil, Exception> {
        let _ = index;
        Ok(false)
    }

    /// Read (`Direction::Read`, store into `value`) or write
    /// (`Direction::Write`, take from `value`) a single coil.
    ///
    /// For reads `value` is preset to `false`.
    fn access_coil(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Coil,
    ) -> Result<(), Exception> {
        let _ = (index, direction, value);
        Ok(())
    }

    /// Read a single input register.
    fn read_input_register(&mut self, index: Address) -> Result<Word, Exception> {
        let _ = index;
        Ok(0)
    }

    /// Read or write a single holding register, see [`access_coil`](Self::access_coil).
    ///
    /// For reads `value` is preset to `0`.
    fn access_holding_register(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Word,
    ) -> Result<(), Exception> {
        let _ = (index, direction, value);
        Ok(())
    }
}

/// A device without any behaviour: all zeros, writes are ignored.
impl DataModel for () {}

impl<M: DataModel + ?Sized> DataModel for &mut M {
    fn read_discrete_input(&mut self, index: Address) -> Result<Coil, Exception> {
        (**self).read_discrete_input(index)
    }

    fn access_coil(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Coil,
    ) -> Result<(), Exception> {
        (**self).access_coil(index, direction, value)
    }

    fn read_input_register(&mut self, index: Address) -> Result<Word, Exception> {
        (**self).read_input_register(index)
    }

    fn access_holding_register(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Word,
    ) -> Result<(), Exception> {
        (**self).access_holding_register(index, direction, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Latch {
        coil: Coil,
    }

    impl DataModel for Latch {
        fn access_coil(
            &mut self,
            index: Address,
            direction: Direction,
            value: &mut Coil,
        ) -> Result<(), Exception> {
            if index != 0 {
                return Err(Exception::IllegalDataAddress);
            }
            match direction {
                Direction::Read => *value = self.coil,
                Direction::Write => self.coil = *value,
            }
            Ok(())
        }
    }

    #[test]
    fn defaults_report_zeros() {
        let mut device = ();
        assert_eq!(device.read_discrete_input(7), Ok(false));
        assert_eq!(device.read_input_register(7), Ok(0));

        let mut coil = true;
        assert_eq!(device.access_coil(7, Direction::Write, &mut coil), Ok(()));
        let mut word = 0xABCD;
        assert_eq!(
            device.access_holding_register(7, Direction::Write, &mut word),
            Ok(())
        );
        assert_eq!(word, 0xABCD);
    }

    fn switch_on<M: DataModel>(mut device: M, index: Address) -> Result<(), Exception> {
        let mut on = true;
        device.access_coil(index, Direction::Write, &mut on)
    }

    #[test]
    fn access_through_mutable_reference() {
        let mut latch = Latch { coil: false };
        switch_on(&mut latch, 0).unwrap();
        assert!(latch.coil);
        assert_eq!(
            switch_on(&mut latch, 1),
            Err(Exception::IllegalDataAddress)
        );

        let mut value = false;
        latch.access_coil(0, Direction::Read, &mut value).unwrap();
        assert!(value);
    }
}
