// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capabilities consumed by the framing layer and the protocol engine.
//!
//! The engine never allocates and never spawns work on its own: every
//! capability here is polled synchronously from the single owner of a
//! [`Server`](crate::Server).

use crate::{error::Error, frame::SlaveId};

/// Raw byte-level access to a half-duplex serial line.
pub trait Transport {
    /// Returns `true` if at least one received byte is waiting.
    ///
    /// Must not block.
    fn available(&mut self) -> bool;

    /// Fill `buf` completely.
    ///
    /// Blocks until `buf.len()` bytes have arrived; returns `false` if the
    /// driver gave up before that.
    fn read(&mut self, buf: &mut [u8]) -> bool;

    /// Send all of `buf`, returning `true` only if every byte was accepted.
    fn write(&mut self, buf: &[u8]) -> bool;

    /// Microseconds needed to transmit one character at the current line settings.
    fn char_time_us(&self) -> u16;
}

/// A blocking delay, e.g. a busy loop or a hardware timer.
pub trait Delay {
    /// Pause for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

/// PDU level link consumed by the protocol engine.
///
/// Implemented by [`RtuAdapter`](crate::rtu::RtuAdapter) or any other
/// framing layer (or a test double).
pub trait PduTransport {
    /// Returns `true` if incoming data is waiting.
    fn available(&mut self) -> bool;

    /// Receive one frame addressed to `slave` into `buf`.
    ///
    /// On success `buf[0]` holds the station address, `buf[1]` the function
    /// code and the returned length covers both plus the arguments, without
    /// any framing checksum.
    fn receive(&mut self, slave: SlaveId, buf: &mut [u8]) -> Result<usize, Error>;

    /// Transmit the first `len` bytes of `buf` as a frame from `slave`.
    ///
    /// The framing layer may use `buf[len..]` as scratch space (e.g. for a
    /// trailing checksum), so `buf` must be longer than `len`.
    fn transmit(&mut self, slave: SlaveId, buf: &mut [u8], len: usize) -> Result<(), Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> bool {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> bool {
        (**self).write(buf)
    }

    fn char_time_us(&self) -> u16 {
        (**self).char_time_us()
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us);
    }
}

impl<P: PduTransport + ?Sized> PduTransport for &mut P {
    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn receive(&mut self, slave: SlaveId, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).receive(slave, buf)
    }

    fn transmit(&mut self, slave: SlaveId, buf: &mut [u8], len: usize) -> Result<(), Error> {
        (**self).transmit(slave, buf, len)
    }
}
