// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU server (slave) framing.
use super::*;
use crate::{
    codec::Result,
    error::Error,
    frame::{FunctionCode, SlaveId},
    transport::{Delay, PduTransport, Transport},
};
use byteorder::{ByteOrder, LittleEndian};

/// RTU framing on top of a byte [`Transport`].
///
/// Reads exactly as many bytes as the request needs, verifies the CRC and
/// the station address and waits for the inter-frame silence before
/// handing the frame over. There is no resynchronisation: a short read,
/// bad checksum or foreign frame fails the current attempt and the next
/// [`receive_pdu`](Self::receive_pdu) starts from scratch.
#[derive(Debug)]
pub struct RtuAdapter<T, D> {
    transport: T,
    delay: D,
}

impl<T, D> RtuAdapter<T, D>
where
    T: Transport,
    D: Delay,
{
    pub const fn new(transport: T, delay: D) -> Self {
        Self { transport, delay }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> (T, D) {
        (self.transport, self.delay)
    }

    pub fn is_data_available(&mut self) -> bool {
        self.transport.available()
    }

    /// Receive a request frame for `slave` into `buf`.
    ///
    /// Returns the number of valid bytes (station address, function code
    /// and arguments) excluding the CRC.
    pub fn receive_pdu(&mut self, slave: SlaveId, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < HEADER_LEN + CRC_LEN {
            return Err(Error::BufferSize);
        }
        self.read(&mut buf[..HEADER_LEN])?;

        let mut len = HEADER_LEN;
        if FunctionCode::new(buf[1]).has_trailing() {
            self.read(&mut buf[HEADER_LEN..=HEADER_LEN])?;
            let byte_count = buf[HEADER_LEN];
            len += 1 + usize::from(byte_count);
            if len + CRC_LEN > buf.len() {
                #[cfg(feature = "log")]
                log::warn!("Dropping oversized frame with {byte_count} payload byte(s)");
                return Err(Error::ByteCount(byte_count));
            }
            self.read(&mut buf[HEADER_LEN + 1..len + CRC_LEN])?;
        } else {
            self.read(&mut buf[HEADER_LEN..HEADER_LEN + CRC_LEN])?;
        }

        let frame = &buf[..len + CRC_LEN];
        if crc16(frame) != 0 {
            let expected = LittleEndian::read_u16(&frame[len..]);
            let actual = crc16(&frame[..len]);
            #[cfg(feature = "log")]
            log::warn!("Dropping frame with invalid CRC: {:X?}", frame);
            return Err(Error::Crc(expected, actual));
        }

        if buf[0] != slave {
            #[cfg(feature = "log")]
            log::debug!("Ignoring frame for slave {}", buf[0]);
            return Err(Error::SlaveId(buf[0]));
        }

        self.delay
            .delay_us(silence_interval_us(self.transport.char_time_us()));
        #[cfg(feature = "log")]
        log::trace!("Received request: {:X?}", &buf[..len]);
        Ok(len)
    }

    /// Append the CRC to the first `len` bytes of `buf` and send the frame.
    ///
    /// `buf` must have room for the two CRC bytes after `len`.
    pub fn transmit_pdu(&mut self, slave: SlaveId, buf: &mut [u8], len: usize) -> Result<()> {
        if len == 0 || buf.len() < len + CRC_LEN {
            return Err(Error::BufferSize);
        }
        buf[0] = slave;
        let crc = crc16(&buf[..len]);
        LittleEndian::write_u16(&mut buf[len..len + CRC_LEN], crc);
        if !self.transport.write(&buf[..len + CRC_LEN]) {
            #[cfg(feature = "log")]
            log::warn!("Failed to transmit {} byte(s)", len + CRC_LEN);
            return Err(Error::Transport);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.transport.read(buf) {
            Ok(())
        } else {
            Err(Error::Transport)
        }
    }
}

impl<T, D> PduTransport for RtuAdapter<T, D>
where
    T: Transport,
    D: Delay,
{
    fn available(&mut self) -> bool {
        self.is_data_available()
    }

    fn receive(&mut self, slave: SlaveId, buf: &mut [u8]) -> Result<usize> {
        self.receive_pdu(slave, buf)
    }

    fn transmit(&mut self, slave: SlaveId, buf: &mut [u8], len: usize) -> Result<()> {
        self.transmit_pdu(slave, buf, len)
    }
}
