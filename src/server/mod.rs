// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus slave protocol engine.

mod map;
mod model;

pub use self::{map::*, model::*};

use crate::{
    codec::Result,
    error::Error,
    frame::*,
    transport::PduTransport,
};
use byteorder::{BigEndian, ByteOrder};

/// Offset of the function code within a frame.
const FN_CODE_POS: usize = 1;

/// Offset of the first argument (request) or byte count (response).
const PAYLOAD_POS: usize = 2;

/// Outcome of a successfully answered request.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A regular response for the contained function has been sent.
    Response(FunctionCode),
    /// An exception response has been sent.
    Exception(ExceptionResponse),
}

/// A Modbus slave.
///
/// Owns a fixed size frame buffer that is reused for every request, so
/// processing a request never allocates. Call [`transceive`](Self::transceive)
/// (or [`poll`](Self::poll)) from the main loop; each call handles at most
/// one complete request/response cycle.
///
/// The server must be driven by a single owner. It deliberately does not
/// lock anything: wrapping it in a mutex that is held across the blocking
/// receive would break the bus timing.
#[derive(Debug)]
pub struct Server<P, M> {
    link: P,
    model: M,
    slave: SlaveId,
    buf: [u8; MAX_FRAME_LEN],
}

impl<P, M> Server<P, M>
where
    P: PduTransport,
    M: DataModel,
{
    /// Create a server answering requests for `slave`.
    pub const fn new(link: P, model: M, slave: SlaveId) -> Self {
        Self {
            link,
            model,
            slave,
            buf: [0; MAX_FRAME_LEN],
        }
    }

    pub const fn slave(&self) -> SlaveId {
        self.slave
    }

    pub const fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn link_mut(&mut self) -> &mut P {
        &mut self.link
    }

    pub fn into_parts(self) -> (P, M) {
        (self.link, self.model)
    }

    /// Process at most one request.
    ///
    /// Returns `true` if a request was received and answered (either with
    /// a response or an exception). Returns `false` if no data was
    /// available, the frame was dropped (transport failure, bad CRC,
    /// other slave) or the answer could not be sent.
    pub fn transceive(&mut self) -> bool {
        match self.poll() {
            Ok(reply) => reply.is_some(),
            Err(_err) => {
                #[cfg(feature = "log")]
                log::debug!("Request dropped: {_err}");
                false
            }
        }
    }

    /// Process at most one request and report what happened.
    ///
    /// `Ok(None)` means no data was available.
    pub fn poll(&mut self) -> Result<Option<Reply>> {
        if !self.link.available() {
            return Ok(None);
        }
        let len = self.link.receive(self.slave, &mut self.buf)?;
        if len <= FN_CODE_POS || len > self.buf.len() {
            return Err(Error::BufferSize);
        }
        let function = FunctionCode::new(self.buf[FN_CODE_POS]);

        match self.process(len) {
            Ok(rsp_len) => {
                self.link.transmit(self.slave, &mut self.buf, rsp_len)?;
                Ok(Some(Reply::Response(function)))
            }
            Err(exception) => {
                let rsp = ExceptionResponse {
                    function,
                    exception,
                };
                #[cfg(feature = "log")]
                log::debug!("Function {function} failed: {exception}");
                let [fn_code, ex_code]: [u8; 2] = rsp.into();
                self.buf[FN_CODE_POS] = fn_code;
                self.buf[PAYLOAD_POS] = ex_code;
                self.link.transmit(self.slave, &mut self.buf, PAYLOAD_POS + 1)?;
                Ok(Some(Reply::Exception(rsp)))
            }
        }
    }

    /// Execute the request in the buffer and replace it with the response.
    ///
    /// Returns the response length including station address and function code.
    fn process(&mut self, len: usize) -> core::result::Result<usize, Exception> {
        // The request is copied out before the buffer is overwritten.
        // Unserved function codes fail before the arguments are looked at.
        let request = Request::try_from(&self.buf[FN_CODE_POS..len]).map_err(|err| match err {
            Error::FnCode(_) => Exception::IllegalFunction,
            _ => Exception::IllegalDataValue,
        })?;

        let model = &mut self.model;
        let payload = &mut self.buf[PAYLOAD_POS..];

        let payload_len = match request {
            Request::ReadCoils(address, quantity) => {
                read_bits(payload, address, quantity, |index| {
                    let mut coil = false;
                    model.access_coil(index, Direction::Read, &mut coil)?;
                    Ok(coil)
                })?
            }
            Request::ReadDiscreteInputs(address, quantity) => {
                read_bits(payload, address, quantity, |index| {
                    model.read_discrete_input(index)
                })?
            }
            Request::ReadInputRegisters(address, quantity) => {
                read_words(payload, address, quantity, |index| {
                    model.read_input_register(index)
                })?
            }
            Request::WriteSingleCoil(address, mut coil) => {
                model.access_coil(address, Direction::Write, &mut coil)?;
                // The response echoes address and value of the request.
                4
            }
        };
        Ok(PAYLOAD_POS + payload_len)
    }
}

/// Check that `quantity` items starting at `address` are addressable and
/// that at most `max` of them are requested.
fn check_range(
    address: Address,
    quantity: Quantity,
    max: usize,
) -> core::result::Result<(), Exception> {
    if quantity == 0 || usize::from(quantity) > max {
        return Err(Exception::IllegalDataValue);
    }
    if u32::from(address) + u32::from(quantity) > 0x1_0000 {
        return Err(Exception::IllegalDataAddress);
    }
    Ok(())
}

/// Fill `payload` with `[byte count][packed bits]`.
fn read_bits<F>(
    payload: &mut [u8],
    address: Address,
    quantity: Quantity,
    mut read: F,
) -> core::result::Result<usize, Exception>
where
    F: FnMut(Address) -> core::result::Result<Coil, Exception>,
{
    check_range(address, quantity, MAX_READ_COILS)?;
    let byte_count = packed_coils_len(quantity.into());
    let Some((count, bits)) = payload.split_first_mut() else {
        return Err(Exception::IllegalDataValue);
    };
    let Some(bits) = bits.get_mut(..byte_count) else {
        return Err(Exception::IllegalDataValue);
    };
    bits.fill(0);
    for i in 0..quantity {
        let coil = read(address + i)?;
        put_coil(bits, i.into(), coil);
    }
    *count = byte_count as u8;
    Ok(1 + byte_count)
}

/// Fill `payload` with `[byte count][big-endian words]`.
fn read_words<F>(
    payload: &mut [u8],
    address: Address,
    quantity: Quantity,
    mut read: F,
) -> core::result::Result<usize, Exception>
where
    F: FnMut(Address) -> core::result::Result<Word, Exception>,
{
    check_range(address, quantity, MAX_READ_REGISTERS)?;
    let byte_count = usize::from(quantity) * 2;
    let Some((count, words)) = payload.split_first_mut() else {
        return Err(Exception::IllegalDataValue);
    };
    let Some(words) = words.get_mut(..byte_count) else {
        return Err(Exception::IllegalDataValue);
    };
    for (i, chunk) in (0..quantity).zip(words.chunks_exact_mut(2)) {
        let word = read(address + i)?;
        BigEndian::write_u16(chunk, word);
    }
    *count = byte_count as u8;
    Ok(1 + byte_count)
}
