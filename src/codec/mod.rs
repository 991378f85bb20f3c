// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{error::*, frame::*};
use byteorder::{BigEndian, ByteOrder};

#[cfg(feature = "rtu")]
pub mod rtu;

pub(crate) type Result<T> = core::result::Result<T, Error>;

impl From<ExceptionResponse> for [u8; 2] {
    fn from(ex: ExceptionResponse) -> [u8; 2] {
        [ex.function.value() | 0x80, ex.exception as u8]
    }
}

/// Function code, start address and quantity (or value).
const REQUEST_PDU_LEN: usize = 5;

impl TryFrom<&[u8]> for Request {
    type Error = Error;

    /// Decode a request PDU (function code followed by its arguments).
    ///
    /// The function code is checked first: a code this slave does not serve
    /// is reported as [`Error::FnCode`] regardless of the PDU length.
    fn try_from(bytes: &[u8]) -> Result<Self> {
        let Some(&fn_code) = bytes.first() else {
            return Err(Error::BufferSize);
        };

        use crate::frame::Request::*;
        use FunctionCode as f;

        let request: fn(Address, u16) -> Request = match FunctionCode::new(fn_code) {
            f::ReadCoils => ReadCoils,
            f::ReadDiscreteInputs => ReadDiscreteInputs,
            f::ReadInputRegisters => ReadInputRegisters,
            // Any non-zero value switches the coil on.
            f::WriteSingleCoil => |addr, value| WriteSingleCoil(addr, value > 0),
            _ => return Err(Error::FnCode(fn_code)),
        };

        if bytes.len() < REQUEST_PDU_LEN {
            return Err(Error::BufferSize);
        }
        let addr = BigEndian::read_u16(&bytes[1..3]);
        let value = BigEndian::read_u16(&bytes[3..5]);
        Ok(request(addr, value))
    }
}
