// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod codec;
mod error;
mod frame;
mod server;
mod transport;

#[cfg(feature = "rtu")]
pub use codec::rtu;
pub use error::*;
pub use frame::*;
pub use server::*;
pub use transport::*;
