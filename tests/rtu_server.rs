// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::VecDeque;

use modbus_tiny::{
    Address, Coil, DataModel, Delay, Direction, Error, Exception, ExceptionResponse, FunctionCode,
    Map, MappedDevice, Reply, Server, Transport, Unmapped, Word,
    rtu::{RtuAdapter, SerialConfig, crc16},
};

/// A serial line: bytes queued by the test are received by the server,
/// every write of the server is recorded as one frame.
#[derive(Default)]
struct Line {
    rx: VecDeque<u8>,
    tx: Vec<Vec<u8>>,
}

impl Line {
    fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }
}

impl Transport for Line {
    fn available(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read(&mut self, buf: &mut [u8]) -> bool {
        let n = buf.len();
        if self.rx.len() < n {
            self.rx.clear();
            return false;
        }
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        true
    }

    fn write(&mut self, buf: &[u8]) -> bool {
        self.tx.push(buf.to_vec());
        true
    }

    fn char_time_us(&self) -> u16 {
        SerialConfig::new(19_200).char_time_us()
    }
}

#[derive(Default)]
struct Clock {
    delays: Vec<u32>,
}

impl Delay for Clock {
    fn delay_us(&mut self, us: u32) {
        self.delays.push(us);
    }
}

struct Io {
    coils: [Coil; 8],
    inputs: Vec<Coil>,
    registers: [Word; 16],
    writes: Vec<(Address, Coil)>,
}

impl Default for Io {
    fn default() -> Self {
        Self {
            coils: [false; 8],
            inputs: vec![false; 256],
            registers: [0; 16],
            writes: Vec::new(),
        }
    }
}

impl DataModel for Io {
    fn read_discrete_input(&mut self, index: Address) -> Result<Coil, Exception> {
        self.inputs
            .get(usize::from(index))
            .copied()
            .ok_or(Exception::IllegalDataAddress)
    }

    fn access_coil(
        &mut self,
        index: Address,
        direction: Direction,
        value: &mut Coil,
    ) -> Result<(), Exception> {
        let coil = self
            .coils
            .get_mut(usize::from(index))
            .ok_or(Exception::IllegalDataAddress)?;
        match direction {
            Direction::Read => *value = *coil,
            Direction::Write => {
                *coil = *value;
                self.writes.push((index, *value));
            }
        }
        Ok(())
    }

    fn read_input_register(&mut self, index: Address) -> Result<Word, Exception> {
        self.registers
            .get(usize::from(index))
            .copied()
            .ok_or(Exception::IllegalDataAddress)
    }
}

type TestServer<M> = Server<RtuAdapter<Line, Clock>, M>;

fn server<M: DataModel>(model: M, slave: u8) -> TestServer<M> {
    Server::new(RtuAdapter::new(Line::default(), Clock::default()), model, slave)
}

fn with_crc(pdu: &[u8]) -> Vec<u8> {
    let crc = crc16(pdu);
    let mut frame = pdu.to_vec();
    frame.extend(crc.to_le_bytes());
    frame
}

fn line<M: DataModel>(server: &mut TestServer<M>) -> &mut Line {
    server.link_mut().transport_mut()
}

#[test]
fn read_coils_of_null_device() {
    let mut srv = server((), 0x11);
    line(&mut srv).push(&[0x11, 0x01, 0x00, 0x00, 0x00, 0x08, 0x3F, 0x5C]);
    assert!(srv.transceive());
    assert_eq!(
        line(&mut srv).tx,
        vec![vec![0x11, 0x01, 0x01, 0x00, 0x55, 0x48]]
    );
}

#[test]
fn read_coils() {
    let io = Io {
        coils: [true, false, true, true, false, false, true, false],
        ..Io::default()
    };
    let mut srv = server(io, 0x11);
    line(&mut srv).push(&with_crc(&[0x11, 0x01, 0x00, 0x01, 0x00, 0x05]));
    assert_eq!(srv.poll(), Ok(Some(Reply::Response(FunctionCode::ReadCoils))));
    assert_eq!(
        line(&mut srv).tx,
        vec![with_crc(&[0x11, 0x01, 0x01, 0b_0000_0110])]
    );
}

#[test]
fn read_discrete_inputs() {
    let mut io = Io::default();
    io.inputs[0xC4] = true;
    io.inputs[0xC6] = true;
    io.inputs[0xD9] = true;
    let mut srv = server(io, 0x11);
    line(&mut srv).push(&[0x11, 0x02, 0x00, 0xC4, 0x00, 0x16, 0xBA, 0xA9]);
    assert!(srv.transceive());
    assert_eq!(
        line(&mut srv).tx,
        vec![with_crc(&[0x11, 0x02, 0x03, 0b_0000_0101, 0x00, 0b_0010_0000])]
    );
}

#[test]
fn read_input_register() {
    let mut io = Io::default();
    io.registers[8] = 10;
    let mut srv = server(io, 0x11);
    line(&mut srv).push(&[0x11, 0x04, 0x00, 0x08, 0x00, 0x01, 0xB2, 0x98]);
    assert!(srv.transceive());
    assert_eq!(
        line(&mut srv).tx,
        vec![vec![0x11, 0x04, 0x02, 0x00, 0x0A, 0xF8, 0xF4]]
    );
}

#[test]
fn write_single_coil_echoes_request() {
    let request = [0x11, 0x05, 0x00, 0x03, 0xFF, 0x00, 0x7E, 0xAA];
    let mut srv = server(Io::default(), 0x11);
    line(&mut srv).push(&request);
    assert!(srv.transceive());
    assert_eq!(line(&mut srv).tx, vec![request.to_vec()]);
    assert_eq!(srv.model().writes, vec![(3, true)]);
    assert!(srv.model().coils[3]);
}

#[test]
fn holding_registers_are_not_supported() {
    let mut srv = server(Io::default(), 0x11);
    line(&mut srv).push(&[0x11, 0x03, 0x00, 0x00, 0x00, 0x01, 0x86, 0x9A]);
    assert_eq!(
        srv.poll(),
        Ok(Some(Reply::Exception(ExceptionResponse {
            function: FunctionCode::ReadHoldingRegisters,
            exception: Exception::IllegalFunction,
        })))
    );
    assert_eq!(line(&mut srv).tx, vec![vec![0x11, 0x83, 0x01, 0x81, 0x35]]);
}

#[test]
fn write_multiple_registers_payload_is_consumed() {
    let mut srv = server(Io::default(), 0x11);
    let write = with_crc(&[
        0x11, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02,
    ]);
    let read = [0x11, 0x01, 0x00, 0x00, 0x00, 0x08, 0x3F, 0x5C];
    line(&mut srv).push(&write);
    line(&mut srv).push(&read);

    assert!(srv.transceive());
    assert!(srv.transceive());
    assert!(!srv.transceive());
    assert_eq!(
        line(&mut srv).tx,
        vec![
            with_crc(&[0x11, 0x90, 0x01]),
            with_crc(&[0x11, 0x01, 0x01, 0x00]),
        ]
    );
}

#[test]
fn exception_from_data_model() {
    let mut srv = server(Io::default(), 0x11);
    line(&mut srv).push(&with_crc(&[0x11, 0x05, 0x00, 0x08, 0xFF, 0x00]));
    assert!(srv.transceive());
    assert_eq!(line(&mut srv).tx, vec![with_crc(&[0x11, 0x85, 0x02])]);
    assert!(srv.model().writes.is_empty());
}

#[test]
fn ignore_frames_for_other_stations() {
    let mut srv = server(Io::default(), 0x12);
    line(&mut srv).push(&[0x11, 0x05, 0x00, 0x03, 0xFF, 0x00, 0x7E, 0xAA]);
    assert_eq!(srv.poll(), Err(Error::SlaveId(0x11)));
    assert!(line(&mut srv).tx.is_empty());
    assert!(srv.model().writes.is_empty());
    let (adapter, _) = srv.into_parts();
    let (_, clock) = adapter.into_inner();
    assert!(clock.delays.is_empty());
}

#[test]
fn drop_frames_with_invalid_crc() {
    let mut srv = server(Io::default(), 0x11);
    line(&mut srv).push(&[0x11, 0x05, 0x00, 0x03, 0xFF, 0x00, 0x7E, 0xAB]);
    assert!(!srv.transceive());
    assert!(line(&mut srv).tx.is_empty());
    assert!(srv.model().writes.is_empty());
}

#[test]
fn drop_truncated_frames() {
    let mut srv = server(Io::default(), 0x11);
    line(&mut srv).push(&[0x11, 0x05, 0x00, 0x03, 0xFF]);
    assert_eq!(srv.poll(), Err(Error::Transport));
    assert!(line(&mut srv).tx.is_empty());
}

#[test]
fn drop_oversized_frames() {
    let mut srv = server(Io::default(), 0x11);
    line(&mut srv).push(&[0x11, 0x0F, 0x00, 0x00, 0x07, 0xD0, 0xFA]);
    assert_eq!(srv.poll(), Err(Error::ByteCount(0xFA)));
    assert!(line(&mut srv).tx.is_empty());
}

#[test]
fn nothing_to_do_without_data() {
    let mut srv = server(Io::default(), 0x11);
    assert_eq!(srv.poll(), Ok(None));
    assert!(!srv.transceive());
}

#[test]
fn wait_for_silence_before_answering() {
    let mut srv = server((), 0x11);
    line(&mut srv).push(&[0x11, 0x01, 0x00, 0x00, 0x00, 0x08, 0x3F, 0x5C]);
    assert!(srv.transceive());
    let (adapter, ()) = srv.into_parts();
    let (_, clock) = adapter.into_inner();
    assert_eq!(clock.delays, vec![2062]);
}

#[test]
fn repeated_requests_get_identical_responses() {
    let io = Io {
        registers: [0xBEEF; 16],
        ..Io::default()
    };
    let mut srv = server(io, 0x11);
    let request = with_crc(&[0x11, 0x04, 0x00, 0x00, 0x00, 0x10]);
    for _ in 0..3 {
        line(&mut srv).push(&request);
        assert!(srv.transceive());
    }
    let tx = &line(&mut srv).tx;
    assert_eq!(tx.len(), 3);
    assert_eq!(tx[0].len(), 3 + 32 + 2);
    assert!(tx.iter().all(|rsp| *rsp == tx[0]));
}

#[derive(Default)]
struct Panel {
    lamp: bool,
}

fn lamp(panel: &mut Panel, _: Address, dir: Direction, value: &mut Coil) -> Result<(), Exception> {
    match dir {
        Direction::Read => *value = panel.lamp,
        Direction::Write => panel.lamp = *value,
    }
    Ok(())
}

fn version(_: &mut Panel, _: Address) -> Result<Word, Exception> {
    Ok(0x0102)
}

static PANEL: Map<'static, Panel> = Map {
    coils: &[(0x0010, lamp)],
    input_registers: &[(0x0000, version)],
    unmapped: Unmapped::Reject,
    ..Map::EMPTY
};

#[test]
fn serve_a_mapped_device() {
    let mut srv = server(MappedDevice::new(Panel::default(), &PANEL), 0x01);
    line(&mut srv).push(&with_crc(&[0x01, 0x05, 0x00, 0x10, 0xFF, 0x00]));
    line(&mut srv).push(&with_crc(&[0x01, 0x04, 0x00, 0x00, 0x00, 0x01]));
    line(&mut srv).push(&with_crc(&[0x01, 0x04, 0x00, 0x00, 0x00, 0x02]));
    while srv.transceive() {}

    assert!(srv.model().device().lamp);
    assert_eq!(
        line(&mut srv).tx,
        vec![
            with_crc(&[0x01, 0x05, 0x00, 0x10, 0xFF, 0x00]),
            with_crc(&[0x01, 0x04, 0x02, 0x01, 0x02]),
            with_crc(&[0x01, 0x84, 0x02]),
        ]
    );
}
