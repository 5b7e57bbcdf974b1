/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

extern crate std;

use crate::constants::*;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{
    ErrorKind, ErrorType, Operation, SevenBitAddress,
};
use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

pub struct FakeDelay;

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        // no-op
    }
}

/// One hardware FIFO channel: a transfer starts with a 2 byte length read.
#[derive(Default)]
pub struct FakeFifo {
    pub data: VecDeque<u8>,
    /// Bytes left in the transfer announced by the last length read
    announced: usize,
}

impl FakeFifo {
    fn read(&mut self, buf: &mut [u8], max_transfer: usize) {
        if self.announced == 0 {
            // length prefix
            let len = self.data.len().min(max_transfer).min(u16::MAX as usize);
            self.announced = len;
            let prefix = (len as u16).to_le_bytes();
            for (dst, src) in buf.iter_mut().zip(prefix.iter()) {
                *dst = *src;
            }
            return;
        }
        for dst in buf.iter_mut() {
            if self.announced == 0 {
                *dst = 0;
                continue;
            }
            *dst = self.data.pop_front().unwrap_or(0);
            self.announced -= 1;
        }
    }
}

/// Register level stand-in for the hub on an I2C bus.
pub struct FakeI2cPort {
    pub regs: [u8; 256],
    pub fifos: [FakeFifo; 3],
    /// Queued synchronous status packet bytes, header included
    pub status_packets: VecDeque<u8>,
    /// Every byte written to the command channel
    pub command_bytes: Vec<u8>,
    /// Complete command packets as (command, padded payload)
    pub commands: Vec<(u16, Vec<u8>)>,
    /// Parameter pages served for parameter read commands
    pub params: HashMap<u16, Vec<u8>>,
    pub answer_params: bool,
    /// Largest transfer a FIFO channel announces at once
    pub max_transfer: usize,
    /// Register and length of every read transfer
    pub read_log: Vec<(u8, usize)>,
    pub resets: usize,
    pub fail_reads: bool,
    /// Fail every read transfer after this many have succeeded
    pub fail_after_reads: Option<usize>,
}

impl FakeI2cPort {
    pub fn new() -> Self {
        FakeI2cPort {
            regs: [0; 256],
            fifos: Default::default(),
            status_packets: VecDeque::new(),
            command_bytes: Vec::new(),
            commands: Vec::new(),
            params: HashMap::new(),
            answer_params: true,
            max_transfer: u16::MAX as usize,
            read_log: Vec::new(),
            resets: 0,
            fail_reads: false,
            fail_after_reads: None,
        }
    }

    fn fifo_index(reg: u8) -> Option<usize> {
        match reg {
            REG_CHAN_FIFO_W => Some(0),
            REG_CHAN_FIFO_NW => Some(1),
            REG_CHAN_STATUS => Some(2),
            _ => None,
        }
    }

    /// Make bytes available on a FIFO channel
    pub fn push_fifo(&mut self, reg: u8, bytes: &[u8]) {
        if let Some(idx) = Self::fifo_index(reg) {
            self.fifos[idx].data.extend(bytes.iter().copied());
        }
    }

    /// Queue a synchronous status packet and raise the status interrupt
    pub fn push_status_packet(&mut self, code: u16, body: &[u8]) {
        self.status_packets.extend(code.to_le_bytes());
        self.status_packets.extend((body.len() as u16).to_le_bytes());
        self.status_packets.extend(body.iter().copied());
        self.regs[REG_INT_STATUS as usize] |= IST_MASK_STATUS;
    }

    pub fn fifo_len(&self, reg: u8) -> usize {
        Self::fifo_index(reg).map_or(0, |idx| self.fifos[idx].data.len())
    }

    fn read_reg(&mut self, reg: u8, buf: &mut [u8]) {
        self.read_log.push((reg, buf.len()));
        match reg {
            REG_CHAN_STATUS if !self.status_packets.is_empty() => {
                for dst in buf.iter_mut() {
                    *dst = self.status_packets.pop_front().unwrap_or(0);
                }
                if self.status_packets.is_empty() {
                    self.regs[REG_INT_STATUS as usize] &= !IST_MASK_STATUS;
                }
            }
            REG_CHAN_FIFO_W | REG_CHAN_FIFO_NW | REG_CHAN_STATUS => {
                let max_transfer = self.max_transfer;
                if let Some(idx) = Self::fifo_index(reg) {
                    self.fifos[idx].read(buf, max_transfer);
                }
            }
            _ => {
                for (i, dst) in buf.iter_mut().enumerate() {
                    *dst = self.regs[reg.wrapping_add(i as u8) as usize];
                }
            }
        }
    }

    fn write_reg(&mut self, reg: u8, data: &[u8]) {
        match reg {
            REG_CHAN_CMD => {
                self.command_bytes.extend_from_slice(data);
                self.collect_commands();
            }
            REG_RESET_REQ => {
                if data.first() == Some(&REQUEST_RESET) {
                    self.resets += 1;
                    self.regs[REG_BOOT_STATUS as usize] |= BST_HOST_INTERFACE_READY;
                }
            }
            _ => {
                for (i, src) in data.iter().enumerate() {
                    self.regs[reg.wrapping_add(i as u8) as usize] = *src;
                }
            }
        }
    }

    fn collect_commands(&mut self) {
        loop {
            let consumed: usize = self
                .commands
                .iter()
                .map(|(_, payload)| COMMAND_HEADER_LEN + payload.len())
                .sum();
            let pending = &self.command_bytes[consumed..];
            if pending.len() < COMMAND_HEADER_LEN {
                return;
            }
            let cmd = u16::from_le_bytes([pending[0], pending[1]]);
            let len = u16::from_le_bytes([pending[2], pending[3]]) as usize;
            if pending.len() < COMMAND_HEADER_LEN + len {
                return;
            }
            let payload =
                pending[COMMAND_HEADER_LEN..COMMAND_HEADER_LEN + len].to_vec();
            self.commands.push((cmd, payload));

            if cmd & PARAM_READ_MASK != 0 && self.answer_params {
                let param = cmd & !PARAM_READ_MASK;
                let body = self.params.get(&param).cloned().unwrap_or_default();
                self.push_status_packet(param, &body);
            }
        }
    }
}

impl ErrorType for FakeI2cPort {
    type Error = ErrorKind;
}

impl embedded_hal_async::i2c::I2c<SevenBitAddress> for FakeI2cPort {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut reg: Option<u8> = None;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => match reg {
                    None => {
                        if let Some((first, rest)) = bytes.split_first() {
                            reg = Some(*first);
                            if !rest.is_empty() {
                                self.write_reg(*first, rest);
                            }
                        }
                    }
                    Some(r) => self.write_reg(r, bytes),
                },
                Operation::Read(buf) => {
                    let exhausted = self
                        .fail_after_reads
                        .map_or(false, |limit| self.read_log.len() >= limit);
                    if self.fail_reads || exhausted {
                        return Err(ErrorKind::Other);
                    }
                    let r = reg.unwrap_or(0);
                    self.read_reg(r, buf);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_async::i2c::I2c;
    use futures::executor::block_on;

    #[test]
    fn fifo_serves_prefix_then_data() {
        let mut port = FakeI2cPort::new();
        port.push_fifo(REG_CHAN_FIFO_W, &[1, 2, 3]);

        let mut len = [0u8; 2];
        block_on(port.write_read(0x28, &[REG_CHAN_FIFO_W], &mut len)).expect("len");
        assert_eq!(len, [3, 0]);

        let mut body = [0u8; 3];
        block_on(port.write_read(0x28, &[REG_CHAN_FIFO_W], &mut body)).expect("body");
        assert_eq!(body, [1, 2, 3]);
        assert_eq!(port.fifo_len(REG_CHAN_FIFO_W), 0);
    }

    #[test]
    fn reads_fail_after_limit() {
        let mut port = FakeI2cPort::new();
        port.fail_after_reads = Some(1);
        let mut buf = [0u8; 1];
        block_on(port.write_read(0x28, &[REG_CHIP_ID], &mut buf)).expect("first");
        assert_eq!(
            block_on(port.write_read(0x28, &[REG_CHIP_ID], &mut buf)),
            Err(ErrorKind::Other)
        );
        assert_eq!(port.read_log.len(), 1);
    }

    #[test]
    fn reset_request_sets_boot_ready() {
        let mut port = FakeI2cPort::new();
        block_on(port.write(0x28, &[REG_RESET_REQ, REQUEST_RESET])).expect("write");
        assert_eq!(port.resets, 1);
        assert_eq!(
            port.regs[REG_BOOT_STATUS as usize] & BST_HOST_INTERFACE_READY,
            BST_HOST_INTERFACE_READY
        );
    }
}
