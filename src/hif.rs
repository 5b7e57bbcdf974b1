/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Host interface: register transfers, channel reads and the command protocol.

use crate::constants::*;
use crate::interface::SensorInterface;
use crate::Error;
#[cfg(feature = "defmt")]
use defmt::println;
use embedded_hal_async::delay::DelayNs;

pub(crate) struct HostInterface<SI> {
    pub(crate) sensor_interface: SI,
    /// Largest single bus transfer
    read_write_len: usize,
}

impl<SI> HostInterface<SI> {
    pub(crate) const fn new(sensor_interface: SI, read_write_len: usize) -> Self {
        Self {
            sensor_interface,
            read_write_len,
        }
    }

    pub(crate) fn read_write_len(&self) -> usize {
        self.read_write_len
    }

    pub(crate) fn free(self) -> SI {
        self.sensor_interface
    }
}

/// Channel registers stream data and must not be address-incremented.
const fn advance_reg(reg: u8, by: usize) -> u8 {
    if reg > REG_LAST_CHANNEL {
        reg.wrapping_add(by as u8)
    } else {
        reg
    }
}

impl<SI, SE> HostInterface<SI>
where
    SI: SensorInterface<SensorError = SE>,
{
    pub(crate) async fn get_regs(
        &mut self,
        reg: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<SE>> {
        let mut reg = reg;
        for chunk in buf.chunks_mut(self.read_write_len.max(1)) {
            self.sensor_interface
                .read_regs(reg, chunk)
                .await
                .map_err(Error::Comm)?;
            reg = advance_reg(reg, chunk.len());
        }
        Ok(())
    }

    pub(crate) async fn set_regs(
        &mut self,
        reg: u8,
        data: &[u8],
    ) -> Result<(), Error<SE>> {
        let mut reg = reg;
        for chunk in data.chunks(self.read_write_len.max(1)) {
            self.sensor_interface
                .write_regs(reg, chunk)
                .await
                .map_err(Error::Comm)?;
            reg = advance_reg(reg, chunk.len());
        }
        Ok(())
    }

    pub(crate) async fn get_reg(&mut self, reg: u8) -> Result<u8, Error<SE>> {
        let mut buf = [0u8; 1];
        self.get_regs(reg, &mut buf).await?;
        Ok(buf[0])
    }

    pub(crate) async fn set_reg(&mut self, reg: u8, val: u8) -> Result<(), Error<SE>> {
        self.set_regs(reg, &[val]).await
    }

    pub(crate) async fn get_interrupt_status(&mut self) -> Result<u8, Error<SE>> {
        self.get_reg(REG_INT_STATUS).await
    }

    /// Read the next part of a streaming FIFO channel into `buf`.
    ///
    /// A new transfer starts with its little-endian length when `remain` is 0.
    /// Returns the bytes read and the bytes left in the hardware transfer.
    pub(crate) async fn get_fifo(
        &mut self,
        reg: u8,
        buf: &mut [u8],
        remain: usize,
    ) -> Result<(usize, usize), Error<SE>> {
        let mut remain = remain;
        if remain == 0 {
            let mut len_buf = [0u8; FIFO_LENGTH_PREFIX_LEN];
            self.get_regs(reg, &mut len_buf).await?;
            remain = u16::from_le_bytes(len_buf) as usize;
        }

        let read_len = buf.len().min(remain);
        if read_len > 0 {
            self.get_regs(reg, &mut buf[..read_len]).await?;
        }
        Ok((read_len, remain - read_len))
    }

    /// Read one synchronous status packet; the body lands in `buf`.
    pub(crate) async fn get_status_fifo(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(u16, usize), Error<SE>> {
        let mut header = [0u8; STATUS_HEADER_LEN];
        self.get_regs(REG_CHAN_STATUS, &mut header).await?;
        let code = u16::from_le_bytes([header[0], header[1]]);
        let len = u16::from_le_bytes([header[2], header[3]]) as usize;

        if len > buf.len() {
            #[cfg(feature = "defmt")]
            println!("status {:x} len {} > {}", code, len, buf.len());
            return Err(Error::Buffer);
        }
        self.get_regs(REG_CHAN_STATUS, &mut buf[..len]).await?;
        Ok((code, len))
    }

    /// Write a command packet, payload zero padded to a 4 byte multiple.
    pub(crate) async fn exec_cmd(
        &mut self,
        cmd: u16,
        payload: &[u8],
    ) -> Result<(), Error<SE>> {
        let pad = (COMMAND_PACKET_ALIGN - payload.len() % COMMAND_PACKET_ALIGN)
            % COMMAND_PACKET_ALIGN;
        let padded_len =
            u16::try_from(payload.len() + pad).map_err(|_| Error::InvalidParam)?;

        let mut header = [0u8; COMMAND_HEADER_LEN];
        header[..2].copy_from_slice(&cmd.to_le_bytes());
        header[2..].copy_from_slice(&padded_len.to_le_bytes());

        self.set_regs(REG_CHAN_CMD, &header).await?;
        if !payload.is_empty() {
            self.set_regs(REG_CHAN_CMD, payload).await?;
        }
        if pad > 0 {
            let zeros = [0u8; COMMAND_PACKET_ALIGN];
            self.set_regs(REG_CHAN_CMD, &zeros[..pad]).await?;
        }
        Ok(())
    }

    /// Poll until the hub raises the status ready interrupt.
    pub(crate) async fn wait_status_ready(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<SE>> {
        for _ in 0..STATUS_READY_MAX_RETRY {
            let int_status = self.get_interrupt_status().await?;
            if int_status & IST_MASK_STATUS != 0 {
                return Ok(());
            }
            delay.delay_us(CMD_FIFO_DELAY_TIMEOUT_US).await;
        }
        #[cfg(feature = "defmt")]
        println!("status ready timeout");
        Err(Error::Timeout)
    }

    /// Read parameter `param` into `buf`, returning the length reported.
    pub(crate) async fn get_parameter(
        &mut self,
        param: u16,
        buf: &mut [u8],
        delay: &mut impl DelayNs,
    ) -> Result<usize, Error<SE>> {
        self.exec_cmd(param | PARAM_READ_MASK, &[]).await?;
        self.wait_status_ready(delay).await?;
        let (code, len) = self.get_status_fifo(buf).await?;
        if code != param {
            #[cfg(feature = "defmt")]
            println!("param {:x} answered {:x}", param, code);
            return Err(Error::UnexpectedStatus(code));
        }
        Ok(len)
    }

    pub(crate) async fn set_parameter(
        &mut self,
        param: u16,
        data: &[u8],
    ) -> Result<(), Error<SE>> {
        self.exec_cmd(param, data).await
    }
}
