/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use embedded_hal_async::spi::{Operation, SpiDevice};

use super::SensorInterface;

const SPI_READ_MASK: u8 = 0x80;

const fn spi_addr_read(reg: u8) -> u8 {
    (reg & 0x7F) | SPI_READ_MASK
}

const fn spi_addr_write(reg: u8) -> u8 {
    reg & 0x7F
}

/// 4-wire SPI register interface.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> SensorInterface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    type SensorError = SPI::Error;

    async fn read_regs(
        &mut self,
        reg: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::SensorError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let addr_buf = [spi_addr_read(reg)];
        let mut ops = [Operation::Write(&addr_buf), Operation::Read(buffer)];
        self.spi.transaction(&mut ops).await
    }

    async fn write_regs(
        &mut self,
        reg: u8,
        data: &[u8],
    ) -> Result<(), Self::SensorError> {
        let addr_buf = [spi_addr_write(reg)];
        let mut ops = [Operation::Write(&addr_buf), Operation::Write(data)];
        self.spi.transaction(&mut ops).await
    }
}
