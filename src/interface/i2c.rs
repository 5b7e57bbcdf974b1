/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use embedded_hal_async::i2c::{I2c, Operation};

use super::SensorInterface;

/// I2C register interface.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new I2C interface with the given bus and 7-bit address.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    /// Releases the underlying I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> SensorInterface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type SensorError = I2C::Error;

    async fn read_regs(
        &mut self,
        reg: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::SensorError> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.i2c.write_read(self.address, &[reg], buffer).await
    }

    async fn write_regs(
        &mut self,
        reg: u8,
        data: &[u8],
    ) -> Result<(), Self::SensorError> {
        let reg_buffer = [reg];
        let mut ops = [Operation::Write(&reg_buffer), Operation::Write(data)];
        self.i2c.transaction(self.address, &mut ops).await
    }
}
