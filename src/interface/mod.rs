/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register transport between the host and the hub.

pub mod i2c;
pub mod spi;

#[cfg(test)]
pub(crate) mod mock_i2c_port;

pub use i2c::I2cInterface;
pub use spi::SpiInterface;

use crate::constants::{I2C_ADDRESS_PRIMARY, I2C_ADDRESS_SECONDARY};

/// Raw register access to the sensor hub.
///
/// Reads and writes are plain blocking transfers from the driver's point of
/// view: every call is awaited before the next one is issued.
pub trait SensorInterface {
    type SensorError;

    /// Read `buffer.len()` bytes starting at `reg`
    async fn read_regs(
        &mut self,
        reg: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::SensorError>;

    /// Write `data` starting at `reg`
    async fn write_regs(
        &mut self,
        reg: u8,
        data: &[u8],
    ) -> Result<(), Self::SensorError>;
}

/// I2C address of the hub.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bhi360Address {
    /// HSDO pulled low
    #[default]
    Primary,
    /// HSDO pulled high
    Secondary,
}

impl Bhi360Address {
    pub const fn addr(self) -> u8 {
        match self {
            Self::Primary => I2C_ADDRESS_PRIMARY,
            Self::Secondary => I2C_ADDRESS_SECONDARY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_values() {
        assert_eq!(Bhi360Address::Primary.addr(), 0x28);
        assert_eq!(Bhi360Address::Secondary.addr(), 0x29);
        assert_eq!(Bhi360Address::default(), Bhi360Address::Primary);
    }
}
