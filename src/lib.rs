/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Async `#![no_std]` host driver for the BHI360 programmable sensor hub.
//!
//! The hub buffers sensor events in three FIFOs (wake-up, non-wake-up and
//! status/debug). [`BHI360::get_and_process_fifo`] drains all three into a
//! caller-supplied scratch buffer, decodes the tagged event stream and hands
//! each sensor event to the callback registered for its sensor id.
//!
//! ```rust,no_run
//! use bhi360_async::{BHI360, Bhi360Address, FifoEvent, I2cInterface};
//! # use embedded_hal_async::delay::DelayNs;
//! # use embedded_hal_async::i2c::I2c;
//!
//! fn on_accel(event: &FifoEvent<'_>, _: ()) {
//!     let _ticks = *event.time_stamp;
//!     let _payload = event.data;
//! }
//!
//! # async fn example<I2C: I2c, D: DelayNs>(i2c: I2C, delay: &mut D)
//! #     -> Result<(), bhi360_async::Error<I2C::Error>> {
//! let iface = I2cInterface::new(i2c, Bhi360Address::Primary.addr());
//! let mut hub = BHI360::new_with_interface(iface);
//! hub.init(delay).await?;
//! hub.update_virtual_sensor_list(delay).await?;
//! hub.register_fifo_parse_callback(1, on_accel, ())?;
//!
//! let mut work_buffer = [0u8; 2048];
//! hub.get_and_process_fifo(&mut work_buffer).await?;
//! # Ok(())
//! # }
//! ```

#![no_std]
#![allow(async_fn_in_trait)]
extern crate embedded_hal_async;

#[allow(dead_code)]
pub mod constants;
pub mod fifo;
mod hif;
pub mod interface;
pub mod parser;
pub mod registry;
pub mod sensor_info;
pub mod wrapper;

pub use fifo::{FifoBuffer, FifoEvent, FifoType};
pub use interface::{Bhi360Address, I2cInterface, SensorInterface, SpiInterface};
pub use parser::{EventSizeTable, EventTag};
pub use registry::{CallbackEntry, CallbackTable, FifoParseCallback};
pub use sensor_info::VirtualSensorInfo;
pub use wrapper::BHI360;

/// Errors in this crate
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Sensor communication error
    Comm(E),
    /// Invalid argument or configuration value
    InvalidParam,
    /// Buffer too small for a pending event or status packet
    Buffer,
    /// Every callback table slot is occupied
    InsufficientMaxSimulSensors,
    /// FIFO event tag without a known event size
    UnresolvedEventSize(u8),
    /// The hub reported a zero event size for a present sensor
    InvalidEventSize(u8),
    /// FIFO stream selector outside the three hardware streams
    InvalidFifoType(u8),
    /// Read cursor ran past the valid data in the FIFO buffer
    BufferUnderflow,
    /// The hub did not become ready in time
    Timeout,
    /// Unexpected product ID was read
    InvalidProductId(u8),
    /// A status packet answered with an unexpected code
    UnexpectedStatus(u16),
}
