/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use crate::constants::*;
use crate::fifo::{FifoBuffer, FifoType};
use crate::hif::HostInterface;
use crate::interface::SensorInterface;
use crate::parser::{self, EventSizeTable};
use crate::registry::{CallbackTable, FifoParseCallback};
use crate::sensor_info::VirtualSensorInfo;
use crate::Error;
#[cfg(feature = "defmt")]
use defmt::println;
use embedded_hal_async::delay::DelayNs;

/// BHI360 sensor hub.
///
/// `R` is the context value handed back to every FIFO parse callback.
pub struct BHI360<SI, R = ()> {
    hif: HostInterface<SI>,
    /// record length per sensor id, tag included
    event_size: EventSizeTable,
    callbacks: CallbackTable<R>,
    /// running timestamp per FIFO stream, in 1/64 kHz ticks
    last_time_stamp: [u64; 3],
    /// virtual sensor present bitmap
    present_buff: [u8; SENSOR_BITMAP_LEN],
    /// physical sensor present bitmap
    phy_present_buff: [u8; SENSOR_BITMAP_LEN],
}

impl<SI, R: Copy> BHI360<SI, R> {
    pub fn new_with_interface(sensor_interface: SI) -> Self {
        Self::with_read_write_len(sensor_interface, DEFAULT_READ_WRITE_LEN)
    }

    /// `read_write_len` caps the size of a single bus transfer.
    pub fn with_read_write_len(sensor_interface: SI, read_write_len: usize) -> Self {
        Self {
            hif: HostInterface::new(sensor_interface, read_write_len),
            event_size: EventSizeTable::new(),
            callbacks: CallbackTable::new(),
            last_time_stamp: [0; 3],
            present_buff: [0; SENSOR_BITMAP_LEN],
            phy_present_buff: [0; SENSOR_BITMAP_LEN],
        }
    }

    /// Returns previously consumed serial sensor instance.
    pub fn free(self) -> SI {
        self.hif.free()
    }

    pub fn read_write_len(&self) -> usize {
        self.hif.read_write_len()
    }

    pub fn deregister_fifo_parse_callback(&mut self, sensor_id: u8) {
        self.callbacks.deregister(sensor_id);
    }

    /// Payload length of `sensor_id`, if known.
    pub fn event_size(&self, sensor_id: u8) -> Option<u8> {
        self.event_size.payload_len(sensor_id)
    }

    pub fn event_size_table(&self) -> &EventSizeTable {
        &self.event_size
    }

    /// Whether the last virtual sensor list refresh reported `sensor_id`.
    pub fn is_sensor_available(&self, sensor_id: u8) -> bool {
        bitmap_contains(&self.present_buff, sensor_id)
    }

    pub fn is_physical_sensor_available(&self, sensor_id: u8) -> bool {
        bitmap_contains(&self.phy_present_buff, sensor_id)
    }

    /// Running timestamp of a stream, in 1/64 kHz ticks
    pub fn last_time_stamp(&self, fifo_type: FifoType) -> u64 {
        self.last_time_stamp[fifo_type.index()]
    }
}

fn bitmap_contains(bitmap: &[u8; SENSOR_BITMAP_LEN], id: u8) -> bool {
    bitmap[(id / 8) as usize] & (1 << (id % 8)) != 0
}

impl<SI, SE, R> BHI360<SI, R>
where
    SI: SensorInterface<SensorError = SE>,
    R: Copy,
{
    /// Route FIFO events for `sensor_id` to `callback`.
    pub fn register_fifo_parse_callback(
        &mut self,
        sensor_id: u8,
        callback: FifoParseCallback<R>,
        callback_ref: R,
    ) -> Result<(), Error<SE>> {
        self.callbacks.register(sensor_id, callback, callback_ref)
    }

    /// Override the payload length of `sensor_id`, sensor id byte excluded.
    pub fn set_event_size(
        &mut self,
        sensor_id: u8,
        payload_len: u8,
    ) -> Result<(), Error<SE>> {
        self.event_size.set_payload_len(sensor_id, payload_len)
    }

    /// Reset the hub and check that it identifies as a BHI360.
    pub async fn init(
        &mut self,
        delay_source: &mut impl DelayNs,
    ) -> Result<(), Error<SE>> {
        #[cfg(feature = "defmt")]
        println!("bhi360 init");

        self.soft_reset(delay_source).await?;
        let product_id = self.get_product_id().await?;
        if product_id != PRODUCT_ID {
            #[cfg(feature = "defmt")]
            println!("bad product id: 0x{:X}", product_id);
            return Err(Error::InvalidProductId(product_id));
        }
        Ok(())
    }

    /// Request a reset and wait for the host interface to come back.
    ///
    /// Running FIFO timestamps restart from zero.
    pub async fn soft_reset(
        &mut self,
        delay_source: &mut impl DelayNs,
    ) -> Result<(), Error<SE>> {
        self.hif.set_reg(REG_RESET_REQ, REQUEST_RESET).await?;
        self.last_time_stamp = [0; 3];

        for _ in 0..RESET_READY_MAX_RETRY {
            delay_source.delay_us(CMD_FIFO_DELAY_TIMEOUT_US).await;
            let boot_status = self.get_boot_status().await?;
            if boot_status & BST_HOST_INTERFACE_READY != 0 {
                return Ok(());
            }
        }
        #[cfg(feature = "defmt")]
        println!("host interface not ready after reset");
        Err(Error::Timeout)
    }

    pub async fn get_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<SE>> {
        self.hif.get_regs(reg, buf).await
    }

    pub async fn set_regs(&mut self, reg: u8, data: &[u8]) -> Result<(), Error<SE>> {
        self.hif.set_regs(reg, data).await
    }

    async fn get_reg_u16(&mut self, reg: u8) -> Result<u16, Error<SE>> {
        let mut buf = [0u8; 2];
        self.hif.get_regs(reg, &mut buf).await?;
        Ok(u16::from_le_bytes(buf))
    }

    pub async fn get_chip_id(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_CHIP_ID).await
    }

    pub async fn get_product_id(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_PRODUCT_ID).await
    }

    pub async fn get_revision_id(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_REVISION_ID).await
    }

    pub async fn get_rom_version(&mut self) -> Result<u16, Error<SE>> {
        self.get_reg_u16(REG_ROM_VERSION_0).await
    }

    /// Zero until firmware has been loaded
    pub async fn get_kernel_version(&mut self) -> Result<u16, Error<SE>> {
        self.get_reg_u16(REG_KERNEL_VERSION_0).await
    }

    pub async fn get_user_version(&mut self) -> Result<u16, Error<SE>> {
        self.get_reg_u16(REG_USER_VERSION_0).await
    }

    pub async fn get_boot_status(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_BOOT_STATUS).await
    }

    pub async fn get_host_status(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_HOST_STATUS).await
    }

    pub async fn get_feature_status(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_FEATURE_STATUS).await
    }

    pub async fn get_interrupt_status(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_interrupt_status().await
    }

    pub async fn get_error_value(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_ERROR_VALUE).await
    }

    pub async fn get_host_interrupt_ctrl(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_HOST_INTERRUPT_CTRL).await
    }

    /// See the `ICTL_*` bits
    pub async fn set_host_interrupt_ctrl(&mut self, ctrl: u8) -> Result<(), Error<SE>> {
        self.hif.set_reg(REG_HOST_INTERRUPT_CTRL, ctrl).await
    }

    pub async fn get_host_intf_ctrl(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_HOST_INTERFACE_CTRL).await
    }

    /// See the `HIF_CTRL_*` bits
    pub async fn set_host_intf_ctrl(&mut self, ctrl: u8) -> Result<(), Error<SE>> {
        self.hif.set_reg(REG_HOST_INTERFACE_CTRL, ctrl).await
    }

    pub async fn get_host_ctrl(&mut self) -> Result<u8, Error<SE>> {
        self.hif.get_reg(REG_HOST_CTRL).await
    }

    pub async fn set_host_ctrl(&mut self, ctrl: u8) -> Result<(), Error<SE>> {
        self.hif.set_reg(REG_HOST_CTRL, ctrl).await
    }

    /// Latch the hardware timestamp into the host interrupt time registers.
    pub async fn set_timestamp_event_req(&mut self, request: bool) -> Result<(), Error<SE>> {
        self.hif.set_reg(REG_TIME_EV_REQ, u8::from(request)).await
    }

    /// Latched hardware timestamp, in nanoseconds.
    pub async fn get_hw_timestamp_ns(&mut self) -> Result<u64, Error<SE>> {
        let mut buf = [0u8; 5];
        self.hif.get_regs(REG_HOST_INTR_TIME_0, &mut buf).await?;
        let ticks = buf
            .iter()
            .rev()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        Ok(ticks.wrapping_mul(TIMESTAMP_TICK_NS))
    }

    /// Turn timestamp records on or off; see `FIFO_FORMAT_CTRL_*`.
    pub async fn set_fifo_format_ctrl(&mut self, format: u8) -> Result<(), Error<SE>> {
        let payload = [format & FIFO_FORMAT_CTRL_MASK, 0, 0, 0];
        self.hif.exec_cmd(CMD_FIFO_FORMAT_CTRL, &payload).await
    }

    /// Flush one sensor's events, or all with `FIFO_FLUSH_ALL` / `FIFO_DISCARD_ALL`.
    pub async fn flush_fifo(&mut self, sensor_id: u8) -> Result<(), Error<SE>> {
        self.hif.exec_cmd(CMD_FIFO_FLUSH, &[sensor_id, 0, 0, 0]).await
    }

    /// Read a parameter page into `buf`, returning its length.
    pub async fn get_parameter(
        &mut self,
        param: u16,
        buf: &mut [u8],
        delay_source: &mut impl DelayNs,
    ) -> Result<usize, Error<SE>> {
        self.hif.get_parameter(param, buf, delay_source).await
    }

    pub async fn set_parameter(&mut self, param: u16, data: &[u8]) -> Result<(), Error<SE>> {
        self.hif.set_parameter(param, data).await
    }

    pub async fn get_sensor_info(
        &mut self,
        sensor_id: u8,
        delay_source: &mut impl DelayNs,
    ) -> Result<VirtualSensorInfo, Error<SE>> {
        let mut page = [0u8; VirtualSensorInfo::LEN];
        let param = PARAM_VIRT_SENSOR_INFO_0 + u16::from(sensor_id);
        let len = self.hif.get_parameter(param, &mut page, delay_source).await?;
        VirtualSensorInfo::from_bytes(&page[..len]).ok_or(Error::Buffer)
    }

    /// Refresh the present bitmap and the event size of every present sensor.
    pub async fn update_virtual_sensor_list(
        &mut self,
        delay_source: &mut impl DelayNs,
    ) -> Result<(), Error<SE>> {
        let mut present = [0u8; SENSOR_BITMAP_LEN];
        self.hif
            .get_parameter(PARAM_SYS_VIRT_SENSOR_PRESENT, &mut present, delay_source)
            .await?;
        self.present_buff = present;

        for sensor_id in 1..SPECIAL_SENSOR_ID_OFFSET {
            if !self.is_sensor_available(sensor_id) {
                continue;
            }
            let info = self.get_sensor_info(sensor_id, delay_source).await?;
            if info.event_size == 0 {
                #[cfg(feature = "defmt")]
                println!("sensor {} reports no event size", sensor_id);
                return Err(Error::InvalidEventSize(sensor_id));
            }
            self.event_size.set_record_len(sensor_id, info.event_size);
        }

        self.event_size.fill_system_ids();
        Ok(())
    }

    pub async fn update_physical_sensor_list(
        &mut self,
        delay_source: &mut impl DelayNs,
    ) -> Result<(), Error<SE>> {
        let mut present = [0u8; SENSOR_BITMAP_LEN];
        self.hif
            .get_parameter(PARAM_SYS_PHYS_SENSOR_PRESENT, &mut present, delay_source)
            .await?;
        self.phy_present_buff = present;
        Ok(())
    }

    /// Decode buffered bytes of one stream and dispatch its sensor events.
    ///
    /// For integrators that fetch FIFO data themselves; an incomplete
    /// trailing record is kept at the front of `fifo` for the next call.
    pub fn parse_fifo(
        &mut self,
        fifo_type: FifoType,
        fifo: &mut FifoBuffer<'_>,
    ) -> Result<(), Error<SE>> {
        let time_stamp = &mut self.last_time_stamp[fifo_type.index()];
        parser::parse_fifo(fifo_type, fifo, time_stamp, &self.event_size, &self.callbacks)
    }

    /// Drain the wake-up, non-wake-up and status FIFOs, in that order.
    ///
    /// `work_buffer` holds raw FIFO bytes while they are decoded; events larger
    /// than it cannot be read and fail with [`Error::Buffer`].
    pub async fn get_and_process_fifo(
        &mut self,
        work_buffer: &mut [u8],
    ) -> Result<(), Error<SE>> {
        if work_buffer.is_empty() {
            return Err(Error::InvalidParam);
        }
        let mut fifo = FifoBuffer::new(work_buffer);
        fifo.reset();

        let int_status = self.hif.get_interrupt_status().await?;
        for fifo_type in FifoType::ALL {
            fifo.reset();
            self.drain_fifo(fifo_type, int_status, &mut fifo).await?;
        }
        Ok(())
    }

    async fn drain_fifo(
        &mut self,
        fifo_type: FifoType,
        int_status: u8,
        fifo: &mut FifoBuffer<'_>,
    ) -> Result<(), Error<SE>> {
        let mut int_status = int_status;
        while fifo_type.is_pending(int_status) || fifo.remain_length() > 0 {
            fifo.rewind();
            self.read_fifo(fifo_type, int_status, fifo).await?;
            self.parse_fifo(fifo_type, fifo)?;
            int_status = 0;

            if fifo.is_full() && fifo.remain_length() > 0 {
                // nothing could be consumed and nothing more fits
                #[cfg(feature = "defmt")]
                println!("fifo {} stuck, {} left", fifo_type, fifo.remain_length());
                return Err(Error::Buffer);
            }
        }
        Ok(())
    }

    /// Append the next hardware transfer of `fifo_type` to the buffer.
    async fn read_fifo(
        &mut self,
        fifo_type: FifoType,
        int_status: u8,
        fifo: &mut FifoBuffer<'_>,
    ) -> Result<(), Error<SE>> {
        let reg = match fifo_type {
            FifoType::Wakeup => REG_CHAN_FIFO_W,
            FifoType::NonWakeup => REG_CHAN_FIFO_NW,
            FifoType::Status => {
                let async_pending =
                    int_status & IST_MASK_DEBUG != 0 || fifo.remain_length() > 0;
                if !async_pending {
                    if int_status & IST_MASK_STATUS != 0 {
                        let (_code, len) =
                            self.hif.get_status_fifo(fifo.free_space_mut()).await?;
                        fifo.commit(len);
                    }
                    return Ok(());
                }
                REG_CHAN_STATUS
            }
        };

        let remain = fifo.remain_length();
        let (read_len, remain) = self
            .hif
            .get_fifo(reg, fifo.free_space_mut(), remain)
            .await?;
        fifo.commit(read_len);
        fifo.set_remain_length(remain);
        Ok(())
    }
}
