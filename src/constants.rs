/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

// Host interface register map
pub const REG_CHAN_CMD: u8 = 0x00;
pub const REG_CHAN_FIFO_W: u8 = 0x01;
pub const REG_CHAN_FIFO_NW: u8 = 0x02;
pub const REG_CHAN_STATUS: u8 = 0x03;
pub const REG_CHIP_CTRL: u8 = 0x05;
pub const REG_HOST_INTERFACE_CTRL: u8 = 0x06;
pub const REG_HOST_INTERRUPT_CTRL: u8 = 0x07;
pub const REG_RESET_REQ: u8 = 0x14;
pub const REG_TIME_EV_REQ: u8 = 0x15;
pub const REG_HOST_CTRL: u8 = 0x16;
pub const REG_HOST_STATUS: u8 = 0x17;
pub const REG_PRODUCT_ID: u8 = 0x1C;
pub const REG_REVISION_ID: u8 = 0x1D;
pub const REG_ROM_VERSION_0: u8 = 0x1E;
pub const REG_KERNEL_VERSION_0: u8 = 0x20;
pub const REG_USER_VERSION_0: u8 = 0x22;
pub const REG_FEATURE_STATUS: u8 = 0x24;
pub const REG_BOOT_STATUS: u8 = 0x25;
pub const REG_HOST_INTR_TIME_0: u8 = 0x26;
pub const REG_CHIP_ID: u8 = 0x2B;
pub const REG_INT_STATUS: u8 = 0x2D;
pub const REG_ERROR_VALUE: u8 = 0x2E;

/// Registers at or below this address are channels and don't auto-increment
pub const REG_LAST_CHANNEL: u8 = REG_CHAN_STATUS;

pub const PRODUCT_ID: u8 = 0x89;

// I2C addresses, selected by the HSDO pin
pub const I2C_ADDRESS_PRIMARY: u8 = 0x28;
pub const I2C_ADDRESS_SECONDARY: u8 = 0x29;

// Interrupt status register (0x2D)
pub const IST_MASK_ASSERTED: u8 = 0x01;
pub const IST_MASK_FIFO_W: u8 = 0x06;
pub const IST_FIFO_W_DRDY: u8 = 0x02;
pub const IST_FIFO_W_LTCY: u8 = 0x04;
pub const IST_FIFO_W_WM: u8 = 0x06;
pub const IST_MASK_FIFO_NW: u8 = 0x18;
pub const IST_FIFO_NW_DRDY: u8 = 0x08;
pub const IST_FIFO_NW_LTCY: u8 = 0x10;
pub const IST_FIFO_NW_WM: u8 = 0x18;
pub const IST_MASK_STATUS: u8 = 0x20;
pub const IST_MASK_DEBUG: u8 = 0x40;
pub const IST_MASK_RESET_FAULT: u8 = 0x80;

// Host interrupt control register (0x07)
pub const ICTL_DISABLE_FIFO_W: u8 = 0x01;
pub const ICTL_DISABLE_FIFO_NW: u8 = 0x02;
pub const ICTL_DISABLE_STATUS_FIFO: u8 = 0x04;
pub const ICTL_DISABLE_DEBUG: u8 = 0x08;
pub const ICTL_DISABLE_FAULT: u8 = 0x10;
pub const ICTL_ACTIVE_LOW: u8 = 0x20;
pub const ICTL_EDGE: u8 = 0x40;
pub const ICTL_OPEN_DRAIN: u8 = 0x80;

// Host interface control register (0x06)
pub const HIF_CTRL_ABORT_TRANSFER_W: u8 = 0x01;
pub const HIF_CTRL_ABORT_TRANSFER_NW: u8 = 0x02;
pub const HIF_CTRL_ABORT_TRANSFER_STATUS: u8 = 0x04;
pub const HIF_CTRL_AP_SUSPENDED: u8 = 0x08;
pub const HIF_CTRL_TIMESTAMP_EV_CTRL: u8 = 0x20;
pub const HIF_CTRL_ASYNC_STATUS_CHANNEL: u8 = 0x80;

// Boot status register (0x25)
pub const BST_FLASH_DETECTED: u8 = 0x01;
pub const BST_FLASH_VERIFY_DONE: u8 = 0x02;
pub const BST_FLASH_VERIFY_ERROR: u8 = 0x04;
pub const BST_NO_FLASH: u8 = 0x08;
pub const BST_HOST_INTERFACE_READY: u8 = 0x10;
pub const BST_HOST_FW_VERIFY_DONE: u8 = 0x20;
pub const BST_HOST_FW_VERIFY_ERROR: u8 = 0x40;
pub const BST_HOST_FW_IDLE: u8 = 0x80;

pub const REQUEST_RESET: u8 = 0x01;

// Command channel ids
pub const CMD_FIFO_FLUSH: u16 = 0x0009;
pub const CMD_FIFO_FORMAT_CTRL: u16 = 0x0015;

pub const FIFO_FORMAT_CTRL_MASK: u8 = 0x03;
pub const FIFO_FORMAT_CTRL_DIS_DELTA_TS: u8 = 0x01;
pub const FIFO_FORMAT_CTRL_DIS_FULL_TS: u8 = 0x02;

pub const FIFO_FLUSH_ALL: u8 = 0xFE;
pub const FIFO_DISCARD_ALL: u8 = 0xFF;

// Parameter pages
pub const PARAM_READ_MASK: u16 = 0x1000;
pub const PARAM_SYS_VIRT_SENSOR_PRESENT: u16 = 0x011F;
pub const PARAM_SYS_PHYS_SENSOR_PRESENT: u16 = 0x0120;
pub const PARAM_VIRT_SENSOR_INFO_0: u16 = 0x0300;

/// Sensor presence bitmaps hold one bit per sensor id
pub const SENSOR_BITMAP_LEN: usize = 32;

/// Command packets are padded to a multiple of this
pub const COMMAND_PACKET_ALIGN: usize = 4;
pub const COMMAND_HEADER_LEN: usize = 4;
pub const STATUS_HEADER_LEN: usize = 4;
pub const FIFO_LENGTH_PREFIX_LEN: usize = 2;

/// Settling time between status-ready polls
pub const CMD_FIFO_DELAY_TIMEOUT_US: u32 = 10_000;
pub const STATUS_READY_MAX_RETRY: u16 = 1000;
pub const RESET_READY_MAX_RETRY: u16 = 100;

/// Largest single bus transfer unless the integrator lowers it
pub const DEFAULT_READ_WRITE_LEN: usize = 256;

/// Callback table capacity
pub const MAX_SIMUL_SENSORS: usize = 48;

/// One hardware timestamp tick, in nanoseconds (1/64 kHz)
pub const TIMESTAMP_TICK_NS: u64 = 15_625;

// FIFO system ids. The _WU variants are emitted on the wake-up stream.
pub const SYS_ID_PADDING: u8 = 0;
pub const SYS_ID_LOG_DOSTEP: u8 = 244;
pub const SYS_ID_TS_SMALL_DELTA_WU: u8 = 245;
pub const SYS_ID_TS_LARGE_DELTA_WU: u8 = 246;
pub const SYS_ID_TS_FULL_WU: u8 = 247;
pub const SYS_ID_META_EVENT_WU: u8 = 248;
pub const SYS_ID_DEBUG_MSG: u8 = 250;
pub const SYS_ID_TS_SMALL_DELTA: u8 = 251;
pub const SYS_ID_TS_LARGE_DELTA: u8 = 252;
pub const SYS_ID_TS_FULL: u8 = 253;
pub const SYS_ID_META_EVENT: u8 = 254;
pub const SYS_ID_FILLER: u8 = 255;

/// First reserved system id
pub const SPECIAL_SENSOR_ID_OFFSET: u8 = 245;

/// Record sizes (tag byte included) of the reserved ids 245..=255.
/// 249 is unassigned and stays unresolved.
pub const SYS_ID_EVENT_SIZE: [u8; 11] = [2, 3, 6, 4, 0, 18, 2, 3, 6, 4, 1];

// Fixed record sizes on the wake-up/non-wake-up streams
pub const TS_SMALL_DELTA_SIZE: usize = 2;
pub const TS_LARGE_DELTA_SIZE: usize = 3;
pub const TS_FULL_SIZE: usize = 6;
pub const META_EVENT_SIZE: usize = 4;
pub const LOG_DOSTEP_SIZE: usize = 23;

// Fixed record sizes on the status/debug stream
pub const TS_SMALL_DELTA_FIFO_RD_SIZE: usize = 2;
pub const TS_LARGE_DELTA_RD_FIFO_SIZE: usize = 3;
pub const TS_FULL_RD_FIFO_SIZE: usize = 6;
pub const META_EVENT_RD_FIFO_SIZE: usize = 4;
pub const LOG_DOSTEP_RD_FIFO_SIZE: usize = 23;

// Commonly used virtual sensor ids
pub const SENSOR_ID_ACC_PASS: u8 = 1;
pub const SENSOR_ID_ACC_RAW: u8 = 3;
pub const SENSOR_ID_ACC: u8 = 4;
pub const SENSOR_ID_ACC_BIAS: u8 = 5;
pub const SENSOR_ID_GYRO_PASS: u8 = 10;
pub const SENSOR_ID_GYRO_RAW: u8 = 12;
pub const SENSOR_ID_GYRO: u8 = 13;
pub const SENSOR_ID_GYRO_BIAS: u8 = 14;
pub const SENSOR_ID_MAG_PASS: u8 = 19;
pub const SENSOR_ID_MAG_RAW: u8 = 21;
pub const SENSOR_ID_MAG: u8 = 22;
pub const SENSOR_ID_GRA: u8 = 28;
pub const SENSOR_ID_LACC: u8 = 31;
pub const SENSOR_ID_RV: u8 = 34;
pub const SENSOR_ID_GAMERV: u8 = 37;
pub const SENSOR_ID_ORI: u8 = 43;
pub const SENSOR_ID_TILT_DETECTOR: u8 = 48;
pub const SENSOR_ID_STD: u8 = 50;
pub const SENSOR_ID_STC: u8 = 52;
pub const SENSOR_ID_SIG: u8 = 55;
pub const SENSOR_ID_ACC_WU: u8 = 6;
pub const SENSOR_ID_GYRO_WU: u8 = 15;
pub const SENSOR_ID_RV_WU: u8 = 35;
pub const SENSOR_ID_TEMP: u8 = 128;
pub const SENSOR_ID_BARO: u8 = 129;
pub const SENSOR_ID_HUM: u8 = 130;
