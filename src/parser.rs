/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Tagged FIFO event decoding.
//!
//! Every record starts with a one-byte tag. System tags carry timestamps,
//! meta events and log records of fixed size; any other tag is a sensor id
//! whose record size was reported by the hub and lives in [`EventSizeTable`].

use crate::constants::*;
use crate::fifo::{FifoBuffer, FifoEvent, FifoType};
use crate::registry::CallbackTable;
use crate::Error;

/// Meaning of a FIFO record, decoded from its leading byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventTag {
    Padding,
    Filler,
    TimestampSmallDelta,
    TimestampLargeDelta,
    TimestampFull,
    Meta,
    Log,
    Sensor(u8),
}

impl From<u8> for EventTag {
    fn from(tag: u8) -> Self {
        match tag {
            SYS_ID_PADDING => Self::Padding,
            SYS_ID_FILLER => Self::Filler,
            SYS_ID_TS_SMALL_DELTA | SYS_ID_TS_SMALL_DELTA_WU => {
                Self::TimestampSmallDelta
            }
            SYS_ID_TS_LARGE_DELTA | SYS_ID_TS_LARGE_DELTA_WU => {
                Self::TimestampLargeDelta
            }
            SYS_ID_TS_FULL | SYS_ID_TS_FULL_WU => Self::TimestampFull,
            SYS_ID_META_EVENT | SYS_ID_META_EVENT_WU => Self::Meta,
            SYS_ID_LOG_DOSTEP => Self::Log,
            id => Self::Sensor(id),
        }
    }
}

/// Record sizes of the fixed-layout tags on one stream family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FixedSizes {
    small_delta: usize,
    large_delta: usize,
    full: usize,
    meta: usize,
    log: usize,
}

const PRIMARY_FIXED_SIZES: FixedSizes = FixedSizes {
    small_delta: TS_SMALL_DELTA_SIZE,
    large_delta: TS_LARGE_DELTA_SIZE,
    full: TS_FULL_SIZE,
    meta: META_EVENT_SIZE,
    log: LOG_DOSTEP_SIZE,
};

const STATUS_FIXED_SIZES: FixedSizes = FixedSizes {
    small_delta: TS_SMALL_DELTA_FIFO_RD_SIZE,
    large_delta: TS_LARGE_DELTA_RD_FIFO_SIZE,
    full: TS_FULL_RD_FIFO_SIZE,
    meta: META_EVENT_RD_FIFO_SIZE,
    log: LOG_DOSTEP_RD_FIFO_SIZE,
};

impl FifoType {
    pub(crate) const fn fixed_sizes(self) -> &'static FixedSizes {
        match self {
            Self::Wakeup | Self::NonWakeup => &PRIMARY_FIXED_SIZES,
            Self::Status => &STATUS_FIXED_SIZES,
        }
    }
}

impl EventTag {
    /// Record size for tags whose layout is fixed by the hardware.
    pub(crate) const fn fixed_len(self, sizes: &FixedSizes) -> Option<usize> {
        match self {
            Self::Padding | Self::Filler => Some(1),
            Self::TimestampSmallDelta => Some(sizes.small_delta),
            Self::TimestampLargeDelta => Some(sizes.large_delta),
            Self::TimestampFull => Some(sizes.full),
            Self::Meta => Some(sizes.meta),
            Self::Log => Some(sizes.log),
            Self::Sensor(_) => None,
        }
    }
}

/// Per sensor id record length, tag byte included. Zero means unknown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSizeTable {
    record_len: [u8; 256],
}

impl Default for EventSizeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSizeTable {
    pub const fn new() -> Self {
        Self {
            record_len: [0; 256],
        }
    }

    /// Record the payload length of `sensor_id` (sensor id byte excluded).
    pub fn set_payload_len<E>(
        &mut self,
        sensor_id: u8,
        payload_len: u8,
    ) -> Result<(), Error<E>> {
        let record_len = payload_len.checked_add(1).ok_or(Error::InvalidParam)?;
        self.record_len[sensor_id as usize] = record_len;
        Ok(())
    }

    /// Record the event size as reported by the hub, which counts the id byte.
    pub(crate) fn set_record_len(&mut self, sensor_id: u8, record_len: u8) {
        self.record_len[sensor_id as usize] = record_len;
    }

    pub fn clear(&mut self, sensor_id: u8) {
        self.record_len[sensor_id as usize] = 0;
    }

    /// Fill the reserved ids from the fixed system table.
    pub fn fill_system_ids(&mut self) {
        for (offset, size) in SYS_ID_EVENT_SIZE.iter().enumerate() {
            self.record_len[SPECIAL_SENSOR_ID_OFFSET as usize + offset] = *size;
        }
    }

    /// Full record length of `sensor_id`, if resolved.
    ///
    /// Reserved ids fall back to the system table when nothing was stored.
    pub fn record_len(&self, sensor_id: u8) -> Option<usize> {
        let mut len = self.record_len[sensor_id as usize];
        if len == 0 && sensor_id >= SPECIAL_SENSOR_ID_OFFSET {
            len = SYS_ID_EVENT_SIZE[(sensor_id - SPECIAL_SENSOR_ID_OFFSET) as usize];
        }
        if len == 0 {
            None
        } else {
            Some(len as usize)
        }
    }

    pub fn payload_len(&self, sensor_id: u8) -> Option<u8> {
        self.record_len(sensor_id).map(|len| (len - 1) as u8)
    }
}

fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn le_u40(bytes: &[u8]) -> u64 {
    bytes[..5]
        .iter()
        .rev()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Decode every complete record in `fifo`, dispatching sensor events.
///
/// Stops at the first record that is not fully buffered, leaving it at the
/// front of the buffer for the next hardware read to complete. The buffer is
/// compacted on every exit path, errors included.
pub(crate) fn parse_fifo<R: Copy, E>(
    fifo_type: FifoType,
    fifo: &mut FifoBuffer<'_>,
    time_stamp: &mut u64,
    event_sizes: &EventSizeTable,
    callbacks: &CallbackTable<R>,
) -> Result<(), Error<E>> {
    let scanned = scan_records(fifo_type, fifo, time_stamp, event_sizes, callbacks);
    fifo.compact()?;
    scanned
}

fn scan_records<R: Copy, E>(
    fifo_type: FifoType,
    fifo: &mut FifoBuffer<'_>,
    time_stamp: &mut u64,
    event_sizes: &EventSizeTable,
    callbacks: &CallbackTable<R>,
) -> Result<(), Error<E>> {
    let sizes = fifo_type.fixed_sizes();

    while fifo.read_pos() < fifo.read_length() {
        let Some(&raw_tag) = fifo.unread().first() else {
            break;
        };
        let tag = EventTag::from(raw_tag);
        let record_len = match tag.fixed_len(sizes) {
            Some(len) => len,
            None => event_sizes
                .record_len(raw_tag)
                .ok_or(Error::UnresolvedEventSize(raw_tag))?,
        };

        let Some(record) = fifo.peek(record_len) else {
            // partial record, wait for the next read
            break;
        };

        match tag {
            EventTag::TimestampSmallDelta => {
                *time_stamp = time_stamp.wrapping_add(u64::from(record[1]));
            }
            EventTag::TimestampLargeDelta => {
                *time_stamp =
                    time_stamp.wrapping_add(u64::from(le_u16(&record[1..])));
            }
            EventTag::TimestampFull => {
                *time_stamp = le_u40(&record[1..]);
            }
            EventTag::Sensor(sensor_id) => {
                if let Some(entry) = callbacks.lookup(sensor_id) {
                    let event = FifoEvent {
                        sensor_id,
                        fifo_type,
                        time_stamp: &*time_stamp,
                        data: &record[1..],
                    };
                    (entry.callback)(&event, entry.callback_ref);
                }
            }
            // meta events are consumed without dispatch
            EventTag::Padding | EventTag::Filler | EventTag::Meta | EventTag::Log => {}
        }

        fifo.advance(record_len);
    }

    Ok(())
}
