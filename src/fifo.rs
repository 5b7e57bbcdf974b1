/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! FIFO stream kinds, the scratch buffer reassembler and the decoded event view.

use crate::constants::*;
use crate::Error;

/// One of the three hardware event queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoType {
    Wakeup = 0,
    NonWakeup = 1,
    Status = 2,
}

impl FifoType {
    /// Drain order used by [`crate::BHI360::get_and_process_fifo`]
    pub const ALL: [FifoType; 3] =
        [FifoType::Wakeup, FifoType::NonWakeup, FifoType::Status];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the interrupt status snapshot asks for this stream to be read.
    pub const fn is_pending(self, int_status: u8) -> bool {
        let mask = match self {
            Self::Wakeup => IST_MASK_FIFO_W,
            Self::NonWakeup => IST_MASK_FIFO_NW,
            Self::Status => IST_MASK_STATUS | IST_MASK_DEBUG,
        };
        (int_status & mask) != 0
    }
}

impl TryFrom<u8> for FifoType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Wakeup),
            1 => Ok(Self::NonWakeup),
            2 => Ok(Self::Status),
            other => Err(other),
        }
    }
}

impl FifoType {
    /// Converts a raw stream selector, as carried in logs or host protocols.
    pub fn from_raw<E>(value: u8) -> Result<Self, Error<E>> {
        Self::try_from(value).map_err(Error::InvalidFifoType)
    }
}

/// A sensor event decoded from a FIFO, handed to the registered callback.
///
/// `data` and `time_stamp` borrow the driver's buffer and timestamp state for
/// the duration of the callback only; copy out anything that must outlive it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FifoEvent<'a> {
    pub sensor_id: u8,
    pub fifo_type: FifoType,
    /// Running timestamp of the stream, in 1/64 kHz ticks
    pub time_stamp: &'a u64,
    /// Event payload, sensor id byte excluded
    pub data: &'a [u8],
}

impl FifoEvent<'_> {
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    pub fn time_stamp_ns(&self) -> u64 {
        self.time_stamp.wrapping_mul(TIMESTAMP_TICK_NS)
    }
}

/// Reassembly state over a caller-owned scratch buffer.
///
/// Bytes `[0, read_length)` are valid. The parser consumes from `read_pos`;
/// after each parse the unconsumed tail is moved to the front so the next
/// hardware read appends after it.
pub struct FifoBuffer<'a> {
    buffer: &'a mut [u8],
    read_length: usize,
    read_pos: usize,
    remain_length: usize,
}

impl<'a> FifoBuffer<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            read_length: 0,
            read_pos: 0,
            remain_length: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn read_length(&self) -> usize {
        self.read_length
    }

    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Bytes the hardware still holds beyond the last read
    pub fn remain_length(&self) -> usize {
        self.remain_length
    }

    pub(crate) fn set_remain_length(&mut self, remain_length: usize) {
        self.remain_length = remain_length;
    }

    pub fn is_full(&self) -> bool {
        self.read_length >= self.buffer.len()
    }

    /// Valid bytes not yet consumed by the parser
    pub fn unread(&self) -> &[u8] {
        let start = self.read_pos.min(self.read_length);
        &self.buffer[start..self.read_length]
    }

    /// Zero the scratch memory and forget all state.
    pub fn reset(&mut self) {
        self.buffer.fill(0);
        self.read_length = 0;
        self.read_pos = 0;
        self.remain_length = 0;
    }

    pub(crate) fn rewind(&mut self) {
        self.read_pos = 0;
    }

    /// Space after the valid bytes, the target of the next hardware read.
    pub(crate) fn free_space_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.read_length..]
    }

    /// Account for `len` bytes written into [`Self::free_space_mut`].
    pub(crate) fn commit(&mut self, len: usize) {
        debug_assert!(
            len <= self.buffer.len() - self.read_length,
            "commit past the end of the buffer"
        );
        self.read_length += len;
    }

    /// Copy as many of `bytes` as fit after the valid data; returns the count.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let dest = self.free_space_mut();
        let len = bytes.len().min(dest.len());
        dest[..len].copy_from_slice(&bytes[..len]);
        self.commit(len);
        len
    }

    /// The next `len` bytes at the cursor, or `None` if they aren't all here yet.
    pub(crate) fn peek(&self, len: usize) -> Option<&[u8]> {
        let end = self.read_pos.checked_add(len)?;
        if end <= self.read_length {
            Some(&self.buffer[self.read_pos..end])
        } else {
            None
        }
    }

    pub(crate) fn advance(&mut self, len: usize) {
        self.read_pos += len;
    }

    /// Move the unconsumed tail to offset 0.
    pub(crate) fn compact<E>(&mut self) -> Result<(), Error<E>> {
        if self.read_length < self.read_pos {
            return Err(Error::BufferUnderflow);
        }
        self.buffer.copy_within(self.read_pos..self.read_length, 0);
        self.read_length -= self.read_pos;
        self.read_pos = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_bits_per_stream() {
        assert!(FifoType::Wakeup.is_pending(IST_FIFO_W_DRDY));
        assert!(FifoType::Wakeup.is_pending(IST_FIFO_W_LTCY));
        assert!(FifoType::Wakeup.is_pending(IST_FIFO_W_WM));
        assert!(!FifoType::Wakeup.is_pending(IST_FIFO_NW_WM));

        assert!(FifoType::NonWakeup.is_pending(IST_FIFO_NW_DRDY));
        assert!(!FifoType::NonWakeup.is_pending(IST_MASK_ASSERTED));

        assert!(FifoType::Status.is_pending(IST_MASK_STATUS));
        assert!(FifoType::Status.is_pending(IST_MASK_DEBUG));
        assert!(!FifoType::Status.is_pending(IST_MASK_RESET_FAULT));
    }

    #[test]
    fn raw_stream_selector() {
        assert_eq!(FifoType::from_raw::<()>(1), Ok(FifoType::NonWakeup));
        assert_eq!(FifoType::from_raw::<()>(3), Err(Error::InvalidFifoType(3)));
    }

    #[test]
    fn append_stops_at_capacity() {
        let mut mem = [0u8; 4];
        let mut fifo = FifoBuffer::new(&mut mem);
        assert_eq!(fifo.append(&[1, 2, 3]), 3);
        assert_eq!(fifo.append(&[4, 5, 6]), 1);
        assert!(fifo.is_full());
        assert_eq!(fifo.unread(), &[1, 2, 3, 4]);
    }

    #[test]
    fn peek_requires_whole_record() {
        let mut mem = [0u8; 8];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.append(&[9, 8, 7]);
        assert_eq!(fifo.peek(3), Some(&[9u8, 8, 7][..]));
        assert_eq!(fifo.peek(4), None);
        fifo.advance(2);
        assert_eq!(fifo.peek(1), Some(&[7u8][..]));
        assert_eq!(fifo.peek(2), None);
    }

    #[test]
    fn compact_moves_tail_to_front() {
        let mut mem = [0u8; 8];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.append(&[1, 2, 3, 4, 5]);
        fifo.advance(3);
        fifo.compact::<()>().expect("compact");
        assert_eq!(fifo.read_pos(), 0);
        assert_eq!(fifo.read_length(), 2);
        assert_eq!(fifo.unread(), &[4, 5]);

        fifo.append(&[6, 7]);
        assert_eq!(fifo.unread(), &[4, 5, 6, 7]);
    }

    #[test]
    fn compact_fully_consumed_empties_buffer() {
        let mut mem = [0u8; 4];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.append(&[1, 2]);
        fifo.advance(2);
        fifo.compact::<()>().expect("compact");
        assert_eq!(fifo.read_length(), 0);
        assert!(fifo.unread().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "commit past the end of the buffer")]
    fn over_commit_is_caught() {
        let mut mem = [0u8; 4];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.append(&[1, 2, 3]);
        fifo.commit(2);
    }

    #[test]
    fn commit_extends_valid_bytes() {
        let mut mem = [0u8; 4];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.free_space_mut()[..2].copy_from_slice(&[7, 8]);
        fifo.commit(2);
        assert_eq!(fifo.unread(), &[7, 8]);
        fifo.commit(2);
        assert!(fifo.is_full());
    }

    #[test]
    fn compact_rejects_cursor_past_end() {
        let mut mem = [0u8; 4];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.append(&[1]);
        fifo.advance(3);
        assert_eq!(fifo.compact::<()>(), Err(Error::BufferUnderflow));
    }

    #[test]
    fn reset_zeroes_memory() {
        let mut mem = [0u8; 4];
        let mut fifo = FifoBuffer::new(&mut mem);
        fifo.append(&[1, 2, 3]);
        fifo.set_remain_length(10);
        fifo.reset();
        assert_eq!(fifo.read_length(), 0);
        assert_eq!(fifo.remain_length(), 0);
        drop(fifo);
        assert_eq!(mem, [0; 4]);
    }

    #[test]
    fn event_timestamp_in_nanoseconds() {
        let ts = 64_000u64;
        let event = FifoEvent {
            sensor_id: 4,
            fifo_type: FifoType::NonWakeup,
            time_stamp: &ts,
            data: &[1, 2, 3],
        };
        assert_eq!(event.time_stamp_ns(), 1_000_000_000);
        assert_eq!(event.data_size(), 3);
    }
}
