/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Fixed capacity table of per sensor FIFO callbacks.

use crate::constants::MAX_SIMUL_SENSORS;
use crate::fifo::FifoEvent;
use crate::Error;

/// Called once per decoded sensor event, with the context registered for it.
pub type FifoParseCallback<R> = fn(&FifoEvent<'_>, R);

#[derive(Clone, Copy)]
pub struct CallbackEntry<R> {
    pub sensor_id: u8,
    pub callback: FifoParseCallback<R>,
    pub callback_ref: R,
}

impl<R> core::fmt::Debug for CallbackEntry<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("sensor_id", &self.sensor_id)
            .finish_non_exhaustive()
    }
}

/// Up to `N` callbacks, at most one per sensor id.
pub struct CallbackTable<R, const N: usize = MAX_SIMUL_SENSORS> {
    slots: [Option<CallbackEntry<R>>; N],
}

impl<R: Copy, const N: usize> Default for CallbackTable<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Copy, const N: usize> CallbackTable<R, N> {
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Add or replace the callback for `sensor_id`.
    ///
    /// A free slot is required even when `sensor_id` is already present, so a
    /// full table rejects every registration. Sensor id 0 is padding and is
    /// never dispatched.
    pub fn register<E>(
        &mut self,
        sensor_id: u8,
        callback: FifoParseCallback<R>,
        callback_ref: R,
    ) -> Result<(), Error<E>> {
        if sensor_id == 0 {
            return Err(Error::InvalidParam);
        }
        let mut free_slot = None;
        let mut existing = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            match slot {
                None if free_slot.is_none() => free_slot = Some(idx),
                Some(entry) if entry.sensor_id == sensor_id => existing = Some(idx),
                _ => {}
            }
        }
        let Some(free_slot) = free_slot else {
            return Err(Error::InsufficientMaxSimulSensors);
        };
        let entry = CallbackEntry {
            sensor_id,
            callback,
            callback_ref,
        };
        self.slots[existing.unwrap_or(free_slot)] = Some(entry);
        Ok(())
    }

    /// Remove the callback for `sensor_id`, if any.
    pub fn deregister(&mut self, sensor_id: u8) {
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some(entry) if entry.sensor_id == sensor_id) {
                *slot = None;
            }
        }
    }
}

impl<R, const N: usize> CallbackTable<R, N> {
    pub fn lookup(&self, sensor_id: u8) -> Option<&CallbackEntry<R>> {
        self.slots
            .iter()
            .flatten()
            .find(|entry| entry.sensor_id == sensor_id)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_event: &FifoEvent<'_>, _ctx: u32) {}
    fn other(_event: &FifoEvent<'_>, _ctx: u32) {}

    #[test]
    fn capacity_exceeded() {
        let mut table: CallbackTable<u32, 3> = CallbackTable::new();
        for id in 1..=3 {
            table.register::<()>(id, noop, 0).expect("register");
        }
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.register::<()>(4, noop, 0),
            Err(Error::InsufficientMaxSimulSensors)
        );
        // even an id that is already present needs a free slot
        assert_eq!(
            table.register::<()>(2, noop, 9),
            Err(Error::InsufficientMaxSimulSensors)
        );
        assert_eq!(table.lookup(2).map(|e| e.callback_ref), Some(0));
    }

    #[test]
    fn re_register_updates_in_place() {
        let mut table: CallbackTable<u32, 4> = CallbackTable::new();
        table.register::<()>(5, noop, 1).expect("register");
        table.register::<()>(5, other, 2).expect("re-register");
        assert_eq!(table.len(), 1);
        let entry = table.lookup(5).expect("entry");
        assert_eq!(entry.callback_ref, 2);
    }

    #[test]
    fn deregister_missing_is_noop() {
        let mut table: CallbackTable<u32, 4> = CallbackTable::new();
        table.register::<()>(5, noop, 1).expect("register");
        table.deregister(6);
        assert_eq!(table.len(), 1);
        table.deregister(5);
        assert!(table.is_empty());
        assert!(table.lookup(5).is_none());
    }

    #[test]
    fn padding_id_rejected() {
        let mut table: CallbackTable<u32> = CallbackTable::new();
        assert_eq!(table.register::<()>(0, noop, 0), Err(Error::InvalidParam));
        assert_eq!(table.capacity(), MAX_SIMUL_SENSORS);
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut table: CallbackTable<u32, 2> = CallbackTable::new();
        table.register::<()>(1, noop, 0).expect("register");
        table.register::<()>(2, noop, 0).expect("register");
        table.deregister(1);
        table.register::<()>(3, noop, 0).expect("register");
        assert!(table.lookup(3).is_some());
        assert!(table.lookup(1).is_none());
    }
}
