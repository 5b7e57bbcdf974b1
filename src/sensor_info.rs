/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

/// Virtual sensor information parameter, as reported by the hub.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VirtualSensorInfo {
    pub sensor_type: u8,
    pub driver_id: u8,
    pub driver_version: u8,
    /// Current consumption, in 0.1 mA
    pub power: u8,
    pub max_range: u16,
    pub resolution: u16,
    /// Hz
    pub max_rate: f32,
    pub fifo_reserved: u32,
    pub fifo_max: u32,
    /// Record size on the FIFO, sensor id byte included
    pub event_size: u8,
    /// Hz
    pub min_rate: f32,
}

impl VirtualSensorInfo {
    /// Length of the parameter page
    pub const LEN: usize = 28;
    const MIN_LEN: usize = 25;

    /// Decode the little-endian parameter page; `None` if it is too short.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::MIN_LEN {
            return None;
        }
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at = |i: usize| {
            u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };

        Some(Self {
            sensor_type: bytes[0],
            driver_id: bytes[1],
            driver_version: bytes[2],
            power: bytes[3],
            max_range: u16_at(4),
            resolution: u16_at(6),
            max_rate: f32::from_bits(u32_at(8)),
            fifo_reserved: u32_at(12),
            fifo_max: u32_at(16),
            event_size: bytes[20],
            min_rate: f32::from_bits(u32_at(21)),
        })
    }
}
