//! Persisted device configuration
//!
//! The configuration lives in a small non-volatile area:
//!
//! | offset | size | field     |
//! |--------|------|-----------|
//! | 0      | 1    | address   |
//! | 1      | 1    | mode      |
//! | 2      | 2    | min bound |
//! | 4      | 2    | max bound |
//!
//! Words are little-endian. An erased field (all bits set) reads as unset and
//! is replaced by a default when loading.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::scheduler::{Bounds, Mode};

/// Size of the persisted configuration area in bytes
pub const CONFIG_LEN: usize = 6;

const ADDRESS_OFFSET: usize = 0;
const MODE_OFFSET: usize = 1;
const MIN_OFFSET: usize = 2;
const MAX_OFFSET: usize = 4;

const ERASED_BYTE: u8 = 0xFF;
const ERASED_WORD: u16 = 0xFFFF;

pub const DEFAULT_ADDRESS: u8 = 1;
pub const DEFAULT_MODE: Mode = Mode::Random;
pub const DEFAULT_MIN_SECONDS: u16 = 5;
pub const DEFAULT_MAX_SECONDS: u16 = 60;

/// Runtime device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Bus address of this unit
    pub address: u8,
    pub mode: Mode,
    pub bounds: Bounds,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            mode: DEFAULT_MODE,
            bounds: Bounds::new(DEFAULT_MIN_SECONDS, DEFAULT_MAX_SECONDS),
        }
    }
}

/// Configuration as found in storage, with erased fields as `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredConfig {
    pub address: Option<u8>,
    pub mode: Option<u8>,
    pub min: Option<u16>,
    pub max: Option<u16>,
}

impl StoredConfig {
    pub fn from_bytes(bytes: &[u8; CONFIG_LEN]) -> Self {
        let byte = |offset: usize| Some(bytes[offset]).filter(|&value| value != ERASED_BYTE);
        let word = |offset: usize| {
            Some(u16::from_le_bytes([bytes[offset], bytes[offset + 1]]))
                .filter(|&value| value != ERASED_WORD)
        };

        Self {
            address: byte(ADDRESS_OFFSET),
            mode: byte(MODE_OFFSET),
            min: word(MIN_OFFSET),
            max: word(MAX_OFFSET),
        }
    }

    /// Fill unset fields from `defaults`
    ///
    /// An inconsistent min/max pair is repaired rather than rejected.
    pub fn or_defaults(self, defaults: &DeviceConfig) -> DeviceConfig {
        DeviceConfig {
            address: self.address.unwrap_or(defaults.address),
            mode: self.mode.map_or(defaults.mode, Mode::from_raw),
            bounds: Bounds::new(
                self.min.unwrap_or(defaults.bounds.min()),
                self.max.unwrap_or(defaults.bounds.max()),
            ),
        }
    }
}

/// A single persisted field update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Address(u8),
    Mode(Mode),
    MinBound(u16),
    MaxBound(u16),
}

/// Byte-addressed non-volatile storage
///
/// Implement this trait for the EEPROM or flash emulation of the target.
/// Accesses outside the device should be ignored.
pub trait NvStorage {
    /// Fill `buf` with the bytes starting at `offset`
    fn read(&mut self, offset: usize, buf: &mut [u8]);

    /// Write `data` at `offset`, skipping bytes that already hold the value
    fn update(&mut self, offset: usize, data: &[u8]);
}

/// Typed access to the persisted configuration
#[derive(Debug)]
pub struct ConfigStore<S> {
    storage: S,
    defaults: DeviceConfig,
}

impl<S: NvStorage> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_defaults(storage, DeviceConfig::default())
    }

    /// Create a store with board specific defaults for unset fields
    pub const fn with_defaults(storage: S, defaults: DeviceConfig) -> Self {
        Self { storage, defaults }
    }

    pub const fn defaults(&self) -> &DeviceConfig {
        &self.defaults
    }

    /// Read the raw fields, erased ones as `None`
    pub fn stored(&mut self) -> StoredConfig {
        let mut bytes = [ERASED_BYTE; CONFIG_LEN];
        self.storage.read(0, &mut bytes);
        StoredConfig::from_bytes(&bytes)
    }

    /// Read the configuration, applying defaults for unset fields
    pub fn load(&mut self) -> DeviceConfig {
        let stored = self.stored();
        let config = stored.or_defaults(&self.defaults);

        #[cfg(feature = "esp32-log")]
        println!(
            "config: address={} mode={} bounds={}..{} (stored {:?})",
            config.address,
            config.mode.as_raw(),
            config.bounds.min(),
            config.bounds.max(),
            stored
        );

        config
    }

    /// Persist a single field
    pub fn persist(&mut self, field: ConfigField) {
        match field {
            ConfigField::Address(address) => self.storage.update(ADDRESS_OFFSET, &[address]),
            ConfigField::Mode(mode) => self.storage.update(MODE_OFFSET, &[mode.as_raw()]),
            ConfigField::MinBound(min) => self.storage.update(MIN_OFFSET, &min.to_le_bytes()),
            ConfigField::MaxBound(max) => self.storage.update(MAX_OFFSET, &max.to_le_bytes()),
        }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}

/// Storage kept in RAM
///
/// Starts erased. Counts the bytes that actually changed, which makes it
/// useful to observe wear on the host.
#[derive(Debug, Clone)]
pub struct RamStorage<const N: usize> {
    bytes: [u8; N],
    writes: usize,
}

impl<const N: usize> RamStorage<N> {
    pub const fn new() -> Self {
        Self {
            bytes: [ERASED_BYTE; N],
            writes: 0,
        }
    }

    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes, writes: 0 }
    }

    pub const fn bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Number of bytes changed since creation
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> NvStorage for RamStorage<N> {
    fn read(&mut self, offset: usize, buf: &mut [u8]) {
        let Some(source) = self.bytes.get(offset..offset.saturating_add(buf.len())) else {
            return;
        };
        buf.copy_from_slice(source);
    }

    fn update(&mut self, offset: usize, data: &[u8]) {
        let Some(target) = self.bytes.get_mut(offset..offset.saturating_add(data.len())) else {
            return;
        };
        for (cell, &value) in target.iter_mut().zip(data) {
            if *cell != value {
                *cell = value;
                self.writes += 1;
            }
        }
    }
}
