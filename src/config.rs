//! Bus and reset-line configuration owned by the [`Adapter`](crate::hal::Adapter).

use crate::error::{Error, ErrorKind};

/// Default 7-bit I2C address of STSAFE-A110.
pub const DEFAULT_ADDRESS: u8 = 0x20;
/// Bus clock of the reference configuration.
pub const DEFAULT_CLOCK_HZ: u32 = 100_000;
/// Upper bound on a single bus transaction.
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Pin assignment handed to [`BusDriver::install`](crate::hal::BusDriver::install).
///
/// Platform drivers that receive already-configured pins ignore it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    pub sda: u8,
    pub scl: u8,
    pub reset: u8,
}

/// Reset pulse applied by `io_init`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetTiming {
    pulse_ms: u32,
    settle_ms: u32,
}

impl ResetTiming {
    /// Minimum time the reset line stays low.
    pub const MIN_PULSE_MS: u32 = 1;
    /// Minimum wait after release before the first command.
    pub const MIN_SETTLE_MS: u32 = 40;

    /// Durations shorter than the device minimums are raised to them.
    pub fn new(pulse_ms: u32, settle_ms: u32) -> Self {
        Self {
            pulse_ms: pulse_ms.max(Self::MIN_PULSE_MS),
            settle_ms: settle_ms.max(Self::MIN_SETTLE_MS),
        }
    }

    pub fn pulse_ms(&self) -> u32 {
        self.pulse_ms
    }

    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self::new(Self::MIN_PULSE_MS, Self::MIN_SETTLE_MS)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    pub address: u8,
    pub clock_hz: u32,
    pub sda_pull_up: bool,
    pub scl_pull_up: bool,
    pub pins: Option<Pins>,
    pub timeout_ms: u32,
    pub reset: ResetTiming,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            clock_hz: DEFAULT_CLOCK_HZ,
            sda_pull_up: true,
            scl_pull_up: true,
            pins: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reset: ResetTiming::default(),
        }
    }
}

impl BusConfig {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    pub fn with_pins(mut self, pins: Pins) -> Self {
        self.pins = Some(pins);
        self
    }

    pub fn with_pull_ups(mut self, sda: bool, scl: bool) -> Self {
        self.sda_pull_up = sda;
        self.scl_pull_up = scl;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_reset(mut self, reset: ResetTiming) -> Self {
        self.reset = reset;
        self
    }

    /// Rejects addresses outside the 7-bit range, a stopped clock and a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), Error> {
        if self.address > 0x7f || self.clock_hz == 0 || self.timeout_ms == 0 {
            return Err(ErrorKind::BadParam.into());
        }
        Ok(())
    }
}
