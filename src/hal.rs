//! Hardware services consumed by the STSAFE-A middleware.
//!
//! The middleware drives the secure element exclusively through
//! [`HwServices`]: bus lifecycle, raw byte transfers, the reset line, a
//! millisecond delay and the frame CRC. [`Adapter`] implements it on top of
//! `embedded-hal` 1.0 traits.
//!
//! No retries happen at this layer. A NACK or a bus failure is returned as
//! is and the middleware decides what to do with it.

use crate::config::BusConfig;
use crate::crc16;
use crate::error::{BusError, Error};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::{ErrorType, I2c, Operation};

/// Capability table registered with the middleware.
pub trait HwServices {
    /// Pulses the reset line to bring the device out of reset.
    fn io_init(&mut self) -> Result<(), BusError>;
    /// (Re)installs the bus controller.
    fn bus_init(&mut self) -> Result<(), BusError>;
    /// Removes the bus controller.
    fn bus_deinit(&mut self) -> Result<(), BusError>;
    fn bus_send(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError>;
    fn bus_recv(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusError>;
    fn crc_init(&mut self) -> Result<(), BusError>;
    fn crc_compute(&self, first: &[u8], second: &[u8]) -> u32;
    fn time_delay(&mut self, ms: u32);
    /// 7-bit bus address of the secure element.
    fn device_address(&self) -> u8;
}

/// An I2C controller whose driver can be installed and removed at run time.
pub trait BusDriver: I2c {
    fn install(&mut self, config: &BusConfig) -> Result<(), Self::Error>;
    fn uninstall(&mut self) -> Result<(), Self::Error>;
}

/// Wraps a bus that the platform HAL already configured at construction.
///
/// Installing and removing only toggle whether the adapter may use it.
#[derive(Debug)]
pub struct Preconfigured<I2C> {
    i2c: I2C,
}

impl<I2C> Preconfigured<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }
}

impl<I2C: ErrorType> ErrorType for Preconfigured<I2C> {
    type Error = I2C::Error;
}

impl<I2C: I2c> I2c for Preconfigured<I2C> {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(address, read)
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(address, write)
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.i2c.transaction(address, operations)
    }
}

impl<I2C: I2c> BusDriver for Preconfigured<I2C> {
    fn install(&mut self, _config: &BusConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct Adapter<BUS, RST, D> {
    bus: BUS,
    reset: RST,
    delay: D,
    config: BusConfig,
    installed: bool,
}

impl<BUS, RST, D> Adapter<BUS, RST, D>
where
    BUS: BusDriver,
    RST: OutputPin,
    D: DelayNs,
{
    /// Builds the capability table. The bus stays uninstalled until the
    /// middleware calls `bus_init`.
    pub fn probe(bus: BUS, reset: RST, delay: D, config: BusConfig) -> Result<Self, Error> {
        config.validate()?;
        debug!(
            "stsafe probe: addr={:#x} clock={}Hz timeout={}ms",
            config.address,
            config.clock_hz,
            config.timeout_ms
        );
        Ok(Self {
            bus,
            reset,
            delay,
            config,
            installed: false,
        })
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Gives back the bus, reset pin and delay.
    pub fn release(self) -> (BUS, RST, D) {
        (self.bus, self.reset, self.delay)
    }
}

impl<BUS, RST, D> HwServices for Adapter<BUS, RST, D>
where
    BUS: BusDriver,
    RST: OutputPin,
    D: DelayNs,
{
    fn io_init(&mut self) -> Result<(), BusError> {
        let timing = self.config.reset;
        self.reset.set_low().map_err(|_| BusError::Bus)?;
        self.delay.delay_ms(timing.pulse_ms());
        self.reset.set_high().map_err(|_| BusError::Bus)?;
        self.delay.delay_ms(timing.settle_ms());
        Ok(())
    }

    fn bus_init(&mut self) -> Result<(), BusError> {
        // Drop whatever instance is left from a previous init.
        self.bus.uninstall().ok();
        self.installed = false;

        self.bus.install(&self.config).map_err(|_| {
            error!("stsafe bus install failed");
            BusError::Bus
        })?;
        self.installed = true;
        Ok(())
    }

    fn bus_deinit(&mut self) -> Result<(), BusError> {
        self.installed = false;
        self.bus.uninstall().map_err(|_| BusError::Bus)
    }

    fn bus_send(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        if !self.installed {
            return Err(BusError::Bus);
        }
        let result = self
            .bus
            .write(address, bytes)
            .map_err(|e| BusError::from_i2c(&e));
        trace!(
            "stsafe tx: addr={:#x} len={} -> {:?}",
            address,
            bytes.len(),
            result
        );
        result
    }

    fn bus_recv(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        if !self.installed {
            return Err(BusError::Bus);
        }
        let result = self
            .bus
            .read(address, buffer)
            .map_err(|e| BusError::from_i2c(&e));
        trace!(
            "stsafe rx: addr={:#x} len={} -> {:?}",
            address,
            buffer.len(),
            result
        );
        result
    }

    fn crc_init(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    fn crc_compute(&self, first: &[u8], second: &[u8]) -> u32 {
        crc16::compute(first, second)
    }

    fn time_delay(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn device_address(&self) -> u8 {
        self.config.address
    }
}
