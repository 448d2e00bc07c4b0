//! # AP3216C Ambient Light, Proximity and IR Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the AP3216C integrated ambient light (ALS),
//! proximity (PS) and infrared (IR) sensor, built using the [`embedded-hal`] traits for I2C
//! communication.
//!
//! The AP3216C provides:
//! - 16-bit ambient light counts
//! - 10-bit proximity counts
//! - 10-bit IR counts
//! - I2C interface (address 0x1E)
//!
//! ## Features
//!
//! - **Bring-up sequence** with the reset and activation settle times the chip requires
//! - **Overflow-aware decoding**: IR and PS readings taken under strong infrared light are
//!   reported as zero
//! - **Async/await support** with feature gating (optional)
//!
//! Interrupts, thresholds and conversion to lux or millimetres are not provided; readings are
//! raw counts.
//!
//! ## Quick Start
//!
//! The driver opens the bus itself during [`Ap3216c::initialize`], so it is handed a
//! [`BusOpener`] rather than an open bus. Any `FnMut(&str) -> Result<Bus, Bus::Error>` closure
//! works:
//!
//! ```rust,no_run
//! use ap3216c::Ap3216c;
//! # use embedded_hal_mock::eh1::{delay::NoopDelay, i2c::Mock};
//! # let open = |_: &str| Ok::<_, embedded_hal::i2c::ErrorKind>(Mock::new(&[]));
//! # let delay = NoopDelay::new();
//!
//! let mut sensor = Ap3216c::new(open, delay);
//!
//! // Reset, then activate ALS + PS + IR (blocks for ~370ms)
//! sensor.initialize().unwrap();
//!
//! let sample = sensor.read_sample().unwrap();
//! // println!("ir: {}, als: {}, ps: {}", sample.ir, sample.als, sample.ps);
//! # let _ = sample;
//! ```
//!
//! ## Async Usage
//!
//! Enable the `async` feature to use async/await patterns:
//!
//! ```toml
//! [dependencies]
//! ap3216c = { version = "0.1", features = ["async"] }
//! ```
//!
//! ```rust,ignore
//! let mut sensor = Ap3216c::new(open, delay);
//! sensor.initialize_async().await.unwrap();
//! let sample = sensor.read_sample_async().await.unwrap();
//! ```
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

pub mod ll;

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c};

#[cfg(feature = "async")]
use embedded_hal_async::{delay::DelayNs as AsyncDelayNs, i2c::I2c as AsyncI2c};

pub use ll::{Mode, RawRegisters, SensorSample, DEVICE_PATH, I2C_ADDRESS};
use ll::{DATA_LEN, IR_DATA_LOW, SYSTEM_CONFIG};

/// Settle time after a software reset (the chip needs at least 10ms)
pub const RESET_SETTLE_MS: u32 = 20;

/// Settle time after activating the measurement functions, before the first valid conversion
pub const ACTIVATE_SETTLE_MS: u32 = 350;

/// All possible errors in this crate
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus could not be opened
    BusOpen(E),
    /// Writing the configuration register failed
    BusWrite(E),
    /// Reading a data register failed
    BusRead(E),
    /// A sample was requested before [`Ap3216c::initialize`] succeeded
    NotInitialized,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BusOpen(e) => write!(f, "failed to open {}: {:?}", DEVICE_PATH, e),
            Error::BusWrite(e) => write!(f, "register write failed: {:?}", e),
            Error::BusRead(e) => write!(f, "register read failed: {:?}", e),
            Error::NotInitialized => f.write_str("sensor not initialized"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

/// Opens the bus the sensor lives on
///
/// Implemented for every `FnMut(&str) -> Result<B, B::Error>` closure.
pub trait BusOpener {
    /// The opened bus
    type Bus: ErrorType;

    /// Open the bus device at `path`
    fn open(&mut self, path: &str) -> Result<Self::Bus, <Self::Bus as ErrorType>::Error>;
}

impl<F, B> BusOpener for F
where
    F: FnMut(&str) -> Result<B, B::Error>,
    B: ErrorType,
{
    type Bus = B;

    fn open(&mut self, path: &str) -> Result<B, B::Error> {
        self(path)
    }
}

/// Error type of the bus produced by opener `O`
pub type BusError<O> = <<O as BusOpener>::Bus as ErrorType>::Error;

/// High-level AP3216C driver
pub struct Ap3216c<O: BusOpener, D> {
    opener: O,
    bus: Option<O::Bus>,
    delay: D,
    initialized: bool,
}

impl<O, D> Ap3216c<O, D>
where
    O: BusOpener,
{
    /// Create a new driver instance. No bus traffic happens until [`initialize`](Self::initialize).
    pub fn new(opener: O, delay: D) -> Self {
        Self {
            opener,
            bus: None,
            delay,
            initialized: false,
        }
    }

    /// True once an initialization sequence has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Destroy the driver and return the bus (if it was opened) and the delay
    pub fn destroy(self) -> (Option<O::Bus>, D) {
        (self.bus, self.delay)
    }

    // A bus left open by a failed initialization is reused
    fn open(&mut self) -> Result<(), Error<BusError<O>>> {
        if self.bus.is_none() {
            let bus = self.opener.open(DEVICE_PATH).map_err(Error::BusOpen)?;
            self.bus = Some(bus);
        }
        Ok(())
    }
}

impl<O, D> Ap3216c<O, D>
where
    O: BusOpener,
    O::Bus: I2c,
    D: DelayNs,
{
    /// Open the bus, reset the chip and activate ALS, PS and IR conversions
    ///
    /// Blocks for [`RESET_SETTLE_MS`] after the reset and [`ACTIVATE_SETTLE_MS`] after the
    /// activation. Any failure leaves the driver uninitialized; nothing is retried.
    pub fn initialize(&mut self) -> Result<(), Error<BusError<O>>> {
        self.initialized = false;
        self.open()?;

        self.write_register(SYSTEM_CONFIG, Mode::SwReset as u8)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        self.write_register(SYSTEM_CONFIG, Mode::AlsPsIrActive as u8)?;
        self.delay.delay_ms(ACTIVATE_SETTLE_MS);

        self.initialized = true;
        Ok(())
    }

    /// Read the six data registers, one at a time, IR_DATA_LOW first
    ///
    /// The first failed read aborts the call and the partial data is dropped.
    pub fn read_raw(&mut self) -> Result<RawRegisters, Error<BusError<O>>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let mut bytes = [0u8; DATA_LEN];
        for (address, byte) in (IR_DATA_LOW..).zip(bytes.iter_mut()) {
            *byte = self.read_register(address)?;
        }
        Ok(RawRegisters::new(bytes))
    }

    /// Read and decode one IR / ALS / PS sample
    pub fn read_sample(&mut self) -> Result<SensorSample, Error<BusError<O>>> {
        self.read_raw().map(SensorSample::from)
    }

    // Helper methods for register access
    fn read_register(&mut self, address: u8) -> Result<u8, Error<BusError<O>>> {
        let bus = self.bus.as_mut().ok_or(Error::NotInitialized)?;
        let mut buffer = [0u8; 1];
        bus.write_read(I2C_ADDRESS, &[address], &mut buffer)
            .map_err(Error::BusRead)?;
        Ok(buffer[0])
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), Error<BusError<O>>> {
        let bus = self.bus.as_mut().ok_or(Error::NotInitialized)?;
        bus.write(I2C_ADDRESS, &[address, value])
            .map_err(Error::BusWrite)
    }
}

#[cfg(feature = "async")]
impl<O, D> Ap3216c<O, D>
where
    O: BusOpener,
    O::Bus: AsyncI2c,
    D: AsyncDelayNs,
{
    /// Open the bus, reset the chip and activate ALS, PS and IR conversions (async version)
    pub async fn initialize_async(&mut self) -> Result<(), Error<BusError<O>>> {
        self.initialized = false;
        self.open()?;

        self.write_register_async(SYSTEM_CONFIG, Mode::SwReset as u8)
            .await?;
        self.delay.delay_ms(RESET_SETTLE_MS).await;

        self.write_register_async(SYSTEM_CONFIG, Mode::AlsPsIrActive as u8)
            .await?;
        self.delay.delay_ms(ACTIVATE_SETTLE_MS).await;

        self.initialized = true;
        Ok(())
    }

    /// Read the six data registers, one at a time (async version)
    pub async fn read_raw_async(&mut self) -> Result<RawRegisters, Error<BusError<O>>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let mut bytes = [0u8; DATA_LEN];
        for (address, byte) in (IR_DATA_LOW..).zip(bytes.iter_mut()) {
            *byte = self.read_register_async(address).await?;
        }
        Ok(RawRegisters::new(bytes))
    }

    /// Read and decode one IR / ALS / PS sample (async version)
    pub async fn read_sample_async(&mut self) -> Result<SensorSample, Error<BusError<O>>> {
        self.read_raw_async().await.map(SensorSample::from)
    }

    // Helper methods for async register access
    async fn read_register_async(&mut self, address: u8) -> Result<u8, Error<BusError<O>>> {
        let bus = self.bus.as_mut().ok_or(Error::NotInitialized)?;
        let mut buffer = [0u8; 1];
        bus.write_read(I2C_ADDRESS, &[address], &mut buffer)
            .await
            .map_err(Error::BusRead)?;
        Ok(buffer[0])
    }

    async fn write_register_async(
        &mut self,
        address: u8,
        value: u8,
    ) -> Result<(), Error<BusError<O>>> {
        let bus = self.bus.as_mut().ok_or(Error::NotInitialized)?;
        bus.write(I2C_ADDRESS, &[address, value])
            .await
            .map_err(Error::BusWrite)
    }
}
