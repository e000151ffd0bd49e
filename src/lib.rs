#![cfg_attr(not(any(test, feature = "std")), no_std)]
mod fmt;

pub mod cert;
pub mod config;
mod crc16;
pub mod error;
pub mod hal;
pub mod provision;
pub mod session;

pub use cert::{cert_size, retrieve_cert, retrieve_cert_vec, DeviceCertificate};
pub use config::{BusConfig, Pins, ResetTiming};
pub use crc16::{checksum, compute as crc_compute, CRC16_X25};
pub use error::{BusError, Error, ErrorKind, Status};
pub use hal::{Adapter, BusDriver, HwServices, Preconfigured};
pub use provision::{check_host_keys, check_local_envelope_key, EnvelopeKeyReport, HostKeys};
pub use session::{Session, Zone};
