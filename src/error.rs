use core::fmt;

/// An error type representing STSAFE-A110's erroneous conditions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Error {
    repr: Repr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Repr {
    Device(Status),
    Simple(ErrorKind),
}

impl Error {
    /// Response code reported by the device, if the error came from it.
    pub fn status(&self) -> Option<Status> {
        match self.repr {
            Repr::Device(status) => Some(status),
            Repr::Simple(_) => None,
        }
    }

    /// Local cause, if the error did not come from the device.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self.repr {
            Repr::Device(_) => None,
            Repr::Simple(kind) => Some(kind),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            repr: Repr::Simple(kind),
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Error {
        Error {
            repr: Repr::Device(status),
        }
    }
}

impl From<BusError> for Error {
    fn from(err: BusError) -> Error {
        match err {
            BusError::Nack => ErrorKind::BusNack.into(),
            BusError::Bus => ErrorKind::BusError.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Device(status) => write!(fmt, "{}", status.as_str()),
            Repr::Simple(kind) => write!(fmt, "{}", kind.as_str()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Response codes returned by the secure element or its middleware.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// frame was corrupted on the wire
    CommunicationError = 0x01,
    /// command data inconsistent with the command header
    InconsistentCommandData = 0x02,
    /// C-MAC sequence counter mismatch
    WrongMacCounter = 0x04,
    /// usage counter of the key reached its limit
    UseCounterLimitReached = 0x05,
    /// referenced key slot is empty
    KeyNotFound = 0x06,
    /// key is blocked after too many failed attempts
    KeyBlocked = 0x07,
    /// R-MAC/C-MAC verification failed
    WrongMac = 0x08,
    /// zone, record or certificate not found
    EntryNotFound = 0x09,
    /// access condition not satisfied
    NotAuthorized = 0x0A,
    /// command is not supported in the current life cycle state
    UnsupportedCommand = 0x0B,
    /// response status byte is unknown
    Unknown = 0xFF,
}

impl Status {
    pub fn from_u8(status: u8) -> Option<Self> {
        use Status::*;
        match status {
            0x00 => None,
            x if x == CommunicationError as u8 => CommunicationError.into(),
            x if x == InconsistentCommandData as u8 => InconsistentCommandData.into(),
            x if x == WrongMacCounter as u8 => WrongMacCounter.into(),
            x if x == UseCounterLimitReached as u8 => UseCounterLimitReached.into(),
            x if x == KeyNotFound as u8 => KeyNotFound.into(),
            x if x == KeyBlocked as u8 => KeyBlocked.into(),
            x if x == WrongMac as u8 => WrongMac.into(),
            x if x == EntryNotFound as u8 => EntryNotFound.into(),
            x if x == NotAuthorized as u8 => NotAuthorized.into(),
            x if x == UnsupportedCommand as u8 => UnsupportedCommand.into(),
            _ => Unknown.into(),
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    fn as_str(&self) -> &'static str {
        use Status::*;
        match self {
            CommunicationError => "communication error, frame corrupted on the wire",
            InconsistentCommandData => "command data inconsistent with the command header",
            WrongMacCounter => "wrong C-MAC sequence counter",
            UseCounterLimitReached => "key usage counter limit reached",
            KeyNotFound => "key slot is empty",
            KeyBlocked => "key is blocked",
            WrongMac => "MAC verification failed",
            EntryNotFound => "entry not found",
            NotAuthorized => "access condition not satisfied",
            UnsupportedCommand => "command not supported in the current state",
            Unknown => "response contains unknown non-zero status code",
        }
    }
}

/// A list of specific error causes. Each kind is converted into `Error` type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Device did not acknowledge its address or data
    BusNack,
    /// Bus transport failure or timeout
    BusError,
    /// bad argument (out of range, zero length, etc.)
    BadParam,
    /// Supplied buffer is too small for data required
    SmallBuffer,
    /// Offset or size does not fit the device's address space
    InvalidSize,
    /// Stored certificate is not a well-formed P-256 X.509 certificate
    BadCertificate,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            BusNack => "device did not acknowledge on the bus",
            BusError => "bus transport failure",
            BadParam => "bad argument (out of range, zero length, etc.)",
            SmallBuffer => "supplied buffer is too small for data required",
            InvalidSize => "offset or size exceeds the zone address space",
            BadCertificate => "stored certificate is malformed or not a P-256 certificate",
        }
    }
}

/// Outcome of a single bus primitive besides success.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The device did not acknowledge.
    Nack,
    /// Any other transport failure, including timeouts.
    Bus,
}

impl BusError {
    pub(crate) fn from_i2c<E: embedded_hal::i2c::Error>(err: &E) -> Self {
        match err.kind() {
            embedded_hal::i2c::ErrorKind::NoAcknowledge(_) => BusError::Nack,
            _ => BusError::Bus,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Nack => write!(fmt, "nack"),
            BusError::Bus => write!(fmt, "bus error"),
        }
    }
}
