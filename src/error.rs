use crate::i2c::I2cAddress;
use embedded_hal::i2c::{self as hal_i2c, ErrorKind, NoAcknowledgeSource};
use std::fmt;
use thiserror::Error;

/// Boxed transport error carried as the source of a failed register write.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when using the test bench toolkit.
///
/// This enum covers DAC configuration and register writes, the XR2280x
/// bridge transport, and the reporting helpers.
#[derive(Error, Debug)]
pub enum Error {
    /// The reset or control register write issued during construction failed.
    /// The controller was not created and must not be retried in place.
    #[error("Failed to initialize AD5693 at {address}: {source}")]
    DeviceInit {
        /// Address of the DAC that failed to initialize.
        address: I2cAddress,
        /// The register write that failed.
        #[source]
        source: Box<Error>,
    },
    /// A register write failed at the transport level. Nothing was retried.
    #[error("Error sending command to register 0x{register:02X}: {source}")]
    BusWrite {
        /// The register (command byte) being written.
        register: u8,
        /// Bus-level classification of the failure.
        kind: ErrorKind,
        /// The original transport error, as a [`HalError`].
        #[source]
        source: TransportError,
    },
    /// Reference voltage must be finite and strictly positive.
    #[error("Invalid reference voltage {0} V: must be finite and > 0")]
    InvalidReferenceVoltage(f64),
    /// The value could not be turned into an I2C device address.
    #[error("Invalid I2C address: {0}")]
    InvalidAddress(String),
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// Error from the underlying HID API layer.
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// No XR2280x I2C bridge was found.
    #[error("No XR2280x I2C bridge found")]
    DeviceNotFound,
    /// No bridge is attached under the requested bus number.
    #[error("I2C bus {bus_number} not found: {message}")]
    BusNotFound {
        /// The 1-based bus number that was requested.
        bus_number: usize,
        /// Additional error details.
        message: String,
    },
    /// General I/O error during device communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid or malformed HID report received from the bridge.
    #[error("Invalid HID report received or unexpected size ({0} bytes)")]
    InvalidReport(usize),
    /// I2C slave device responded with NACK (not acknowledged).
    #[error("No device acknowledged at I2C address {address} (NACK). Check wiring and the A0 pin strap.")]
    I2cNack {
        /// The I2C address that sent the NACK.
        address: I2cAddress,
    },
    /// I2C bus arbitration was lost during transaction.
    #[error("I2C bus conflict at address {address}: arbitration lost")]
    I2cArbitrationLost {
        /// The I2C address being accessed when arbitration was lost.
        address: I2cAddress,
    },
    /// I2C bus timeout occurred during transaction.
    #[error("I2C timeout at address {address}: device did not respond within timeout period")]
    I2cTimeout {
        /// The I2C address being accessed when timeout occurred.
        address: I2cAddress,
    },
    /// The bridge firmware rejected the transfer parameters.
    #[error("I2C request error at address {address}: invalid parameters sent to XR2280x firmware")]
    I2cRequestError {
        /// The I2C address being accessed when the error occurred.
        address: I2cAddress,
    },
    /// I2C transaction failed with unknown error condition.
    #[error("I2C unknown error at address {address} (Status: 0x{flags:02X})")]
    I2cUnknownError {
        /// The I2C address being accessed when the error occurred.
        address: I2cAddress,
        /// Raw status flags from the bridge.
        flags: u8,
    },
    /// Requested operation exceeds device or protocol limits.
    #[error("Requested operation size is too large (max {max}, got {actual})")]
    OperationTooLarge {
        /// Maximum allowed size for this operation.
        max: usize,
        /// Actual size requested.
        actual: usize,
    },
    /// Key missing (or null) in the source mapping of a merge.
    #[error("{0} key not found in input dictionary")]
    KeyNotFound(String),
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

// Lets infallible conversions (e.g. an `I2cAddress` passed as-is) use `?`.
impl From<std::convert::Infallible> for Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl Error {
    /// Wraps a transport failure for the given register.
    pub(crate) fn bus_write<E>(register: u8, source: E) -> Self
    where
        E: hal_i2c::Error + Send + Sync + 'static,
    {
        Error::BusWrite {
            register,
            kind: source.kind(),
            source: Box::new(HalError(source)),
        }
    }

    /// Returns the original transport error of a [`Error::BusWrite`], if this is one.
    pub fn transport_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::BusWrite { source, .. } => Some(source.as_ref()),
            Error::DeviceInit { source, .. } => source.transport_error(),
            _ => None,
        }
    }
}

/// An `embedded-hal` I2C error carried as a [`std::error::Error`].
///
/// `embedded_hal::i2c::Error` only requires `Debug`; this keeps the original
/// value so callers can `downcast_ref::<HalError<E>>()` and inspect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalError<E>(pub E);

impl<E: hal_i2c::Error> fmt::Display for HalError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.0.kind(), self.0)
    }
}

impl<E: hal_i2c::Error> std::error::Error for HalError<E> {}

impl hal_i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::I2cNack { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Error::I2cArbitrationLost { .. } => ErrorKind::ArbitrationLoss,
            Error::BusWrite { kind, .. } => *kind,
            _ => ErrorKind::Other,
        }
    }
}
