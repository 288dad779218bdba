//! Error types for i2cget-block operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit status for usage, validation and setup failures.
pub const EXIT_SETUP: i32 = 1;

/// Exit status for a failed block transaction.
pub const EXIT_TRANSACTION: i32 = 2;

/// Errors raised while resolving, opening or reading an I2C device.
#[derive(Debug, Error)]
pub enum Error {
    /// The bus token is neither a number nor a known adapter name.
    #[error("I2C bus name doesn't match any bus present!")]
    BusNotFound(String),

    /// More than one adapter carries the requested name.
    #[error("I2C bus name is not unique!")]
    BusNotUnique(String),

    /// Numeric bus identifier above the i2c-dev minor range.
    #[error("I2C bus out of range!")]
    BusOutOfRange(u64),

    /// The chip address token is not a number.
    #[error("Chip address is not a number!")]
    AddressNotNumber(String),

    /// The chip address lies outside the general-use 7-bit range.
    #[error("Chip address out of range (0x{min:02x}-0x{max:02x})!")]
    AddressOutOfRange { address: i64, min: u16, max: u16 },

    /// Malformed or out-of-range register (data) address.
    #[error("Data address invalid!")]
    InvalidRegister(String),

    /// Malformed or out-of-range block size.
    #[error("Invalid block size \"{0}\"!")]
    InvalidBlockSize(String),

    /// None of the candidate device nodes could be opened.
    #[error("Could not open file `{}': {source}{}", path.display(), hint(source))]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `I2C_SLAVE` / `I2C_SLAVE_FORCE` was rejected.
    #[error("Could not set address to 0x{address:02x}: {source}")]
    SetAddressFailed {
        address: u16,
        #[source]
        source: io::Error,
    },

    /// `I2C_FUNCS` failed.
    #[error("Could not get the adapter functionality matrix: {0}")]
    FunctionalityFailed(#[source] io::Error),

    /// The adapter lacks a capability the transaction needs.
    #[error("Adapter does not have {0} capability")]
    MissingCapability(&'static str),

    /// `I2C_PEC` was rejected.
    #[error("Could not set PEC: {0}")]
    SetPecFailed(#[source] io::Error),

    /// The block transaction itself failed.
    #[error("Read failed")]
    ReadFailed(#[source] io::Error),
}

fn hint(source: &io::Error) -> &'static str {
    if source.kind() == io::ErrorKind::PermissionDenied {
        " (run as root?)"
    } else {
        ""
    }
}

impl Error {
    /// Whether the error stems from the command line and the usage text
    /// should be shown.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::BusNotFound(_)
                | Error::BusNotUnique(_)
                | Error::BusOutOfRange(_)
                | Error::AddressNotNumber(_)
                | Error::AddressOutOfRange { .. }
                | Error::InvalidRegister(_)
                | Error::InvalidBlockSize(_)
        )
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ReadFailed(_) => EXIT_TRANSACTION,
            _ => EXIT_SETUP,
        }
    }
}

/// Result type for i2cget-block operations.
pub type Result<T> = std::result::Result<T, Error>;
