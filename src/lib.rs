//! # i2cget-block
//!
//! A Rust crate for reading a block of bytes from an I2C/SMBus peripheral
//! through the Linux `i2c-dev` interface.
//!
//! ## Overview
//!
//! `i2cget-block` opens the `/dev/i2c-N` character device of an adapter, binds
//! it to a chip address and issues a single SMBus block read, addressed by a
//! register (command byte) when one is given. The pipeline:
//!
//! - Resolves the bus by number or by adapter name via sysfs
//! - Validates the chip address, register and block size before any I/O
//! - Checks the adapter functionality matrix (`I2C_FUNCS`)
//! - Optionally enables packet error checking (`I2C_PEC`)
//! - Reads at most 32 bytes in one transaction (`I2C_SMBUS`)
//!
//! ## Example
//!
//! ```no_run
//! use i2cget_block::{BlockReader, LinuxOpener, Options};
//!
//! let opts = Options::new(1, 0x50)
//!     .with_register(Some(0x10))
//!     .with_block_size(4);
//! let state = LinuxOpener::default().read_block(&opts).unwrap();
//! println!("{}", state.data);
//! ```
//!
//! ## Safety
//!
//! Access to `/dev/i2c-N` usually requires root or membership in the `i2c`
//! group. Forcing a bind (`Options::force`) on an address claimed by a kernel
//! driver can confuse that driver.

pub mod bus;
pub mod device;
pub mod error;
mod options;
mod reader;
mod state;

pub use bus::{lookup_bus, BusResolver};
pub use device::{BusOpener, Functionality, I2cDevice, LinuxOpener, SmbusDevice};
pub use error::{Error, Result};
pub use options::{
    parse_address, parse_block_size, parse_number, parse_register, Options, DEFAULT_BLOCK_SIZE,
    MAX_ADDRESS, MAX_BLOCK_SIZE, MIN_ADDRESS, MIN_BLOCK_SIZE,
};
pub use reader::{BlockReader, PEC_UNSUPPORTED};
pub use state::{Block, State};
