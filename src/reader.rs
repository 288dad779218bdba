//! Core reader trait and implementation.
//!
//! This module provides the [`BlockReader`] trait which runs the complete
//! read pipeline against any [`BusOpener`]: validate the options, open the
//! bus, bind the chip address, check the adapter functionality, negotiate
//! PEC and issue the block transaction.

use crate::device::{BusOpener, Functionality, SmbusDevice};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::state::{Block, State};

/// Warning issued when PEC is requested on an adapter that does not
/// advertise it.
pub const PEC_UNSUPPORTED: &str = "Adapter does not seem to support PEC";

/// Trait for reading a block of bytes from an I2C peripheral.
///
/// # Example
///
/// ```no_run
/// use i2cget_block::{BlockReader, LinuxOpener, Options};
///
/// let opts = Options::new(1, 0x50).with_register(Some(0x10));
/// let state = LinuxOpener::default().read_block(&opts).unwrap();
/// println!("{}", state.data);
/// ```
pub trait BlockReader {
    /// Read `options.block_size` bytes from the peripheral.
    ///
    /// The bus handle is released before this returns, on success and on
    /// every failure after the device was opened.
    fn read_block(&self, options: &Options) -> Result<State>;
}

impl<O: BusOpener> BlockReader for O {
    fn read_block(&self, options: &Options) -> Result<State> {
        ReadContext::new(self, options).read()
    }
}

/// Internal helper to perform the actual read operation.
struct ReadContext<'a, O> {
    opener: &'a O,
    options: &'a Options,
}

impl<'a, O: BusOpener> ReadContext<'a, O> {
    fn new(opener: &'a O, options: &'a Options) -> Self {
        Self { opener, options }
    }

    fn read(&self) -> Result<State> {
        self.options.validate()?;

        let mut device = self.opener.open(self.options.bus)?;
        self.bind(&mut device)?;
        let pec_supported = self.check_functionality(&mut device)?;
        self.negotiate_pec(&mut device)?;

        let mut warnings = Vec::new();
        if self.options.pec && !pec_supported {
            warnings.push(PEC_UNSUPPORTED);
        }

        let mut data = Block::default();
        let block_size = self.options.block_size;
        let result = device.read_block(self.options.register, data.window(block_size));
        drop(device);

        let count = result.map_err(Error::ReadFailed)?;
        data.set_len(count.min(block_size));
        log::debug!("reader: received {} of {} bytes", data.len(), block_size);

        Ok(State {
            bus: self.options.bus,
            address: self.options.address,
            register: self.options.register,
            data,
            pec_supported,
            warnings,
        })
    }

    /// Bind the handle to the chip address.
    fn bind(&self, device: &mut O::Device) -> Result<()> {
        let address = self.options.address;
        device
            .bind(address, self.options.force)
            .map_err(|source| Error::SetAddressFailed { address, source })?;
        log::debug!(
            "reader: bound to 0x{:02x}{}",
            address,
            if self.options.force { " (forced)" } else { "" }
        );
        Ok(())
    }

    /// Check that the adapter can run the transaction.
    ///
    /// Returns whether PEC is supported. A missing PEC capability only
    /// produces a warning, written straight to standard error so that log
    /// filtering cannot hide it.
    fn check_functionality(&self, device: &mut O::Device) -> Result<bool> {
        let funcs = device
            .functionality()
            .map_err(Error::FunctionalityFailed)?;
        log::debug!("reader: adapter functionality {:#010x}", funcs.bits());

        if !funcs.contains(BLOCK_READ) {
            return Err(Error::MissingCapability(BLOCK_READ_NAME));
        }

        let pec_supported = funcs.intersects(Functionality::SMBUS_PEC | Functionality::I2C);
        if self.options.pec && !pec_supported {
            eprintln!("Warning: {}", PEC_UNSUPPORTED);
        }
        Ok(pec_supported)
    }

    /// Enable PEC on the handle if requested.
    fn negotiate_pec(&self, device: &mut O::Device) -> Result<()> {
        if !self.options.pec {
            return Ok(());
        }
        device.set_pec(true).map_err(Error::SetPecFailed)?;
        log::debug!("reader: PEC enabled");
        Ok(())
    }
}

/// Capability every read needs: `I2C_FUNC_SMBUS_READ_I2C_BLOCK`, the
/// command-addressed block read issued with or without a register.
const BLOCK_READ: Functionality = Functionality::SMBUS_READ_I2C_BLOCK;

/// Diagnostic name of [`BLOCK_READ`].
const BLOCK_READ_NAME: &str = "SMBus read block";
