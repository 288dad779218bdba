//! Linux i2c-dev device access.
//!
//! This module provides the [`SmbusDevice`] and [`BusOpener`] traits the
//! read pipeline runs against, and their implementation on top of the
//! `/dev/i2c-N` character devices.

use crate::bus::{device_paths, DEV_DIR};
use crate::error::{Error, Result};

use bitflags::bitflags;

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Largest block an SMBus transfer can carry.
pub const I2C_SMBUS_BLOCK_MAX: usize = 32;

/// Command byte sent when no register is addressed.
pub const UNSET_REGISTER_COMMAND: u8 = 0xff;

bitflags! {
    /// Adapter functionality bits reported by `I2C_FUNCS`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Functionality: u64 {
        /// Plain I2C transfers.
        const I2C = 0x0000_0001;
        /// 10-bit addressing.
        const TEN_BIT_ADDR = 0x0000_0002;
        /// Protocol mangling flags.
        const PROTOCOL_MANGLING = 0x0000_0004;
        /// SMBus packet error checking.
        const SMBUS_PEC = 0x0000_0008;
        /// SMBus quick command.
        const SMBUS_QUICK = 0x0001_0000;
        /// SMBus receive byte.
        const SMBUS_READ_BYTE = 0x0002_0000;
        /// SMBus read byte data.
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        /// SMBus read word data.
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        /// SMBus read block data.
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        /// SMBus write block data.
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        /// I2C block read addressed by a command byte.
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000;
        /// I2C block write addressed by a command byte.
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000;
    }
}

/// A bus handle bound (or about to be bound) to one peripheral.
///
/// Dropping the value releases the handle.
pub trait SmbusDevice {
    /// Select the peripheral address for subsequent transfers.
    ///
    /// With `force`, bind even if a kernel driver claims the address.
    fn bind(&mut self, address: u16, force: bool) -> io::Result<()>;

    /// Query the adapter functionality matrix.
    fn functionality(&mut self) -> io::Result<Functionality>;

    /// Enable or disable packet error checking.
    fn set_pec(&mut self, enable: bool) -> io::Result<()>;

    /// Issue one block read of up to `buf.len()` bytes.
    ///
    /// `None` reads without addressing a specific register. Returns the number of bytes received.
    fn read_block(&mut self, register: Option<u8>, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens bus handles by bus number.
pub trait BusOpener {
    /// Handle type produced by this opener.
    type Device: SmbusDevice;

    /// Open the adapter device for `bus`.
    fn open(&self, bus: u32) -> Result<Self::Device>;
}

/// Linux i2c-dev ioctl definitions (`linux/i2c-dev.h`).
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_write_int_bad, ioctl_write_ptr_bad};

    const I2C_SLAVE: u16 = 0x0703;
    const I2C_SLAVE_FORCE: u16 = 0x0706;
    const I2C_FUNCS: u16 = 0x0705;
    const I2C_PEC: u16 = 0x0708;
    const I2C_SMBUS: u16 = 0x0720;

    pub const I2C_SMBUS_READ: u8 = 1;
    pub const I2C_SMBUS_I2C_BLOCK_BROKEN: u32 = 6;
    pub const I2C_SMBUS_I2C_BLOCK_DATA: u32 = 8;

    /// `union i2c_smbus_data`, used only through its block member.
    #[repr(C)]
    pub struct I2cSmbusData {
        pub block: [u8; super::I2C_SMBUS_BLOCK_MAX + 2],
    }

    /// `struct i2c_smbus_ioctl_data`.
    #[repr(C)]
    pub struct I2cSmbusIoctlData {
        pub read_write: u8,
        pub command: u8,
        pub size: u32,
        pub data: *mut I2cSmbusData,
    }

    ioctl_write_int_bad!(i2c_slave, I2C_SLAVE);
    ioctl_write_int_bad!(i2c_slave_force, I2C_SLAVE_FORCE);
    ioctl_read_bad!(i2c_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_int_bad!(i2c_pec, I2C_PEC);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, I2cSmbusIoctlData);
}

fn os_error(e: nix::errno::Errno) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}

/// An open `/dev/i2c-N` handle.
#[derive(Debug)]
pub struct I2cDevice {
    path: PathBuf,
    file: File,
}

impl I2cDevice {
    /// Open a device node read/write.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the opened device node.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SmbusDevice for I2cDevice {
    fn bind(&mut self, address: u16, force: bool) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        let address = address as libc::c_int;
        unsafe {
            if force {
                ioctl::i2c_slave_force(fd, address).map_err(os_error)?;
            } else {
                ioctl::i2c_slave(fd, address).map_err(os_error)?;
            }
        }
        Ok(())
    }

    fn functionality(&mut self) -> io::Result<Functionality> {
        let fd = self.file.as_raw_fd();
        let mut funcs: libc::c_ulong = 0;
        unsafe {
            ioctl::i2c_funcs(fd, &mut funcs).map_err(os_error)?;
        }
        Ok(Functionality::from_bits_retain(funcs as u64))
    }

    fn set_pec(&mut self, enable: bool) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::i2c_pec(fd, enable as libc::c_int).map_err(os_error)?;
        }
        Ok(())
    }

    fn read_block(&mut self, register: Option<u8>, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(I2C_SMBUS_BLOCK_MAX);
        let mut data = ioctl::I2cSmbusData {
            block: [0; I2C_SMBUS_BLOCK_MAX + 2],
        };
        data.block[0] = len as u8;

        let args = ioctl::I2cSmbusIoctlData {
            read_write: ioctl::I2C_SMBUS_READ,
            command: command_byte(register),
            size: smbus_block_size(len),
            data: &mut data,
        };

        let fd = self.file.as_raw_fd();
        unsafe {
            ioctl::i2c_smbus(fd, &args).map_err(os_error)?;
        }

        let count = (data.block[0] as usize).min(len);
        buf[..count].copy_from_slice(&data.block[1..=count]);
        Ok(count)
    }
}

/// Command byte for a block read of `register`.
fn command_byte(register: Option<u8>) -> u8 {
    register.unwrap_or(UNSET_REGISTER_COMMAND)
}

/// Transaction size code for an I2C block read of `len` bytes.
///
/// Full 32-byte reads use the legacy code, which the kernel treats as a
/// request for the maximum block.
fn smbus_block_size(len: usize) -> u32 {
    if len == I2C_SMBUS_BLOCK_MAX {
        ioctl::I2C_SMBUS_I2C_BLOCK_BROKEN
    } else {
        ioctl::I2C_SMBUS_I2C_BLOCK_DATA
    }
}

/// Opens i2c-dev nodes under a device directory.
#[derive(Debug, Clone)]
pub struct LinuxOpener {
    dev_dir: PathBuf,
}

impl Default for LinuxOpener {
    fn default() -> Self {
        Self::new(DEV_DIR)
    }
}

impl LinuxOpener {
    /// Create an opener looking for nodes under `dev_dir`.
    pub fn new(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }
}

impl BusOpener for LinuxOpener {
    type Device = I2cDevice;

    fn open(&self, bus: u32) -> Result<I2cDevice> {
        let [primary, fallback] = device_paths(bus, &self.dev_dir);

        match I2cDevice::open(&primary) {
            Ok(device) => {
                log::debug!("device: opened {}", primary.display());
                return Ok(device);
            }
            Err(e) if matches!(e.raw_os_error(), Some(libc::ENOENT) | Some(libc::ENOTDIR)) => {}
            Err(e) => {
                return Err(Error::OpenFailed {
                    path: primary,
                    source: e,
                })
            }
        }

        let device = I2cDevice::open(&fallback).map_err(|e| Error::OpenFailed {
            path: fallback.clone(),
            source: e,
        })?;
        log::debug!("device: opened {}", fallback.display());
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functionality_bits() {
        let funcs = Functionality::from_bits_retain(0x0c00_0001);
        assert!(funcs.contains(Functionality::I2C));
        assert!(funcs.contains(Functionality::SMBUS_READ_I2C_BLOCK));
        assert!(!funcs.contains(Functionality::SMBUS_PEC));
        assert!(!funcs.intersects(Functionality::SMBUS_PEC | Functionality::SMBUS_READ_BLOCK_DATA));
    }

    #[test]
    fn test_command_byte() {
        assert_eq!(command_byte(Some(0x10)), 0x10);
        assert_eq!(command_byte(Some(0)), 0);
        assert_eq!(command_byte(None), UNSET_REGISTER_COMMAND);
    }

    #[test]
    fn test_smbus_block_size() {
        assert_eq!(smbus_block_size(1), ioctl::I2C_SMBUS_I2C_BLOCK_DATA);
        assert_eq!(smbus_block_size(31), ioctl::I2C_SMBUS_I2C_BLOCK_DATA);
        assert_eq!(smbus_block_size(32), ioctl::I2C_SMBUS_I2C_BLOCK_BROKEN);
    }

    #[test]
    fn test_open_missing_bus() {
        let dir = tempfile::tempdir().unwrap();
        let opener = LinuxOpener::new(dir.path());
        let err = opener.open(5).unwrap_err();
        match err {
            Error::OpenFailed { path, source } => {
                assert_eq!(path, dir.path().join("i2c-5"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_open_prefers_i2c_subdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("i2c")).unwrap();
        std::fs::write(dir.path().join("i2c").join("2"), b"").unwrap();
        std::fs::write(dir.path().join("i2c-2"), b"").unwrap();

        let device = LinuxOpener::new(dir.path()).open(2).unwrap();
        assert_eq!(device.path(), dir.path().join("i2c").join("2"));
    }

    #[test]
    fn test_open_fallback_node() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("i2c-4"), b"").unwrap();

        let device = LinuxOpener::new(dir.path()).open(4).unwrap();
        assert_eq!(device.path(), dir.path().join("i2c-4"));
    }
}
