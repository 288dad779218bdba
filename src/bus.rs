//! I2C bus lookup and device node paths.
//!
//! A bus may be named on the command line either by its number or by the
//! adapter name the kernel exposes in sysfs. Each `i2c-dev` adapter has an
//! entry `/sys/class/i2c-dev/i2c-N` whose `name` attribute holds that name.

use crate::error::{Error, Result};
use crate::options::parse_number;

use std::fs;
use std::path::{Path, PathBuf};

/// Highest bus number the i2c-dev minor space allows.
pub const MAX_BUS: u32 = 0xFFFFF;

/// Default location of the i2c-dev class directory.
pub const SYSFS_I2C_DEV: &str = "/sys/class/i2c-dev";

/// Default device directory.
pub const DEV_DIR: &str = "/dev";

/// An adapter found in sysfs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    /// Bus number.
    pub bus: u32,
    /// Adapter name as reported by the kernel.
    pub name: String,
}

/// Resolves bus tokens to bus numbers.
#[derive(Debug, Clone)]
pub struct BusResolver {
    sysfs_root: PathBuf,
}

impl Default for BusResolver {
    fn default() -> Self {
        Self::new(SYSFS_I2C_DEV)
    }
}

impl BusResolver {
    /// Create a resolver reading adapters from the given class directory.
    pub fn new(sysfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
        }
    }

    /// Resolve a bus token, either a number or an adapter name.
    pub fn lookup(&self, token: &str) -> Result<u32> {
        if let Some(number) = parse_number(token) {
            if number < 0 || number > MAX_BUS as i64 {
                return Err(Error::BusOutOfRange(number.unsigned_abs()));
            }
            return Ok(number as u32);
        }

        let adapters = self.adapters();
        let mut matches = adapters.iter().filter(|adapter| adapter.name == token);
        match (matches.next(), matches.next()) {
            (Some(adapter), None) => {
                log::debug!("bus: \"{}\" is i2c-{}", token, adapter.bus);
                Ok(adapter.bus)
            }
            (Some(_), Some(_)) => Err(Error::BusNotUnique(token.to_string())),
            (None, _) => Err(Error::BusNotFound(token.to_string())),
        }
    }

    /// List adapters present in sysfs, sorted by bus number.
    ///
    /// Entries that are not `i2c-N` or lack a readable `name` are skipped.
    pub fn adapters(&self) -> Vec<Adapter> {
        let entries = match fs::read_dir(&self.sysfs_root) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("bus: cannot read {}: {}", self.sysfs_root.display(), e);
                return Vec::new();
            }
        };

        let mut adapters: Vec<Adapter> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let bus = file_name.to_str()?.strip_prefix("i2c-")?.parse().ok()?;
                let name = fs::read_to_string(entry.path().join("name")).ok()?;
                Some(Adapter {
                    bus,
                    name: name.trim_end().to_string(),
                })
            })
            .collect();
        adapters.sort_by_key(|adapter| adapter.bus);
        adapters
    }
}

/// Resolve a bus token against the default sysfs location.
pub fn lookup_bus(token: &str) -> Result<u32> {
    BusResolver::default().lookup(token)
}

/// Candidate device nodes for a bus, in the order they should be tried.
pub fn device_paths(bus: u32, dev_dir: &Path) -> [PathBuf; 2] {
    [
        dev_dir.join("i2c").join(bus.to_string()),
        dev_dir.join(format!("i2c-{}", bus)),
    ]
}
