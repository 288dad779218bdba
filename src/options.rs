//! Configuration options and argument validation for block reads.

use crate::error::{Error, Result};

/// Smallest block that may be requested.
pub const MIN_BLOCK_SIZE: usize = 1;

/// Largest block that may be requested, also the receive buffer capacity.
pub const MAX_BLOCK_SIZE: usize = 32;

/// Block size used when none is given.
pub const DEFAULT_BLOCK_SIZE: usize = 4;

/// Lowest chip address open for general use.
pub const MIN_ADDRESS: u16 = 0x03;

/// Highest chip address open for general use.
pub const MAX_ADDRESS: u16 = 0x77;

/// Suffix on the size token that requests packet error checking.
pub const PEC_SUFFIX: char = 'p';

/// Options for a single block read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// I2C adapter number (`/dev/i2c-N`).
    pub bus: u32,

    /// 7-bit chip address of the peripheral.
    pub address: u16,

    /// Register (command byte) to read from.
    ///
    /// `None` reads from the device without addressing a register.
    pub register: Option<u8>,

    /// Number of bytes to request.
    pub block_size: usize,

    /// Enable SMBus packet error checking for the transaction.
    pub pec: bool,

    /// Bind to the address even if a kernel driver already claims it.
    pub force: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bus: 0,
            address: MIN_ADDRESS,
            register: None,
            block_size: DEFAULT_BLOCK_SIZE,
            pec: false,
            force: false,
        }
    }
}

impl Options {
    /// Create options for the given bus and chip address with default values.
    pub fn new(bus: u32, address: u16) -> Self {
        Self {
            bus,
            address,
            ..Default::default()
        }
    }

    /// Set the register to read from.
    pub fn with_register(mut self, register: Option<u8>) -> Self {
        self.register = register;
        self
    }

    /// Set the number of bytes to request.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable packet error checking.
    pub fn with_pec(mut self, pec: bool) -> Self {
        self.pec = pec;
        self
    }

    /// Enable or disable forced binding.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Apply an optional `SIZE[p]` token, leaving the defaults when absent.
    pub fn with_size_arg(self, size: Option<&str>) -> Result<Self> {
        match size {
            Some(token) => {
                let (block_size, pec) = parse_block_size(token)?;
                Ok(self.with_block_size(block_size).with_pec(pec))
            }
            None => Ok(self),
        }
    }

    /// Check the range invariants before any device is touched.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ADDRESS..=MAX_ADDRESS).contains(&self.address) {
            return Err(Error::AddressOutOfRange {
                address: self.address as i64,
                min: MIN_ADDRESS,
                max: MAX_ADDRESS,
            });
        }
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(Error::InvalidBlockSize(self.block_size.to_string()));
        }
        Ok(())
    }
}

/// Parse a whole token as an integer using `strtol` base-0 rules.
///
/// Accepts an optional sign, a `0x`/`0X` prefix for hexadecimal and a leading
/// `0` for octal. Returns `None` if any character is left over.
pub fn parse_number(token: &str) -> Option<i64> {
    let token = token.trim_start();
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let value = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// Parse and range-check a chip address.
pub fn parse_address(token: &str) -> Result<u16> {
    let address = parse_number(token).ok_or_else(|| Error::AddressNotNumber(token.to_string()))?;
    if address < MIN_ADDRESS as i64 || address > MAX_ADDRESS as i64 {
        return Err(Error::AddressOutOfRange {
            address,
            min: MIN_ADDRESS,
            max: MAX_ADDRESS,
        });
    }
    Ok(address as u16)
}

/// Parse and range-check a register address in `[0, 0xff]`.
pub fn parse_register(token: &str) -> Result<u8> {
    match parse_number(token) {
        Some(value) if (0..=0xff).contains(&value) => Ok(value as u8),
        _ => Err(Error::InvalidRegister(token.to_string())),
    }
}

/// Parse a `SIZE[p]` token into the block size and the PEC flag.
pub fn parse_block_size(token: &str) -> Result<(usize, bool)> {
    let (number, pec) = match token.strip_suffix(PEC_SUFFIX) {
        Some(number) => (number, true),
        None => (token, false),
    };

    match parse_number(number) {
        Some(value) if (MIN_BLOCK_SIZE as i64..=MAX_BLOCK_SIZE as i64).contains(&value) => {
            Ok((value as usize, pec))
        }
        _ => Err(Error::InvalidBlockSize(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::new(1, 0x50);
        assert_eq!(opts.bus, 1);
        assert_eq!(opts.address, 0x50);
        assert_eq!(opts.register, None);
        assert_eq!(opts.block_size, DEFAULT_BLOCK_SIZE);
        assert!(!opts.pec);
        assert!(!opts.force);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let opts = Options::new(3, 0x20)
            .with_register(Some(0))
            .with_block_size(32)
            .with_pec(true)
            .with_force(true);

        assert_eq!(opts.register, Some(0));
        assert_eq!(opts.block_size, 32);
        assert!(opts.pec);
        assert!(opts.force);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Options::new(0, 0x02).validate().is_err());
        assert!(Options::new(0, 0x78).validate().is_err());
        assert!(Options::new(0, 0x03).validate().is_ok());
        assert!(Options::new(0, 0x77).validate().is_ok());
        assert!(Options::new(0, 0x50).with_block_size(0).validate().is_err());
        assert!(Options::new(0, 0x50).with_block_size(33).validate().is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("16"), Some(16));
        assert_eq!(parse_number("0x10"), Some(16));
        assert_eq!(parse_number("0X1f"), Some(31));
        assert_eq!(parse_number("020"), Some(16));
        assert_eq!(parse_number("0"), Some(0));
        assert_eq!(parse_number("-1"), Some(-1));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("09"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x50").unwrap(), 0x50);
        assert_eq!(parse_address("3").unwrap(), 0x03);
        assert!(matches!(
            parse_address("foo"),
            Err(Error::AddressNotNumber(_))
        ));
        assert!(matches!(
            parse_address("0x78"),
            Err(Error::AddressOutOfRange { address: 0x78, .. })
        ));
        assert!(matches!(
            parse_address("0x02"),
            Err(Error::AddressOutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_register() {
        assert_eq!(parse_register("0").unwrap(), 0);
        assert_eq!(parse_register("0xff").unwrap(), 0xff);
        assert!(parse_register("0x100").is_err());
        assert!(parse_register("-1").is_err());
        assert!(parse_register("0x1g").is_err());
    }

    #[test]
    fn test_parse_block_size() {
        assert_eq!(parse_block_size("4").unwrap(), (4, false));
        assert_eq!(parse_block_size("32").unwrap(), (32, false));
        assert_eq!(parse_block_size("8p").unwrap(), (8, true));
        assert_eq!(parse_block_size("0x10p").unwrap(), (16, true));
        assert!(parse_block_size("99").is_err());
        assert!(parse_block_size("0").is_err());
        assert!(parse_block_size("33p").is_err());
        assert!(parse_block_size("p").is_err());
        assert!(parse_block_size("4pp").is_err());
        assert!(parse_block_size("4x").is_err());
    }

    #[test]
    fn test_size_arg() {
        let opts = Options::new(1, 0x50).with_size_arg(None).unwrap();
        assert_eq!(opts.block_size, DEFAULT_BLOCK_SIZE);
        assert!(!opts.pec);

        let opts = Options::new(1, 0x50).with_size_arg(Some("16p")).unwrap();
        assert_eq!(opts.block_size, 16);
        assert!(opts.pec);

        let err = Options::new(1, 0x50).with_size_arg(Some("99")).unwrap_err();
        assert!(err.is_usage());
    }
}
