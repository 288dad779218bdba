//! State returned from read operations.

use crate::options::MAX_BLOCK_SIZE;

use std::fmt;

/// Bytes received from a block transaction.
///
/// Backed by a fixed buffer of [`MAX_BLOCK_SIZE`] bytes; only the first
/// `len` bytes were filled by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    buf: [u8; MAX_BLOCK_SIZE],
    len: usize,
}

impl Default for Block {
    fn default() -> Self {
        Self {
            buf: [0; MAX_BLOCK_SIZE],
            len: 0,
        }
    }
}

impl Block {
    /// Create a block holding a copy of `bytes`, truncated to the capacity.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut block = Self::default();
        let len = bytes.len().min(MAX_BLOCK_SIZE);
        block.buf[..len].copy_from_slice(&bytes[..len]);
        block.len = len;
        block
    }

    /// Writable window of the first `size` bytes for a transaction.
    pub(crate) fn window(&mut self, size: usize) -> &mut [u8] {
        &mut self.buf[..size.min(MAX_BLOCK_SIZE)]
    }

    /// Record how many bytes the transaction delivered.
    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len.min(MAX_BLOCK_SIZE);
    }

    /// Received bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of received bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes were received.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Renders `0x` followed by two hex digits per byte.
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in self.as_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Result state from a read operation.
#[derive(Debug, Clone)]
pub struct State {
    /// Bus the read went through.
    pub bus: u32,

    /// Chip address that was read.
    pub address: u16,

    /// Register that was read, if any.
    pub register: Option<u8>,

    /// Bytes received.
    pub data: Block,

    /// Whether the adapter advertises PEC support.
    ///
    /// Only meaningful when PEC was requested.
    pub pec_supported: bool,

    /// Non-fatal diagnostics raised during the read.
    pub warnings: Vec<&'static str>,
}

impl State {
    /// Number of bytes successfully read.
    pub fn bytes_read(&self) -> usize {
        self.data.len()
    }
}
