//! Transaction identifiers
//!
//! An XA `Xid` names the transaction a registry file belongs to. Its hex
//! rendering is the registry's file name:
//!
//! ```text
//! ┌──────────────┬────────────┬──────────────────┬──────────────────┐
//! │ FormatId (8) │ GtridLen(2)│ Gtrid (2 x len)  │ Bqual (2 x rest) │
//! └──────────────┴────────────┴──────────────────┴──────────────────┘
//! ```
//!
//! All digits are uppercase hexadecimal.

use std::fmt;

use crate::error::{RegistryError, Result};

/// Maximum size of a global transaction id, in bytes
pub const MAX_GTRID_SIZE: usize = 64;

/// Maximum size of a branch qualifier, in bytes
pub const MAX_BQUAL_SIZE: usize = 64;

/// An XA transaction branch identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Xid {
    format_id: i32,
    global_transaction_id: Vec<u8>,
    branch_qualifier: Vec<u8>,
}

impl Xid {
    /// Create an Xid, rejecting ids longer than the XA limits
    pub fn new(
        format_id: i32,
        global_transaction_id: impl Into<Vec<u8>>,
        branch_qualifier: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let global_transaction_id = global_transaction_id.into();
        let branch_qualifier = branch_qualifier.into();

        if global_transaction_id.len() > MAX_GTRID_SIZE {
            return Err(RegistryError::InvalidXid(format!(
                "global transaction id is {} bytes (max {})",
                global_transaction_id.len(),
                MAX_GTRID_SIZE
            )));
        }
        if branch_qualifier.len() > MAX_BQUAL_SIZE {
            return Err(RegistryError::InvalidXid(format!(
                "branch qualifier is {} bytes (max {})",
                branch_qualifier.len(),
                MAX_BQUAL_SIZE
            )));
        }

        Ok(Self {
            format_id,
            global_transaction_id,
            branch_qualifier,
        })
    }

    pub fn format_id(&self) -> i32 {
        self.format_id
    }

    pub fn global_transaction_id(&self) -> &[u8] {
        &self.global_transaction_id
    }

    pub fn branch_qualifier(&self) -> &[u8] {
        &self.branch_qualifier
    }

    /// Render as the hex string used for registry file names
    pub fn to_hex_string(&self) -> String {
        let mut out = String::with_capacity(
            10 + 2 * (self.global_transaction_id.len() + self.branch_qualifier.len()),
        );
        out.push_str(&format!("{:08X}", self.format_id as u32));
        out.push_str(&format!("{:02X}", self.global_transaction_id.len()));
        for byte in self.global_transaction_id.iter().chain(&self.branch_qualifier) {
            out.push_str(&format!("{:02X}", byte));
        }
        out
    }

    /// Parse a string produced by [`Xid::to_hex_string`]
    ///
    /// Lowercase digits are accepted.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_hex(s)?;
        if bytes.len() < 5 {
            return Err(RegistryError::InvalidXid(format!(
                "{:?} is too short to hold a format id and length",
                s
            )));
        }

        let format_id = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let gtrid_len = bytes[4] as usize;
        let rest = &bytes[5..];
        if gtrid_len > rest.len() {
            return Err(RegistryError::InvalidXid(format!(
                "{:?} declares {} gtrid bytes but holds {}",
                s,
                gtrid_len,
                rest.len()
            )));
        }

        let (gtrid, bqual) = rest.split_at(gtrid_len);
        Self::new(format_id, gtrid, bqual)
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(RegistryError::InvalidXid(format!(
            "{:?} has an odd number of hex digits",
            s
        )));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .filter(|pair| pair.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| {
                    RegistryError::InvalidXid(format!("{:?} is not valid hex", s))
                })
        })
        .collect()
}
