//! IPv4 CIDR blocks

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 network in `a.b.c.d/len` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Build a block, masking off host bits
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(StackError::InvalidCidr(format!("{}/{}", addr, prefix)));
        }
        Ok(Self::masked(addr, prefix))
    }

    /// Build a block from a prefix known to be in range (clamped to 32)
    pub(crate) fn masked(addr: Ipv4Addr, prefix: u8) -> Self {
        let prefix = prefix.min(32);
        Self {
            network: Ipv4Addr::from(u32::from(addr) & mask_bits(prefix)),
            prefix,
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix as u32)
    }

    /// Carve consecutive sub-blocks out of this block
    ///
    /// Each sub-block is aligned to its own size. Allocation is sequential,
    /// so the same list of masks always produces the same layout.
    pub fn allocate(&self, masks: &[u8]) -> Result<Vec<Ipv4Cidr>> {
        let start = u32::from(self.network) as u64;
        let end = start + self.size();
        let mut cursor = start;
        let mut blocks = Vec::with_capacity(masks.len());

        for (index, &mask) in masks.iter().enumerate() {
            if mask < self.prefix || mask > 32 {
                return Err(StackError::CidrExhausted {
                    cidr: self.to_string(),
                    mask,
                    index,
                });
            }
            let size = 1u64 << (32 - mask as u32);
            cursor = cursor.div_ceil(size) * size;
            if cursor + size > end {
                return Err(StackError::CidrExhausted {
                    cidr: self.to_string(),
                    mask,
                    index,
                });
            }
            blocks.push(Ipv4Cidr {
                network: Ipv4Addr::from(cursor as u32),
                prefix: mask,
            });
            cursor += size;
        }

        Ok(blocks)
    }
}

fn mask_bits(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix as u32)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| StackError::InvalidCidr(s.to_string()))?;
        let addr: Ipv4Addr = addr
            .trim()
            .parse()
            .map_err(|_| StackError::InvalidCidr(s.to_string()))?;
        let prefix: u8 = prefix
            .trim()
            .parse()
            .map_err(|_| StackError::InvalidCidr(s.to_string()))?;
        Self::new(addr, prefix)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}
