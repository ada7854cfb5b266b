//! Captured meter reads: a YAML map of table id to hex payload.
//!
//! ```yaml
//! 0: "00 02 ..."
//! 2105: "0300 02"
//! ```

use crate::prelude::*;
use crate::transport::MemoryTransport;

use anyhow::{anyhow, bail, Result};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Capture {
    pub tables: BTreeMap<TableId, Vec<u8>>,
}

impl Capture {
    pub fn load(file: &str) -> Result<Self> {
        info!("Reading capture from {}", file);
        let content =
            std::fs::read_to_string(file).map_err(|err| anyhow!("capture.rs:error reading {}: {}", file, err))?;
        let capture = Self::from_yaml(&content)?;
        info!("  {} tables captured", capture.tables.len());
        Ok(capture)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: BTreeMap<u16, String> = serde_yaml::from_str(content)?;
        let mut tables = BTreeMap::new();
        for (id, hex) in raw {
            let data = parse_hex(&hex).map_err(|err| anyhow!("table {}: {}", id, err))?;
            debug!("captured table {}: {} bytes", TableId(id), data.len());
            tables.insert(TableId(id), data);
        }
        Ok(Self { tables })
    }

    pub fn into_transport(self) -> MemoryTransport {
        let mut transport = MemoryTransport::new();
        for (id, data) in self.tables {
            transport.insert(id, data);
        }
        transport
    }
}

/// Parses hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(hex: &str) -> Result<Vec<u8>> {
    let trimmed = hex.trim();
    let digits: Vec<char> = trimmed
        .strip_prefix("0x")
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits ({})", digits.len());
    }

    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16).map_err(|_| anyhow!("invalid hex byte {:?}", byte))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_tolerates_whitespace() -> Result<()> {
        assert_eq!(parse_hex("0x01 02\n0A ff")?, vec![0x01, 0x02, 0x0A, 0xFF]);
        assert_eq!(parse_hex("")?, Vec::<u8>::new());
        assert!(parse_hex("123").is_err());
        assert!(parse_hex("zz").is_err());
        Ok(())
    }

    #[test]
    fn capture_feeds_memory_transport() -> Result<()> {
        let capture = Capture::from_yaml("2105: \"0300 02\"\n")?;
        let transport = capture.into_transport();
        assert_eq!(transport.get(2105u16).map(|b| b.to_vec()), Some(vec![0x03, 0x00, 0x02]));
        Ok(())
    }
}
