//! Workflow bundle payloads
//!
//! Bundles are opaque to the registry: it stores, moves and caches the
//! serialized bytes and never interprets them.

use crate::error::{RegistryError, RegistryResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Serialized workflow bundle that a component version refers to
#[derive(Clone, PartialEq, Eq)]
pub struct Bundle {
    data: Vec<u8>,
}

impl Bundle {
    /// Wrap already-serialized bundle bytes
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Decode a payload received from a backend.
    ///
    /// An empty payload is never a valid bundle.
    pub fn decode(data: Vec<u8>) -> Result<Self, String> {
        if data.is_empty() {
            return Err("empty workflow bundle".to_string());
        }
        Ok(Self { data })
    }

    /// Read a bundle from a file
    pub fn read_from(path: &Path) -> RegistryResult<Self> {
        let data = std::fs::read(path)
            .map_err(|e| RegistryError::io(format!("reading bundle {}", path.display()), e))?;
        Ok(Self { data })
    }

    /// Write the bundle to a file, replacing any existing content
    pub fn write_to(&self, path: &Path) -> RegistryResult<()> {
        std::fs::write(path, &self.data)
            .map_err(|e| RegistryError::io(format!("writing bundle {}", path.display()), e))
    }

    /// Serialized bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Hex-encoded SHA-256 of the payload
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(&self.data))
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn decode_rejects_empty_payload() {
        assert!(Bundle::decode(Vec::new()).is_err());
        assert_eq!(Bundle::decode(b"wf".to_vec()).unwrap().len(), 2);
    }

    #[test]
    fn checksum_is_sha256_hex() {
        let bundle = Bundle::from_bytes("abc");
        assert_eq!(
            bundle.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn file_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workflow.bundle");
        Bundle::from_bytes("payload").write_to(&path).unwrap();
        assert_eq!(Bundle::read_from(&path).unwrap().as_bytes(), b"payload");
    }
}
