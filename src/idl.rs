//! Anchor instruction discriminators derived from an IDL document.
//!
//! For every instruction in the IDL we hash `global:<name>` with SHA-256 and
//! keep the first 8 bytes. That tag prefixes each instruction payload on the
//! wire, so a table of them is enough to recognize instructions without
//! carrying the full Anchor schema at runtime.

use std::collections::HashMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::SniperError;

/// Length in bytes of an Anchor instruction discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Compute the lowercase hex discriminator for a single instruction name.
pub fn discriminator_hex(name: &str) -> String {
    let digest = Sha256::digest(format!("global:{name}").as_bytes());
    hex::encode(&digest[..DISCRIMINATOR_LEN])
}

/// Instruction name <-> discriminator mapping, derived once at startup.
#[derive(Debug, Clone)]
pub struct DiscriminatorTable {
    by_name: HashMap<String, String>,
    by_hex: HashMap<String, String>,
}

impl DiscriminatorTable {
    /// Derive the table from a parsed IDL document.
    ///
    /// Fails with [`SniperError::MalformedDescription`] when the document has
    /// no `instructions` array, the array is empty, or an entry lacks a
    /// string `name`. No collision detection: the first name to claim a
    /// discriminator wins.
    pub fn derive(idl: &Value) -> Result<Self, SniperError> {
        let instructions = idl
            .get("instructions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SniperError::MalformedDescription("no instructions array found".into())
            })?;
        if instructions.is_empty() {
            return Err(SniperError::MalformedDescription(
                "instructions array is empty".into(),
            ));
        }

        let mut by_name = HashMap::new();
        let mut by_hex = HashMap::new();
        for entry in instructions {
            let name = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
                SniperError::MalformedDescription("instruction entry without a name".into())
            })?;
            let disc = discriminator_hex(name);
            by_hex
                .entry(disc.clone())
                .or_insert_with(|| name.to_string());
            by_name.entry(name.to_string()).or_insert(disc);
        }

        Ok(Self { by_name, by_hex })
    }

    /// Discriminator hex for an instruction name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Reverse lookup used when decoding instruction data.
    pub fn name_for(&self, disc_hex: &str) -> Option<&str> {
        self.by_hex.get(disc_hex).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
