//! Deployment artifacts.
//!
//! A deployment publishes the empty order book as output 0 of a genesis
//! transaction. Wallets and indexers watch the contract by its script hash:
//! SHA-256 of the locking script, byte-reversed, as lowercase hex.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use slotbook_types::{LockingScript, ObjectId, Result, Txid};

/// Result of deploying a fresh order-book object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Outpoint of the genesis contract output; stable for the object's life.
    pub object_id: ObjectId,
    pub txid: Txid,
    pub script_hash: String,
}

/// Script hash of a locking script, in the byte order indexers use.
#[must_use]
pub fn script_hash(script: &LockingScript) -> String {
    let mut digest: [u8; 32] = Sha256::digest(script.as_bytes()).into();
    digest.reverse();
    hex::encode(digest)
}

/// Write the script hash to `path`, replacing any previous contents.
pub fn write_script_hash(path: impl AsRef<Path>, hash: &str) -> Result<()> {
    std::fs::write(path.as_ref(), hash)?;
    tracing::info!(path = %path.as_ref().display(), "Script hash written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use slotbook_types::OrderBookState;

    use super::*;

    #[test]
    fn script_hash_is_reversed_sha256() {
        let script = LockingScript(b"abc".to_vec());
        // sha256("abc") = ba7816bf...f20015ad
        let hash = script_hash(&script);
        assert_eq!(hash.len(), 64);
        assert!(hash.starts_with("ad1500f2"));
        assert!(hash.ends_with("bf1678ba"));
    }

    #[test]
    fn script_hash_tracks_state() {
        let empty = LockingScript::contract(&OrderBookState::new());
        assert_eq!(script_hash(&empty), script_hash(&empty.clone()));
        assert_ne!(script_hash(&empty), script_hash(&LockingScript(Vec::new())));
    }

    #[test]
    fn writes_hash_file() {
        let path = std::env::temp_dir().join(format!(
            "slotbook-script-hash-{}",
            std::process::id()
        ));
        write_script_hash(&path, "00ff").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "00ff");
        std::fs::remove_file(&path).unwrap();
    }
}
