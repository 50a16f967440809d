/// Public key codec - canonicalizes hex and NIP-19 npub encodings
use crate::error::{Nip05Error, Nip05Result};
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable prefix for bech32-encoded public keys (NIP-19)
const NPUB_HRP: &str = "npub";

/// Length of an x-only secp256k1 public key in bytes
const PUBKEY_LEN: usize = 32;

/// Canonical public key: 64 lowercase hex characters
///
/// Deserialization goes through [`Pubkey::normalize`], so a `Pubkey` is
/// always canonical no matter where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pubkey(String);

impl Pubkey {
    /// Normalize a raw public key (hex or npub) into canonical form
    pub fn normalize(raw: &str) -> Nip05Result<Self> {
        let raw = raw.trim();

        let bytes = if has_npub_prefix(raw) {
            decode_npub(raw)?
        } else {
            decode_hex(raw)?
        };

        Ok(Self(hex::encode(bytes)))
    }

    /// Canonical hex form
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Render as a NIP-19 npub string
    pub fn to_npub(&self) -> Nip05Result<String> {
        let bytes = hex::decode(&self.0)
            .map_err(|e| Nip05Error::Internal(format!("Corrupt canonical pubkey: {}", e)))?;
        let hrp = npub_hrp()?;
        bech32::encode::<Bech32>(hrp, &bytes)
            .map_err(|e| Nip05Error::Internal(format!("Failed to encode npub: {}", e)))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Pubkey {
    type Err = Nip05Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for Pubkey {
    type Error = Nip05Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::normalize(&raw)
    }
}

impl From<Pubkey> for String {
    fn from(pubkey: Pubkey) -> Self {
        pubkey.0
    }
}

fn npub_hrp() -> Nip05Result<Hrp> {
    Hrp::parse(NPUB_HRP).map_err(|e| Nip05Error::Internal(format!("Invalid npub HRP: {}", e)))
}

/// bech32 strings are either all-lowercase or all-uppercase
fn has_npub_prefix(raw: &str) -> bool {
    raw.len() > NPUB_HRP.len() + 1
        && raw
            .get(..NPUB_HRP.len() + 1)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("npub1"))
}

fn decode_npub(raw: &str) -> Nip05Result<Vec<u8>> {
    let (hrp, data) = bech32::decode(raw)
        .map_err(|e| Nip05Error::InvalidPubkeyEncoding(format!("bech32 decode failed: {}", e)))?;

    if !hrp.as_str().eq_ignore_ascii_case(NPUB_HRP) {
        return Err(Nip05Error::InvalidPubkeyEncoding(format!(
            "expected '{}' prefix, got '{}'",
            NPUB_HRP, hrp
        )));
    }

    if data.len() != PUBKEY_LEN {
        return Err(Nip05Error::InvalidPubkeyEncoding(format!(
            "npub decodes to {} bytes, expected {}",
            data.len(),
            PUBKEY_LEN
        )));
    }

    Ok(data)
}

fn decode_hex(raw: &str) -> Nip05Result<Vec<u8>> {
    if raw.len() != PUBKEY_LEN * 2 {
        return Err(Nip05Error::InvalidPubkeyEncoding(format!(
            "hex pubkey must be {} characters, got {}",
            PUBKEY_LEN * 2,
            raw.len()
        )));
    }

    hex::decode(raw)
        .map_err(|e| Nip05Error::InvalidPubkeyEncoding(format!("invalid hex: {}", e)))
}
