/// NIP-05 identifier parsing (`name@domain`)
use crate::error::{Nip05Error, Nip05Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a DNS hostname
const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single DNS label
const MAX_LABEL_LEN: usize = 63;

/// A parsed, normalized NIP-05 identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    name: String,
    domain: String,
}

impl Identifier {
    /// Parse `name@domain`, lowercasing both halves
    pub fn parse(raw: &str) -> Nip05Result<Self> {
        let raw = raw.trim();

        let (name, domain) = raw.split_once('@').ok_or_else(|| {
            Nip05Error::MalformedIdentifier("Expected format name@domain.com".to_string())
        })?;

        if domain.contains('@') {
            return Err(Nip05Error::MalformedIdentifier(
                "Identifier contains more than one '@'".to_string(),
            ));
        }

        let name = name.to_ascii_lowercase();
        let domain = domain.to_ascii_lowercase();

        if !is_valid_name(&name) {
            return Err(Nip05Error::MalformedIdentifier(format!(
                "Invalid local part '{}': only a-z0-9-_. allowed",
                name
            )));
        }

        if !is_valid_domain(&domain) {
            return Err(Nip05Error::MalformedIdentifier(format!(
                "Invalid domain '{}'",
                domain
            )));
        }

        Ok(Self { name, domain })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.domain)
    }
}

impl std::str::FromStr for Identifier {
    type Err = Nip05Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Local part: non-empty, `[a-z0-9_.-]+` after lowercasing
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
}

/// DNS hostname: dot-separated labels of `[a-z0-9-]`, no leading/trailing hyphen
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    })
}
