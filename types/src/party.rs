//! Parties to an agreement: a well-known name bound to a signing key.

use crate::{PublicKey, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known name under which a party is resolved (e.g. `"O=Clinic A, L=Oslo, C=NO"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyName(String);

impl PartyName {
    pub const MAX_LEN: usize = 255;

    /// Parse and validate a party name. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(TypesError::InvalidPartyName("name is empty".into()));
        }
        if name.len() > Self::MAX_LEN {
            return Err(TypesError::InvalidPartyName(format!(
                "name is {} bytes, limit is {}",
                name.len(),
                Self::MAX_LEN
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(TypesError::InvalidPartyName(
                "name contains control characters".into(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PartyName {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PartyName {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PartyName> for String {
    fn from(name: PartyName) -> Self {
        name.0
    }
}

/// A resolved identity: the name it is known by and the key it signs with.
///
/// Two parties are the same identity iff their keys are equal.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub key: PublicKey,
}

impl Party {
    pub fn new(name: PartyName, key: PublicKey) -> Self {
        Self { name, key }
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl std::hash::Hash for Party {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.key.fingerprint())
    }
}
