use std::fmt;

/// Identity a token record is keyed on. Authentication happens upstream;
/// this is only ever an already-established user id.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct OwnerId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("owner id must not be blank")]
pub struct BlankOwnerId;

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = BlankOwnerId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(BlankOwnerId);
        }
        Ok(OwnerId(value))
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

impl std::str::FromStr for OwnerId {
    type Err = BlankOwnerId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OwnerId::try_from(s.to_string())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
