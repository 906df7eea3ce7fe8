use serde::{Deserialize, Serialize};

/// Identifying context used to namespace store keys per account.
///
/// Carries only the two fields key derivation consumes: the server URL and
/// the account id. An empty id never makes it into a derived key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AccountScope {
    url: String,
    id: String,
}

impl AccountScope {
    /// Construct a scope from the account's server URL and id.
    pub fn new(url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: id.into(),
        }
    }

    /// Server URL the account belongs to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stable account identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}
