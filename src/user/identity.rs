use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The literal token a subscription stores to mean "every target"
pub const WILDCARD_TOKEN: &str = "ALL";

/// Identity token length: 27 payload characters plus the `=` pad
const TOKEN_LEN: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identity token: {token:?}")]
pub struct InvalidIdentity {
    pub token: String,
}

/// Stable opaque token naming a user account
///
/// Independent of connection state, unlike the session-local display
/// name. The format is fixed: exactly 28 characters, 27 non-whitespace
/// characters followed by a trailing `=` pad. The token is otherwise
/// meaningless to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Identity(String);

impl Identity {
    /// Validates and wraps a raw token
    ///
    /// The wildcard token is rejected here; it is only meaningful as a
    /// subscription target and is handled by [`Target`].
    pub fn parse(token: impl Into<String>) -> Result<Self, InvalidIdentity> {
        let token = token.into();
        if Self::is_valid_token(&token) {
            Ok(Self(token))
        } else {
            Err(InvalidIdentity { token })
        }
    }

    fn is_valid_token(token: &str) -> bool {
        token.chars().count() == TOKEN_LEN
            && token.ends_with('=')
            && token.chars().take(TOKEN_LEN - 1).all(|c| !c.is_whitespace())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = InvalidIdentity;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::parse(token)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

/// The target side of a subscription: one user, or every user
///
/// Serialized as a plain string: the wildcard is stored literally as
/// `"ALL"` in the persisted record, not expanded into per-user rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Target {
    All,
    User(Identity),
}

impl Target {
    /// Parses a raw target token: the wildcard literal or an identity
    pub fn parse(token: impl Into<String>) -> Result<Self, InvalidIdentity> {
        let token = token.into();
        if token == WILDCARD_TOKEN {
            Ok(Target::All)
        } else {
            Identity::parse(token).map(Target::User)
        }
    }

    /// Whether a concrete event target falls under this subscription target
    pub fn covers(&self, identity: &Identity) -> bool {
        match self {
            Target::All => true,
            Target::User(id) => id == identity,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::All => WILDCARD_TOKEN,
            Target::User(id) => id.as_str(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Target {
    type Error = InvalidIdentity;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::parse(token)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        match target {
            Target::All => WILDCARD_TOKEN.to_string(),
            Target::User(id) => id.into(),
        }
    }
}

impl From<Identity> for Target {
    fn from(identity: Identity) -> Self {
        Target::User(identity)
    }
}
